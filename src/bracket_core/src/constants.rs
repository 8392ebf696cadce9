/// Rating scale constant (ln 10 / 400)
pub const Q: f64 = 5.75646273248511e-3;

/// Precision factor applied to the variance term of a rating update
pub const QS: f64 = 3.31368631904900e-5;

/// Lowest RD a competitor can reach after an update
pub const RD_FLOOR: f64 = 30.0;

/// Rating given to a seeded competitor missing from the roster
pub const DEFAULT_RATING: f64 = 1500.0;

/// RD given to a seeded competitor missing from the roster
pub const DEFAULT_RD: f64 = 0.0;

/// Number of placement tiers tallied per competitor
pub const PLACEMENT_TIERS: usize = 12;

/// Points awarded for first place
pub const FIRST_PLACE_POINTS: f64 = 100.0;

/// Multiplier applied to the points of each successive placement tier
pub const PLACEMENT_POINTS_DECAY: f64 = 0.75;

/// Trials run when no count is given
pub const DEFAULT_TRIALS: u64 = 100_000;

/// Column headers for the tallied placement tiers (best finish in each tier)
pub const PLACEMENT_LABELS: [&str; PLACEMENT_TIERS] = [
    "1st", "2nd", "3rd", "4th", "5th", "7th", "9th", "13th", "17th", "25th", "33rd", "49th",
];

/// Points awarded for each tallied placement tier
pub fn placement_points() -> [f64; PLACEMENT_TIERS] {
    let mut points = [0.0; PLACEMENT_TIERS];
    let mut p = FIRST_PLACE_POINTS;
    for slot in points.iter_mut() {
        *slot = p;
        p *= PLACEMENT_POINTS_DECAY;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_points_decay() {
        let points = placement_points();
        assert_eq!(points[0], 100.0);
        assert!((points[1] - 75.0).abs() < 1e-12);
        assert!((points[2] - 56.25).abs() < 1e-12);
        assert!(points.windows(2).all(|w| w[0] > w[1]));
    }
}
