use std::fmt::Write;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::bracket::Bracket;
use crate::constants::{placement_points, PLACEMENT_LABELS, PLACEMENT_TIERS};
use crate::simulation::RunSummary;

/// Final line of the report for one competitor.
#[derive(Clone, Debug, Serialize)]
pub struct Standing {
    /// Position in the seeding lists, winners first
    pub seed: usize,
    pub name: String,
    pub avg_points: f64,
    /// Half-width of the 95% confidence interval on `avg_points`
    pub avg_points_ci95: f64,
    pub placings: [u64; PLACEMENT_TIERS],
    /// Share of trials that ended in each placement tier
    pub probabilities: [f64; PLACEMENT_TIERS],
}

/// Two-sided normal quantile for the given confidence level.
fn z_score(confidence: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(0.5 + confidence / 2.0))
        .unwrap_or(1.96)
}

impl Standing {
    fn from_tally(seed: usize, name: &str, placings: [u64; PLACEMENT_TIERS], avg_points: f64) -> Self {
        let total: u64 = placings.iter().sum();
        let mut probabilities = [0.0; PLACEMENT_TIERS];
        let mut ci = 0.0;
        if total > 0 {
            let n = total as f64;
            let mut variance = 0.0;
            for ((prob, &count), points) in probabilities.iter_mut().zip(&placings).zip(placement_points()) {
                *prob = count as f64 / n;
                variance += *prob * (points - avg_points).powi(2);
            }
            ci = z_score(0.95) * (variance / n).sqrt();
        }
        Standing {
            seed,
            name: name.to_string(),
            avg_points,
            avg_points_ci95: ci,
            placings,
            probabilities,
        }
    }
}

/// Standings of every seeded competitor, in seeding order.
pub fn standings(bracket: &Bracket) -> Vec<Standing> {
    bracket
        .seeded()
        .iter()
        .enumerate()
        .map(|(seed, &id)| {
            let c = bracket.roster().get(id);
            Standing::from_tally(seed, &c.name, c.placings, c.avg_points)
        })
        .collect()
}

/// Order by average points, best first. Ties keep seeding order.
pub fn sort_by_points(standings: &mut [Standing]) {
    standings.sort_by(|a, b| b.avg_points.total_cmp(&a.avg_points));
}

pub fn render_table(standings: &[Standing]) -> String {
    let mut out = String::new();
    let _ = write!(out, "  {:<16}{:>9}", "", "Points");
    for label in PLACEMENT_LABELS {
        let _ = write!(out, "{:>9}", label);
    }
    out.push('\n');
    for s in standings {
        let _ = write!(out, "  {:<16}  {:>7.2}", s.name, s.avg_points);
        for count in s.placings {
            let _ = write!(out, "  {:>7}", count);
        }
        out.push('\n');
    }
    out
}

pub fn render_summary(summary: &RunSummary) -> String {
    let per_worker = summary
        .per_worker
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("  ");
    format!(
        "Number of simulations run: {}\nTime taken: {:.3} seconds; {:.0} per second\nNumber run by each worker:\n{}\n",
        summary.trials,
        summary.elapsed.as_secs_f64(),
        summary.trials_per_second(),
        per_worker
    )
}

pub fn to_json(standings: &[Standing]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(standings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn standing(name: &str, placings: [u64; PLACEMENT_TIERS]) -> Standing {
        let total: u64 = placings.iter().sum();
        let points: f64 = placings
            .iter()
            .zip(placement_points())
            .map(|(&c, p)| c as f64 * p)
            .sum();
        Standing::from_tally(0, name, placings, points / total as f64)
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let mut placings = [0; PLACEMENT_TIERS];
        placings[0] = 30;
        placings[3] = 50;
        placings[7] = 20;
        let s = standing("A", placings);
        let sum: f64 = s.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((s.probabilities[3] - 0.5).abs() < 1e-12);
        assert!(s.avg_points_ci95 > 0.0);
    }

    #[test]
    fn test_single_outcome_has_zero_interval() {
        let mut placings = [0; PLACEMENT_TIERS];
        placings[1] = 10;
        let s = standing("A", placings);
        assert_eq!(s.avg_points, 75.0);
        assert!(s.avg_points_ci95.abs() < 1e-12);
    }

    #[test]
    fn test_z_score() {
        assert!((z_score(0.95) - 1.959964).abs() < 1e-4);
    }

    #[test]
    fn test_sort_by_points() {
        let mut first = [0; PLACEMENT_TIERS];
        first[0] = 1;
        let mut third = [0; PLACEMENT_TIERS];
        third[2] = 1;
        let mut list = vec![standing("Low", third), standing("High", first)];
        sort_by_points(&mut list);
        assert_eq!(list[0].name, "High");
        assert_eq!(list[1].name, "Low");
    }

    #[test]
    fn test_render_table() {
        let mut placings = [0; PLACEMENT_TIERS];
        placings[0] = 3;
        let table = render_table(&[standing("Alpha", placings)]);
        let mut lines = table.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("Points") && header.contains("1st") && header.contains("49th"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("  Alpha"));
        assert!(row.contains("100.00"));
    }

    #[test]
    fn test_json_fields() {
        let mut placings = [0; PLACEMENT_TIERS];
        placings[1] = 4;
        let json = to_json(&[standing("Alpha", placings)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "Alpha");
        assert_eq!(value[0]["placings"][1], 4);
        assert_eq!(value[0]["avg_points"], 75.0);
    }

    #[test]
    fn test_render_summary() {
        let summary = RunSummary {
            trials: 10,
            per_worker: vec![6, 4],
            elapsed: Duration::from_millis(500),
        };
        let text = render_summary(&summary);
        assert!(text.contains("Number of simulations run: 10"));
        assert!(text.contains("20 per second"));
        assert!(text.contains("6  4"));
    }
}
