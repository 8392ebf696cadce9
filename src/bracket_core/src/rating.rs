use std::f64::consts::PI;

use rand::Rng;

use crate::constants::{Q, QS, RD_FLOOR};
use crate::contest::Winner;

/// A competitor's skill at one instant: rating plus rating deviation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkillState {
    pub rating: f64,
    pub rd: f64,
}

impl SkillState {
    pub fn new(rating: f64, rd: f64) -> Self {
        SkillState { rating, rd }
    }
}

/// Glicko-style pairwise model: win probability and post-match updates.
///
/// The scale constants are carried on the model rather than read from
/// globals so that tests and callers can tune them per run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingModel {
    /// Rating scale constant
    pub q: f64,
    /// Precision factor for the variance term
    pub qs: f64,
    /// Lowest RD an update can produce
    pub rd_floor: f64,
}

impl Default for RatingModel {
    fn default() -> Self {
        RatingModel {
            q: Q,
            qs: QS,
            rd_floor: RD_FLOOR,
        }
    }
}

impl RatingModel {
    pub fn new(q: f64, qs: f64, rd_floor: f64) -> Self {
        RatingModel { q, qs, rd_floor }
    }

    /// Impact factor: shrinks a rating gap as uncertainty grows.
    pub fn g(&self, rd: f64) -> f64 {
        let x = self.q * rd / PI;
        1.0 / (1.0 + 3.0 * x * x).sqrt()
    }

    /// Probability that `p1` beats `p2`.
    ///
    /// Uses the combined deviation of both competitors, so
    /// `win_prob(a, b) + win_prob(b, a) == 1`.
    pub fn win_prob(&self, p1: SkillState, p2: SkillState) -> f64 {
        let rd = (p1.rd * p1.rd + p2.rd * p2.rd).sqrt();
        let g = self.g(rd);
        1.0 / (1.0 + 10f64.powf(-g * (p1.rating - p2.rating) / 400.0))
    }

    /// Draw a winner. Slot 1 wins iff a uniform draw in [0, 1) falls below
    /// its win probability.
    pub fn sample<R: Rng + ?Sized>(&self, p1: SkillState, p2: SkillState, rng: &mut R) -> Winner {
        let e = self.win_prob(p1, p2);
        if rng.gen::<f64>() < e {
            Winner::Slot1
        } else {
            Winner::Slot2
        }
    }

    /// New skill states for both competitors after `winner` is observed.
    ///
    /// Each side is updated from the other's pre-match snapshot.
    pub fn update(&self, p1: SkillState, p2: SkillState, winner: Winner) -> (SkillState, SkillState) {
        let (s1, s2) = match winner {
            Winner::Slot1 => (1.0, 0.0),
            Winner::Slot2 => (0.0, 1.0),
        };
        let g1 = self.g(p1.rd);
        let g2 = self.g(p2.rd);
        let dif = p1.rating - p2.rating;
        let e1 = 1.0 / (1.0 + 10f64.powf(-g2 * dif / 400.0));
        let e2 = 1.0 / (1.0 + 10f64.powf(g1 * dif / 400.0));

        (
            self.update_one(p1, g2, e1, s1),
            self.update_one(p2, g1, e2, s2),
        )
    }

    fn update_one(&self, me: SkillState, g_opp: f64, e: f64, score: f64) -> SkillState {
        let x = 1.0 / (me.rd * me.rd);
        let y = self.qs * g_opp * g_opp * e * (1.0 - e);
        let rd = (1.0 / (x + y)).sqrt().max(self.rd_floor);
        let rating = me.rating + self.q * g_opp * (score - e) / (x + y);
        SkillState { rating, rd }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn skill() -> impl Strategy<Value = SkillState> {
        (500.0..2500.0f64, 0.0..350.0f64).prop_map(|(rating, rd)| SkillState::new(rating, rd))
    }

    #[test]
    fn test_equal_competitors_50_50() {
        let model = RatingModel::default();
        let a = SkillState::new(1500.0, 100.0);
        let prob = model.win_prob(a, a);
        assert!((prob - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_g_shrinks_with_rd() {
        let model = RatingModel::default();
        assert!((model.g(0.0) - 1.0).abs() < 1e-12);
        assert!(model.g(50.0) > model.g(200.0));
        assert!(model.g(350.0) > 0.0);
    }

    #[test]
    fn test_higher_rating_favored() {
        let model = RatingModel::default();
        let strong = SkillState::new(1900.0, 50.0);
        let weak = SkillState::new(1500.0, 50.0);
        let prob = model.win_prob(strong, weak);
        assert!(prob > 0.85 && prob < 1.0, "got {}", prob);
    }

    #[test]
    fn test_winner_gains_loser_drops() {
        let model = RatingModel::default();
        let a = SkillState::new(1600.0, 80.0);
        let b = SkillState::new(1550.0, 120.0);
        let (a2, b2) = model.update(a, b, Winner::Slot2);
        assert!(a2.rating < a.rating);
        assert!(b2.rating > b.rating);
        assert!(a2.rd <= a.rd && b2.rd <= b.rd);
    }

    #[test]
    fn test_zero_rd_stays_finite() {
        let model = RatingModel::default();
        let a = SkillState::new(1500.0, 0.0);
        let b = SkillState::new(1700.0, 60.0);
        let (a2, b2) = model.update(a, b, Winner::Slot1);
        assert_eq!(a2.rating, a.rating);
        assert_eq!(a2.rd, 30.0);
        assert!(b2.rating.is_finite() && b2.rd.is_finite());
    }

    #[test]
    fn test_sample_follows_probability() {
        let model = RatingModel::default();
        let a = SkillState::new(1700.0, 60.0);
        let b = SkillState::new(1500.0, 60.0);
        let expected = model.win_prob(a, b);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let n = 20_000;
        let wins = (0..n)
            .filter(|_| model.sample(a, b, &mut rng) == Winner::Slot1)
            .count();
        let observed = wins as f64 / n as f64;
        assert!((observed - expected).abs() < 0.02, "observed {} expected {}", observed, expected);
    }

    proptest! {
        #[test]
        fn prop_win_prob_symmetric(a in skill(), b in skill()) {
            let model = RatingModel::default();
            let sum = model.win_prob(a, b) + model.win_prob(b, a);
            prop_assert!((sum - 1.0).abs() < 1e-10);
        }

        #[test]
        fn prop_win_prob_monotonic(a in skill(), b in skill(), bump in 1.0..400.0f64) {
            let model = RatingModel::default();
            let stronger = SkillState::new(a.rating + bump, a.rd);
            prop_assert!(model.win_prob(stronger, b) > model.win_prob(a, b));
        }

        #[test]
        fn prop_rd_never_below_floor(a in skill(), b in skill(), slot1 in any::<bool>()) {
            let model = RatingModel::default();
            let winner = if slot1 { Winner::Slot1 } else { Winner::Slot2 };
            let (a2, b2) = model.update(a, b, winner);
            prop_assert!(a2.rd >= 30.0);
            prop_assert!(b2.rd >= 30.0);
        }
    }
}
