use crate::contest::{Contest, ContestId, Side, Winner};
use crate::error::{BracketError, Result};

/// One level of same-depth contests, e.g. losers quarterfinals.
///
/// Tier 0 of every side is the one closest to the end of the event.
#[derive(Clone, Debug)]
pub struct Tier {
    pub side: Side,
    pub round: usize,
    pub contests: Vec<Contest>,
}

impl Tier {
    pub fn new(side: Side, round: usize) -> Self {
        let contests = (0..Tier::size_for(side, round))
            .map(|index| Contest::new(ContestId::new(side, round, index)))
            .collect();
        Tier {
            side,
            round,
            contests,
        }
    }

    /// Number of contests in tier `round` of `side`.
    pub fn size_for(side: Side, round: usize) -> usize {
        match side {
            Side::Winners => 1 << round,
            Side::Losers => 1 << (round / 2),
            Side::Grands => 1,
            Side::Placements if round < 4 => 1,
            Side::Placements => 1 << (round / 2 - 2),
        }
    }

    pub fn len(&self) -> usize {
        self.contests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }

    /// Apply one line of fixed-result codes, position by position.
    pub fn set_fixed(&mut self, codes: &[i64]) -> Result<()> {
        if codes.len() > self.contests.len() {
            return Err(BracketError::FixedResultShape {
                section: side_name(self.side),
                message: format!(
                    "tier {} has {} contests but {} results were given",
                    self.round,
                    self.contests.len(),
                    codes.len()
                ),
            });
        }
        for (contest, &code) in self.contests.iter_mut().zip(codes) {
            contest.fixed = Winner::from_code(code).ok_or(BracketError::InvalidFixedResult {
                contest: contest.id,
                value: code,
            })?;
        }
        Ok(())
    }

    /// Display name, e.g. "Losers Top 8" or "9th-12th Place".
    pub fn name(&self) -> String {
        let r = self.round;
        match self.side {
            Side::Winners => match r {
                0 => "Winners Finals".to_string(),
                1 => "Winners Semis".to_string(),
                2 => "Winners Quarters".to_string(),
                _ => format!("Winners Top {}", 3 << r),
            },
            Side::Losers => match r {
                0 => "Losers Finals".to_string(),
                1 => "Losers Semis".to_string(),
                2 => "Losers Quarters".to_string(),
                _ => format!("Losers Top {}", (r % 2 + 3) << (r / 2)),
            },
            Side::Grands => match r {
                0 => "Grand Finals Reset".to_string(),
                _ => "Grand Finals".to_string(),
            },
            Side::Placements => {
                let (first, last) = placement_range(r);
                if first == last {
                    format!("{} Place", ordinal(first))
                } else {
                    format!("{}-{} Place", ordinal(first), ordinal(last))
                }
            }
        }
    }
}

pub(crate) fn side_name(side: Side) -> &'static str {
    match side {
        Side::Winners => "winners",
        Side::Losers => "losers",
        Side::Grands => "grand finals",
        Side::Placements => "placements",
    }
}

/// Best and worst finishing position covered by placement tier `round`.
pub fn placement_range(round: usize) -> (usize, usize) {
    let finishers = |k: usize| if k < 4 { 1 } else { 2 * Tier::size_for(Side::Placements, k) };
    let first = 1 + (0..round).map(finishers).sum::<usize>();
    (first, first + finishers(round) - 1)
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 22nd, ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLACEMENT_LABELS;

    #[test]
    fn test_sizes() {
        assert_eq!(Tier::new(Side::Winners, 3).len(), 8);
        assert_eq!(Tier::new(Side::Losers, 5).len(), 4);
        assert_eq!(Tier::new(Side::Losers, 4).len(), 4);
        assert_eq!(Tier::new(Side::Grands, 1).len(), 1);
        assert_eq!(Tier::new(Side::Placements, 3).len(), 1);
        assert_eq!(Tier::new(Side::Placements, 5).len(), 1);
        assert_eq!(Tier::new(Side::Placements, 6).len(), 2);
        assert_eq!(Tier::new(Side::Placements, 11).len(), 8);
    }

    #[test]
    fn test_names() {
        assert_eq!(Tier::new(Side::Winners, 0).name(), "Winners Finals");
        assert_eq!(Tier::new(Side::Winners, 3).name(), "Winners Top 24");
        assert_eq!(Tier::new(Side::Losers, 3).name(), "Losers Top 8");
        assert_eq!(Tier::new(Side::Losers, 4).name(), "Losers Top 12");
        assert_eq!(Tier::new(Side::Grands, 0).name(), "Grand Finals Reset");
        assert_eq!(Tier::new(Side::Placements, 2).name(), "3rd Place");
        assert_eq!(Tier::new(Side::Placements, 4).name(), "5th-6th Place");
        assert_eq!(Tier::new(Side::Placements, 11).name(), "49th-64th Place");
    }

    #[test]
    fn test_placement_labels_match_ranges() {
        for (k, label) in PLACEMENT_LABELS.iter().enumerate() {
            assert_eq!(ordinal(placement_range(k).0), *label);
        }
    }

    #[test]
    fn test_ordinal_teens() {
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(33), "33rd");
    }

    #[test]
    fn test_set_fixed() {
        let mut tier = Tier::new(Side::Winners, 1);
        tier.set_fixed(&[2]).unwrap();
        assert_eq!(tier.contests[0].fixed, Some(Winner::Slot2));
        assert_eq!(tier.contests[1].fixed, None);

        assert!(matches!(
            tier.set_fixed(&[0, 0, 1]),
            Err(BracketError::FixedResultShape { .. })
        ));
        assert!(matches!(
            tier.set_fixed(&[0, 4]),
            Err(BracketError::InvalidFixedResult { value: 4, .. })
        ));
    }
}
