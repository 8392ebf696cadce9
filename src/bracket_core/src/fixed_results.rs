use crate::contest::{ContestId, Side, Winner};

/// Results that are already known, one line of codes per tier.
///
/// Codes are 0 (simulate), 1 (slot 1 wins) or 2 (slot 2 wins). Lines are
/// indexed like the tiers they apply to, so line 0 of `winners` is the
/// winners final and line 0 of `grands` is the reset set. Missing lines and
/// missing trailing positions mean "simulate".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedResults {
    pub winners: Vec<Vec<i64>>,
    pub losers: Vec<Vec<i64>>,
    pub grands: Vec<Vec<i64>>,
}

impl FixedResults {
    pub fn new() -> Self {
        FixedResults::default()
    }

    pub fn is_empty(&self) -> bool {
        [&self.winners, &self.losers, &self.grands]
            .iter()
            .all(|section| section.iter().flatten().all(|&code| code == 0))
    }

    /// Force (or, with `None`, release) the result of a single contest.
    pub fn set(&mut self, id: ContestId, winner: Option<Winner>) {
        let section = match id.side {
            Side::Winners => &mut self.winners,
            Side::Losers => &mut self.losers,
            Side::Grands => &mut self.grands,
            Side::Placements => return,
        };
        if section.len() <= id.tier {
            section.resize(id.tier + 1, Vec::new());
        }
        let line = &mut section[id.tier];
        if line.len() <= id.index {
            line.resize(id.index + 1, 0);
        }
        line[id.index] = winner.map_or(0, |w| i64::from(w.code()));
    }

    /// Code recorded for `id`, 0 when nothing is fixed.
    pub fn get(&self, id: ContestId) -> i64 {
        let section = match id.side {
            Side::Winners => &self.winners,
            Side::Losers => &self.losers,
            Side::Grands => &self.grands,
            Side::Placements => return 0,
        };
        section
            .get(id.tier)
            .and_then(|line| line.get(id.index))
            .copied()
            .unwrap_or(0)
    }
}
