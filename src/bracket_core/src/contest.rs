use std::fmt;

use rand::Rng;

use crate::competitor::{CompetitorId, Roster};
use crate::error::{BracketError, Result};
use crate::rating::RatingModel;

/// Which tier sequence of the bracket a contest belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Winners,
    Losers,
    Grands,
    Placements,
}

impl Side {
    pub fn tag(self) -> char {
        match self {
            Side::Winners => 'W',
            Side::Losers => 'L',
            Side::Grands => 'G',
            Side::Placements => 'P',
        }
    }
}

/// Address of a contest: tier sequence, tier index, position in the tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContestId {
    pub side: Side,
    pub tier: usize,
    pub index: usize,
}

impl ContestId {
    pub fn new(side: Side, tier: usize, index: usize) -> Self {
        ContestId { side, tier, index }
    }
}

impl fmt::Display for ContestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}#{}", self.side.tag(), self.tier, self.index)
    }
}

/// Which slot took the contest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Winner {
    Slot1,
    Slot2,
}

impl Winner {
    /// Decode a fixed-result code: 0 simulates, 1 and 2 force a slot.
    pub fn from_code(code: i64) -> Option<Option<Winner>> {
        match code {
            0 => Some(None),
            1 => Some(Some(Winner::Slot1)),
            2 => Some(Some(Winner::Slot2)),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Winner::Slot1 => 1,
            Winner::Slot2 => 2,
        }
    }
}

/// A destination: contest plus slot (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub contest: ContestId,
    pub slot: usize,
}

impl SlotRef {
    pub fn new(side: Side, tier: usize, index: usize, slot: usize) -> Self {
        debug_assert!(slot < 2);
        SlotRef {
            contest: ContestId::new(side, tier, index),
            slot,
        }
    }
}

/// Where a contest sends its winner and loser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routing {
    /// Placement buckets and not-yet-wired contests.
    Terminal,
    Advance {
        winner_to: SlotRef,
        loser_to: SlotRef,
    },
    /// Grand finals set 1. Slot 1 holds the winners-bracket champion; if
    /// they win the bracket is decided, otherwise it resets.
    GrandFinal {
        wside_winner_to: SlotRef,
        lside_loser_to: SlotRef,
        wside_loser_to: SlotRef,
        lside_winner_to: SlotRef,
    },
}

impl Routing {
    /// Every destination this routing can ever write to.
    pub fn targets(&self) -> Vec<SlotRef> {
        match *self {
            Routing::Terminal => Vec::new(),
            Routing::Advance {
                winner_to,
                loser_to,
            } => vec![winner_to, loser_to],
            Routing::GrandFinal {
                wside_winner_to,
                lside_loser_to,
                wside_loser_to,
                lside_winner_to,
            } => vec![wside_winner_to, lside_loser_to, wside_loser_to, lside_winner_to],
        }
    }
}

/// Outcome of one resolved contest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub result: Winner,
    pub winner: CompetitorId,
    pub loser: CompetitorId,
}

/// A single pairwise contest in the bracket arena.
#[derive(Clone, Debug)]
pub struct Contest {
    pub id: ContestId,
    pub slots: [Option<CompetitorId>; 2],
    /// Outcome of the current trial, `None` until resolved
    pub result: Option<Winner>,
    /// Outcome forced by configuration
    pub fixed: Option<Winner>,
    pub routing: Routing,
    /// Set by grand finals set 1 when the losers-side competitor wins
    pub bracket_reset: bool,
}

impl Contest {
    pub fn new(id: ContestId) -> Self {
        Contest {
            id,
            slots: [None, None],
            result: None,
            fixed: None,
            routing: Routing::Terminal,
            bracket_reset: false,
        }
    }

    pub fn set_players(&mut self, p1: CompetitorId, p2: CompetitorId) {
        self.slots = [Some(p1), Some(p2)];
    }

    /// Clear the per-trial outcome. Slot assignments are left in place.
    pub fn clear_result(&mut self) {
        self.result = None;
        self.bracket_reset = false;
    }

    /// Decide the contest and, if enabled, move both competitors' ratings.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        roster: &mut Roster,
        model: &RatingModel,
        update_ratings: bool,
        rng: &mut R,
    ) -> Result<Resolution> {
        let (p1, p2) = match self.slots {
            [Some(p1), Some(p2)] => (p1, p2),
            _ => return Err(BracketError::EmptySlot(self.id)),
        };
        let skill1 = roster.get(p1).skill();
        let skill2 = roster.get(p2).skill();

        let result = match self.fixed {
            Some(winner) => winner,
            None => model.sample(skill1, skill2, rng),
        };
        self.result = Some(result);
        if let Routing::GrandFinal { .. } = self.routing {
            self.bracket_reset = result == Winner::Slot2;
        }

        if update_ratings {
            let (next1, next2) = model.update(skill1, skill2, result);
            roster.get_mut(p1).set_skill(next1);
            roster.get_mut(p2).set_skill(next2);
        }

        let (winner, loser) = match result {
            Winner::Slot1 => (p1, p2),
            Winner::Slot2 => (p2, p1),
        };
        Ok(Resolution {
            result,
            winner,
            loser,
        })
    }

    /// Destinations of the winner and loser of `res`.
    pub fn deliveries(&self, res: &Resolution) -> Option<[(SlotRef, CompetitorId); 2]> {
        match self.routing {
            Routing::Terminal => None,
            Routing::Advance {
                winner_to,
                loser_to,
            } => Some([(winner_to, res.winner), (loser_to, res.loser)]),
            Routing::GrandFinal {
                wside_winner_to,
                lside_loser_to,
                wside_loser_to,
                lside_winner_to,
            } => match res.result {
                Winner::Slot1 => Some([(wside_winner_to, res.winner), (lside_loser_to, res.loser)]),
                Winner::Slot2 => Some([(lside_winner_to, res.winner), (wside_loser_to, res.loser)]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_player_roster() -> (Roster, CompetitorId, CompetitorId) {
        let roster = Roster::from_entries([("A", 1600.0, 80.0), ("B", 1500.0, 90.0)]).unwrap();
        let a = roster.id_of("A").unwrap();
        let b = roster.id_of("B").unwrap();
        (roster, a, b)
    }

    #[test]
    fn test_fixed_result_skips_sampling() {
        let (mut roster, a, b) = two_player_roster();
        let mut contest = Contest::new(ContestId::new(Side::Winners, 0, 0));
        contest.set_players(a, b);
        contest.fixed = Some(Winner::Slot2);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let before = rng.clone();
        let res = contest
            .resolve(&mut roster, &RatingModel::default(), false, &mut rng)
            .unwrap();
        assert_eq!(res.winner, b);
        assert_eq!(res.loser, a);
        assert_eq!(rng, before, "a fixed result must not draw");
    }

    #[test]
    fn test_empty_slot_is_error() {
        let (mut roster, a, _) = two_player_roster();
        let id = ContestId::new(Side::Losers, 2, 1);
        let mut contest = Contest::new(id);
        contest.slots[0] = Some(a);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = contest
            .resolve(&mut roster, &RatingModel::default(), false, &mut rng)
            .unwrap_err();
        assert!(matches!(err, BracketError::EmptySlot(found) if found == id));
    }

    #[test]
    fn test_ratings_updated_from_pre_match_snapshot() {
        let (mut roster, a, b) = two_player_roster();
        let model = RatingModel::default();
        let expected = model.update(roster.get(a).skill(), roster.get(b).skill(), Winner::Slot1);

        let mut contest = Contest::new(ContestId::new(Side::Winners, 0, 0));
        contest.set_players(a, b);
        contest.fixed = Some(Winner::Slot1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        contest.resolve(&mut roster, &model, true, &mut rng).unwrap();

        assert_eq!(roster.get(a).skill(), expected.0);
        assert_eq!(roster.get(b).skill(), expected.1);
    }

    #[test]
    fn test_grand_final_branches() {
        let (mut roster, a, b) = two_player_roster();
        let set2 = |slot| SlotRef::new(Side::Grands, 0, 0, slot);
        let mut contest = Contest::new(ContestId::new(Side::Grands, 1, 0));
        contest.routing = Routing::GrandFinal {
            wside_winner_to: SlotRef::new(Side::Placements, 0, 0, 0),
            lside_loser_to: SlotRef::new(Side::Placements, 1, 0, 0),
            wside_loser_to: set2(1),
            lside_winner_to: set2(0),
        };
        contest.set_players(a, b);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        contest.fixed = Some(Winner::Slot1);
        let res = contest.resolve(&mut roster, &RatingModel::default(), false, &mut rng).unwrap();
        assert!(!contest.bracket_reset);
        let sent = contest.deliveries(&res).unwrap();
        assert_eq!(sent[0], (SlotRef::new(Side::Placements, 0, 0, 0), a));
        assert_eq!(sent[1], (SlotRef::new(Side::Placements, 1, 0, 0), b));

        contest.fixed = Some(Winner::Slot2);
        let res = contest.resolve(&mut roster, &RatingModel::default(), false, &mut rng).unwrap();
        assert!(contest.bracket_reset);
        let sent = contest.deliveries(&res).unwrap();
        assert_eq!(sent[0], (set2(0), b));
        assert_eq!(sent[1], (set2(1), a));
    }

    #[test]
    fn test_fixed_codes() {
        assert_eq!(Winner::from_code(0), Some(None));
        assert_eq!(Winner::from_code(1), Some(Some(Winner::Slot1)));
        assert_eq!(Winner::from_code(2), Some(Some(Winner::Slot2)));
        assert_eq!(Winner::from_code(3), None);
        assert_eq!(Winner::from_code(-1), None);
    }
}
