use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::{debug, warn};

use crate::competitor::{CompetitorId, Roster};
use crate::constants::{DEFAULT_RATING, DEFAULT_RD, PLACEMENT_TIERS};
use crate::contest::{Contest, ContestId, Routing, Side, SlotRef};
use crate::error::{BracketError, Result};
use crate::fixed_results::FixedResults;
use crate::rating::RatingModel;
use crate::tier::{side_name, Tier};

/// Grand-finals tier holding the first set.
pub const GRAND_FINALS: usize = 1;

/// Grand-finals tier holding the reset set.
pub const GRAND_FINALS_RESET: usize = 0;

/// Shape of a bracket as read from configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BracketParams {
    /// Entrants starting in winners bracket
    pub winners_size: usize,
    /// Entrants starting in losers bracket (0 or `winners_size`)
    pub losers_size: usize,
    /// Per winners tier (from tier 1), the losers contest each loser drops to
    pub wl_map: Vec<Vec<usize>>,
    pub fixed: FixedResults,
}

impl BracketParams {
    /// Parameters with a routing table that drops winners losers into
    /// losers contests in order. Mostly useful for tests and benchmarks.
    pub fn sequential(winners_size: usize, losers_size: usize) -> Self {
        let rounds_w = rounds_for(winners_size);
        let wl_map = (1..rounds_w)
            .map(|r| {
                let n = 1usize << r;
                if losers_size == 0 && r + 1 == rounds_w {
                    (0..n).map(|i| i / 2).collect()
                } else {
                    (0..n).collect()
                }
            })
            .collect();
        BracketParams {
            winners_size,
            losers_size,
            wl_map,
            fixed: FixedResults::new(),
        }
    }
}

/// Names of the entrants, in seeding order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Seeding {
    pub winners: Vec<String>,
    pub losers: Vec<String>,
}

/// Knobs that apply to every trial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialConfig {
    pub model: RatingModel,
    /// Move ratings after each contest within a trial
    pub update_ratings: bool,
}

impl Default for TrialConfig {
    fn default() -> Self {
        TrialConfig {
            model: RatingModel::default(),
            update_ratings: true,
        }
    }
}

/// Full double-elimination topology plus the competitors playing in it.
#[derive(Clone, Debug)]
pub struct Bracket {
    winners_size: usize,
    losers_size: usize,
    pub winners: Vec<Tier>,
    pub losers: Vec<Tier>,
    pub grands: Vec<Tier>,
    pub placements: Vec<Tier>,
    roster: Roster,
    seeded: Vec<CompetitorId>,
    synthesized: Vec<String>,
    config: TrialConfig,
}

/// Placement tiers 1st to 4th hold a single finisher in slot 0.
fn finishing_slots(round: usize) -> usize {
    if round < 4 {
        1
    } else {
        2
    }
}

/// `ceil(log2(n))` for n >= 1.
fn rounds_for(n: usize) -> usize {
    n.next_power_of_two().trailing_zeros() as usize
}

impl Bracket {
    /// Build, wire, seed and validate a bracket.
    pub fn build(
        params: &BracketParams,
        roster: Roster,
        seeding: &Seeding,
        config: TrialConfig,
    ) -> Result<Self> {
        let mut bracket = Bracket::new(params.winners_size, params.losers_size, roster, config)?;
        bracket.set_structure(&params.wl_map)?;
        bracket.set_initial_players(&seeding.winners, &seeding.losers)?;
        bracket.set_fixed_results(&params.fixed)?;
        bracket.validate_wiring()?;
        debug!(
            winners = bracket.winners.len(),
            losers = bracket.losers.len(),
            placements = bracket.placements.len(),
            entrants = bracket.seeded.len(),
            "bracket built"
        );
        Ok(bracket)
    }

    /// Create every tier for the given sizes, unwired and unseeded.
    fn new(winners_size: usize, losers_size: usize, roster: Roster, config: TrialConfig) -> Result<Self> {
        if winners_size < 2 || !winners_size.is_power_of_two() {
            return Err(BracketError::WinnersSizeNotPowerOfTwo(winners_size));
        }
        if losers_size != 0 && losers_size != winners_size {
            return Err(BracketError::InvalidLosersSize {
                winners: winners_size,
                losers: losers_size,
            });
        }

        let rounds_w = rounds_for(winners_size);
        let rounds_l = if losers_size == 0 {
            2 * (rounds_w - 1)
        } else {
            rounds_w + rounds_for(losers_size)
        };
        let rounds_p = rounds_l + 2;
        if rounds_p > PLACEMENT_TIERS {
            warn!(
                placement_tiers = rounds_p,
                "finishes below the {}th placement tier are not tallied", PLACEMENT_TIERS
            );
        }

        let tiers = |side, count| (0..count).map(|r| Tier::new(side, r)).collect::<Vec<_>>();
        Ok(Bracket {
            winners_size,
            losers_size,
            winners: tiers(Side::Winners, rounds_w),
            losers: tiers(Side::Losers, rounds_l),
            grands: tiers(Side::Grands, 2),
            placements: tiers(Side::Placements, rounds_p),
            roster,
            seeded: Vec::new(),
            synthesized: Vec::new(),
            config,
        })
    }

    /// Wire every contest to the contests its winner and loser move on to.
    fn set_structure(&mut self, wl_map: &[Vec<usize>]) -> Result<()> {
        use Side::{Grands, Losers, Placements, Winners};

        let rounds_w = self.winners.len();
        let rounds_l = self.losers.len();
        let gf1 = |slot| SlotRef::new(Grands, GRAND_FINALS, 0, slot);

        // Winners finals. Without a losers bracket the loser is already the
        // losers-side champion.
        let winners_final_loser = if rounds_l == 0 {
            gf1(1)
        } else {
            SlotRef::new(Losers, 0, 0, 0)
        };
        self.winners[0].contests[0].routing = Routing::Advance {
            winner_to: gf1(0),
            loser_to: winners_final_loser,
        };

        // Rest of winners bracket
        for r in 1..rounds_w {
            let opening_without_losers = self.losers_size == 0 && r + 1 == rounds_w;
            for i in 0..self.winners[r].len() {
                let target = wl_map
                    .get(r - 1)
                    .and_then(|line| line.get(i))
                    .copied()
                    .ok_or(BracketError::RoutingTableTooShort { tier: r, index: i })?;
                let loser_to = if opening_without_losers {
                    SlotRef::new(Losers, 2 * r - 1, target, i % 2)
                } else {
                    SlotRef::new(Losers, 2 * r, target, 0)
                };
                self.winners[r].contests[i].routing = Routing::Advance {
                    winner_to: SlotRef::new(Winners, r - 1, i / 2, i % 2),
                    loser_to,
                };
            }
        }

        if rounds_l > 0 {
            // Losers finals
            self.losers[0].contests[0].routing = Routing::Advance {
                winner_to: gf1(1),
                loser_to: SlotRef::new(Placements, 2, 0, 0),
            };
        }

        for r in 1..rounds_l {
            for i in 0..self.losers[r].len() {
                let winner_to = if r % 2 == 1 {
                    // No entrants from winners this tier
                    SlotRef::new(Losers, r - 1, i, 1)
                } else {
                    // Half the entrants came straight from winners
                    SlotRef::new(Losers, r - 1, i / 2, i % 2)
                };
                self.losers[r].contests[i].routing = Routing::Advance {
                    winner_to,
                    loser_to: SlotRef::new(Placements, r + 2, i / 2, i % 2),
                };
            }
        }

        self.grands[GRAND_FINALS_RESET].contests[0].routing = Routing::Advance {
            winner_to: SlotRef::new(Placements, 0, 0, 0),
            loser_to: SlotRef::new(Placements, 1, 0, 0),
        };
        self.grands[GRAND_FINALS].contests[0].routing = Routing::GrandFinal {
            wside_winner_to: SlotRef::new(Placements, 0, 0, 0),
            lside_loser_to: SlotRef::new(Placements, 1, 0, 0),
            wside_loser_to: SlotRef::new(Grands, GRAND_FINALS_RESET, 0, 1),
            lside_winner_to: SlotRef::new(Grands, GRAND_FINALS_RESET, 0, 0),
        };
        Ok(())
    }

    /// Pair entrants into the opening contests of both sides. Names missing
    /// from the roster get a default competitor and a warning.
    fn set_initial_players(&mut self, winners: &[String], losers: &[String]) -> Result<()> {
        if winners.len() != self.winners_size {
            return Err(BracketError::EntrantCount {
                side: "winners",
                expected: self.winners_size,
                actual: winners.len(),
            });
        }
        if losers.len() != self.losers_size {
            return Err(BracketError::EntrantCount {
                side: "losers",
                expected: self.losers_size,
                actual: losers.len(),
            });
        }

        let mut seen = HashSet::new();
        for name in winners.iter().chain(losers) {
            if !seen.insert(name.as_str()) {
                return Err(BracketError::DuplicateCompetitor(name.clone()));
            }
        }

        for (side, names) in [(Side::Winners, winners), (Side::Losers, losers)] {
            if names.is_empty() {
                continue;
            }
            let mut ids = Vec::with_capacity(names.len());
            for name in names {
                let (id, created) = self.roster.get_or_insert_default(name);
                if created {
                    warn!(
                        "Player \"{}\" not found. Using default rating, RD of {}, {}.",
                        name, DEFAULT_RATING, DEFAULT_RD
                    );
                    self.synthesized.push(name.clone());
                }
                ids.push(id);
            }
            let opening = match side {
                Side::Winners => self.winners.last_mut(),
                _ => self.losers.last_mut(),
            };
            if let Some(tier) = opening {
                for (contest, pair) in tier.contests.iter_mut().zip(ids.chunks(2)) {
                    contest.set_players(pair[0], pair[1]);
                }
            }
            self.seeded.extend(ids);
        }
        Ok(())
    }

    fn set_fixed_results(&mut self, fixed: &FixedResults) -> Result<()> {
        for (side, tiers, lines) in [
            (Side::Winners, &mut self.winners, &fixed.winners),
            (Side::Losers, &mut self.losers, &fixed.losers),
            (Side::Grands, &mut self.grands, &fixed.grands),
        ] {
            let surplus = lines.iter().skip(tiers.len()).flatten().any(|&code| code != 0);
            if surplus {
                return Err(BracketError::FixedResultShape {
                    section: side_name(side),
                    message: format!("{} lines given for {} tiers", lines.len(), tiers.len()),
                });
            }
            for (tier, line) in tiers.iter_mut().zip(lines) {
                tier.set_fixed(line)?;
            }
        }
        Ok(())
    }

    /// Check that every slot that will be read during a trial is filled
    /// exactly once, either by seeding or by routing.
    fn validate_wiring(&self) -> Result<()> {
        let mut feeds: HashMap<SlotRef, usize> = HashMap::new();
        for contest in self.contests() {
            for target in contest.routing.targets() {
                if self.find(target.contest).is_none() {
                    return Err(BracketError::RoutingOutOfRange {
                        from: contest.id,
                        to: target.contest,
                    });
                }
                *feeds.entry(target).or_insert(0) += 1;
            }
            for (slot, player) in contest.slots.iter().enumerate() {
                if player.is_some() {
                    *feeds.entry(SlotRef { contest: contest.id, slot }).or_insert(0) += 1;
                }
            }
        }

        for contest in self.contests() {
            for slot in 0..2 {
                let expected = match contest.id.side {
                    // Decided by either grand-finals set, never both.
                    Side::Placements if contest.id.tier < 2 => 2 * usize::from(slot == 0),
                    Side::Placements if contest.id.tier < 4 => usize::from(slot == 0),
                    _ => 1,
                };
                let slot_ref = SlotRef { contest: contest.id, slot };
                let count = feeds.get(&slot_ref).copied().unwrap_or(0);
                if count != expected {
                    return Err(BracketError::RoutingConflict {
                        contest: contest.id,
                        slot,
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    fn tiers(&self, side: Side) -> &[Tier] {
        match side {
            Side::Winners => &self.winners,
            Side::Losers => &self.losers,
            Side::Grands => &self.grands,
            Side::Placements => &self.placements,
        }
    }

    fn find(&self, id: ContestId) -> Option<&Contest> {
        self.tiers(id.side).get(id.tier)?.contests.get(id.index)
    }

    /// The contest at `id`. Panics if the address is outside the bracket.
    pub fn contest(&self, id: ContestId) -> &Contest {
        &self.tiers(id.side)[id.tier].contests[id.index]
    }

    pub fn tier(&self, side: Side, round: usize) -> &Tier {
        &self.tiers(side)[round]
    }

    /// Every contest in the bracket, winners first and placements last.
    pub fn contests(&self) -> impl Iterator<Item = &Contest> {
        self.winners
            .iter()
            .chain(&self.losers)
            .chain(&self.grands)
            .chain(&self.placements)
            .flat_map(|tier| tier.contests.iter())
    }

    pub fn winners_size(&self) -> usize {
        self.winners_size
    }

    pub fn losers_size(&self) -> usize {
        self.losers_size
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// Entrants in seeding order: winners-bracket names, then losers.
    pub fn seeded(&self) -> &[CompetitorId] {
        &self.seeded
    }

    /// Seeded names that were missing from the roster.
    pub fn synthesized(&self) -> &[String] {
        &self.synthesized
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    /// Whether the last trial needed a second grand-finals set.
    pub fn bracket_reset(&self) -> bool {
        self.grands[GRAND_FINALS].contests[0].bracket_reset
    }

    /// Run one full trial and tally the placements it produced.
    pub fn simulate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.reset();
        for round in (0..self.winners.len()).rev() {
            self.simulate_tier(Side::Winners, round, rng)?;
        }
        for round in (0..self.losers.len()).rev() {
            self.simulate_tier(Side::Losers, round, rng)?;
        }
        self.simulate_tier(Side::Grands, GRAND_FINALS, rng)?;
        if self.bracket_reset() {
            self.simulate_tier(Side::Grands, GRAND_FINALS_RESET, rng)?;
        }
        self.update_placings()
    }

    /// Restore starting ratings and forget the previous trial's outcomes.
    fn reset(&mut self) {
        self.roster.reset_ratings();
        for tier in self.winners.iter_mut().chain(&mut self.losers).chain(&mut self.grands) {
            for contest in &mut tier.contests {
                contest.clear_result();
            }
        }
    }

    /// Resolve every contest of one tier. Contests within a tier do not
    /// feed each other, so their order does not matter.
    pub fn simulate_tier<R: Rng + ?Sized>(&mut self, side: Side, round: usize, rng: &mut R) -> Result<()> {
        for index in 0..self.tiers(side)[round].len() {
            self.simulate_contest(ContestId::new(side, round, index), rng)?;
        }
        Ok(())
    }

    fn simulate_contest<R: Rng + ?Sized>(&mut self, id: ContestId, rng: &mut R) -> Result<()> {
        let Bracket {
            winners,
            losers,
            grands,
            placements,
            roster,
            config,
            ..
        } = self;
        let tiers = match id.side {
            Side::Winners => winners,
            Side::Losers => losers,
            Side::Grands => grands,
            Side::Placements => placements,
        };
        let contest = &mut tiers[id.tier].contests[id.index];
        let res = contest.resolve(roster, &config.model, config.update_ratings, rng)?;
        if let Some(deliveries) = contest.deliveries(&res) {
            for (to, competitor) in deliveries {
                self.place(to, competitor);
            }
        }
        Ok(())
    }

    fn place(&mut self, to: SlotRef, competitor: CompetitorId) {
        let tiers = match to.contest.side {
            Side::Winners => &mut self.winners,
            Side::Losers => &mut self.losers,
            Side::Grands => &mut self.grands,
            Side::Placements => &mut self.placements,
        };
        tiers[to.contest.tier].contests[to.contest.index].slots[to.slot] = Some(competitor);
    }

    fn update_placings(&mut self) -> Result<()> {
        let Bracket {
            placements, roster, ..
        } = self;
        for (round, tier) in placements.iter().enumerate().take(PLACEMENT_TIERS) {
            for contest in &tier.contests {
                for slot in &contest.slots[..finishing_slots(round)] {
                    let id = slot.ok_or(BracketError::EmptySlot(contest.id))?;
                    roster.get_mut(id).placings[round] += 1;
                }
            }
        }
        Ok(())
    }

    /// Finishers of the last trial, one list per placement tier.
    pub fn last_placements(&self) -> Vec<Vec<CompetitorId>> {
        self.placements
            .iter()
            .enumerate()
            .map(|(round, tier)| {
                tier.contests
                    .iter()
                    .flat_map(|c| c.slots[..finishing_slots(round)].iter().flatten().copied())
                    .collect()
            })
            .collect()
    }

    /// Zero the placement tallies of every roster competitor.
    pub fn clear_tallies(&mut self) {
        for id in 0..self.roster.len() {
            let competitor = self.roster.get_mut(CompetitorId(id));
            competitor.placings = [0; PLACEMENT_TIERS];
            competitor.avg_points = 0.0;
        }
    }

    /// Tallies of the seeded competitors, in seeding order.
    pub fn seeded_placings(&self) -> Vec<[u64; PLACEMENT_TIERS]> {
        self.seeded
            .iter()
            .map(|&id| self.roster.get(id).placings)
            .collect()
    }

    /// Add tallies gathered elsewhere, matched by seeding position.
    pub fn merge_placings(&mut self, tallies: &[[u64; PLACEMENT_TIERS]]) {
        for (&id, tally) in self.seeded.iter().zip(tallies) {
            let competitor = self.roster.get_mut(id);
            for (total, count) in competitor.placings.iter_mut().zip(tally) {
                *total += count;
            }
        }
    }

    /// Recompute average points for every seeded competitor.
    pub fn finalize_scores(&mut self) {
        for &id in &self.seeded {
            self.roster.get_mut(id).calc_avg_points();
        }
    }
}
