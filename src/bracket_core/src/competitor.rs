use std::collections::HashMap;

use crate::constants::{placement_points, DEFAULT_RATING, DEFAULT_RD, PLACEMENT_TIERS};
use crate::error::{BracketError, Result};
use crate::rating::SkillState;

/// Index of a competitor inside a [`Roster`].
///
/// Ids are assigned in insertion order, so clones of a roster agree on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompetitorId(pub usize);

/// Competitor with a mutable skill state and an accumulated placement tally.
#[derive(Clone, Debug)]
pub struct Competitor {
    pub name: String,

    /// Rating during the current trial
    pub rating: f64,

    /// Rating deviation during the current trial
    pub rd: f64,

    /// Rating restored at the start of every trial
    pub rating_orig: f64,

    /// RD restored at the start of every trial
    pub rd_orig: f64,

    /// Number of trials finished in each placement tier
    pub placings: [u64; PLACEMENT_TIERS],

    /// Average points over all tallied trials
    pub avg_points: f64,
}

impl Competitor {
    pub fn new(name: impl Into<String>, rating: f64, rd: f64) -> Self {
        Competitor {
            name: name.into(),
            rating,
            rd,
            rating_orig: rating,
            rd_orig: rd,
            placings: [0; PLACEMENT_TIERS],
            avg_points: 0.0,
        }
    }

    /// Competitor used when a seeded name has no roster entry.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Competitor::new(name, DEFAULT_RATING, DEFAULT_RD)
    }

    pub fn skill(&self) -> SkillState {
        SkillState::new(self.rating, self.rd)
    }

    pub fn set_skill(&mut self, skill: SkillState) {
        self.rating = skill.rating;
        self.rd = skill.rd;
    }

    /// Restore the rating and RD the competitor started with.
    pub fn reset_rating(&mut self) {
        self.rating = self.rating_orig;
        self.rd = self.rd_orig;
    }

    /// Keep the current rating and RD as the new starting point.
    pub fn commit_rating(&mut self) {
        self.rating_orig = self.rating;
        self.rd_orig = self.rd;
    }

    pub fn total_placings(&self) -> u64 {
        self.placings.iter().sum()
    }

    /// Recompute `avg_points` from the tally.
    pub fn calc_avg_points(&mut self) {
        let total = self.total_placings();
        if total == 0 {
            self.avg_points = 0.0;
            return;
        }
        let points: f64 = self
            .placings
            .iter()
            .zip(placement_points())
            .map(|(&count, p)| count as f64 * p)
            .sum();
        self.avg_points = points / total as f64;
    }
}

/// Index-addressed competitor store with a name lookup.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    competitors: Vec<Competitor>,
    by_name: HashMap<String, CompetitorId>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Build a roster from (name, rating, RD) triples.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        let mut roster = Roster::new();
        for (name, rating, rd) in entries {
            roster.insert(Competitor::new(name, rating, rd))?;
        }
        Ok(roster)
    }

    pub fn insert(&mut self, competitor: Competitor) -> Result<CompetitorId> {
        if self.by_name.contains_key(&competitor.name) {
            return Err(BracketError::DuplicateCompetitor(competitor.name));
        }
        let id = CompetitorId(self.competitors.len());
        self.by_name.insert(competitor.name.clone(), id);
        self.competitors.push(competitor);
        Ok(id)
    }

    /// Look up `name`, synthesizing a default competitor if it is absent.
    ///
    /// The flag is true when the competitor had to be synthesized.
    pub fn get_or_insert_default(&mut self, name: &str) -> (CompetitorId, bool) {
        if let Some(&id) = self.by_name.get(name) {
            return (id, false);
        }
        let id = CompetitorId(self.competitors.len());
        self.by_name.insert(name.to_string(), id);
        self.competitors.push(Competitor::with_defaults(name));
        (id, true)
    }

    pub fn id_of(&self, name: &str) -> Option<CompetitorId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: CompetitorId) -> &Competitor {
        &self.competitors[id.0]
    }

    pub fn get_mut(&mut self, id: CompetitorId) -> &mut Competitor {
        &mut self.competitors[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<&Competitor> {
        self.id_of(name).map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Competitor> {
        self.competitors.iter()
    }

    /// Put every competitor back to its starting rating and RD.
    pub fn reset_ratings(&mut self) {
        for competitor in &mut self.competitors {
            competitor.reset_rating();
        }
    }

    /// Make the current ratings the starting point of future trials.
    pub fn commit_ratings(&mut self) {
        for competitor in &mut self.competitors {
            competitor.commit_rating();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_restores_original() {
        let mut c = Competitor::new("A", 1600.0, 80.0);
        c.set_skill(SkillState::new(1650.0, 60.0));
        c.reset_rating();
        assert_eq!(c.skill(), SkillState::new(1600.0, 80.0));
    }

    #[test]
    fn test_commit_persists_rating() {
        let mut roster = Roster::from_entries([("A", 1600.0, 80.0)]).unwrap();
        let id = roster.id_of("A").unwrap();
        roster.get_mut(id).set_skill(SkillState::new(1620.0, 70.0));
        roster.commit_ratings();
        roster.reset_ratings();
        assert_eq!(roster.get(id).skill(), SkillState::new(1620.0, 70.0));
    }

    #[test]
    fn test_avg_points_weighted() {
        let mut c = Competitor::new("A", 1500.0, 50.0);
        c.placings[0] = 1;
        c.placings[1] = 1;
        c.calc_avg_points();
        assert!((c.avg_points - 87.5).abs() < 1e-12);
    }

    #[test]
    fn test_avg_points_recomputed_not_accumulated() {
        let mut c = Competitor::new("A", 1500.0, 50.0);
        c.placings[2] = 4;
        c.calc_avg_points();
        c.calc_avg_points();
        assert!((c.avg_points - 56.25).abs() < 1e-12);
    }

    #[test]
    fn test_avg_points_empty_tally() {
        let mut c = Competitor::new("A", 1500.0, 50.0);
        c.calc_avg_points();
        assert_eq!(c.avg_points, 0.0);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = Roster::from_entries([("A", 1500.0, 50.0), ("A", 1400.0, 50.0)]).unwrap_err();
        assert!(matches!(err, BracketError::DuplicateCompetitor(name) if name == "A"));
    }

    #[test]
    fn test_missing_name_synthesized() {
        let mut roster = Roster::from_entries([("A", 1700.0, 40.0)]).unwrap();
        let (a, created) = roster.get_or_insert_default("A");
        assert!(!created);
        assert_eq!(roster.get(a).rating, 1700.0);

        let (ghost, created) = roster.get_or_insert_default("Ghost");
        assert!(created);
        assert_eq!(roster.get(ghost).skill(), SkillState::new(DEFAULT_RATING, DEFAULT_RD));
        assert_eq!(roster.len(), 2);
    }
}
