//! Bracket Core - Monte Carlo placement predictor for double-elimination brackets.
//!
//! A bracket is built from a size description, a roster of rated competitors
//! and a seeding. Each trial plays every contest with the Glicko-style rating
//! model, and the placements of many parallel trials are tallied into average
//! points per competitor.

pub mod bracket;
pub mod competitor;
pub mod constants;
pub mod contest;
pub mod error;
pub mod fixed_results;
pub mod input;
pub mod rating;
pub mod report;
pub mod simulation;
pub mod tier;

pub use bracket::{Bracket, BracketParams, Seeding, TrialConfig, GRAND_FINALS, GRAND_FINALS_RESET};
pub use competitor::{Competitor, CompetitorId, Roster};
pub use constants::{placement_points, DEFAULT_TRIALS, PLACEMENT_LABELS, PLACEMENT_TIERS};
pub use contest::{Contest, ContestId, Routing, Side, SlotRef, Winner};
pub use error::{BracketError, Result};
pub use fixed_results::FixedResults;
pub use rating::{RatingModel, SkillState};
pub use report::Standing;
pub use simulation::{parse_trial_count, MonteCarlo, MonteCarloConfig, RunSummary};
pub use tier::Tier;
