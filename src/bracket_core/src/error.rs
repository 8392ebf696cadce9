use std::path::PathBuf;

use thiserror::Error;

use crate::contest::ContestId;

/// Errors raised while configuring or running a bracket.
///
/// Configuration errors come from bad input and are reported before any
/// trial runs. The remaining variants indicate a wiring defect and are fatal.
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("Number of simulations = {0}, must be a positive integer")]
    InvalidTrialCount(String),

    #[error("winners bracket size {0} must be a power of two of at least 2")]
    WinnersSizeNotPowerOfTwo(usize),

    #[error("losers bracket size {losers} must be 0 or equal to the winners bracket size {winners}")]
    InvalidLosersSize { winners: usize, losers: usize },

    #[error("{} not found: {source}", path.display())]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("{side} bracket expects {expected} entrants, got {actual}")]
    EntrantCount {
        side: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("competitor \"{0}\" appears more than once")]
    DuplicateCompetitor(String),

    #[error("fixed result {value} for {contest} must be 0, 1 or 2")]
    InvalidFixedResult { contest: ContestId, value: i64 },

    #[error("{section} fixed results: {message}")]
    FixedResultShape {
        section: &'static str,
        message: String,
    },

    #[error("routing table needs an entry for winners tier {tier}, position {index}")]
    RoutingTableTooShort { tier: usize, index: usize },

    #[error("routing points {from} at missing contest {to}")]
    RoutingOutOfRange { from: ContestId, to: ContestId },

    #[error("slot {slot} of {contest} is fed {count} times, expected exactly once")]
    RoutingConflict {
        contest: ContestId,
        slot: usize,
        count: usize,
    },

    #[error("{0} was simulated with an empty slot")]
    EmptySlot(ContestId),
}

pub type Result<T> = std::result::Result<T, BracketError>;
