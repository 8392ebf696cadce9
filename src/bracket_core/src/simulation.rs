use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::bracket::Bracket;
use crate::constants::{DEFAULT_TRIALS, PLACEMENT_TIERS};
use crate::error::{BracketError, Result};

/// Trials a worker runs between progress reports.
const PROGRESS_STRIDE: u64 = 256;

/// Parse the optional trial-count argument. Absent means the default.
pub fn parse_trial_count(arg: Option<&str>) -> Result<u64> {
    match arg {
        None => Ok(DEFAULT_TRIALS),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) if n > 0 => Ok(n as u64),
            _ => Err(BracketError::InvalidTrialCount(raw.to_string())),
        },
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonteCarloConfig {
    pub trials: u64,
    /// Independent workers; defaults to the rayon thread count
    pub workers: Option<usize>,
    /// Master seed; random when absent
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            trials: DEFAULT_TRIALS,
            workers: None,
            seed: None,
        }
    }
}

/// Bookkeeping for a finished run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub trials: u64,
    /// Trials run by each worker
    pub per_worker: Vec<u64>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn trials_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.trials as f64 / secs
        } else {
            0.0
        }
    }
}

struct WorkerTally {
    trials: u64,
    placings: Vec<[u64; PLACEMENT_TIERS]>,
}

/// Runs many independent trials of a bracket and folds the placements back
/// into it.
#[derive(Clone, Debug, Default)]
pub struct MonteCarlo {
    config: MonteCarloConfig,
}

impl MonteCarlo {
    pub fn new(config: MonteCarloConfig) -> Self {
        MonteCarlo { config }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    pub fn run(&self, bracket: &mut Bracket) -> Result<RunSummary> {
        self.run_with_progress(bracket, |_| {})
    }

    /// Run every trial, calling `progress` with the number of trials
    /// completed since its previous call.
    ///
    /// Each worker simulates a private clone of `bracket` with its own RNG.
    /// When they are done their tallies are added to `bracket`'s seeded
    /// competitors and average points are recomputed.
    pub fn run_with_progress<F>(&self, bracket: &mut Bracket, progress: F) -> Result<RunSummary>
    where
        F: Fn(u64) + Sync,
    {
        let trials = self.config.trials;
        if trials == 0 {
            return Err(BracketError::InvalidTrialCount(trials.to_string()));
        }
        let workers = self
            .config
            .workers
            .unwrap_or_else(rayon::current_num_threads)
            .clamp(1, usize::try_from(trials).unwrap_or(usize::MAX));

        let mut master = match self.config.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let base = trials / workers as u64;
        let extra = trials % workers as u64;
        let jobs: Vec<(u64, u64)> = (0..workers as u64)
            .map(|w| (base + u64::from(w < extra), master.gen::<u64>()))
            .collect();

        info!(trials, workers, "starting simulation");
        let start = Instant::now();

        let mut template = bracket.clone();
        template.clear_tallies();
        let template = &template;
        let progress = &progress;

        let tallies = jobs
            .par_iter()
            .enumerate()
            .map(|(worker, &(count, seed))| -> Result<WorkerTally> {
                let mut local = template.clone();
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut pending = 0;
                for _ in 0..count {
                    local.simulate(&mut rng)?;
                    pending += 1;
                    if pending == PROGRESS_STRIDE {
                        progress(pending);
                        pending = 0;
                    }
                }
                if pending > 0 {
                    progress(pending);
                }
                debug!(worker, trials = count, "worker finished");
                Ok(WorkerTally {
                    trials: count,
                    placings: local.seeded_placings(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for tally in &tallies {
            bracket.merge_placings(&tally.placings);
        }
        bracket.finalize_scores();

        let summary = RunSummary {
            trials,
            per_worker: tallies.iter().map(|t| t.trials).collect(),
            elapsed: start.elapsed(),
        };
        info!(
            trials,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            per_second = summary.trials_per_second(),
            "simulation finished"
        );
        Ok(summary)
    }
}
