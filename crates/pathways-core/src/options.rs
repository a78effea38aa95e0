//! Run options
//!
//! Tunables handed through to the execution engine. Defaults mirror the
//! command line: chunks of two units, two solve attempts, verification
//! with output reinitialization on failure.

use crate::types::{DatabaseKind, RunId};

/// Default number of work units per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 2;

/// Default number of solve attempts per unit
pub const DEFAULT_MAX_SOLVE_ATTEMPTS: u32 = 2;

/// Options for a single batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum work units per chunk
    pub chunk_size: usize,
    /// Attempts per unit on solver instability
    pub max_solve_attempts: u32,
    /// Persist model inputs alongside outputs
    pub save_inputs: bool,
    /// Verify each chunk's output
    pub check_results: bool,
    /// Reinitialize and rerun a chunk that fails verification
    pub reinitialize_on_verification_failure: bool,
    /// Output database kind
    pub database_kind: DatabaseKind,
    /// Include fuel production in the energy model
    pub include_fuel_production: bool,
    /// Number of uncertainty trials
    pub n_trials: Option<u32>,
    /// Random seed; negative values are replaced at resolution
    pub random_seed: Option<i64>,
    /// Caller-supplied run id
    pub run_id: Option<RunId>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_solve_attempts: DEFAULT_MAX_SOLVE_ATTEMPTS,
            save_inputs: false,
            check_results: true,
            reinitialize_on_verification_failure: true,
            database_kind: DatabaseKind::default(),
            include_fuel_production: true,
            n_trials: None,
            random_seed: None,
            run_id: None,
        }
    }
}

impl RunOptions {
    /// Create options with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With chunk size
    #[inline]
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// With max solve attempts
    #[inline]
    #[must_use]
    pub fn with_max_solve_attempts(mut self, attempts: u32) -> Self {
        self.max_solve_attempts = attempts;
        self
    }

    /// With save inputs flag
    #[inline]
    #[must_use]
    pub fn with_save_inputs(mut self, save_inputs: bool) -> Self {
        self.save_inputs = save_inputs;
        self
    }

    /// With result verification
    #[inline]
    #[must_use]
    pub fn with_check_results(mut self, check_results: bool) -> Self {
        self.check_results = check_results;
        self
    }

    /// With reinitialization on verification failure
    #[inline]
    #[must_use]
    pub fn with_reinitialize_on_verification_failure(mut self, reinitialize: bool) -> Self {
        self.reinitialize_on_verification_failure = reinitialize;
        self
    }

    /// With database kind
    #[inline]
    #[must_use]
    pub fn with_database_kind(mut self, kind: DatabaseKind) -> Self {
        self.database_kind = kind;
        self
    }

    /// With fuel production
    #[inline]
    #[must_use]
    pub fn with_include_fuel_production(mut self, include: bool) -> Self {
        self.include_fuel_production = include;
        self
    }

    /// With number of trials
    #[inline]
    #[must_use]
    pub fn with_n_trials(mut self, n_trials: u32) -> Self {
        self.n_trials = Some(n_trials);
        self
    }

    /// With random seed
    #[inline]
    #[must_use]
    pub fn with_random_seed(mut self, seed: i64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// With run id
    #[inline]
    #[must_use]
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Run id, generating one when none was supplied
    #[must_use]
    pub fn resolve_run_id(&self) -> RunId {
        self.run_id.clone().unwrap_or_else(RunId::generate)
    }

    /// Random seed, drawing a fresh one when the configured seed is negative
    #[must_use]
    pub fn resolve_random_seed(&self) -> Option<u64> {
        self.random_seed.map(|seed| {
            u64::try_from(seed).unwrap_or_else(|_| {
                let drawn = rand::random::<u32>();
                tracing::debug!(requested = seed, drawn, "drew random seed");
                u64::from(drawn)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_command_line() {
        let options = RunOptions::default();
        assert_eq!(options.chunk_size, 2);
        assert_eq!(options.max_solve_attempts, 2);
        assert!(options.check_results);
        assert!(options.reinitialize_on_verification_failure);
        assert!(options.include_fuel_production);
        assert!(!options.save_inputs);
        assert_eq!(options.database_kind, DatabaseKind::Sqlite);
    }

    #[test]
    fn explicit_run_id_is_kept() {
        let options = RunOptions::new().with_run_id(RunId::new("calibration").unwrap());
        assert_eq!(options.resolve_run_id().as_str(), "calibration");
    }

    #[test]
    fn negative_seed_is_redrawn() {
        let seed = RunOptions::new().with_random_seed(-1).resolve_random_seed();
        assert!(seed.is_some());
        assert_eq!(RunOptions::new().with_random_seed(42).resolve_random_seed(), Some(42));
        assert_eq!(RunOptions::new().resolve_random_seed(), None);
    }
}
