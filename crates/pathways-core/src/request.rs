//! Run request and outcome
//!
//! A `RunRequest` can only be built by the dispatcher after every guard has
//! passed, so an engine never sees an empty or malformed request.

use crate::options::RunOptions;
use crate::types::{
    DatabaseKind, DimensionId, ModelSelection, RegionSelection, ResolvedDimensions, RunId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validated execution request, consumed once by a run engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRequest {
    dimensions: ResolvedDimensions,
    regions: RegionSelection,
    models: ModelSelection,
    chunk_size: usize,
    max_solve_attempts: u32,
    save_inputs: bool,
    check_results: bool,
    reinitialize_on_verification_failure: bool,
    database_kind: DatabaseKind,
    run_id: RunId,
    include_fuel_production: bool,
    n_trials: Option<u32>,
    random_seed: Option<u64>,
}

impl RunRequest {
    /// Assemble a request from guarded inputs
    ///
    /// Regions are deduplicated here; region selection keeps repeats.
    pub(crate) fn new(
        dimensions: ResolvedDimensions,
        regions: RegionSelection,
        models: ModelSelection,
        options: &RunOptions,
    ) -> Self {
        Self {
            dimensions,
            regions: regions.deduplicated(),
            models: models.deduplicated(),
            chunk_size: options.chunk_size,
            max_solve_attempts: options.max_solve_attempts,
            save_inputs: options.save_inputs,
            check_results: options.check_results,
            reinitialize_on_verification_failure: options.reinitialize_on_verification_failure,
            database_kind: options.database_kind,
            run_id: options.resolve_run_id(),
            include_fuel_production: options.include_fuel_production,
            n_trials: options.n_trials,
            random_seed: options.resolve_random_seed(),
        }
    }

    /// Resolved scenario dimensions
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> &ResolvedDimensions {
        &self.dimensions
    }

    /// Regions to run
    #[inline]
    #[must_use]
    pub fn regions(&self) -> &RegionSelection {
        &self.regions
    }

    /// Sector models to run
    #[inline]
    #[must_use]
    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    /// Maximum work units per chunk
    #[inline]
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Attempts per unit on solver instability
    #[inline]
    #[must_use]
    pub fn max_solve_attempts(&self) -> u32 {
        self.max_solve_attempts
    }

    /// Persist model inputs
    #[inline]
    #[must_use]
    pub fn save_inputs(&self) -> bool {
        self.save_inputs
    }

    /// Verify chunk output
    #[inline]
    #[must_use]
    pub fn check_results(&self) -> bool {
        self.check_results
    }

    /// Reinitialize and rerun chunks that fail verification
    #[inline]
    #[must_use]
    pub fn reinitialize_on_verification_failure(&self) -> bool {
        self.reinitialize_on_verification_failure
    }

    /// Output database kind
    #[inline]
    #[must_use]
    pub fn database_kind(&self) -> DatabaseKind {
        self.database_kind
    }

    /// Run identifier
    #[inline]
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Include fuel production
    #[inline]
    #[must_use]
    pub fn include_fuel_production(&self) -> bool {
        self.include_fuel_production
    }

    /// Number of uncertainty trials
    #[inline]
    #[must_use]
    pub fn n_trials(&self) -> Option<u32> {
        self.n_trials
    }

    /// Resolved random seed
    #[inline]
    #[must_use]
    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }
}

/// Outcome for one primary id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Regions that completed
    pub completed: Vec<String>,
    /// Regions that failed
    pub failed: Vec<String>,
}

impl ScenarioOutcome {
    /// Check if every region completed
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Per-primary-id outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Run identifier
    pub run_id: Option<RunId>,
    /// Outcome per primary id
    pub scenarios: BTreeMap<DimensionId, ScenarioOutcome>,
    /// Chunks processed
    pub chunks: usize,
    /// Unit solve attempts made
    pub attempts: usize,
    /// Chunk verification failures observed
    pub verification_failures: usize,
}

impl RunOutcome {
    /// Create an empty outcome for a run
    #[must_use]
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    /// Record a completed unit
    pub fn record_completed(&mut self, primary_id: DimensionId, region: impl Into<String>) {
        self.scenarios
            .entry(primary_id)
            .or_default()
            .completed
            .push(region.into());
    }

    /// Record a failed unit
    pub fn record_failed(&mut self, primary_id: DimensionId, region: impl Into<String>) {
        self.scenarios
            .entry(primary_id)
            .or_default()
            .failed
            .push(region.into());
    }

    /// Primary ids with every region completed
    #[must_use]
    pub fn completed_primaries(&self) -> Vec<DimensionId> {
        self.scenarios
            .iter()
            .filter(|(_, o)| o.is_complete() && !o.completed.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of failed units
    #[must_use]
    pub fn failed_units(&self) -> usize {
        self.scenarios.values().map(|o| o.failed.len()).sum()
    }

    /// Number of completed units
    #[must_use]
    pub fn completed_units(&self) -> usize {
        self.scenarios.values().map(|o| o.completed.len()).sum()
    }

    /// Check if no unit failed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_units() == 0
    }
}
