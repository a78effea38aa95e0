//! Batch dispatch
//!
//! The dispatcher is the last gate before the execution engine. It only
//! checks that a request is well formed and non-empty, builds the
//! [`RunRequest`] and delegates once.
//!
//! # Critical Invariant
//!
//! A request that fails any guard never reaches the engine. Engine
//! errors are surfaced unchanged; the dispatcher performs no recovery.

use crate::error::{DispatchError, EngineError, GuardViolation};
use crate::options::RunOptions;
use crate::request::{RunOutcome, RunRequest};
use crate::state_machine::{validate_transition, DispatchState};
use crate::types::{ModelSelection, RegionSelection, ResolvedDimensions};
use std::sync::Arc;

/// Execution engine trait
///
/// Implement this trait to execute validated requests.
#[async_trait::async_trait]
pub trait RunEngine: Send + Sync {
    /// Execute a request
    async fn run(&self, request: RunRequest) -> Result<RunOutcome, EngineError>;
}

/// Validates run inputs and hands them to an engine
pub struct BatchDispatcher {
    engine: Arc<dyn RunEngine>,
    state: DispatchState,
}

impl BatchDispatcher {
    /// Create a dispatcher over an engine
    #[must_use]
    pub fn new(engine: Arc<dyn RunEngine>) -> Self {
        Self {
            engine,
            state: DispatchState::Unvalidated,
        }
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Check guards and build the request
    ///
    /// # Errors
    /// `DispatchError::SelectionEmpty` when no dimension was usable,
    /// `DispatchError::Guard` for any other empty or malformed input
    pub fn prepare(
        resolved: Option<ResolvedDimensions>,
        regions: RegionSelection,
        models: ModelSelection,
        options: &RunOptions,
    ) -> Result<RunRequest, DispatchError> {
        if regions.is_empty() {
            return Err(GuardViolation::EmptyRegions.into());
        }
        let dimensions = resolved.ok_or(DispatchError::SelectionEmpty)?;
        if dimensions.is_empty() {
            return Err(GuardViolation::EmptyDimensions.into());
        }
        if models.is_empty() {
            return Err(GuardViolation::EmptyModels.into());
        }
        if dimensions.all_empty() {
            return Err(GuardViolation::AllDimensionsEmpty.into());
        }
        if options.chunk_size == 0 {
            return Err(GuardViolation::ZeroChunkSize.into());
        }
        if options.max_solve_attempts == 0 {
            return Err(GuardViolation::ZeroSolveAttempts.into());
        }
        Ok(RunRequest::new(dimensions, regions, models, options))
    }

    /// Validate and dispatch a run
    ///
    /// # Errors
    /// Guard failures before the engine is contacted, or the engine's own
    /// error unchanged
    pub async fn dispatch(
        &mut self,
        resolved: Option<ResolvedDimensions>,
        regions: RegionSelection,
        models: ModelSelection,
        options: &RunOptions,
    ) -> Result<RunOutcome, DispatchError> {
        let request = match Self::prepare(resolved, regions, models, options) {
            Ok(request) => request,
            Err(e) => {
                self.transition(DispatchState::Failed)?;
                tracing::warn!(error = %e, "run rejected before dispatch");
                return Err(e);
            }
        };
        self.transition(DispatchState::Validated)?;

        let run_id = request.run_id().clone();
        tracing::info!(
            run_id = %run_id,
            dimensions = ?request.dimensions().dimensions(),
            chunk_size = request.chunk_size(),
            max_solve_attempts = request.max_solve_attempts(),
            database = %request.database_kind(),
            "dispatching run"
        );
        self.transition(DispatchState::Dispatched)?;

        match self.engine.run(request).await {
            Ok(outcome) => {
                self.transition(DispatchState::Completed)?;
                tracing::info!(run_id = %run_id, "run '{run_id}' complete");
                Ok(outcome)
            }
            Err(e) => {
                self.transition(DispatchState::Failed)?;
                Err(e.into())
            }
        }
    }

    fn transition(&mut self, to: DispatchState) -> Result<(), DispatchError> {
        validate_transition(self.state, to)?;
        tracing::debug!(from = %self.state, to = %to, "dispatch transition");
        self.state = to;
        Ok(())
    }
}

impl std::fmt::Debug for BatchDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDispatcher")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
