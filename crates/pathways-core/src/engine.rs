//! Chunked execution engine
//!
//! Expands a [`RunRequest`] into `(primary_id, region)` work units,
//! partitions them into chunks and drives a [`BatchRunner`] through each
//! chunk with bounded retries and optional verification.
//!
//! # Retry policy
//! - `SolverInstability` is retried up to `max_solve_attempts` times
//! - `Failed` marks the unit failed without retry
//! - `Fatal` aborts the whole run
//!
//! A chunk that fails verification is reinitialized and rerun when the
//! request allows it, up to `max_solve_attempts` passes. Otherwise its
//! units are reported failed.

use crate::dispatch::RunEngine;
use crate::error::{BatchError, EngineError};
use crate::registry::{PrimaryTable, RegionRegistry};
use crate::request::{RunOutcome, RunRequest};
use crate::types::{Dimension, DimensionId, Selection};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// One scenario run in one region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Primary id of the scenario
    pub primary_id: DimensionId,
    /// Canonical region name
    pub region: String,
}

impl WorkUnit {
    /// Create a work unit
    #[inline]
    #[must_use]
    pub fn new(primary_id: DimensionId, region: impl Into<String>) -> Self {
        Self {
            primary_id,
            region: region.into(),
        }
    }
}

impl std::fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.primary_id, self.region)
    }
}

/// Bounded group of work units processed and verified together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the run
    pub index: usize,
    /// Units in the chunk
    pub units: Vec<WorkUnit>,
}

/// Runs individual work units on behalf of the engine
///
/// Implement this trait to connect the engine to a model backend.
#[async_trait::async_trait]
pub trait BatchRunner: Send + Sync {
    /// Prepare for a run
    async fn begin(&self, _request: &RunRequest) -> Result<(), BatchError> {
        Ok(())
    }

    /// Run one unit; `attempt` starts at 1
    async fn run_unit(
        &self,
        request: &RunRequest,
        unit: &WorkUnit,
        attempt: u32,
    ) -> Result<(), BatchError>;

    /// Check a chunk's persisted output
    async fn verify_chunk(&self, _request: &RunRequest, _chunk: &Chunk) -> Result<bool, BatchError> {
        Ok(true)
    }

    /// Discard a chunk's persisted output before a rerun
    async fn reinitialize_chunk(
        &self,
        _request: &RunRequest,
        _chunk: &Chunk,
    ) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Run engine that executes requests chunk by chunk
pub struct ChunkedRunEngine<R> {
    runner: R,
    regions: RegionRegistry,
    primary: Option<PrimaryTable>,
}

impl<R: BatchRunner> ChunkedRunEngine<R> {
    /// Create an engine over a runner and region registry
    #[must_use]
    pub fn new(runner: R, regions: RegionRegistry) -> Self {
        Self {
            runner,
            regions,
            primary: None,
        }
    }

    /// With primary table for expanding design/future/strategy selections
    #[must_use]
    pub fn with_primary_table(mut self, table: PrimaryTable) -> Self {
        self.primary = Some(table);
        self
    }

    /// Underlying runner
    #[inline]
    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Partition a request into chunks
    ///
    /// # Errors
    /// `EngineError::MissingPrimaryTable` when the selection cannot be
    /// expanded without the primary table
    pub fn plan(&self, request: &RunRequest) -> Result<Vec<Chunk>, EngineError> {
        let primary_ids = self.primary_ids(request)?;
        let regions = match request.regions() {
            Selection::Unrestricted => self.regions.all(),
            Selection::Empty => Vec::new(),
            Selection::Values(regions) => regions.clone(),
        };

        let units: IndexSet<WorkUnit> = primary_ids
            .iter()
            .flat_map(|id| regions.iter().map(move |r| WorkUnit::new(*id, r.clone())))
            .collect();
        let units: Vec<WorkUnit> = units.into_iter().collect();

        let chunk_size = request.chunk_size().max(1);
        Ok(units
            .chunks(chunk_size)
            .enumerate()
            .map(|(index, units)| Chunk {
                index,
                units: units.to_vec(),
            })
            .collect())
    }

    fn primary_ids(&self, request: &RunRequest) -> Result<Vec<DimensionId>, EngineError> {
        let dimensions = request.dimensions();
        match dimensions.get(Dimension::Primary) {
            Some(Selection::Values(ids)) => return Ok(ids.clone()),
            Some(Selection::Empty) => return Ok(Vec::new()),
            _ => {}
        }
        let missing = dimensions
            .dimensions()
            .first()
            .copied()
            .unwrap_or(Dimension::Primary);
        let table = self
            .primary
            .as_ref()
            .ok_or(EngineError::MissingPrimaryTable(missing))?;
        Ok(table.expand(dimensions))
    }

    /// Run one unit, retrying on solver instability
    ///
    /// Returns whether the unit completed.
    async fn run_unit(
        &self,
        request: &RunRequest,
        chunk: usize,
        unit: &WorkUnit,
        attempts: &mut usize,
    ) -> Result<bool, EngineError> {
        let max = request.max_solve_attempts().max(1);
        for attempt in 1..=max {
            *attempts += 1;
            match self.runner.run_unit(request, unit, attempt).await {
                Ok(()) => return Ok(true),
                Err(source) if source.is_fatal() => {
                    return Err(EngineError::Batch { chunk, source });
                }
                Err(e) if e.is_retryable() && attempt < max => {
                    tracing::warn!(chunk, %unit, attempt, error = %e, "retrying unit");
                }
                Err(e) => {
                    tracing::warn!(chunk, %unit, attempt, error = %e, "unit failed");
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }

    async fn run_chunk(
        &self,
        request: &RunRequest,
        chunk: &Chunk,
        outcome: &mut RunOutcome,
    ) -> Result<(), EngineError> {
        let max_passes = request.max_solve_attempts().max(1);
        let mut pass = 1;
        loop {
            let mut results = Vec::with_capacity(chunk.units.len());
            for unit in &chunk.units {
                let ok = self
                    .run_unit(request, chunk.index, unit, &mut outcome.attempts)
                    .await?;
                results.push((unit, ok));
            }

            if !request.check_results() || self.verify(request, chunk).await? {
                for (unit, ok) in results {
                    if ok {
                        outcome.record_completed(unit.primary_id, unit.region.clone());
                    } else {
                        outcome.record_failed(unit.primary_id, unit.region.clone());
                    }
                }
                return Ok(());
            }

            outcome.verification_failures += 1;
            if request.reinitialize_on_verification_failure() && pass < max_passes {
                tracing::warn!(chunk = chunk.index, pass, "verification failed; reinitializing chunk");
                self.runner
                    .reinitialize_chunk(request, chunk)
                    .await
                    .map_err(|source| EngineError::Batch {
                        chunk: chunk.index,
                        source,
                    })?;
                pass += 1;
                continue;
            }

            tracing::warn!(chunk = chunk.index, pass, "verification failed; marking chunk failed");
            for unit in &chunk.units {
                outcome.record_failed(unit.primary_id, unit.region.clone());
            }
            return Ok(());
        }
    }

    async fn verify(&self, request: &RunRequest, chunk: &Chunk) -> Result<bool, EngineError> {
        match self.runner.verify_chunk(request, chunk).await {
            Ok(verified) => Ok(verified),
            Err(source) if source.is_fatal() => Err(EngineError::Batch {
                chunk: chunk.index,
                source,
            }),
            Err(e) => {
                tracing::warn!(chunk = chunk.index, error = %e, "verification error");
                Ok(false)
            }
        }
    }
}

#[async_trait::async_trait]
impl<R: BatchRunner> RunEngine for ChunkedRunEngine<R> {
    async fn run(&self, request: RunRequest) -> Result<RunOutcome, EngineError> {
        let chunks = self.plan(&request)?;
        let units: usize = chunks.iter().map(|c| c.units.len()).sum();
        tracing::info!(
            run_id = %request.run_id(),
            chunks = chunks.len(),
            units,
            "starting run"
        );
        if units == 0 {
            tracing::warn!(run_id = %request.run_id(), "selection expanded to zero work units");
        }

        self.runner.begin(&request).await.map_err(EngineError::other)?;

        let mut outcome = RunOutcome::new(request.run_id().clone());
        for chunk in &chunks {
            tracing::debug!(chunk = chunk.index, units = chunk.units.len(), "running chunk");
            self.run_chunk(&request, chunk, &mut outcome).await?;
            outcome.chunks += 1;
        }

        tracing::info!(
            run_id = %request.run_id(),
            completed = outcome.completed_units(),
            failed = outcome.failed_units(),
            attempts = outcome.attempts,
            "run finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RunOptions;
    use crate::registry::PrimaryRow;
    use crate::types::{ResolvedDimensions, RunId};

    /// Planning never calls the runner
    struct Idle;

    #[async_trait::async_trait]
    impl BatchRunner for Idle {
        async fn run_unit(
            &self,
            _request: &RunRequest,
            _unit: &WorkUnit,
            _attempt: u32,
        ) -> Result<(), BatchError> {
            Ok(())
        }
    }

    fn regions() -> RegionRegistry {
        let mut registry = RegionRegistry::new();
        registry.register("brazil", "BRA");
        registry.register("chile", "CHL");
        registry
    }

    fn request(dimensions: ResolvedDimensions, options: &RunOptions) -> RunRequest {
        RunRequest::new(
            dimensions,
            Selection::Unrestricted,
            Selection::Unrestricted,
            &options.clone().with_run_id(RunId::new("test").unwrap()),
        )
    }

    #[test]
    fn plan_chunks_cross_product() {
        let engine = ChunkedRunEngine::new(Idle, regions());
        let req = request(
            ResolvedDimensions::primary(Selection::Values(vec![1, 2, 3])),
            &RunOptions::new().with_chunk_size(4),
        );
        let chunks = engine.plan(&req).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].units.len(), 4);
        assert_eq!(chunks[1].units.len(), 2);
        assert_eq!(chunks[0].units[0], WorkUnit::new(1, "brazil"));
        assert_eq!(chunks[0].units[1], WorkUnit::new(1, "chile"));
    }

    #[test]
    fn secondary_selection_requires_primary_table() {
        let engine = ChunkedRunEngine::new(Idle, regions());
        let req = request(
            ResolvedDimensions::new().with(Dimension::Design, Selection::Values(vec![0])),
            &RunOptions::new(),
        );
        assert!(matches!(
            engine.plan(&req),
            Err(EngineError::MissingPrimaryTable(Dimension::Design))
        ));

        let engine = engine.with_primary_table(PrimaryTable::from_rows([
            PrimaryRow::new(7, 0, 0, 0),
            PrimaryRow::new(8, 1, 0, 0),
        ]));
        let chunks = engine.plan(&req).unwrap();
        assert!(chunks.iter().flat_map(|c| &c.units).all(|u| u.primary_id == 7));
    }
}
