//! Testing utilities for the pathways workspace
//!
//! Shared fixtures, a recording run engine and a scripted batch runner.

#![allow(missing_docs)]

use parking_lot::Mutex;
use pathways_core::{
    BatchError, BatchRunner, Chunk, DimensionRegistry, EngineError, PrimaryRow, PrimaryTable,
    RegionRegistry, RunEngine, RunOutcome, RunRequest, SectorRegistry, WorkUnit,
};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use tempfile::TempDir;

/// Three-region registry: brazil, chile, mexico
pub fn sample_regions() -> RegionRegistry {
    let mut registry = RegionRegistry::new();
    registry.register("brazil", "BRA");
    registry.register("chile", "CHL");
    registry.register("mexico", "MEX");
    registry
}

pub fn sample_sectors() -> SectorRegistry {
    SectorRegistry::with_defaults()
}

/// Primary table over designs {0, 1}, futures {0, 1, 2}, strategies {0, 1}
///
/// Primary ids are `design * 100 + strategy * 10 + future`.
pub fn sample_primary_table() -> PrimaryTable {
    let mut rows = Vec::new();
    for design in 0..2 {
        for strategy in 0..2 {
            for future in 0..3 {
                rows.push(PrimaryRow::new(
                    design * 100 + strategy * 10 + future,
                    design,
                    future,
                    strategy,
                ));
            }
        }
    }
    PrimaryTable::from_rows(rows)
}

/// Dimension registry backed by the sample primary table
pub fn sample_dimension_registry() -> DimensionRegistry {
    DimensionRegistry::new()
        .with_design_ids([0, 1])
        .with_strategy_ids([0, 1])
        .with_n_trials(2)
        .with_primary_table(sample_primary_table())
}

/// Temporary directory holding fixture files
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write a file and return its path
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Write a CSV table from a header and rows
    pub fn write_csv(&self, name: &str, header: &[&str], rows: &[&[&str]]) -> PathBuf {
        let mut contents = header.join(",");
        contents.push('\n');
        for row in rows {
            contents.push_str(&row.join(","));
            contents.push('\n');
        }
        self.write(name, &contents)
    }

    /// Write the sample primary table
    pub fn write_primary_table(&self) -> PathBuf {
        let mut contents = String::from("primary_id,design_id,future_id,strategy_id\n");
        for row in sample_primary_table().rows() {
            contents.push_str(&format!(
                "{},{},{},{}\n",
                row.primary_id, row.design_id, row.future_id, row.strategy_id
            ));
        }
        self.write("attribute_primary.csv", &contents)
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Default for Fixtures {
    fn default() -> Self {
        Self::new()
    }
}

/// Run engine that records requests instead of running them
#[derive(Default)]
pub struct RecordingEngine {
    requests: Mutex<Vec<RunRequest>>,
    failure: Mutex<Option<String>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every run with an engine error carrying `message`
    pub fn failing(message: &str) -> Self {
        let engine = Self::default();
        *engine.failure.lock() = Some(message.to_string());
        engine
    }

    pub fn invocations(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<RunRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<RunRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait::async_trait]
impl RunEngine for RecordingEngine {
    async fn run(&self, request: RunRequest) -> Result<RunOutcome, EngineError> {
        let run_id = request.run_id().clone();
        self.requests.lock().push(request);
        match self.failure.lock().clone() {
            Some(message) => Err(EngineError::other(std::io::Error::other(message))),
            None => Ok(RunOutcome::new(run_id)),
        }
    }
}

/// Batch runner returning scripted results
///
/// Units without a script succeed; chunks without a script verify.
#[derive(Default)]
pub struct ScriptedRunner {
    units: Mutex<HashMap<WorkUnit, VecDeque<Result<(), BatchError>>>>,
    verifications: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<(WorkUnit, u32)>>,
    reinitialized: Mutex<Vec<usize>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue results for a unit, returned in order
    pub fn script_unit(
        self,
        unit: WorkUnit,
        results: impl IntoIterator<Item = Result<(), BatchError>>,
    ) -> Self {
        self.units.lock().entry(unit).or_default().extend(results);
        self
    }

    /// Queue chunk verification results, returned in order
    pub fn script_verifications(self, results: impl IntoIterator<Item = bool>) -> Self {
        self.verifications.lock().extend(results);
        self
    }

    /// Every `(unit, attempt)` call in order
    pub fn calls(&self) -> Vec<(WorkUnit, u32)> {
        self.calls.lock().clone()
    }

    /// Indexes of reinitialized chunks
    pub fn reinitialized(&self) -> Vec<usize> {
        self.reinitialized.lock().clone()
    }
}

#[async_trait::async_trait]
impl BatchRunner for ScriptedRunner {
    async fn run_unit(
        &self,
        _request: &RunRequest,
        unit: &WorkUnit,
        attempt: u32,
    ) -> Result<(), BatchError> {
        self.calls.lock().push((unit.clone(), attempt));
        self.units
            .lock()
            .get_mut(unit)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(()))
    }

    async fn verify_chunk(&self, _request: &RunRequest, _chunk: &Chunk) -> Result<bool, BatchError> {
        Ok(self.verifications.lock().pop_front().unwrap_or(true))
    }

    async fn reinitialize_chunk(&self, _request: &RunRequest, chunk: &Chunk) -> Result<(), BatchError> {
        self.reinitialized.lock().push(chunk.index);
        Ok(())
    }
}
