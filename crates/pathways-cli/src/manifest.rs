//! Run manifest
//!
//! The sector models run outside this process. [`ManifestRunner`] records
//! every work unit of a run as JSON lines in
//! `<output_dir>/<run_id>/manifest.jsonl`, the hand-off artifact for the
//! model backend.

use parking_lot::Mutex;
use pathways_core::{BatchError, BatchRunner, Chunk, RunRequest, WorkUnit};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Manifest file name inside a run directory
pub const MANIFEST_FILE: &str = "manifest.jsonl";

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ManifestEvent<'a> {
    Header {
        started_at: String,
        request: &'a RunRequest,
    },
    Unit {
        primary_id: i64,
        region: &'a str,
        attempt: u32,
    },
    Reinitialize {
        chunk: usize,
        units: &'a [WorkUnit],
    },
}

#[derive(Default)]
struct ManifestState {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
    recorded: HashSet<WorkUnit>,
}

/// Batch runner that writes a run manifest
pub struct ManifestRunner {
    output_dir: PathBuf,
    state: Mutex<ManifestState>,
}

impl ManifestRunner {
    /// Create a runner writing under `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            state: Mutex::new(ManifestState::default()),
        }
    }

    /// Manifest path of the current run, once started
    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.state.lock().path.clone()
    }

    /// Units recorded and not discarded by a reinitialization
    pub fn recorded_units(&self) -> usize {
        self.state.lock().recorded.len()
    }

    fn write_event(state: &mut ManifestState, event: &ManifestEvent<'_>) -> Result<(), BatchError> {
        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| BatchError::Fatal("manifest written before run start".into()))?;
        serde_json::to_writer(&mut *writer, event).map_err(|e| BatchError::Fatal(e.to_string()))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| BatchError::Fatal(e.to_string()))
    }
}

fn open_manifest(dir: &Path) -> std::io::Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(MANIFEST_FILE);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)?;
    Ok((path, file))
}

#[async_trait::async_trait]
impl BatchRunner for ManifestRunner {
    async fn begin(&self, request: &RunRequest) -> Result<(), BatchError> {
        let dir = self.output_dir.join(request.run_id().as_str());
        let (path, file) = open_manifest(&dir).map_err(|e| {
            BatchError::Fatal(format!("cannot create manifest in {}: {e}", dir.display()))
        })?;
        tracing::info!(path = %path.display(), "writing run manifest");

        let mut state = self.state.lock();
        *state = ManifestState {
            writer: Some(BufWriter::new(file)),
            path: Some(path),
            recorded: HashSet::new(),
        };
        Self::write_event(
            &mut state,
            &ManifestEvent::Header {
                started_at: chrono::Utc::now().to_rfc3339(),
                request,
            },
        )
    }

    async fn run_unit(
        &self,
        _request: &RunRequest,
        unit: &WorkUnit,
        attempt: u32,
    ) -> Result<(), BatchError> {
        let mut state = self.state.lock();
        Self::write_event(
            &mut state,
            &ManifestEvent::Unit {
                primary_id: unit.primary_id,
                region: &unit.region,
                attempt,
            },
        )?;
        state.recorded.insert(unit.clone());
        Ok(())
    }

    async fn verify_chunk(&self, _request: &RunRequest, chunk: &Chunk) -> Result<bool, BatchError> {
        let state = self.state.lock();
        Ok(chunk.units.iter().all(|u| state.recorded.contains(u)))
    }

    async fn reinitialize_chunk(&self, _request: &RunRequest, chunk: &Chunk) -> Result<(), BatchError> {
        let mut state = self.state.lock();
        for unit in &chunk.units {
            state.recorded.remove(unit);
        }
        Self::write_event(
            &mut state,
            &ManifestEvent::Reinitialize {
                chunk: chunk.index,
                units: &chunk.units,
            },
        )
    }
}
