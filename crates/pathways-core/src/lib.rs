//! Pathways Core - scenario dimension resolution and batch dispatch
//!
//! Turns user run selections into a validated execution plan:
//! - Reads dimension ids from inline lists or id tables
//! - Selects sector models and regions against their registries
//! - Resolves design/future/primary/strategy with primary precedence
//! - Guards and dispatches the run to an execution engine
//! - Executes work units in verified, retried chunks
//!
//! # Example
//!
//! ```rust,ignore
//! use pathways_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(runner: impl BatchRunner + 'static) -> Result<(), Box<dyn std::error::Error>> {
//! let config = PathwaysConfig::default();
//! let registries = config.registries()?;
//!
//! let inputs = DimensionInputs::new().with(Dimension::Primary, "10,11");
//! let resolved = DimensionalKeyResolver::new(config.reader(), &registries.dimensions)
//!     .resolve(&inputs)?;
//! let regions = RegionSelector::new(&registries.regions).select(Some("ALLREGIONS"));
//! let models = ModelSelector::new(&registries.sectors).select(None);
//!
//! let engine = ChunkedRunEngine::new(runner, registries.regions.clone());
//! let mut dispatcher = BatchDispatcher::new(Arc::new(engine));
//! let outcome = dispatcher
//!     .dispatch(resolved, regions, models, &config.run_options())
//!     .await?;
//!
//! println!("{} units completed", outcome.completed_units());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod options;
pub mod reader;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod selectors;
pub mod state_machine;
pub mod types;

// Re-exports for convenience
pub use config::{PathwaysConfig, Registries, TableConfig};
pub use dispatch::{BatchDispatcher, RunEngine};
pub use engine::{BatchRunner, Chunk, ChunkedRunEngine, WorkUnit};
pub use error::{
    BatchError, ConfigError, DimensionError, DispatchError, EngineError, GuardViolation,
    InvalidRunId, PathwaysError, PathwaysResult, RegistryError,
};
pub use options::RunOptions;
pub use reader::{DimensionValueReader, FileValuePolicy};
pub use registry::{
    DimensionRegistry, PrimaryRow, PrimaryTable, RegionRegistry, SectorRegistry, ALL_REGIONS,
};
pub use request::{RunOutcome, RunRequest, ScenarioOutcome};
pub use resolver::{DimensionInputs, DimensionalKeyResolver};
pub use selectors::{ModelSelector, RegionSelector};
pub use state_machine::DispatchState;
pub use types::{
    DatabaseKind, Dimension, DimensionId, ModelSelection, RawSelector, RegionSelection,
    ResolvedDimensions, RunId, Selection,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Pathways Core
    pub use crate::{
        BatchDispatcher, BatchRunner, ChunkedRunEngine, Dimension, DimensionInputs,
        DimensionalKeyResolver, ModelSelector, PathwaysConfig, RegionSelector, RunEngine,
        RunOptions, RunOutcome, Selection,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
