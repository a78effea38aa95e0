//! Wiring from parsed arguments to a dispatched run

use crate::cli::CliArgs;
use crate::manifest::ManifestRunner;
use anyhow::Context;
use pathways_core::{
    BatchDispatcher, ChunkedRunEngine, DimensionalKeyResolver, ModelSelector, PathwaysConfig,
    PathwaysError, RegionSelector, RunOutcome,
};
use std::sync::Arc;

/// Load configuration, resolve selections and dispatch the run
///
/// # Errors
/// Any configuration, resolution, dispatch or engine failure
pub async fn run(args: &CliArgs) -> anyhow::Result<RunOutcome> {
    let config = match &args.config {
        Some(path) => PathwaysConfig::load(path).map_err(PathwaysError::from)?,
        None => PathwaysConfig::default(),
    };
    let mut registries = config
        .registries()
        .map_err(PathwaysError::from)
        .context("loading registries")?;
    if let Some(n) = args.n_trials {
        registries.dimensions = registries.dimensions.with_n_trials(n);
    }

    let models = ModelSelector::new(&registries.sectors)
        .with_delimiter(&config.delimiter)
        .select(Some(&args.models));
    let regions = RegionSelector::new(&registries.regions)
        .with_delimiter(&config.delimiter)
        .select(Some(&args.regions));
    let resolved = DimensionalKeyResolver::new(config.reader(), &registries.dimensions)
        .resolve(&args.dimension_inputs())
        .map_err(PathwaysError::from)?;

    let options = args.apply(config.run_options());

    let mut engine = ChunkedRunEngine::new(
        ManifestRunner::new(&config.output_dir),
        registries.regions.clone(),
    );
    if let Some(table) = registries.dimensions.primary_table() {
        engine = engine.with_primary_table(table.clone());
    }

    let mut dispatcher = BatchDispatcher::new(Arc::new(engine));
    let outcome = dispatcher
        .dispatch(resolved, regions, models, &options)
        .await
        .map_err(PathwaysError::from)?;

    if !outcome.is_success() {
        tracing::warn!(
            failed = outcome.failed_units(),
            completed = outcome.completed_units(),
            "some work units failed"
        );
    }
    Ok(outcome)
}
