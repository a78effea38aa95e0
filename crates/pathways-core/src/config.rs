//! TOML configuration
//!
//! Every field is optional; a missing file section falls back to the
//! built-in registries and the command-line defaults.

use crate::error::{ConfigError, RegistryError};
use crate::options::{RunOptions, DEFAULT_CHUNK_SIZE};
use crate::reader::{DimensionValueReader, FileValuePolicy, DEFAULT_DELIMITER};
use crate::registry::{DimensionRegistry, PrimaryTable, RegionRegistry, SectorRegistry};
use crate::types::Dimension;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Run configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathwaysConfig {
    /// Delimiter for inline lists
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Work units per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Verify chunk output
    #[serde(default = "default_true")]
    pub check_results: bool,

    /// Reinitialize and rerun chunks that fail verification
    #[serde(default = "default_true")]
    pub reinitialize_on_verification_failure: bool,

    /// Coercion policy for id tables
    #[serde(default)]
    pub file_values: FileValuePolicy,

    /// Default number of uncertainty trials
    #[serde(default)]
    pub n_trials: Option<u32>,

    /// Default random seed
    #[serde(default)]
    pub random_seed: Option<i64>,

    /// Root directory for run output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Registry tables
    #[serde(default)]
    pub tables: TableConfig,
}

/// Paths of registry tables; absent tables use built-in defaults or no validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Region names and ISO codes (`region`, `iso_alpha_3`)
    pub regions: Option<PathBuf>,
    /// Sector names and abbreviations (`sector`, `abbreviation_sector`)
    pub sectors: Option<PathBuf>,
    /// Primary id composition
    pub primary: Option<PathBuf>,
    /// Design attribute ids (`design_id`)
    pub design: Option<PathBuf>,
    /// Strategy attribute ids (`strategy_id`)
    pub strategy: Option<PathBuf>,
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./runs")
}

impl Default for PathwaysConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            chunk_size: default_chunk_size(),
            check_results: true,
            reinitialize_on_verification_failure: true,
            file_values: FileValuePolicy::default(),
            n_trials: None,
            random_seed: None,
            output_dir: default_output_dir(),
            tables: TableConfig::default(),
        }
    }
}

/// Registries built from configuration
#[derive(Debug, Clone)]
pub struct Registries {
    /// Sector models
    pub sectors: SectorRegistry,
    /// Regions
    pub regions: RegionRegistry,
    /// Dimension validity predicates
    pub dimensions: DimensionRegistry,
}

impl PathwaysConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text cannot be parsed or validated.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check semantic constraints
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delimiter.is_empty() {
            return Err(ConfigError::Invalid("delimiter must not be empty".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Value reader honoring the configured delimiter and file policy
    #[must_use]
    pub fn reader(&self) -> DimensionValueReader {
        DimensionValueReader::new()
            .with_delimiter(self.delimiter.clone())
            .with_file_policy(self.file_values)
    }

    /// Run options seeded from configuration
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new()
            .with_chunk_size(self.chunk_size)
            .with_check_results(self.check_results)
            .with_reinitialize_on_verification_failure(self.reinitialize_on_verification_failure);
        options.n_trials = self.n_trials;
        options.random_seed = self.random_seed;
        options
    }

    /// Load every configured registry table
    ///
    /// # Errors
    /// Returns error if a configured table cannot be read.
    pub fn registries(&self) -> Result<Registries, RegistryError> {
        let tables = &self.tables;
        let sectors = match &tables.sectors {
            Some(path) => SectorRegistry::from_csv(path)?,
            None => SectorRegistry::with_defaults(),
        };
        let regions = match &tables.regions {
            Some(path) => RegionRegistry::from_csv(path)?,
            None => RegionRegistry::with_defaults(),
        };

        let reader = self.reader();
        let mut dimensions = DimensionRegistry::new();
        if let Some(path) = &tables.design {
            dimensions = dimensions
                .with_design_ids(DimensionRegistry::load_attribute_ids(&reader, path, Dimension::Design)?);
        }
        if let Some(path) = &tables.strategy {
            dimensions = dimensions.with_strategy_ids(DimensionRegistry::load_attribute_ids(
                &reader,
                path,
                Dimension::Strategy,
            )?);
        }
        if let Some(path) = &tables.primary {
            dimensions = dimensions.with_primary_table(PrimaryTable::from_csv(path)?);
        }
        if let Some(n) = self.n_trials {
            dimensions = dimensions.with_n_trials(n);
        }

        Ok(Registries {
            sectors,
            regions,
            dimensions,
        })
    }
}
