//! Error types for pathways-core
//!
//! Provides error handling for:
//! - Dimension value parsing (inline lists and id tables)
//! - Registry table loading
//! - Dispatch guards and lifecycle
//! - Execution engine failures
//! - Configuration loading

use crate::state_machine::DispatchState;
use crate::types::{Dimension, DimensionId};
use std::path::PathBuf;

/// Main error type
#[derive(Debug, thiserror::Error)]
pub enum PathwaysError {
    /// Dimension resolution failed
    #[error("dimension error: {0}")]
    Dimension(#[from] DimensionError),

    /// Registry table could not be loaded
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Dispatch failed
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PathwaysError {
    /// Check if the error was caused by user input rather than the engine
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Dimension(_) | Self::Config(_) | Self::Registry(_) => true,
            Self::Dispatch(e) => e.is_user_error(),
        }
    }
}

/// Result type alias for pathways operations
pub type PathwaysResult<T> = Result<T, PathwaysError>;

/// Errors while reading the requested values of one dimension
#[derive(Debug, thiserror::Error)]
pub enum DimensionError {
    /// Inline token could not be coerced to the value type
    #[error("error trying to read '{key}' values from input string: cannot parse '{token}': {reason}")]
    Parse {
        key: String,
        token: String,
        reason: String,
    },

    /// Id table lacks the required column
    #[error("error reading keys from file {path}: key '{column}' not found in the file")]
    Schema { column: String, path: PathBuf },

    /// Id table cell could not be coerced to the value type
    #[error("error reading keys from file {path}: row {row} of '{column}' has value '{token}': {reason}")]
    FileValue {
        path: PathBuf,
        column: String,
        row: usize,
        token: String,
        reason: String,
    },

    /// Id table could not be read
    #[error("error trying to read keys from file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Ids fall outside the dimension's registered domain
    #[error("invalid {dimension} values {ids:?}: {reason}")]
    OutOfDomain {
        dimension: Dimension,
        ids: Vec<DimensionId>,
        reason: String,
    },
}

impl DimensionError {
    /// Create a parse error for an inline token
    pub fn parse(key: impl Into<String>, token: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            key: key.into(),
            token: token.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a schema error for a missing column
    pub fn schema(column: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Schema {
            column: column.into(),
            path: path.into(),
        }
    }
}

/// Errors while loading registry tables
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Table could not be read
    #[error("error reading table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Table lacks a required column
    #[error("table {path} is missing required column '{column}'")]
    MissingColumn { column: String, path: PathBuf },

    /// Table row holds an unusable value
    #[error("table {path} row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    /// Attribute id table failed to load
    #[error("attribute ids: {0}")]
    Ids(#[from] DimensionError),
}

impl RegistryError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

/// Guard conditions checked before contacting the execution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardViolation {
    /// Region list resolved to zero regions
    #[error("no valid regions were specified")]
    EmptyRegions,

    /// Dimension map holds no entries
    #[error("dimension map is empty")]
    EmptyDimensions,

    /// Model list resolved to zero models
    #[error("no valid models were specified")]
    EmptyModels,

    /// Every requested dimension resolved to zero ids
    #[error("every requested dimension resolved to zero ids")]
    AllDimensionsEmpty,

    /// Chunk size of zero
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,

    /// Zero solve attempts
    #[error("max solve attempts must be at least 1")]
    ZeroSolveAttempts,
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No usable dimensional selection
    #[error(
        "no valid dimensional subsets or scenarios were specified; specify either \
         primary_id or any combination of design_id, future_id and strategy_id"
    )]
    SelectionEmpty,

    /// Guard failed at the dispatch boundary
    #[error("invalid specification of regions, input dimensions: {0}")]
    Guard(#[from] GuardViolation),

    /// Engine failure, surfaced unchanged
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Lifecycle misuse
    #[error("illegal dispatch transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: DispatchState,
        to: DispatchState,
    },
}

impl DispatchError {
    /// Check if the error stems from the request rather than the engine
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::SelectionEmpty | Self::Guard(_))
    }

    /// Check if the engine was never contacted
    #[inline]
    #[must_use]
    pub fn is_pre_dispatch(&self) -> bool {
        !matches!(self, Self::Engine(_))
    }
}

/// Errors raised by a batch runner for a single unit or chunk
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// Numerical or solver instability; eligible for another attempt
    #[error("solver instability: {0}")]
    SolverInstability(String),

    /// Unit failed; not retried
    #[error("unit failed: {0}")]
    Failed(String),

    /// Unrecoverable failure; aborts the run
    #[error("fatal: {0}")]
    Fatal(String),
}

impl BatchError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SolverInstability(_))
    }

    /// Check if error aborts the run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Execution engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Design/future/strategy selections need the primary table to expand
    #[error("a primary attribute table is required to expand {0} selections")]
    MissingPrimaryTable(Dimension),

    /// A chunk hit an unrecoverable runner error
    #[error("chunk {chunk} aborted: {source}")]
    Batch {
        chunk: usize,
        #[source]
        source: BatchError,
    },

    /// Collaborator-specific error
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    /// Wrap any collaborator error
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(error))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the configuration file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Semantically invalid value
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Run identifier that cannot name a single directory under the output root
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid run id '{id}': {reason}")]
pub struct InvalidRunId {
    pub id: String,
    pub reason: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_column_and_path() {
        let err = DimensionError::schema("future_id", "/tmp/ids.csv");
        let msg = err.to_string();
        assert!(msg.contains("future_id"));
        assert!(msg.contains("/tmp/ids.csv"));
    }

    #[test]
    fn parse_error_includes_token() {
        let err = DimensionError::parse("design_id", "x1", "invalid digit found in string");
        assert!(err.to_string().contains("'x1'"));
    }

    #[test]
    fn batch_error_classification() {
        assert!(BatchError::SolverInstability("nan".into()).is_retryable());
        assert!(!BatchError::Failed("bad".into()).is_retryable());
        assert!(BatchError::Fatal("disk".into()).is_fatal());
        assert!(!BatchError::SolverInstability("nan".into()).is_fatal());
    }

    #[test]
    fn engine_errors_surface_verbatim() {
        let inner = EngineError::Batch {
            chunk: 3,
            source: BatchError::Fatal("disk full".into()),
        };
        let expected = inner.to_string();
        let err = DispatchError::from(inner);
        assert_eq!(err.to_string(), expected);
        assert!(!err.is_pre_dispatch());
        assert!(!err.is_user_error());
    }

    #[test]
    fn invalid_run_id_names_the_id() {
        let err = InvalidRunId {
            id: "../x".into(),
            reason: "must not contain path separators",
        };
        assert_eq!(
            err.to_string(),
            "invalid run id '../x': must not contain path separators"
        );
    }

    #[test]
    fn guard_errors_are_user_errors() {
        let err = DispatchError::from(GuardViolation::EmptyRegions);
        assert!(err.is_user_error());
        assert!(err.is_pre_dispatch());
        assert!(PathwaysError::from(err).is_user_error());
    }
}
