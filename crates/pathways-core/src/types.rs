//! Core types
//!
//! Defines the fundamental types for run selection:
//! - Scenario dimensions and their keys
//! - The three-way `Selection` (unrestricted, empty, explicit values)
//! - Raw user selectors
//! - Resolved dimension maps
//! - Output database kinds and run identifiers

use crate::error::InvalidRunId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Identifier type for every scenario dimension
pub type DimensionId = i64;

/// Sentinel accepted by dimension and model inputs to mean "no restriction"
pub const ALL_SENTINEL: &str = "all";

/// Scenario dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Design (model structure) id
    #[serde(rename = "design_id")]
    Design,
    /// Future (uncertainty trial) id
    #[serde(rename = "future_id")]
    Future,
    /// Primary id, a composite of the other three
    #[serde(rename = "primary_id")]
    Primary,
    /// Strategy id
    #[serde(rename = "strategy_id")]
    Strategy,
}

impl Dimension {
    /// Every dimension
    pub const ALL: [Dimension; 4] = [
        Dimension::Design,
        Dimension::Future,
        Dimension::Primary,
        Dimension::Strategy,
    ];

    /// Dimensions subsumed by the primary id
    pub const SECONDARY: [Dimension; 3] =
        [Dimension::Design, Dimension::Future, Dimension::Strategy];

    /// Canonical key (id table column name)
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Dimension::Design => "design_id",
            Dimension::Future => "future_id",
            Dimension::Primary => "primary_id",
            Dimension::Strategy => "strategy_id",
        }
    }

    /// Command-line key
    #[inline]
    #[must_use]
    pub fn cli_key(self) -> &'static str {
        match self {
            Dimension::Design => "keys_design",
            Dimension::Future => "keys_future",
            Dimension::Primary => "keys_primary",
            Dimension::Strategy => "keys_strategy",
        }
    }

    /// Look up a dimension from its command-line key
    #[must_use]
    pub fn from_cli_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.cli_key() == key)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.key() == s || d.cli_key() == s)
            .ok_or_else(|| format!("unknown dimension '{s}'"))
    }
}

/// Requested values for one axis of a run
///
/// `Values` never holds an empty vector once it has passed through
/// `from_values`, `deduplicated` or `ResolvedDimensions::insert`; a bare
/// `Values(vec![])` is still treated as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T> {
    /// No filter; everything registered
    Unrestricted,
    /// Explicitly present but resolved to nothing
    Empty,
    /// Explicit values
    Values(Vec<T>),
}

impl<T> Selection<T> {
    /// Build from a list, mapping an empty list to `Empty`
    #[inline]
    #[must_use]
    pub fn from_values(values: Vec<T>) -> Self {
        if values.is_empty() {
            Self::Empty
        } else {
            Self::Values(values)
        }
    }

    /// No filter
    #[inline]
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Present but empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Values(v) => v.is_empty(),
            Self::Unrestricted => false,
        }
    }

    /// Explicit values, if any
    #[inline]
    #[must_use]
    pub fn values(&self) -> Option<&[T]> {
        match self {
            Self::Values(v) => Some(v),
            _ => None,
        }
    }

    /// Number of explicit values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values().map_or(0, <[T]>::len)
    }

    /// Map explicit values
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Selection<U> {
        match self {
            Self::Unrestricted => Selection::Unrestricted,
            Self::Empty => Selection::Empty,
            Self::Values(v) => Selection::from_values(v.into_iter().map(f).collect()),
        }
    }
}

impl<T: Eq + Hash> Selection<T> {
    /// Drop repeated values, keeping first occurrences in order
    ///
    /// An empty `Values` normalizes to `Empty`.
    #[must_use]
    pub fn deduplicated(self) -> Self {
        match self {
            Self::Values(v) => {
                let set: IndexSet<T> = v.into_iter().collect();
                Self::from_values(set.into_iter().collect())
            }
            other => other,
        }
    }
}

impl<T> From<Vec<T>> for Selection<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_values(values)
    }
}

/// Region selection: all registered regions, none, or canonical region names
pub type RegionSelection = Selection<String>;

/// Model selection: every sector model, none, or canonical sector names
pub type ModelSelection = Selection<String>;

/// Raw dimension input as supplied by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSelector {
    /// "Run everything" sentinel
    All,
    /// Path to an id table
    FilePath(PathBuf),
    /// Delimited inline list
    Delimited(String),
}

impl RawSelector {
    /// Classify user input
    ///
    /// The sentinel is matched case-insensitively; an existing file wins
    /// over inline parsing.
    #[must_use]
    pub fn classify(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case(ALL_SENTINEL) {
            return Self::All;
        }
        let path = Path::new(trimmed);
        if !trimmed.is_empty() && path.is_file() {
            return Self::FilePath(path.to_path_buf());
        }
        Self::Delimited(input.to_string())
    }
}

/// Canonical mapping from dimension to requested ids
///
/// When `primary` is present the other dimensions are absent. Only built
/// through `insert`, so it is serialized for manifests but never deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedDimensions {
    entries: BTreeMap<Dimension, Selection<DimensionId>>,
}

impl ResolvedDimensions {
    /// Create an empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry map for primary ids
    #[must_use]
    pub fn primary(selection: Selection<DimensionId>) -> Self {
        let mut out = Self::new();
        out.insert(Dimension::Primary, selection);
        out
    }

    /// Insert a dimension's selection (deduplicated)
    ///
    /// Inserting `Primary` drops every other entry. Inserting another
    /// dimension while `Primary` is present is refused and returns `false`.
    pub fn insert(&mut self, dimension: Dimension, selection: Selection<DimensionId>) -> bool {
        if dimension == Dimension::Primary {
            self.entries.clear();
        } else if self.entries.contains_key(&Dimension::Primary) {
            return false;
        }
        self.entries.insert(dimension, selection.deduplicated());
        true
    }

    /// With a dimension's selection
    #[inline]
    #[must_use]
    pub fn with(mut self, dimension: Dimension, selection: Selection<DimensionId>) -> Self {
        self.insert(dimension, selection);
        self
    }

    /// Selection for a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&Selection<DimensionId>> {
        self.entries.get(&dimension)
    }

    /// Check if a dimension is present
    #[inline]
    #[must_use]
    pub fn contains(&self, dimension: Dimension) -> bool {
        self.entries.contains_key(&dimension)
    }

    /// Number of present dimensions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no dimension is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if at least one dimension is present and every one is `Empty`
    #[must_use]
    pub fn all_empty(&self) -> bool {
        !self.entries.is_empty() && self.entries.values().all(Selection::is_empty)
    }

    /// Iterate entries in dimension order
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &Selection<DimensionId>)> {
        self.entries.iter().map(|(d, s)| (*d, s))
    }

    /// Present dimensions
    #[must_use]
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.entries.keys().copied().collect()
    }
}

/// Output database kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// SQLite database (default)
    #[default]
    Sqlite,
    /// CSV tables
    Csv,
}

impl DatabaseKind {
    /// Parse, falling back to `Sqlite` for unknown kinds
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(database_type = value, "unknown database type; using sqlite");
            Self::Sqlite
        })
    }

    /// Name as accepted on the command line
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::Csv => "csv",
        }
    }
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown database type '{other}'")),
        }
    }
}

/// Run (analysis) identifier
///
/// Always a single plain path component, so it can name the run's
/// directory under the output root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RunId(String);

impl RunId {
    /// Use a caller-supplied identifier
    ///
    /// # Errors
    /// Returns `InvalidRunId` for blank ids, `.`/`..`, absolute paths, or
    /// ids containing path separators or drive prefixes.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidRunId> {
        let id = id.into();
        let reason = if id.trim().is_empty() {
            Some("must not be blank")
        } else if id.contains(['/', '\\', ':', '\0']) {
            Some("must not contain path separators")
        } else {
            let mut components = Path::new(&id).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => None,
                _ => Some("must be a single plain directory name"),
            }
        };
        match reason {
            Some(reason) => Err(InvalidRunId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// Generate a timestamped identifier
    #[must_use]
    pub fn generate() -> Self {
        let now = chrono::Utc::now();
        Self(format!(
            "analysis_run_{}",
            now.format("%Y-%m-%dT%H;%M;%S%.6f")
        ))
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RunId {
    type Err = InvalidRunId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RunId {
    type Error = InvalidRunId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dimension_keys() {
        assert_eq!(Dimension::Future.key(), "future_id");
        assert_eq!(Dimension::Strategy.cli_key(), "keys_strategy");
        assert_eq!(Dimension::from_cli_key("keys_primary"), Some(Dimension::Primary));
        assert_eq!(Dimension::from_cli_key("keys_bogus"), None);
        assert_eq!("design_id".parse::<Dimension>(), Ok(Dimension::Design));
    }

    #[test]
    fn selection_from_empty_vec_is_empty() {
        assert_eq!(Selection::<i64>::from_values(vec![]), Selection::Empty);
        assert_eq!(Selection::from(vec![1, 2]), Selection::Values(vec![1, 2]));
    }

    #[test]
    fn bare_empty_values_count_as_empty() {
        let bare: Selection<i64> = Selection::Values(vec![]);
        assert!(bare.is_empty());
        assert_eq!(bare.clone().deduplicated(), Selection::Empty);

        let dims = ResolvedDimensions::primary(bare);
        assert_eq!(dims.get(Dimension::Primary), Some(&Selection::Empty));
        assert!(dims.all_empty());
    }

    #[test]
    fn selection_dedup_keeps_first_occurrence() {
        let sel = Selection::Values(vec![3, 1, 3, 2, 1]).deduplicated();
        assert_eq!(sel, Selection::Values(vec![3, 1, 2]));
    }

    #[test]
    fn classify_sentinel_and_inline() {
        assert_eq!(RawSelector::classify("ALL"), RawSelector::All);
        assert_eq!(RawSelector::classify(" all "), RawSelector::All);
        assert_eq!(
            RawSelector::classify("1,2,3"),
            RawSelector::Delimited("1,2,3".to_string())
        );
        assert_eq!(RawSelector::classify(""), RawSelector::Delimited(String::new()));
    }

    #[test]
    fn classify_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "future_id").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert_eq!(
            RawSelector::classify(&path),
            RawSelector::FilePath(file.path().to_path_buf())
        );
    }

    #[test]
    fn primary_insert_clears_secondary() {
        let mut dims = ResolvedDimensions::new()
            .with(Dimension::Design, Selection::Values(vec![1]))
            .with(Dimension::Future, Selection::Values(vec![2]));
        assert_eq!(dims.len(), 2);

        dims.insert(Dimension::Primary, Selection::Values(vec![10, 11]));
        assert_eq!(dims.dimensions(), vec![Dimension::Primary]);

        assert!(!dims.insert(Dimension::Strategy, Selection::Values(vec![4])));
        assert!(!dims.contains(Dimension::Strategy));
    }

    #[test]
    fn all_empty_requires_entries() {
        assert!(!ResolvedDimensions::new().all_empty());
        let dims = ResolvedDimensions::new().with(Dimension::Future, Selection::Empty);
        assert!(dims.all_empty());
        let dims = dims.with(Dimension::Design, Selection::Values(vec![1]));
        assert!(!dims.all_empty());
    }

    #[test]
    fn database_kind_parsing() {
        assert_eq!("CSV".parse::<DatabaseKind>(), Ok(DatabaseKind::Csv));
        assert_eq!(DatabaseKind::parse_lenient("postgres"), DatabaseKind::Sqlite);
        assert_eq!(DatabaseKind::default().to_string(), "sqlite");
    }

    #[test]
    fn generated_run_ids_are_prefixed() {
        let id = RunId::generate();
        assert!(id.as_str().starts_with("analysis_run_"));
        assert_eq!(RunId::new("calib").unwrap().to_string(), "calib");
    }

    #[test]
    fn run_ids_stay_inside_output_root() {
        for bad in ["", "  ", ".", "..", "../escape", "a/b", "/tmp/abs", "a\\b", "C:run"] {
            assert!(RunId::new(bad).is_err(), "accepted {bad:?}");
        }
        assert!("nightly_2026-10-19".parse::<RunId>().is_ok());
        assert!(RunId::generate().as_str().parse::<RunId>().is_ok());
    }

    #[test]
    fn run_id_deserialization_validates() {
        let ok: RunId = serde_json::from_str("\"calib\"").unwrap();
        assert_eq!(ok.as_str(), "calib");
        assert!(serde_json::from_str::<RunId>("\"../calib\"").is_err());
    }
}
