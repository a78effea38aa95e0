//! Dimension validity predicates

use super::PrimaryTable;
use crate::error::DimensionError;
use crate::reader::DimensionValueReader;
use crate::types::{Dimension, DimensionId, Selection};
use std::collections::BTreeSet;
use std::path::Path;

/// Validity predicates for each dimension
///
/// - design / strategy: membership in the registered attribute ids
/// - future: `0 <= x <= n_trials` (0 is the null trial)
/// - primary: membership in the primary table
///
/// A predicate without backing data only enforces what it can: future ids
/// must still be non-negative, everything else is accepted.
#[derive(Debug, Clone, Default)]
pub struct DimensionRegistry {
    design_ids: Option<BTreeSet<DimensionId>>,
    strategy_ids: Option<BTreeSet<DimensionId>>,
    n_trials: Option<u32>,
    primary: Option<PrimaryTable>,
}

impl DimensionRegistry {
    /// Create a registry with no backing data
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With registered design ids
    #[must_use]
    pub fn with_design_ids(mut self, ids: impl IntoIterator<Item = DimensionId>) -> Self {
        self.design_ids = Some(ids.into_iter().collect());
        self
    }

    /// With registered strategy ids
    #[must_use]
    pub fn with_strategy_ids(mut self, ids: impl IntoIterator<Item = DimensionId>) -> Self {
        self.strategy_ids = Some(ids.into_iter().collect());
        self
    }

    /// With number of trials bounding future ids
    #[inline]
    #[must_use]
    pub fn with_n_trials(mut self, n_trials: u32) -> Self {
        self.n_trials = Some(n_trials);
        self
    }

    /// With primary table
    #[inline]
    #[must_use]
    pub fn with_primary_table(mut self, table: PrimaryTable) -> Self {
        self.primary = Some(table);
        self
    }

    /// Number of trials, if known
    #[inline]
    #[must_use]
    pub fn n_trials(&self) -> Option<u32> {
        self.n_trials
    }

    /// Primary table, if loaded
    #[inline]
    #[must_use]
    pub fn primary_table(&self) -> Option<&PrimaryTable> {
        self.primary.as_ref()
    }

    /// Read the registered ids of `dimension` from an attribute table
    ///
    /// The table must hold a column named after the dimension key.
    pub fn load_attribute_ids(
        reader: &DimensionValueReader,
        path: &Path,
        dimension: Dimension,
    ) -> Result<BTreeSet<DimensionId>, DimensionError> {
        let ids = match reader.read_file::<DimensionId>(path, dimension.key())? {
            Selection::Values(ids) => ids.into_iter().collect(),
            Selection::Empty | Selection::Unrestricted => BTreeSet::new(),
        };
        Ok(ids)
    }

    /// Check a single id
    #[must_use]
    pub fn is_valid(&self, dimension: Dimension, id: DimensionId) -> bool {
        match dimension {
            Dimension::Design => self.design_ids.as_ref().map_or(true, |s| s.contains(&id)),
            Dimension::Strategy => self.strategy_ids.as_ref().map_or(true, |s| s.contains(&id)),
            Dimension::Future => {
                id >= 0 && self.n_trials.map_or(true, |n| id <= DimensionId::from(n))
            }
            Dimension::Primary => self.primary.as_ref().map_or(true, |t| t.contains(id)),
        }
    }

    /// Check every id of a selection
    ///
    /// # Errors
    /// `DimensionError::OutOfDomain` listing every invalid id
    pub fn validate(
        &self,
        dimension: Dimension,
        selection: &Selection<DimensionId>,
    ) -> Result<(), DimensionError> {
        let Some(ids) = selection.values() else {
            return Ok(());
        };
        let invalid: Vec<DimensionId> = ids
            .iter()
            .copied()
            .filter(|id| !self.is_valid(dimension, *id))
            .collect();
        if invalid.is_empty() {
            return Ok(());
        }
        Err(DimensionError::OutOfDomain {
            dimension,
            ids: invalid,
            reason: self.domain_description(dimension),
        })
    }

    fn domain_description(&self, dimension: Dimension) -> String {
        match (dimension, self.n_trials) {
            (Dimension::Future, Some(n)) => format!("future ids must satisfy 0 <= x <= {n}"),
            (Dimension::Future, None) => "future ids must be non-negative".to_string(),
            (Dimension::Primary, _) => "not found in the primary table".to_string(),
            (d, _) => format!("not defined in the {} attribute table", d.key()),
        }
    }
}
