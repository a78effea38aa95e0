//! Primary id table
//!
//! Each primary id names one (design, future, strategy) combination.

use super::open_table;
use crate::error::RegistryError;
use crate::types::{Dimension, DimensionId, ResolvedDimensions, Selection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One row of the primary table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryRow {
    pub primary_id: DimensionId,
    pub design_id: DimensionId,
    pub future_id: DimensionId,
    pub strategy_id: DimensionId,
}

impl PrimaryRow {
    /// Create a row
    #[inline]
    #[must_use]
    pub fn new(
        primary_id: DimensionId,
        design_id: DimensionId,
        future_id: DimensionId,
        strategy_id: DimensionId,
    ) -> Self {
        Self {
            primary_id,
            design_id,
            future_id,
            strategy_id,
        }
    }

    /// Value of a dimension for this row
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> DimensionId {
        match dimension {
            Dimension::Design => self.design_id,
            Dimension::Future => self.future_id,
            Dimension::Primary => self.primary_id,
            Dimension::Strategy => self.strategy_id,
        }
    }
}

/// Primary id table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryTable {
    rows: Vec<PrimaryRow>,
}

impl PrimaryTable {
    /// Build from rows; later duplicates of a primary id are dropped
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = PrimaryRow>) -> Self {
        let mut seen = HashSet::new();
        let rows = rows
            .into_iter()
            .filter(|r| seen.insert(r.primary_id))
            .collect();
        Self { rows }
    }

    /// Load from a table with the four id columns
    pub fn from_csv(path: &Path) -> Result<Self, RegistryError> {
        let mut reader = open_table(path)?;
        let rows = reader
            .deserialize::<PrimaryRow>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RegistryError::read(path, e))?;
        let table = Self::from_rows(rows);
        tracing::debug!(path = %path.display(), count = table.len(), "loaded primary table");
        Ok(table)
    }

    /// Check if a primary id exists
    #[inline]
    #[must_use]
    pub fn contains(&self, primary_id: DimensionId) -> bool {
        self.rows.iter().any(|r| r.primary_id == primary_id)
    }

    /// Every primary id in table order
    #[must_use]
    pub fn ids(&self) -> Vec<DimensionId> {
        self.rows.iter().map(|r| r.primary_id).collect()
    }

    /// Rows in table order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[PrimaryRow] {
        &self.rows
    }

    /// Get number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Primary ids selected by a resolved dimension map
    ///
    /// A primary entry selects directly. Otherwise rows must match every
    /// design/future/strategy entry holding explicit values; `Unrestricted`
    /// and `Empty` entries impose no filter.
    #[must_use]
    pub fn expand(&self, dimensions: &ResolvedDimensions) -> Vec<DimensionId> {
        if let Some(primary) = dimensions.get(Dimension::Primary) {
            return match primary {
                Selection::Unrestricted => self.ids(),
                Selection::Empty => Vec::new(),
                Selection::Values(ids) => ids.clone(),
            };
        }

        let filters: Vec<(Dimension, HashSet<DimensionId>)> = Dimension::SECONDARY
            .into_iter()
            .filter_map(|d| {
                dimensions
                    .get(d)
                    .and_then(Selection::values)
                    .map(|ids| (d, ids.iter().copied().collect()))
            })
            .collect();

        self.rows
            .iter()
            .filter(|row| filters.iter().all(|(d, ids)| ids.contains(&row.get(*d))))
            .map(|row| row.primary_id)
            .collect()
    }
}
