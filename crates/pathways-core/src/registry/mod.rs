//! Registries consulted while resolving a run
//!
//! - [`SectorRegistry`]: sector model names and abbreviations
//! - [`RegionRegistry`]: region names and ISO codes
//! - [`DimensionRegistry`]: validity predicates for dimension ids
//! - [`PrimaryTable`]: primary id composition used to expand selections

use crate::error::RegistryError;
use std::fs::File;
use std::path::Path;

mod dimensions;
mod primary;
mod regions;
mod sectors;

pub use dimensions::DimensionRegistry;
pub use primary::{PrimaryRow, PrimaryTable};
pub use regions::{RegionRegistry, ALL_REGIONS};
pub use sectors::SectorRegistry;

/// Open a registry table with trimmed fields
fn open_table(path: &Path) -> Result<csv::Reader<File>, RegistryError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| RegistryError::read(path, e))
}

/// Position of a required column
fn require_column(
    headers: &csv::StringRecord,
    column: &str,
    path: &Path,
) -> Result<usize, RegistryError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| RegistryError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })
}

/// Read two required text columns from a table, skipping nothing
fn read_pairs(path: &Path, first: &str, second: &str) -> Result<Vec<(String, String)>, RegistryError> {
    let mut reader = open_table(path)?;
    let headers = reader
        .headers()
        .map_err(|e| RegistryError::read(path, e))?
        .clone();
    let a = require_column(&headers, first, path)?;
    let b = require_column(&headers, second, path)?;

    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| RegistryError::read(path, e))?;
        let row = i + 2;
        let left = record.get(a).unwrap_or("");
        let right = record.get(b).unwrap_or("");
        for (column, value) in [(first, left), (second, right)] {
            if value.is_empty() {
                return Err(RegistryError::InvalidValue {
                    path: path.to_path_buf(),
                    row,
                    column: column.to_string(),
                    value: value.to_string(),
                });
            }
        }
        out.push((left.to_string(), right.to_string()));
    }
    Ok(out)
}
