//! Dimension value reader
//!
//! Reads one dimension's requested values from an inline delimited list or
//! from a column of an id table (CSV with a header row). Inline input is
//! always strict: one bad token fails the whole read.

use crate::error::DimensionError;
use crate::types::{RawSelector, Selection};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Default list delimiter
pub const DEFAULT_DELIMITER: &str = ",";

/// How id table cells that fail coercion are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileValuePolicy {
    /// Any bad cell fails the read
    #[default]
    Strict,
    /// Bad cells are skipped with a warning
    SkipNonNumeric,
}

/// Reader for dimension values
#[derive(Debug, Clone)]
pub struct DimensionValueReader {
    delimiter: String,
    file_policy: FileValuePolicy,
}

impl Default for DimensionValueReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DimensionValueReader {
    /// Create a reader with the default delimiter and strict file policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            file_policy: FileValuePolicy::Strict,
        }
    }

    /// With delimiter
    #[inline]
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// With file coercion policy
    #[inline]
    #[must_use]
    pub fn with_file_policy(mut self, policy: FileValuePolicy) -> Self {
        self.file_policy = policy;
        self
    }

    /// Delimiter in use
    #[inline]
    #[must_use]
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Read values for `key`
    ///
    /// # Errors
    /// - `DimensionError::Parse` for a bad inline token
    /// - `DimensionError::Schema` when the table lacks column `key`
    /// - `DimensionError::FileValue` for a bad cell under the strict policy
    /// - `DimensionError::Read` when the table cannot be read
    pub fn read<T>(&self, raw: &RawSelector, key: &str) -> Result<Selection<T>, DimensionError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match raw {
            RawSelector::All => Ok(Selection::Unrestricted),
            RawSelector::FilePath(path) => self.read_file(path, key),
            RawSelector::Delimited(input) => self.read_delimited(input, key),
        }
    }

    /// Read an inline delimited list
    ///
    /// Blank input yields `Empty`; a blank token inside a list is an error.
    pub fn read_delimited<T>(&self, input: &str, key: &str) -> Result<Selection<T>, DimensionError>
    where
        T: FromStr,
        T::Err: Display,
    {
        if input.trim().is_empty() {
            return Ok(Selection::Empty);
        }

        let values = input
            .split(self.delimiter.as_str())
            .map(str::trim)
            .map(|token| {
                token
                    .parse::<T>()
                    .map_err(|e| DimensionError::parse(key, token, e))
            })
            .collect::<Result<Vec<T>, _>>()?;

        Ok(Selection::from_values(values))
    }

    /// Read column `key` of an id table
    pub fn read_file<T>(&self, path: &Path, key: &str) -> Result<Selection<T>, DimensionError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let read_err = |source| DimensionError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(read_err)?;

        let column = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .position(|h| h == key)
            .ok_or_else(|| DimensionError::schema(key, path))?;

        let mut values = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(read_err)?;
            // header is line 1
            let row = i + 2;
            let cell = record.get(column).unwrap_or("");
            match cell.parse::<T>() {
                Ok(v) => values.push(v),
                Err(e) => match self.file_policy {
                    FileValuePolicy::Strict => {
                        return Err(DimensionError::FileValue {
                            path: path.to_path_buf(),
                            column: key.to_string(),
                            row,
                            token: cell.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    FileValuePolicy::SkipNonNumeric => {
                        tracing::warn!(
                            path = %path.display(),
                            column = key,
                            row,
                            value = cell,
                            "skipping non-numeric id"
                        );
                    }
                },
            }
        }

        tracing::debug!(path = %path.display(), column = key, count = values.len(), "read id table");
        Ok(Selection::from_values(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn inline_list_preserves_order() {
        let reader = DimensionValueReader::new();
        let sel: Selection<i64> = reader.read_delimited("3,1,2", "design_id").unwrap();
        assert_eq!(sel, Selection::Values(vec![3, 1, 2]));
    }

    #[test]
    fn inline_tokens_are_trimmed() {
        let reader = DimensionValueReader::new();
        let sel: Selection<i64> = reader.read_delimited(" 1 , 2 ", "design_id").unwrap();
        assert_eq!(sel, Selection::Values(vec![1, 2]));
    }

    #[test]
    fn inline_bad_token_fails_whole_read() {
        let reader = DimensionValueReader::new();
        let err = reader
            .read_delimited::<i64>("1,two,3", "future_id")
            .unwrap_err();
        match err {
            DimensionError::Parse { token, key, .. } => {
                assert_eq!(token, "two");
                assert_eq!(key, "future_id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn inline_blank_token_inside_list_fails() {
        let reader = DimensionValueReader::new();
        assert!(reader.read_delimited::<i64>("1,,2", "design_id").is_err());
    }

    #[test]
    fn inline_blank_input_is_empty() {
        let reader = DimensionValueReader::new();
        let sel: Selection<i64> = reader.read_delimited("  ", "future_id").unwrap();
        assert_eq!(sel, Selection::Empty);
    }

    #[test]
    fn custom_delimiter() {
        let reader = DimensionValueReader::new().with_delimiter(";");
        let sel: Selection<i64> = reader.read_delimited("4;5", "strategy_id").unwrap();
        assert_eq!(sel, Selection::Values(vec![4, 5]));
    }

    #[test]
    fn sentinel_is_unrestricted() {
        let reader = DimensionValueReader::new();
        let sel: Selection<i64> = reader.read(&RawSelector::All, "design_id").unwrap();
        assert!(sel.is_unrestricted());
    }

    #[test]
    fn file_column_is_read() {
        let file = table("region,future_id\nbrazil,0\nchile,5\nperu,12\n");
        let reader = DimensionValueReader::new();
        let sel: Selection<i64> = reader.read_file(file.path(), "future_id").unwrap();
        assert_eq!(sel, Selection::Values(vec![0, 5, 12]));
    }

    #[test]
    fn file_missing_column_is_schema_error() {
        let file = table("design_id\n1\n");
        let reader = DimensionValueReader::new();
        let err = reader.read_file::<i64>(file.path(), "future_id").unwrap_err();
        assert!(matches!(err, DimensionError::Schema { ref column, .. } if column == "future_id"));
    }

    #[test]
    fn file_header_only_is_empty() {
        let file = table("future_id\n");
        let reader = DimensionValueReader::new();
        let sel: Selection<i64> = reader.read_file(file.path(), "future_id").unwrap();
        assert_eq!(sel, Selection::Empty);
    }

    #[test]
    fn file_bad_cell_is_strict_by_default() {
        let file = table("future_id\n1\nn/a\n3\n");
        let reader = DimensionValueReader::new();
        let err = reader.read_file::<i64>(file.path(), "future_id").unwrap_err();
        assert!(matches!(err, DimensionError::FileValue { row: 3, .. }));
    }

    #[test]
    fn file_bad_cell_skipped_when_lenient() {
        let file = table("future_id\n1\nn/a\n3\n");
        let reader = DimensionValueReader::new().with_file_policy(FileValuePolicy::SkipNonNumeric);
        let sel: Selection<i64> = reader.read_file(file.path(), "future_id").unwrap();
        assert_eq!(sel, Selection::Values(vec![1, 3]));
    }

    #[test]
    fn string_values_are_supported() {
        let reader = DimensionValueReader::new();
        let sel: Selection<String> = reader.read_delimited("bra,chl", "region").unwrap();
        assert_eq!(sel, Selection::Values(vec!["bra".to_string(), "chl".to_string()]));
    }
}
