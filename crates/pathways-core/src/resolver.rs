//! Dimensional key resolution
//!
//! Turns the four raw dimension inputs into a [`ResolvedDimensions`] map.
//!
//! # Precedence
//! A primary input, when supplied, is the only input read. Design, future
//! and strategy are read only when primary is absent.

use crate::error::DimensionError;
use crate::reader::DimensionValueReader;
use crate::registry::DimensionRegistry;
use crate::types::{Dimension, DimensionId, RawSelector, ResolvedDimensions};
use std::collections::BTreeMap;

/// Raw inputs per dimension; absent dimensions were not supplied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionInputs {
    inputs: BTreeMap<Dimension, RawSelector>,
}

impl DimensionInputs {
    /// Create with no inputs
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a classified input
    pub fn set(&mut self, dimension: Dimension, selector: RawSelector) {
        self.inputs.insert(dimension, selector);
    }

    /// With a raw string input, classified
    #[must_use]
    pub fn with(mut self, dimension: Dimension, input: &str) -> Self {
        self.set(dimension, RawSelector::classify(input));
        self
    }

    /// With an optional raw string input; `None` leaves the dimension absent
    #[must_use]
    pub fn with_optional(self, dimension: Dimension, input: Option<&str>) -> Self {
        match input {
            Some(input) => self.with(dimension, input),
            None => self,
        }
    }

    /// Build from command-line keys (`keys_design`, ...)
    ///
    /// Unknown keys are ignored.
    #[must_use]
    pub fn from_cli<'a>(args: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        args.into_iter().fold(Self::new(), |acc, (key, value)| {
            match Dimension::from_cli_key(key) {
                Some(dimension) => acc.with_optional(dimension, value),
                None => acc,
            }
        })
    }

    /// Input for a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&RawSelector> {
        self.inputs.get(&dimension)
    }

    /// Check if no input was supplied
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Resolves dimension inputs into the canonical dimension map
#[derive(Debug, Clone)]
pub struct DimensionalKeyResolver<'a> {
    reader: DimensionValueReader,
    registry: &'a DimensionRegistry,
}

impl<'a> DimensionalKeyResolver<'a> {
    /// Create a resolver
    #[inline]
    #[must_use]
    pub fn new(reader: DimensionValueReader, registry: &'a DimensionRegistry) -> Self {
        Self { reader, registry }
    }

    /// Resolve inputs
    ///
    /// Returns `Ok(None)` when no dimension input was usable. A dimension
    /// that was supplied but resolved to zero ids stays in the map as
    /// `Selection::Empty`.
    ///
    /// # Errors
    /// Any read or validity failure is fatal for the whole resolution.
    pub fn resolve(
        &self,
        inputs: &DimensionInputs,
    ) -> Result<Option<ResolvedDimensions>, DimensionError> {
        let mut resolved = ResolvedDimensions::new();

        if let Some(raw) = inputs.get(Dimension::Primary) {
            let selection = self.resolve_one(Dimension::Primary, raw)?;
            resolved.insert(Dimension::Primary, selection);
            let ignored: Vec<&str> = Dimension::SECONDARY
                .into_iter()
                .filter(|d| inputs.get(*d).is_some())
                .map(Dimension::key)
                .collect();
            if !ignored.is_empty() {
                tracing::info!(?ignored, "primary ids supplied; ignoring other dimensions");
            }
        } else {
            for dimension in Dimension::SECONDARY {
                if let Some(raw) = inputs.get(dimension) {
                    let selection = self.resolve_one(dimension, raw)?;
                    resolved.insert(dimension, selection);
                }
            }
        }

        if resolved.is_empty() {
            tracing::debug!("no dimension inputs supplied");
            return Ok(None);
        }
        Ok(Some(resolved))
    }

    fn resolve_one(
        &self,
        dimension: Dimension,
        raw: &RawSelector,
    ) -> Result<crate::types::Selection<DimensionId>, DimensionError> {
        let selection = self.reader.read::<DimensionId>(raw, dimension.key())?;
        self.registry.validate(dimension, &selection)?;
        if selection.is_empty() {
            tracing::warn!(
                dimension = dimension.key(),
                "dimension supplied but resolved to zero ids"
            );
        } else {
            tracing::debug!(dimension = dimension.key(), count = selection.len(), "resolved dimension");
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Selection;

    fn resolve(inputs: &DimensionInputs) -> Result<Option<ResolvedDimensions>, DimensionError> {
        let registry = DimensionRegistry::new();
        DimensionalKeyResolver::new(DimensionValueReader::new(), &registry).resolve(inputs)
    }

    #[test]
    fn primary_takes_absolute_precedence() {
        let inputs = DimensionInputs::new()
            .with(Dimension::Primary, "10,11")
            .with(Dimension::Design, "1")
            .with(Dimension::Future, "2");
        let resolved = resolve(&inputs).unwrap().unwrap();
        assert_eq!(resolved.dimensions(), vec![Dimension::Primary]);
        assert_eq!(
            resolved.get(Dimension::Primary),
            Some(&Selection::Values(vec![10, 11]))
        );
    }

    #[test]
    fn primary_precedence_ignores_bad_secondary_input() {
        let inputs = DimensionInputs::new()
            .with(Dimension::Primary, "7")
            .with(Dimension::Design, "not-a-number");
        assert!(resolve(&inputs).unwrap().is_some());
    }

    #[test]
    fn no_inputs_is_none() {
        assert_eq!(resolve(&DimensionInputs::new()).unwrap(), None);
    }

    #[test]
    fn explicit_empty_dimension_is_kept() {
        let inputs = DimensionInputs::new()
            .with(Dimension::Design, "1,2")
            .with(Dimension::Future, "");
        let resolved = resolve(&inputs).unwrap().unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.get(Dimension::Design), Some(&Selection::Values(vec![1, 2])));
        assert_eq!(resolved.get(Dimension::Future), Some(&Selection::Empty));
        assert!(!resolved.contains(Dimension::Strategy));
    }

    #[test]
    fn parse_failure_is_fatal() {
        let inputs = DimensionInputs::new()
            .with(Dimension::Design, "1")
            .with(Dimension::Strategy, "x");
        assert!(matches!(
            resolve(&inputs),
            Err(DimensionError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_domain_ids_are_fatal() {
        let registry = DimensionRegistry::new().with_n_trials(5);
        let resolver = DimensionalKeyResolver::new(DimensionValueReader::new(), &registry);
        let inputs = DimensionInputs::new().with(Dimension::Future, "0,6");
        assert!(matches!(
            resolver.resolve(&inputs),
            Err(DimensionError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn from_cli_keys() {
        let inputs = DimensionInputs::from_cli([
            ("keys_design", Some("1")),
            ("keys_future", None),
            ("keys_other", Some("3")),
        ]);
        assert!(inputs.get(Dimension::Design).is_some());
        assert!(inputs.get(Dimension::Future).is_none());
        let resolved = resolve(&inputs).unwrap().unwrap();
        assert_eq!(resolved.dimensions(), vec![Dimension::Design]);
    }

    #[test]
    fn all_sentinel_is_unrestricted() {
        let inputs = DimensionInputs::new().with(Dimension::Strategy, "all");
        let resolved = resolve(&inputs).unwrap().unwrap();
        assert_eq!(resolved.get(Dimension::Strategy), Some(&Selection::Unrestricted));
    }
}
