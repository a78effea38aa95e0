use super::lenient_tokens;
use crate::reader::DEFAULT_DELIMITER;
use crate::registry::{RegionRegistry, ALL_REGIONS};
use crate::types::{RegionSelection, Selection};

/// Maps a user region list onto registered regions
#[derive(Debug, Clone)]
pub struct RegionSelector<'a> {
    registry: &'a RegionRegistry,
    delimiter: String,
}

impl<'a> RegionSelector<'a> {
    /// Create a selector over a region registry
    #[inline]
    #[must_use]
    pub fn new(registry: &'a RegionRegistry) -> Self {
        Self {
            registry,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    /// With delimiter
    #[inline]
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Select regions
    ///
    /// `ALLREGIONS` (exact) selects every registered region. Missing input
    /// selects nothing. Tokens are resolved by name or ISO code; unresolved
    /// tokens are dropped and repeats are kept.
    #[must_use]
    pub fn select(&self, input: Option<&str>) -> RegionSelection {
        let Some(input) = input else {
            return Selection::Empty;
        };
        if input == ALL_REGIONS {
            return Selection::Unrestricted;
        }

        let regions: Vec<String> = lenient_tokens(input, &self.delimiter)
            .filter_map(|token| {
                let region = self.registry.resolve(token);
                if region.is_none() {
                    tracing::warn!(token, "dropping unknown region");
                }
                region.map(str::to_string)
            })
            .collect();

        Selection::from_values(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_regions_sentinel() {
        let registry = RegionRegistry::with_defaults();
        let selector = RegionSelector::new(&registry);
        assert!(selector.select(Some("ALLREGIONS")).is_unrestricted());
    }

    #[test]
    fn sentinel_is_case_sensitive() {
        let registry = RegionRegistry::with_defaults();
        let selector = RegionSelector::new(&registry);
        assert!(selector.select(Some("allregions")).is_empty());
    }

    #[test]
    fn padded_sentinel_is_not_the_sentinel() {
        let registry = RegionRegistry::with_defaults();
        let selector = RegionSelector::new(&registry);
        assert!(selector.select(Some(" ALLREGIONS ")).is_empty());
    }

    #[test]
    fn missing_input_is_empty() {
        let registry = RegionRegistry::with_defaults();
        let selector = RegionSelector::new(&registry);
        assert!(selector.select(None).is_empty());
    }

    #[test]
    fn unresolved_tokens_dropped() {
        let registry = RegionRegistry::with_defaults();
        let selector = RegionSelector::new(&registry);
        assert_eq!(
            selector.select(Some("bra,xx,chl")),
            Selection::Values(vec!["brazil".to_string(), "chile".to_string()])
        );
    }

    #[test]
    fn repeats_are_kept() {
        let registry = RegionRegistry::with_defaults();
        let selector = RegionSelector::new(&registry);
        assert_eq!(selector.select(Some("BRA,brazil")).len(), 2);
    }
}
