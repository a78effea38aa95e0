use super::lenient_tokens;
use crate::reader::DEFAULT_DELIMITER;
use crate::registry::SectorRegistry;
use crate::types::{ModelSelection, Selection, ALL_SENTINEL};

/// Maps a user model list onto registered sector models
#[derive(Debug, Clone)]
pub struct ModelSelector<'a> {
    registry: &'a SectorRegistry,
    delimiter: String,
}

impl<'a> ModelSelector<'a> {
    /// Create a selector over a sector registry
    #[inline]
    #[must_use]
    pub fn new(registry: &'a SectorRegistry) -> Self {
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

    /// Select models
    ///
    /// Missing input or `all` (any case) runs every model. Otherwise each
    /// token is mapped to its canonical sector name and unknown tokens are
    /// dropped. A list where nothing matched is `Empty`, which means "run
    /// nothing", never "run all".
    #[must_use]
    pub fn select(&self, input: Option<&str>) -> ModelSelection {
        let Some(input) = input else {
            return Selection::Unrestricted;
        };
        if input.trim().eq_ignore_ascii_case(ALL_SENTINEL) {
            return Selection::Unrestricted;
        }

        let models: Vec<String> = lenient_tokens(input, &self.delimiter)
            .filter_map(|token| {
                let canonical = self.registry.canonical(token);
                if canonical.is_none() {
                    tracing::debug!(token, "dropping unknown model");
                }
                canonical.map(str::to_string)
            })
            .collect();

        Selection::from_values(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_any_case() {
        let registry = SectorRegistry::with_defaults();
        let selector = ModelSelector::new(&registry);
        assert!(selector.select(Some("All")).is_unrestricted());
        assert!(selector.select(Some("ALL")).is_unrestricted());
        assert!(selector.select(None).is_unrestricted());
    }

    #[test]
    fn unknown_models_dropped() {
        let registry = SectorRegistry::with_defaults();
        let selector = ModelSelector::new(&registry);
        assert_eq!(
            selector.select(Some("AFOLU,bogus")),
            Selection::Values(vec!["AFOLU".to_string()])
        );
    }

    #[test]
    fn abbreviations_map_to_canonical_names() {
        let registry = SectorRegistry::with_defaults();
        let selector = ModelSelector::new(&registry);
        assert_eq!(
            selector.select(Some("en,IP")),
            Selection::Values(vec!["Energy".to_string(), "IPPU".to_string()])
        );
    }

    #[test]
    fn nothing_matched_is_empty_not_all() {
        let registry = SectorRegistry::with_defaults();
        let selector = ModelSelector::new(&registry);
        let sel = selector.select(Some("bogus,nope"));
        assert!(sel.is_empty());
        assert!(!sel.is_unrestricted());
    }
}
