//! Sector model registry

use super::read_pairs;
use crate::error::RegistryError;
use indexmap::IndexMap;
use std::path::Path;

/// Registry of sector models
///
/// Maps canonical sector names to their abbreviations. Lookups accept either
/// form, case-insensitively, and return the canonical name.
#[derive(Debug, Default, Clone)]
pub struct SectorRegistry {
    sectors: IndexMap<String, String>,
}

impl SectorRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            sectors: IndexMap::new(),
        }
    }

    /// Create registry with the built-in sector models
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("AFOLU", "af");
        registry.register("CircularEconomy", "ce");
        registry.register("Energy", "en");
        registry.register("IPPU", "ip");
        registry.register("Socioeconomic", "se");
        registry
    }

    /// Load from a table with `sector` and `abbreviation_sector` columns
    pub fn from_csv(path: &Path) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, abbreviation) in read_pairs(path, "sector", "abbreviation_sector")? {
            registry.register(&name, &abbreviation);
        }
        tracing::debug!(path = %path.display(), count = registry.len(), "loaded sector registry");
        Ok(registry)
    }

    /// Register a sector
    pub fn register(&mut self, name: &str, abbreviation: &str) {
        self.sectors
            .insert(name.to_string(), abbreviation.to_string());
    }

    /// Canonical sector name for a name or abbreviation
    #[must_use]
    pub fn canonical(&self, token: &str) -> Option<&str> {
        let token = token.trim();
        self.sectors
            .iter()
            .find(|(name, abbr)| {
                name.eq_ignore_ascii_case(token) || abbr.eq_ignore_ascii_case(token)
            })
            .map(|(name, _)| name.as_str())
    }

    /// Check if a name or abbreviation is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.canonical(token).is_some()
    }

    /// Canonical names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sectors.keys().map(String::as_str).collect()
    }

    /// Get number of registered sectors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}
