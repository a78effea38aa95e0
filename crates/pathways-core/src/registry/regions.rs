//! Region registry

use super::read_pairs;
use crate::error::RegistryError;
use indexmap::IndexMap;
use std::path::Path;

/// Sentinel for "every registered region"
pub const ALL_REGIONS: &str = "ALLREGIONS";

const DEFAULT_REGIONS: &[(&str, &str)] = &[
    ("argentina", "ARG"),
    ("bahamas", "BHS"),
    ("barbados", "BRB"),
    ("belize", "BLZ"),
    ("bolivia", "BOL"),
    ("brazil", "BRA"),
    ("chile", "CHL"),
    ("colombia", "COL"),
    ("costa_rica", "CRI"),
    ("dominican_republic", "DOM"),
    ("ecuador", "ECU"),
    ("el_salvador", "SLV"),
    ("guatemala", "GTM"),
    ("guyana", "GUY"),
    ("haiti", "HTI"),
    ("honduras", "HND"),
    ("jamaica", "JAM"),
    ("mexico", "MEX"),
    ("nicaragua", "NIC"),
    ("panama", "PAN"),
    ("paraguay", "PRY"),
    ("peru", "PER"),
    ("suriname", "SUR"),
    ("trinidad_and_tobago", "TTO"),
    ("uruguay", "URY"),
    ("venezuela", "VEN"),
];

/// Registry of regions keyed by canonical region name
#[derive(Debug, Default, Clone)]
pub struct RegionRegistry {
    regions: IndexMap<String, String>,
}

impl RegionRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: IndexMap::new(),
        }
    }

    /// Create registry with the built-in regions
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (region, iso) in DEFAULT_REGIONS {
            registry.register(region, iso);
        }
        registry
    }

    /// Load from a table with `region` and `iso_alpha_3` columns
    pub fn from_csv(path: &Path) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (region, iso) in read_pairs(path, "region", "iso_alpha_3")? {
            registry.register(&region, &iso);
        }
        tracing::debug!(path = %path.display(), count = registry.len(), "loaded region registry");
        Ok(registry)
    }

    /// Register a region
    pub fn register(&mut self, region: &str, iso: &str) {
        self.regions
            .insert(normalize(region), iso.trim().to_ascii_uppercase());
    }

    /// Canonical region name for a region name or ISO code
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&str> {
        let name = normalize(token);
        if let Some((region, _)) = self.regions.get_key_value(&name) {
            return Some(region.as_str());
        }
        let iso = token.trim();
        self.regions
            .iter()
            .find(|(_, code)| code.eq_ignore_ascii_case(iso))
            .map(|(region, _)| region.as_str())
    }

    /// ISO code of a canonical region
    #[inline]
    #[must_use]
    pub fn iso(&self, region: &str) -> Option<&str> {
        self.regions.get(region).map(String::as_str)
    }

    /// Every region in registration order
    #[must_use]
    pub fn all(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    /// Get number of registered regions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn normalize(region: &str) -> String {
    region.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_name_and_iso() {
        let registry = RegionRegistry::with_defaults();
        assert_eq!(registry.resolve("brazil"), Some("brazil"));
        assert_eq!(registry.resolve("BRA"), Some("brazil"));
        assert_eq!(registry.resolve("bra"), Some("brazil"));
        assert_eq!(registry.resolve("Costa Rica"), Some("costa_rica"));
        assert_eq!(registry.resolve("xx"), None);
    }

    #[test]
    fn iso_lookup() {
        let registry = RegionRegistry::with_defaults();
        assert_eq!(registry.iso("chile"), Some("CHL"));
        assert_eq!(registry.iso("atlantis"), None);
    }

    #[test]
    fn all_in_registration_order() {
        let mut registry = RegionRegistry::new();
        registry.register("peru", "per");
        registry.register("Chile", "CHL");
        assert_eq!(registry.all(), vec!["peru".to_string(), "chile".to_string()]);
        assert_eq!(registry.iso("peru"), Some("PER"));
    }
}
