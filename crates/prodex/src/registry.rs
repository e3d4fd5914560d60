//! Name → strategy lookup, populated once at startup.

use crate::acquisition::{BrowserSimulation, ExtractionStrategy, HeaderSpoofedFetch, PlainFetch};
use crate::config::Settings;
use crate::error::{ConfigurationError, StrategyKind};
use crate::ip::{DirectIp, IpStrategy, ProxiedIp};
use crate::renderer::{ChromiumRenderer, Renderer};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// What a strategy can do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Returns discovered JSON blobs in `relevance_metadata`.
    pub harvests_json: bool,
    /// Executes page JavaScript before reading markup.
    pub renders_javascript: bool,
    /// Routes traffic through an upstream proxy.
    pub supports_proxy: bool,
}

/// Public identity of a registered strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyDescriptor {
    /// Unique, case-sensitive registry key.
    pub name: String,
    pub description: String,
    pub capabilities: Capabilities,
}

impl StrategyDescriptor {
    pub fn new(name: &str, description: &str, capabilities: Capabilities) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            capabilities,
        }
    }
}

/// Everything the registry knows, for listing.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryListing {
    pub ip: Vec<StrategyDescriptor>,
    pub extraction: Vec<StrategyDescriptor>,
}

/// Read-only table of IP and extraction strategies.
///
/// Build it once and share it behind an `Arc`.
pub struct StrategyRegistry {
    ip: IndexMap<String, Arc<dyn IpStrategy>>,
    extraction: IndexMap<String, Arc<dyn ExtractionStrategy>>,
}

impl StrategyRegistry {
    /// The standard strategies, browser backed by Chromium.
    pub fn new(settings: &Settings) -> Self {
        let renderer = Arc::new(ChromiumRenderer::new(settings.browser.clone()));
        Self::with_renderer(settings, renderer)
    }

    /// The standard strategies with a caller-supplied browser engine.
    pub fn with_renderer(settings: &Settings, renderer: Arc<dyn Renderer>) -> Self {
        Self::builder()
            .ip(Arc::new(DirectIp::new()))
            .ip(Arc::new(ProxiedIp::new(settings.proxy.clone())))
            .extraction(Arc::new(PlainFetch::new(settings)))
            .extraction(Arc::new(HeaderSpoofedFetch::new(settings)))
            .extraction(Arc::new(BrowserSimulation::new(
                renderer,
                settings.browser.clone(),
            )))
            .build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn ip_strategy(&self, name: &str) -> Result<Arc<dyn IpStrategy>, ConfigurationError> {
        self.ip
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownStrategy {
                kind: StrategyKind::Ip,
                name: name.to_string(),
            })
    }

    pub fn extraction_strategy(
        &self,
        name: &str,
    ) -> Result<Arc<dyn ExtractionStrategy>, ConfigurationError> {
        self.extraction
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownStrategy {
                kind: StrategyKind::Extraction,
                name: name.to_string(),
            })
    }

    /// Look up an ordered list of extraction strategies, failing on the first unknown name.
    pub fn extraction_strategies<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Arc<dyn ExtractionStrategy>>, ConfigurationError> {
        names
            .iter()
            .map(|n| self.extraction_strategy(n.as_ref()))
            .collect()
    }

    pub fn describe(&self) -> RegistryListing {
        RegistryListing {
            ip: self.ip.values().map(|s| s.descriptor().clone()).collect(),
            extraction: self
                .extraction
                .values()
                .map(|s| s.descriptor().clone())
                .collect(),
        }
    }
}

/// Assembles a [`StrategyRegistry`]. Later registrations replace earlier ones
/// with the same name.
#[derive(Default)]
pub struct RegistryBuilder {
    ip: IndexMap<String, Arc<dyn IpStrategy>>,
    extraction: IndexMap<String, Arc<dyn ExtractionStrategy>>,
}

impl RegistryBuilder {
    pub fn ip(mut self, strategy: Arc<dyn IpStrategy>) -> Self {
        self.ip.insert(strategy.name().to_string(), strategy);
        self
    }

    pub fn extraction(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.extraction
            .insert(strategy.name().to_string(), strategy);
        self
    }

    pub fn build(self) -> StrategyRegistry {
        StrategyRegistry {
            ip: self.ip,
            extraction: self.extraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StrategyRegistry {
        StrategyRegistry::new(&Settings::default())
    }

    #[test]
    fn test_standard_names() {
        let reg = registry();
        for name in ["datacenter", "residential"] {
            assert_eq!(reg.ip_strategy(name).expect(name).name(), name);
        }
        for name in ["fetch", "fetch-headers", "browser"] {
            assert_eq!(reg.extraction_strategy(name).expect(name).name(), name);
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let err = registry().extraction_strategy("Fetch").err();
        assert_eq!(
            err,
            Some(ConfigurationError::UnknownStrategy {
                kind: StrategyKind::Extraction,
                name: "Fetch".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_in_list_fails() {
        let reg = registry();
        assert!(reg.extraction_strategies(&["fetch", "nope"]).is_err());
        assert_eq!(
            reg.extraction_strategies(&["browser", "fetch"])
                .expect("known")
                .len(),
            2
        );
    }

    #[test]
    fn test_describe_lists_capabilities() {
        let listing = registry().describe();
        assert_eq!(listing.ip.len(), 2);
        assert_eq!(listing.extraction.len(), 3);
        let browser = listing
            .extraction
            .iter()
            .find(|d| d.name == "browser")
            .expect("browser");
        assert!(browser.capabilities.renders_javascript);
        assert!(!browser.capabilities.supports_proxy);
        let residential = listing
            .ip
            .iter()
            .find(|d| d.name == "residential")
            .expect("residential");
        assert!(residential.capabilities.supports_proxy);
    }
}
