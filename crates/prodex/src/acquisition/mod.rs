//! Page acquisition strategies.
//!
//! Each strategy performs one acquisition method and normalizes what it got
//! into a [`PageRecord`]. Strategies never judge relevance; discovered JSON
//! goes out raw, keyed by where it was found.

pub mod browser;
pub mod harvest;
pub mod http_client;
pub mod markup;
pub mod plain;
pub mod rendered;
pub mod spoofed;

pub use browser::BrowserSimulation;
pub use plain::PlainFetch;
pub use spoofed::HeaderSpoofedFetch;

use crate::error::AcquisitionError;
use crate::ip::IpStrategy;
use crate::registry::StrategyDescriptor;
use crate::types::PageRecord;
use async_trait::async_trait;
use serde::Serialize;

/// One way of turning a URL into a [`PageRecord`].
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn descriptor(&self) -> &StrategyDescriptor;

    /// Fails only when no usable content could be obtained.
    async fn extract(&self, url: &str, ip: &dyn IpStrategy)
        -> Result<PageRecord, AcquisitionError>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

/// Where a harvested JSON blob came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A script whose `type` declares JSON.
    Structured,
    /// A `window.NAME = {...}` assignment.
    WindowState,
    /// An object literal carrying product keys inside arbitrary script.
    PatternMatched,
    /// Regex hits over the whole markup, used when scripts yield nothing.
    MarkupPattern,
    /// `data-*` attributes, used when scripts yield nothing.
    DataAttributes,
}

/// Reject anything that is not an absolute http(s) URL.
pub(crate) fn validate_url(raw: &str) -> Result<url::Url, AcquisitionError> {
    let parsed = url::Url::parse(raw).map_err(|e| AcquisitionError::InvalidUrl(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AcquisitionError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}
