//! Error taxonomy for acquisition, configuration, and extraction.

use thiserror::Error;

/// A single extraction strategy could not obtain usable content.
///
/// Recovered by the cascade, which moves on to the next strategy. Only the
/// last one is surfaced, and only when every strategy has failed.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("navigation timed out after {timeout_ms}ms")]
    NavigationTimeout { timeout_ms: u64 },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl AcquisitionError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AcquisitionError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_builder() {
            return AcquisitionError::InvalidUrl(e.to_string());
        }
        AcquisitionError::Transport(e.to_string())
    }
}

/// Which registry a lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Ip,
    Extraction,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Ip => f.write_str("IP"),
            StrategyKind::Extraction => f.write_str("extraction"),
        }
    }
}

/// The caller asked for something the registry cannot provide. Never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown {kind} strategy: {name}")]
    UnknownStrategy { kind: StrategyKind, name: String },

    #[error("no extraction strategies to run")]
    NoStrategies,
}

/// Input to the relevance engine was not valid JSON.
///
/// Never propagated out of the engine: the entry point logs it and returns an
/// empty result.
#[derive(Debug, Error)]
#[error("malformed JSON payload: {0}")]
pub struct MalformedDataError(#[from] pub serde_json::Error);

/// A browser context did not shut down cleanly. Logged, never returned.
#[derive(Debug, Error)]
#[error("failed to release render context: {0}")]
pub struct ResourceError(pub String);

/// Terminal outcome of a cascade run that produced no page.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("all {attempts} strategies failed; last was '{strategy}': {source}")]
    Exhausted {
        strategy: String,
        attempts: usize,
        #[source]
        source: AcquisitionError,
    },
}

/// Failure reported by the downstream structured-extraction call.
#[derive(Debug, Error)]
#[error("structured extraction failed: {0}")]
pub struct ExtractorError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl ExtractorError {
    pub fn msg(message: impl Into<String>) -> Self {
        ExtractorError(message.into().into())
    }
}

/// Errors surfaced by the end-to-end pipeline.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Cascade(#[from] CascadeError),

    #[error(transparent)]
    Extraction(#[from] ExtractorError),
}
