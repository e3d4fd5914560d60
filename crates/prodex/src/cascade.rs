//! Ordered fallback across extraction strategies.
//!
//! The cascade is an explicit state machine: each attempt either succeeds and
//! halts, or fails and advances to the next strategy. Only the last failure
//! is reported, and only once every strategy has been tried.

use crate::acquisition::ExtractionStrategy;
use crate::error::{AcquisitionError, CascadeError, ConfigurationError};
use crate::ip::IpStrategy;
use crate::registry::StrategyRegistry;
use crate::types::PageRecord;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Strategy order used when the caller does not supply one.
pub const DEFAULT_CASCADE: [&str; 3] = ["fetch-headers", "browser", "fetch"];

/// Where a cascade run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Idle,
    /// Running the strategy at this index.
    Attempting(usize),
    Succeeded,
    ExhaustedFailed,
}

impl CascadeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CascadeState::Succeeded | CascadeState::ExhaustedFailed)
    }
}

/// A successful cascade run.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub record: PageRecord,
    /// Name of the strategy that produced the record.
    pub strategy: String,
    /// Strategies tried, including the successful one.
    pub attempts: usize,
}

pub struct Cascade {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl Cascade {
    pub fn new(strategies: Vec<Arc<dyn ExtractionStrategy>>) -> Result<Self, ConfigurationError> {
        if strategies.is_empty() {
            return Err(ConfigurationError::NoStrategies);
        }
        Ok(Self { strategies })
    }

    /// Resolve strategy names against the registry, in order.
    pub fn from_names<S: AsRef<str>>(
        registry: &StrategyRegistry,
        names: &[S],
    ) -> Result<Self, ConfigurationError> {
        Self::new(registry.extraction_strategies(names)?)
    }

    pub fn default_order(registry: &StrategyRegistry) -> Result<Self, ConfigurationError> {
        Self::from_names(registry, &DEFAULT_CASCADE)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, url: &str, ip: &dyn IpStrategy) -> Result<CascadeOutcome, CascadeError> {
        let mut state = CascadeState::Idle;
        let mut last_failure: Option<(String, AcquisitionError)> = None;
        let mut outcome: Option<CascadeOutcome> = None;

        while !state.is_terminal() {
            state = match state {
                CascadeState::Idle => {
                    debug!(url, strategies = self.strategies.len(), "cascade starting");
                    CascadeState::Attempting(0)
                }
                CascadeState::Attempting(i) if i >= self.strategies.len() => {
                    warn!(url, attempts = i, "every strategy failed");
                    CascadeState::ExhaustedFailed
                }
                CascadeState::Attempting(i) => {
                    let strategy = &self.strategies[i];
                    debug!(url, strategy = strategy.name(), attempt = i + 1, "attempting");
                    match strategy.extract(url, ip).await {
                        Ok(record) => {
                            info!(url, strategy = strategy.name(), attempt = i + 1, "strategy succeeded");
                            outcome = Some(CascadeOutcome {
                                record,
                                strategy: strategy.name().to_string(),
                                attempts: i + 1,
                            });
                            CascadeState::Succeeded
                        }
                        Err(e) => {
                            warn!(url, strategy = strategy.name(), "strategy failed: {e}");
                            last_failure = Some((strategy.name().to_string(), e));
                            CascadeState::Attempting(i + 1)
                        }
                    }
                }
                terminal => terminal,
            };
        }

        match (state, outcome, last_failure) {
            (CascadeState::Succeeded, Some(outcome), _) => Ok(outcome),
            (_, _, Some((strategy, source))) => Err(CascadeError::Exhausted {
                strategy,
                attempts: self.strategies.len(),
                source,
            }),
            // Unreachable with a non-empty strategy list.
            _ => Err(ConfigurationError::NoStrategies.into()),
        }
    }
}
