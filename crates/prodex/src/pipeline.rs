//! Request-to-prompt glue: resolve strategies, run the cascade, assemble.

use crate::cascade::Cascade;
use crate::error::{ExtractorError, ScrapeError};
use crate::ip::DirectIp;
use crate::prompt::{AssembledPrompt, PromptAssembler};
use crate::registry::StrategyRegistry;
use crate::types::PageRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// The downstream structured-extraction call: prompt text in, typed object out.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    type Output: Send;

    async fn extract(&self, prompt: &str) -> Result<Self::Output, ExtractorError>;
}

/// What to scrape and how.
#[derive(Debug, Clone, Default)]
pub struct ScrapeRequest {
    pub url: String,
    /// IP strategy name; defaults to the direct connection.
    pub ip: Option<String>,
    /// Extraction strategy order; empty means the default cascade.
    pub strategies: Vec<String>,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub record: PageRecord,
    /// Strategy that produced the record.
    pub strategy: String,
    pub attempts: usize,
    pub prompt: AssembledPrompt,
}

pub struct Pipeline {
    registry: Arc<StrategyRegistry>,
    assembler: PromptAssembler,
}

impl Pipeline {
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self {
            registry,
            assembler: PromptAssembler::default(),
        }
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Acquire the page and build the extraction prompt.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeReport, ScrapeError> {
        let ip_name = request.ip.as_deref().unwrap_or(DirectIp::NAME);
        let ip = self.registry.ip_strategy(ip_name)?;
        let cascade = if request.strategies.is_empty() {
            Cascade::default_order(&self.registry)?
        } else {
            Cascade::from_names(&self.registry, request.strategies.as_slice())?
        };

        info!(
            url = %request.url,
            ip = ip_name,
            strategies = ?cascade.strategy_names(),
            "scrape starting"
        );
        let outcome = cascade.run(&request.url, ip.as_ref()).await?;
        let prompt = self.assembler.assemble(&outcome.record);

        Ok(ScrapeReport {
            record: outcome.record,
            strategy: outcome.strategy,
            attempts: outcome.attempts,
            prompt,
        })
    }

    /// Scrape, then hand the prompt to `extractor`. Extractor failures are not retried.
    pub async fn extract_product<E: StructuredExtractor>(
        &self,
        request: &ScrapeRequest,
        extractor: &E,
    ) -> Result<(ScrapeReport, E::Output), ScrapeError> {
        let report = self.scrape(request).await?;
        let product = extractor.extract(&report.prompt.text).await?;
        Ok((report, product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ExtractionStrategy;
    use crate::error::{AcquisitionError, ConfigurationError};
    use crate::ip::IpStrategy;
    use crate::prompt::Framing;
    use crate::registry::{Capabilities, StrategyDescriptor};
    use serde_json::json;

    struct Canned {
        descriptor: StrategyDescriptor,
    }

    #[async_trait]
    impl ExtractionStrategy for Canned {
        fn descriptor(&self) -> &StrategyDescriptor {
            &self.descriptor
        }

        async fn extract(&self, url: &str, ip: &dyn IpStrategy) -> Result<PageRecord, AcquisitionError> {
            let mut record = PageRecord {
                url: url.to_string(),
                title: Some("Lip Balm".into()),
                ..PageRecord::default()
            };
            record.relevance_metadata.insert(
                "structured_0".into(),
                json!({"product": {"name": "Lip Balm", "sku": "LB-1", "price": 4.5}}),
            );
            record.meta.ip_strategy = ip.name().to_string();
            Ok(record)
        }
    }

    struct Echo;

    #[async_trait]
    impl StructuredExtractor for Echo {
        type Output = usize;

        async fn extract(&self, prompt: &str) -> Result<usize, ExtractorError> {
            if prompt.is_empty() {
                return Err(ExtractorError::msg("empty prompt"));
            }
            Ok(prompt.len())
        }
    }

    struct Refuses;

    #[async_trait]
    impl StructuredExtractor for Refuses {
        type Output = ();

        async fn extract(&self, _prompt: &str) -> Result<(), ExtractorError> {
            Err(ExtractorError::msg("model unavailable"))
        }
    }

    fn pipeline() -> Pipeline {
        let registry = StrategyRegistry::builder()
            .ip(Arc::new(DirectIp::new()))
            .extraction(Arc::new(Canned {
                descriptor: StrategyDescriptor::new("canned", "canned", Capabilities::default()),
            }))
            .build();
        Pipeline::new(Arc::new(registry))
    }

    fn request() -> ScrapeRequest {
        ScrapeRequest {
            strategies: vec!["canned".into()],
            ..ScrapeRequest::new("https://shop.test/lip-balm")
        }
    }

    #[tokio::test]
    async fn test_scrape_assembles_relevant_json() {
        let report = pipeline().scrape(&request()).await.unwrap();
        assert_eq!(report.strategy, "canned");
        assert_eq!(report.record.meta.ip_strategy, "datacenter");
        assert_eq!(report.prompt.framing, Framing::RelevantJson);
        assert!(report.prompt.text.contains("LB-1"));
    }

    #[tokio::test]
    async fn test_unknown_ip_strategy() {
        let req = ScrapeRequest {
            ip: Some("mobile".into()),
            ..request()
        };
        let err = pipeline().scrape(&req).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Configuration(ConfigurationError::UnknownStrategy { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_cascade_needs_registered_strategies() {
        let req = ScrapeRequest::new("https://shop.test/lip-balm");
        let err = pipeline().scrape(&req).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_extract_product_passes_prompt() {
        let p = pipeline();
        let (report, len) = p.extract_product(&request(), &Echo).await.unwrap();
        assert_eq!(len, report.prompt.text.len());

        let err = p.extract_product(&request(), &Refuses).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }
}
