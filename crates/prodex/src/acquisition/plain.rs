use super::http_client::HttpClient;
use super::markup::extract_hints;
use super::{validate_url, ExtractionStrategy};
use crate::config::{RequestPacing, Settings};
use crate::error::AcquisitionError;
use crate::ip::IpStrategy;
use crate::registry::{Capabilities, StrategyDescriptor};
use crate::types::{AcquisitionMeta, PageRecord};
use async_trait::async_trait;
use scraper::Html;
use std::time::Instant;
use tracing::{info, warn};

/// One GET with the IP strategy's options, selectors only.
pub struct PlainFetch {
    descriptor: StrategyDescriptor,
    client: HttpClient,
    pacing: RequestPacing,
}

impl PlainFetch {
    pub const NAME: &'static str = "fetch";

    pub fn new(settings: &Settings) -> Self {
        Self {
            descriptor: StrategyDescriptor::new(
                Self::NAME,
                "Simple HTTP fetch",
                Capabilities {
                    supports_proxy: true,
                    ..Capabilities::default()
                },
            ),
            client: HttpClient::new(&settings.http),
            pacing: settings.pacing.plain,
        }
    }
}

#[async_trait]
impl ExtractionStrategy for PlainFetch {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    async fn extract(&self, url: &str, ip: &dyn IpStrategy) -> Result<PageRecord, AcquisitionError> {
        validate_url(url)?;
        let started = Instant::now();
        info!(url, ip = ip.name(), "fetch strategy");

        self.pacing.pause().await;
        let options = ip.request_options(url).await;
        let response = self.client.get(url, &options).await?;

        if !response.is_success() {
            if response.status == 403 {
                warn!("403 Forbidden from {url}, site may be blocking automated requests");
            }
            return Err(response.status_error());
        }

        let hints = extract_hints(&Html::parse_document(&response.body));

        Ok(PageRecord {
            url: response.url,
            final_url: response.final_url,
            title: hints.title,
            price: hints.price,
            sku: hints.sku,
            images: hints.images,
            raw_content: response.body,
            meta: AcquisitionMeta {
                strategy: Self::NAME.to_string(),
                ip_strategy: ip.name().to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
                user_agent: options.header("User-Agent").map(str::to_string),
            },
            ..PageRecord::default()
        })
    }
}
