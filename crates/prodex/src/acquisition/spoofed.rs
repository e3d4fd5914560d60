//! Fetch with a rotating desktop identity and a full browser header set.
//!
//! Request sequence:
//!
//! 1. random desktop UA plus `Sec-Fetch-*`, `Sec-Ch-Ua*`, and cache headers;
//! 2. on a transport error, once more with a reduced header set;
//! 3. on 403, once more as an iPhone.
//!
//! The proxy from the IP strategy is kept on every retry.

use super::harvest::harvest;
use super::http_client::{HttpClient, HttpResponse};
use super::markup::extract_hints;
use super::{validate_url, ExtractionStrategy};
use crate::config::{RequestPacing, Settings};
use crate::error::AcquisitionError;
use crate::ip::{IpStrategy, RequestOptions, ACCEPT_HTML, ACCEPT_LANGUAGE, DIRECT_USER_AGENT};
use crate::registry::{Capabilities, StrategyDescriptor};
use crate::types::{AcquisitionMeta, PageRecord};
use async_trait::async_trait;
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use scraper::Html;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Desktop identities rotated per request.
pub const USER_AGENT_POOL: [&str; 4] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// Identity for the post-403 retry.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Mobile/15E148 Safari/604.1";

const SPOOFED_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("Accept-Language", ACCEPT_LANGUAGE),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    (
        "Sec-Ch-Ua",
        "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
    ),
    ("Sec-Ch-Ua-Mobile", "?0"),
    ("Sec-Ch-Ua-Platform", "\"macOS\""),
    ("Sec-GPC", "1"),
];

/// Browser-mimicking fetch that also harvests embedded JSON.
pub struct HeaderSpoofedFetch {
    descriptor: StrategyDescriptor,
    client: HttpClient,
    pacing: RequestPacing,
}

impl HeaderSpoofedFetch {
    pub const NAME: &'static str = "fetch-headers";

    pub fn new(settings: &Settings) -> Self {
        Self {
            descriptor: StrategyDescriptor::new(
                Self::NAME,
                "Fetch with browser-like headers and embedded JSON harvesting",
                Capabilities {
                    harvests_json: true,
                    supports_proxy: true,
                    ..Capabilities::default()
                },
            ),
            client: HttpClient::new(&settings.http),
            pacing: settings.pacing.spoofed,
        }
    }

    /// IP strategy options overlaid with a spoofed desktop identity.
    pub fn spoofed_options(base: &RequestOptions, user_agent: &str) -> RequestOptions {
        let mut options = base.clone().with_header("User-Agent", user_agent);
        for (name, value) in SPOOFED_HEADERS {
            options.set_header(name, value);
        }
        options
    }

    async fn fetch_with_fallbacks(
        &self,
        url: &str,
        base: &RequestOptions,
    ) -> Result<(HttpResponse, String), AcquisitionError> {
        let user_agent = USER_AGENT_POOL
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENT_POOL[0]);

        let spoofed = Self::spoofed_options(base, user_agent);
        let (response, user_agent) = match self.client.get(url, &spoofed).await {
            Ok(resp) => (resp, user_agent),
            Err(AcquisitionError::InvalidUrl(reason)) => {
                return Err(AcquisitionError::InvalidUrl(reason));
            }
            Err(e) => {
                warn!("fetch failed: {e}, retrying with reduced headers");
                let reduced = base.with_headers_only(&[
                    ("User-Agent", DIRECT_USER_AGENT),
                    ("Accept", ACCEPT_HTML),
                    ("Accept-Language", ACCEPT_LANGUAGE),
                ]);
                (self.client.get(url, &reduced).await?, DIRECT_USER_AGENT)
            }
        };

        if response.status != 403 {
            return Ok((response, user_agent.to_string()));
        }

        warn!("403 Forbidden from {url}, retrying with mobile user agent");
        let mobile = base.with_headers_only(&[
            ("User-Agent", MOBILE_USER_AGENT),
            ("Accept", ACCEPT_HTML),
            ("Accept-Language", ACCEPT_LANGUAGE),
        ]);
        let response = self.client.get(url, &mobile).await?;
        Ok((response, MOBILE_USER_AGENT.to_string()))
    }
}

#[async_trait]
impl ExtractionStrategy for HeaderSpoofedFetch {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    async fn extract(&self, url: &str, ip: &dyn IpStrategy) -> Result<PageRecord, AcquisitionError> {
        validate_url(url)?;
        let started = Instant::now();
        info!(url, ip = ip.name(), "fetch-headers strategy");

        self.pacing.pause().await;
        let base = ip.request_options(url).await;
        let (response, user_agent) = self.fetch_with_fallbacks(url, &base).await?;

        if !response.is_success() {
            return Err(response.status_error());
        }

        let mut record = parse_page(response);
        debug!(
            blobs = record.relevance_metadata.len(),
            "harvested embedded JSON"
        );
        record.meta = AcquisitionMeta {
            strategy: Self::NAME.to_string(),
            ip_strategy: ip.name().to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            user_agent: Some(user_agent),
        };
        Ok(record)
    }
}

fn parse_page(response: HttpResponse) -> PageRecord {
    let document = Html::parse_document(&response.body);
    let hints = extract_hints(&document);
    let relevance_metadata: IndexMap<_, _> = harvest(&response.body, &document)
        .into_iter()
        .map(|blob| (blob.key, blob.value))
        .collect();

    PageRecord {
        url: response.url,
        final_url: response.final_url,
        title: hints.title,
        price: hints.price,
        sku: hints.sku,
        images: hints.images,
        raw_content: response.body,
        relevance_metadata,
        ..PageRecord::default()
    }
}
