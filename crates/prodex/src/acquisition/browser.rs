//! Full browser simulation.
//!
//! Navigation is bounded by a fatal timeout; the wait for the page to settle
//! afterwards is soft and only logged when it expires. The render context is
//! released on every exit path.

use super::markup::extract_hints;
use super::rendered::extract_rendered;
use super::{validate_url, ExtractionStrategy};
use crate::config::BrowserConfig;
use crate::error::AcquisitionError;
use crate::ip::{DirectIp, IpStrategy, RequestOptions};
use crate::registry::{Capabilities, StrategyDescriptor};
use crate::renderer::{Fingerprint, RenderContext, Renderer, ScopedContext};
use crate::types::{non_empty, AcquisitionMeta, PageRecord};
use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// True once the document is complete and no loading indicator remains.
pub const READY_CHECK_JS: &str = "document.readyState === 'complete' && \
     !document.querySelector('.loading, .spinner, [aria-busy=\"true\"]')";

/// Step through the page one viewport at a time, then return to the top.
pub const SCROLL_JS: &str = "(() => { \
     const total = document.documentElement.scrollHeight; \
     const step = window.innerHeight || 800; \
     for (let y = 0; y < total; y += step) { window.scrollTo(0, y); } \
     window.scrollTo(0, 0); \
     return Math.ceil(total / step); })()";

/// Headers the browser manages itself and refuses as overrides.
const BROWSER_OWNED_HEADERS: &[&str] = &["connection", "accept-encoding", "host"];

struct RenderedPage {
    final_url: String,
    html: String,
    title: Option<String>,
}

/// Headless Chromium with a generated desktop fingerprint.
pub struct BrowserSimulation {
    descriptor: StrategyDescriptor,
    renderer: Arc<dyn Renderer>,
    config: BrowserConfig,
    direct: DirectIp,
}

impl BrowserSimulation {
    pub const NAME: &'static str = "browser";

    pub fn new(renderer: Arc<dyn Renderer>, config: BrowserConfig) -> Self {
        Self {
            descriptor: StrategyDescriptor::new(
                Self::NAME,
                "Full browser simulation (headless Chromium)",
                Capabilities {
                    harvests_json: true,
                    renders_javascript: true,
                    supports_proxy: false,
                },
            ),
            renderer,
            config,
            direct: DirectIp::new(),
        }
    }

    async fn drive(
        &self,
        ctx: &mut dyn RenderContext,
        url: &str,
        fingerprint: &Fingerprint,
        base: &RequestOptions,
    ) -> Result<RenderedPage, AcquisitionError> {
        ctx.set_user_agent(
            &fingerprint.user_agent,
            &fingerprint.accept_language,
            &fingerprint.platform,
        )
        .await
        .map_err(browser_error)?;
        ctx.set_extra_headers(&merge_headers(base, fingerprint))
            .await
            .map_err(browser_error)?;
        ctx.set_viewport(fingerprint.viewport)
            .await
            .map_err(browser_error)?;

        let timeout = self.config.navigation_timeout;
        let nav = match tokio::time::timeout(timeout, ctx.navigate(url)).await {
            Ok(Ok(nav)) => nav,
            Ok(Err(e)) => return Err(browser_error(e)),
            Err(_) => {
                return Err(AcquisitionError::NavigationTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };
        debug!(final_url = %nav.final_url, load_ms = nav.load_time_ms, "navigation finished");

        self.wait_for_quiescence(ctx).await;

        for &(x, y) in &fingerprint.pointer_path {
            if let Err(e) = ctx.move_pointer(x, y).await {
                debug!("pointer move failed: {e:#}");
                break;
            }
            tokio::time::sleep(fingerprint.pointer_pause()).await;
        }

        if let Err(e) = ctx.execute_js(SCROLL_JS).await {
            debug!("scroll failed: {e:#}");
        }
        tokio::time::sleep(self.config.settle_delay).await;

        let html = ctx.get_html().await.map_err(browser_error)?;
        let title = match ctx.get_title().await {
            Ok(title) => title,
            Err(e) => {
                debug!("title unavailable: {e:#}");
                None
            }
        };

        Ok(RenderedPage {
            final_url: nav.final_url,
            html,
            title,
        })
    }

    /// Poll until ready or the soft timeout passes. Never fails.
    async fn wait_for_quiescence(&self, ctx: &mut dyn RenderContext) {
        let deadline = Instant::now() + self.config.quiescence_timeout;
        loop {
            match ctx.execute_js(READY_CHECK_JS).await {
                Ok(serde_json::Value::Bool(true)) => return,
                Ok(_) => {}
                Err(e) => debug!("readiness check failed: {e:#}"),
            }
            if Instant::now() >= deadline {
                info!(
                    timeout_ms = self.config.quiescence_timeout.as_millis() as u64,
                    "page still busy after quiescence timeout, continuing"
                );
                return;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl ExtractionStrategy for BrowserSimulation {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    async fn extract(&self, url: &str, ip: &dyn IpStrategy) -> Result<PageRecord, AcquisitionError> {
        validate_url(url)?;
        let started = Instant::now();

        let ip: &dyn IpStrategy = if ip.uses_proxy() {
            warn!(
                requested = ip.name(),
                "proxied IP strategies are not supported by the browser, using direct connection"
            );
            &self.direct
        } else {
            ip
        };
        info!(url, ip = ip.name(), "browser strategy");

        let base = ip.request_options(url).await;
        let fingerprint = Fingerprint::generate();

        let context = self
            .renderer
            .new_context()
            .await
            .map_err(browser_error)?;
        let mut guard = ScopedContext::new(context);
        let outcome = match guard.context_mut() {
            Some(ctx) => self.drive(ctx, url, &fingerprint, &base).await,
            None => Err(AcquisitionError::Browser("render context unavailable".into())),
        };
        guard.release().await;

        let page = outcome?;
        let mut record = build_record(url, page);
        record.meta = AcquisitionMeta {
            strategy: Self::NAME.to_string(),
            ip_strategy: ip.name().to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            user_agent: Some(fingerprint.user_agent),
        };
        Ok(record)
    }
}

fn browser_error(e: anyhow::Error) -> AcquisitionError {
    AcquisitionError::Browser(format!("{e:#}"))
}

/// IP strategy headers overlaid with the fingerprint's, minus browser-owned ones.
fn merge_headers(base: &RequestOptions, fingerprint: &Fingerprint) -> Vec<(String, String)> {
    let mut merged = base.clone();
    for (name, value) in fingerprint.headers() {
        merged.set_header(&name, &value);
    }
    merged
        .headers
        .into_iter()
        .filter(|(name, _)| !BROWSER_OWNED_HEADERS.contains(&name.to_ascii_lowercase().as_str()))
        .collect()
}

fn build_record(url: &str, page: RenderedPage) -> PageRecord {
    let document = Html::parse_document(&page.html);
    let hints = extract_hints(&document);
    let rendered = extract_rendered(&document);

    PageRecord {
        url: url.to_string(),
        final_url: page.final_url,
        title: page.title.and_then(non_empty).or(hints.title),
        price: hints.price,
        sku: hints.sku,
        images: rendered.images,
        raw_content: page.html,
        relevance_metadata: rendered.json,
        data_attributes: rendered.data_attributes,
        text_content: rendered.text_content,
        meta: AcquisitionMeta::default(),
    }
}
