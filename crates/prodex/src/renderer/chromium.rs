//! Chromium-based renderer using chromiumoxide.
//!
//! Every context owns its own headless browser process, so contexts share no
//! cookies, cache, or fingerprint state.

use super::{NavigationResult, RenderContext, Renderer, Viewport};
use crate::config::BrowserConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::debug;

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        debug!(path = %path.display(), "configured Chromium path does not exist");
    }

    // 2. ~/.prodex/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".prodex/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".prodex/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            ]
        } else {
            vec![home.join(".prodex/chromium/chrome-linux64/chrome")]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    config: BrowserConfig,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Browsers are launched lazily, one per context.
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>)> {
        let chrome_path = find_chromium(self.config.executable.as_deref())
            .context("Chromium not found; set PRODEX_CHROMIUM_PATH or install Chrome")?;

        let config = LaunchConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--no-first-run")
            .arg("--mute-audio")
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok((browser, handler))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let (browser, handler) = self.launch().await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(anyhow!("failed to create new page: {e}"));
            }
        };

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            browser,
            page,
            handler,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A page in its own Chromium process.
///
/// Dropping it without [`RenderContext::close`] kills the process.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn set_user_agent(
        &self,
        user_agent: &str,
        accept_language: &str,
        platform: &str,
    ) -> Result<()> {
        let params = SetUserAgentOverrideParams::builder()
            .user_agent(user_agent)
            .accept_language(accept_language)
            .platform(platform)
            .build()
            .map_err(|e| anyhow!("invalid user agent override: {e}"))?;
        self.page
            .execute(params)
            .await
            .context("failed to override user agent")?;
        Ok(())
    }

    async fn set_extra_headers(&self, headers: &[(String, String)]) -> Result<()> {
        let map: serde_json::Map<String, serde_json::Value> = headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::Value::Object(map),
            )))
            .await
            .context("failed to set extra headers")?;
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(viewport.width),
                i64::from(viewport.height),
                viewport.device_scale_factor,
                false,
            ))
            .await
            .context("failed to set viewport")?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult> {
        let start = Instant::now();

        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        let _ = self.page.wait_for_navigation().await;

        let final_url = self
            .page
            .url()
            .await
            .unwrap_or_default()
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn move_pointer(&self, x: f64, y: f64) -> Result<()> {
        self.page
            .move_mouse(Point::new(x, y))
            .await
            .context("failed to move pointer")?;
        Ok(())
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_title(&self) -> Result<Option<String>> {
        self.page.get_title().await.context("failed to get title")
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        let _ = self.page.clone().close().await;
        self.browser
            .close()
            .await
            .context("failed to close Chromium")?;
        let _ = self.browser.wait().await;
        Ok(())
    }
}

impl Drop for ChromiumContext {
    fn drop(&mut self) {
        self.handler.abort();
        self.active_count.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_falls_through() {
        let bogus = Path::new("/definitely/not/a/chrome");
        let found = find_chromium(Some(bogus));
        assert_ne!(found.as_deref(), Some(bogus));
    }

    #[tokio::test]
    async fn test_new_renderer_has_no_contexts() {
        let renderer = ChromiumRenderer::new(BrowserConfig::default());
        assert_eq!(renderer.active_contexts(), 0);
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_read() {
        let renderer = ChromiumRenderer::new(BrowserConfig::default());
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");
        assert_eq!(renderer.active_contexts(), 1);

        ctx.navigate("data:text/html,<title>T</title><h1>Hello</h1>")
            .await
            .expect("navigation failed");

        let heading = ctx
            .execute_js("document.querySelector('h1').textContent")
            .await
            .expect("JS execution failed");
        assert_eq!(heading.as_str(), Some("Hello"));

        let html = ctx.get_html().await.expect("get_html failed");
        assert!(html.contains("<h1>Hello</h1>"));
        assert_eq!(ctx.get_title().await.expect("title").as_deref(), Some("T"));

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);
    }
}
