//! Renderer abstraction for browser-based page acquisition.
//!
//! `Renderer` hands out isolated `RenderContext`s; the full-browser strategy
//! drives one context per extraction and releases it through
//! [`ScopedContext`]. Chromium via chromiumoxide is the production engine.

pub mod chromium;
pub mod fingerprint;
pub mod scoped;

pub use chromium::{find_chromium, ChromiumRenderer};
pub use fingerprint::Fingerprint;
pub use scoped::ScopedContext;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Emulated screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new, isolated browser context.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Number of contexts not yet closed or dropped.
    fn active_contexts(&self) -> usize;
}

/// A single browser context for rendering one page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Override the user agent, its language, and `navigator.platform`.
    async fn set_user_agent(&self, user_agent: &str, accept_language: &str, platform: &str)
        -> Result<()>;
    /// Send these headers with every request from this context.
    async fn set_extra_headers(&self, headers: &[(String, String)]) -> Result<()>;
    /// Emulate a screen size and pixel density.
    async fn set_viewport(&self, viewport: Viewport) -> Result<()>;
    /// Navigate to a URL. Callers bound this with their own timeout.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Move the mouse pointer to page coordinates.
    async fn move_pointer(&self, x: f64, y: f64) -> Result<()>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the document title.
    async fn get_title(&self) -> Result<Option<String>>;
    /// Close this context and everything it owns.
    async fn close(self: Box<Self>) -> Result<()>;
}
