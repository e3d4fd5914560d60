use super::RenderContext;
use crate::error::ResourceError;
use tracing::warn;

/// Owns a render context for the duration of one extraction.
///
/// Call [`ScopedContext::release`] on every exit path. A guard dropped
/// without release logs a warning and drops the context, whose own `Drop`
/// tears down the browser.
pub struct ScopedContext {
    inner: Option<Box<dyn RenderContext>>,
}

impl ScopedContext {
    pub fn new(context: Box<dyn RenderContext>) -> Self {
        Self {
            inner: Some(context),
        }
    }

    /// The guarded context; `None` only after release.
    pub fn context_mut(&mut self) -> Option<&mut (dyn RenderContext + 'static)> {
        self.inner.as_deref_mut()
    }

    /// Close the context. Failures are logged, never returned.
    pub async fn release(mut self) {
        if let Some(context) = self.inner.take() {
            if let Err(e) = context.close().await {
                let err = ResourceError(format!("{e:#}"));
                warn!("{err}");
            }
        }
    }
}

impl Drop for ScopedContext {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            warn!("render context dropped without release, killing browser");
        }
    }
}
