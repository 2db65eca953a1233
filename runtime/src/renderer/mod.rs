//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). Only the
//! dynamic fetch mode uses a renderer; the static pipeline runs without one.

pub mod chromium;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Script that drops non-content elements and returns the visible body text.
pub const VISIBLE_TEXT_SCRIPT: &str = r#"(() => {
    document
        .querySelectorAll("script, style, noscript, svg, nav, footer")
        .forEach((el) => el.remove());
    return document.body ? document.body.innerText : "";
})()"#;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL and wait for the page to finish loading.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Owns an open context until it is closed.
///
/// When the render future is dropped mid-flight (a caller timeout), the
/// context is closed on a spawned task instead.
struct ContextGuard(Option<Box<dyn RenderContext>>);

impl ContextGuard {
    fn context(&mut self) -> Result<&mut Box<dyn RenderContext>> {
        self.0
            .as_mut()
            .ok_or_else(|| anyhow!("render context already closed"))
    }

    async fn close(mut self) -> Result<()> {
        match self.0.take() {
            Some(ctx) => ctx.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let Some(ctx) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = ctx.close().await {
                        warn!("failed to close abandoned render context: {e:#}");
                    }
                });
            }
            Err(_) => warn!("render context dropped outside a runtime; tab left open"),
        }
    }
}

/// Render `url` in a fresh context and return its visible text.
///
/// Waits `settle` after loading so late client-side rendering can finish.
/// The context is closed whether or not rendering succeeded, including when
/// the returned future is cancelled.
pub async fn render_visible_text(
    renderer: &dyn Renderer,
    url: &str,
    timeout: Duration,
    settle: Duration,
) -> Result<String> {
    let mut guard = ContextGuard(Some(renderer.new_context().await?));

    let outcome = async {
        let ctx = guard.context()?;
        ctx.navigate(url, timeout).await?;
        tokio::time::sleep(settle).await;
        let value = ctx.execute_js(VISIBLE_TEXT_SCRIPT).await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("visible text script returned a non-string value"))
    }
    .await;

    guard.close().await?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeRenderer {
        text: serde_json::Value,
        fail_navigation: bool,
        hang_navigation: bool,
        open: Arc<AtomicUsize>,
    }

    struct FakeContext {
        text: serde_json::Value,
        fail_navigation: bool,
        hang_navigation: bool,
        open: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeContext {
                text: self.text.clone(),
                fail_navigation: self.fail_navigation,
                hang_navigation: self.hang_navigation,
                open: Arc::clone(&self.open),
            }))
        }
        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
        fn active_contexts(&self) -> usize {
            self.open.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RenderContext for FakeContext {
        async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<NavigationResult> {
            if self.fail_navigation {
                return Err(anyhow!("navigation failed"));
            }
            if self.hang_navigation {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 1,
            })
        }
        async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
            assert!(script.contains("innerText"));
            Ok(self.text.clone())
        }
        async fn close(self: Box<Self>) -> Result<()> {
            self.open.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn renderer(text: serde_json::Value, fail_navigation: bool) -> FakeRenderer {
        FakeRenderer {
            text,
            fail_navigation,
            hang_navigation: false,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[tokio::test]
    async fn test_render_returns_text_and_closes_context() {
        let r = renderer(serde_json::json!("Primark\nZara"), false);
        let text = render_visible_text(&r, "https://x.com/stores", Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(text, "Primark\nZara");
        assert_eq!(r.active_contexts(), 0);
    }

    #[tokio::test]
    async fn test_render_failure_still_closes_context() {
        let r = renderer(serde_json::json!("unused"), true);
        let result =
            render_visible_text(&r, "https://x.com", Duration::from_secs(1), Duration::ZERO).await;
        assert!(result.is_err());
        assert_eq!(r.active_contexts(), 0);
    }

    #[tokio::test]
    async fn test_render_rejects_non_string_result() {
        let r = renderer(serde_json::json!(null), false);
        let result =
            render_visible_text(&r, "https://x.com", Duration::from_secs(1), Duration::ZERO).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_render_still_closes_context() {
        let r = FakeRenderer {
            hang_navigation: true,
            ..renderer(serde_json::json!("unused"), false)
        };
        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            render_visible_text(&r, "https://x.com", Duration::from_secs(60), Duration::ZERO),
        )
        .await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(r.active_contexts(), 0);
    }
}
