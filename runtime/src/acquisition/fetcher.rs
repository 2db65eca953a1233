//! Page fetcher: the single entry point the pipeline uses for network reads.
//!
//! Every method swallows failures into `None`/`false`. A failed fetch is an
//! expected outcome during discovery and simply moves the caller on to the
//! next strategy.

use super::http_client::HttpClient;
use crate::config::RunConfig;
use crate::renderer::{self, Renderer};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How a page body is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Plain HTTP GET. Returns the raw body.
    Static,
    /// Headless-browser render. Returns visible text with navigation,
    /// footer, script and style content removed.
    Dynamic,
}

/// Network access used by discovery and enrichment.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url`, returning `None` on any error, non-2xx status, non-text
    /// content type or timeout.
    async fn fetch(&self, url: &str, mode: FetchMode) -> Option<String>;

    /// Lightweight existence check (HEAD). `true` only for a 2xx response.
    async fn exists(&self, url: &str) -> bool;
}

/// Production fetcher over reqwest and an optional headless browser.
pub struct PageFetcher {
    http: HttpClient,
    renderer: Option<Arc<dyn Renderer>>,
    fetch_timeout: Duration,
    probe_timeout: Duration,
    render_timeout: Duration,
    render_settle: Duration,
}

impl PageFetcher {
    /// Static-only fetcher; `FetchMode::Dynamic` always yields `None`.
    pub fn new(config: &RunConfig) -> Self {
        Self {
            http: HttpClient::new(config.fetch_timeout),
            renderer: None,
            fetch_timeout: config.fetch_timeout,
            probe_timeout: config.probe_timeout,
            render_timeout: config.render_timeout,
            render_settle: config.render_settle,
        }
    }

    /// Attach a browser for `FetchMode::Dynamic`.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    async fn fetch_static(&self, url: &str) -> Option<String> {
        match self.http.get(url, self.fetch_timeout).await {
            Ok(resp) if resp.is_success() && resp.is_text_like() => Some(resp.body),
            Ok(resp) => {
                debug!(
                    url,
                    status = resp.status,
                    content_type = resp.content_type.as_deref().unwrap_or(""),
                    "fetch rejected"
                );
                None
            }
            Err(e) => {
                debug!(url, "fetch failed: {e}");
                None
            }
        }
    }

    async fn fetch_dynamic(&self, url: &str) -> Option<String> {
        let renderer = self.renderer.as_ref()?;
        match renderer::render_visible_text(
            renderer.as_ref(),
            url,
            self.render_timeout,
            self.render_settle,
        )
        .await
        {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(url, "render failed: {e:#}");
                None
            }
        }
    }
}

#[async_trait]
impl Fetch for PageFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> Option<String> {
        match mode {
            FetchMode::Static => self.fetch_static(url).await,
            FetchMode::Dynamic => self.fetch_dynamic(url).await,
        }
    }

    async fn exists(&self, url: &str) -> bool {
        match self.http.head(url, self.probe_timeout).await {
            Ok(resp) => (200..300).contains(&resp.status),
            Err(_) => false,
        }
    }
}
