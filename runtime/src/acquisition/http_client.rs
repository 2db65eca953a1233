//! Async HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests with a Chrome user agent, redirect
//! following and per-request timeouts. Requests are never retried; callers
//! degrade to the next discovery strategy instead.

use crate::config::USER_AGENT;
use anyhow::Result;
use std::time::Duration;

/// Accept header sent with page and sitemap requests.
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header, if present.
    pub content_type: Option<String>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Content type is textual (HTML, plain text) or XML.
    pub fn is_text_like(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text") || ct.contains("xml")
            })
            .unwrap_or(false)
    }
}

/// Response from an HTTP HEAD request.
#[derive(Debug, Clone)]
pub struct HeadResponse {
    /// Requested URL.
    pub url: String,
    /// HTTP status code after redirects.
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
}

/// HTTP client for page, sitemap and probe requests.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with the standard Chrome user agent.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Perform a single GET request.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let r = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .timeout(timeout)
            .send()
            .await?;

        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let content_type = header_value(r.headers(), reqwest::header::CONTENT_TYPE);
        let body = r.text().await?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            content_type,
            body,
        })
    }

    /// Perform a single HEAD request.
    pub async fn head(&self, url: &str, timeout: Duration) -> Result<HeadResponse> {
        let r = self.client.head(url).timeout(timeout).send().await?;

        Ok(HeadResponse {
            url: url.to_string(),
            status: r.status().as_u16(),
            content_type: header_value(r.headers(), reqwest::header::CONTENT_TYPE),
        })
    }
}

fn header_value(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
