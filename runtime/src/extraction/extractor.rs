//! Tenant extraction: page text or candidate names in, validated records out.

use super::classifier::{Classify, ClassifyError, ClassifyRequest};
use super::page_text::{collapse_whitespace, truncate_chars, visible_text};
use super::prompts;
use crate::config::RunConfig;
use crate::taxonomy::Taxonomy;
use crate::types::TenantRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Records from one classification call, plus the service failure if the
/// call did not complete.
#[derive(Debug, Default)]
pub struct Extraction {
    pub tenants: Vec<TenantRecord>,
    pub service_error: Option<ClassifyError>,
}

impl Extraction {
    fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

/// Wraps a [`Classify`] implementation with prompt building, input limits
/// and a hard timeout per call.
pub struct TenantExtractor {
    classifier: Arc<dyn Classify>,
    taxonomy: &'static Taxonomy,
    timeout: Duration,
    max_page_chars: usize,
    min_page_chars: usize,
    max_tenant_names: usize,
}

impl TenantExtractor {
    pub fn new(classifier: Arc<dyn Classify>, config: &RunConfig) -> Self {
        Self {
            classifier,
            taxonomy: Taxonomy::embedded(),
            timeout: config.classify_timeout,
            max_page_chars: config.max_page_chars,
            min_page_chars: config.min_page_chars,
            max_tenant_names: config.max_tenant_names,
        }
    }

    /// Extract and classify tenants listed on an HTML page.
    pub async fn extract_from_page(&self, html: &str, location_name: &str) -> Extraction {
        let text = visible_text(html);
        self.extract_from_text(&text, location_name).await
    }

    /// Extract and classify tenants from already-visible page text.
    pub async fn extract_from_text(&self, text: &str, location_name: &str) -> Extraction {
        let collapsed = collapse_whitespace(text);
        let text = truncate_chars(&collapsed, self.max_page_chars);
        if text.chars().count() < self.min_page_chars {
            debug!(chars = text.len(), "page text too short to extract");
            return Extraction::empty();
        }

        let request = ClassifyRequest {
            system: prompts::EXTRACTION_SYSTEM_PROMPT.to_string(),
            prompt: prompts::extraction_prompt(location_name, text, self.taxonomy),
        };
        self.submit(request).await
    }

    /// Classify candidate tenant names (e.g. cleaned URL slugs).
    pub async fn classify_from_names(&self, names: &[String], location_name: &str) -> Extraction {
        if names.is_empty() {
            return Extraction::empty();
        }
        let capped = &names[..names.len().min(self.max_tenant_names)];
        if capped.len() < names.len() {
            info!(
                from = names.len(),
                to = capped.len(),
                "capped names sent for classification"
            );
        }

        let request = ClassifyRequest {
            system: prompts::CLASSIFICATION_SYSTEM_PROMPT.to_string(),
            prompt: prompts::classification_prompt(location_name, capped, self.taxonomy),
        };
        self.submit(request).await
    }

    async fn submit(&self, request: ClassifyRequest) -> Extraction {
        let error = match tokio::time::timeout(self.timeout, self.classifier.classify(&request)).await {
            Ok(Ok(tenants)) => {
                return Extraction {
                    tenants,
                    service_error: None,
                }
            }
            Ok(Err(e)) => e,
            Err(_) => ClassifyError::Timeout(self.timeout),
        };
        warn!("classification failed: {error}");
        Extraction {
            tenants: Vec::new(),
            service_error: Some(error),
        }
    }
}
