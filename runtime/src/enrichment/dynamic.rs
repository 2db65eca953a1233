//! Dynamic-rendering pass for sites whose tenant lists only appear after
//! client-side rendering.

use super::blacklist::{is_blacklisted, normalize_website};
use super::enricher::LocationEnricher;
use super::persist::TenantWriter;
use crate::acquisition::{Fetch, FetchMode};
use crate::cartography::sitemap::join_url;
use crate::extraction::{ClassifyError, TenantExtractor};
use crate::types::{EnrichmentError, EnrichmentResult, ErrorKind, Location, TenantRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Paths rendered in order; the empty path is the homepage.
pub const DYNAMIC_PATHS: &[&str] = &[
    "/stores",
    "/shops",
    "/retailers",
    "/brands",
    "/store-directory",
    "/directory",
    "/our-stores",
    "/shopping",
    "/whats-here",
    "/whos-here",
    "/all-stores",
    "/stores-and-restaurants",
    "",
];

/// Rendered text shorter than this is not worth a classification call.
const MIN_RENDERED_CHARS: usize = 200;
/// Stop rendering further paths once a page yields this many tenants.
const ENOUGH_TENANTS: usize = 10;

/// Renders candidate directory paths in a headless browser and extracts
/// from the visible text.
pub struct DynamicEnricher {
    fetcher: Arc<dyn Fetch>,
    extractor: Arc<TenantExtractor>,
    writer: Arc<TenantWriter>,
}

impl DynamicEnricher {
    /// `fetcher` must have a renderer attached; without one every path
    /// renders to nothing and the location ends as `FETCH_FAILED`.
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        extractor: Arc<TenantExtractor>,
        writer: Arc<TenantWriter>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            writer,
        }
    }
}

fn source_tag(path: &str) -> String {
    if path.is_empty() {
        "dynamic:/".to_string()
    } else {
        format!("dynamic:{path}")
    }
}

#[async_trait]
impl LocationEnricher for DynamicEnricher {
    async fn enrich(&self, location: &Location) -> EnrichmentResult {
        let Some(raw_website) = location.website.as_deref().filter(|w| !w.trim().is_empty()) else {
            return EnrichmentResult::failed(
                location,
                EnrichmentError::new(ErrorKind::NoWebsite, "location has no website"),
            );
        };
        if is_blacklisted(raw_website) {
            return EnrichmentResult::failed(
                location,
                EnrichmentError::new(ErrorKind::Blacklisted, raw_website),
            );
        }
        let website = normalize_website(raw_website);

        let mut best: Vec<TenantRecord> = Vec::new();
        let mut best_path: Option<&str> = None;
        let mut service_error: Option<ClassifyError> = None;
        let mut rendered_any = false;

        for &path in DYNAMIC_PATHS {
            let url = if path.is_empty() {
                website.clone()
            } else {
                match join_url(&website, path) {
                    Some(url) => url,
                    None => break,
                }
            };

            let Some(text) = self.fetcher.fetch(&url, FetchMode::Dynamic).await else {
                debug!(location_id = %location.id, url = %url, "render failed");
                continue;
            };
            rendered_any = true;
            if text.chars().count() < MIN_RENDERED_CHARS {
                debug!(location_id = %location.id, url = %url, chars = text.len(), "rendered text too short");
                continue;
            }

            let mut extraction = self.extractor.extract_from_text(&text, &location.name).await;
            if let Some(e) = extraction.service_error.take() {
                service_error = Some(e);
            }
            info!(location_id = %location.id, url = %url, tenants = extraction.len(), "rendered page extracted");

            if extraction.len() > best.len() {
                best = extraction.tenants;
                best_path = Some(path);
            }
            if best.len() >= ENOUGH_TENANTS {
                break;
            }
        }

        let mut result = EnrichmentResult::empty(location);
        let Some(path) = best_path else {
            let error = match (rendered_any, service_error) {
                (false, _) => EnrichmentError::new(ErrorKind::FetchFailed, "no path could be rendered"),
                (true, Some(e)) => EnrichmentError::new(ErrorKind::ClassificationFailed, e.to_string()),
                (true, None) => EnrichmentError::new(
                    ErrorKind::NoTenants,
                    "no tenants found on any rendered page",
                ),
            };
            result.error = Some(error);
            return result;
        };

        result.source = source_tag(path);
        result.tenants_found = best.len();

        let outcome = self.writer.persist(&location.id, &best).await;
        result.category_id_resolved = outcome.resolved;
        result.tenants_saved = outcome.saved;
        if let Some(e) = outcome.error {
            warn!(location_id = %location.id, "store error: {e}");
            result.error = Some(EnrichmentError::new(ErrorKind::StoreError, e.to_string()));
        }
        result
    }
}
