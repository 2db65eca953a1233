//! Per-location enrichment: discovery, extraction, fallbacks and persistence.

use super::blacklist::{is_blacklisted, normalize_website};
use super::persist::TenantWriter;
use crate::acquisition::{Fetch, FetchMode};
use crate::cartography::sitemap::join_url;
use crate::cartography::store_prefix::extract_names_from_urls;
use crate::cartography::DirectoryDiscovery;
use crate::extraction::homepage::{is_js_rendered_page, scan_for_known_brands};
use crate::extraction::{ClassifyError, Extraction, TenantExtractor};
use crate::types::{
    DiscoveryResult, EnrichmentError, EnrichmentResult, ErrorKind, Location, TenantRecord,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Names from sitemap slugs are only classified when at least this many were found.
const MIN_SLUG_NAMES: usize = 5;
/// Below this many tenants the sitemap prefix page itself is tried.
const MIN_SLUG_TENANTS: usize = 5;
/// Below this many tenants the homepage fallback runs.
const MIN_DISCOVERED_TENANTS: usize = 3;
/// Known brands needed on a homepage before it is worth extracting.
const MIN_HOMEPAGE_BRANDS: usize = 3;
/// A fetched directory page must be larger than this to be extracted.
const MIN_PAGE_BYTES: usize = 500;

/// Produces one [`EnrichmentResult`] per location. Never fails; every
/// problem is recorded on the result.
#[async_trait]
pub trait LocationEnricher: Send + Sync {
    async fn enrich(&self, location: &Location) -> EnrichmentResult;
}

/// Best extraction seen so far for a location.
#[derive(Default)]
struct Candidate {
    tenants: Vec<TenantRecord>,
    source: Option<&'static str>,
    service_error: Option<ClassifyError>,
}

impl Candidate {
    fn len(&self) -> usize {
        self.tenants.len()
    }

    fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    fn note_error(&mut self, extraction: &mut Extraction) {
        if let Some(e) = extraction.service_error.take() {
            self.service_error = Some(e);
        }
    }

    /// Take `extraction` as the current best.
    fn replace(&mut self, mut extraction: Extraction, source: Option<&'static str>) {
        self.note_error(&mut extraction);
        self.tenants = extraction.tenants;
        if source.is_some() {
            self.source = source;
        }
    }

    /// Take `extraction` only when it found more tenants.
    fn adopt_if_better(&mut self, mut extraction: Extraction, source: &'static str) -> bool {
        self.note_error(&mut extraction);
        if extraction.len() > self.len() {
            self.tenants = extraction.tenants;
            self.source = Some(source);
            true
        } else {
            false
        }
    }
}

/// The static enrichment pipeline.
pub struct Enricher {
    fetcher: Arc<dyn Fetch>,
    discovery: DirectoryDiscovery,
    extractor: Arc<TenantExtractor>,
    writer: Arc<TenantWriter>,
}

impl Enricher {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        extractor: Arc<TenantExtractor>,
        writer: Arc<TenantWriter>,
    ) -> Self {
        Self {
            discovery: DirectoryDiscovery::new(fetcher.clone()),
            fetcher,
            extractor,
            writer,
        }
    }

    /// Extract from whatever discovery found.
    async fn extract_discovered(
        &self,
        discovery: &DiscoveryResult,
        website: &str,
        location: &Location,
    ) -> Candidate {
        let mut best = Candidate::default();

        match discovery {
            DiscoveryResult::SitemapUrls { urls, store_prefix } => {
                let names = extract_names_from_urls(urls, store_prefix);
                info!(
                    location_id = %location.id,
                    names = names.len(),
                    prefix = %store_prefix,
                    "names from sitemap urls"
                );
                if names.len() >= MIN_SLUG_NAMES {
                    let extraction = self
                        .extractor
                        .classify_from_names(&names, &location.name)
                        .await;
                    best.replace(extraction, None);
                }

                if best.len() < MIN_SLUG_TENANTS {
                    debug!(location_id = %location.id, "slug names insufficient, trying prefix page");
                    if let Some(html) = self.fetch_page(website, store_prefix).await {
                        let extraction = self
                            .extractor
                            .extract_from_page(&html, &location.name)
                            .await;
                        best.adopt_if_better(extraction, "sitemap-directory-fallback");
                    }
                }
            }
            DiscoveryResult::SitemapDirectory { url } | DiscoveryResult::Pattern { url, .. } => {
                match self.fetcher.fetch(url, FetchMode::Static).await {
                    Some(html) if html.len() > MIN_PAGE_BYTES => {
                        let extraction = self
                            .extractor
                            .extract_from_page(&html, &location.name)
                            .await;
                        best.replace(extraction, None);
                    }
                    _ => debug!(location_id = %location.id, url = %url, "directory page too small"),
                }
            }
            DiscoveryResult::NotFound => {}
        }

        best
    }

    async fn fetch_page(&self, website: &str, path: &str) -> Option<String> {
        let url = join_url(website, path)?;
        self.fetcher
            .fetch(&url, FetchMode::Static)
            .await
            .filter(|body| body.len() > MIN_PAGE_BYTES)
    }

    /// Homepage fallback. Returns an error that ends the location early
    /// when there is nothing else to report.
    async fn homepage_fallback(
        &self,
        website: &str,
        location: &Location,
        best: &mut Candidate,
        result: &mut EnrichmentResult,
    ) -> Option<EnrichmentError> {
        let Some(html) = self.fetcher.fetch(website, FetchMode::Static).await else {
            if best.is_empty() {
                return Some(EnrichmentError::new(
                    ErrorKind::FetchFailed,
                    "could not reach website",
                ));
            }
            return None;
        };

        if is_js_rendered_page(&html) {
            info!(location_id = %location.id, "homepage is a client-rendered shell");
            let error = EnrichmentError::new(
                ErrorKind::JsRendered,
                "homepage is a client-rendered shell; needs the dynamic pass",
            );
            if best.is_empty() {
                return Some(error);
            }
            result.error = Some(error);
            return None;
        }

        let brands = scan_for_known_brands(&html);
        debug!(location_id = %location.id, brands = brands.len(), "known brands on homepage");

        if brands.len() >= MIN_HOMEPAGE_BRANDS {
            let extraction = self.extractor.extract_from_page(&html, &location.name).await;
            if best.adopt_if_better(extraction, "homepage-fallback") {
                info!(location_id = %location.id, tenants = best.len(), "homepage extraction adopted");
            }
        } else if !brands.is_empty() && best.is_empty() {
            let extraction = self.extractor.extract_from_page(&html, &location.name).await;
            best.adopt_if_better(extraction, "homepage-lastresort");
        }
        None
    }
}

#[async_trait]
impl LocationEnricher for Enricher {
    async fn enrich(&self, location: &Location) -> EnrichmentResult {
        let mut result = EnrichmentResult::empty(location);

        let Some(raw_website) = location.website.as_deref().filter(|w| !w.trim().is_empty()) else {
            return EnrichmentResult::failed(
                location,
                EnrichmentError::new(ErrorKind::NoWebsite, "location has no website"),
            );
        };
        if is_blacklisted(raw_website) {
            info!(location_id = %location.id, website = raw_website, "blacklisted website");
            return EnrichmentResult::failed(
                location,
                EnrichmentError::new(ErrorKind::Blacklisted, raw_website),
            );
        }
        let website = normalize_website(raw_website);

        let discovery = self.discovery.discover(&website).await;
        info!(location_id = %location.id, source = %discovery.source(), "discovery finished");

        let mut best = self.extract_discovered(&discovery, &website, location).await;

        if best.len() < MIN_DISCOVERED_TENANTS {
            debug!(location_id = %location.id, "trying homepage fallback");
            if let Some(error) = self
                .homepage_fallback(&website, location, &mut best, &mut result)
                .await
            {
                result.error = Some(error);
                return result;
            }
        }

        result.tenants_found = best.len();
        result.source = best
            .source
            .map(str::to_string)
            .unwrap_or_else(|| discovery.source());

        if best.tenants.is_empty() {
            if result.error.is_none() {
                result.error = Some(match best.service_error.take() {
                    Some(e) => EnrichmentError::new(ErrorKind::ClassificationFailed, e.to_string()),
                    None => EnrichmentError::new(
                        ErrorKind::NoTenants,
                        "no tenants could be extracted from any source",
                    ),
                });
            }
            return result;
        }

        info!(location_id = %location.id, tenants = best.len(), source = %result.source, "tenants extracted");

        let outcome = self.writer.persist(&location.id, &best.tenants).await;
        result.category_id_resolved = outcome.resolved;
        result.tenants_saved = outcome.saved;
        if let Some(e) = outcome.error {
            warn!(location_id = %location.id, "store error: {e}");
            result.error = Some(EnrichmentError::new(ErrorKind::StoreError, e.to_string()));
        }
        result
    }
}
