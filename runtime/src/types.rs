//! Core domain types shared by discovery, extraction, persistence and the
//! batch orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A retail site being enriched.
///
/// Owned by the persistent store. The pipeline only reads identifying fields
/// and writes derived stats back through [`crate::store::TenantStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub city: Option<String>,
    /// Location type, e.g. `SHOPPING_CENTRE`, `RETAIL_PARK`.
    pub location_type: String,
    /// Store count as last recorded (may be a stale estimate).
    pub number_of_stores: Option<i64>,
    /// Number of tenant rows currently attached to the location.
    pub tenant_count: usize,
    /// Tier-2 category with the most tenants, as last computed.
    #[serde(default)]
    pub largest_category: Option<String>,
    /// Share of tenants in `largest_category`, in `[0, 1]`.
    #[serde(default)]
    pub largest_category_percent: Option<f64>,
}

/// A single tenant as returned by the classification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub is_anchor_tenant: bool,
}

/// Where a candidate URL was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlOrigin {
    SitemapIndexChild,
    SitemapUrl,
    PatternProbe,
}

/// A URL discovered via sitemap or probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub origin: UrlOrigin,
}

/// Outcome of directory discovery for one location.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryResult {
    /// The sitemap enumerates store pages under a common prefix.
    SitemapUrls {
        urls: Vec<String>,
        store_prefix: String,
    },
    /// A directory page listed in the sitemap.
    SitemapDirectory { url: String },
    /// A common directory path answered a HEAD probe.
    Pattern { path: String, url: String },
    NotFound,
}

impl DiscoveryResult {
    /// Source tag recorded in the enrichment result.
    pub fn source(&self) -> String {
        match self {
            Self::SitemapUrls { .. } => "sitemap-urls".to_string(),
            Self::SitemapDirectory { .. } => "sitemap-directory".to_string(),
            Self::Pattern { path, .. } => format!("pattern:{path}"),
            Self::NotFound => "none".to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Classification of a per-location failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    FetchFailed,
    JsRendered,
    NoTenants,
    Blacklisted,
    Timeout,
    ClassificationFailed,
    NoWebsite,
    StoreError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::FetchFailed => "FETCH_FAILED",
            Self::JsRendered => "JS_RENDERED",
            Self::NoTenants => "NO_TENANTS",
            Self::Blacklisted => "BLACKLISTED",
            Self::Timeout => "TIMEOUT",
            Self::ClassificationFailed => "CLASSIFICATION_FAILED",
            Self::NoWebsite => "NO_WEBSITE",
            Self::StoreError => "STORE_ERROR",
        };
        f.write_str(code)
    }
}

/// Error recorded on an [`EnrichmentResult`]. Displays as `KIND: detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl EnrichmentError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Per-location outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    pub location_id: String,
    pub location_name: String,
    pub tenants_found: usize,
    pub tenants_saved: usize,
    pub category_id_resolved: usize,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnrichmentError>,
}

impl EnrichmentResult {
    /// An empty result for `location` with no source yet.
    pub fn empty(location: &Location) -> Self {
        Self {
            location_id: location.id.clone(),
            location_name: location.name.clone(),
            tenants_found: 0,
            tenants_saved: 0,
            category_id_resolved: 0,
            source: "none".to_string(),
            error: None,
        }
    }

    /// An empty result carrying `error`.
    pub fn failed(location: &Location, error: EnrichmentError) -> Self {
        Self {
            error: Some(error),
            ..Self::empty(location)
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Whether this result counts as a success for run statistics.
    pub fn is_success(&self, dry_run: bool) -> bool {
        self.tenants_saved > 0 || (dry_run && self.tenants_found > 0)
    }
}
