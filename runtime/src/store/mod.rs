//! Persistent store for locations, tenants and the category taxonomy.
//!
//! The pipeline talks to storage only through [`TenantStore`]. A SQLite
//! implementation backs the binary; [`memory::MemoryStore`] backs tests.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::types::Location;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a [`TenantStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A tenant with the same name already exists for the location.
    #[error("duplicate tenant {name:?} for location {location_id}")]
    Duplicate { location_id: String, name: String },

    #[error("location not found: {0}")]
    NotFound(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Selection criteria for a batch run.
///
/// Matches locations that have a website, have no tenants, have one of
/// `location_types`, and are not in `exclude_ids`. Results are ordered by
/// type ascending, store count descending (unknown counts last), then id.
#[derive(Debug, Clone, Default)]
pub struct LocationQuery {
    pub location_types: Vec<String>,
    pub exclude_ids: Vec<String>,
    pub limit: usize,
}

/// A tenant row to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    pub location_id: String,
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub category_id: Option<String>,
    pub is_anchor_tenant: bool,
}

/// Number of tenants at a location sharing one `category` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Derived fields written back to a location after enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationStats {
    pub location_id: String,
    pub tenant_count: usize,
    pub largest_category: Option<String>,
    pub largest_category_percent: Option<f64>,
}

/// One node of the three-tier category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    /// 1 = sector, 2 = category, 3 = subcategory.
    pub tier: u8,
    pub parent_id: Option<String>,
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, StoreError>;

    async fn find_location(&self, id: &str) -> Result<Option<Location>, StoreError>;

    /// Insert or replace a location's identifying fields.
    async fn upsert_location(&self, location: &Location) -> Result<(), StoreError>;

    /// Remove every tenant of a location, returning how many were removed.
    async fn delete_tenants(&self, location_id: &str) -> Result<usize, StoreError>;

    /// Insert one tenant. Fails with [`StoreError::Duplicate`] when the
    /// location already has a tenant of that name.
    async fn create_tenant(&self, tenant: &NewTenant) -> Result<(), StoreError>;

    async fn category_counts(&self, location_id: &str) -> Result<Vec<CategoryCount>, StoreError>;

    async fn update_location_stats(&self, stats: &LocationStats) -> Result<(), StoreError>;

    async fn list_categories(&self) -> Result<Vec<CategoryNode>, StoreError>;

    /// Insert a category, or update the parent of the existing
    /// `(tier, name)` row. Returns the category id.
    async fn upsert_category(
        &self,
        tier: u8,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, StoreError>;
}

/// Largest category and its share of all tenants, rounded to three decimals.
///
/// Ties go to the alphabetically first category.
pub fn largest_category(counts: &[CategoryCount]) -> Option<(String, f64)> {
    let total: usize = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        return None;
    }
    let top = counts
        .iter()
        .max_by(|a, b| a.count.cmp(&b.count).then_with(|| b.category.cmp(&a.category)))?;
    let share = top.count as f64 / total as f64;
    Some((top.category.clone(), (share * 1000.0).round() / 1000.0))
}

/// Whether `location` matches the batch criteria of `query`, ignoring order and limit.
pub(crate) fn matches_query(location: &Location, query: &LocationQuery) -> bool {
    location.website.as_deref().is_some_and(|w| !w.is_empty())
        && location.tenant_count == 0
        && query.location_types.contains(&location.location_type)
        && !query.exclude_ids.contains(&location.id)
}

/// Batch ordering: type ascending, store count descending with unknown last, id.
pub(crate) fn batch_order(a: &Location, b: &Location) -> std::cmp::Ordering {
    a.location_type
        .cmp(&b.location_type)
        .then_with(|| match (a.number_of_stores, b.number_of_stores) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}
