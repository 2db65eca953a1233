//! In-memory [`TenantStore`] used by tests and fixtures.

use super::{
    batch_order, matches_query, CategoryCount, CategoryNode, LocationQuery, LocationStats,
    NewTenant, StoreError, TenantStore,
};
use crate::types::Location;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    locations: BTreeMap<String, Location>,
    tenants: Vec<NewTenant>,
    categories: Vec<CategoryNode>,
    stats: HashMap<String, LocationStats>,
    deleted: usize,
}

/// Store holding everything in a mutex-guarded map.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations(locations: impl IntoIterator<Item = Location>) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            for location in locations {
                inner.locations.insert(location.id.clone(), location);
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Tenants currently stored for `location_id`, in insertion order.
    pub fn tenants_for(&self, location_id: &str) -> Vec<NewTenant> {
        self.lock()
            .map(|inner| {
                inner
                    .tenants
                    .iter()
                    .filter(|t| t.location_id == location_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Last stats written for `location_id`.
    pub fn stats_for(&self, location_id: &str) -> Option<LocationStats> {
        self.lock().ok()?.stats.get(location_id).cloned()
    }

    /// Total tenant rows removed by `delete_tenants` so far.
    pub fn deleted_count(&self) -> usize {
        self.lock().map(|inner| inner.deleted).unwrap_or(0)
    }
}

fn with_tenant_count(inner: &Inner, location: &Location) -> Location {
    let count = inner
        .tenants
        .iter()
        .filter(|t| t.location_id == location.id)
        .count();
    Location {
        tenant_count: location.tenant_count.max(count),
        ..location.clone()
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, StoreError> {
        let inner = self.lock()?;
        let mut found: Vec<Location> = inner
            .locations
            .values()
            .map(|l| with_tenant_count(&inner, l))
            .filter(|l| matches_query(l, query))
            .collect();
        found.sort_by(batch_order);
        found.truncate(query.limit);
        Ok(found)
    }

    async fn find_location(&self, id: &str) -> Result<Option<Location>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .locations
            .get(id)
            .map(|l| with_tenant_count(&inner, l)))
    }

    async fn upsert_location(&self, location: &Location) -> Result<(), StoreError> {
        self.lock()?
            .locations
            .insert(location.id.clone(), location.clone());
        Ok(())
    }

    async fn delete_tenants(&self, location_id: &str) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.tenants.len();
        inner.tenants.retain(|t| t.location_id != location_id);
        let removed = before - inner.tenants.len();
        inner.deleted += removed;
        if let Some(location) = inner.locations.get_mut(location_id) {
            location.tenant_count = 0;
        }
        Ok(removed)
    }

    async fn create_tenant(&self, tenant: &NewTenant) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner
            .tenants
            .iter()
            .any(|t| t.location_id == tenant.location_id && t.name == tenant.name)
        {
            return Err(StoreError::Duplicate {
                location_id: tenant.location_id.clone(),
                name: tenant.name.clone(),
            });
        }
        inner.tenants.push(tenant.clone());
        Ok(())
    }

    async fn category_counts(&self, location_id: &str) -> Result<Vec<CategoryCount>, StoreError> {
        let inner = self.lock()?;
        let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
        for tenant in inner.tenants.iter().filter(|t| t.location_id == location_id) {
            *by_category.entry(tenant.category.as_str()).or_insert(0) += 1;
        }
        let mut counts: Vec<CategoryCount> = by_category
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        Ok(counts)
    }

    async fn update_location_stats(&self, stats: &LocationStats) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let location = inner
            .locations
            .get_mut(&stats.location_id)
            .ok_or_else(|| StoreError::NotFound(stats.location_id.clone()))?;
        location.number_of_stores = Some(stats.tenant_count as i64);
        if stats.largest_category.is_some() {
            location.largest_category = stats.largest_category.clone();
            location.largest_category_percent = stats.largest_category_percent;
        }
        inner.stats.insert(stats.location_id.clone(), stats.clone());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryNode>, StoreError> {
        Ok(self.lock()?.categories.clone())
    }

    async fn upsert_category(
        &self,
        tier: u8,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, StoreError> {
        let mut inner = self.lock()?;
        if let Some(node) = inner
            .categories
            .iter_mut()
            .find(|c| c.tier == tier && c.name == name)
        {
            node.parent_id = parent_id.map(str::to_string);
            return Ok(node.id.clone());
        }
        let id = uuid::Uuid::new_v4().to_string();
        inner.categories.push(CategoryNode {
            id: id.clone(),
            name: name.to_string(),
            tier,
            parent_id: parent_id.map(str::to_string),
        });
        Ok(id)
    }
}
