//! Writes extracted tenants for a location and refreshes its derived stats.

use crate::store::{largest_category, LocationStats, NewTenant, StoreError, TenantStore};
use crate::taxonomy::CategoryResolver;
use crate::types::TenantRecord;
use std::sync::Arc;
use tracing::{info, warn};

/// Tenants listed individually in dry-run logs.
const DRY_RUN_SAMPLE: usize = 5;

/// What [`TenantWriter::persist`] managed to do.
#[derive(Debug, Default)]
pub struct PersistOutcome {
    /// Records whose category resolved to a taxonomy id.
    pub resolved: usize,
    /// Rows inserted.
    pub saved: usize,
    /// Rows removed before insertion.
    pub deleted: usize,
    /// First store failure that stopped the write, if any.
    pub error: Option<StoreError>,
}

/// Replaces a location's tenants with freshly extracted ones.
///
/// Existing tenants are deleted before the new ones are inserted; the two
/// steps are not transactional.
pub struct TenantWriter {
    store: Arc<dyn TenantStore>,
    resolver: Arc<dyn CategoryResolver>,
    dry_run: bool,
}

impl TenantWriter {
    pub fn new(
        store: Arc<dyn TenantStore>,
        resolver: Arc<dyn CategoryResolver>,
        dry_run: bool,
    ) -> Self {
        Self {
            store,
            resolver,
            dry_run,
        }
    }

    pub async fn persist(&self, location_id: &str, tenants: &[TenantRecord]) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        let mut category_ids = Vec::with_capacity(tenants.len());
        for tenant in tenants {
            let id = self
                .resolver
                .resolve(&tenant.category, tenant.subcategory.as_deref())
                .await;
            if id.is_some() {
                outcome.resolved += 1;
            }
            category_ids.push(id);
        }
        info!(
            location_id,
            resolved = outcome.resolved,
            total = tenants.len(),
            "category ids resolved"
        );

        if self.dry_run {
            for tenant in tenants.iter().take(DRY_RUN_SAMPLE) {
                info!(
                    location_id,
                    anchor = tenant.is_anchor_tenant,
                    "dry run: would save {} → {} / {}",
                    tenant.name,
                    tenant.category,
                    tenant.subcategory.as_deref().unwrap_or("-")
                );
            }
            if tenants.len() > DRY_RUN_SAMPLE {
                info!(location_id, "dry run: ... and {} more", tenants.len() - DRY_RUN_SAMPLE);
            }
            return outcome;
        }

        match self.store.delete_tenants(location_id).await {
            Ok(deleted) => {
                if deleted > 0 {
                    info!(location_id, deleted, "removed existing tenants");
                }
                outcome.deleted = deleted;
            }
            Err(e) => {
                outcome.error = Some(e);
                return outcome;
            }
        }

        for (tenant, category_id) in tenants.iter().zip(category_ids) {
            let row = NewTenant {
                location_id: location_id.to_string(),
                name: tenant.name.clone(),
                category: tenant.category.clone(),
                subcategory: tenant.subcategory.clone(),
                category_id,
                is_anchor_tenant: tenant.is_anchor_tenant,
            };
            match self.store.create_tenant(&row).await {
                Ok(()) => outcome.saved += 1,
                Err(StoreError::Duplicate { .. }) => {}
                Err(e) => warn!(location_id, tenant = %tenant.name, "skipped tenant: {e}"),
            }
        }
        info!(location_id, saved = outcome.saved, "tenants saved");

        if let Err(e) = self.update_stats(location_id, outcome.saved).await {
            outcome.error = Some(e);
        }
        outcome
    }

    async fn update_stats(&self, location_id: &str, saved: usize) -> Result<(), StoreError> {
        let counts = self.store.category_counts(location_id).await?;
        let largest = largest_category(&counts);
        if let Some((category, share)) = &largest {
            info!(
                location_id,
                "largest category: {category} ({:.1}%)",
                share * 100.0
            );
        }
        let (largest_category, largest_category_percent) = largest.unzip();

        self.store
            .update_location_stats(&LocationStats {
                location_id: location_id.to_string(),
                tenant_count: saved,
                largest_category,
                largest_category_percent,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::Location;
    use async_trait::async_trait;

    /// Resolves everything except "Unknown".
    struct StubResolver;

    #[async_trait]
    impl CategoryResolver for StubResolver {
        async fn resolve(&self, category: &str, _subcategory: Option<&str>) -> Option<String> {
            (category != "Unknown").then(|| format!("cat:{category}"))
        }
    }

    fn location() -> Location {
        Location {
            id: "loc".into(),
            name: "Centre".into(),
            website: Some("centre.example.com".into()),
            city: None,
            location_type: "RETAIL_PARK".into(),
            number_of_stores: Some(99),
            tenant_count: 0,
            largest_category: None,
            largest_category_percent: None,
        }
    }

    fn record(name: &str, category: &str) -> TenantRecord {
        TenantRecord {
            name: name.into(),
            category: category.into(),
            subcategory: None,
            is_anchor_tenant: false,
        }
    }

    #[tokio::test]
    async fn test_persist_skips_duplicates_and_updates_stats() {
        let store = Arc::new(MemoryStore::with_locations([location()]));
        let writer = TenantWriter::new(store.clone(), Arc::new(StubResolver), false);

        let tenants = vec![
            record("Next", "Clothing & Footwear"),
            record("Next", "Clothing & Footwear"),
            record("Zara", "Clothing & Footwear"),
            record("Mystery", "Unknown"),
        ];
        let outcome = writer.persist("loc", &tenants).await;
        assert!(outcome.error.is_none());
        assert_eq!(outcome.resolved, 3);
        assert_eq!(outcome.saved, 3);

        let stats = store.stats_for("loc").unwrap();
        assert_eq!(stats.tenant_count, 3);
        assert_eq!(stats.largest_category.as_deref(), Some("Clothing & Footwear"));
        assert_eq!(stats.largest_category_percent, Some(0.667));

        let saved = store.tenants_for("loc");
        assert_eq!(saved[0].category_id.as_deref(), Some("cat:Clothing & Footwear"));
        assert!(saved[2].category_id.is_none());
    }

    #[tokio::test]
    async fn test_persist_replaces_existing_tenants() {
        let store = Arc::new(MemoryStore::with_locations([location()]));
        let writer = TenantWriter::new(store.clone(), Arc::new(StubResolver), false);

        writer.persist("loc", &[record("Old", "Services")]).await;
        let outcome = writer.persist("loc", &[record("New", "Services")]).await;
        assert_eq!(outcome.deleted, 1);
        let names: Vec<String> = store.tenants_for("loc").into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["New"]);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = Arc::new(MemoryStore::with_locations([location()]));
        let writer = TenantWriter::new(store.clone(), Arc::new(StubResolver), true);

        let outcome = writer.persist("loc", &[record("Boots", "Health & Beauty")]).await;
        assert_eq!(outcome.resolved, 1);
        assert_eq!(outcome.saved, 0);
        assert!(store.tenants_for("loc").is_empty());
        assert!(store.stats_for("loc").is_none());
    }

    #[tokio::test]
    async fn test_missing_location_reports_store_error() {
        let store = Arc::new(MemoryStore::new());
        let writer = TenantWriter::new(store, Arc::new(StubResolver), false);
        let outcome = writer.persist("ghost", &[record("Boots", "Health & Beauty")]).await;
        assert_eq!(outcome.saved, 1);
        assert!(matches!(outcome.error, Some(StoreError::NotFound(_))));
    }
}
