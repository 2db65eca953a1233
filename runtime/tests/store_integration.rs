//! SQLite store exercised through the writer and the category cache.

use std::sync::Arc;
use tenant_scout::enrichment::TenantWriter;
use tenant_scout::store::{SqliteStore, TenantStore};
use tenant_scout::taxonomy::{seed_taxonomy, CategoryCache, CategoryResolver, Taxonomy};
use tenant_scout::types::{Location, TenantRecord};

fn location() -> Location {
    Location {
        id: "loc-1".to_string(),
        name: "Riverside Retail Park".to_string(),
        website: Some("https://riverside.example".to_string()),
        city: Some("York".to_string()),
        location_type: "RETAIL_PARK".to_string(),
        number_of_stores: Some(20),
        tenant_count: 0,
        largest_category: None,
        largest_category_percent: None,
    }
}

fn record(name: &str, category: &str, subcategory: Option<&str>) -> TenantRecord {
    TenantRecord {
        name: name.to_string(),
        category: category.to_string(),
        subcategory: subcategory.map(String::from),
        is_anchor_tenant: false,
    }
}

#[tokio::test]
async fn test_rewrite_replaces_tenants_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("scout.db");
    let store = Arc::new(SqliteStore::open(&path).unwrap());
    store.upsert_location(&location()).await.unwrap();

    let report = seed_taxonomy(store.as_ref(), Taxonomy::embedded()).await.unwrap();
    assert_eq!(report.sectors, 5);

    let cache = Arc::new(CategoryCache::new(store.clone()));
    assert!(cache.resolve("Fashion", None).await.is_some());

    let writer = TenantWriter::new(store.clone(), cache, false);
    let first = writer
        .persist(
            "loc-1",
            &[
                record("Dunelm", "Home & Garden", Some("Homeware")),
                record("B&Q", "Home & Garden", None),
                record("Costa", "Cafes & Restaurants", Some("Coffee Shop")),
                record("Costa", "Cafes & Restaurants", Some("Coffee Shop")),
            ],
        )
        .await;
    assert!(first.error.is_none());
    assert_eq!(first.saved, 3);
    assert_eq!(first.resolved, 4);

    let stored = store.find_location("loc-1").await.unwrap().unwrap();
    assert_eq!(stored.tenant_count, 3);
    assert_eq!(stored.number_of_stores, Some(3));
    assert_eq!(stored.largest_category.as_deref(), Some("Home & Garden"));
    assert_eq!(stored.largest_category_percent, Some(0.667));

    let second = writer
        .persist("loc-1", &[record("Tesco", "Food & Grocery", Some("Supermarket"))])
        .await;
    assert_eq!(second.deleted, 3);
    assert_eq!(second.saved, 1);

    // Reopening sees the committed state.
    drop(writer);
    drop(store);
    let reopened = SqliteStore::open(&path).unwrap();
    let stored = reopened.find_location("loc-1").await.unwrap().unwrap();
    assert_eq!(stored.tenant_count, 1);
    assert_eq!(stored.largest_category_percent, Some(1.0));
    assert_eq!(reopened.list_categories().await.unwrap().len(), report.total() - 1);
}
