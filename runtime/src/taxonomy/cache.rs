//! Cached category-name → id resolution over the store's taxonomy.

use crate::store::{CategoryNode, StoreError, TenantStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Variant category strings the model tends to produce, mapped to canonical names.
const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("Fashion & Clothing", "Clothing & Footwear"),
    ("Fashion", "Clothing & Footwear"),
    ("Fashion & Apparel", "Clothing & Footwear"),
    ("Electronics & Technology", "Electrical & Technology"),
    ("Electronics", "Electrical & Technology"),
    ("Entertainment", "Leisure & Entertainment"),
    ("Leisure", "Leisure & Entertainment"),
    ("Sports & Outdoors", "Leisure & Entertainment"),
    ("Homeware & Lifestyle", "Home & Garden"),
    ("Home & Lifestyle", "Home & Garden"),
    ("Jewellery & Accessories", "Jewellery & Watches"),
    ("Food & Drink", "Cafes & Restaurants"),
    ("Food & Beverage", "Cafes & Restaurants"),
    ("Uncategorized", "Other"),
];

/// Maps a (category, subcategory) pair to a category id.
///
/// `None` means "unresolved" and is never fatal to the caller.
#[async_trait]
pub trait CategoryResolver: Send + Sync {
    async fn resolve(&self, category: &str, subcategory: Option<&str>) -> Option<String>;
}

#[derive(Debug, Default)]
struct CategoryIndex {
    by_name: HashMap<String, CategoryNode>,
    by_id: HashMap<String, CategoryNode>,
}

impl CategoryIndex {
    fn build(nodes: Vec<CategoryNode>) -> Self {
        let mut index = Self::default();
        for node in nodes {
            // The deepest tier owns a shared name ("Vacant" is both T1 and T2).
            let replace = index
                .by_name
                .get(&node.name)
                .map_or(true, |existing| node.tier > existing.tier);
            if replace {
                index.by_name.insert(node.name.clone(), node.clone());
            }
            index.by_id.insert(node.id.clone(), node);
        }
        index
    }

    fn id_for(&self, name: &str) -> Option<String> {
        self.by_name.get(name).map(|n| n.id.clone())
    }

    fn resolve(&self, category: &str, subcategory: Option<&str>) -> Option<String> {
        if let Some(id) = subcategory.and_then(|s| self.id_for(s)) {
            return Some(id);
        }
        if let Some(id) = self.id_for(category) {
            return Some(id);
        }
        CATEGORY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == category)
            .and_then(|(_, canonical)| self.id_for(canonical))
    }

    fn ancestor_at_tier(&self, id: &str, tier: u8) -> Option<String> {
        let mut node = self.by_id.get(id)?;
        while node.tier > tier {
            node = self.by_id.get(node.parent_id.as_deref()?)?;
        }
        (node.tier == tier).then(|| node.name.clone())
    }
}

/// Loads the taxonomy from the store on first use and keeps it until
/// [`CategoryCache::clear`] is called.
pub struct CategoryCache {
    store: Arc<dyn TenantStore>,
    index: RwLock<Option<Arc<CategoryIndex>>>,
}

impl CategoryCache {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self {
            store,
            index: RwLock::new(None),
        }
    }

    async fn index(&self) -> Result<Arc<CategoryIndex>, StoreError> {
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(index.clone());
        }

        let mut slot = self.index.write().await;
        if let Some(index) = slot.as_ref() {
            return Ok(index.clone());
        }
        let nodes = self.store.list_categories().await?;
        debug!(categories = nodes.len(), "category cache loaded");
        let index = Arc::new(CategoryIndex::build(nodes));
        *slot = Some(index.clone());
        Ok(index)
    }

    /// Drop the cached taxonomy; the next lookup reloads it.
    pub async fn clear(&self) {
        *self.index.write().await = None;
    }

    /// Name of the tier-2 category for `category_id` (itself if already tier 2).
    pub async fn tier2_name(&self, category_id: &str) -> Option<String> {
        self.index().await.ok()?.ancestor_at_tier(category_id, 2)
    }

    /// Name of the tier-1 sector above `category_id`.
    pub async fn tier1_name(&self, category_id: &str) -> Option<String> {
        self.index().await.ok()?.ancestor_at_tier(category_id, 1)
    }
}

#[async_trait]
impl CategoryResolver for CategoryCache {
    async fn resolve(&self, category: &str, subcategory: Option<&str>) -> Option<String> {
        match self.index().await {
            Ok(index) => index.resolve(category, subcategory),
            Err(e) => {
                warn!("category lookup unavailable: {e}");
                None
            }
        }
    }
}
