//! The three-tier retail taxonomy (sector → category → subcategory).
//!
//! The taxonomy is embedded as JSON and serves two purposes: it is seeded
//! into the store so tenants can reference category ids, and it is rendered
//! into the classification prompt so the model answers with exact names.

pub mod cache;

pub use cache::{CategoryCache, CategoryResolver};

use crate::store::{StoreError, TenantStore};
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::info;

const TAXONOMY_JSON: &str = include_str!("ldc_taxonomy.json");

#[derive(Debug, Clone, Deserialize)]
pub struct Sector {
    pub name: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
    pub subcategories: Vec<String>,
}

/// Parsed taxonomy.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    pub sectors: Vec<Sector>,
}

/// Counts written by [`seed_taxonomy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub sectors: usize,
    pub categories: usize,
    pub subcategories: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.sectors + self.categories + self.subcategories
    }
}

impl Taxonomy {
    /// The embedded taxonomy, parsed once.
    pub fn embedded() -> &'static Taxonomy {
        static TAXONOMY: OnceLock<Taxonomy> = OnceLock::new();
        TAXONOMY.get_or_init(|| {
            serde_json::from_str(TAXONOMY_JSON).unwrap_or(Taxonomy { sectors: Vec::new() })
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.sectors.iter().flat_map(|s| s.categories.iter())
    }

    /// The `T2 → T3, T3, ...` listing included in classification prompts.
    pub fn prompt_listing(&self) -> String {
        let mut out = String::from("T2 CATEGORY → T3 SUBCATEGORIES:\n");
        for category in self.categories() {
            out.push('\n');
            out.push_str(&category.name);
            out.push_str(" → ");
            out.push_str(&category.subcategories.join(", "));
        }
        out
    }
}

/// Write the taxonomy into `store`. Safe to run repeatedly.
pub async fn seed_taxonomy(
    store: &dyn TenantStore,
    taxonomy: &Taxonomy,
) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    for sector in &taxonomy.sectors {
        let sector_id = store.upsert_category(1, &sector.name, None).await?;
        report.sectors += 1;

        for category in &sector.categories {
            let category_id = store
                .upsert_category(2, &category.name, Some(&sector_id))
                .await?;
            report.categories += 1;

            for subcategory in &category.subcategories {
                store
                    .upsert_category(3, subcategory, Some(&category_id))
                    .await?;
                report.subcategories += 1;
            }
        }
        info!(sector = %sector.name, "seeded sector");
    }

    Ok(report)
}
