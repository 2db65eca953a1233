//! `tenant-scout seed-taxonomy`: write the category taxonomy into the store.

use crate::cli::{open_store, output};
use crate::config::RunConfig;
use crate::taxonomy::{seed_taxonomy, Taxonomy};
use anyhow::{Context, Result};

pub async fn run() -> Result<()> {
    let config = RunConfig::from_env();
    let store = open_store(&config)?;
    let report = seed_taxonomy(store.as_ref(), Taxonomy::embedded())
        .await
        .context("taxonomy seed failed")?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "sectors": report.sectors,
            "categories": report.categories,
            "subcategories": report.subcategories,
            "total": report.total(),
        }));
    } else if !output::is_quiet() {
        println!("  {} Seeded {} categories", output::mark(true), report.total());
        println!("     T1 (sectors):       {}", report.sectors);
        println!("     T2 (categories):    {}", report.categories);
        println!("     T3 (subcategories): {}", report.subcategories);
    }
    Ok(())
}
