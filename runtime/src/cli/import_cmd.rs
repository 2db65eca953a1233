//! `tenant-scout import <file>`: load locations from a JSON array.

use crate::cli::{open_store, output};
use crate::config::RunConfig;
use crate::store::TenantStore;
use crate::types::Location;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let locations: Vec<Location> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of locations", path.display()))?;

    let config = RunConfig::from_env();
    let store = open_store(&config)?;
    for location in &locations {
        store
            .upsert_location(location)
            .await
            .with_context(|| format!("failed to import location {}", location.id))?;
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({ "imported": locations.len() }));
    } else if !output::is_quiet() {
        println!("  {} Imported {} locations", output::mark(true), locations.len());
    }
    Ok(())
}
