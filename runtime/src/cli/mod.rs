//! CLI subcommand implementations for the tenant-scout binary.

pub mod doctor;
pub mod import_cmd;
pub mod js_cmd;
pub mod output;
pub mod reset_cmd;
pub mod run_cmd;
pub mod seed_cmd;

use crate::config::RunConfig;
use crate::enrichment::TenantWriter;
use crate::extraction::{ChatClassifier, TenantExtractor};
use crate::store::{SqliteStore, TenantStore};
use crate::taxonomy::CategoryCache;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Open the SQLite store at the configured path.
pub(crate) fn open_store(config: &RunConfig) -> Result<Arc<SqliteStore>> {
    SqliteStore::open(&config.database_path)
        .with_context(|| format!("cannot open database {}", config.database_path.display()))
        .map(Arc::new)
}

/// Extractor and writer shared by the static and dynamic pipelines.
pub(crate) fn extraction_stack(
    config: &RunConfig,
    store: Arc<dyn TenantStore>,
) -> Result<(Arc<TenantExtractor>, Arc<TenantWriter>)> {
    let classifier = ChatClassifier::from_env().context("classification service unavailable")?;
    let extractor = Arc::new(TenantExtractor::new(Arc::new(classifier), config));
    let resolver = Arc::new(CategoryCache::new(store.clone()));
    let writer = Arc::new(TenantWriter::new(store, resolver, config.dry_run));
    Ok((extractor, writer))
}
