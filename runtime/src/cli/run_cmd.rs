//! `tenant-scout run`: static enrichment for a batch or a single location.

use crate::acquisition::PageFetcher;
use crate::batch::{BatchOrchestrator, Target};
use crate::cli::{extraction_stack, open_store, output};
use crate::config::RunConfig;
use crate::enrichment::Enricher;
use crate::progress;
use anyhow::Result;
use std::sync::Arc;

/// Options for a static run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub location_id: Option<String>,
    pub location_type: Option<String>,
    pub limit: Option<usize>,
    pub dry_run: bool,
}

/// Run the static pipeline.
pub async fn run(options: RunOptions) -> Result<()> {
    let mut config = RunConfig::from_env().with_location_type(options.location_type.as_deref());
    config.dry_run = options.dry_run;
    if let Some(limit) = options.limit {
        config.batch_size = limit;
    }

    let store = open_store(&config)?;
    let (extractor, writer) = extraction_stack(&config, store.clone())?;
    let fetcher = Arc::new(PageFetcher::new(&config));
    let enricher = Arc::new(Enricher::new(fetcher, extractor, writer));

    let (tx, rx) = progress::channel();
    let bar = output::spawn_progress_bar(rx);
    let orchestrator = BatchOrchestrator::new(store, enricher, &config).with_progress(tx);

    let target = match options.location_id {
        Some(id) => Target::Single(id),
        None => Target::Batch,
    };
    let summary = orchestrator.run(target).await;
    drop(orchestrator);
    let _ = bar.await;

    output::print_summary("Enrichment run", &summary?, config.dry_run);
    Ok(())
}
