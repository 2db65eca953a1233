//! `tenant-scout js`: dynamic-rendering pass over client-rendered sites.

use crate::acquisition::PageFetcher;
use crate::batch::{BatchOrchestrator, ProgressLedger, Target};
use crate::cli::{extraction_stack, open_store, output};
use crate::config::RunConfig;
use crate::enrichment::DynamicEnricher;
use crate::progress;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Run the dynamic pass for every location the static pass flagged as
/// `JS_RENDERED`, or for a single location.
pub async fn run(location_id: Option<String>, dry_run: bool) -> Result<()> {
    let mut config = RunConfig::from_env();
    config.dry_run = dry_run;

    let target = match location_id {
        Some(id) => Target::Single(id),
        None => {
            let ids = ProgressLedger::load(&config.checkpoint_path).js_rendered_ids();
            if ids.is_empty() {
                if output::is_json() {
                    output::print_json(&serde_json::json!({"run": "dynamic", "targets": 0}));
                } else if !output::is_quiet() {
                    println!("  No JS_RENDERED locations in the checkpoint. Run `tenant-scout run --batch` first.");
                }
                return Ok(());
            }
            Target::Ids(ids)
        }
    };

    let store = open_store(&config)?;
    let (extractor, writer) = extraction_stack(&config, store.clone())?;
    let renderer = Arc::new(ChromiumRenderer::new().await?);
    let fetcher = Arc::new(PageFetcher::new(&config).with_renderer(renderer.clone()));
    let enricher = Arc::new(DynamicEnricher::new(fetcher, extractor, writer));

    let (tx, rx) = progress::channel();
    let bar = output::spawn_progress_bar(rx);
    let orchestrator = BatchOrchestrator::new(store, enricher, &config)
        .with_checkpoint(config.dynamic_checkpoint_path.clone())
        .with_delay(config.dynamic_inter_location_delay)
        .with_progress(tx);

    let summary = orchestrator.run(target).await;
    drop(orchestrator);
    let _ = bar.await;

    if let Err(e) = renderer.shutdown().await {
        warn!("browser shutdown failed: {e:#}");
    }

    output::print_summary("Dynamic rendering run", &summary?, config.dry_run);
    Ok(())
}
