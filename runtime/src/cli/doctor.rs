//! Environment readiness check.

use crate::batch::ProgressLedger;
use crate::cli::output;
use crate::config::RunConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check the classification key, database, checkpoint and Chromium.
pub async fn run() -> Result<()> {
    let config = RunConfig::from_env();

    let api_key = std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty());
    let chromium = find_chromium();
    let db_exists = config.database_path.exists();
    let ledger = config
        .checkpoint_path
        .exists()
        .then(|| ProgressLedger::load(&config.checkpoint_path));

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "apiKey": api_key,
            "database": config.database_path.display().to_string(),
            "databaseExists": db_exists,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "checkpointProcessed": ledger.as_ref().map(|l| l.processed_ids.len()),
            "jsRendered": ledger.as_ref().map(|l| l.js_rendered_ids().len()),
        }));
        return Ok(());
    }

    println!("Tenant Scout Doctor");
    println!("===================");
    println!();

    if api_key {
        println!("{} OPENAI_API_KEY is set", output::mark(true));
    } else {
        println!("{} OPENAI_API_KEY is NOT set; run and js will fail", output::mark(false));
    }

    if db_exists {
        println!("{} Database: {}", output::mark(true), config.database_path.display());
    } else {
        println!(
            "{} Database not found: {} (created on first use; run `tenant-scout import` and `tenant-scout seed-taxonomy`)",
            output::mark(false),
            config.database_path.display()
        );
    }

    match &chromium {
        Some(path) => println!("{} Chromium found: {}", output::mark(true), path.display()),
        None => println!(
            "{} Chromium NOT found; the js pass needs TENANT_SCOUT_CHROMIUM_PATH or a system Chrome",
            output::mark(false)
        ),
    }

    match &ledger {
        Some(l) => println!(
            "[..] Checkpoint: {} processed, {} JS_RENDERED (started {})",
            l.processed_ids.len(),
            l.js_rendered_ids().len(),
            l.started_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("[..] No checkpoint; the next batch starts fresh"),
    }

    println!();
    println!("Status: {}", if api_key { "READY" } else { "NOT READY" });
    Ok(())
}
