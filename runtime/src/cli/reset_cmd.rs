//! `tenant-scout reset`: delete checkpoint files so the next run starts over.

use crate::batch::ProgressLedger;
use crate::cli::output;
use crate::config::RunConfig;
use anyhow::Result;

pub async fn run() -> Result<()> {
    let config = RunConfig::from_env();
    let mut removed = Vec::new();
    for path in [&config.checkpoint_path, &config.dynamic_checkpoint_path] {
        if ProgressLedger::clear(path)? {
            removed.push(path.display().to_string());
        }
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({ "removed": removed }));
    } else if !output::is_quiet() {
        if removed.is_empty() {
            println!("  No checkpoint to remove.");
        }
        for path in &removed {
            println!("  {} Removed {path}", output::mark(true));
        }
    }
    Ok(())
}
