//! Output helpers shared by every subcommand.
//!
//! Global flags are passed through environment variables so that any
//! module can check them without threading a context around.

use crate::batch::RunSummary;
use crate::progress::{ProgressEventKind, ProgressReceiver};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;

pub fn is_json() -> bool {
    std::env::var_os("TENANT_SCOUT_JSON").is_some()
}

pub fn is_quiet() -> bool {
    std::env::var_os("TENANT_SCOUT_QUIET").is_some()
}

pub fn is_verbose() -> bool {
    std::env::var_os("TENANT_SCOUT_VERBOSE").is_some()
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}

/// `[OK]` / `[!!]` markers used by human-readable output.
pub fn mark(ok: bool) -> &'static str {
    if ok {
        "[OK]"
    } else {
        "[!!]"
    }
}

/// Print the totals of a finished run.
pub fn print_summary(title: &str, summary: &RunSummary, dry_run: bool) {
    if is_json() {
        print_json(&serde_json::json!({
            "run": title,
            "dryRun": dry_run,
            "successRate": summary.success_rate(),
            "summary": summary,
        }));
        return;
    }
    if is_quiet() {
        return;
    }

    println!();
    println!("{title}{}", if dry_run { " (dry run)" } else { "" });
    println!("{}", "=".repeat(title.len()));
    println!("  Processed:      {}", summary.total);
    println!("  Successful:     {}", summary.success);
    println!("  Failed:         {}", summary.failed);
    println!("  Tenants:        {}", summary.total_tenants);
    println!("  Success rate:   {:.1}%", summary.success_rate());
    println!("  Elapsed:        {:.1}s", summary.elapsed_ms as f64 / 1000.0);

    let failures: Vec<_> = summary.results.iter().filter(|r| r.error.is_some()).collect();
    if !failures.is_empty() {
        println!();
        println!("  Failures:");
        for r in failures {
            if let Some(e) = &r.error {
                println!("    {} {:<40} {e}", mark(false), r.location_name);
            }
        }
    }
}

/// Render progress events as a terminal progress bar until the run ends.
///
/// Hidden in JSON and quiet modes.
pub fn spawn_progress_bar(mut rx: ProgressReceiver) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = if is_json() || is_quiet() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}",
            ) {
                bar.set_style(style);
            }
            bar
        };

        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match event.event {
                ProgressEventKind::TargetsSelected { total } => bar.set_length(total as u64),
                ProgressEventKind::LocationStarted { name, .. } => bar.set_message(name),
                ProgressEventKind::LocationFinished { .. } => bar.inc(1),
                ProgressEventKind::Warning { message } => bar.println(format!("  Warning: {message}")),
                ProgressEventKind::RunComplete { .. } => break,
                _ => {}
            }
        }
        bar.finish_and_clear();
    })
}
