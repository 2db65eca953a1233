// Copyright 2026 Tenant Scout Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tenant_scout::cli;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tenant-scout",
    about = "Tenant Scout: discover and classify the tenants of UK retail locations",
    version,
    after_help = "Run 'tenant-scout <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["batch", "id"])))]
struct RunArgs {
    /// Process the next batch of unenriched locations
    #[arg(long)]
    batch: bool,
    /// Process a single location by id
    #[arg(long)]
    id: Option<String>,
    /// Restrict the batch to one location type (e.g. RETAIL_PARK)
    #[arg(long = "type", requires = "batch")]
    location_type: Option<String>,
    /// Maximum locations in the batch
    #[arg(long, requires = "batch")]
    limit: Option<usize>,
    /// Extract and classify but write nothing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich locations with the static pipeline
    Run(RunArgs),
    /// Re-run client-rendered sites through a headless browser
    Js {
        /// Process a single location by id
        #[arg(long)]
        id: Option<String>,
        /// Extract and classify but write nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete checkpoint files so the next run starts over
    Reset,
    /// Write the category taxonomy into the database
    SeedTaxonomy,
    /// Import locations from a JSON array file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(json: bool, verbose: bool) {
    let directive = if verbose {
        "tenant_scout=debug"
    } else {
        "tenant_scout=info"
    };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = directive.parse() {
        filter = filter.add_directive(d);
    }
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("TENANT_SCOUT_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("TENANT_SCOUT_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("TENANT_SCOUT_VERBOSE", "1");
    }
    init_tracing(cli.json, cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => {
            cli::run_cmd::run(cli::run_cmd::RunOptions {
                location_id: args.id,
                location_type: args.location_type,
                limit: args.limit,
                dry_run: args.dry_run,
            })
            .await
        }
        Commands::Js { id, dry_run } => cli::js_cmd::run(id, dry_run).await,
        Commands::Reset => cli::reset_cmd::run().await,
        Commands::SeedTaxonomy => cli::seed_cmd::run().await,
        Commands::Import { file } => cli::import_cmd::run(&file).await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tenant-scout", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else if !cli::output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
