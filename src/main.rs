//! # vsearch CLI
//!
//! ## Usage
//!
//! ```bash
//! vsearch --config ./config/vsearch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vsearch ask "<query>"` | Run one search and print the annotated summary |
//! | `vsearch annotate "<text>"` | Show how a summary splits into segments |
//! | `vsearch serve` | Start the JSON HTTP server |
//! | `vsearch check-config` | Validate the configuration file |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vsearch::ask::{self, OutputFormat};
use vsearch::config;
use vsearch::server;

/// Ask questions against a Vectara corpus and render cited summaries.
#[derive(Parser)]
#[command(name = "vsearch", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/vsearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and print the summary with its sources.
    Ask {
        /// The question to ask.
        query: String,

        /// Output format: `text`, `html`, or `json`.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Split a summary into text and reference segments.
    ///
    /// Does not read the config or contact the backend.
    Annotate {
        /// Summary text containing `[n]` markers.
        text: String,

        /// Output format: `text`, `html`, or `json`.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Start the JSON HTTP server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,

    /// Load and validate the configuration, then print a summary of it.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Annotate { text, format } = &cli.command {
        ask::run_annotate(text, *format)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ask { query, format } => {
            ask::run_ask(&cfg, &query, format).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::CheckConfig => {
            println!("Config OK: {}", cli.config.display());
            println!("  endpoint:    {}", cfg.backend.endpoint);
            println!("  customer_id: {}", cfg.backend.customer_id);
            println!("  corpus_id:   {}", cfg.backend.corpus_id);
            println!(
                "  api_key:     {}",
                if cfg.backend.resolve_api_key().is_some() {
                    "set"
                } else {
                    "missing"
                }
            );
            println!("  timeout:     {}s", cfg.backend.timeout_secs);
            println!("  bind:        {}", cfg.server.bind);
            match cfg.store.max_entries {
                Some(n) => println!("  max_entries: {}", n),
                None => println!("  max_entries: unbounded"),
            }
        }
        Commands::Annotate { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
