//! # cycletrace - Cycle Analytics Stage Queries
//!
//! The main binary for building and running stage event queries.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/cycletrace (THE BINARY)             │
//! │                                                          │
//! │  ┌─────────────┐    ┌──────────────┐    ┌────────────┐  │
//! │  │   CLI       │    │   Catalog    │    │ Event log  │  │
//! │  │  (clap)     │    │   (TOML)     │    │  (JSON)    │  │
//! │  └──────┬──────┘    └──────┬───────┘    └─────┬──────┘  │
//! │         └──────────────────┼──────────────────┘         │
//! │                            ▼                            │
//! │                  ┌──────────────────┐                   │
//! │                  │ cycletrace-core  │                   │
//! │                  │   (THE LOGIC)    │                   │
//! │                  └──────────────────┘                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! cycletrace stages
//! cycletrace build --stage staging --order end_event_timestamp:desc
//! cycletrace fetch --stage staging --events events.json --limit 10
//! cycletrace --catalog stages.toml build --stage lead_time
//! ```

use clap::Parser;
use cycletrace::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // CYCLETRACE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CYCLETRACE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "cycletrace=debug,cycletrace_core=debug"
    } else {
        "cycletrace=info,cycletrace_core=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so JSON on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the cycletrace startup banner.
fn print_banner() {
    println!(
        r#"
  cycletrace v{}
  Stage event queries - every query ordered
"#,
        env!("CARGO_PKG_VERSION")
    );
}
