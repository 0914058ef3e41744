//! # cycletrace CLI Module
//!
//! This module implements the CLI interface for cycletrace.
//!
//! ## Available Commands
//!
//! - `stages` - List catalog stages
//! - `build` - Build the event query for a stage and print it
//! - `fetch` - Build the query and run it against a JSON event log

mod commands;

use crate::config::load_catalog;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use cycletrace_core::{OrderSpec, Predicate, QueryConfig, StageQueryError, TimeRange};
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// cycletrace - cycle analytics stage event queries
///
/// Every query carries an explicit order: yours, or the stage's default.
#[derive(Parser, Debug)]
#[command(name = "cycletrace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML file with extra or replacement stages
    #[arg(short = 'C', long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List catalog stages
    Stages,

    /// Build the event query for a stage
    Build {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Build the event query and run it against an event log
    Fetch {
        #[command(flatten)]
        query: QueryArgs,

        /// JSON array of event records
        #[arg(short, long)]
        events: PathBuf,
    },
}

/// Stage selection and query overrides shared by `build` and `fetch`.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Stage name (see `stages`)
    #[arg(short, long)]
    pub stage: String,

    /// Order as field[:asc|desc]
    #[arg(short, long)]
    pub order: Option<String>,

    /// Earliest start event (RFC 3339)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest start event (RFC 3339, default: now)
    #[arg(long)]
    pub to: Option<String>,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<NonZeroUsize>,

    /// Fields to return (comma-separated)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Only items carrying this label (repeatable)
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

impl QueryArgs {
    /// Translate the flags into a [`QueryConfig`].
    ///
    /// Flags left out stay absent so the builder applies its defaults.
    pub fn to_config(&self) -> Result<QueryConfig, StageQueryError> {
        let mut config = QueryConfig::new();

        if let Some(order) = &self.order {
            config = config.with_order(order.parse::<OrderSpec>()?);
        }

        match (&self.from, &self.to) {
            (Some(from), Some(to)) => {
                config = config.with_time_range(TimeRange::new(parse_time(from)?, parse_time(to)?));
            }
            (Some(from), None) => {
                config = config.with_time_range(TimeRange::new(parse_time(from)?, Utc::now()));
            }
            (None, Some(_)) => {
                return Err(StageQueryError::Config("--to requires --from".to_string()));
            }
            (None, None) => {}
        }

        if let Some(limit) = self.limit {
            config = config.with_limit(limit);
        }

        if let Some(project) = &self.project {
            config = config.with_projection(
                project
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty()),
            );
        }

        for label in &self.labels {
            config = config.with_filter(Predicate::has_label(label));
        }

        Ok(config)
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, StageQueryError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StageQueryError::Config(format!("Invalid timestamp '{}': {}", raw, e)))
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), StageQueryError> {
    let catalog = load_catalog(cli.catalog.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Stages) | None => cmd_stages(&catalog, json_mode),
        Some(Commands::Build { query }) => cmd_build(&catalog, &query, json_mode),
        Some(Commands::Fetch { query, events }) => cmd_fetch(&catalog, &query, &events, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(stage: &str) -> QueryArgs {
        QueryArgs {
            stage: stage.to_string(),
            ..QueryArgs::default()
        }
    }

    #[test]
    fn empty_args_give_empty_config() {
        let config = args("staging").to_config().expect("config");
        assert!(config.is_empty());
    }

    #[test]
    fn flags_map_to_config() {
        let mut a = args("staging");
        a.order = Some("end_event_timestamp:desc".to_string());
        a.from = Some("2024-01-01T00:00:00Z".to_string());
        a.to = Some("2024-02-01T00:00:00Z".to_string());
        a.limit = NonZeroUsize::new(3);
        a.project = Some("item_id, end_event_timestamp,".to_string());
        a.labels = vec!["backend".to_string()];

        let config = a.to_config().expect("config");
        assert_eq!(
            config.order,
            Some(OrderSpec::descending("end_event_timestamp"))
        );
        assert!(config.time_range.is_some());
        assert_eq!(config.limit, NonZeroUsize::new(3));
        assert_eq!(config.projection.as_ref().map(|p| p.len()), Some(2));
        assert!(config.filters.contains(&Predicate::has_label("backend")));
    }

    #[test]
    fn from_without_to_runs_until_now() {
        let mut a = args("staging");
        a.from = Some("2024-01-01T00:00:00Z".to_string());
        let before = Utc::now();

        let range = a.to_config().expect("config").time_range.expect("range");
        assert_eq!(range.from, parse_time("2024-01-01T00:00:00Z").expect("time"));
        assert!(range.to >= before);
        assert!(range.to >= range.from);
    }

    #[test]
    fn to_without_from_rejected() {
        let mut a = args("staging");
        a.to = Some("2024-02-01T00:00:00Z".to_string());
        assert!(matches!(a.to_config(), Err(StageQueryError::Config(_))));
    }

    #[test]
    fn bad_timestamp_rejected() {
        let mut a = args("staging");
        a.from = Some("yesterday".to_string());
        assert!(matches!(a.to_config(), Err(StageQueryError::Config(_))));
    }

    #[test]
    fn bad_direction_rejected() {
        let mut a = args("staging");
        a.order = Some("end_event_timestamp:up".to_string());
        assert!(matches!(
            a.to_config(),
            Err(StageQueryError::InvalidOrderSpec(_))
        ));
    }

    #[test]
    #[allow(clippy::panic)]
    fn cli_parses_build() {
        let cli = Cli::try_parse_from([
            "cycletrace",
            "--json-mode",
            "build",
            "--stage",
            "staging",
            "--order",
            "item_id:desc",
        ])
        .expect("parse");

        assert!(cli.json_mode);
        match cli.command {
            Some(Commands::Build { query }) => {
                assert_eq!(query.stage, "staging");
                assert_eq!(query.order.as_deref(), Some("item_id:desc"));
            }
            other => panic!("expected build, got {:?}", other),
        }
    }
}
