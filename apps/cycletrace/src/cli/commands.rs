//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::QueryArgs;
use crate::config::{MAX_EVENT_FILE_SIZE, read_bounded};
use cycletrace_core::{
    Event, EventQuery, EventRecord, MemoryExecutor, QueryExecutor, StageCatalog, StageQueryError,
};
use serde::Serialize;
use std::path::Path;

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StageQueryError> {
    serde_json::to_string_pretty(value).map_err(|e| StageQueryError::Serialization(e.to_string()))
}

// =============================================================================
// STAGES COMMAND
// =============================================================================

/// List the catalog's stages.
pub fn cmd_stages(catalog: &StageCatalog, json_mode: bool) -> Result<(), StageQueryError> {
    if json_mode {
        let output: Vec<serde_json::Value> = catalog
            .entries()
            .map(|entry| {
                serde_json::json!({
                    "name": entry.stage.name(),
                    "start_event": entry.stage.start_event_kind(),
                    "end_event": entry.stage.end_event_kind(),
                    "filters": entry.stage.filters(),
                    "policy": entry.policy.name(),
                    "default_order": entry.policy.default_order(),
                })
            })
            .collect();
        println!("{}", to_pretty_json(&output)?);
        return Ok(());
    }

    println!("cycletrace Stages");
    println!("=================");
    for entry in catalog.entries() {
        println!();
        println!("{}", entry.stage.name());
        println!("  Start:   {}", entry.stage.start_event_kind());
        println!("  End:     {}", entry.stage.end_event_kind());
        println!("  Policy:  {}", entry.policy.name());
        println!("  Order:   {}", entry.policy.default_order());
        if !entry.stage.filters().is_empty() {
            println!("  Filters: {}", entry.stage.filters().len());
        }
    }

    Ok(())
}

// =============================================================================
// BUILD COMMAND
// =============================================================================

/// Look up the stage and build its query from the CLI flags.
pub fn build_query(catalog: &StageCatalog, args: &QueryArgs) -> Result<EventQuery, StageQueryError> {
    let (stage, builder) = catalog.builder_for(&args.stage)?;
    let config = args.to_config()?;
    builder.build(&stage, Some(&config))
}

/// Build a query and print it.
pub fn cmd_build(
    catalog: &StageCatalog,
    args: &QueryArgs,
    json_mode: bool,
) -> Result<(), StageQueryError> {
    let query = build_query(catalog, args)?;

    if json_mode {
        println!("{}", to_pretty_json(&query)?);
        return Ok(());
    }

    println!("Event Query: {}", query.stage().name());
    println!("==============");
    println!(
        "Events:     {} -> {}",
        query.stage().start_event_kind(),
        query.stage().end_event_kind()
    );
    println!("Order:      {}", query.order());
    println!("Filters:    {}", query.filters().len());
    match query.time_range() {
        Some(range) => println!("Time Range: {} .. {}", range.from, range.to),
        None => println!("Time Range: unbounded"),
    }
    match query.limit() {
        Some(limit) => println!("Limit:      {}", limit),
        None => println!("Limit:      none"),
    }
    match query.projection() {
        Some(fields) => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            println!("Projection: {}", fields.join(", "));
        }
        None => println!("Projection: all fields"),
    }

    Ok(())
}

// =============================================================================
// FETCH COMMAND
// =============================================================================

/// Read a JSON array of event records.
pub fn load_events(path: &Path) -> Result<Vec<EventRecord>, StageQueryError> {
    tracing::info!("Loading events from {:?}", path);
    let bytes = read_bounded(path, MAX_EVENT_FILE_SIZE)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StageQueryError::Serialization(format!("Invalid event log: {}", e)))
}

/// Build the query and run it over the event log at `events`.
pub fn fetch_rows(
    catalog: &StageCatalog,
    args: &QueryArgs,
    events: &Path,
) -> Result<Vec<Event>, StageQueryError> {
    let query = build_query(catalog, args)?;
    let executor = MemoryExecutor::new(load_events(events)?);
    executor.execute(&query)
}

/// Run a query and print the rows.
pub fn cmd_fetch(
    catalog: &StageCatalog,
    args: &QueryArgs,
    events: &Path,
    json_mode: bool,
) -> Result<(), StageQueryError> {
    let rows = fetch_rows(catalog, args, events)?;

    if json_mode {
        println!("{}", to_pretty_json(&rows)?);
        return Ok(());
    }

    println!("Stage '{}': {} rows", args.stage, rows.len());
    for row in &rows {
        let fields: Vec<String> = row
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("  {}", fields.join(" "));
    }

    Ok(())
}
