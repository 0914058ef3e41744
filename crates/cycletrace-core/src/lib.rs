//! # cycletrace-core
//!
//! Stage event queries for cycle analytics - THE LOGIC.
//!
//! A cycle analytics stage (issue, plan, code, test, review, staging,
//! production) is the time between two workflow events. This crate turns a
//! stage plus optional caller overrides into a declarative [`EventQuery`]:
//! which items to fetch, how to filter them, and in which order.
//!
//! ## Default Query Configuration
//!
//! Every option the caller leaves out gets a deterministic default from the
//! stage's [`StagePolicy`]. In particular, every query has an order: the
//! caller's, or the policy default (ascending by `end_event_timestamp` for
//! [`DefaultPolicy`]).
//!
//! ## Architectural Constraints
//!
//! - Building a query is pure: no I/O, no shared state, no async
//! - Per-stage behavior is injected as a policy, never branched on by name
//! - Running a query belongs to a [`QueryExecutor`]

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod catalog;
pub mod config;
pub mod executor;
pub mod policy;
pub mod primitives;
pub mod query;
pub mod stage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Direction, Event, EventKind, EventRecord, OrderSpec, Predicate, StageQueryError, TimeRange,
};

// =============================================================================
// RE-EXPORTS: Stages and Queries
// =============================================================================

pub use builder::StageEventQueryBuilder;
pub use catalog::{CatalogEntry, StageCatalog};
pub use config::QueryConfig;
pub use policy::{BuildPolicy, DefaultPolicy, PolicyKind, StagePolicy};
pub use query::EventQuery;
pub use stage::{StageDefinition, StageDefinitionSpec};

// =============================================================================
// RE-EXPORTS: Execution
// =============================================================================

pub use executor::{MemoryExecutor, QueryExecutor};
