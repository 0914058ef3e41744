//! # Core Type Definitions
//!
//! This module contains the value types shared by the stage catalog, the
//! query builder and the executor contract:
//! - Event identifiers (`EventKind`)
//! - Ordering (`Direction`, `OrderSpec`)
//! - Bounds and filters (`TimeRange`, `Predicate`)
//! - Store records and result rows (`EventRecord`, `Event`)
//! - Error types (`StageQueryError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` where they appear in sets, so iteration order is stable
//! - Use `BTreeMap`/`BTreeSet` for collections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// EVENT KIND
// =============================================================================

/// Kind of a recorded workflow event.
///
/// A stage is bounded by two of these: the kind that opens it and the kind
/// that closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    IssueCreated,
    IssueFirstAssociatedWithMilestone,
    IssueFirstAddedToBoard,
    IssueFirstMentionedInCommit,
    MergeRequestCreated,
    MergeRequestFirstBuildStarted,
    MergeRequestFirstBuildFinished,
    MergeRequestMerged,
    DeployedToStaging,
    DeployedToProduction,
}

impl EventKind {
    /// Every kind, in workflow order.
    pub const ALL: [EventKind; 10] = [
        EventKind::IssueCreated,
        EventKind::IssueFirstAssociatedWithMilestone,
        EventKind::IssueFirstAddedToBoard,
        EventKind::IssueFirstMentionedInCommit,
        EventKind::MergeRequestCreated,
        EventKind::MergeRequestFirstBuildStarted,
        EventKind::MergeRequestFirstBuildFinished,
        EventKind::MergeRequestMerged,
        EventKind::DeployedToStaging,
        EventKind::DeployedToProduction,
    ];

    /// Stable snake_case identifier, identical to the serialized form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::IssueCreated => "issue_created",
            EventKind::IssueFirstAssociatedWithMilestone => "issue_first_associated_with_milestone",
            EventKind::IssueFirstAddedToBoard => "issue_first_added_to_board",
            EventKind::IssueFirstMentionedInCommit => "issue_first_mentioned_in_commit",
            EventKind::MergeRequestCreated => "merge_request_created",
            EventKind::MergeRequestFirstBuildStarted => "merge_request_first_build_started",
            EventKind::MergeRequestFirstBuildFinished => "merge_request_first_build_finished",
            EventKind::MergeRequestMerged => "merge_request_merged",
            EventKind::DeployedToStaging => "deployed_to_staging",
            EventKind::DeployedToProduction => "deployed_to_production",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = StageQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                StageQueryError::InvalidStageDefinition(format!("unknown event kind '{}'", s))
            })
    }
}

// =============================================================================
// ORDERING
// =============================================================================

/// Sort direction of an [`OrderSpec`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = StageQueryError;

    /// Accepts `asc`, `ascending`, `desc`, `descending` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(StageQueryError::InvalidOrderSpec(format!(
                "invalid direction '{}'",
                other
            ))),
        }
    }
}

/// A single ordering clause: one field, one direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Name of the field to order by.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderSpec {
    /// Create a new order clause.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Ascending order on `field`.
    #[must_use]
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Ascending)
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Descending)
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

impl FromStr for OrderSpec {
    type Err = StageQueryError;

    /// Parses `field` or `field:direction`. A bare field sorts ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field.trim(), direction.parse()?),
            None => (s.trim(), Direction::Ascending),
        };

        if field.is_empty() {
            return Err(StageQueryError::InvalidOrderSpec(format!(
                "missing field in '{}'",
                s
            )));
        }

        Ok(Self::new(field, direction))
    }
}

// =============================================================================
// TIME RANGE
// =============================================================================

/// Inclusive bounds on the start event timestamp.
///
/// Construction does not validate; the builder rejects `from > to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    #[must_use]
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Returns `StageQueryError::InvalidTimeRange` if `from` is after `to`.
    pub fn validate(&self) -> Result<(), StageQueryError> {
        if self.from > self.to {
            return Err(StageQueryError::InvalidTimeRange {
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }

    /// Check whether `ts` lies within the range, both ends included.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from <= ts && ts <= self.to
    }
}

// =============================================================================
// PREDICATE
// =============================================================================

/// A filter over the labels and attributes of a workflow item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// The item carries this label.
    HasLabel(String),
    /// The attribute `field` equals `value`.
    Equals { field: String, value: String },
    /// The attribute `field` is present.
    Exists(String),
}

impl Predicate {
    #[must_use]
    pub fn has_label(label: impl Into<String>) -> Self {
        Predicate::HasLabel(label.into())
    }

    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn exists(field: impl Into<String>) -> Self {
        Predicate::Exists(field.into())
    }

    /// Evaluate against an item's labels and attributes.
    #[must_use]
    pub fn matches(&self, labels: &BTreeSet<String>, attributes: &BTreeMap<String, String>) -> bool {
        match self {
            Predicate::HasLabel(label) => labels.contains(label),
            Predicate::Equals { field, value } => attributes.get(field) == Some(value),
            Predicate::Exists(field) => attributes.contains_key(field),
        }
    }
}

// =============================================================================
// EVENT RECORD (store entry)
// =============================================================================

/// A raw event as held by an event store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The workflow item this event happened to.
    pub item_id: u64,
    /// What happened.
    pub kind: EventKind,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl EventRecord {
    /// Create a record with no labels or attributes.
    #[must_use]
    pub fn new(item_id: u64, kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id,
            kind,
            timestamp,
            labels: BTreeSet::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }
}

// =============================================================================
// EVENT (result row)
// =============================================================================

/// One row returned by a query executor: a workflow item that went through
/// the stage, stamped with the events that delimit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub item_id: u64,
    /// Kind of the closing event.
    pub kind: EventKind,
    pub start_event_timestamp: DateTime<Utc>,
    pub end_event_timestamp: DateTime<Utc>,
    /// Projected fields, keyed by field name.
    pub fields: BTreeMap<String, String>,
}

impl Event {
    /// The timestamp that completes the stage.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.end_event_timestamp
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while defining stages or building and running
/// event queries.
///
/// - No silent failures: invalid input is never replaced by a default
/// - Every variant is a caller-correctable input error at this layer
#[derive(Debug, Error)]
pub enum StageQueryError {
    /// A stage could not bound a duration (empty name, missing or identical kinds).
    #[error("Invalid stage definition: {0}")]
    InvalidStageDefinition(String),

    /// An explicit order names an unknown field or an invalid direction.
    #[error("Invalid order spec: {0}")]
    InvalidOrderSpec(String),

    /// An explicit time range ends before it starts.
    #[error("Invalid time range: {from} is after {to}")]
    InvalidTimeRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// The catalog has no stage with this name.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// A query executor failed.
    #[error("Execution error: {0}")]
    Execution(String),

    /// A catalog configuration could not be applied.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
