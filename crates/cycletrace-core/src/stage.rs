//! # Stage Definitions
//!
//! A stage is a named phase of a tracked workflow, bounded by the event that
//! opens it and the event that closes it.
//!
//! | Stage | Start event | End event |
//! |-------|-------------|-----------|
//! | issue | issue created | first associated with a milestone |
//! | staging | merge request merged | deployed to staging |
//! | ... | ... | ... |
//!
//! A [`StageDefinition`] is validated once at construction and never mutated.

use crate::primitives::MAX_STAGE_NAME_LENGTH;
use crate::{EventKind, Predicate, StageQueryError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// STAGE DEFINITION
// =============================================================================

/// Immutable description of a workflow stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDefinition {
    name: String,
    start_event_kind: EventKind,
    end_event_kind: EventKind,
    filters: BTreeSet<Predicate>,
}

impl StageDefinition {
    /// Create a stage with no filters.
    pub fn new(
        name: impl Into<String>,
        start_event_kind: EventKind,
        end_event_kind: EventKind,
    ) -> Result<Self, StageQueryError> {
        Self::with_filters(name, start_event_kind, end_event_kind, BTreeSet::new())
    }

    /// Create a stage that only covers items matching every filter.
    ///
    /// Fails with `StageQueryError::InvalidStageDefinition` if:
    /// - the name is empty or longer than `MAX_STAGE_NAME_LENGTH`
    /// - the start and end kinds are identical (no duration to bound)
    pub fn with_filters(
        name: impl Into<String>,
        start_event_kind: EventKind,
        end_event_kind: EventKind,
        filters: BTreeSet<Predicate>,
    ) -> Result<Self, StageQueryError> {
        let name = name.into().trim().to_string();

        if name.is_empty() {
            return Err(StageQueryError::InvalidStageDefinition(
                "stage name is empty".to_string(),
            ));
        }
        if name.len() > MAX_STAGE_NAME_LENGTH {
            return Err(StageQueryError::InvalidStageDefinition(format!(
                "stage name length {} exceeds maximum {}",
                name.len(),
                MAX_STAGE_NAME_LENGTH
            )));
        }
        if start_event_kind == end_event_kind {
            return Err(StageQueryError::InvalidStageDefinition(format!(
                "stage '{}' starts and ends on '{}'",
                name, start_event_kind
            )));
        }

        Ok(Self {
            name,
            start_event_kind,
            end_event_kind,
            filters,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn start_event_kind(&self) -> EventKind {
        self.start_event_kind
    }

    #[must_use]
    pub fn end_event_kind(&self) -> EventKind {
        self.end_event_kind
    }

    /// The `(start, end)` pair.
    #[must_use]
    pub fn event_kinds(&self) -> (EventKind, EventKind) {
        (self.start_event_kind, self.end_event_kind)
    }

    #[must_use]
    pub fn filters(&self) -> &BTreeSet<Predicate> {
        &self.filters
    }
}

// =============================================================================
// STAGE DEFINITION SPEC (external, string-typed)
// =============================================================================

/// Stage definition as written in a catalog file.
///
/// Event kinds are kept as strings so a missing or misspelled kind surfaces
/// as `InvalidStageDefinition` instead of a generic parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinitionSpec {
    pub name: String,
    #[serde(default)]
    pub start_event: Option<String>,
    #[serde(default)]
    pub end_event: Option<String>,
    /// Each label becomes a `Predicate::HasLabel` filter.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl StageDefinitionSpec {
    /// Validate and convert into a [`StageDefinition`].
    pub fn into_definition(self) -> Result<StageDefinition, StageQueryError> {
        let start = parse_kind(&self.name, "start_event", self.start_event.as_deref())?;
        let end = parse_kind(&self.name, "end_event", self.end_event.as_deref())?;
        let filters = self
            .labels
            .into_iter()
            .map(Predicate::HasLabel)
            .collect();

        StageDefinition::with_filters(self.name, start, end, filters)
    }
}

fn parse_kind(stage: &str, key: &str, raw: Option<&str>) -> Result<EventKind, StageQueryError> {
    let raw = raw.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
        StageQueryError::InvalidStageDefinition(format!("stage '{}' is missing {}", stage, key))
    })?;

    raw.parse().map_err(|_| {
        StageQueryError::InvalidStageDefinition(format!(
            "stage '{}' has unknown {} '{}'",
            stage, key, raw
        ))
    })
}

// =============================================================================
// TESTS
// =============================================================================
