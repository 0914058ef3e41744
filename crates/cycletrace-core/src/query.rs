//! # Query Module
//!
//! The declarative event query handed to an executor.
//!
//! - Produced only by [`crate::StageEventQueryBuilder`]
//! - Immutable once built; carries no connection or handle
//! - Always has exactly one order clause

use crate::{OrderSpec, Predicate, StageDefinition, TimeRange};
use serde::Serialize;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

/// A fully specified description of which stage events to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventQuery {
    stage: StageDefinition,
    filters: BTreeSet<Predicate>,
    order: OrderSpec,
    time_range: Option<TimeRange>,
    limit: Option<NonZeroUsize>,
    projection: Option<BTreeSet<String>>,
}

impl EventQuery {
    pub(crate) fn new(
        stage: StageDefinition,
        filters: BTreeSet<Predicate>,
        order: OrderSpec,
        time_range: Option<TimeRange>,
        limit: Option<NonZeroUsize>,
        projection: Option<BTreeSet<String>>,
    ) -> Self {
        Self {
            stage,
            filters,
            order,
            time_range,
            limit,
            projection,
        }
    }

    /// The stage this query covers.
    #[must_use]
    pub fn stage(&self) -> &StageDefinition {
        &self.stage
    }

    /// Stage filters, policy filters and caller filters combined.
    #[must_use]
    pub fn filters(&self) -> &BTreeSet<Predicate> {
        &self.filters
    }

    /// The order rows must come back in. Never absent.
    #[must_use]
    pub fn order(&self) -> &OrderSpec {
        &self.order
    }

    #[must_use]
    pub fn time_range(&self) -> Option<&TimeRange> {
        self.time_range.as_ref()
    }

    #[must_use]
    pub fn limit(&self) -> Option<NonZeroUsize> {
        self.limit
    }

    /// Fields to return; `None` returns all of them.
    #[must_use]
    pub fn projection(&self) -> Option<&BTreeSet<String>> {
        self.projection.as_ref()
    }
}

// =============================================================================
// TESTS
// =============================================================================
