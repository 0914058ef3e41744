//! # Query Configuration
//!
//! Caller-supplied overrides for a stage event query.
//!
//! Every option is optional. An absent option is filled in by the builder:
//! - `order`: the stage policy's default
//! - `time_range`, `limit`, `projection`: unbounded
//! - `filters`: none beyond the stage's own

use crate::{OrderSpec, Predicate, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

/// Partial configuration for [`crate::StageEventQueryBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub order: Option<OrderSpec>,
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub limit: Option<NonZeroUsize>,
    #[serde(default)]
    pub projection: Option<BTreeSet<String>>,
    #[serde(default)]
    pub filters: BTreeSet<Predicate>,
}

impl QueryConfig {
    /// An empty configuration: everything defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: NonZeroUsize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.filters.insert(predicate);
        self
    }

    /// Check if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_none()
            && self.time_range.is_none()
            && self.limit.is_none()
            && self.projection.is_none()
            && self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(QueryConfig::new().is_empty());
    }

    #[test]
    fn builders_set_options() {
        let limit = NonZeroUsize::new(10).expect("non-zero");
        let config = QueryConfig::new()
            .with_order(OrderSpec::descending("item_id"))
            .with_limit(limit)
            .with_projection(["item_id"])
            .with_filter(Predicate::has_label("backend"));

        assert!(!config.is_empty());
        assert_eq!(config.order, Some(OrderSpec::descending("item_id")));
        assert_eq!(config.limit, Some(limit));
        assert_eq!(
            config.projection,
            Some(["item_id".to_string()].into_iter().collect())
        );
        assert_eq!(config.filters.len(), 1);
    }
}
