//! # Stage Event Query Builder
//!
//! Merges a [`StageDefinition`] with optional caller overrides into an
//! [`EventQuery`], applying the default query configuration contract:
//!
//! | Option | Caller sets it | Caller leaves it out |
//! |--------|----------------|----------------------|
//! | filters | stage ∪ policy ∪ caller | stage ∪ policy |
//! | order | caller's, validated | policy default |
//! | time range | caller's, validated | unbounded |
//! | limit | caller's | unbounded |
//! | projection | caller's | all fields |
//!
//! Defaulting applies to ABSENT options only. An explicit option that is
//! invalid is an error, never replaced by the default.

use crate::policy::{DefaultPolicy, StagePolicy, check_order};
use crate::{EventQuery, QueryConfig, StageDefinition, StageQueryError};
use std::sync::Arc;

/// Builds event queries for stages governed by one [`StagePolicy`].
///
/// Stateless: each `build` call depends only on its inputs, so a builder can
/// be shared between threads freely.
#[derive(Debug, Clone)]
pub struct StageEventQueryBuilder {
    policy: Arc<dyn StagePolicy>,
}

impl StageEventQueryBuilder {
    /// Create a builder using the given policy.
    #[must_use]
    pub fn new(policy: Arc<dyn StagePolicy>) -> Self {
        Self { policy }
    }

    /// The policy this builder applies.
    #[must_use]
    pub fn policy(&self) -> &dyn StagePolicy {
        self.policy.as_ref()
    }

    /// Build the query for `stage`.
    ///
    /// # Errors
    ///
    /// - `InvalidOrderSpec` if `config.order` names a field the policy does not know
    /// - `InvalidTimeRange` if `config.time_range` ends before it starts
    pub fn build(
        &self,
        stage: &StageDefinition,
        config: Option<&QueryConfig>,
    ) -> Result<EventQuery, StageQueryError> {
        let empty = QueryConfig::default();
        let config = config.unwrap_or(&empty);

        let order = match &config.order {
            Some(order) => {
                check_order(self.policy.as_ref(), order)?;
                order.clone()
            }
            None => self.policy.default_order(),
        };

        if let Some(range) = &config.time_range {
            range.validate()?;
        }

        let mut filters = stage.filters().clone();
        filters.extend(self.policy.mandatory_filters());
        filters.extend(config.filters.iter().cloned());

        tracing::debug!(
            stage = stage.name(),
            policy = self.policy.name(),
            order = %order,
            defaulted = config.order.is_none(),
            "built stage event query"
        );

        Ok(EventQuery::new(
            stage.clone(),
            filters,
            order,
            config.time_range,
            config.limit,
            config.projection.clone(),
        ))
    }
}

impl Default for StageEventQueryBuilder {
    fn default() -> Self {
        Self::new(Arc::new(DefaultPolicy::new()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{BUILD_CREATED_AT_FIELD, BUILD_ID_FIELD, BuildPolicy};
    use crate::primitives::END_EVENT_TIMESTAMP_FIELD;
    use crate::{EventKind, OrderSpec, Predicate, TimeRange};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use std::num::NonZeroUsize;

    fn staging() -> StageDefinition {
        StageDefinition::new(
            "staging",
            EventKind::MergeRequestCreated,
            EventKind::DeployedToStaging,
        )
        .expect("stage")
    }

    #[test]
    fn absent_config_uses_default_order() {
        let q = StageEventQueryBuilder::default()
            .build(&staging(), None)
            .expect("build");

        assert_eq!(q.order(), &OrderSpec::ascending(END_EVENT_TIMESTAMP_FIELD));
        assert!(q.filters().is_empty());
        assert!(q.time_range().is_none());
        assert!(q.limit().is_none());
        assert!(q.projection().is_none());
    }

    #[test]
    fn empty_config_matches_absent_config() {
        let builder = StageEventQueryBuilder::default();
        let a = builder.build(&staging(), None).expect("build");
        let b = builder
            .build(&staging(), Some(&QueryConfig::new()))
            .expect("build");
        assert_eq!(a, b);
    }

    #[test]
    fn explicit_order_wins() {
        let config = QueryConfig::new().with_order(OrderSpec::descending(END_EVENT_TIMESTAMP_FIELD));
        let q = StageEventQueryBuilder::default()
            .build(&staging(), Some(&config))
            .expect("build");
        assert_eq!(q.order(), &OrderSpec::descending(END_EVENT_TIMESTAMP_FIELD));
    }

    #[test]
    fn unknown_order_field_rejected() {
        let config = QueryConfig::new().with_order(OrderSpec::ascending("nonexistent"));
        let result = StageEventQueryBuilder::default().build(&staging(), Some(&config));
        assert!(matches!(result, Err(StageQueryError::InvalidOrderSpec(_))));
    }

    #[test]
    fn unknown_order_field_error_matches_policy_check() {
        let order = OrderSpec::ascending("nonexistent");
        let config = QueryConfig::new().with_order(order.clone());
        let from_builder = StageEventQueryBuilder::default()
            .build(&staging(), Some(&config))
            .expect_err("unknown field");
        let from_policy = DefaultPolicy::with_order(order).expect_err("unknown field");
        assert_eq!(from_builder.to_string(), from_policy.to_string());
    }

    #[test]
    fn inverted_time_range_rejected() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("t1");
        let t2 = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).single().expect("t2");
        let config = QueryConfig::new().with_time_range(TimeRange::new(t2, t1));

        let result = StageEventQueryBuilder::default().build(&staging(), Some(&config));
        assert!(matches!(
            result,
            Err(StageQueryError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn options_pass_through() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("t1");
        let t2 = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).single().expect("t2");
        let limit = NonZeroUsize::new(20).expect("limit");
        let config = QueryConfig::new()
            .with_time_range(TimeRange::new(t1, t2))
            .with_limit(limit)
            .with_projection(["item_id", "end_event_timestamp"]);

        let q = StageEventQueryBuilder::default()
            .build(&staging(), Some(&config))
            .expect("build");

        assert_eq!(q.time_range(), Some(&TimeRange::new(t1, t2)));
        assert_eq!(q.limit(), Some(limit));
        assert_eq!(q.projection(), config.projection.as_ref());
    }

    #[test]
    fn filters_are_unioned() {
        let stage_filters: BTreeSet<_> = [Predicate::has_label("backend")].into_iter().collect();
        let stage = StageDefinition::with_filters(
            "test",
            EventKind::MergeRequestFirstBuildStarted,
            EventKind::MergeRequestFirstBuildFinished,
            stage_filters,
        )
        .expect("stage");
        let config = QueryConfig::new().with_filter(Predicate::equals("project", "gitlab"));

        let q = StageEventQueryBuilder::new(Arc::new(BuildPolicy::new()))
            .build(&stage, Some(&config))
            .expect("build");

        assert!(q.filters().contains(&Predicate::has_label("backend")));
        assert!(q.filters().contains(&Predicate::exists(BUILD_ID_FIELD)));
        assert!(q.filters().contains(&Predicate::equals("project", "gitlab")));
        assert_eq!(q.filters().len(), 3);
        assert_eq!(q.order(), &OrderSpec::ascending(BUILD_CREATED_AT_FIELD));
    }

    #[test]
    fn policy_fields_accepted_only_by_that_policy() {
        let stage = staging();
        let config = QueryConfig::new().with_order(OrderSpec::descending(BUILD_CREATED_AT_FIELD));

        assert!(
            StageEventQueryBuilder::new(Arc::new(BuildPolicy::new()))
                .build(&stage, Some(&config))
                .is_ok()
        );
        assert!(matches!(
            StageEventQueryBuilder::default().build(&stage, Some(&config)),
            Err(StageQueryError::InvalidOrderSpec(_))
        ));
    }
}
