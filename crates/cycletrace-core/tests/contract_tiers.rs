//! # Query Contract Tests (C0-C3)
//!
//! If ANY tier fails, built queries cannot be trusted by an executor.
//!
//! ## Tiers
//! - C0: Stage Integrity
//! - C1: Default Query Config
//! - C2: Explicit Overrides
//! - C3: Catalog To Rows

// Allow panic in tests - used to report an unexpected variant
#![allow(clippy::panic)]

use chrono::{DateTime, TimeZone, Utc};
use cycletrace_core::{
    Direction, EventKind, OrderSpec, QueryConfig, StageDefinition, StageEventQueryBuilder,
    StageQueryError, TimeRange,
};

fn staging() -> StageDefinition {
    StageDefinition::new(
        "staging",
        EventKind::MergeRequestCreated,
        EventKind::DeployedToStaging,
    )
    .expect("staging")
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0)
        .single()
        .expect("timestamp")
}

// =============================================================================
// TIER C0: STAGE INTEGRITY
// =============================================================================

mod c0_stage_integrity {
    use super::*;
    use cycletrace_core::StageDefinitionSpec;

    /// C0.1: A stage with distinct kinds is accepted.
    #[test]
    fn valid_stage_accepted() {
        let stage = staging();
        assert_eq!(stage.name(), "staging");
        assert_eq!(stage.start_event_kind(), EventKind::MergeRequestCreated);
        assert_eq!(stage.end_event_kind(), EventKind::DeployedToStaging);
    }

    /// C0.2: A stage that starts and ends on the same kind is rejected.
    #[test]
    fn identical_kinds_rejected() {
        let result = StageDefinition::new(
            "staging",
            EventKind::DeployedToStaging,
            EventKind::DeployedToStaging,
        );
        assert!(matches!(
            result,
            Err(StageQueryError::InvalidStageDefinition(_))
        ));
    }

    /// C0.3: A catalog entry missing its start kind is rejected.
    #[test]
    fn missing_kind_rejected() {
        let spec = StageDefinitionSpec {
            name: "staging".to_string(),
            start_event: None,
            end_event: Some("deployed_to_staging".to_string()),
            labels: Vec::new(),
        };
        assert!(matches!(
            spec.into_definition(),
            Err(StageQueryError::InvalidStageDefinition(_))
        ));
    }
}

// =============================================================================
// TIER C1: DEFAULT QUERY CONFIG
// =============================================================================

mod c1_default_query_config {
    use super::*;

    /// C1.1: The staging query has a default order.
    #[test]
    fn has_a_default_order() {
        let query = StageEventQueryBuilder::default()
            .build(&staging(), Some(&QueryConfig::new()))
            .expect("build");

        let order = query.order();
        assert_eq!(order.field, "end_event_timestamp");
        assert_eq!(order.direction, Direction::Ascending);
    }

    /// C1.2: Everything else is absent.
    #[test]
    fn other_options_absent() {
        let query = StageEventQueryBuilder::default()
            .build(&staging(), Some(&QueryConfig::new()))
            .expect("build");

        assert!(query.filters().is_empty());
        assert!(query.time_range().is_none());
        assert!(query.limit().is_none());
        assert!(query.projection().is_none());
    }
}

// =============================================================================
// TIER C2: EXPLICIT OVERRIDES
// =============================================================================

mod c2_explicit_overrides {
    use super::*;

    /// C2.1: A descending override is kept exactly.
    #[test]
    fn descending_override_kept() {
        let order = OrderSpec::descending("end_event_timestamp");
        let config = QueryConfig::new().with_order(order.clone());

        let query = StageEventQueryBuilder::default()
            .build(&staging(), Some(&config))
            .expect("build");
        assert_eq!(query.order(), &order);
    }

    /// C2.2: An unknown order field is an error, not a fallback.
    #[test]
    fn unknown_order_field_rejected() {
        let config = QueryConfig::new().with_order(OrderSpec::ascending("nonexistent"));

        let result = StageEventQueryBuilder::default().build(&staging(), Some(&config));
        assert!(matches!(result, Err(StageQueryError::InvalidOrderSpec(_))));
    }

    /// C2.3: An invalid direction in text form is an error.
    #[test]
    fn invalid_direction_rejected() {
        let result = "end_event_timestamp:upwards".parse::<OrderSpec>();
        assert!(matches!(result, Err(StageQueryError::InvalidOrderSpec(_))));
    }

    /// C2.4: A time range ending before it starts is rejected.
    #[test]
    fn inverted_time_range_rejected() {
        let config = QueryConfig::new().with_time_range(TimeRange::new(day(20), day(10)));

        let result = StageEventQueryBuilder::default().build(&staging(), Some(&config));
        match result {
            Err(StageQueryError::InvalidTimeRange { from, to }) => {
                assert_eq!(from, day(20));
                assert_eq!(to, day(10));
            }
            other => panic!("expected InvalidTimeRange, got {:?}", other),
        }
    }
}

// =============================================================================
// TIER C3: CATALOG TO ROWS
// =============================================================================

mod c3_catalog_to_rows {
    use super::*;
    use cycletrace_core::{EventRecord, MemoryExecutor, QueryExecutor, StageCatalog};

    /// C3.1: Unknown stages fail before any build.
    #[test]
    fn unknown_stage_rejected() {
        let catalog = StageCatalog::builtin().expect("catalog");
        assert!(matches!(
            catalog.builder_for("canary"),
            Err(StageQueryError::UnknownStage(_))
        ));
    }

    /// C3.2: A catalog stage runs end to end in default order.
    #[test]
    fn staging_rows_in_default_order() {
        let catalog = StageCatalog::builtin().expect("catalog");
        let (stage, builder) = catalog.builder_for("staging").expect("staging");
        let query = builder.build(&stage, None).expect("build");

        let executor = MemoryExecutor::new(vec![
            EventRecord::new(10, EventKind::MergeRequestMerged, day(1)),
            EventRecord::new(10, EventKind::DeployedToStaging, day(9)),
            EventRecord::new(11, EventKind::MergeRequestMerged, day(2)),
            EventRecord::new(11, EventKind::DeployedToStaging, day(5)),
        ]);

        let rows = executor.execute(&query).expect("execute");
        let ids: Vec<u64> = rows.iter().map(|e| e.item_id).collect();
        assert_eq!(ids, vec![11, 10]);
        assert_eq!(rows[0].timestamp(), day(5));
    }
}
