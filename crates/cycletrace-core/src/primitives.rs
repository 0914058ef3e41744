//! # Query Primitives
//!
//! Fixed field names and defaults shared by every stage.
//!
//! These constants are compiled into the binary and are immutable at runtime.
//! Stage policies may add fields of their own, but every stage understands
//! the fields listed here.

/// Identifier of the workflow item (issue or merge request) a row belongs to.
pub const ITEM_ID_FIELD: &str = "item_id";

/// Timestamp of the event that opens the stage.
pub const START_EVENT_TIMESTAMP_FIELD: &str = "start_event_timestamp";

/// Timestamp of the event that closes the stage.
pub const END_EVENT_TIMESTAMP_FIELD: &str = "end_event_timestamp";

/// Whole seconds between the start and end event.
pub const DURATION_SECONDS_FIELD: &str = "duration_seconds";

/// Fields every stage exposes, in canonical order.
pub const BASE_FIELDS: [&str; 4] = [
    ITEM_ID_FIELD,
    START_EVENT_TIMESTAMP_FIELD,
    END_EVENT_TIMESTAMP_FIELD,
    DURATION_SECONDS_FIELD,
];

/// Field the default policy orders by when the caller gives no order.
///
/// - Rows come back oldest stage completion first.
/// - Stages that need another default supply their own policy.
pub const DEFAULT_ORDER_FIELD: &str = END_EVENT_TIMESTAMP_FIELD;

/// Maximum length for a stage name.
pub const MAX_STAGE_NAME_LENGTH: usize = 64;
