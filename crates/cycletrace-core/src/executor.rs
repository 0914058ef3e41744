//! # Query Executor
//!
//! The contract between a built [`EventQuery`] and whatever runs it, plus an
//! in-memory reference executor.
//!
//! An executor must honor every part of the query:
//! - only items matching all filters
//! - only items whose start event lies in the time range
//! - rows in the query's order
//! - at most `limit` rows
//! - only projected fields
//!
//! The builder assumes this but does not check it.

use crate::primitives::{
    DURATION_SECONDS_FIELD, END_EVENT_TIMESTAMP_FIELD, ITEM_ID_FIELD, START_EVENT_TIMESTAMP_FIELD,
};
use crate::{Direction, Event, EventQuery, EventRecord, StageQueryError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Runs event queries against a data store.
pub trait QueryExecutor: Send + Sync {
    /// Fetch the rows described by `query`, in its order.
    fn execute(&self, query: &EventQuery) -> Result<Vec<Event>, StageQueryError>;
}

// =============================================================================
// MEMORY EXECUTOR
// =============================================================================

/// Executor over an in-memory event log.
///
/// For each item, the stage starts at the earliest event of the start kind
/// and ends at the earliest event of the end kind not before that start.
/// Items missing either event are not part of the stage.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    records: Vec<EventRecord>,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    /// Append a record to the log.
    pub fn push(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pair start and end events per item and apply range and filters.
    fn stage_rows(&self, query: &EventQuery) -> Vec<Event> {
        let (start_kind, end_kind) = query.stage().event_kinds();

        let mut by_item: BTreeMap<u64, Vec<&EventRecord>> = BTreeMap::new();
        for record in &self.records {
            by_item.entry(record.item_id).or_default().push(record);
        }

        let mut rows = Vec::new();
        for (item_id, records) in by_item {
            let Some(start) = records
                .iter()
                .copied()
                .filter(|r| r.kind == start_kind)
                .min_by_key(|r| r.timestamp)
            else {
                continue;
            };
            let Some(end) = records
                .iter()
                .copied()
                .filter(|r| r.kind == end_kind && r.timestamp >= start.timestamp)
                .min_by_key(|r| r.timestamp)
            else {
                continue;
            };

            if query
                .time_range()
                .is_some_and(|range| !range.contains(start.timestamp))
            {
                continue;
            }

            let mut labels = start.labels.clone();
            labels.extend(end.labels.iter().cloned());

            // Filters see the computed row fields as well as the attributes.
            let mut fields = start.attributes.clone();
            fields.extend(end.attributes.clone());
            fields.insert(ITEM_ID_FIELD.to_string(), item_id.to_string());
            fields.insert(
                START_EVENT_TIMESTAMP_FIELD.to_string(),
                start.timestamp.to_rfc3339(),
            );
            fields.insert(
                END_EVENT_TIMESTAMP_FIELD.to_string(),
                end.timestamp.to_rfc3339(),
            );
            fields.insert(
                DURATION_SECONDS_FIELD.to_string(),
                (end.timestamp - start.timestamp).num_seconds().to_string(),
            );

            if !query
                .filters()
                .iter()
                .all(|p| p.matches(&labels, &fields))
            {
                continue;
            }

            rows.push(Event {
                item_id,
                kind: end_kind,
                start_event_timestamp: start.timestamp,
                end_event_timestamp: end.timestamp,
                fields,
            });
        }
        rows
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute(&self, query: &EventQuery) -> Result<Vec<Event>, StageQueryError> {
        let order = query.order();

        let mut keyed = self
            .stage_rows(query)
            .into_iter()
            .map(|event| match sort_value(&event, &order.field) {
                Some(value) => Ok((value, event)),
                None => Err(StageQueryError::Execution(format!(
                    "item {} has no value for order field '{}'",
                    event.item_id, order.field
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        keyed.sort_by(|(va, a), (vb, b)| {
            let primary = match order.direction {
                Direction::Ascending => va.cmp(vb),
                Direction::Descending => vb.cmp(va),
            };
            primary.then_with(|| a.item_id.cmp(&b.item_id))
        });

        let limit = query.limit().map_or(usize::MAX, |n| n.get());
        let rows: Vec<Event> = keyed
            .into_iter()
            .take(limit)
            .map(|(_, mut event)| {
                if let Some(projection) = query.projection() {
                    event.fields.retain(|field, _| projection.contains(field));
                }
                event
            })
            .collect();

        tracing::debug!(
            stage = query.stage().name(),
            rows = rows.len(),
            "executed stage event query"
        );

        Ok(rows)
    }
}

// =============================================================================
// SORTING
// =============================================================================

/// Comparable value of an order field on one row.
///
/// Variant order decides between rows whose values parse differently:
/// numbers before timestamps before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Signed(i64),
    Unsigned(u64),
    Time(DateTime<Utc>),
    Text(String),
}

impl SortValue {
    /// Interpret a stored field value: RFC 3339 timestamp, integer, or text.
    fn parse(raw: &str) -> Self {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return SortValue::Time(ts.with_timezone(&Utc));
        }
        if let Ok(n) = raw.parse::<i64>() {
            return SortValue::Signed(n);
        }
        // Only values above i64::MAX land here.
        if let Ok(n) = raw.parse::<u64>() {
            return SortValue::Unsigned(n);
        }
        SortValue::Text(raw.to_string())
    }
}

fn sort_value(event: &Event, field: &str) -> Option<SortValue> {
    match field {
        ITEM_ID_FIELD => Some(SortValue::Unsigned(event.item_id)),
        START_EVENT_TIMESTAMP_FIELD => Some(SortValue::Time(event.start_event_timestamp)),
        END_EVENT_TIMESTAMP_FIELD => Some(SortValue::Time(event.end_event_timestamp)),
        DURATION_SECONDS_FIELD => Some(SortValue::Signed(
            (event.end_event_timestamp - event.start_event_timestamp).num_seconds(),
        )),
        other => event.fields.get(other).map(|raw| SortValue::parse(raw)),
    }
}

// =============================================================================
// TESTS
// =============================================================================
