//! # Stage Policies
//!
//! Per-stage-kind configuration that takes part in the shared defaulting
//! contract of [`crate::StageEventQueryBuilder`].
//!
//! A policy answers three questions for the builder:
//! 1. Which order applies when the caller gives none?
//! 2. Which filters must every query for this stage carry?
//! 3. Which fields may a caller order by?
//!
//! The builder never looks at a stage's name. A new stage kind with special
//! needs gets a new policy, selected by the catalog.

use crate::primitives::{BASE_FIELDS, DEFAULT_ORDER_FIELD};
use crate::{OrderSpec, Predicate, StageQueryError};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Id of the CI build attached to a merge request.
pub const BUILD_ID_FIELD: &str = "build_id";

/// Creation time of that build.
pub const BUILD_CREATED_AT_FIELD: &str = "build_created_at";

// =============================================================================
// POLICY TRAIT
// =============================================================================

/// Stage-specific defaults for query construction.
///
/// Implementations must be deterministic: the same policy returns the same
/// answers on every call. Policies are shared across threads.
pub trait StagePolicy: Send + Sync + fmt::Debug {
    /// Short identifier, used in listings and logs.
    fn name(&self) -> &'static str;

    /// Order applied when the caller does not supply one.
    fn default_order(&self) -> OrderSpec;

    /// Filters added to every query for stages using this policy.
    fn mandatory_filters(&self) -> BTreeSet<Predicate> {
        BTreeSet::new()
    }

    /// Fields rows expose for this stage, and hence the valid order fields.
    fn known_fields(&self) -> Vec<&'static str> {
        BASE_FIELDS.to_vec()
    }

    /// Check whether `field` is one of [`StagePolicy::known_fields`].
    fn is_known_field(&self, field: &str) -> bool {
        self.known_fields().contains(&field)
    }
}

/// Reject an order whose field the policy does not know.
pub(crate) fn check_order(
    policy: &dyn StagePolicy,
    order: &OrderSpec,
) -> Result<(), StageQueryError> {
    if !policy.is_known_field(&order.field) {
        return Err(StageQueryError::InvalidOrderSpec(format!(
            "unknown field '{}' for policy '{}'",
            order.field,
            policy.name()
        )));
    }
    Ok(())
}

// =============================================================================
// DEFAULT POLICY
// =============================================================================

/// Policy shared by every stage without special needs.
///
/// Default order: ascending by `end_event_timestamp`. No mandatory filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultPolicy {
    order: OrderSpec,
}

impl DefaultPolicy {
    /// The documented default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: OrderSpec::ascending(DEFAULT_ORDER_FIELD),
        }
    }

    /// Same policy with another default order.
    ///
    /// Returns `StageQueryError::InvalidOrderSpec` if the field is unknown.
    pub fn with_order(order: OrderSpec) -> Result<Self, StageQueryError> {
        let policy = Self { order };
        check_order(&policy, &policy.order)?;
        Ok(policy)
    }
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl StagePolicy for DefaultPolicy {
    fn name(&self) -> &'static str {
        "default"
    }

    fn default_order(&self) -> OrderSpec {
        self.order.clone()
    }
}

// =============================================================================
// BUILD POLICY
// =============================================================================

/// Policy for stages measured on CI builds.
///
/// Only merge requests with a build take part, and rows are ordered by the
/// build's creation time unless the caller says otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPolicy {
    order: OrderSpec,
}

impl BuildPolicy {
    /// Ascending by `build_created_at`, requiring a `build_id`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: OrderSpec::ascending(BUILD_CREATED_AT_FIELD),
        }
    }

    /// Same policy with another default order.
    ///
    /// The field may be a base field or one of the build fields. Returns
    /// `StageQueryError::InvalidOrderSpec` otherwise.
    pub fn with_order(order: OrderSpec) -> Result<Self, StageQueryError> {
        let policy = Self { order };
        check_order(&policy, &policy.order)?;
        Ok(policy)
    }
}

impl Default for BuildPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl StagePolicy for BuildPolicy {
    fn name(&self) -> &'static str {
        "build"
    }

    fn default_order(&self) -> OrderSpec {
        self.order.clone()
    }

    fn mandatory_filters(&self) -> BTreeSet<Predicate> {
        [Predicate::exists(BUILD_ID_FIELD)].into_iter().collect()
    }

    fn known_fields(&self) -> Vec<&'static str> {
        let mut fields = BASE_FIELDS.to_vec();
        fields.extend([BUILD_ID_FIELD, BUILD_CREATED_AT_FIELD]);
        fields
    }
}

// =============================================================================
// POLICY KIND (catalog selection)
// =============================================================================

/// Named policy, as selected in a catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Default,
    Build,
}

impl PolicyKind {
    /// Instantiate the policy, optionally with a configured default order.
    pub fn instantiate(
        self,
        default_order: Option<OrderSpec>,
    ) -> Result<Arc<dyn StagePolicy>, StageQueryError> {
        let policy: Arc<dyn StagePolicy> = match (self, default_order) {
            (PolicyKind::Default, None) => Arc::new(DefaultPolicy::new()),
            (PolicyKind::Default, Some(order)) => Arc::new(DefaultPolicy::with_order(order)?),
            (PolicyKind::Build, None) => Arc::new(BuildPolicy::new()),
            (PolicyKind::Build, Some(order)) => Arc::new(BuildPolicy::with_order(order)?),
        };
        Ok(policy)
    }
}

impl FromStr for PolicyKind {
    type Err = StageQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(PolicyKind::Default),
            "build" => Ok(PolicyKind::Build),
            other => Err(StageQueryError::Config(format!("unknown policy '{}'", other))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
