//! # Stage Catalog
//!
//! Supplies validated stage definitions by name, each paired with the policy
//! that governs its queries.
//!
//! ## Built-in Stages
//!
//! | Stage | Start event | End event | Policy |
//! |-------|-------------|-----------|--------|
//! | issue | issue_created | issue_first_associated_with_milestone | default |
//! | plan | issue_first_associated_with_milestone | issue_first_mentioned_in_commit | default |
//! | code | issue_first_mentioned_in_commit | merge_request_created | default |
//! | test | merge_request_first_build_started | merge_request_first_build_finished | build |
//! | review | merge_request_created | merge_request_merged | default |
//! | staging | merge_request_merged | deployed_to_staging | default |
//! | production | issue_created | deployed_to_production | default |

use crate::policy::{BuildPolicy, DefaultPolicy, StagePolicy};
use crate::{EventKind, StageDefinition, StageEventQueryBuilder, StageQueryError};
use std::sync::Arc;

/// A catalog entry: the stage and the policy selected for it.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub stage: StageDefinition,
    pub policy: Arc<dyn StagePolicy>,
}

impl CatalogEntry {
    /// A builder wired to this entry's policy.
    #[must_use]
    pub fn builder(&self) -> StageEventQueryBuilder {
        StageEventQueryBuilder::new(Arc::clone(&self.policy))
    }
}

/// Ordered collection of stages, looked up by name.
///
/// Lookups are exact and case-sensitive. Registration order is kept for
/// listings.
#[derive(Debug, Clone, Default)]
pub struct StageCatalog {
    entries: Vec<CatalogEntry>,
}

impl StageCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in cycle analytics stages.
    pub fn builtin() -> Result<Self, StageQueryError> {
        let default: Arc<dyn StagePolicy> = Arc::new(DefaultPolicy::new());
        let build: Arc<dyn StagePolicy> = Arc::new(BuildPolicy::new());

        let stages = [
            (
                "issue",
                EventKind::IssueCreated,
                EventKind::IssueFirstAssociatedWithMilestone,
                &default,
            ),
            (
                "plan",
                EventKind::IssueFirstAssociatedWithMilestone,
                EventKind::IssueFirstMentionedInCommit,
                &default,
            ),
            (
                "code",
                EventKind::IssueFirstMentionedInCommit,
                EventKind::MergeRequestCreated,
                &default,
            ),
            (
                "test",
                EventKind::MergeRequestFirstBuildStarted,
                EventKind::MergeRequestFirstBuildFinished,
                &build,
            ),
            (
                "review",
                EventKind::MergeRequestCreated,
                EventKind::MergeRequestMerged,
                &default,
            ),
            (
                "staging",
                EventKind::MergeRequestMerged,
                EventKind::DeployedToStaging,
                &default,
            ),
            (
                "production",
                EventKind::IssueCreated,
                EventKind::DeployedToProduction,
                &default,
            ),
        ];

        let mut catalog = Self::new();
        for (name, start, end, policy) in stages {
            catalog.register(StageDefinition::new(name, start, end)?, Arc::clone(policy));
        }
        Ok(catalog)
    }

    /// Add a stage, replacing any stage with the same name in place.
    pub fn register(&mut self, stage: StageDefinition, policy: Arc<dyn StagePolicy>) {
        let entry = CatalogEntry { stage, policy };
        match self
            .entries
            .iter_mut()
            .find(|e| e.stage.name() == entry.stage.name())
        {
            Some(existing) => {
                tracing::debug!(stage = entry.stage.name(), "replacing catalog stage");
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Look up a stage by name, trimmed like registered names are.
    ///
    /// Returns `StageQueryError::UnknownStage` if no stage has this name.
    pub fn lookup(&self, name: &str) -> Result<&CatalogEntry, StageQueryError> {
        let trimmed = name.trim();
        self.entries
            .iter()
            .find(|e| e.stage.name() == trimmed)
            .ok_or_else(|| StageQueryError::UnknownStage(name.to_string()))
    }

    /// Look up a stage and a builder wired to its policy.
    pub fn builder_for(
        &self,
        name: &str,
    ) -> Result<(StageDefinition, StageEventQueryBuilder), StageQueryError> {
        let entry = self.lookup(name)?;
        Ok((entry.stage.clone(), entry.builder()))
    }

    /// Stage names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.stage.name()).collect()
    }

    /// All entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
