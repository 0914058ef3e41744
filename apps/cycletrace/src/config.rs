//! # Catalog Configuration
//!
//! Loads extra or replacement stages from a TOML file and layers them on top
//! of the built-in catalog.
//!
//! ```toml
//! [[stages]]
//! name = "staging"
//! start_event = "merge_request_merged"
//! end_event = "deployed_to_staging"
//! labels = ["backend"]
//! default_order = "end_event_timestamp:desc"
//! policy = "default"
//! ```

use cycletrace_core::{OrderSpec, PolicyKind, StageCatalog, StageDefinitionSpec, StageQueryError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a catalog file (1 MB).
pub const MAX_CATALOG_FILE_SIZE: u64 = 1024 * 1024;

/// Maximum size of an event log file (100 MB).
pub const MAX_EVENT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Canonicalize `path`, check it is a regular file no larger than
/// `max_size`, and read it.
pub fn read_bounded(path: &Path, max_size: u64) -> Result<Vec<u8>, StageQueryError> {
    let canonical: PathBuf = path.canonicalize().map_err(|e| {
        StageQueryError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(StageQueryError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| StageQueryError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(StageQueryError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }

    std::fs::read(&canonical).map_err(|e| StageQueryError::Io(format!("Read file: {}", e)))
}

// =============================================================================
// CATALOG FILE
// =============================================================================

/// Parsed catalog file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// One `[[stages]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    #[serde(flatten)]
    pub definition: StageDefinitionSpec,
    /// `field[:direction]`, replacing the policy's default order.
    #[serde(default)]
    pub default_order: Option<String>,
    /// `default` or `build`.
    #[serde(default)]
    pub policy: Option<String>,
}

impl CatalogConfig {
    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, StageQueryError> {
        toml::from_str(text).map_err(|e| StageQueryError::Config(e.to_string()))
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, StageQueryError> {
        let bytes = read_bounded(path, MAX_CATALOG_FILE_SIZE)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| StageQueryError::Config(format!("Catalog is not UTF-8: {}", e)))?;
        Self::from_toml_str(&text)
    }

    /// Register every configured stage in `catalog`.
    ///
    /// Stops at the first invalid stage; stages before it stay registered.
    pub fn apply(self, catalog: &mut StageCatalog) -> Result<(), StageQueryError> {
        for stage in self.stages {
            let kind = match stage.policy.as_deref() {
                Some(name) => name.parse::<PolicyKind>()?,
                None => PolicyKind::Default,
            };
            let order = stage
                .default_order
                .as_deref()
                .map(str::parse::<OrderSpec>)
                .transpose()?;
            let policy = kind.instantiate(order)?;
            let definition = stage.definition.into_definition()?;

            tracing::info!(
                stage = definition.name(),
                policy = policy.name(),
                "registering configured stage"
            );
            catalog.register(definition, policy);
        }
        Ok(())
    }
}

/// The built-in catalog, extended by `path` when given.
pub fn load_catalog(path: Option<&Path>) -> Result<StageCatalog, StageQueryError> {
    let mut catalog = StageCatalog::builtin()?;
    if let Some(path) = path {
        tracing::info!("Loading stage catalog from {:?}", path);
        CatalogConfig::load(path)?.apply(&mut catalog)?;
    }
    Ok(catalog)
}
