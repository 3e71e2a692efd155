//! Migration scope - the immutable per-run configuration value
//!
//! The enumerated Feature set, entry points and exclusion boundaries are
//! explicit data threaded through every pass, never ambient state. A dry run
//! and a commit run can therefore use different scopes without interference.

use serde::{Deserialize, Serialize};

/// One enumerated feature in scope for migration.
///
/// Features are configuration data, not a compiled-in enum: the engine
/// supports any fixed set the scope enumerates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Feature(pub String);

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A feature paired with its designated entry-point file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub feature: Feature,
    /// Entry-point file path relative to the scanned root
    pub entry: String,
}

/// The immutable scope of one migration run.
///
/// Everything the passes need to know about what is IN and what is OUT:
/// the enumerated features with their entry points, the collaborator folders
/// that form reachability boundaries, and the resources owned by those
/// collaborators (their persistence calls are left untouched).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationScope {
    /// Enumerated in-scope features, in declaration order
    pub features: Vec<FeatureEntry>,
    /// Folder prefixes (relative to root) that are never touched; edges into
    /// them are boundaries, flagged and never followed
    pub excluded_folders: Vec<String>,
    /// Resource keys owned by excluded collaborators; persistence calls on
    /// these keys are left untouched and flagged
    pub excluded_resources: Vec<String>,
    /// Source file extensions in scope for indexing
    pub extensions: Vec<String>,
}

impl MigrationScope {
    /// Scope over the given features/entries with default extensions and no
    /// exclusions
    pub fn new(features: Vec<FeatureEntry>) -> Self {
        Self {
            features,
            excluded_folders: Vec::new(),
            excluded_resources: Vec::new(),
            extensions: Self::default_extensions(),
        }
    }

    pub fn default_extensions() -> Vec<String> {
        ["ts", "tsx", "js", "jsx"].iter().map(|s| s.to_string()).collect()
    }

    /// Whether a relative path lies inside an excluded collaborator folder
    pub fn is_excluded_path(&self, path: &str) -> bool {
        self.excluded_folders.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path == prefix || path.starts_with(&format!("{}/", prefix))
        })
    }

    /// Whether a resource key belongs to an excluded collaborator
    pub fn is_excluded_resource(&self, resource: &str) -> bool {
        self.excluded_resources.iter().any(|r| r == resource)
    }

    /// Whether a file extension is in scope
    pub fn matches_extension(&self, path: &str) -> bool {
        match path.rsplit_once('.') {
            Some((_, ext)) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}

impl Default for MigrationScope {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
