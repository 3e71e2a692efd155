//! Migration Report - Machine-readable record of a run
//!
//! Every pass reports problems as data instead of aborting: fatal
//! violations block the commit, warnings never do. The report collects
//! both alongside the planned moves, persistence substitutions and any
//! dependency cycles, and serializes to a stable JSON document. Two runs
//! over the same input produce byte-identical reports, so the report
//! carries no timestamps or host-specific fields.

use crate::contract::PersistenceOp;
use crate::scope::Feature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion status of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    /// All invariants held and the output tree was committed
    Success,
    /// At least one fatal violation; nothing was written
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fatal finding. Any violation fails the run and blocks the commit,
/// but passes keep going so one report carries every problem at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Violation {
    /// Two source files mapped to the same destination (extension ignored)
    PlanConflict {
        dest: String,
        first: String,
        second: String,
    },
    /// A file owned by one feature imports a file owned by another
    CrossFeatureImport {
        from: String,
        from_feature: Feature,
        to: String,
        to_feature: Feature,
    },
    /// A persistence call with no matching contract entry
    UnmappedPersistenceCall {
        file: String,
        op: PersistenceOp,
        resource: String,
    },
    /// A feature folder still references the local persistence interface
    ResidualPersistence { file: String, interface: String },
    /// A feature folder contains no page component
    MissingPage { feature: Feature },
}

impl Violation {
    /// Short stable tag for grouping in tables and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Violation::PlanConflict { .. } => "plan-conflict",
            Violation::CrossFeatureImport { .. } => "cross-feature-import",
            Violation::UnmappedPersistenceCall { .. } => "unmapped-persistence-call",
            Violation::ResidualPersistence { .. } => "residual-persistence",
            Violation::MissingPage { .. } => "missing-page",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::PlanConflict { dest, first, second } => {
                write!(f, "{} and {} both map to {}", first, second, dest)
            }
            Violation::CrossFeatureImport {
                from,
                from_feature,
                to,
                to_feature,
            } => {
                write!(
                    f,
                    "{} (owned by {}) imports {} (owned by {})",
                    from, from_feature, to, to_feature
                )
            }
            Violation::UnmappedPersistenceCall { file, op, resource } => {
                write!(f, "no contract entry for {} '{}' in {}", op, resource, file)
            }
            Violation::ResidualPersistence { file, interface } => {
                write!(f, "{} still references {}", file, interface)
            }
            Violation::MissingPage { feature } => {
                write!(f, "feature '{}' has no page in its folder", feature)
            }
        }
    }
}

/// Advisory finding. Warnings surface in the report and logs but never
/// block the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    /// A file could not be read or scanned; it is skipped, not fatal
    ParseError { path: String, reason: String },
    /// A file reachable from no feature entry point; excluded from output
    DeadCode { path: String },
    /// An import crossing into an excluded folder; left untouched
    ExcludedBoundary { from: String, specifier: String },
    /// A relative or alias import that resolved to no indexed file
    UnresolvedImport { from: String, specifier: String },
    /// A persistence call on an excluded resource; left untouched
    UntouchedPersistenceCall { file: String, resource: String },
    /// A shared file no feature references after rewriting
    OrphanShared { path: String },
}

impl Warning {
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::ParseError { .. } => "parse-error",
            Warning::DeadCode { .. } => "dead-code",
            Warning::ExcludedBoundary { .. } => "excluded-boundary",
            Warning::UnresolvedImport { .. } => "unresolved-import",
            Warning::UntouchedPersistenceCall { .. } => "untouched-persistence-call",
            Warning::OrphanShared { .. } => "orphan-shared",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ParseError { path, reason } => {
                write!(f, "could not scan {}: {}", path, reason)
            }
            Warning::DeadCode { path } => {
                write!(f, "{} is reachable from no feature entry point", path)
            }
            Warning::ExcludedBoundary { from, specifier } => {
                write!(f, "{} imports '{}' across an excluded boundary", from, specifier)
            }
            Warning::UnresolvedImport { from, specifier } => {
                write!(f, "'{}' in {} resolved to no file", specifier, from)
            }
            Warning::UntouchedPersistenceCall { file, resource } => {
                write!(f, "excluded resource '{}' left untouched in {}", resource, file)
            }
            Warning::OrphanShared { path } => {
                write!(f, "{} is shared but referenced by no feature after rewriting", path)
            }
        }
    }
}

/// Accumulator threaded through the passes
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violation(&mut self, v: Violation) {
        self.violations.push(v);
    }

    pub fn warning(&mut self, w: Warning) {
        self.warnings.push(w);
    }

    /// Fold another accumulator into this one, preserving order
    pub fn absorb(&mut self, other: Diagnostics) {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
    }

    /// True when at least one fatal violation was recorded
    pub fn is_fatal(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// One file relocation: source path to planned destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMove {
    pub from: String,
    pub to: String,
}

/// Per-feature slice of the plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTally {
    pub feature: Feature,
    /// Entry-point file path relative to the scanned root
    pub entry: String,
    /// Files owned by this feature, sorted by source path
    pub moved: Vec<FileMove>,
}

/// One persistence call replaced by its contract endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    pub file: String,
    pub op: PersistenceOp,
    pub resource: String,
    /// Endpoint the call now targets, e.g. `GET /api/v1/workflows`
    pub endpoint: String,
}

/// Full machine-readable outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub status: RunStatus,
    /// Per-feature moves, sorted by feature name
    pub features: Vec<FeatureTally>,
    /// Shared files, sorted by source path
    pub shared: Vec<FileMove>,
    /// Dependency cycles kept intact, each sorted by member path
    pub cycles: Vec<Vec<String>>,
    /// Persistence substitutions, sorted by file then span order
    pub substitutions: Vec<SubstitutionRecord>,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

impl MigrationReport {
    /// Total number of files with a planned destination
    pub fn planned_count(&self) -> usize {
        self.features.iter().map(|t| t.moved.len()).sum::<usize>() + self.shared.len()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
