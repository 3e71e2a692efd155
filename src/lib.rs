//! # Reslice - Feature-Slice Migration Engine
//!
//! Reorganizes a flat client codebase into a feature-sliced layout and
//! rebinds the local persistence layer to a remote API contract, while
//! keeping user-observable behavior unchanged.
//!
//! Reslice provides:
//! - A source index over files, exported symbols and declared imports
//! - A file-level usage graph with cycle condensation
//! - Entry-point reachability classification into Features or SHARED
//! - A deterministic target layout plan with collision detection
//! - Import specifier rewriting with cross-feature legality checks
//! - Persistence-call substitution bound to a typed API contract
//! - A pre-commit invariant validator and an all-or-nothing commit

pub mod symbol;
pub mod scope;
pub mod config;
pub mod contract;
pub mod index;
pub mod graph;
pub mod classify;
pub mod plan;
pub mod rewrite;
pub mod persist;
pub mod stage;
pub mod validate;
pub mod report;
pub mod engine;
pub mod ui;

// Re-exports for convenient access
pub use symbol::{Symbol, SymbolKind};
pub use scope::{Feature, MigrationScope};
pub use contract::{ApiContract, ApiContractEntry, PersistenceOp};
pub use index::{SourceFile, SourceIndex};
pub use graph::UsageGraph;
pub use classify::Classification;
pub use report::{MigrationReport, RunStatus};
pub use engine::{MigrationEngine, MigrationOutcome};

/// Result type alias for Reslice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Reslice operations.
///
/// These are infrastructure failures that abort a run outright. Migration
/// findings (plan conflicts, illegal imports, unmapped calls, ...) are
/// accumulated as [`report::Violation`]s and [`report::Warning`]s instead,
/// so a failing run still produces a complete diagnostic list.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid contract: {0}")]
    Contract(String),

    #[error("Staging error: {0}")]
    Stage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
