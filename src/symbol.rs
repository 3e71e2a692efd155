//! Symbol types for the migration domain
//!
//! Every exported declaration in the client codebase maps to one of seven
//! migration kinds. The kind decides which folder bucket a file lands in
//! after the move:
//! - `Page`: route-level screen component, the reachability roots
//! - `Component`: presentational or container component
//! - `Hook`: reusable stateful hook
//! - `Context`: context object or provider
//! - `Type`: type/interface declaration
//! - `Util`: plain helper
//! - `ApiCall`: remote-call wrapper function

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Migration symbol kinds.
///
/// The classifier and planner never look at declaration syntax; they operate
/// on these kinds only, so the scanner is the single place that knows how a
/// declaration maps into the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    /// Route-level screen component (entry points are pages)
    Page,
    /// Context object / provider
    Context,
    /// Reusable hook (`useXyz`)
    Hook,
    /// Presentational or container component
    Component,
    /// Remote-call wrapper function
    ApiCall,
    /// Type or interface declaration
    Type,
    /// Plain helper
    Util,
}

impl SymbolKind {
    /// Stable lowercase name, also used in config bucket tables
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Page => "page",
            SymbolKind::Context => "context",
            SymbolKind::Hook => "hook",
            SymbolKind::Component => "component",
            SymbolKind::ApiCall => "api-call",
            SymbolKind::Type => "type",
            SymbolKind::Util => "util",
        }
    }

    /// All symbol kinds, in bucket precedence order.
    ///
    /// When a file exports several kinds, the earliest kind in this list
    /// decides the file's layout bucket. A page file stays a page file even
    /// when it also exports its props type.
    pub fn all() -> &'static [SymbolKind] {
        &[
            SymbolKind::Page,
            SymbolKind::Context,
            SymbolKind::Hook,
            SymbolKind::Component,
            SymbolKind::ApiCall,
            SymbolKind::Type,
            SymbolKind::Util,
        ]
    }

    /// Bucket precedence rank (lower wins) for file-kind selection
    pub fn precedence(&self) -> usize {
        SymbolKind::all()
            .iter()
            .position(|k| k == self)
            .unwrap_or(usize::MAX)
    }

    /// Infer the kind of an exported declaration from its name and shape.
    ///
    /// `is_type_decl` is true for `type`/`interface` declarations,
    /// `is_callable` for function or arrow-initialized declarations. The
    /// rules are ordered; the first match wins:
    /// 1. type/interface declaration -> `Type`
    /// 2. name ends with `Page` -> `Page`
    /// 3. name ends with `Context` or `Provider` -> `Context`
    /// 4. name is `useXyz` -> `Hook`
    /// 5. callable with a remote-verb prefix (`fetch`/`get`/`create`/
    ///    `update`/`delete`/`list`) -> `ApiCall`
    /// 6. PascalCase -> `Component`
    /// 7. anything else -> `Util`
    pub fn infer(name: &str, is_type_decl: bool, is_callable: bool) -> SymbolKind {
        if is_type_decl {
            return SymbolKind::Type;
        }
        if name.ends_with("Page") {
            return SymbolKind::Page;
        }
        if name.ends_with("Context") || name.ends_with("Provider") {
            return SymbolKind::Context;
        }
        if let Some(rest) = name.strip_prefix("use") {
            if rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                return SymbolKind::Hook;
            }
        }
        if is_callable {
            const REMOTE_VERBS: [&str; 6] = ["fetch", "get", "create", "update", "delete", "list"];
            for verb in REMOTE_VERBS {
                if let Some(rest) = name.strip_prefix(verb) {
                    if rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                        return SymbolKind::ApiCall;
                    }
                }
            }
        }
        // PascalCase, not SCREAMING_CASE: constants stay utils
        if name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && name.chars().any(|c| c.is_ascii_lowercase())
        {
            return SymbolKind::Component;
        }
        SymbolKind::Util
    }
}

impl FromStr for SymbolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "page" => Ok(SymbolKind::Page),
            "context" | "provider" => Ok(SymbolKind::Context),
            "hook" => Ok(SymbolKind::Hook),
            "component" => Ok(SymbolKind::Component),
            "api-call" | "api_call" | "api" => Ok(SymbolKind::ApiCall),
            "type" | "interface" => Ok(SymbolKind::Type),
            "util" | "helper" => Ok(SymbolKind::Util),
            _ => Err(Error::Config(format!("Unknown symbol kind: {}", s))),
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An exported symbol in the source index.
///
/// Every symbol has exactly one owning file; ownership never changes after
/// indexing. The qualified name is `<owner-path>#<name>` and is unique in a
/// well-formed tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Exported identifier (file-scoped name)
    pub name: String,
    /// Owning file path, relative to the scanned root
    pub owner: String,
    /// Migration kind
    pub kind: SymbolKind,
}

impl Symbol {
    /// Create a new symbol
    pub fn new(name: impl Into<String>, owner: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            kind,
        }
    }

    /// Qualified name: `<owner-path>#<name>`
    pub fn qualified(&self) -> String {
        format!("{}#{}", self.owner, self.name)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.owner == other.owner
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.owner.hash(state);
    }
}
