//! Specifier resolution against the index
//!
//! Resolves relative and alias specifiers the way the scanned tree's
//! bundler would: the stem itself, then each in-scope extension, then
//! `/index` with each extension, first hit wins. Package imports are
//! external, specifiers crossing into an excluded folder are boundaries
//! and never followed, and asset imports (an explicit extension outside
//! the scanned set) are left to the bundler.

use crate::index::SourceIndex;
use crate::scope::MigrationScope;

/// Where a specifier points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An indexed in-scope file
    Internal(String),
    /// A path inside an excluded collaborator folder
    Boundary(String),
    /// A package or asset import, out of migration scope
    External,
    /// A relative or alias specifier with no matching file
    Unresolved,
}

/// Resolves import specifiers relative to their importing file
pub struct SpecifierResolver<'a> {
    index: &'a SourceIndex,
    scope: &'a MigrationScope,
    alias: &'a str,
}

impl<'a> SpecifierResolver<'a> {
    pub fn new(index: &'a SourceIndex, scope: &'a MigrationScope, alias: &'a str) -> Self {
        Self { index, scope, alias }
    }

    pub fn resolve(&self, from: &str, specifier: &str) -> Resolution {
        let stem = if let Some(rest) = specifier.strip_prefix(self.alias) {
            normalize(rest)
        } else if specifier.starts_with("./") || specifier.starts_with("../") {
            normalize(&format!("{}/{}", parent_of(from), specifier))
        } else {
            return Resolution::External;
        };
        // `..` past the scanned root
        let Some(stem) = stem else {
            return Resolution::Unresolved;
        };

        if self.scope.is_excluded_path(&stem) {
            return Resolution::Boundary(stem);
        }

        if self.scope.matches_extension(&stem) && self.index.contains(&stem) {
            return Resolution::Internal(stem);
        }
        for ext in &self.scope.extensions {
            let candidate = format!("{}.{}", stem, ext);
            if self.index.contains(&candidate) {
                return Resolution::Internal(candidate);
            }
        }
        for ext in &self.scope.extensions {
            let candidate = format!("{}/index.{}", stem, ext);
            if self.index.contains(&candidate) {
                return Resolution::Internal(candidate);
            }
        }

        // nothing matched; an explicit foreign extension is an asset
        if let Some(ext) = explicit_extension(&stem) {
            if !self.scope.extensions.iter().any(|e| e == ext) {
                return Resolution::External;
            }
        }
        Resolution::Unresolved
    }
}

/// Directory part of a relative path, `""` at the root
fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Collapse `.` and `..` segments; None when `..` escapes the root
fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}

/// Extension of the final segment, if it has one
fn explicit_extension(path: &str) -> Option<&str> {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.rsplit_once('.').map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SourceFile;
    use crate::scope::{Feature, FeatureEntry};

    fn sample_index() -> SourceIndex {
        let mut index = SourceIndex::default();
        for path in [
            "pages/ReviewWorkflowsPage.tsx",
            "components/StatusBadge.tsx",
            "utils/dates.ts",
            "api/index.ts",
        ] {
            index.insert(SourceFile::new(path, String::new()));
        }
        index
    }

    fn sample_scope() -> MigrationScope {
        let mut scope = MigrationScope::new(vec![FeatureEntry {
            feature: Feature::new("review-workflows"),
            entry: "pages/ReviewWorkflowsPage.tsx".to_string(),
        }]);
        scope.excluded_folders = vec!["employee-warnings".to_string()];
        scope
    }

    #[test]
    fn test_relative_and_alias_resolution() {
        let index = sample_index();
        let scope = sample_scope();
        let resolver = SpecifierResolver::new(&index, &scope, "@/");

        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "../components/StatusBadge"),
            Resolution::Internal("components/StatusBadge.tsx".to_string())
        );
        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "@/utils/dates"),
            Resolution::Internal("utils/dates.ts".to_string())
        );
        // folder import picks up index.ts
        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "../api"),
            Resolution::Internal("api/index.ts".to_string())
        );
    }

    #[test]
    fn test_packages_and_assets_are_external() {
        let index = sample_index();
        let scope = sample_scope();
        let resolver = SpecifierResolver::new(&index, &scope, "@/");

        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "react"),
            Resolution::External
        );
        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "./styles.css"),
            Resolution::External
        );
    }

    #[test]
    fn test_excluded_folder_is_a_boundary() {
        let index = sample_index();
        let scope = sample_scope();
        let resolver = SpecifierResolver::new(&index, &scope, "@/");

        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "../employee-warnings/WarningList"),
            Resolution::Boundary("employee-warnings/WarningList".to_string())
        );
    }

    #[test]
    fn test_unresolved_and_root_escape() {
        let index = sample_index();
        let scope = sample_scope();
        let resolver = SpecifierResolver::new(&index, &scope, "@/");

        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "./Missing"),
            Resolution::Unresolved
        );
        assert_eq!(
            resolver.resolve("pages/ReviewWorkflowsPage.tsx", "../../outside"),
            Resolution::Unresolved
        );
    }
}
