//! Target Layout Planner - Maps classified files to destination paths
//!
//! Owned files land under `features/<feature>/<bucket>/`, shared files
//! under a top-level `<bucket>/`. The bucket comes from the file's kind
//! and the configurable kind-to-folder table. Planning is pure: no
//! filesystem access, and two files claiming the same destination is a
//! fatal conflict rather than a silent overwrite.

use crate::classify::Classification;
use crate::index::SourceIndex;
use crate::report::Violation;
use crate::symbol::SymbolKind;
use std::collections::{BTreeMap, HashMap};

/// Kind-to-folder table plus the import alias root
#[derive(Debug, Clone)]
pub struct LayoutRules {
    alias: String,
    buckets: HashMap<SymbolKind, String>,
}

fn default_bucket(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Page => "pages",
        SymbolKind::Context => "context",
        SymbolKind::Hook => "hooks",
        SymbolKind::Component => "components",
        SymbolKind::ApiCall => "api",
        SymbolKind::Type => "types",
        SymbolKind::Util => "utils",
    }
}

impl LayoutRules {
    /// New rules over the given alias root, e.g. `@/`
    pub fn new(alias: &str) -> Self {
        let mut alias = alias.to_string();
        if !alias.ends_with('/') {
            alias.push('/');
        }
        let buckets = SymbolKind::all()
            .iter()
            .map(|k| (*k, default_bucket(*k).to_string()))
            .collect();
        Self { alias, buckets }
    }

    /// Override the folder name for one kind
    pub fn set_bucket(&mut self, kind: SymbolKind, bucket: &str) {
        self.buckets.insert(kind, bucket.to_string());
    }

    /// Folder name a file of this kind belongs in
    pub fn bucket_of(&self, kind: SymbolKind) -> &str {
        self.buckets
            .get(&kind)
            .map(|s| s.as_str())
            .unwrap_or_else(|| default_bucket(kind))
    }

    /// Alias prefix every rewritten import starts with
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self::new("@/")
    }
}

/// One file's planned destination
#[derive(Debug, Clone)]
pub struct PlannedFile {
    /// Source path relative to the scanned root
    pub source: String,
    /// Destination path relative to the output root, extension kept
    pub dest: String,
    /// Alias specifier other files use to import this one
    pub specifier: String,
    pub classification: Classification,
}

/// Full mapping from source paths to destinations
#[derive(Debug, Clone, Default)]
pub struct LayoutPlan {
    files: BTreeMap<String, PlannedFile>,
}

impl LayoutPlan {
    pub fn get(&self, source: &str) -> Option<&PlannedFile> {
        self.files.get(source)
    }

    /// Planned files in source-path order
    pub fn iter(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Computes destinations for every classified file
pub struct LayoutPlanner<'a> {
    rules: &'a LayoutRules,
}

impl<'a> LayoutPlanner<'a> {
    pub fn new(rules: &'a LayoutRules) -> Self {
        Self { rules }
    }

    /// Plan destinations for every classified file.
    ///
    /// Conflicts are detected on the extension-stripped destination so
    /// `Form.tsx` and `Form.ts` cannot coexist and take each other's
    /// import specifier. Files are visited in path order, so the first
    /// claimant of a destination is stable across runs.
    pub fn plan(
        &self,
        index: &SourceIndex,
        classes: &BTreeMap<String, Classification>,
    ) -> (LayoutPlan, Vec<Violation>) {
        let mut plan = LayoutPlan::default();
        let mut violations = Vec::new();
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();

        for (source, class) in classes {
            let Some(file) = index.get(source) else {
                continue;
            };
            let kind = file.file_kind();
            let bucket = self.rules.bucket_of(kind);
            let name = basename(source);

            let dest = match class {
                Classification::Owned(feature) => {
                    format!("features/{}/{}/{}", feature, bucket, name)
                }
                Classification::Shared => format!("{}/{}", bucket, name),
            };
            let stem = strip_extension(&dest).to_string();

            match claimed.get(&stem) {
                Some(first) => {
                    violations.push(Violation::PlanConflict {
                        dest: stem.clone(),
                        first: first.clone(),
                        second: source.clone(),
                    });
                }
                None => {
                    claimed.insert(stem.clone(), source.clone());
                }
            }

            let specifier = format!("{}{}", self.rules.alias(), stem);
            plan.files.insert(
                source.clone(),
                PlannedFile {
                    source: source.clone(),
                    dest,
                    specifier,
                    classification: class.clone(),
                },
            );
        }

        (plan, violations)
    }
}

/// Last path segment
fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Drop the final `.ext` segment; `Foo.test.tsx` keeps `.test`
fn strip_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(idx) if idx > path.rfind('/').map_or(0, |s| s + 1) => &path[..idx],
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SourceFile;
    use crate::scope::Feature;
    use crate::symbol::{Symbol, SymbolKind};

    fn file_with_export(path: &str, name: &str, kind: SymbolKind) -> SourceFile {
        let mut file = SourceFile::new(path, String::new());
        file.exports.push(crate::index::ExportedSymbol {
            symbol: Symbol::new(name, path, kind),
            is_default: false,
        });
        file
    }

    fn sample_index() -> SourceIndex {
        let mut index = SourceIndex::default();
        index.insert(file_with_export(
            "pages/ReviewWorkflowsPage.tsx",
            "ReviewWorkflowsPage",
            SymbolKind::Page,
        ));
        index.insert(file_with_export(
            "components/StatusBadge.tsx",
            "StatusBadge",
            SymbolKind::Component,
        ));
        index.insert(file_with_export(
            "workflows/WorkflowForm.tsx",
            "WorkflowForm",
            SymbolKind::Component,
        ));
        index.insert(file_with_export(
            "forms/WorkflowForm.tsx",
            "WorkflowForm",
            SymbolKind::Component,
        ));
        index
    }

    #[test]
    fn test_owned_and_shared_destinations() {
        let rules = LayoutRules::default();
        let planner = LayoutPlanner::new(&rules);
        let index = sample_index();

        let mut classes = BTreeMap::new();
        classes.insert(
            "pages/ReviewWorkflowsPage.tsx".to_string(),
            Classification::Owned(Feature::new("review-workflows")),
        );
        classes.insert(
            "components/StatusBadge.tsx".to_string(),
            Classification::Shared,
        );

        let (plan, violations) = planner.plan(&index, &classes);
        assert!(violations.is_empty());

        let page = plan.get("pages/ReviewWorkflowsPage.tsx").unwrap();
        assert_eq!(
            page.dest,
            "features/review-workflows/pages/ReviewWorkflowsPage.tsx"
        );
        assert_eq!(
            page.specifier,
            "@/features/review-workflows/pages/ReviewWorkflowsPage"
        );

        let badge = plan.get("components/StatusBadge.tsx").unwrap();
        assert_eq!(badge.dest, "components/StatusBadge.tsx");
        assert_eq!(badge.specifier, "@/components/StatusBadge");
    }

    #[test]
    fn test_same_basename_same_bucket_conflicts() {
        let rules = LayoutRules::default();
        let planner = LayoutPlanner::new(&rules);
        let index = sample_index();

        let feature = Feature::new("review-workflows");
        let mut classes = BTreeMap::new();
        classes.insert(
            "workflows/WorkflowForm.tsx".to_string(),
            Classification::Owned(feature.clone()),
        );
        classes.insert(
            "forms/WorkflowForm.tsx".to_string(),
            Classification::Owned(feature),
        );

        let (plan, violations) = planner.plan(&index, &classes);
        assert_eq!(plan.len(), 2);
        assert_eq!(violations.len(), 1);
        match &violations[0] {
            Violation::PlanConflict { dest, first, second } => {
                assert_eq!(dest, "features/review-workflows/components/WorkflowForm");
                // path order decides who claimed the slot first
                assert_eq!(first, "forms/WorkflowForm.tsx");
                assert_eq!(second, "workflows/WorkflowForm.tsx");
            }
            other => panic!("expected plan conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_two_type_indexes_claim_one_destination() {
        let rules = LayoutRules::default();
        let planner = LayoutPlanner::new(&rules);

        let mut index = SourceIndex::default();
        index.insert(file_with_export(
            "scales/types/index.ts",
            "Scale",
            SymbolKind::Type,
        ));
        index.insert(file_with_export(
            "scaleConfig/types/index.ts",
            "ScaleConfig",
            SymbolKind::Type,
        ));

        let feature = Feature::new("rating-scales");
        let mut classes = BTreeMap::new();
        classes.insert(
            "scales/types/index.ts".to_string(),
            Classification::Owned(feature.clone()),
        );
        classes.insert(
            "scaleConfig/types/index.ts".to_string(),
            Classification::Owned(feature),
        );

        let (_, violations) = planner.plan(&index, &classes);
        assert_eq!(violations.len(), 1);
        match &violations[0] {
            Violation::PlanConflict { dest, .. } => {
                assert_eq!(dest, "features/rating-scales/types/index")
            }
            other => panic!("expected plan conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_extensions_do_not_disambiguate_destinations() {
        let rules = LayoutRules::default();
        let planner = LayoutPlanner::new(&rules);

        let mut index = SourceIndex::default();
        index.insert(file_with_export(
            "controls/Toggle.tsx",
            "Toggle",
            SymbolKind::Component,
        ));
        index.insert(file_with_export(
            "widgets/Toggle.ts",
            "Toggle",
            SymbolKind::Component,
        ));

        let mut classes = BTreeMap::new();
        classes.insert("controls/Toggle.tsx".to_string(), Classification::Shared);
        classes.insert("widgets/Toggle.ts".to_string(), Classification::Shared);

        let (_, violations) = planner.plan(&index, &classes);
        assert_eq!(violations.len(), 1);
        match &violations[0] {
            Violation::PlanConflict { dest, first, second } => {
                assert_eq!(dest, "components/Toggle");
                assert_eq!(first, "controls/Toggle.tsx");
                assert_eq!(second, "widgets/Toggle.ts");
            }
            other => panic!("expected plan conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_stripping_keeps_inner_dots() {
        assert_eq!(strip_extension("components/Form.test.tsx"), "components/Form.test");
        assert_eq!(strip_extension("utils/date"), "utils/date");
        assert_eq!(strip_extension("a.b/file"), "a.b/file");
    }

    #[test]
    fn test_bucket_overrides() {
        let mut rules = LayoutRules::new("~/");
        rules.set_bucket(SymbolKind::Util, "lib");
        assert_eq!(rules.bucket_of(SymbolKind::Util), "lib");
        assert_eq!(rules.bucket_of(SymbolKind::Component), "components");
        assert_eq!(rules.alias(), "~/");
    }
}
