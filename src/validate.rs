//! Invariant Validator - Final textual checks over the staged tree
//!
//! The validator re-derives its findings from staged file text alone,
//! independent of the bookkeeping the earlier passes kept. A defect in
//! classification or rewriting therefore cannot validate its own
//! output. Commit is gated on this pass finding zero violations.

use crate::persist::PersistenceRules;
use crate::plan::{LayoutPlan, LayoutRules};
use crate::report::{Diagnostics, Violation, Warning};
use crate::scope::{Feature, MigrationScope};
use crate::stage::StagedTree;
use crate::symbol::SymbolKind;
use crate::Classification;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Feature name for a staged path under `features/`
fn feature_of(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("features/")?;
    let (feature, _) = rest.split_once('/')?;
    Some(feature)
}

/// Re-checks the four commit invariants against staged text
pub struct InvariantValidator<'a> {
    scope: &'a MigrationScope,
    layout: &'a LayoutRules,
    rules: &'a PersistenceRules,
}

impl<'a> InvariantValidator<'a> {
    pub fn new(
        scope: &'a MigrationScope,
        layout: &'a LayoutRules,
        rules: &'a PersistenceRules,
    ) -> Self {
        Self { scope, layout, rules }
    }

    pub fn validate(&self, staged: &StagedTree, plan: &LayoutPlan) -> Diagnostics {
        let mut diag = Diagnostics::new();
        self.check_feature_imports(staged, &mut diag);
        self.check_residual_persistence(staged, &mut diag);
        self.check_pages(staged, plan, &mut diag);
        self.check_shared_references(staged, plan, &mut diag);
        diag
    }

    /// No staged feature file may name another feature's folder in a
    /// specifier.
    fn check_feature_imports(&self, staged: &StagedTree, diag: &mut Diagnostics) {
        // The alias is escaped, so compilation cannot fail.
        let spec_re = Regex::new(&format!(
            r#"['"](?P<spec>{}features/(?P<feat>[A-Za-z0-9_-]+)/[^'"]*)['"]"#,
            regex::escape(self.layout.alias())
        ))
        .expect("valid pattern");

        for (path, content) in staged.iter() {
            let Some(owner) = feature_of(path) else {
                continue;
            };
            for caps in spec_re.captures_iter(content) {
                let target = &caps["feat"];
                if target != owner {
                    diag.violation(Violation::CrossFeatureImport {
                        from: path.clone(),
                        from_feature: Feature::new(owner),
                        to: caps["spec"].to_string(),
                        to_feature: Feature::new(target),
                    });
                }
            }
        }
    }

    /// No staged feature file may still mention a persistence interface.
    ///
    /// A file that kept a call on an excluded resource legitimately
    /// keeps the interface and its import, so such files are exempt
    /// for that interface.
    fn check_residual_persistence(&self, staged: &StagedTree, diag: &mut Diagnostics) {
        let patterns: Vec<(&String, Regex, Regex)> = self
            .rules
            .interfaces
            .iter()
            .map(|interface| {
                let esc = regex::escape(interface);
                let word = Regex::new(&format!(r"\b{}\b", esc)).expect("valid pattern");
                let call = Regex::new(&format!(
                    r#"\b{}\.[A-Za-z_$][\w$]*\(\s*['"](?P<key>[^'"]+)['"]"#,
                    esc
                ))
                .expect("valid pattern");
                (interface, word, call)
            })
            .collect();

        for (path, content) in staged.iter() {
            if feature_of(path).is_none() {
                continue;
            }
            for (interface, word, call) in &patterns {
                let exempt = call
                    .captures_iter(content)
                    .any(|c| self.scope.is_excluded_resource(&c["key"]));
                if !exempt && word.is_match(content) {
                    diag.violation(Violation::ResidualPersistence {
                        file: path.clone(),
                        interface: (*interface).clone(),
                    });
                }
            }
        }
    }

    /// Every feature folder must hold at least one page file reachable
    /// from the feature's entry point in the staged tree.
    ///
    /// Reachability is re-walked over the staged text: rewritten imports
    /// are all alias-absolute, so each specifier maps back to a planned
    /// destination directly.
    fn check_pages(&self, staged: &StagedTree, plan: &LayoutPlan, diag: &mut Diagnostics) {
        let spec_re = Regex::new(&format!(
            r#"['"](?P<spec>{}[^'"]*)['"]"#,
            regex::escape(self.layout.alias())
        ))
        .expect("valid pattern");
        let dest_of: BTreeMap<&str, &str> = plan
            .iter()
            .map(|p| (p.specifier.as_str(), p.dest.as_str()))
            .collect();
        let pages = self.layout.bucket_of(SymbolKind::Page);

        for fe in &self.scope.features {
            let page_prefix = format!("features/{}/{}/", fe.feature, pages);
            let Some(entry) = plan.get(&fe.entry) else {
                diag.violation(Violation::MissingPage {
                    feature: fe.feature.clone(),
                });
                continue;
            };

            let mut queue = VecDeque::from([entry.dest.clone()]);
            let mut visited: BTreeSet<String> = BTreeSet::new();
            let mut found = false;
            while let Some(dest) = queue.pop_front() {
                if !visited.insert(dest.clone()) {
                    continue;
                }
                if dest.starts_with(&page_prefix) {
                    found = true;
                    break;
                }
                let Some(content) = staged.get(&dest) else {
                    continue;
                };
                for caps in spec_re.captures_iter(content) {
                    if let Some(next) = dest_of.get(&caps["spec"]) {
                        queue.push_back((*next).to_string());
                    }
                }
            }
            if !found {
                diag.violation(Violation::MissingPage {
                    feature: fe.feature.clone(),
                });
            }
        }
    }

    /// A shared file whose specifier appears in no other staged file is
    /// flagged, never fatal.
    fn check_shared_references(
        &self,
        staged: &StagedTree,
        plan: &LayoutPlan,
        diag: &mut Diagnostics,
    ) {
        for planned in plan.iter() {
            if planned.classification != Classification::Shared {
                continue;
            }
            let single = format!("'{}'", planned.specifier);
            let double = format!("\"{}\"", planned.specifier);
            let referenced = staged.iter().any(|(path, content)| {
                path != &planned.dest && (content.contains(&single) || content.contains(&double))
            });
            if !referenced {
                diag.warning(Warning::OrphanShared {
                    path: planned.dest.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DeclarationScanner, SourceIndex};
    use crate::plan::LayoutPlanner;
    use crate::scope::FeatureEntry;

    fn scoped(features: &[(&str, &str)]) -> MigrationScope {
        MigrationScope::new(
            features
                .iter()
                .map(|(f, e)| FeatureEntry {
                    feature: Feature::new(*f),
                    entry: e.to_string(),
                })
                .collect(),
        )
    }

    /// Scan already-rewritten text, plan it under the given classes, and
    /// stage it at the planned destinations.
    fn plan_and_stage(files: &[(&str, &str, Classification)]) -> (LayoutPlan, StagedTree) {
        let scanner = DeclarationScanner::new(&PersistenceRules::default());
        let mut index = SourceIndex::default();
        let mut classes = BTreeMap::new();
        for (path, content, class) in files {
            index.insert(scanner.scan(path, content.to_string()));
            classes.insert(path.to_string(), class.clone());
        }
        let (plan, conflicts) = LayoutPlanner::new(&LayoutRules::default()).plan(&index, &classes);
        assert!(conflicts.is_empty());

        let mut staged = StagedTree::default();
        for planned in plan.iter() {
            staged.insert(
                planned.dest.clone(),
                index.get(&planned.source).unwrap().content.clone(),
            );
        }
        (plan, staged)
    }

    fn owned(feature: &str) -> Classification {
        Classification::Owned(Feature::new(feature))
    }

    #[test]
    fn test_clean_tree_passes() {
        let scope = scoped(&[("review-workflows", "pages/ReviewWorkflowsPage.tsx")]);
        let layout = LayoutRules::default();
        let rules = PersistenceRules::default();

        let (plan, staged) = plan_and_stage(&[
            (
                "pages/ReviewWorkflowsPage.tsx",
                "import { StatusBadge } from '@/components/StatusBadge';\nexport default function ReviewWorkflowsPage() {}\n",
                owned("review-workflows"),
            ),
            (
                "components/StatusBadge.tsx",
                "export function StatusBadge() {}\n",
                Classification::Shared,
            ),
        ]);

        let diag = InvariantValidator::new(&scope, &layout, &rules).validate(&staged, &plan);
        assert!(!diag.is_fatal());
        assert!(diag.warnings.is_empty());
    }

    #[test]
    fn test_foreign_feature_specifier_is_fatal() {
        let scope = scoped(&[("review-workflows", "pages/ReviewWorkflowsPage.tsx")]);
        let layout = LayoutRules::default();
        let rules = PersistenceRules::default();

        let (plan, staged) = plan_and_stage(&[(
            "pages/ReviewWorkflowsPage.tsx",
            "import { fetchScales } from '@/features/rating-scales/api/scales';\nexport default function ReviewWorkflowsPage() {}\n",
            owned("review-workflows"),
        )]);

        let diag = InvariantValidator::new(&scope, &layout, &rules).validate(&staged, &plan);
        assert_eq!(diag.violations.len(), 1);
        match &diag.violations[0] {
            Violation::CrossFeatureImport {
                from_feature,
                to,
                to_feature,
                ..
            } => {
                assert_eq!(from_feature, &Feature::new("review-workflows"));
                assert_eq!(to_feature, &Feature::new("rating-scales"));
                assert_eq!(to, "@/features/rating-scales/api/scales");
            }
            other => panic!("expected cross-feature import, got {:?}", other),
        }
    }

    #[test]
    fn test_residual_interface_in_feature_folder_is_fatal() {
        let scope = scoped(&[("review-workflows", "pages/ReviewWorkflowsPage.tsx")]);
        let layout = LayoutRules::default();
        let rules = PersistenceRules::default();

        let (plan, staged) = plan_and_stage(&[
            (
                "pages/ReviewWorkflowsPage.tsx",
                "export default function ReviewWorkflowsPage() {}\n",
                owned("review-workflows"),
            ),
            (
                "api/workflows.ts",
                "export const fetchWorkflows = () => localStore.read('workflows');\n",
                owned("review-workflows"),
            ),
            // shared files outside features/ are not the residual check's concern
            (
                "utils/session.ts",
                "export const token = () => localStorage.getItem('session');\n",
                Classification::Shared,
            ),
        ]);

        let diag = InvariantValidator::new(&scope, &layout, &rules).validate(&staged, &plan);
        assert_eq!(diag.violations.len(), 1);
        match &diag.violations[0] {
            Violation::ResidualPersistence { file, interface } => {
                assert_eq!(file, "features/review-workflows/api/workflows.ts");
                assert_eq!(interface, "localStore");
            }
            other => panic!("expected residual persistence, got {:?}", other),
        }
    }

    #[test]
    fn test_excluded_resource_call_is_exempt() {
        let mut scope = scoped(&[("review-workflows", "pages/ReviewWorkflowsPage.tsx")]);
        scope.excluded_resources.push("session".to_string());
        let layout = LayoutRules::default();
        let rules = PersistenceRules::default();

        let (plan, staged) = plan_and_stage(&[
            (
                "pages/ReviewWorkflowsPage.tsx",
                "export default function ReviewWorkflowsPage() {}\n",
                owned("review-workflows"),
            ),
            (
                "utils/auth.ts",
                "export const sessionToken = () => localStorage.getItem('session');\n",
                owned("review-workflows"),
            ),
        ]);
        assert!(staged.get("features/review-workflows/utils/auth.ts").is_some());

        let diag = InvariantValidator::new(&scope, &layout, &rules).validate(&staged, &plan);
        assert!(!diag.is_fatal());
    }

    #[test]
    fn test_feature_whose_entry_reaches_no_page_is_fatal() {
        // the rating-scales entry is a component, not a page, and pulls in
        // nothing else, so its feature folder ends up pageless
        let scope = scoped(&[
            ("review-workflows", "pages/ReviewWorkflowsPage.tsx"),
            ("rating-scales", "pages/RatingScales.tsx"),
        ]);
        let layout = LayoutRules::default();
        let rules = PersistenceRules::default();

        let (plan, staged) = plan_and_stage(&[
            (
                "pages/ReviewWorkflowsPage.tsx",
                "export default function ReviewWorkflowsPage() {}\n",
                owned("review-workflows"),
            ),
            (
                "pages/RatingScales.tsx",
                "export default function RatingScales() {}\n",
                owned("rating-scales"),
            ),
        ]);
        assert!(staged.get("features/rating-scales/components/RatingScales.tsx").is_some());

        let diag = InvariantValidator::new(&scope, &layout, &rules).validate(&staged, &plan);
        assert_eq!(diag.violations.len(), 1);
        match &diag.violations[0] {
            Violation::MissingPage { feature } => {
                assert_eq!(feature, &Feature::new("rating-scales"))
            }
            other => panic!("expected missing page, got {:?}", other),
        }
    }

    #[test]
    fn test_page_reached_through_an_intermediate_file_counts() {
        // the entry lands outside the pages bucket but imports a page that
        // lands inside it, so the walk finds the page one hop out
        let scope = scoped(&[("review-workflows", "workflows/index.tsx")]);
        let layout = LayoutRules::default();
        let rules = PersistenceRules::default();

        let (plan, staged) = plan_and_stage(&[
            (
                "workflows/index.tsx",
                "import { WorkflowsPage } from '@/features/review-workflows/pages/WorkflowsPage';\nexport const workflowRoutes = [{ path: '/workflows', element: WorkflowsPage }];\n",
                owned("review-workflows"),
            ),
            (
                "workflows/WorkflowsPage.tsx",
                "export function WorkflowsPage() {}\n",
                owned("review-workflows"),
            ),
        ]);
        assert!(staged.get("features/review-workflows/utils/index.tsx").is_some());

        let diag = InvariantValidator::new(&scope, &layout, &rules).validate(&staged, &plan);
        assert!(!diag.is_fatal());
    }

    #[test]
    fn test_unreferenced_shared_file_warns() {
        let scope = scoped(&[("review-workflows", "pages/ReviewWorkflowsPage.tsx")]);
        let layout = LayoutRules::default();
        let rules = PersistenceRules::default();

        let (plan, staged) = plan_and_stage(&[
            (
                "pages/ReviewWorkflowsPage.tsx",
                "export default function ReviewWorkflowsPage() {}\n",
                owned("review-workflows"),
            ),
            (
                "components/StatusBadge.tsx",
                "export function StatusBadge() {}\n",
                Classification::Shared,
            ),
        ]);

        let diag = InvariantValidator::new(&scope, &layout, &rules).validate(&staged, &plan);
        assert!(!diag.is_fatal());
        match &diag.warnings[0] {
            Warning::OrphanShared { path } => {
                assert_eq!(path, "components/StatusBadge.tsx")
            }
            other => panic!("expected orphan shared, got {:?}", other),
        }
    }
}
