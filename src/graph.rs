//! Usage Graph - File dependency graph over the source index
//!
//! Nodes are indexed files, edges point from importer to imported file.
//! Strongly connected components collapse into a condensation via Tarjan
//! SCC, so members of an import cycle always travel together through
//! classification. Boundary and unresolved specifiers never become
//! edges; they surface as warnings.

use crate::index::{ImportRef, Resolution, SourceFile, SourceIndex, SpecifierResolver};
use crate::report::Warning;
use crate::scope::MigrationScope;
use crate::symbol::Symbol;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// One symbol-to-file usage edge
#[derive(Debug, Clone)]
pub struct UsageEdge {
    /// Symbol being referenced
    pub symbol: Symbol,
    /// File holding the reference
    pub referencing: String,
}

/// Size summary for logs
#[derive(Debug, Clone, Copy)]
pub struct GraphStats {
    pub files: usize,
    pub edges: usize,
    pub components: usize,
    pub cycles: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} edges, {} groups ({} cyclic)",
            self.files, self.edges, self.components, self.cycles
        )
    }
}

/// File dependency graph with its cycle condensation
pub struct UsageGraph {
    graph: DiGraph<String, ()>,
    /// (file, import position) -> where that specifier resolved
    resolutions: HashMap<(String, usize), Resolution>,
    usage_edges: Vec<UsageEdge>,
    /// Component id per file; ids index into `components`
    comp_of: HashMap<String, usize>,
    /// Member files per component, sorted
    components: Vec<Vec<String>>,
    /// Condensation adjacency: component -> successor components
    comp_succ: Vec<BTreeSet<usize>>,
    /// Components with more than one member, sorted by first member
    cycles: Vec<Vec<String>>,
    warnings: Vec<Warning>,
}

impl UsageGraph {
    /// Build the graph by resolving every import in the index.
    ///
    /// Files are visited in path order and duplicate edges are folded,
    /// so node and edge layout is identical run to run.
    pub fn build(index: &SourceIndex, scope: &MigrationScope, alias: &str) -> Self {
        let resolver = SpecifierResolver::new(index, scope, alias);
        let mut graph = DiGraph::new();
        let mut path_to_node: HashMap<String, NodeIndex> = HashMap::new();

        for path in index.paths() {
            let idx = graph.add_node(path.to_string());
            path_to_node.insert(path.to_string(), idx);
        }

        let mut resolutions = HashMap::new();
        let mut usage_edges = Vec::new();
        let mut warnings = Vec::new();
        let mut seen_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();

        for file in index.files() {
            let Some(&from_idx) = path_to_node.get(&file.path) else {
                continue;
            };
            for (pos, import) in file.imports.iter().enumerate() {
                let resolution = resolver.resolve(&file.path, &import.specifier);
                match &resolution {
                    Resolution::Internal(target) => {
                        if target != &file.path {
                            if let Some(&to_idx) = path_to_node.get(target.as_str()) {
                                if seen_edges.insert((from_idx, to_idx)) {
                                    graph.add_edge(from_idx, to_idx, ());
                                }
                            }
                        }
                        if let Some(target_file) = index.get(target) {
                            record_usage(&mut usage_edges, file, import, target_file);
                        }
                    }
                    Resolution::Boundary(_) => warnings.push(Warning::ExcludedBoundary {
                        from: file.path.clone(),
                        specifier: import.specifier.clone(),
                    }),
                    Resolution::External => {}
                    Resolution::Unresolved => warnings.push(Warning::UnresolvedImport {
                        from: file.path.clone(),
                        specifier: import.specifier.clone(),
                    }),
                }
                resolutions.insert((file.path.clone(), pos), resolution);
            }
        }

        // Collapse SCCs; the classifier only ever walks the condensation
        let sccs = tarjan_scc(&graph);
        let mut components = Vec::with_capacity(sccs.len());
        let mut comp_of = HashMap::new();
        for (comp_id, scc) in sccs.iter().enumerate() {
            let mut members: Vec<String> = scc.iter().map(|idx| graph[*idx].clone()).collect();
            members.sort();
            for member in &members {
                comp_of.insert(member.clone(), comp_id);
            }
            components.push(members);
        }

        let mut comp_succ: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); components.len()];
        for edge in graph.edge_references() {
            let from_comp = comp_of[&graph[edge.source()]];
            let to_comp = comp_of[&graph[edge.target()]];
            if from_comp != to_comp {
                comp_succ[from_comp].insert(to_comp);
            }
        }

        let mut cycles: Vec<Vec<String>> = components
            .iter()
            .filter(|c| c.len() > 1)
            .cloned()
            .collect();
        cycles.sort();
        for cycle in &cycles {
            tracing::warn!(
                "import cycle kept intact ({} files): {}",
                cycle.len(),
                cycle.join(" <-> ")
            );
        }

        Self {
            graph,
            resolutions,
            usage_edges,
            comp_of,
            components,
            comp_succ,
            cycles,
            warnings,
        }
    }

    /// Where the import at `pos` in `file` resolved
    pub fn resolution(&self, file: &str, pos: usize) -> Option<&Resolution> {
        self.resolutions.get(&(file.to_string(), pos))
    }

    pub fn component_of(&self, path: &str) -> Option<usize> {
        self.comp_of.get(path).copied()
    }

    pub fn component_members(&self, id: usize) -> &[String] {
        self.components.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Successor components in the condensation
    pub fn component_successors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.comp_succ
            .get(id)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Import cycles kept intact through the migration
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    /// Boundary and unresolved-import warnings found during the build
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn usage_edges(&self) -> &[UsageEdge] {
        &self.usage_edges
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            files: self.graph.node_count(),
            edges: self.graph.edge_count(),
            components: self.components.len(),
            cycles: self.cycles.len(),
        }
    }
}

/// Bind the names an import declares to the target's exports
fn record_usage(
    out: &mut Vec<UsageEdge>,
    from: &SourceFile,
    import: &ImportRef,
    target: &SourceFile,
) {
    if import.star {
        for export in &target.exports {
            out.push(UsageEdge {
                symbol: export.symbol.clone(),
                referencing: from.path.clone(),
            });
        }
        return;
    }
    if import.default_name.is_some() {
        if let Some(default) = target.default_export() {
            out.push(UsageEdge {
                symbol: default.symbol.clone(),
                referencing: from.path.clone(),
            });
        }
    }
    for name in &import.names {
        let export = if name == "default" {
            target.default_export()
        } else {
            target.exports.iter().find(|e| e.symbol.name == *name)
        };
        if let Some(export) = export {
            out.push(UsageEdge {
                symbol: export.symbol.clone(),
                referencing: from.path.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DeclarationScanner;
    use crate::persist::PersistenceRules;
    use crate::scope::{Feature, FeatureEntry};

    fn scan_into(index: &mut SourceIndex, path: &str, src: &str) {
        let scanner = DeclarationScanner::new(&PersistenceRules::default());
        index.insert(scanner.scan(path, src.to_string()));
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
    fn test_chain_builds_separate_components() {
        let mut index = SourceIndex::default();
        scan_into(
            &mut index,
            "pages/ReviewWorkflowsPage.tsx",
            "import { useWorkflows } from '../hooks/useWorkflows';\nexport default function ReviewWorkflowsPage() {}\n",
        );
        scan_into(
            &mut index,
            "hooks/useWorkflows.ts",
            "import { fetchWorkflows } from '@/api/workflows';\nexport const useWorkflows = () => {};\n",
        );
        scan_into(
            &mut index,
            "api/workflows.ts",
            "export const fetchWorkflows = () => [];\n",
        );

        let scope = sample_scope();
        let graph = UsageGraph::build(&index, &scope, "@/");
        let stats = graph.stats();
        assert_eq!(stats.files, 3);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.components, 3);
        assert_eq!(stats.cycles, 0);

        let page = graph.component_of("pages/ReviewWorkflowsPage.tsx").unwrap();
        let hook = graph.component_of("hooks/useWorkflows.ts").unwrap();
        let api = graph.component_of("api/workflows.ts").unwrap();
        assert!(graph.component_successors(page).any(|c| c == hook));
        assert!(graph.component_successors(hook).any(|c| c == api));
        assert_eq!(graph.component_successors(api).count(), 0);

        // named import bound to the exported symbol
        assert!(graph.usage_edges().iter().any(|e| {
            e.symbol.name == "fetchWorkflows" && e.referencing == "hooks/useWorkflows.ts"
        }));
    }

    #[test]
    fn test_cycle_collapses_into_one_component() {
        let mut index = SourceIndex::default();
        scan_into(
            &mut index,
            "workflows/form.ts",
            "import { validate } from './validation';\nexport const form = 1;\n",
        );
        scan_into(
            &mut index,
            "workflows/validation.ts",
            "import { form } from './form';\nexport const validate = 1;\n",
        );

        let scope = sample_scope();
        let graph = UsageGraph::build(&index, &scope, "@/");

        assert_eq!(graph.cycles().len(), 1);
        assert_eq!(
            graph.cycles()[0],
            vec!["workflows/form.ts".to_string(), "workflows/validation.ts".to_string()]
        );
        assert_eq!(
            graph.component_of("workflows/form.ts"),
            graph.component_of("workflows/validation.ts")
        );
    }

    #[test]
    fn test_boundary_import_is_flagged_not_followed() {
        let mut index = SourceIndex::default();
        scan_into(
            &mut index,
            "pages/ReviewWorkflowsPage.tsx",
            "import { WarningList } from '../employee-warnings/WarningList';\nexport default function ReviewWorkflowsPage() {}\n",
        );

        let scope = sample_scope();
        let graph = UsageGraph::build(&index, &scope, "@/");

        assert_eq!(graph.stats().edges, 0);
        assert_eq!(graph.warnings().len(), 1);
        assert!(matches!(
            graph.resolution("pages/ReviewWorkflowsPage.tsx", 0),
            Some(Resolution::Boundary(_))
        ));
        match &graph.warnings()[0] {
            Warning::ExcludedBoundary { from, specifier } => {
                assert_eq!(from, "pages/ReviewWorkflowsPage.tsx");
                assert_eq!(specifier, "../employee-warnings/WarningList");
            }
            other => panic!("expected boundary warning, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_imports_fold_into_one_edge() {
        let mut index = SourceIndex::default();
        scan_into(
            &mut index,
            "pages/ReviewWorkflowsPage.tsx",
            "import { a } from './helpers';\nimport { b } from './helpers';\nexport default function ReviewWorkflowsPage() {}\n",
        );
        scan_into(
            &mut index,
            "pages/helpers.ts",
            "export const a = 1;\nexport const b = 2;\n",
        );

        let scope = sample_scope();
        let graph = UsageGraph::build(&index, &scope, "@/");
        assert_eq!(graph.stats().edges, 1);
        assert_eq!(graph.usage_edges().len(), 2);
    }
}
