//! Import Rewriter - Splices planned specifiers into source text
//!
//! Edits are byte-span replacements against the original file content,
//! applied in one pass after sorting. Every internal import is pointed
//! at its target's planned alias specifier; an import that already
//! matches produces no edit, so a second run over migrated output
//! leaves the text byte-identical.

use crate::index::{Resolution, SourceIndex};
use crate::plan::LayoutPlan;
use crate::report::Violation;
use crate::{Classification, UsageGraph};
use std::collections::BTreeMap;

/// One byte-span replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// Apply edits to `content` in span order.
///
/// Spans come from distinct scanner matches and must not overlap;
/// a zero-width edit at the same offset inserts before the span.
pub fn apply_edits(content: &str, edits: &mut Vec<TextEdit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for edit in edits.iter() {
        if edit.start < cursor {
            continue;
        }
        out.push_str(&content[cursor..edit.start]);
        out.push_str(&edit.replacement);
        cursor = edit.end;
    }
    out.push_str(&content[cursor..]);
    out
}

/// Edits and violations produced by one rewrite pass
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    /// Specifier edits per source path, in path order
    pub edits: BTreeMap<String, Vec<TextEdit>>,
    pub violations: Vec<Violation>,
}

/// Points every internal import at its target's planned location
pub struct ImportRewriter<'a> {
    plan: &'a LayoutPlan,
    graph: &'a UsageGraph,
}

impl<'a> ImportRewriter<'a> {
    pub fn new(plan: &'a LayoutPlan, graph: &'a UsageGraph) -> Self {
        Self { plan, graph }
    }

    /// Rewrite imports for every planned file.
    ///
    /// An import from one feature's file into another feature's file is
    /// fatal and produces no edit. Boundary, external, and unresolved
    /// specifiers stay as they are.
    pub fn rewrite(&self, index: &SourceIndex) -> RewriteOutcome {
        let mut out = RewriteOutcome::default();

        for planned in self.plan.iter() {
            let Some(file) = index.get(&planned.source) else {
                continue;
            };
            let mut edits = Vec::new();
            for (pos, import) in file.imports.iter().enumerate() {
                let Some(Resolution::Internal(target)) =
                    self.graph.resolution(&file.path, pos)
                else {
                    continue;
                };
                let Some(target_plan) = self.plan.get(target) else {
                    continue;
                };
                if let (Classification::Owned(from_feature), Classification::Owned(to_feature)) =
                    (&planned.classification, &target_plan.classification)
                {
                    if from_feature != to_feature {
                        out.violations.push(Violation::CrossFeatureImport {
                            from: planned.source.clone(),
                            from_feature: from_feature.clone(),
                            to: target_plan.source.clone(),
                            to_feature: to_feature.clone(),
                        });
                        continue;
                    }
                }
                if import.specifier != target_plan.specifier {
                    edits.push(TextEdit {
                        start: import.span.0,
                        end: import.span.1,
                        replacement: target_plan.specifier.clone(),
                    });
                }
            }
            if !edits.is_empty() {
                out.edits.insert(planned.source.clone(), edits);
            }
        }

        out
    }
}
