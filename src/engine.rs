//! Migration Engine - One run of the full pipeline
//!
//! Index, graph, classify, plan, rewrite, substitute, stage, validate,
//! commit. Passes accumulate violations and warnings instead of
//! aborting, so a failed run still reports every problem found. The
//! staged tree reaches the destination only when the validator finds
//! zero violations and the run is not a dry run.

use crate::classify::Classifier;
use crate::contract::ApiContract;
use crate::index::SourceIndexer;
use crate::persist::{PersistenceBinder, PersistenceRules};
use crate::plan::{LayoutPlan, LayoutPlanner, LayoutRules};
use crate::report::{Diagnostics, FeatureTally, FileMove, MigrationReport, RunStatus, SubstitutionRecord};
use crate::rewrite::{apply_edits, ImportRewriter, TextEdit};
use crate::scope::MigrationScope;
use crate::stage::StagedTree;
use crate::validate::InvariantValidator;
use crate::{Classification, Result, UsageGraph};
use indicatif::ProgressBar;
use std::path::Path;

/// What one run produced
#[derive(Debug)]
pub struct MigrationOutcome {
    pub report: MigrationReport,
    /// True when the staged tree was renamed into the destination
    pub committed: bool,
}

/// Runs the migration pipeline over one source tree
pub struct MigrationEngine {
    scope: MigrationScope,
    layout: LayoutRules,
    persistence: PersistenceRules,
    contract: ApiContract,
}

impl MigrationEngine {
    pub fn new(
        scope: MigrationScope,
        layout: LayoutRules,
        persistence: PersistenceRules,
        contract: ApiContract,
    ) -> Self {
        Self {
            scope,
            layout,
            persistence,
            contract,
        }
    }

    /// Run the pipeline over `src_root`; commit into `dest_root` unless
    /// `dry_run`.
    pub fn run(
        &self,
        src_root: &Path,
        dest_root: &Path,
        dry_run: bool,
        progress: Option<&ProgressBar>,
    ) -> Result<MigrationOutcome> {
        let mut diag = Diagnostics::new();

        let indexer = SourceIndexer::new(&self.scope, &self.persistence);
        let (index, scan_warnings) = indexer.index_tree(src_root, progress)?;
        if let Some(pb) = progress {
            pb.finish_with_message("Indexed");
        }
        diag.warnings.extend(scan_warnings);
        tracing::info!("Indexed {} files under {}", index.len(), src_root.display());

        let graph = UsageGraph::build(&index, &self.scope, self.layout.alias());
        diag.warnings.extend_from_slice(graph.warnings());
        tracing::info!("Usage graph: {}", graph.stats());
        tracing::debug!("Bound {} symbol references", graph.usage_edges().len());

        let mut classified = Classifier::new(&self.scope).classify(&graph)?;
        for (path, feats) in &classified.reaching {
            if feats.len() > 1 {
                tracing::debug!(
                    "{} is shared by {}",
                    path,
                    feats
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        diag.warnings.append(&mut classified.warnings);

        let (plan, conflicts) = LayoutPlanner::new(&self.layout).plan(&index, &classified.classes);
        diag.violations.extend(conflicts);

        let rewrite = ImportRewriter::new(&plan, &graph).rewrite(&index);
        diag.violations.extend(rewrite.violations);

        let binder = PersistenceBinder::new(&self.contract, &self.persistence, &self.scope);
        let substitution = binder.substitute(&index, &classified.classes);
        tracing::info!("Replaced {} persistence calls", substitution.records.len());
        diag.absorb(substitution.diagnostics);

        // Import edits and persistence edits for a file apply together
        // against its original content.
        let mut staged = StagedTree::default();
        for planned in plan.iter() {
            let Some(file) = index.get(&planned.source) else {
                continue;
            };
            let mut edits: Vec<TextEdit> = Vec::new();
            if let Some(e) = rewrite.edits.get(&planned.source) {
                edits.extend(e.iter().cloned());
            }
            if let Some(e) = substitution.edits.get(&planned.source) {
                edits.extend(e.iter().cloned());
            }
            let content = if edits.is_empty() {
                file.content.clone()
            } else {
                apply_edits(&file.content, &mut edits)
            };
            staged.insert(planned.dest.clone(), content);
        }

        let validator = InvariantValidator::new(&self.scope, &self.layout, &self.persistence);
        diag.absorb(validator.validate(&staged, &plan));

        let report = self.assemble_report(&plan, &graph, substitution.records, diag);

        let mut committed = false;
        if report.status.is_success() && !dry_run {
            staged.commit(dest_root)?;
            committed = true;
            tracing::info!("Committed {} files to {}", staged.len(), dest_root.display());
        } else if !report.status.is_success() {
            tracing::warn!(
                "{} violations found; nothing was written",
                report.violations.len()
            );
        }

        Ok(MigrationOutcome { report, committed })
    }

    fn assemble_report(
        &self,
        plan: &LayoutPlan,
        graph: &UsageGraph,
        substitutions: Vec<SubstitutionRecord>,
        diag: Diagnostics,
    ) -> MigrationReport {
        let mut features: Vec<FeatureTally> = self
            .scope
            .features
            .iter()
            .map(|fe| FeatureTally {
                feature: fe.feature.clone(),
                entry: fe.entry.clone(),
                moved: Vec::new(),
            })
            .collect();
        features.sort_by(|a, b| a.feature.cmp(&b.feature));

        let mut shared = Vec::new();
        for planned in plan.iter() {
            let mv = FileMove {
                from: planned.source.clone(),
                to: planned.dest.clone(),
            };
            match &planned.classification {
                Classification::Owned(feature) => {
                    if let Some(tally) = features.iter_mut().find(|t| &t.feature == feature) {
                        tally.moved.push(mv);
                    }
                }
                Classification::Shared => shared.push(mv),
            }
        }

        let status = if diag.is_fatal() {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };
        MigrationReport {
            status,
            features,
            shared,
            cycles: graph.cycles().to_vec(),
            substitutions,
            violations: diag.violations,
            warnings: diag.warnings,
        }
    }
}
