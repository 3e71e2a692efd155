//! Feature Classifier - Entry-point reachability decides ownership
//!
//! Every feature's entry file seeds a traversal of the condensation.
//! A file reached by exactly one feature is owned by it, a file reached
//! by several is shared, and a file reached by none is dead code,
//! excluded from the output and flagged. Classification is a pure
//! function of the reaching sets, so a cyclic group whose members are
//! pulled by different features lands in shared as a whole.

use crate::graph::UsageGraph;
use crate::report::Warning;
use crate::scope::{Feature, MigrationScope};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Ownership decided for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Reached by exactly this feature
    Owned(Feature),
    /// Reached by two or more features
    Shared,
}

/// Everything the classifier decided
#[derive(Debug, Clone, Default)]
pub struct ClassificationOutcome {
    /// Class per classified file, in path order
    pub classes: BTreeMap<String, Classification>,
    /// Features reaching each classified file, sorted
    pub reaching: BTreeMap<String, Vec<Feature>>,
    /// Indexed files no entry point reaches, in path order
    pub unreached: Vec<String>,
    /// One dead-code warning per unreached file
    pub warnings: Vec<Warning>,
}

/// Walks the condensation from every entry point
pub struct Classifier<'a> {
    scope: &'a MigrationScope,
}

impl<'a> Classifier<'a> {
    pub fn new(scope: &'a MigrationScope) -> Self {
        Self { scope }
    }

    /// Classify every indexed file.
    ///
    /// A feature whose entry point is not in the index is a
    /// configuration error: without it the feature's reach is undefined
    /// and the whole partition would silently shift.
    pub fn classify(&self, graph: &UsageGraph) -> Result<ClassificationOutcome> {
        let mut reaching: Vec<BTreeSet<Feature>> = vec![BTreeSet::new(); graph.component_count()];

        for fe in &self.scope.features {
            let Some(start) = graph.component_of(&fe.entry) else {
                return Err(Error::Config(format!(
                    "entry point for '{}' not found in the scanned tree: {}",
                    fe.feature, fe.entry
                )));
            };
            let mut queue = VecDeque::from([start]);
            let mut visited: HashSet<usize> = HashSet::from([start]);
            while let Some(comp) = queue.pop_front() {
                reaching[comp].insert(fe.feature.clone());
                for succ in graph.component_successors(comp) {
                    if visited.insert(succ) {
                        queue.push_back(succ);
                    }
                }
            }
        }

        let mut outcome = ClassificationOutcome::default();
        for comp_id in 0..graph.component_count() {
            let feats = &reaching[comp_id];
            let class = match feats.len() {
                0 => None,
                1 => feats.iter().next().cloned().map(Classification::Owned),
                _ => Some(Classification::Shared),
            };
            for member in graph.component_members(comp_id) {
                match &class {
                    Some(class) => {
                        outcome.classes.insert(member.clone(), class.clone());
                        outcome
                            .reaching
                            .insert(member.clone(), feats.iter().cloned().collect());
                    }
                    None => outcome.unreached.push(member.clone()),
                }
            }
        }

        outcome.unreached.sort();
        outcome.warnings = outcome
            .unreached
            .iter()
            .map(|path| Warning::DeadCode { path: path.clone() })
            .collect();

        Ok(outcome)
    }
}
