//! Persistence Substitution - Local store calls become remote client calls
//!
//! Every recognized persistence call in a classified file is matched
//! against the API contract by (operation, resource). A hit rewrites the
//! call head to the remote client and records the substitution; a miss
//! is fatal. Excluded resources are left untouched and flagged. Files
//! that gained a remote call also gain the client import, once.

use crate::classify::Classification;
use crate::contract::{ApiContract, PersistenceOp};
use crate::index::{SourceFile, SourceIndex};
use crate::report::{Diagnostics, SubstitutionRecord, Violation, Warning};
use crate::rewrite::TextEdit;
use crate::scope::MigrationScope;
use std::collections::{BTreeMap, HashMap};

/// What counts as a persistence call and what replaces it
#[derive(Debug, Clone)]
pub struct PersistenceRules {
    /// Receiver identifiers recognized as the local persistence interface
    pub interfaces: Vec<String>,
    /// Method name to operation table
    pub methods: HashMap<String, PersistenceOp>,
    /// Identifier of the remote client in rewritten call sites
    pub client_name: String,
    /// Import line injected into files that gained a remote call
    pub client_import: String,
}

impl Default for PersistenceRules {
    fn default() -> Self {
        let methods = [
            ("read", PersistenceOp::Read),
            ("getItem", PersistenceOp::Read),
            ("write", PersistenceOp::Write),
            ("setItem", PersistenceOp::Write),
            ("remove", PersistenceOp::Delete),
            ("removeItem", PersistenceOp::Delete),
            ("list", PersistenceOp::List),
            ("keys", PersistenceOp::List),
        ]
        .into_iter()
        .map(|(name, op)| (name.to_string(), op))
        .collect();
        Self {
            interfaces: vec!["localStore".to_string(), "localStorage".to_string()],
            methods,
            client_name: "apiClient".to_string(),
            client_import: "import { apiClient } from '@/api/client';".to_string(),
        }
    }
}

/// Edits and records produced by the substitution pass
#[derive(Debug, Default)]
pub struct SubstitutionOutcome {
    /// Pending edits keyed by source path
    pub edits: BTreeMap<String, Vec<TextEdit>>,
    /// One record per rewritten call, in file-then-span order
    pub records: Vec<SubstitutionRecord>,
    pub diagnostics: Diagnostics,
}

/// Binds persistence call sites to contract endpoints
pub struct PersistenceBinder<'a> {
    contract: &'a ApiContract,
    rules: &'a PersistenceRules,
    scope: &'a MigrationScope,
}

impl<'a> PersistenceBinder<'a> {
    pub fn new(
        contract: &'a ApiContract,
        rules: &'a PersistenceRules,
        scope: &'a MigrationScope,
    ) -> Self {
        Self {
            contract,
            rules,
            scope,
        }
    }

    /// Rewrite every persistence call in every classified file.
    ///
    /// The call head through the resource key is replaced, so argument
    /// lists and trailing parentheses survive as written:
    /// `localStore.write('workflows', next)` becomes
    /// `apiClient.post('/api/v1/workflows', next)`.
    pub fn substitute(
        &self,
        index: &SourceIndex,
        classes: &BTreeMap<String, Classification>,
    ) -> SubstitutionOutcome {
        let mut out = SubstitutionOutcome::default();

        for path in classes.keys() {
            let Some(file) = index.get(path) else { continue };
            if file.persistence_calls.is_empty() {
                continue;
            }

            let mut edits = Vec::new();
            let mut substituted = false;
            for call in &file.persistence_calls {
                if self.scope.is_excluded_resource(&call.resource) {
                    out.diagnostics.warning(Warning::UntouchedPersistenceCall {
                        file: path.clone(),
                        resource: call.resource.clone(),
                    });
                    continue;
                }
                match self.contract.lookup(call.op, &call.resource) {
                    Some(entry) => {
                        let replacement = format!(
                            "{}.{}('{}'",
                            self.rules.client_name,
                            entry.method.client_verb(),
                            entry.path
                        );
                        edits.push(TextEdit {
                            start: call.span.0,
                            end: call.span.1,
                            replacement,
                        });
                        out.records.push(SubstitutionRecord {
                            file: path.clone(),
                            op: call.op,
                            resource: call.resource.clone(),
                            endpoint: entry.endpoint(),
                        });
                        substituted = true;
                    }
                    None => {
                        out.diagnostics.violation(Violation::UnmappedPersistenceCall {
                            file: path.clone(),
                            op: call.op,
                            resource: call.resource.clone(),
                        });
                    }
                }
            }

            if substituted && !self.imports_client(file) {
                edits.push(TextEdit {
                    start: 0,
                    end: 0,
                    replacement: format!("{}\n", self.rules.client_import),
                });
            }
            if !edits.is_empty() {
                out.edits.insert(path.clone(), edits);
            }
        }

        out
    }

    fn imports_client(&self, file: &SourceFile) -> bool {
        let name = &self.rules.client_name;
        file.imports.iter().any(|i| {
            i.names.iter().any(|n| n == name) || i.default_name.as_deref() == Some(name.as_str())
        }) || file.content.contains(self.rules.client_import.trim())
    }
}
