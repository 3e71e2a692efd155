//! Declaration scanner for one source file
//!
//! Extracts exported declarations, import references and persistence
//! call sites with their byte spans. This is deliberately not a parser:
//! the passes downstream only need declaration heads and specifier
//! positions, and a scan keeps the index cheap over large trees.

use crate::contract::PersistenceOp;
use crate::index::{ExportedSymbol, ImportRef, PersistenceCallSite, SourceFile};
use crate::persist::PersistenceRules;
use crate::symbol::{Symbol, SymbolKind};
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Compiled patterns for one scan configuration
pub struct DeclarationScanner {
    from_import: Regex,
    side_effect_import: Regex,
    re_export: Regex,
    export_decl: Regex,
    export_default_name: Regex,
    export_list: Regex,
    persistence: Option<Regex>,
    methods: HashMap<String, PersistenceOp>,
}

impl DeclarationScanner {
    pub fn new(rules: &PersistenceRules) -> Self {
        let from_import = Regex::new(
            r#"\bimport\s+(?:type\s+)?(?P<clause>[A-Za-z_$][\w$]*\s*,\s*\{[^}]*\}|\{[^}]*\}|\*\s*as\s+[A-Za-z_$][\w$]*|[A-Za-z_$][\w$]*)\s*from\s*['"](?P<spec>[^'"]+)['"]"#,
        )
        .expect("valid pattern");
        let side_effect_import = Regex::new(r#"\bimport\s*['"](?P<spec>[^'"]+)['"]"#)
            .expect("valid pattern");
        let re_export = Regex::new(
            r#"\bexport\s+(?:type\s+)?(?P<clause>\{[^}]*\}|\*(?:\s+as\s+[A-Za-z_$][\w$]*)?)\s*from\s*['"](?P<spec>[^'"]+)['"]"#,
        )
        .expect("valid pattern");
        let export_decl = Regex::new(
            r#"(?m)^\s*export\s+(?P<default>default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?P<decl>function\*?|class|const|let|var|type|interface|enum)\s+(?P<name>[A-Za-z_$][\w$]*)"#,
        )
        .expect("valid pattern");
        let export_default_name =
            Regex::new(r#"(?m)^\s*export\s+default\s+(?P<name>[A-Za-z_$][\w$]*)\s*;?\s*$"#)
                .expect("valid pattern");
        let export_list =
            Regex::new(r#"\bexport\s+(?:type\s+)?\{(?P<names>[^}]*)\}(?P<from>\s*from)?"#)
                .expect("valid pattern");

        // Interfaces come from config, so this pattern is data-driven.
        // Every interface name is escaped; a failed compile just means no
        // persistence call ever matches, and the validator still catches
        // leftover interface references.
        let persistence = if rules.interfaces.is_empty() {
            None
        } else {
            let alt = rules
                .interfaces
                .iter()
                .map(|i| regex::escape(i))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(
                r#"\b(?P<recv>{})\.(?P<method>[A-Za-z_$][\w$]*)\(\s*['"](?P<key>[^'"]+)['"]"#,
                alt
            ))
            .ok()
        };

        Self {
            from_import,
            side_effect_import,
            re_export,
            export_decl,
            export_default_name,
            export_list,
            persistence,
            methods: rules.methods.clone(),
        }
    }

    /// Scan one file's text into its indexed form
    pub fn scan(&self, path: &str, content: String) -> SourceFile {
        let exports = self.scan_exports(path, &content);
        let imports = self.scan_imports(&content);
        let persistence_calls = self.scan_persistence(&content);
        SourceFile {
            path: path.to_string(),
            exports,
            imports,
            persistence_calls,
            content,
        }
    }

    fn scan_imports(&self, content: &str) -> Vec<ImportRef> {
        let mut out = Vec::new();

        for caps in self.from_import.captures_iter(content) {
            let Some(spec) = caps.name("spec") else { continue };
            let clause = caps.name("clause").map(|m| m.as_str()).unwrap_or("");
            let (default_name, names, star) = parse_clause(clause);
            out.push(ImportRef {
                specifier: spec.as_str().to_string(),
                span: (spec.start(), spec.end()),
                names,
                star,
                default_name,
                line: line_of(content, spec.start()),
            });
        }

        for caps in self.side_effect_import.captures_iter(content) {
            let Some(spec) = caps.name("spec") else { continue };
            out.push(ImportRef {
                specifier: spec.as_str().to_string(),
                span: (spec.start(), spec.end()),
                names: Vec::new(),
                star: false,
                default_name: None,
                line: line_of(content, spec.start()),
            });
        }

        // Re-exports reference another module the same way imports do,
        // and their specifiers get rewritten the same way.
        for caps in self.re_export.captures_iter(content) {
            let Some(spec) = caps.name("spec") else { continue };
            let clause = caps.name("clause").map(|m| m.as_str()).unwrap_or("");
            let star = clause.starts_with('*');
            let names = if star {
                Vec::new()
            } else {
                parse_clause(clause).1
            };
            out.push(ImportRef {
                specifier: spec.as_str().to_string(),
                span: (spec.start(), spec.end()),
                names,
                star,
                default_name: None,
                line: line_of(content, spec.start()),
            });
        }

        out.sort_by_key(|i| i.span.0);
        out
    }

    fn scan_exports(&self, path: &str, content: &str) -> Vec<ExportedSymbol> {
        let mut out: Vec<ExportedSymbol> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for caps in self.export_decl.captures_iter(content) {
            let Some(name_m) = caps.name("name") else { continue };
            let name = name_m.as_str();
            let decl = caps.name("decl").map(|m| m.as_str()).unwrap_or("");
            let is_default = caps.name("default").is_some();
            let is_type_decl = matches!(decl, "type" | "interface" | "enum");
            let is_callable = match decl {
                "function" | "function*" => true,
                "const" | "let" | "var" => declarator_is_callable(content, name_m.end()),
                _ => false,
            };
            let kind = SymbolKind::infer(name, is_type_decl, is_callable);
            if seen.insert(name.to_string()) {
                out.push(ExportedSymbol {
                    symbol: Symbol::new(name, path, kind),
                    is_default,
                });
            } else if is_default {
                if let Some(existing) = out.iter_mut().find(|e| e.symbol.name == name) {
                    existing.is_default = true;
                }
            }
        }

        // `export default Name;` promoting an earlier declaration
        for caps in self.export_default_name.captures_iter(content) {
            let Some(name_m) = caps.name("name") else { continue };
            let name = name_m.as_str();
            if matches!(name, "function" | "class" | "async" | "new" | "await" | "typeof") {
                continue;
            }
            if let Some(existing) = out.iter_mut().find(|e| e.symbol.name == name) {
                existing.is_default = true;
            } else if seen.insert(name.to_string()) {
                out.push(ExportedSymbol {
                    symbol: Symbol::new(name, path, SymbolKind::infer(name, false, false)),
                    is_default: true,
                });
            }
        }

        // `export { A, B as C }` without a source module
        for caps in self.export_list.captures_iter(content) {
            if caps.name("from").is_some() {
                continue;
            }
            let Some(names_m) = caps.name("names") else { continue };
            for part in names_m.as_str().split(',') {
                let part = part.trim();
                let part = part.strip_prefix("type ").unwrap_or(part).trim();
                if part.is_empty() {
                    continue;
                }
                let mut pieces = part.split_whitespace();
                let local = pieces.next().unwrap_or(part);
                let exported = match (pieces.next(), pieces.next()) {
                    (Some("as"), Some(alias)) => alias,
                    _ => local,
                };
                // `A as default` makes A the default export
                let is_default = exported == "default";
                let name = if is_default { local } else { exported };
                if seen.insert(name.to_string()) {
                    out.push(ExportedSymbol {
                        symbol: Symbol::new(name, path, SymbolKind::infer(name, false, false)),
                        is_default,
                    });
                }
            }
        }

        out
    }

    fn scan_persistence(&self, content: &str) -> Vec<PersistenceCallSite> {
        let Some(re) = &self.persistence else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for caps in re.captures_iter(content) {
            let (Some(recv), Some(method), Some(key)) =
                (caps.name("recv"), caps.name("method"), caps.name("key"))
            else {
                continue;
            };
            // Methods outside the op table are not persistence calls;
            // if one slips into a feature folder the validator flags the
            // interface reference.
            let Some(op) = self.methods.get(method.as_str()) else {
                continue;
            };
            let Some(all) = caps.get(0) else { continue };
            out.push(PersistenceCallSite {
                op: *op,
                resource: key.as_str().to_string(),
                span: (all.start(), all.end()),
                receiver: recv.as_str().to_string(),
                line: line_of(content, all.start()),
            });
        }
        out
    }
}

/// Split an import clause into default name, named list and star flag
fn parse_clause(clause: &str) -> (Option<String>, Vec<String>, bool) {
    let clause = clause.trim();
    if clause.starts_with('*') {
        return (None, Vec::new(), true);
    }

    let (head, braced) = match clause.find('{') {
        Some(idx) => {
            let close = clause.rfind('}').unwrap_or(clause.len());
            (&clause[..idx], Some(&clause[idx + 1..close]))
        }
        None => (clause, None),
    };

    let head = head.trim().trim_end_matches(',').trim();
    let default_name = if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    };

    let mut names = Vec::new();
    if let Some(inner) = braced {
        for part in inner.split(',') {
            let part = part.trim();
            let part = part.strip_prefix("type ").unwrap_or(part).trim();
            if part.is_empty() {
                continue;
            }
            // `A as B` binds the target's A locally
            let target = part.split_whitespace().next().unwrap_or(part);
            names.push(target.to_string());
        }
    }

    (default_name, names, false)
}

/// True when the declarator after `name` is a function value
fn declarator_is_callable(content: &str, from: usize) -> bool {
    let line_end = content[from..]
        .find('\n')
        .map(|i| from + i)
        .unwrap_or(content.len());
    let rest = &content[from..line_end];
    rest.contains("=>") || rest.contains("function")
}

/// 1-based line holding the given byte offset
fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset].bytes().filter(|b| *b == b'\n').count() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> DeclarationScanner {
        DeclarationScanner::new(&PersistenceRules::default())
    }

    #[test]
    fn test_scans_export_declarations() {
        let src = "\
export default function ReviewWorkflowsPage() {}
export const fetchWorkflows = async () => {};
export interface Workflow { id: string }
export const API_VERSION = 'v1';
";
        let file = scanner().scan("pages/ReviewWorkflowsPage.tsx", src.to_string());
        let names: Vec<&str> = file.exports.iter().map(|e| e.symbol.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ReviewWorkflowsPage", "fetchWorkflows", "Workflow", "API_VERSION"]
        );
        assert!(file.exports[0].is_default);
        assert_eq!(file.exports[0].symbol.kind, SymbolKind::Page);
        assert_eq!(file.exports[1].symbol.kind, SymbolKind::ApiCall);
        assert_eq!(file.exports[2].symbol.kind, SymbolKind::Type);
        assert_eq!(file.exports[3].symbol.kind, SymbolKind::Util);
        assert_eq!(file.file_kind(), SymbolKind::Page);
    }

    #[test]
    fn test_trailing_default_export() {
        let src = "\
function WorkflowForm() {}
export { WorkflowForm };
export default WorkflowForm;
";
        let file = scanner().scan("components/WorkflowForm.tsx", src.to_string());
        assert_eq!(file.exports.len(), 1);
        assert_eq!(file.exports[0].symbol.name, "WorkflowForm");
        assert!(file.exports[0].is_default);
        assert_eq!(file.exports[0].symbol.kind, SymbolKind::Component);
    }

    #[test]
    fn test_scans_import_forms() {
        let src = "\
import React from 'react';
import { useState, useEffect } from 'react';
import StatusBadge, { badgeColor } from '../components/StatusBadge';
import * as dates from '@/utils/dates';
import './styles.css';
export { Workflow } from './types';
";
        let file = scanner().scan("pages/ReviewWorkflowsPage.tsx", src.to_string());
        let specs: Vec<&str> = file.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(
            specs,
            vec![
                "react",
                "react",
                "../components/StatusBadge",
                "@/utils/dates",
                "./styles.css",
                "./types"
            ]
        );

        let badge = &file.imports[2];
        assert_eq!(badge.default_name.as_deref(), Some("StatusBadge"));
        assert_eq!(badge.names, vec!["badgeColor"]);

        let star = &file.imports[3];
        assert!(star.star);
        assert!(star.names.is_empty());

        let side_effect = &file.imports[4];
        assert!(side_effect.default_name.is_none());
        assert!(side_effect.names.is_empty());

        // spans point exactly at the specifier text
        for import in &file.imports {
            let (start, end) = import.span;
            assert_eq!(&file.content[start..end], import.specifier);
        }
    }

    #[test]
    fn test_multiline_named_import() {
        let src = "\
import {
  fetchWorkflows,
  approveWorkflow,
} from '../api/workflows';
";
        let file = scanner().scan("hooks/useWorkflows.ts", src.to_string());
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.imports[0].specifier, "../api/workflows");
        assert_eq!(
            file.imports[0].names,
            vec!["fetchWorkflows", "approveWorkflow"]
        );
    }

    #[test]
    fn test_scans_persistence_calls() {
        let src = "\
const rows = localStore.read('workflows');
localStore.write('workflows', next);
localStorage.setItem('theme', value);
localStore.clear();
";
        let file = scanner().scan("api/workflows.ts", src.to_string());
        assert_eq!(file.persistence_calls.len(), 3);

        let read = &file.persistence_calls[0];
        assert_eq!(read.op, PersistenceOp::Read);
        assert_eq!(read.resource, "workflows");
        assert_eq!(read.receiver, "localStore");
        assert_eq!(
            &file.content[read.span.0..read.span.1],
            "localStore.read('workflows'"
        );

        assert_eq!(file.persistence_calls[1].op, PersistenceOp::Write);
        assert_eq!(file.persistence_calls[2].op, PersistenceOp::Write);
        assert_eq!(file.persistence_calls[2].receiver, "localStorage");
        assert_eq!(file.persistence_calls[2].resource, "theme");
    }

    #[test]
    fn test_type_only_imports_still_reference_the_module() {
        let src = "import type { Workflow } from './types';\n";
        let file = scanner().scan("api/workflows.ts", src.to_string());
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.imports[0].names, vec!["Workflow"]);
    }
}
