//! Source Index - Read-only scan of the legacy tree
//!
//! Walks the scanned root honoring .gitignore plus the configured
//! exclusions, scans every in-scope file for exported declarations,
//! import references and persistence call sites, and exposes the result
//! keyed by relative path. Scanning fans out over worker threads and
//! merges through a channel barrier into path order, so the index is
//! identical run to run regardless of arrival order.

pub mod resolver;
pub mod scanner;

pub use resolver::{Resolution, SpecifierResolver};
pub use scanner::DeclarationScanner;

use crate::contract::PersistenceOp;
use crate::persist::PersistenceRules;
use crate::report::Warning;
use crate::scope::MigrationScope;
use crate::symbol::{Symbol, SymbolKind};
use crate::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// One exported declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedSymbol {
    pub symbol: Symbol,
    /// True for the module's `export default`
    pub is_default: bool,
}

/// One import or re-export declaration, with its specifier span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRef {
    /// Specifier text as written, e.g. `../components/StatusBadge`
    pub specifier: String,
    /// Byte range of the specifier inside the file, quotes excluded
    pub span: (usize, usize),
    /// Target-module names bound by this declaration
    pub names: Vec<String>,
    /// True for `import * as ns` and `export * from`
    pub star: bool,
    /// Local name binding the target's default export, if any
    pub default_name: Option<String>,
    /// 1-based line of the declaration
    pub line: u32,
}

/// One persistence call site, e.g. `localStore.read('workflows')`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceCallSite {
    pub op: PersistenceOp,
    /// Resource key, the first string argument
    pub resource: String,
    /// Byte range from the receiver through the key's closing quote
    pub span: (usize, usize),
    pub receiver: String,
    /// 1-based line of the call
    pub line: u32,
}

/// One scanned source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the scanned root, forward slashes
    pub path: String,
    pub exports: Vec<ExportedSymbol>,
    pub imports: Vec<ImportRef>,
    pub persistence_calls: Vec<PersistenceCallSite>,
    /// Full text, kept for rewriting
    pub content: String,
}

impl SourceFile {
    pub fn new(path: &str, content: String) -> Self {
        Self {
            path: path.to_string(),
            exports: Vec::new(),
            imports: Vec::new(),
            persistence_calls: Vec::new(),
            content,
        }
    }

    /// Kind bucket this file belongs in: the highest-precedence export
    /// wins, and a file with no recognized exports is a util.
    pub fn file_kind(&self) -> SymbolKind {
        self.exports
            .iter()
            .map(|e| e.symbol.kind)
            .min_by_key(|k| k.precedence())
            .unwrap_or(SymbolKind::Util)
    }

    /// The default-exported symbol, if any
    pub fn default_export(&self) -> Option<&ExportedSymbol> {
        self.exports.iter().find(|e| e.is_default)
    }
}

/// Worker-to-barrier message for one walked file
#[derive(Debug)]
pub enum IndexMessage {
    Scanned(SourceFile),
    Unreadable { path: String, reason: String },
}

/// Immutable index over every in-scope file
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    files: BTreeMap<String, SourceFile>,
}

impl SourceIndex {
    pub fn insert(&mut self, file: SourceFile) {
        self.files.insert(file.path.clone(), file);
    }

    pub fn get(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// All files in path order
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// All paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Gitignore-backed filter for folders the walk must never enter
struct NoiseFilter {
    inner: Gitignore,
}

impl NoiseFilter {
    fn new(root: &Path, scope: &MigrationScope) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        let defaults = [
            "node_modules/",
            ".git/",
            "dist/",
            "build/",
            "out/",
            "coverage/",
            ".cache/",
            ".vscode/",
            ".idea/",
        ];
        for pattern in defaults {
            builder.add_line(None, pattern).ok();
        }

        // Excluded collaborator folders are never read, root-anchored so
        // nested folders sharing the name stay in scope
        for folder in &scope.excluded_folders {
            let folder = folder.trim_matches('/');
            builder.add_line(None, &format!("/{}/", folder)).ok();
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }
}

/// Walks and scans the legacy tree
pub struct SourceIndexer<'a> {
    scope: &'a MigrationScope,
    rules: &'a PersistenceRules,
}

impl<'a> SourceIndexer<'a> {
    pub fn new(scope: &'a MigrationScope, rules: &'a PersistenceRules) -> Self {
        Self { scope, rules }
    }

    /// Index every in-scope file under `root`.
    ///
    /// Read failures become warnings, not errors: one unreadable file
    /// must not abort the whole run.
    pub fn index_tree(
        &self,
        root: &Path,
        progress: Option<&ProgressBar>,
    ) -> Result<(SourceIndex, Vec<Warning>)> {
        let files = self.collect_paths(root)?;
        if let Some(pb) = progress {
            pb.set_length(files.len() as u64);
        }

        let scanner = DeclarationScanner::new(self.rules);
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(files.len().max(1));

        let (work_tx, work_rx) = crossbeam::channel::unbounded::<(String, PathBuf)>();
        let (result_tx, result_rx) = crossbeam::channel::unbounded::<IndexMessage>();
        for item in files {
            work_tx.send(item).ok();
        }
        drop(work_tx);

        thread::scope(|s| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let scanner = &scanner;
                s.spawn(move || {
                    for (rel, abs) in work_rx {
                        let msg = match fs::read_to_string(&abs) {
                            Ok(content) => IndexMessage::Scanned(scanner.scan(&rel, content)),
                            Err(e) => IndexMessage::Unreadable {
                                path: rel,
                                reason: e.to_string(),
                            },
                        };
                        if let Some(pb) = progress {
                            pb.inc(1);
                        }
                        result_tx.send(msg).ok();
                    }
                });
            }
        });
        drop(result_tx);

        // Merge barrier: the map key restores path order no matter how
        // the workers interleaved.
        let mut index = SourceIndex::default();
        let mut unreadable = Vec::new();
        for msg in result_rx {
            match msg {
                IndexMessage::Scanned(file) => index.insert(file),
                IndexMessage::Unreadable { path, reason } => unreadable.push((path, reason)),
            }
        }
        unreadable.sort();
        let warnings = unreadable
            .into_iter()
            .map(|(path, reason)| Warning::ParseError { path, reason })
            .collect();

        Ok((index, warnings))
    }

    /// Candidate files in sorted order
    fn collect_paths(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let filter = NoiseFilter::new(root, self.scope);
        let mut out = Vec::new();
        self.walk_dir(root, root, &filter, &mut out)?;
        out.sort();
        Ok(out)
    }

    fn walk_dir(
        &self,
        root: &Path,
        dir: &Path,
        filter: &NoiseFilter,
        out: &mut Vec<(String, PathBuf)>,
    ) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if filter.is_ignored(&path, file_type.is_dir()) {
                continue;
            }
            if file_type.is_dir() {
                self.walk_dir(root, &path, filter, out)?;
            } else if file_type.is_file() {
                let Some(rel) = relative_path(root, &path) else {
                    continue;
                };
                if !self.scope.matches_extension(&rel) {
                    continue;
                }
                if self.scope.is_excluded_path(&rel) {
                    continue;
                }
                out.push((rel, path));
            }
        }
        Ok(())
    }
}

/// Root-relative path with forward slashes
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut s = String::new();
    for comp in rel.components() {
        if !s.is_empty() {
            s.push('/');
        }
        s.push_str(&comp.as_os_str().to_string_lossy());
    }
    Some(s)
}
