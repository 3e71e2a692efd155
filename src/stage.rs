//! Staged Tree - Output built in scratch space, committed by rename
//!
//! Validation runs against staged text before anything touches the
//! destination. Commit writes the whole tree into a scratch directory
//! beside the destination and renames it into place, so a failed or
//! interrupted run leaves no partial output behind.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Planned output files, keyed by destination-relative path
#[derive(Debug, Clone, Default)]
pub struct StagedTree {
    files: BTreeMap<String, String>,
}

impl StagedTree {
    pub fn insert(&mut self, dest: String, content: String) {
        self.files.insert(dest, content);
    }

    pub fn get(&self, dest: &str) -> Option<&str> {
        self.files.get(dest).map(String::as_str)
    }

    /// Destination paths and contents, in path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every staged file under `dir`, creating parents as needed
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        for (dest, content) in &self.files {
            let path = dir.join(dest);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
        }
        Ok(())
    }

    /// Move the staged tree into `dest_root` with a single rename.
    ///
    /// An existing non-empty destination is refused so a prior run's
    /// output is never clobbered; an existing empty directory is
    /// replaced.
    pub fn commit(&self, dest_root: &Path) -> Result<()> {
        if dest_root.exists() {
            if !dest_root.is_dir() {
                return Err(Error::Stage(format!(
                    "destination exists and is not a directory: {}",
                    dest_root.display()
                )));
            }
            if std::fs::read_dir(dest_root)?.next().is_some() {
                return Err(Error::Stage(format!(
                    "destination directory is not empty: {}",
                    dest_root.display()
                )));
            }
        }

        let parent = dest_root
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&parent)?;
        let scratch = parent.join(format!(".reslice-staging-{}", std::process::id()));
        if scratch.exists() {
            std::fs::remove_dir_all(&scratch)?;
        }

        if let Err(err) = self.write_to(&scratch) {
            let _ = std::fs::remove_dir_all(&scratch);
            return Err(err);
        }

        if dest_root.exists() {
            if let Err(err) = std::fs::remove_dir(dest_root) {
                let _ = std::fs::remove_dir_all(&scratch);
                return Err(err.into());
            }
        }
        if let Err(err) = std::fs::rename(&scratch, dest_root) {
            let _ = std::fs::remove_dir_all(&scratch);
            return Err(err.into());
        }
        Ok(())
    }
}
