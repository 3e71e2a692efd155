//! reslice.toml - on-disk run configuration
//!
//! Carries the enumerated feature set with entry points, exclusion
//! boundaries, the kind-bucket table, path-alias convention, and the local
//! persistence interface description. `build()` turns the document into the
//! immutable runtime values the passes consume.

use crate::contract::PersistenceOp;
use crate::persist::PersistenceRules;
use crate::plan::LayoutRules;
use crate::scope::{Feature, FeatureEntry, MigrationScope};
use crate::symbol::SymbolKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub name: String,
    pub entry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScopeConfig {
    #[serde(default)]
    pub excluded_folders: Vec<String>,
    #[serde(default)]
    pub excluded_resources: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Alias prefix emitted in rewritten specifiers
    #[serde(default = "LayoutConfig::default_alias")]
    pub alias: String,
    /// kind -> folder bucket overrides; unset kinds use the defaults
    #[serde(default)]
    pub buckets: HashMap<String, String>,
}

impl LayoutConfig {
    fn default_alias() -> String {
        "@/".to_string()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            alias: Self::default_alias(),
            buckets: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Receiver identifiers recognized as the local persistence interface
    #[serde(default = "PersistenceConfig::default_interfaces")]
    pub interfaces: Vec<String>,
    /// method name -> operation overrides; unset methods use the defaults
    #[serde(default)]
    pub methods: HashMap<String, String>,
    /// Identifier of the remote client in rewritten call sites
    #[serde(default = "PersistenceConfig::default_client_name")]
    pub client_name: String,
    /// Import line injected into files that gained a remote call
    #[serde(default = "PersistenceConfig::default_client_import")]
    pub client_import: String,
    /// Path to the contract JSON, relative to the config file
    #[serde(default = "PersistenceConfig::default_contract")]
    pub contract: String,
}

impl PersistenceConfig {
    fn default_interfaces() -> Vec<String> {
        PersistenceRules::default().interfaces
    }

    fn default_client_name() -> String {
        PersistenceRules::default().client_name
    }

    fn default_client_import() -> String {
        PersistenceRules::default().client_import
    }

    fn default_contract() -> String {
        "contract.json".to_string()
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            interfaces: Self::default_interfaces(),
            methods: HashMap::new(),
            client_name: Self::default_client_name(),
            client_import: Self::default_client_import(),
            contract: Self::default_contract(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResliceConfig {
    #[serde(default)]
    pub features: Vec<FeatureConfig>,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl ResliceConfig {
    /// A scaffold config with the placeholder feature slots filled in
    pub fn scaffold() -> Self {
        Self {
            features: vec![FeatureConfig {
                name: "my-feature".to_string(),
                entry: "pages/MyFeaturePage.tsx".to_string(),
            }],
            ..Self::default()
        }
    }

    /// Build the immutable runtime values from this document.
    ///
    /// Validation happens here so every pass downstream can assume a
    /// well-formed scope.
    pub fn build(&self) -> Result<(MigrationScope, LayoutRules, PersistenceRules)> {
        if self.features.is_empty() {
            return Err(Error::Config("no features enumerated".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        let mut entries = Vec::new();
        for fc in &self.features {
            if !seen.insert(fc.name.clone()) {
                return Err(Error::Config(format!("duplicate feature: {}", fc.name)));
            }
            entries.push(FeatureEntry {
                feature: Feature::new(&fc.name),
                entry: fc.entry.clone(),
            });
        }

        let mut scope = MigrationScope::new(entries);
        scope.excluded_folders = self.scope.excluded_folders.clone();
        scope.excluded_resources = self.scope.excluded_resources.clone();
        if !self.scope.extensions.is_empty() {
            scope.extensions = self.scope.extensions.clone();
        }

        for fe in &scope.features {
            if scope.is_excluded_path(&fe.entry) {
                return Err(Error::Config(format!(
                    "entry point {} of feature {} lies inside an excluded folder",
                    fe.entry, fe.feature
                )));
            }
        }

        let mut layout = LayoutRules::new(&self.layout.alias);
        for (kind, bucket) in &self.layout.buckets {
            let kind = SymbolKind::from_str(kind)?;
            layout.set_bucket(kind, bucket);
        }

        let mut methods = PersistenceRules::default().methods;
        for (name, op) in &self.persistence.methods {
            let op = PersistenceOp::from_str(op)
                .map_err(|_| Error::Config(format!("unknown persistence op: {}", op)))?;
            methods.insert(name.clone(), op);
        }
        let rules = PersistenceRules {
            interfaces: self.persistence.interfaces.clone(),
            methods,
            client_name: self.persistence.client_name.clone(),
            client_import: self.persistence.client_import.clone(),
        };

        Ok((scope, layout, rules))
    }

    /// Contract path resolved against the directory holding the config file
    pub fn contract_path(&self, config_dir: &Path) -> PathBuf {
        let p = Path::new(&self.persistence.contract);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            config_dir.join(p)
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("reslice.toml")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<ResliceConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ResliceConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ResliceConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("cannot serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
