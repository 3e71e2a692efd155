//! Remote API contract - the typed surface persistence calls bind to
//!
//! The backend collaborator declares one entry per (operation, resource)
//! pair: an HTTP method, a path, and request/response shape names. The
//! contract is loaded once per run and is read-only afterward; a contract
//! declaring two entries for the same pair is rejected at load so every call
//! site for a pair can only ever bind to one entry.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Local persistence operations recognized at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceOp {
    /// Read a stored value
    Read,
    /// Write/replace a stored value
    Write,
    /// Delete a stored value
    Delete,
    /// List stored values under a key
    List,
}

impl PersistenceOp {
    /// Stable lowercase name, as written in contract files
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceOp::Read => "read",
            PersistenceOp::Write => "write",
            PersistenceOp::Delete => "delete",
            PersistenceOp::List => "list",
        }
    }

    /// Get all operations
    pub fn all() -> &'static [PersistenceOp] {
        &[
            PersistenceOp::Read,
            PersistenceOp::Write,
            PersistenceOp::Delete,
            PersistenceOp::List,
        ]
    }
}

impl FromStr for PersistenceOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "read" | "get" => Ok(PersistenceOp::Read),
            "write" | "set" | "put" => Ok(PersistenceOp::Write),
            "delete" | "remove" => Ok(PersistenceOp::Delete),
            "list" | "keys" => Ok(PersistenceOp::List),
            _ => Err(Error::Contract(format!("Unknown persistence operation: {}", s))),
        }
    }
}

impl std::fmt::Display for PersistenceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP method of a contract entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// The remote-client method name used in rewritten call sites
    pub fn client_verb(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One declared remote operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiContractEntry {
    /// Local operation this entry replaces
    pub op: PersistenceOp,
    /// HTTP method of the remote operation
    pub method: HttpMethod,
    /// Remote path, e.g. `/api/v1/workflows`
    pub path: String,
    /// Request body shape name, if the operation takes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    /// Response shape name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ApiContractEntry {
    /// Short `GET /api/v1/workflows` form for logs and reports
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Contract entries for one resource key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContract {
    /// Resource key as it appears at persistence call sites
    pub resource: String,
    /// Declared operations on the resource
    pub operations: Vec<ApiContractEntry>,
}

/// On-disk contract document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContractDocument {
    resources: Vec<ResourceContract>,
}

/// The loaded remote API contract, keyed by (operation, resource).
#[derive(Debug, Clone, Default)]
pub struct ApiContract {
    entries: HashMap<(PersistenceOp, String), ApiContractEntry>,
}

impl ApiContract {
    /// Build a contract from resource declarations, rejecting duplicates
    pub fn from_resources(resources: Vec<ResourceContract>) -> Result<Self> {
        let mut entries = HashMap::new();
        for res in resources {
            for entry in res.operations {
                let key = (entry.op, res.resource.clone());
                if entries.contains_key(&key) {
                    return Err(Error::Contract(format!(
                        "duplicate entry for ({}, {})",
                        key.0, key.1
                    )));
                }
                entries.insert(key, entry);
            }
        }
        Ok(Self { entries })
    }

    /// Load a contract from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let doc: ContractDocument = serde_json::from_str(&contents)?;
        Self::from_resources(doc.resources)
    }

    /// Look up the entry a persistence call binds to
    pub fn lookup(&self, op: PersistenceOp, resource: &str) -> Option<&ApiContractEntry> {
        self.entries.get(&(op, resource.to_string()))
    }

    /// Number of declared entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(op: PersistenceOp, method: HttpMethod, path: &str) -> ApiContractEntry {
        ApiContractEntry {
            op,
            method,
            path: path.to_string(),
            request: None,
            response: None,
        }
    }

    fn sample_contract() -> ApiContract {
        ApiContract::from_resources(vec![ResourceContract {
            resource: "workflows".to_string(),
            operations: vec![
                entry(PersistenceOp::Read, HttpMethod::Get, "/api/v1/workflows"),
                entry(PersistenceOp::Write, HttpMethod::Put, "/api/v1/workflows"),
                entry(PersistenceOp::Delete, HttpMethod::Delete, "/api/v1/workflows"),
            ],
        }])
        .unwrap()
    }

    #[test]
    fn test_op_roundtrip() {
        for op in PersistenceOp::all() {
            let parsed: PersistenceOp = op.as_str().parse().unwrap();
            assert_eq!(*op, parsed);
        }
    }

    #[test]
    fn test_op_aliases() {
        assert!(PersistenceOp::from_str("getItem").is_err());
        assert_eq!(PersistenceOp::from_str("get").unwrap(), PersistenceOp::Read);
        assert_eq!(PersistenceOp::from_str("remove").unwrap(), PersistenceOp::Delete);
        assert_eq!(PersistenceOp::from_str("keys").unwrap(), PersistenceOp::List);
    }

    #[test]
    fn test_lookup_by_op_and_resource() {
        let contract = sample_contract();
        let entry = contract.lookup(PersistenceOp::Read, "workflows").unwrap();
        assert_eq!(entry.endpoint(), "GET /api/v1/workflows");
        assert!(contract.lookup(PersistenceOp::List, "workflows").is_none());
        assert!(contract.lookup(PersistenceOp::Read, "rating-scales").is_none());
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let result = ApiContract::from_resources(vec![ResourceContract {
            resource: "workflows".to_string(),
            operations: vec![
                entry(PersistenceOp::Read, HttpMethod::Get, "/api/v1/workflows"),
                entry(PersistenceOp::Read, HttpMethod::Get, "/api/v2/workflows"),
            ],
        }]);
        assert!(matches!(result, Err(Error::Contract(_))));
    }

    #[test]
    fn test_contract_json_shape() {
        let json = r#"{
            "resources": [
                {
                    "resource": "workflows",
                    "operations": [
                        { "op": "read", "method": "GET", "path": "/api/v1/workflows", "response": "Workflow[]" }
                    ]
                }
            ]
        }"#;
        let doc: ContractDocument = serde_json::from_str(json).unwrap();
        let contract = ApiContract::from_resources(doc.resources).unwrap();
        let entry = contract.lookup(PersistenceOp::Read, "workflows").unwrap();
        assert_eq!(entry.method, HttpMethod::Get);
        assert_eq!(entry.response.as_deref(), Some("Workflow[]"));
    }
}
