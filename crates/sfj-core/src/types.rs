//! Shared types used across sfj crates.
//!
//! Provider-side records are plain serializable structs so that any control
//! plane (remote or emulated) can hand them back without translation.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::hash::{ContentHasher, FunctionIdentity};

/// A bundled, zipped function handed over by the packager.
#[derive(Debug, Clone)]
pub struct FunctionArtifact {
    /// Human-facing name (redirect manifest key).
    pub name: String,
    /// Deployable archive bytes. Opaque to the orchestrator.
    pub payload: Bytes,
}

impl FunctionArtifact {
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn identity(&self) -> FunctionIdentity {
        ContentHasher::hash(&self.payload)
    }
}

// ── Compute ────────────────────────────────────────────────────────

/// Parameters for creating a compute function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub role: String,
    pub runtime: String,
    pub handler: String,
    pub timeout_secs: u32,
    /// Active tracing when true, pass-through otherwise.
    pub tracing: bool,
    pub publish: bool,
    pub tags: BTreeMap<String, String>,
    pub code: Bytes,
}

/// Provider-side view of a deployed function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    /// Resource handle (ARN).
    pub arn: String,
    pub description: String,
    pub role: String,
    pub runtime: String,
    pub handler: String,
    pub timeout_secs: u32,
    pub tracing: bool,
    pub tags: BTreeMap<String, String>,
    /// Monotonic code revision, starting at 1.
    pub revision: u64,
    /// Digest of the currently deployed code.
    pub code_sha: String,
    pub code_size: u64,
    pub last_modified: u64,
}

/// Standing grant letting a principal invoke a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub function_name: String,
    pub statement_id: String,
    pub action: String,
    pub principal: String,
    pub source_arn: String,
}

// ── Gateway ────────────────────────────────────────────────────────

/// A routing front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRecord {
    pub id: String,
    pub name: String,
    pub protocol_type: String,
    pub endpoint: String,
}

/// Binding from a gateway to one backend compute resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub id: String,
    pub integration_type: String,
    /// Target resource handle.
    pub target_uri: String,
    pub payload_format_version: String,
}

/// Path-to-integration binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    /// e.g. `ANY /<identity>`
    pub route_key: String,
    /// e.g. `integrations/<id>`
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub auto_deploy: bool,
}
