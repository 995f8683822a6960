//! Content-derived function identities.
//!
//! A function's identity is the SHA-224 digest of its deployable payload,
//! hex-encoded. The display name never takes part in the digest, so renaming
//! a route without touching code maps onto the same compute resource.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};
use thiserror::Error;

/// Length of a hex-encoded SHA-224 digest.
pub const IDENTITY_HEX_LEN: usize = 56;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity must be {IDENTITY_HEX_LEN} hex characters, got {0}")]
    Length(usize),
    #[error("identity contains a non-hex character: {0:?}")]
    NotHex(char),
}

/// Content-addressed key of a deployed function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionIdentity(String);

impl FunctionIdentity {
    /// Parse an identity previously produced by [`ContentHasher::hash`].
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if s.len() != IDENTITY_HEX_LEN {
            return Err(IdentityError::Length(s.len()));
        }
        if let Some(c) = s.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(IdentityError::NotHex(c));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for FunctionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FunctionIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for FunctionIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FunctionIdentity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FunctionIdentity> for String {
    fn from(value: FunctionIdentity) -> Self {
        value.0
    }
}

/// Derives identities from payload bytes.
pub struct ContentHasher;

impl ContentHasher {
    /// Hash raw payload bytes. Empty input is valid.
    pub fn hash(payload: &[u8]) -> FunctionIdentity {
        FunctionIdentity(hex::encode(Sha224::digest(payload)))
    }

    /// Hash the contents of a file on disk.
    pub fn hash_file(path: &Path) -> anyhow::Result<FunctionIdentity> {
        let bytes = std::fs::read(path)?;
        Ok(Self::hash(&bytes))
    }
}
