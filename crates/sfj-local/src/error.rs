//! Error types for the local control plane.

use sfj_provider::ProviderError;
use thiserror::Error;

pub type LocalResult<T> = Result<T, LocalError>;

/// Storage failures of the embedded database.
#[derive(Debug, Error)]
pub enum LocalError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}

impl From<LocalError> for ProviderError {
    fn from(e: LocalError) -> Self {
        ProviderError::Fatal(e.to_string())
    }
}
