//! Deployment error types.

use std::time::Duration;

use sfj_provider::ProviderError;
use thiserror::Error;

/// Errors that abort the deployment of one artifact.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("bootstrap store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("malformed bootstrap record for account {account}: {reason}")]
    BootstrapRecord { account: String, reason: String },

    #[error("invalid store account {0:?}")]
    InvalidAccount(String),

    #[error("artifact name {0:?} appears more than once in the batch")]
    DuplicateName(String),

    #[error("function {0} is not deployed")]
    NotDeployed(String),

    #[error("deployment of {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    #[error("deployment of {0} was cancelled")]
    Cancelled(String),
}

pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_not_prefixed_twice() {
        let err = DeployError::from(ProviderError::Fatal("quota exceeded".to_string()));
        assert_eq!(err.to_string(), "provider error: quota exceeded");
    }
}
