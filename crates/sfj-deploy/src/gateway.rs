//! Per-account gateway bootstrap.
//!
//! Each store account owns exactly one gateway. Its id is recorded in a
//! durable object store under the key `{account}` as
//! `{"apiGateway": "<id>"}`; the first deployment to an account creates the
//! gateway and writes the record.
//!
//! Concurrent bootstraps of one account inside this process are collapsed
//! into a single flight. Across processes the record is last-writer-wins,
//! which can orphan one gateway per race.

use std::collections::HashMap;
use std::sync::Arc;

use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use sfj_core::naming::gateway_name;
use sfj_provider::{GatewayApi, RetryPolicy};

use crate::error::{DeployError, DeployResult};

/// Durable bootstrap record, one object per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapRecord {
    #[serde(rename = "apiGateway")]
    pub api_gateway: String,
}

/// Resolves (and on first use creates) the shared gateway of an account.
pub struct GatewayStore {
    store: Arc<dyn ObjectStore>,
    gateway: Arc<dyn GatewayApi>,
    name_prefix: String,
    retry: RetryPolicy,
    /// account → resolved gateway id, initialized at most once per process.
    resolved: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl GatewayStore {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        gateway: Arc<dyn GatewayApi>,
        name_prefix: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            gateway,
            name_prefix: name_prefix.to_string(),
            retry,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Gateway id of `account`, creating the gateway if none is recorded.
    ///
    /// A failed bootstrap leaves nothing cached, so the next call retries.
    pub async fn get_or_create(&self, account: &str) -> DeployResult<String> {
        let cell = {
            let mut resolved = self.resolved.lock().await;
            resolved.entry(account.to_string()).or_default().clone()
        };
        let id = cell.get_or_try_init(|| self.bootstrap(account)).await?;
        Ok(id.clone())
    }

    async fn bootstrap(&self, account: &str) -> DeployResult<String> {
        if let Some(record) = self.lookup(account).await? {
            debug!(%account, gateway = %record.api_gateway, "gateway found in bootstrap store");
            return Ok(record.api_gateway);
        }

        let name = gateway_name(&self.name_prefix, account);
        let api = self
            .retry
            .run("create_api", || self.gateway.create_api(&name))
            .await?;
        self.write(
            account,
            &BootstrapRecord {
                api_gateway: api.id.clone(),
            },
        )
        .await?;
        info!(%account, gateway = %api.id, %name, "gateway created");
        Ok(api.id)
    }

    /// Read the bootstrap record. Absence is `Ok(None)`; any other store
    /// failure is an error.
    pub async fn lookup(&self, account: &str) -> DeployResult<Option<BootstrapRecord>> {
        let path = ObjectPath::from(account);
        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let bytes = result.bytes().await?;
        let record = serde_json::from_slice(&bytes).map_err(|e| DeployError::BootstrapRecord {
            account: account.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    async fn write(&self, account: &str, record: &BootstrapRecord) -> DeployResult<()> {
        let body = serde_json::to_vec(record).map_err(|e| DeployError::BootstrapRecord {
            account: account.to_string(),
            reason: e.to_string(),
        })?;
        self.store
            .put(&ObjectPath::from(account), PutPayload::from(body))
            .await?;
        Ok(())
    }
}
