//! Compute function publishing.
//!
//! A function is named `prefix + identity`. Creating a name that already
//! exists means the same bytes were published before, so the existing
//! function is reused without uploading code again.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use sfj_core::config::{FunctionConfig, ProviderConfig};
use sfj_core::naming::{function_name, identity_from_function_name, role_arn};
use sfj_core::{FunctionIdentity, FunctionRecord, FunctionSpec};
use sfj_provider::{ComputeApi, ProviderError, ProviderResult, RetryPolicy};

use crate::error::{DeployError, DeployResult};

/// Outcome of publishing one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    /// A new function was created with the payload.
    Created(String),
    /// A function with this identity already existed; no code was uploaded.
    Reused(String),
    /// The code of an existing function was replaced.
    Updated(String),
}

impl PublishResult {
    /// Resource handle (ARN) of the function.
    pub fn handle(&self) -> &str {
        match self {
            PublishResult::Created(h) | PublishResult::Reused(h) | PublishResult::Updated(h) => h,
        }
    }

    pub fn into_handle(self) -> String {
        match self {
            PublishResult::Created(h) | PublishResult::Reused(h) | PublishResult::Updated(h) => h,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PublishResult::Created(_) => "created",
            PublishResult::Reused(_) => "reused",
            PublishResult::Updated(_) => "updated",
        }
    }
}

/// Read-only view of the functions this orchestrator owns.
#[derive(Clone)]
pub struct FunctionRegistry {
    compute: Arc<dyn ComputeApi>,
    prefix: String,
    retry: RetryPolicy,
}

impl FunctionRegistry {
    pub fn new(compute: Arc<dyn ComputeApi>, prefix: &str, retry: RetryPolicy) -> Self {
        Self {
            compute,
            prefix: prefix.to_string(),
            retry,
        }
    }

    /// Functions whose name is `prefix + <valid identity>`.
    pub async fn list(&self) -> ProviderResult<Vec<FunctionRecord>> {
        let all = self
            .retry
            .run("list_functions", || self.compute.list_functions())
            .await?;
        Ok(all
            .into_iter()
            .filter(|f| identity_from_function_name(&self.prefix, &f.name).is_some())
            .collect())
    }

    pub async fn deployed_identities(&self) -> ProviderResult<BTreeSet<FunctionIdentity>> {
        Ok(self
            .list()
            .await?
            .iter()
            .filter_map(|f| identity_from_function_name(&self.prefix, &f.name))
            .collect())
    }
}

/// Creates, reuses, or refreshes compute functions.
#[derive(Clone)]
pub struct FunctionPublisher {
    compute: Arc<dyn ComputeApi>,
    role: String,
    function: FunctionConfig,
    retry: RetryPolicy,
}

impl FunctionPublisher {
    pub fn new(
        compute: Arc<dyn ComputeApi>,
        account_id: &str,
        provider: &ProviderConfig,
        function: &FunctionConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            compute,
            role: role_arn(account_id, &provider.role_resource),
            function: function.clone(),
            retry,
        }
    }

    pub fn function_name(&self, identity: &FunctionIdentity) -> String {
        function_name(&self.function.name_prefix, identity)
    }

    fn spec(&self, identity: &FunctionIdentity, display_name: &str, payload: &Bytes) -> FunctionSpec {
        FunctionSpec {
            name: self.function_name(identity),
            description: format!("{} - {display_name}", self.function.description_prefix),
            role: self.role.clone(),
            runtime: self.function.runtime.clone(),
            handler: self.function.handler.clone(),
            timeout_secs: self.function.timeout_secs,
            tracing: self.function.tracing,
            publish: true,
            tags: self.function.tags.clone(),
            code: payload.clone(),
        }
    }

    /// Create the function for `identity`, or reuse it if it already exists.
    pub async fn publish(
        &self,
        identity: &FunctionIdentity,
        display_name: &str,
        payload: &Bytes,
    ) -> DeployResult<PublishResult> {
        let spec = self.spec(identity, display_name, payload);
        debug!(function = %spec.name, name = %display_name, "creating function");

        match self
            .retry
            .run("create_function", || self.compute.create_function(&spec))
            .await
        {
            Ok(record) => {
                info!(function = %spec.name, name = %display_name, "function created");
                Ok(PublishResult::Created(record.arn))
            }
            Err(ProviderError::AlreadyExists(_)) => {
                let record = self
                    .retry
                    .run("get_function", || self.compute.get_function(&spec.name))
                    .await?;
                info!(function = %spec.name, name = %display_name, "function already existed");
                Ok(PublishResult::Reused(record.arn))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the code of an already-deployed identity.
    pub async fn update(&self, identity: &FunctionIdentity, payload: &Bytes) -> DeployResult<PublishResult> {
        let name = self.function_name(identity);
        match self
            .retry
            .run("update_function_code", || {
                self.compute.update_function_code(&name, payload.clone())
            })
            .await
        {
            Ok(record) => {
                info!(function = %name, revision = record.revision, "function code refreshed");
                Ok(PublishResult::Updated(record.arn))
            }
            Err(ProviderError::NotFound(_)) => Err(DeployError::NotDeployed(name)),
            Err(e) => Err(e.into()),
        }
    }
}
