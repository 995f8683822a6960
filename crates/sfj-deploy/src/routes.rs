//! Wiring a function into the shared gateway.
//!
//! Integrations are looked up by target resource handle before creating
//! one, so a restart never duplicates them. Routes are append-only: an
//! existing route key is never rebound.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sfj_core::{FunctionIdentity, PermissionGrant};
use sfj_core::config::ProviderConfig;
use sfj_core::naming::{
    DEFAULT_STAGE, GATEWAY_PRINCIPAL, INVOKE_ACTION, function_name, integration_target,
    permission_source_arn, route_key,
};
use sfj_provider::{ComputeApi, GatewayApi, ProviderError, RetryPolicy};

use crate::error::DeployResult;

/// Outcome of binding one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindResult {
    /// A new integration, route, and grant were created.
    Created(String),
    /// An integration for the handle already existed and was reused as-is.
    Reused(String),
}

impl BindResult {
    pub fn integration_id(&self) -> &str {
        match self {
            BindResult::Created(id) | BindResult::Reused(id) => id,
        }
    }
}

pub struct RouteBinder {
    gateway: Arc<dyn GatewayApi>,
    compute: Arc<dyn ComputeApi>,
    account_id: String,
    region: String,
    function_prefix: String,
    retry: RetryPolicy,
}

impl RouteBinder {
    pub fn new(
        gateway: Arc<dyn GatewayApi>,
        compute: Arc<dyn ComputeApi>,
        account_id: &str,
        provider: &ProviderConfig,
        function_prefix: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            compute,
            account_id: account_id.to_string(),
            region: provider.region.clone(),
            function_prefix: function_prefix.to_string(),
            retry,
        }
    }

    /// Route `ANY /{path}` on `gateway_id` to the function at `handle`.
    pub async fn bind(
        &self,
        identity: &FunctionIdentity,
        path: &str,
        handle: &str,
        gateway_id: &str,
    ) -> DeployResult<BindResult> {
        let integrations = self
            .retry
            .run("get_integrations", || self.gateway.get_integrations(gateway_id))
            .await?;
        if let Some(existing) = integrations.iter().find(|i| i.target_uri == handle) {
            info!(gateway = %gateway_id, integration = %existing.id, "integration for function exists");
            return Ok(BindResult::Reused(existing.id.clone()));
        }

        let integration = self
            .retry
            .run("create_integration", || {
                self.gateway.create_integration(gateway_id, handle)
            })
            .await?;
        debug!(gateway = %gateway_id, integration = %integration.id, "integration created");

        self.add_route(gateway_id, path, &integration.id).await?;
        self.ensure_stage(gateway_id).await?;
        self.grant_invoke(identity, gateway_id).await?;

        info!(
            gateway = %gateway_id,
            integration = %integration.id,
            identity = %identity.short(),
            "function bound to gateway"
        );
        Ok(BindResult::Created(integration.id))
    }

    async fn add_route(&self, gateway_id: &str, path: &str, integration_id: &str) -> DeployResult<()> {
        let key = route_key(path);
        let target = integration_target(integration_id);
        match self
            .retry
            .run("create_route", || self.gateway.create_route(gateway_id, &key, &target))
            .await
        {
            Ok(route) => {
                debug!(gateway = %gateway_id, route = %route.id, route_key = %key, "route created");
                Ok(())
            }
            // A concurrent deployment of the same identity got there first.
            Err(ProviderError::AlreadyExists(_)) => {
                warn!(gateway = %gateway_id, route_key = %key, "route already exists, leaving it bound as is");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Make sure the auto-deploying default stage exists.
    pub async fn ensure_stage(&self, gateway_id: &str) -> DeployResult<()> {
        let stages = self
            .retry
            .run("get_stages", || self.gateway.get_stages(gateway_id))
            .await?;
        if stages.iter().any(|s| s.name == DEFAULT_STAGE) {
            return Ok(());
        }
        match self
            .retry
            .run("create_stage", || {
                self.gateway.create_stage(gateway_id, DEFAULT_STAGE, true)
            })
            .await
        {
            Ok(_) => {
                debug!(gateway = %gateway_id, "default stage created");
                Ok(())
            }
            Err(ProviderError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Let the gateway invoke the function of `identity`.
    ///
    /// The statement id is the identity, so granting twice is a no-op.
    pub async fn grant_invoke(&self, identity: &FunctionIdentity, gateway_id: &str) -> DeployResult<()> {
        let grant = PermissionGrant {
            function_name: function_name(&self.function_prefix, identity),
            statement_id: identity.to_string(),
            action: INVOKE_ACTION.to_string(),
            principal: GATEWAY_PRINCIPAL.to_string(),
            source_arn: permission_source_arn(&self.region, &self.account_id, gateway_id),
        };
        match self
            .retry
            .run("add_permission", || self.compute.add_permission(&grant))
            .await
        {
            Ok(()) => Ok(()),
            Err(ProviderError::AlreadyExists(_)) => {
                debug!(function = %grant.function_name, "invoke permission already granted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
