//! Control-plane traits.
//!
//! Each method maps onto exactly one provider call. Implementations must
//! report naming conflicts as [`ProviderError::AlreadyExists`] and missing
//! resources as [`ProviderError::NotFound`]; everything else is either
//! `Transient` or `Fatal`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use sfj_core::{ApiRecord, FunctionRecord, FunctionSpec, Integration, PermissionGrant, Route, Stage};

use crate::error::ProviderResult;

/// Compute functions and their invoke permissions.
#[async_trait]
pub trait ComputeApi: Send + Sync + 'static {
    /// Create a function. Fails with `AlreadyExists` if the name is taken.
    async fn create_function(&self, spec: &FunctionSpec) -> ProviderResult<FunctionRecord>;

    /// Fetch a function by name. Fails with `NotFound` if absent.
    async fn get_function(&self, name: &str) -> ProviderResult<FunctionRecord>;

    async fn list_functions(&self) -> ProviderResult<Vec<FunctionRecord>>;

    /// Replace the code of an existing function and publish a new revision.
    async fn update_function_code(&self, name: &str, code: Bytes) -> ProviderResult<FunctionRecord>;

    /// Add a permission statement. Fails with `AlreadyExists` if the
    /// statement id is already attached to the function.
    async fn add_permission(&self, grant: &PermissionGrant) -> ProviderResult<()>;
}

/// HTTP routing front-ends.
#[async_trait]
pub trait GatewayApi: Send + Sync + 'static {
    async fn create_api(&self, name: &str) -> ProviderResult<ApiRecord>;

    async fn get_integrations(&self, api_id: &str) -> ProviderResult<Vec<Integration>>;

    /// Create a proxy integration. The provider does not deduplicate.
    async fn create_integration(&self, api_id: &str, target_uri: &str) -> ProviderResult<Integration>;

    async fn get_routes(&self, api_id: &str) -> ProviderResult<Vec<Route>>;

    /// Fails with `AlreadyExists` if the route key is taken.
    async fn create_route(&self, api_id: &str, route_key: &str, target: &str) -> ProviderResult<Route>;

    async fn get_stages(&self, api_id: &str) -> ProviderResult<Vec<Stage>>;

    /// Fails with `AlreadyExists` if the stage is already present.
    async fn create_stage(&self, api_id: &str, name: &str, auto_deploy: bool) -> ProviderResult<Stage>;
}

/// Who the credentials belong to.
#[async_trait]
pub trait IdentityApi: Send + Sync + 'static {
    async fn caller_account(&self) -> ProviderResult<String>;
}

/// The set of clients one orchestrator runs against.
#[derive(Clone)]
pub struct ProviderClients {
    pub compute: Arc<dyn ComputeApi>,
    pub gateway: Arc<dyn GatewayApi>,
    pub identity: Arc<dyn IdentityApi>,
}

impl ProviderClients {
    /// Use one client that speaks every API.
    pub fn shared<T>(client: Arc<T>) -> Self
    where
        T: ComputeApi + GatewayApi + IdentityApi,
    {
        Self {
            compute: client.clone(),
            gateway: client.clone(),
            identity: client,
        }
    }
}
