//! Provider trait implementations for [`LocalCloud`].
//!
//! Conflict and not-found behavior follows the remote control plane:
//! functions, routes, stages, and permission statements are unique by name;
//! integrations are not deduplicated.
//!
//! redb transactions block, so every call runs on the blocking pool via
//! [`LocalCloud::blocking`] and never stalls a runtime worker.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use sfj_core::naming::{function_arn, gateway_endpoint};
use sfj_core::{
    ApiRecord, ContentHasher, FunctionRecord, FunctionSpec, Integration, PermissionGrant, Route,
    Stage,
};
use sfj_provider::{ComputeApi, GatewayApi, IdentityApi, ProviderError, ProviderResult};

use crate::store::{LocalCloud, epoch_secs, new_resource_id};
use crate::tables::*;

const DOMAIN: &str = "amazonaws.com";

impl LocalCloud {
    /// Run `op` against a clone of this control plane on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> ProviderResult<T>
    where
        T: Send + 'static,
        F: FnOnce(LocalCloud) -> ProviderResult<T> + Send + 'static,
    {
        let cloud = self.clone();
        tokio::task::spawn_blocking(move || op(cloud))
            .await
            .map_err(|e| ProviderError::Fatal(format!("local control plane task failed: {e}")))?
    }

    fn require_api(&self, api_id: &str) -> ProviderResult<()> {
        match self.get_record::<ApiRecord>(APIS, api_id)? {
            Some(_) => Ok(()),
            None => Err(ProviderError::NotFound(format!("api {api_id}"))),
        }
    }

    // ── Compute ────────────────────────────────────────────────────

    fn insert_function(&self, spec: &FunctionSpec) -> ProviderResult<FunctionRecord> {
        let record = FunctionRecord {
            name: spec.name.clone(),
            arn: function_arn(self.region(), self.account_id(), &spec.name),
            description: spec.description.clone(),
            role: spec.role.clone(),
            runtime: spec.runtime.clone(),
            handler: spec.handler.clone(),
            timeout_secs: spec.timeout_secs,
            tracing: spec.tracing,
            tags: spec.tags.clone(),
            revision: 1,
            code_sha: ContentHasher::hash(&spec.code).to_string(),
            code_size: spec.code.len() as u64,
            last_modified: epoch_secs(),
        };
        if !self.insert_new(FUNCTIONS, &spec.name, &record)? {
            return Err(ProviderError::AlreadyExists(format!(
                "function already exists: {}",
                spec.name
            )));
        }
        info!(function = %spec.name, size = record.code_size, "function created");
        Ok(record)
    }

    fn read_function(&self, name: &str) -> ProviderResult<FunctionRecord> {
        self.get_record(FUNCTIONS, name)?
            .ok_or_else(|| ProviderError::NotFound(format!("function {name}")))
    }

    fn replace_code(&self, name: &str, code: &Bytes) -> ProviderResult<FunctionRecord> {
        let code_sha = ContentHasher::hash(code).to_string();
        let updated = self.update_record(FUNCTIONS, name, |record: &mut FunctionRecord| {
            record.revision += 1;
            record.code_sha = code_sha;
            record.code_size = code.len() as u64;
            record.last_modified = epoch_secs();
        })?;
        let record = updated.ok_or_else(|| ProviderError::NotFound(format!("function {name}")))?;
        info!(function = %name, revision = record.revision, "function code updated");
        Ok(record)
    }

    fn insert_permission(&self, grant: &PermissionGrant) -> ProviderResult<()> {
        if self
            .get_record::<FunctionRecord>(FUNCTIONS, &grant.function_name)?
            .is_none()
        {
            return Err(ProviderError::NotFound(format!(
                "function {}",
                grant.function_name
            )));
        }
        let key = child_key(&grant.function_name, &grant.statement_id);
        if !self.insert_new(PERMISSIONS, &key, grant)? {
            return Err(ProviderError::AlreadyExists(format!(
                "statement id {} already exists on {}",
                grant.statement_id, grant.function_name
            )));
        }
        debug!(function = %grant.function_name, statement = %grant.statement_id, "permission added");
        Ok(())
    }

    // ── Gateway ────────────────────────────────────────────────────

    fn insert_api(&self, name: &str) -> ProviderResult<ApiRecord> {
        let id = new_resource_id();
        let record = ApiRecord {
            endpoint: gateway_endpoint(&id, self.region(), DOMAIN),
            id,
            name: name.to_string(),
            protocol_type: "HTTP".to_string(),
        };
        if !self.insert_new(APIS, &record.id, &record)? {
            return Err(ProviderError::Transient(format!("api id collision: {}", record.id)));
        }
        info!(api = %record.id, %name, "api created");
        Ok(record)
    }

    fn children<T: serde::de::DeserializeOwned>(
        &self,
        table: JsonTable,
        api_id: &str,
    ) -> ProviderResult<Vec<T>> {
        self.require_api(api_id)?;
        Ok(self.scan_records(table, &child_prefix(api_id))?)
    }

    fn insert_integration(&self, api_id: &str, target_uri: &str) -> ProviderResult<Integration> {
        self.require_api(api_id)?;
        let integration = Integration {
            id: new_resource_id(),
            integration_type: "AWS_PROXY".to_string(),
            target_uri: target_uri.to_string(),
            payload_format_version: "2.0".to_string(),
        };
        let key = child_key(api_id, &integration.id);
        if !self.insert_new(INTEGRATIONS, &key, &integration)? {
            return Err(ProviderError::Transient(format!(
                "integration id collision: {}",
                integration.id
            )));
        }
        debug!(api = %api_id, integration = %integration.id, target = %target_uri, "integration created");
        Ok(integration)
    }

    fn insert_route(&self, api_id: &str, route_key: &str, target: &str) -> ProviderResult<Route> {
        self.require_api(api_id)?;
        let route = Route {
            id: new_resource_id(),
            route_key: route_key.to_string(),
            target: target.to_string(),
        };
        if !self.insert_new(ROUTES, &child_key(api_id, route_key), &route)? {
            return Err(ProviderError::AlreadyExists(format!(
                "route {route_key} already exists on api {api_id}"
            )));
        }
        debug!(api = %api_id, %route_key, %target, "route created");
        Ok(route)
    }

    fn insert_stage(&self, api_id: &str, name: &str, auto_deploy: bool) -> ProviderResult<Stage> {
        self.require_api(api_id)?;
        let stage = Stage {
            name: name.to_string(),
            auto_deploy,
        };
        if !self.insert_new(STAGES, &child_key(api_id, name), &stage)? {
            return Err(ProviderError::AlreadyExists(format!(
                "stage {name} already exists on api {api_id}"
            )));
        }
        debug!(api = %api_id, stage = %name, "stage created");
        Ok(stage)
    }
}

#[async_trait]
impl ComputeApi for LocalCloud {
    async fn create_function(&self, spec: &FunctionSpec) -> ProviderResult<FunctionRecord> {
        let spec = spec.clone();
        self.blocking(move |cloud| cloud.insert_function(&spec)).await
    }

    async fn get_function(&self, name: &str) -> ProviderResult<FunctionRecord> {
        let name = name.to_string();
        self.blocking(move |cloud| cloud.read_function(&name)).await
    }

    async fn list_functions(&self) -> ProviderResult<Vec<FunctionRecord>> {
        self.blocking(|cloud| Ok(cloud.scan_records(FUNCTIONS, "")?)).await
    }

    async fn update_function_code(&self, name: &str, code: Bytes) -> ProviderResult<FunctionRecord> {
        let name = name.to_string();
        self.blocking(move |cloud| cloud.replace_code(&name, &code)).await
    }

    async fn add_permission(&self, grant: &PermissionGrant) -> ProviderResult<()> {
        let grant = grant.clone();
        self.blocking(move |cloud| cloud.insert_permission(&grant)).await
    }
}

#[async_trait]
impl GatewayApi for LocalCloud {
    async fn create_api(&self, name: &str) -> ProviderResult<ApiRecord> {
        let name = name.to_string();
        self.blocking(move |cloud| cloud.insert_api(&name)).await
    }

    async fn get_integrations(&self, api_id: &str) -> ProviderResult<Vec<Integration>> {
        let api_id = api_id.to_string();
        self.blocking(move |cloud| cloud.children(INTEGRATIONS, &api_id)).await
    }

    async fn create_integration(&self, api_id: &str, target_uri: &str) -> ProviderResult<Integration> {
        let (api_id, target_uri) = (api_id.to_string(), target_uri.to_string());
        self.blocking(move |cloud| cloud.insert_integration(&api_id, &target_uri))
            .await
    }

    async fn get_routes(&self, api_id: &str) -> ProviderResult<Vec<Route>> {
        let api_id = api_id.to_string();
        self.blocking(move |cloud| cloud.children(ROUTES, &api_id)).await
    }

    async fn create_route(&self, api_id: &str, route_key: &str, target: &str) -> ProviderResult<Route> {
        let (api_id, route_key, target) =
            (api_id.to_string(), route_key.to_string(), target.to_string());
        self.blocking(move |cloud| cloud.insert_route(&api_id, &route_key, &target))
            .await
    }

    async fn get_stages(&self, api_id: &str) -> ProviderResult<Vec<Stage>> {
        let api_id = api_id.to_string();
        self.blocking(move |cloud| cloud.children(STAGES, &api_id)).await
    }

    async fn create_stage(&self, api_id: &str, name: &str, auto_deploy: bool) -> ProviderResult<Stage> {
        let (api_id, name) = (api_id.to_string(), name.to_string());
        self.blocking(move |cloud| cloud.insert_stage(&api_id, &name, auto_deploy))
            .await
    }
}

#[async_trait]
impl IdentityApi for LocalCloud {
    async fn caller_account(&self) -> ProviderResult<String> {
        Ok(self.account_id().to_string())
    }
}
