//! Shared fixtures for orchestrator integration tests.
//!
//! `RecordingCloud` wraps the embedded control plane, counts every provider
//! call by method name, and can be told to fail or stall function creation
//! for chosen identities. `UnreadableStore` is a bootstrap store whose
//! reads always fail.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, PutResult,
};

use sfj_core::config::SfjConfig;
use sfj_core::naming::function_name;
use sfj_core::{
    ApiRecord, ContentHasher, FunctionRecord, FunctionSpec, Integration, PermissionGrant, Route,
    Stage,
};
use sfj_deploy::DeploymentOrchestrator;
use sfj_local::LocalCloud;
use sfj_provider::{
    ComputeApi, GatewayApi, IdentityApi, ProviderClients, ProviderError, ProviderResult,
};

pub const ACCOUNT_ID: &str = "123456789012";
pub const REGION: &str = "us-east-2";
pub const STORE: &str = "storecomponents";

pub struct RecordingCloud {
    pub local: LocalCloud,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<String>>,
    stalled: Mutex<HashMap<String, Duration>>,
    stale_stages: AtomicBool,
}

impl RecordingCloud {
    pub fn new() -> Self {
        Self {
            local: LocalCloud::open_in_memory(REGION, ACCOUNT_ID).unwrap(),
            calls: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            stalled: Mutex::new(HashMap::new()),
            stale_stages: AtomicBool::new(false),
        }
    }

    /// Number of calls made to `method` so far.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    /// Make `create_function` fail fatally for this payload.
    pub fn fail_payload(&self, payload: &[u8]) {
        self.failing.lock().unwrap().insert(name_for(payload));
    }

    /// Make `create_function` sleep before answering for this payload.
    pub fn stall_payload(&self, payload: &[u8], delay: Duration) {
        self.stalled.lock().unwrap().insert(name_for(payload), delay);
    }

    /// Make `get_stages` report no stages, as an out-of-date listing would.
    pub fn hide_stages(&self) {
        self.stale_stages.store(true, Ordering::SeqCst);
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
    }
}

fn name_for(payload: &[u8]) -> String {
    function_name("sfj-", &ContentHasher::hash(payload))
}

#[async_trait]
impl ComputeApi for RecordingCloud {
    async fn create_function(&self, spec: &FunctionSpec) -> ProviderResult<FunctionRecord> {
        self.record("create_function");
        let delay = self.stalled.lock().unwrap().get(&spec.name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&spec.name) {
            return Err(ProviderError::Fatal(format!("injected failure for {}", spec.name)));
        }
        self.local.create_function(spec).await
    }

    async fn get_function(&self, name: &str) -> ProviderResult<FunctionRecord> {
        self.record("get_function");
        self.local.get_function(name).await
    }

    async fn list_functions(&self) -> ProviderResult<Vec<FunctionRecord>> {
        self.record("list_functions");
        self.local.list_functions().await
    }

    async fn update_function_code(&self, name: &str, code: Bytes) -> ProviderResult<FunctionRecord> {
        self.record("update_function_code");
        self.local.update_function_code(name, code).await
    }

    async fn add_permission(&self, grant: &PermissionGrant) -> ProviderResult<()> {
        self.record("add_permission");
        self.local.add_permission(grant).await
    }
}

#[async_trait]
impl GatewayApi for RecordingCloud {
    async fn create_api(&self, name: &str) -> ProviderResult<ApiRecord> {
        self.record("create_api");
        self.local.create_api(name).await
    }

    async fn get_integrations(&self, api_id: &str) -> ProviderResult<Vec<Integration>> {
        self.record("get_integrations");
        self.local.get_integrations(api_id).await
    }

    async fn create_integration(&self, api_id: &str, target_uri: &str) -> ProviderResult<Integration> {
        self.record("create_integration");
        self.local.create_integration(api_id, target_uri).await
    }

    async fn get_routes(&self, api_id: &str) -> ProviderResult<Vec<Route>> {
        self.record("get_routes");
        self.local.get_routes(api_id).await
    }

    async fn create_route(&self, api_id: &str, route_key: &str, target: &str) -> ProviderResult<Route> {
        self.record("create_route");
        self.local.create_route(api_id, route_key, target).await
    }

    async fn get_stages(&self, api_id: &str) -> ProviderResult<Vec<Stage>> {
        self.record("get_stages");
        if self.stale_stages.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        self.local.get_stages(api_id).await
    }

    async fn create_stage(&self, api_id: &str, name: &str, auto_deploy: bool) -> ProviderResult<Stage> {
        self.record("create_stage");
        self.local.create_stage(api_id, name, auto_deploy).await
    }
}

#[async_trait]
impl IdentityApi for RecordingCloud {
    async fn caller_account(&self) -> ProviderResult<String> {
        self.record("caller_account");
        self.local.caller_account().await
    }
}

/// Object store that accepts writes but fails every read.
#[derive(Debug)]
pub struct UnreadableStore {
    inner: InMemory,
}

impl UnreadableStore {
    pub fn new() -> Self {
        Self {
            inner: InMemory::new(),
        }
    }
}

impl fmt::Display for UnreadableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnreadableStore")
    }
}

#[async_trait]
impl ObjectStore for UnreadableStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(&self, _location: &ObjectPath, _options: GetOptions) -> object_store::Result<GetResult> {
        Err(object_store::Error::Generic {
            store: "UnreadableStore",
            source: "access denied".into(),
        })
    }

    async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&ObjectPath>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&ObjectPath>) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

/// Defaults with retries disabled so injected failures surface at once.
pub fn test_config() -> SfjConfig {
    let mut config = SfjConfig::default();
    config.retry.max_attempts = 1;
    config
}

pub struct Harness {
    pub cloud: Arc<RecordingCloud>,
    pub store: Arc<InMemory>,
    pub orchestrator: DeploymentOrchestrator,
}

impl Harness {
    pub async fn new(config: SfjConfig) -> Self {
        let cloud = Arc::new(RecordingCloud::new());
        let store = Arc::new(InMemory::new());
        let orchestrator = Self::connect(&config, &cloud, &store).await;
        Self {
            cloud,
            store,
            orchestrator,
        }
    }

    /// A second orchestrator over the same cloud and bootstrap store, as a
    /// later process would see them.
    pub async fn reconnect(&self, config: SfjConfig) -> DeploymentOrchestrator {
        Self::connect(&config, &self.cloud, &self.store).await
    }

    async fn connect(
        config: &SfjConfig,
        cloud: &Arc<RecordingCloud>,
        store: &Arc<InMemory>,
    ) -> DeploymentOrchestrator {
        DeploymentOrchestrator::connect(
            config,
            STORE,
            ProviderClients::shared(cloud.clone()),
            store.clone(),
        )
        .await
        .unwrap()
    }

    /// The single gateway recorded for the store account.
    pub fn gateway_id(&self) -> String {
        let apis = self.cloud.local.list_apis().unwrap();
        assert_eq!(apis.len(), 1, "expected exactly one gateway");
        apis[0].id.clone()
    }
}

pub fn payload(text: &str) -> Bytes {
    Bytes::from(text.as_bytes().to_vec())
}
