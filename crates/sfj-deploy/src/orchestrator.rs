//! DeploymentOrchestrator — drives hash → publish → bootstrap → bind → URL.
//!
//! Each artifact is deployed independently. `deploy_many` fans out over a
//! bounded number of concurrent deployments and returns whatever subset
//! succeeded; a failed artifact is simply absent from the result map.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use object_store::ObjectStore;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use sfj_core::config::{DeployConfig, SfjConfig};
use sfj_core::naming::function_url;
use sfj_core::{FunctionArtifact, FunctionIdentity};
use sfj_provider::{ProviderClients, RetryPolicy};

use crate::error::{DeployError, DeployResult};
use crate::gateway::GatewayStore;
use crate::publisher::{FunctionPublisher, FunctionRegistry, PublishResult};
use crate::routes::{BindResult, RouteBinder};

/// Fan-out and refresh behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    pub max_concurrency: usize,
    /// Deadline for one artifact, counted from when it starts running.
    pub artifact_timeout: Duration,
    pub force_update: bool,
}

impl From<&DeployConfig> for DeployOptions {
    fn from(cfg: &DeployConfig) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency.max(1),
            artifact_timeout: cfg.artifact_timeout(),
            force_update: cfg.force_update,
        }
    }
}

/// One successfully deployed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub name: String,
    pub identity: FunctionIdentity,
    pub gateway_id: String,
    pub function: PublishResult,
    pub binding: BindResult,
    pub url: String,
}

/// Outcome of a batch. Every input name lands in exactly one map.
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    pub deployed: BTreeMap<String, Deployment>,
    pub failed: BTreeMap<String, String>,
}

impl DeployReport {
    /// `name → url` for the successful subset.
    pub fn urls(&self) -> BTreeMap<String, String> {
        self.deployed
            .iter()
            .map(|(name, d)| (name.clone(), d.url.clone()))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

struct Inner {
    store_account: String,
    account_id: String,
    region: String,
    domain: String,
    options: DeployOptions,
    publisher: FunctionPublisher,
    registry: FunctionRegistry,
    gateways: GatewayStore,
    binder: RouteBinder,
}

/// Deploys function artifacts for one store account.
///
/// Cheap to clone; clones share the gateway bootstrap state.
#[derive(Clone)]
pub struct DeploymentOrchestrator {
    inner: Arc<Inner>,
}

impl DeploymentOrchestrator {
    /// Build an orchestrator, resolving the provider account id once.
    ///
    /// `bootstrap` is the object store holding the per-account gateway
    /// records (the configured bootstrap bucket).
    pub async fn connect(
        config: &SfjConfig,
        store_account: &str,
        clients: ProviderClients,
        bootstrap: Arc<dyn ObjectStore>,
    ) -> DeployResult<Self> {
        if store_account.is_empty() || store_account.contains('/') {
            return Err(DeployError::InvalidAccount(store_account.to_string()));
        }
        let retry = RetryPolicy::from(&config.retry);
        let account_id = match &config.provider.account_id {
            Some(id) => id.clone(),
            None => {
                retry
                    .run("caller_account", || clients.identity.caller_account())
                    .await?
            }
        };
        info!(
            %store_account,
            %account_id,
            region = %config.provider.region,
            "deployment orchestrator ready"
        );

        let prefix = &config.function.name_prefix;
        let inner = Inner {
            store_account: store_account.to_string(),
            region: config.provider.region.clone(),
            domain: config.provider.domain.clone(),
            options: DeployOptions::from(&config.deploy),
            publisher: FunctionPublisher::new(
                clients.compute.clone(),
                &account_id,
                &config.provider,
                &config.function,
                retry.clone(),
            ),
            registry: FunctionRegistry::new(clients.compute.clone(), prefix, retry.clone()),
            gateways: GatewayStore::new(
                bootstrap,
                clients.gateway.clone(),
                &config.bootstrap.gateway_name_prefix,
                retry.clone(),
            ),
            binder: RouteBinder::new(
                clients.gateway.clone(),
                clients.compute.clone(),
                &account_id,
                &config.provider,
                prefix,
                retry,
            ),
            account_id,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn account_id(&self) -> &str {
        &self.inner.account_id
    }

    pub fn store_account(&self) -> &str {
        &self.inner.store_account
    }

    pub fn options(&self) -> &DeployOptions {
        &self.inner.options
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.inner.registry
    }

    pub fn gateways(&self) -> &GatewayStore {
        &self.inner.gateways
    }

    /// Deploy one payload and return its public URL.
    pub async fn deploy_one(&self, name: &str, payload: Bytes) -> DeployResult<String> {
        let artifact = FunctionArtifact::new(name, payload);
        let identity = artifact.identity();
        let refresh = self.inner.options.force_update
            && self.inner.registry.deployed_identities().await?.contains(&identity);
        let timeout = self.inner.options.artifact_timeout;
        let deployment = tokio::time::timeout(timeout, self.deploy_identified(&artifact, identity, refresh))
            .await
            .map_err(|_| DeployError::Timeout {
                name: name.to_string(),
                timeout,
            })??;
        Ok(deployment.url)
    }

    /// Deploy one artifact. With `refresh`, the code of an already-deployed
    /// identity is re-uploaded instead of creating the function.
    pub async fn deploy_artifact(&self, artifact: &FunctionArtifact, refresh: bool) -> DeployResult<Deployment> {
        self.deploy_identified(artifact, artifact.identity(), refresh).await
    }

    async fn deploy_identified(
        &self,
        artifact: &FunctionArtifact,
        identity: FunctionIdentity,
        refresh: bool,
    ) -> DeployResult<Deployment> {
        let inner = &self.inner;
        info!(
            name = %artifact.name,
            identity = %identity,
            size = artifact.payload.len(),
            "deploying function"
        );

        let function = if refresh {
            inner.publisher.update(&identity, &artifact.payload).await?
        } else {
            inner
                .publisher
                .publish(&identity, &artifact.name, &artifact.payload)
                .await?
        };

        let gateway_id = inner.gateways.get_or_create(&inner.store_account).await?;
        let binding = inner
            .binder
            .bind(&identity, identity.as_str(), function.handle(), &gateway_id)
            .await?;

        let url = function_url(&gateway_id, &inner.region, &inner.domain, identity.as_str());
        info!(
            name = %artifact.name,
            %url,
            function = function.label(),
            "function deployed"
        );
        Ok(Deployment {
            name: artifact.name.clone(),
            identity,
            gateway_id,
            function,
            binding,
            url,
        })
    }

    /// Deploy every `name → payload` entry; failed entries are omitted.
    pub async fn deploy_many(&self, artifacts: BTreeMap<String, Bytes>) -> BTreeMap<String, String> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let artifacts = artifacts
            .into_iter()
            .map(|(name, payload)| FunctionArtifact::new(name, payload))
            .collect();
        self.deploy_many_report(artifacts, cancel_rx).await.urls()
    }

    /// Deploy a batch concurrently, reporting successes and failures.
    ///
    /// Sending `true` on the `cancel` channel fails every artifact that has
    /// not finished yet. A name given more than once is failed without
    /// deploying any of its artifacts.
    pub async fn deploy_many_report(
        &self,
        artifacts: Vec<FunctionArtifact>,
        cancel: watch::Receiver<bool>,
    ) -> DeployReport {
        let mut report = DeployReport::default();
        let mut seen = BTreeMap::<String, usize>::new();
        for artifact in &artifacts {
            *seen.entry(artifact.name.clone()).or_default() += 1;
        }
        let (unique, repeated): (Vec<_>, Vec<_>) =
            artifacts.into_iter().partition(|a| seen[&a.name] == 1);
        for artifact in repeated {
            if !report.failed.contains_key(&artifact.name) {
                let e = DeployError::DuplicateName(artifact.name.clone());
                error!(name = %artifact.name, error = %e, "function deployment rejected");
                report.failed.insert(artifact.name, e.to_string());
            }
        }

        let known = Arc::new(self.refreshable_identities().await);
        let semaphore = Arc::new(Semaphore::new(self.inner.options.max_concurrency));
        let names: Vec<String> = unique.iter().map(|a| a.name.clone()).collect();

        let mut tasks = JoinSet::new();
        for artifact in unique {
            let this = self.clone();
            let known = known.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let name = artifact.name.clone();
                let result = this.run_guarded(artifact, &known, &semaphore, cancel).await;
                (name, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(deployment))) => {
                    report.deployed.insert(name, deployment);
                }
                Ok((name, Err(e))) => {
                    error!(%name, error = %e, "function deployment failed");
                    report.failed.insert(name, e.to_string());
                }
                Err(e) => error!(error = %e, "deployment task aborted"),
            }
        }
        for name in names {
            if !report.deployed.contains_key(&name) && !report.failed.contains_key(&name) {
                report.failed.insert(name, "deployment task aborted".to_string());
            }
        }

        info!(
            deployed = report.deployed.len(),
            failed = report.failed.len(),
            "batch deployment finished"
        );
        report
    }

    /// Identities whose code should be re-uploaded in this batch.
    async fn refreshable_identities(&self) -> BTreeSet<FunctionIdentity> {
        if !self.inner.options.force_update {
            return BTreeSet::new();
        }
        match self.inner.registry.deployed_identities().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "could not list deployed functions, publishing without refresh");
                BTreeSet::new()
            }
        }
    }

    async fn run_guarded(
        &self,
        artifact: FunctionArtifact,
        known: &BTreeSet<FunctionIdentity>,
        semaphore: &Semaphore,
        cancel: watch::Receiver<bool>,
    ) -> DeployResult<Deployment> {
        let name = artifact.name.clone();
        let timeout = self.inner.options.artifact_timeout;

        let deploy = async {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| DeployError::Cancelled(name.clone()))?;
            let identity = artifact.identity();
            let refresh = known.contains(&identity);
            tokio::time::timeout(timeout, self.deploy_identified(&artifact, identity, refresh))
                .await
                .unwrap_or_else(|_| {
                    Err(DeployError::Timeout {
                        name: name.clone(),
                        timeout,
                    })
                })
        };

        tokio::select! {
            biased;
            _ = cancelled(cancel) => Err(DeployError::Cancelled(name.clone())),
            result = deploy => result,
        }
    }
}

/// Resolves once `true` is observed on the channel. Never resolves if the
/// sender goes away without cancelling.
async fn cancelled(mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
