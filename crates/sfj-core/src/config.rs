//! sfj.toml configuration parser.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfjConfig {
    pub provider: ProviderConfig,
    pub function: FunctionConfig,
    pub bootstrap: BootstrapConfig,
    pub deploy: DeployConfig,
    pub retry: RetryConfig,
}

/// Account/region pair every component is constructed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub region: String,
    /// Resolved from the caller identity when absent.
    pub account_id: Option<String>,
    /// Execution role resource, relative to `arn:aws:iam::{account}:role/`.
    pub role_resource: String,
    pub domain: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: "us-east-2".to_string(),
            account_id: None,
            role_resource: "service-role/any".to_string(),
            domain: "amazonaws.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    pub name_prefix: String,
    pub runtime: String,
    pub handler: String,
    pub timeout_secs: u32,
    pub tracing: bool,
    pub description_prefix: String,
    pub tags: BTreeMap<String, String>,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            name_prefix: "sfj-".to_string(),
            runtime: "nodejs12.x".to_string(),
            handler: "index.handler".to_string(),
            timeout_secs: 15,
            tracing: true,
            description_prefix: "SF Function".to_string(),
            tags: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Bucket holding one `{account}` object per store account.
    pub bucket: String,
    pub gateway_name_prefix: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            bucket: "sfj-functions".to_string(),
            gateway_name_prefix: "sfj-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub max_concurrency: usize,
    pub artifact_timeout_secs: u64,
    /// Re-upload code for identities the registry already knows.
    pub force_update: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            artifact_timeout_secs: 300,
            force_update: false,
        }
    }
}

impl DeployConfig {
    pub fn artifact_timeout(&self) -> Duration {
        Duration::from_secs(self.artifact_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

impl SfjConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: SfjConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider.region.is_empty() {
            bail!("provider.region must not be empty");
        }
        if self.provider.account_id.as_deref() == Some("") {
            bail!("provider.account_id must not be empty when set");
        }
        if self.function.name_prefix.is_empty() {
            bail!("function.name_prefix must not be empty");
        }
        if self.bootstrap.bucket.is_empty() {
            bail!("bootstrap.bucket must not be empty");
        }
        if self.deploy.max_concurrency == 0 {
            bail!("deploy.max_concurrency must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        Ok(())
    }
}

impl FromStr for SfjConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> anyhow::Result<Self> {
        Self::parse(content)
    }
}
