pub mod deploy;
pub mod hash;
pub mod list;

use std::path::Path;

use sfj_core::SfjConfig;
use sfj_local::LocalCloud;

/// Fallback account for the local control plane when none is configured.
const LOCAL_ACCOUNT_ID: &str = "000000000000";

pub fn load_config(path: Option<&Path>) -> anyhow::Result<SfjConfig> {
    match path {
        Some(path) => SfjConfig::from_file(path),
        None => Ok(SfjConfig::default()),
    }
}

/// Open the on-disk control plane, creating its parent directory.
pub fn open_local_cloud(state: &Path, config: &SfjConfig) -> anyhow::Result<LocalCloud> {
    if let Some(parent) = state.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let account = config
        .provider
        .account_id
        .as_deref()
        .unwrap_or(LOCAL_ACCOUNT_ID);
    Ok(LocalCloud::open(state, &config.provider.region, account)?)
}
