use std::path::Path;
use std::sync::Arc;

use sfj_deploy::FunctionRegistry;
use sfj_provider::RetryPolicy;

use super::{load_config, open_local_cloud};

pub async fn list(state: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let cloud = Arc::new(open_local_cloud(state, &config)?);
    let registry = FunctionRegistry::new(
        cloud,
        &config.function.name_prefix,
        RetryPolicy::from(&config.retry),
    );

    let functions = registry.list().await?;
    if functions.is_empty() {
        println!("No functions deployed.");
        return Ok(());
    }
    for f in &functions {
        println!("{}  rev {}  {}", f.name, f.revision, f.description);
    }
    println!("{} function(s)", functions.len());
    Ok(())
}
