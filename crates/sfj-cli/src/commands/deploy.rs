use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use tokio::sync::watch;
use tracing::{info, warn};
use walkdir::WalkDir;

use sfj_core::FunctionArtifact;
use sfj_deploy::DeploymentOrchestrator;
use sfj_provider::ProviderClients;

use super::{load_config, open_local_cloud};
use crate::manifest;

pub struct DeployArgs {
    pub dir: PathBuf,
    pub account: String,
    pub config: Option<PathBuf>,
    pub state: PathBuf,
    pub bootstrap_dir: PathBuf,
    pub redirects: PathBuf,
}

pub async fn deploy(args: &DeployArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let artifacts = collect_artifacts(&args.dir)?;
    if artifacts.is_empty() {
        warn!(dir = %args.dir.display(), "no bundles found");
    }

    let cloud = Arc::new(open_local_cloud(&args.state, &config)?);
    let bucket = args.bootstrap_dir.join(&config.bootstrap.bucket);
    std::fs::create_dir_all(&bucket)
        .with_context(|| format!("creating bootstrap store {}", bucket.display()))?;
    let bootstrap = Arc::new(LocalFileSystem::new_with_prefix(&bucket)?);

    let orchestrator = DeploymentOrchestrator::connect(
        &config,
        &args.account,
        ProviderClients::shared(cloud),
        bootstrap,
    )
    .await?;

    // Ctrl-C cancels whatever has not finished yet.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling deployment");
            let _ = cancel_tx.send(true);
        }
    });

    let report = orchestrator.deploy_many_report(artifacts, cancel_rx).await;

    for (name, deployment) in &report.deployed {
        println!("✓ {name}  {}  ({})", deployment.url, deployment.function.label());
    }
    for (name, reason) in &report.failed {
        eprintln!("✗ {name}: {reason}");
    }

    let urls = report.urls();
    manifest::write(&args.redirects, &urls)?;
    println!(
        "{} deployed, {} failed. Redirects written to {}",
        report.deployed.len(),
        report.failed.len(),
        args.redirects.display()
    );

    if !report.is_complete() {
        anyhow::bail!("{} bundle(s) failed to deploy", report.failed.len());
    }
    Ok(())
}

/// Every `*.zip` directly inside `dir`, named by file stem, in name order.
///
/// Subdirectories are not searched, so stems (and manifest keys) are unique.
fn collect_artifacts(dir: &Path) -> anyhow::Result<Vec<FunctionArtifact>> {
    let mut artifacts = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "zip") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!(path = %path.display(), "skipping bundle with non-UTF-8 name");
            continue;
        };
        let payload = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        artifacts.push(FunctionArtifact::new(name, Bytes::from(payload)));
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfj_core::config::SfjConfig;
    use sfj_provider::ComputeApi;

    #[test]
    fn collects_only_top_level_zip_bundles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("home.zip"), b"home").unwrap();
        std::fs::write(dir.path().join("cart.zip"), b"cart").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/home.zip"), b"other home").unwrap();

        let artifacts = collect_artifacts(dir.path()).unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["cart", "home"]);
        assert_eq!(artifacts[1].payload, Bytes::from_static(b"home"));
    }

    #[tokio::test]
    async fn deploys_directory_and_writes_redirects() {
        let work = tempfile::tempdir().unwrap();
        let dist = work.path().join("dist");
        std::fs::create_dir(&dist).unwrap();
        std::fs::write(dist.join("a.zip"), b"bundle a").unwrap();
        std::fs::write(dist.join("b.zip"), b"bundle b").unwrap();
        std::fs::create_dir(dist.join("nested")).unwrap();
        std::fs::write(dist.join("nested/a.zip"), b"shadowing a").unwrap();

        let args = DeployArgs {
            dir: dist,
            account: "storecomponents".to_string(),
            config: None,
            state: work.path().join("state/cloud.redb"),
            bootstrap_dir: work.path().join("bootstrap"),
            redirects: work.path().join("out/redirects.json"),
        };
        deploy(&args).await.unwrap();

        let written = std::fs::read_to_string(&args.redirects).unwrap();
        let urls: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&written).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls["a"].as_str().unwrap().starts_with("https://"));

        // The nested bundle is not deployed.
        let cloud = open_local_cloud(&args.state, &SfjConfig::default()).unwrap();
        assert_eq!(cloud.list_functions().await.unwrap().len(), 2);
        assert!(
            work.path()
                .join("bootstrap/sfj-functions/storecomponents")
                .exists()
        );
    }
}
