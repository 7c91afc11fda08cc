// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use upgrade_repo::config::Config;
use upgrade_repo::kubernetes::{ensure_namespace_exists, wait_for_crd};
use upgrade_repo::reconcilers::UpgradeReconciler;
use upgrade_repo::release::ReleaseFetcher;
use upgrade_repo::repo::{ApiImageResolver, Bootstrapper};
use upgrade_repo::types::{Upgrade, VirtualMachine, VirtualMachineImage};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting upgrade repo controller");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: upgrade_namespace={}, fetch_timeout={:?}",
        config.upgrade_namespace, config.fetch_timeout
    );
    if let Some(endpoint) = &config.repo_endpoint {
        warn!(
            "Reading all repos from {}:{} instead of their services",
            endpoint.host(),
            endpoint.port()
        );
    }

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // The repo needs Harvester upgrades and images plus KubeVirt VMs
    info!("Waiting for upgrade CRDs to become available...");
    wait_for_crd::<Upgrade>(&client).await?;
    wait_for_crd::<VirtualMachineImage>(&client).await?;
    wait_for_crd::<VirtualMachine>(&client).await?;

    ensure_namespace_exists(&client, &config.upgrade_namespace).await?;

    let cancel = CancellationToken::new();
    let bootstrapper = Bootstrapper::new(
        client.clone(),
        ApiImageResolver::new(client.clone()),
        config.upgrade_namespace.clone(),
    );
    let fetcher = ReleaseFetcher::new(config.fetcher_config())?;
    let reconciler = UpgradeReconciler::new(client, bootstrapper, fetcher, cancel.clone())
        .with_repo_endpoint(config.repo_endpoint.clone());

    info!("Starting upgrade reconciler...");

    tokio::select! {
        res = reconciler.run() => {
            res?;
            // This should never be reached as the reconciler runs forever
            warn!("Upgrade reconciler stopped unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down, cancelling in-flight repo requests");
            cancel.cancel();
        }
    }

    Ok(())
}
