// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Upgrade reconciler - bootstraps the upgrade repo and reads the release back.

use crate::constants::requeue;
use crate::error::{Result, UpgradeRepoError};
use crate::release::{ReleaseFetcher, RepoEndpoint};
use crate::repo::{ApiImageResolver, Bootstrapper};
use crate::types::{Upgrade, VirtualMachine};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct UpgradeReconciler {
    client: Client,
    bootstrapper: Bootstrapper<ApiImageResolver>,
    fetcher: ReleaseFetcher,
    repo_endpoint: Option<RepoEndpoint>,
    cancel: CancellationToken,
}

impl UpgradeReconciler {
    pub fn new(
        client: Client,
        bootstrapper: Bootstrapper<ApiImageResolver>,
        fetcher: ReleaseFetcher,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            bootstrapper,
            fetcher,
            repo_endpoint: None,
            cancel,
        }
    }

    /// Read every repo from a fixed endpoint instead of its Service
    pub fn with_repo_endpoint(mut self, endpoint: Option<RepoEndpoint>) -> Self {
        self.repo_endpoint = endpoint;
        self
    }

    pub async fn run(self) -> anyhow::Result<()> {
        // Repo resources are owned by their upgrade, so both live in one namespace
        let upgrades: Api<Upgrade> =
            Api::namespaced(self.client.clone(), self.bootstrapper.namespace());
        let vms: Api<VirtualMachine> =
            Api::namespaced(self.client.clone(), self.bootstrapper.namespace());
        let context = Arc::new(self);

        // Repo VMs are owned by their upgrade, so readiness changes wake it up
        Controller::new(upgrades, WatcherConfig::default())
            .owns(vms, WatcherConfig::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled upgrade: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(upgrade: Arc<Upgrade>, ctx: Arc<UpgradeReconciler>) -> Result<Action> {
    let name = upgrade.name_any();

    if upgrade.metadata.deletion_timestamp.is_some() {
        debug!("Upgrade {} is being deleted, skipping", name);
        return Ok(Action::await_change());
    }

    if upgrade.image_id().is_none() {
        debug!("Upgrade {} has no image yet, skipping", name);
        return Ok(Action::await_change());
    }

    debug!("Reconciling upgrade: {}", name);
    ctx.bootstrapper.ensure(&upgrade).await?;

    let identity = ctx.bootstrapper.identity(&upgrade)?;
    let vms: Api<VirtualMachine> = Api::namespaced(ctx.client.clone(), identity.namespace());
    let repo_ready = vms
        .get_opt(&identity.repo_name())
        .await?
        .is_some_and(|vm| vm.is_ready());

    if !repo_ready {
        info!("Upgrade repo {} is not ready yet", identity.repo_name());
        return Ok(Action::requeue(Duration::from_secs(requeue::TRANSIENT_SECS)));
    }

    let endpoint = ctx
        .repo_endpoint
        .clone()
        .unwrap_or_else(|| ctx.bootstrapper.endpoint(&identity));
    let repo_info = ctx
        .fetcher
        .fetch_string(&endpoint, &ctx.cancel.child_token())
        .await?;
    info!("Upgrade {} repo info:\n{}", name, repo_info);

    Ok(Action::await_change())
}

fn requeue_delay(error: &UpgradeRepoError) -> Duration {
    if error.is_transient() {
        Duration::from_secs(requeue::TRANSIENT_SECS)
    } else {
        Duration::from_secs(requeue::FATAL_SECS)
    }
}

fn error_policy(
    upgrade: Arc<Upgrade>,
    error: &UpgradeRepoError,
    _ctx: Arc<UpgradeReconciler>,
) -> Action {
    if error.is_transient() {
        warn!("Upgrade {} repo not available yet: {}", upgrade.name_any(), error);
    } else {
        error!("Upgrade {} repo failed: {}", upgrade.name_any(), error);
    }
    Action::requeue(requeue_delay(error))
}
