// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bootstrapping of the upgrade repo: resolve the ISO image, then create the
//! repo VM and the Service in front of it.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Service;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, info, instrument, warn};

use crate::constants::{image as image_consts, labels};
use crate::error::{Result, UpgradeRepoError};
use crate::release::RepoEndpoint;
use crate::repo::identity::UpgradeIdentity;
use crate::repo::image::{resolve_image_reference, ImageResolver};
use crate::repo::service::build_repo_service;
use crate::repo::vm::build_repo_vm;
use crate::types::{
    ImageSourceType, Upgrade, VirtualMachine, VirtualMachineImage, VirtualMachineImageSpec,
};

/// Creates the repo resources of an upgrade.
///
/// Nothing is rolled back on failure: every object is owned by the upgrade
/// and goes away with it.
pub struct Bootstrapper<R> {
    client: Client,
    resolver: R,
    namespace: String,
}

impl<R: ImageResolver> Bootstrapper<R> {
    pub fn new(client: Client, resolver: R, namespace: impl Into<String>) -> Self {
        Self {
            client,
            resolver,
            namespace: namespace.into(),
        }
    }

    /// Namespace the repo resources are created in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolve the upgrade image and create the repo VM and Service.
    ///
    /// Fails with `AlreadyExists` when the repo of this upgrade was created
    /// before. Does not wait for the VM to become ready.
    #[instrument(skip(self, upgrade), fields(upgrade = %upgrade.name_any()))]
    pub async fn bootstrap(&self, upgrade: &Upgrade) -> Result<()> {
        self.run(upgrade, false).await
    }

    /// Like [`Bootstrapper::bootstrap`], but resources that already exist
    /// count as created, so a half finished bootstrap can be completed.
    #[instrument(skip(self, upgrade), fields(upgrade = %upgrade.name_any()))]
    pub async fn ensure(&self, upgrade: &Upgrade) -> Result<()> {
        self.run(upgrade, true).await
    }

    async fn run(&self, upgrade: &Upgrade, allow_existing: bool) -> Result<()> {
        let image_id = upgrade
            .image_id()
            .ok_or_else(|| UpgradeRepoError::MissingImage(upgrade.name_any()))?;
        let identity = self.identity(upgrade)?;

        let image = resolve_image_reference(&self.resolver, image_id).await?;
        if !image.is_imported() {
            warn!("Image {} is not reported as imported yet", image_id);
        }

        let vm = build_repo_vm(&identity, &image)?;
        skip_existing(self.create_vm(&vm).await, allow_existing)?;

        let service = build_repo_service(&identity);
        skip_existing(self.create_service(&service).await, allow_existing)?;

        info!(
            "Upgrade repo {}/{} bootstrapped from image {}",
            self.namespace,
            identity.repo_name(),
            image_id
        );
        Ok(())
    }

    /// Identity of an upgrade whose repo this bootstrapper may create.
    ///
    /// Upgrades outside the repo namespace are rejected: their owner
    /// reference would point across namespaces and the garbage collector
    /// would delete the repo right away.
    pub fn identity(&self, upgrade: &Upgrade) -> Result<UpgradeIdentity> {
        let identity = UpgradeIdentity::from_upgrade(upgrade)?;
        if identity.namespace() != self.namespace {
            return Err(UpgradeRepoError::InvalidUpgrade(format!(
                "upgrade {}/{} is outside the repo namespace {}",
                identity.namespace(),
                identity.name(),
                self.namespace
            )));
        }
        Ok(identity)
    }

    /// Submit the repo VM
    pub async fn create_vm(&self, vm: &VirtualMachine) -> Result<VirtualMachine> {
        let name = vm.name_any();
        let vms: Api<VirtualMachine> = Api::namespaced(self.client.clone(), &self.namespace);

        debug!("Creating repo VM {}/{}", self.namespace, name);
        vms.create(&PostParams::default(), vm)
            .await
            .map_err(|e| UpgradeRepoError::from_create(e, "VirtualMachine", &name))
    }

    /// Submit the repo Service
    pub async fn create_service(&self, service: &Service) -> Result<Service> {
        let name = service.name_any();
        let services: Api<Service> = Api::namespaced(self.client.clone(), &self.namespace);

        debug!("Creating repo service {}/{}", self.namespace, name);
        services
            .create(&PostParams::default(), service)
            .await
            .map_err(|e| UpgradeRepoError::from_create(e, "Service", &name))
    }

    /// Where the repo of an upgrade is reachable once its VM is ready
    pub fn endpoint(&self, identity: &UpgradeIdentity) -> RepoEndpoint {
        RepoEndpoint::for_service(&identity.repo_name(), identity.namespace())
    }

    /// Import the upgrade ISO as a new image owned by the upgrade.
    #[instrument(skip(self, upgrade, checksum), fields(upgrade = %upgrade.name_any()))]
    pub async fn create_image_from_iso(
        &self,
        upgrade: &Upgrade,
        iso_url: &str,
        checksum: &str,
    ) -> Result<VirtualMachineImage> {
        let identity = self.identity(upgrade)?;
        let image = VirtualMachineImage {
            metadata: ObjectMeta {
                namespace: Some(self.namespace.clone()),
                generate_name: Some(image_consts::GENERATE_NAME.to_string()),
                labels: Some(BTreeMap::from([(
                    labels::UPGRADE.to_string(),
                    identity.name().to_string(),
                )])),
                owner_references: Some(vec![identity.owner_reference()]),
                ..Default::default()
            },
            spec: VirtualMachineImageSpec {
                display_name: format!("{}-{}", identity.name(), upgrade.spec.version),
                source_type: ImageSourceType::Download,
                url: iso_url.to_string(),
                checksum: checksum.to_string(),
            },
            status: None,
        };

        let images: Api<VirtualMachineImage> =
            Api::namespaced(self.client.clone(), &self.namespace);
        let created = images.create(&PostParams::default(), &image).await?;
        info!(
            "Created image {}/{} from {}",
            self.namespace,
            created.name_any(),
            iso_url
        );
        Ok(created)
    }
}

fn skip_existing<T>(result: Result<T>, allow_existing: bool) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if allow_existing && e.is_already_exists() => {
            debug!("{}, keeping it", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
