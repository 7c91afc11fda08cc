// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Repo VM construction.
//!
//! The repo VM boots the upgrade ISO from a cdrom and gets a second cdrom with
//! a cloud-init stage that drops `/sysroot/harvester-serve-iso`. The guest
//! picks that file up and serves the ISO contents over HTTP on port 80.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    HTTPGetAction, PersistentVolumeClaim, PersistentVolumeClaimSpec, Probe,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use kube::ResourceExt;

use crate::constants::{annotations, labels, repo, vm};
use crate::error::Result;
use crate::repo::identity::UpgradeIdentity;
use crate::types::virtual_machine::{
    CdRomTarget, CloudInitNoCloudSource, Cpu, Devices, Disk, DomainSpec, EvictionStrategy, Input,
    Interface, InterfaceMasquerade, Machine, Network, PersistentVolumeClaimVolumeSource,
    PodNetwork, ResourceRequirements, VirtualMachineInstanceSpec,
    VirtualMachineInstanceTemplateSpec, Volume,
};
use crate::types::{VirtualMachine, VirtualMachineImage, VirtualMachineSpec};

/// Path of the release manifest served by the repo VM
pub fn release_manifest_path() -> String {
    format!("/{}/{}", repo::PAYLOAD_ROOT, repo::RELEASE_MANIFEST)
}

/// Build the repo VM for an upgrade, booting from the given image. The VM
/// lives in the namespace of the upgrade.
pub fn build_repo_vm(
    identity: &UpgradeIdentity,
    image: &VirtualMachineImage,
) -> Result<VirtualMachine> {
    let vm_name = identity.repo_name();
    let disk0_claim = format!("{}-{}", vm_name, vm::BOOT_DISK);
    let pvc_templates = serde_json::to_string(&[build_disk_claim(&disk0_claim, image)])?;

    let mut template_labels = identity.selector().resource_labels();
    template_labels.insert(labels::VM_NAME.to_string(), vm_name.clone());

    Ok(VirtualMachine {
        metadata: ObjectMeta {
            name: Some(vm_name.clone()),
            namespace: Some(identity.namespace().to_string()),
            labels: Some(identity.selector().resource_labels()),
            annotations: Some(BTreeMap::from([
                (annotations::VOLUME_CLAIM_TEMPLATES.to_string(), pvc_templates),
                (annotations::NETWORK_IPS.to_string(), "[]".to_string()),
                (annotations::REMOVED_PVCS.to_string(), disk0_claim.clone()),
            ])),
            owner_references: Some(vec![identity.owner_reference()]),
            ..Default::default()
        },
        spec: VirtualMachineSpec {
            running: Some(true),
            template: VirtualMachineInstanceTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(template_labels),
                    ..Default::default()
                }),
                spec: Some(VirtualMachineInstanceSpec {
                    domain: build_domain(),
                    eviction_strategy: Some(EvictionStrategy::LiveMigrate),
                    hostname: Some(vm_name),
                    networks: vec![Network {
                        name: vm::NETWORK.to_string(),
                        pod: Some(PodNetwork::default()),
                    }],
                    volumes: vec![
                        Volume {
                            name: vm::BOOT_DISK.to_string(),
                            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                                claim_name: disk0_claim,
                            }),
                            ..Default::default()
                        },
                        Volume {
                            name: vm::CLOUD_INIT_DISK.to_string(),
                            cloud_init_no_cloud: Some(CloudInitNoCloudSource {
                                user_data: Some(vm::USER_DATA.to_string()),
                            }),
                            ..Default::default()
                        },
                    ],
                    readiness_probe: Some(build_readiness_probe()),
                }),
            },
        },
        status: None,
    })
}

/// Volume claim template for the boot disk, filled from the image
fn build_disk_claim(claim_name: &str, image: &VirtualMachineImage) -> PersistentVolumeClaim {
    let image_id = format!(
        "{}/{}",
        image.namespace().unwrap_or_default(),
        image.name_any()
    );

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(claim_name.to_string()),
            annotations: Some(BTreeMap::from([(
                annotations::IMAGE_ID.to_string(),
                image_id,
            )])),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteMany".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(vm::DISK_SIZE.to_string()),
                )])),
                ..Default::default()
            }),
            volume_mode: Some("Block".to_string()),
            storage_class_name: Some(image.storage_class_name().to_string()),
            ..Default::default()
        }),
        status: None,
    }
}

fn build_domain() -> DomainSpec {
    let cdrom = || {
        Some(CdRomTarget {
            bus: "sata".to_string(),
        })
    };
    let fixed = BTreeMap::from([
        ("cpu".to_string(), Quantity(vm::CPU.to_string())),
        ("memory".to_string(), Quantity(vm::MEMORY.to_string())),
    ]);

    DomainSpec {
        cpu: Some(Cpu {
            cores: 1,
            sockets: 1,
            threads: 1,
        }),
        devices: Devices {
            disks: vec![
                Disk {
                    name: vm::BOOT_DISK.to_string(),
                    boot_order: Some(1),
                    cdrom: cdrom(),
                },
                Disk {
                    name: vm::CLOUD_INIT_DISK.to_string(),
                    boot_order: None,
                    cdrom: cdrom(),
                },
            ],
            inputs: vec![Input {
                bus: "usb".to_string(),
                name: "tablet".to_string(),
                input_type: "tablet".to_string(),
            }],
            interfaces: vec![Interface {
                name: vm::NETWORK.to_string(),
                model: Some("virtio".to_string()),
                masquerade: Some(InterfaceMasquerade {}),
            }],
        },
        machine: Some(Machine {
            machine_type: vm::MACHINE_TYPE.to_string(),
        }),
        resources: ResourceRequirements {
            requests: fixed.clone(),
            limits: fixed,
        },
    }
}

fn build_readiness_probe() -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(release_manifest_path()),
            port: IntOrString::Int(i32::from(repo::HTTP_PORT)),
            ..Default::default()
        }),
        timeout_seconds: Some(vm::PROBE_TIMEOUT_SECS),
        failure_threshold: Some(vm::PROBE_FAILURE_THRESHOLD),
        ..Default::default()
    }
}
