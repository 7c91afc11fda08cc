// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Repo Service construction.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;

use crate::constants::repo;
use crate::repo::identity::UpgradeIdentity;

/// Build the Service exposing the repo VM on port 80, next to the VM in the
/// namespace of the upgrade.
pub fn build_repo_service(identity: &UpgradeIdentity) -> Service {
    let selector = identity.selector();
    let port = i32::from(repo::HTTP_PORT);

    Service {
        metadata: ObjectMeta {
            name: Some(identity.repo_name()),
            namespace: Some(identity.namespace().to_string()),
            labels: Some(selector.resource_labels()),
            owner_references: Some(vec![identity.owner_reference()]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector.labels()),
            ports: Some(vec![ServicePort {
                protocol: Some("TCP".to_string()),
                port,
                target_port: Some(IntOrString::Int(port)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}
