// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolution of `<namespace>/<name>` image references.

use async_trait::async_trait;
use kube::{Api, Client};
use tracing::{debug, instrument};

use crate::error::{Result, UpgradeRepoError};
use crate::types::VirtualMachineImage;

/// Split an image reference into namespace and name.
pub fn parse_image_reference(reference: &str) -> Result<(&str, &str)> {
    let tokens: Vec<&str> = reference.split('/').collect();
    match tokens.as_slice() {
        [namespace, name] if !namespace.is_empty() && !name.is_empty() => Ok((*namespace, *name)),
        _ => Err(UpgradeRepoError::InvalidReference(reference.to_string())),
    }
}

/// Looks up previously imported images.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, namespace: &str, name: &str) -> Result<VirtualMachineImage>;
}

/// Resolves images through the Kubernetes API
#[derive(Clone)]
pub struct ApiImageResolver {
    client: Client,
}

impl ApiImageResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageResolver for ApiImageResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, namespace: &str, name: &str) -> Result<VirtualMachineImage> {
        let images: Api<VirtualMachineImage> = Api::namespaced(self.client.clone(), namespace);
        let reference = format!("{}/{}", namespace, name);

        match images.get(name).await {
            Ok(image) => {
                debug!("Resolved image {}", reference);
                Ok(image)
            }
            Err(kube::Error::Api(err)) if err.code == 404 => {
                Err(UpgradeRepoError::ImageNotFound(reference))
            }
            Err(source) => Err(UpgradeRepoError::ImageLookup { reference, source }),
        }
    }
}

/// Parse the reference and resolve it. Malformed references never reach the resolver.
pub async fn resolve_image_reference<R: ImageResolver + ?Sized>(
    resolver: &R,
    reference: &str,
) -> Result<VirtualMachineImage> {
    let (namespace, name) = parse_image_reference(reference)?;
    resolver.resolve(namespace, name).await
}
