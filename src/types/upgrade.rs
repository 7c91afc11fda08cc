// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use super::condition::Condition;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "harvesterhci.io", version = "v1beta1", kind = "Upgrade")]
#[kube(namespaced)]
#[kube(status = "UpgradeStatus")]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSpec {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_enabled: Option<bool>,
}

impl Upgrade {
    /// The resolved ISO image reference (`<namespace>/<name>`), if any
    pub fn image_id(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.image_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeStatus {
    #[serde(rename = "imageID", default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}
