// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use super::condition::{is_condition_true, Condition};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "harvesterhci.io",
    version = "v1beta1",
    kind = "VirtualMachineImage"
)]
#[kube(namespaced)]
#[kube(status = "VirtualMachineImageStatus")]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineImageSpec {
    pub display_name: String,
    pub source_type: ImageSourceType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSourceType {
    #[default]
    Download,
    Upload,
    ExportFromVolume,
}

impl VirtualMachineImage {
    /// Storage class the image was imported into; empty until the import starts
    pub fn storage_class_name(&self) -> &str {
        self.status
            .as_ref()
            .map(|s| s.storage_class_name.as_str())
            .unwrap_or_default()
    }

    /// Check if the import finished based on the Imported condition
    pub fn is_imported(&self) -> bool {
        let conditions = self.status.as_ref().and_then(|s| s.conditions.as_deref());
        is_condition_true(conditions, "Imported")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineImageStatus {
    #[serde(default)]
    pub storage_class_name: String,
    #[serde(default)]
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}
