// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Release metadata published in the upgrade ISO.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UpgradeRepoError};

/// Component versions pinned to one release, as found in `harvester-release.yaml`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub harvester: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub harvester_chart: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kubernetes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rancher: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub monitoring_chart: String,
}

impl Release {
    /// Decode a release manifest body
    pub fn from_manifest(body: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(body).map_err(|e| UpgradeRepoError::DecodeFailed(e.to_string()))
    }
}

/// What the orchestrator learns from the upgrade repo
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoInfo {
    #[serde(default)]
    pub release: Release,
}

impl RepoInfo {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        serde_yaml::from_str(data).map_err(|e| UpgradeRepoError::DecodeFailed(e.to_string()))
    }
}
