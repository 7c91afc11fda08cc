// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Labels binding the repo Service to the repo VM.

use std::collections::BTreeMap;

use crate::constants::labels;

/// The label set the repo Service selects on. The VM builder merges exactly
/// these labels into the VM template, so the two can't drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSelector {
    upgrade_name: String,
}

impl RepoSelector {
    pub fn new(upgrade_name: &str) -> Self {
        Self {
            upgrade_name: upgrade_name.to_string(),
        }
    }

    /// Labels used as the Service selector
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (labels::UPGRADE.to_string(), self.upgrade_name.clone()),
            (
                labels::UPGRADE_COMPONENT.to_string(),
                labels::UPGRADE_COMPONENT_REPO.to_string(),
            ),
        ])
    }

    /// Labels for the metadata of every repo resource
    pub fn resource_labels(&self) -> BTreeMap<String, String> {
        let mut resource_labels = self.labels();
        resource_labels.insert(labels::CREATOR.to_string(), labels::CREATOR_VALUE.to_string());
        resource_labels
    }

    /// Check if a label map carries every selector label
    pub fn matches(&self, candidate: &BTreeMap<String, String>) -> bool {
        self.labels()
            .iter()
            .all(|(k, v)| candidate.get(k) == Some(v))
    }
}
