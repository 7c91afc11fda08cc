// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// Status condition as reported by Harvester resources
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Whether the condition of the given type is present and "True"
pub fn is_condition_true(conditions: Option<&[Condition]>, condition_type: &str) -> bool {
    conditions.is_some_and(|conditions| {
        conditions
            .iter()
            .any(|c| c.condition_type == condition_type && c.status == "True")
    })
}
