// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identity of the upgrade that owns the repo resources.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

use crate::constants::REPO_NAME_PREFIX;
use crate::error::{Result, UpgradeRepoError};
use crate::repo::selector::RepoSelector;
use crate::types::Upgrade;

/// Everything needed to name, label and own the resources of one upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeIdentity {
    name: String,
    namespace: String,
    uid: String,
    api_version: String,
    kind: String,
}

impl UpgradeIdentity {
    /// Extract the identity of an upgrade. The upgrade must have been read back
    /// from the API server: without a uid there is no owner reference.
    pub fn from_upgrade(upgrade: &Upgrade) -> Result<Self> {
        let name = upgrade
            .metadata
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| UpgradeRepoError::InvalidUpgrade("upgrade has no name".to_string()))?;
        let namespace = upgrade.namespace().filter(|ns| !ns.is_empty()).ok_or_else(|| {
            UpgradeRepoError::InvalidUpgrade(format!("upgrade {} has no namespace", name))
        })?;
        let uid = upgrade.uid().filter(|u| !u.is_empty()).ok_or_else(|| {
            UpgradeRepoError::InvalidUpgrade(format!("upgrade {} has no uid", name))
        })?;

        Ok(UpgradeIdentity {
            name,
            namespace,
            uid,
            api_version: Upgrade::api_version(&()).to_string(),
            kind: Upgrade::kind(&()).to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the upgrade. Owner references cannot cross namespaces,
    /// so the repo resources have to live here too.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name shared by the repo VM and the repo Service
    pub fn repo_name(&self) -> String {
        format!("{}{}", REPO_NAME_PREFIX, self.name)
    }

    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            ..Default::default()
        }
    }

    pub fn selector(&self) -> RepoSelector {
        RepoSelector::new(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_upgrade;

    #[test]
    fn test_from_upgrade() {
        let identity = UpgradeIdentity::from_upgrade(&make_upgrade("upg-1", None)).unwrap();

        assert_eq!(identity.name(), "upg-1");
        assert_eq!(identity.namespace(), "harvester-system");
        assert_eq!(identity.repo_name(), "upgrade-repo-upg-1");
    }

    #[test]
    fn test_missing_namespace_is_invalid() {
        let mut upgrade = make_upgrade("upg-1", None);
        upgrade.metadata.namespace = None;

        let err = UpgradeIdentity::from_upgrade(&upgrade).unwrap_err();
        assert!(matches!(err, UpgradeRepoError::InvalidUpgrade(_)));
    }

    #[test]
    fn test_owner_reference() {
        let owner = UpgradeIdentity::from_upgrade(&make_upgrade("upg-1", None))
            .unwrap()
            .owner_reference();

        assert_eq!(owner.api_version, "harvesterhci.io/v1beta1");
        assert_eq!(owner.kind, "Upgrade");
        assert_eq!(owner.name, "upg-1");
        assert_eq!(owner.uid, "uid-upg-1");
    }

    #[test]
    fn test_missing_uid_is_invalid() {
        let mut upgrade = make_upgrade("upg-1", None);
        upgrade.metadata.uid = None;

        let err = UpgradeIdentity::from_upgrade(&upgrade).unwrap_err();
        assert!(matches!(err, UpgradeRepoError::InvalidUpgrade(_)));
    }

    #[test]
    fn test_distinct_upgrades_get_distinct_names() {
        let a = UpgradeIdentity::from_upgrade(&make_upgrade("upg-a", None)).unwrap();
        let b = UpgradeIdentity::from_upgrade(&make_upgrade("upg-b", None)).unwrap();

        assert_ne!(a.repo_name(), b.repo_name());
    }
}
