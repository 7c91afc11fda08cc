// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes label keys and values placed on repo resources
pub mod labels {
    pub const CREATOR: &str = "harvesterhci.io/creator";
    pub const CREATOR_VALUE: &str = "harvester";
    /// Name of the owning upgrade
    pub const UPGRADE: &str = "harvesterhci.io/upgrade";
    pub const UPGRADE_COMPONENT: &str = "harvesterhci.io/upgradeComponent";
    pub const UPGRADE_COMPONENT_REPO: &str = "repo";
    pub const VM_NAME: &str = "harvesterhci.io/vmName";
}

/// Kubernetes annotation keys placed on repo resources
pub mod annotations {
    pub const VOLUME_CLAIM_TEMPLATES: &str = "harvesterhci.io/volumeClaimTemplates";
    pub const IMAGE_ID: &str = "harvesterhci.io/imageId";
    pub const NETWORK_IPS: &str = "networks.harvesterhci.io/ips";
    pub const REMOVED_PVCS: &str = "harvesterhci.io/removedPersistentVolumeClaims";
}

/// Namespace holding the upgrade resources unless configured otherwise
pub const DEFAULT_UPGRADE_NAMESPACE: &str = "harvester-system";

/// Prefix shared by the repo VM and the repo Service
pub const REPO_NAME_PREFIX: &str = "upgrade-repo-";

/// Repo VM shape
pub mod vm {
    pub const CPU: &str = "1";
    pub const MEMORY: &str = "1G";
    pub const DISK_SIZE: &str = "10Gi";
    pub const MACHINE_TYPE: &str = "q35";
    pub const BOOT_DISK: &str = "disk-0";
    pub const CLOUD_INIT_DISK: &str = "cloudinitdisk";
    pub const NETWORK: &str = "default";
    pub const PROBE_TIMEOUT_SECS: i32 = 30;
    pub const PROBE_FAILURE_THRESHOLD: i32 = 5;

    /// Cloud-init stage telling the guest to serve its ISO over HTTP
    pub const USER_DATA: &str = r#"name: "enable repo mode"
stages:
  rootfs:
  - commands:
    - echo > /sysroot/harvester-serve-iso
"#;
}

/// Layout of the repo served by the VM
pub mod repo {
    pub const HTTP_PORT: u16 = 80;
    pub const PAYLOAD_ROOT: &str = "harvester-iso";
    pub const RELEASE_MANIFEST: &str = "harvester-release.yaml";
    pub const FETCH_TIMEOUT_SECS: u64 = 30;
}

/// ISO image import
pub mod image {
    pub const GENERATE_NAME: &str = "harvester-iso-";
}

/// Requeue delays for the upgrade reconciler
pub mod requeue {
    pub const TRANSIENT_SECS: u64 = 10;
    pub const FATAL_SECS: u64 = 300;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
