// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpgradeRepoError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Invalid upgrade: {0}")]
    InvalidUpgrade(String),

    #[error("Invalid image format {0}")]
    InvalidReference(String),

    #[error("Upgrade repo image is not provided for upgrade {0}")]
    MissingImage(String),

    #[error("Image {0} not found")]
    ImageNotFound(String),

    #[error("Failed to look up image {reference}: {source}")]
    ImageLookup {
        reference: String,
        #[source]
        source: kube::Error,
    },

    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("Repo request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(String),

    #[error("Failed to decode release metadata: {0}")]
    DecodeFailed(String),

    #[error("Repo request cancelled")]
    Cancelled,

    #[error("Invalid repo URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl UpgradeRepoError {
    /// Whether retrying later can succeed without anything else changing first.
    ///
    /// Transport failures and non-200 answers happen while the repo VM is still
    /// booting. A malformed manifest or a missing image will not fix itself.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UpgradeRepoError::Kube(_)
                | UpgradeRepoError::Transport(_)
                | UpgradeRepoError::UnexpectedStatus(_)
        )
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, UpgradeRepoError::AlreadyExists { .. })
    }

    /// Map a create error, turning a 409 Conflict into `AlreadyExists`.
    pub(crate) fn from_create(err: kube::Error, kind: &'static str, name: &str) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 409 => UpgradeRepoError::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            other => UpgradeRepoError::Kube(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpgradeRepoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{} error", reason),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_from_create_conflict_is_already_exists() {
        let err = UpgradeRepoError::from_create(
            api_error(409, "AlreadyExists"),
            "VirtualMachine",
            "upgrade-repo-upg-1",
        );

        assert!(err.is_already_exists());
        assert!(!err.is_transient());
        assert_eq!(
            err.to_string(),
            "VirtualMachine upgrade-repo-upg-1 already exists"
        );
    }

    #[test]
    fn test_from_create_other_error_is_kept() {
        let err = UpgradeRepoError::from_create(api_error(500, "InternalError"), "Service", "svc");

        assert!(matches!(err, UpgradeRepoError::Kube(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_fatal_errors_are_not_transient() {
        assert!(!UpgradeRepoError::MissingImage("upg-1".to_string()).is_transient());
        assert!(!UpgradeRepoError::InvalidReference("a/b/c".to_string()).is_transient());
        assert!(!UpgradeRepoError::DecodeFailed("bad yaml".to_string()).is_transient());
        assert!(!UpgradeRepoError::Cancelled.is_transient());
    }

    #[test]
    fn test_unexpected_status_is_transient() {
        let err = UpgradeRepoError::UnexpectedStatus("503 Service Unavailable".to_string());
        assert!(err.is_transient());
        assert!(err.to_string().contains("503"));
    }
}
