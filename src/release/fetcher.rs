// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Retrieval of the release manifest from a running upgrade repo.

use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::constants::repo;
use crate::error::{Result, UpgradeRepoError};
use crate::release::info::{Release, RepoInfo};

/// Settings of the release fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Overall timeout of one request, connect and body included
    pub timeout: Duration,
    /// Directory the ISO is served from
    pub payload_root: String,
    pub manifest_filename: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(repo::FETCH_TIMEOUT_SECS),
            payload_root: repo::PAYLOAD_ROOT.to_string(),
            manifest_filename: repo::RELEASE_MANIFEST.to_string(),
        }
    }
}

/// Network location of an upgrade repo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEndpoint {
    host: String,
    port: u16,
}

impl RepoEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The cluster-internal address of a repo Service
    pub fn for_service(service_name: &str, namespace: &str) -> Self {
        Self::new(format!("{}.{}", service_name, namespace), repo::HTTP_PORT)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL of the release manifest on this endpoint
    pub fn release_url(&self, config: &FetcherConfig) -> Result<Url> {
        let base = Url::parse(&format!("http://{}:{}/", self.host, self.port))?;
        Ok(base.join(&format!(
            "{}/{}",
            config.payload_root.trim_matches('/'),
            config.manifest_filename
        ))?)
    }
}

/// Reads release metadata from upgrade repos. Never retries: the caller owns
/// the retry policy and can tell a repo that is still booting
/// ([`UpgradeRepoError::is_transient`]) from a broken release.
#[derive(Debug, Clone)]
pub struct ReleaseFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl ReleaseFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(UpgradeRepoError::Transport)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch and decode the release manifest of a repo.
    #[instrument(skip(self, cancel), fields(host = %endpoint.host()))]
    pub async fn fetch(
        &self,
        endpoint: &RepoEndpoint,
        cancel: &CancellationToken,
    ) -> Result<RepoInfo> {
        let url = endpoint.release_url(&self.config)?;

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Fetching {} cancelled", url);
                Err(UpgradeRepoError::Cancelled)
            }
            result = self.get_release(url.clone()) => result.map(|release| RepoInfo { release }),
        }
    }

    /// Fetch the repo info and serialize it for the upgrade status.
    pub async fn fetch_string(
        &self,
        endpoint: &RepoEndpoint,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.fetch(endpoint, cancel).await?.to_yaml()
    }

    async fn get_release(&self, url: Url) -> Result<Release> {
        debug!("Fetching release manifest from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(UpgradeRepoError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpgradeRepoError::UnexpectedStatus(status.to_string()));
        }

        let body: Bytes = response.bytes().await.map_err(|e| {
            UpgradeRepoError::DecodeFailed(format!("failed to read response body: {}", e))
        })?;
        Release::from_manifest(&body)
    }
}
