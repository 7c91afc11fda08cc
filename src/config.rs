// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::constants::{repo, DEFAULT_UPGRADE_NAMESPACE};
use crate::release::{FetcherConfig, RepoEndpoint};

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace of the watched upgrades and of their repo VM and Service
    pub upgrade_namespace: String,
    pub fetch_timeout: Duration,
    /// Fixed `host:port` to read every repo from instead of its Service, for
    /// running outside the cluster through a port-forward
    pub repo_endpoint: Option<RepoEndpoint>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let upgrade_namespace = lookup("UPGRADE_NAMESPACE")
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_UPGRADE_NAMESPACE.to_string());

        let fetch_timeout_secs = match lookup("REPO_FETCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("REPO_FETCH_TIMEOUT_SECS is not a number: {}", raw))?,
            None => repo::FETCH_TIMEOUT_SECS,
        };

        let repo_endpoint = lookup("REPO_ENDPOINT")
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_endpoint(&raw))
            .transpose()?;

        Ok(Config {
            upgrade_namespace,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            repo_endpoint,
        })
    }

    /// Fetcher settings derived from this configuration
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            timeout: self.fetch_timeout,
            ..FetcherConfig::default()
        }
    }
}

fn parse_endpoint(raw: &str) -> Result<RepoEndpoint> {
    let (host, port) = raw
        .rsplit_once(':')
        .with_context(|| format!("REPO_ENDPOINT must be host:port, got {}", raw))?;
    let port = port
        .parse::<u16>()
        .with_context(|| format!("REPO_ENDPOINT has an invalid port: {}", raw))?;
    Ok(RepoEndpoint::new(host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.upgrade_namespace, "harvester-system");
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.repo_endpoint, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("UPGRADE_NAMESPACE", "upgrades"),
            ("REPO_FETCH_TIMEOUT_SECS", "5"),
            ("REPO_ENDPOINT", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(config.upgrade_namespace, "upgrades");
        assert_eq!(config.fetcher_config().timeout, Duration::from_secs(5));
        assert_eq!(config.repo_endpoint, Some(RepoEndpoint::new("127.0.0.1", 8080)));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = Config::from_lookup(lookup_from(&[("REPO_FETCH_TIMEOUT_SECS", "soon")]))
            .unwrap_err();

        assert!(err.to_string().contains("REPO_FETCH_TIMEOUT_SECS"));
    }

    #[test]
    fn test_invalid_repo_endpoint() {
        for raw in ["localhost", "localhost:http", "localhost:70000"] {
            let err = Config::from_lookup(lookup_from(&[("REPO_ENDPOINT", raw)])).unwrap_err();
            assert!(err.to_string().contains("REPO_ENDPOINT"), "{}: {}", raw, err);
        }
    }

    #[test]
    fn test_empty_namespace_falls_back_to_default() {
        let config = Config::from_lookup(lookup_from(&[("UPGRADE_NAMESPACE", "")])).unwrap();
        assert_eq!(config.upgrade_namespace, "harvester-system");
    }
}
