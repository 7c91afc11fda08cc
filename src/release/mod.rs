// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Release metadata and its retrieval from the upgrade repo.

pub mod fetcher;
pub mod info;

pub use fetcher::{FetcherConfig, ReleaseFetcher, RepoEndpoint};
pub use info::{Release, RepoInfo};
