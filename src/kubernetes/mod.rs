// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and namespace management.

pub mod crd;
pub mod namespaces;

pub use crd::wait_for_crd;
pub use namespaces::ensure_namespace_exists;
