// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provisioning of the upgrade repo VM and the Service exposing it.

pub mod bootstrap;
pub mod identity;
pub mod image;
pub mod selector;
pub mod service;
pub mod vm;

pub use bootstrap::Bootstrapper;
pub use identity::UpgradeIdentity;
pub use image::{parse_image_reference, ApiImageResolver, ImageResolver};
pub use selector::RepoSelector;
