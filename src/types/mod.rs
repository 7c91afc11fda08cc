// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources read or created by the upgrade repo.

pub mod condition;
pub mod image;
pub mod upgrade;
pub mod virtual_machine;

pub use condition::Condition;
pub use image::{ImageSourceType, VirtualMachineImage, VirtualMachineImageSpec};
pub use upgrade::{Upgrade, UpgradeSpec, UpgradeStatus};
pub use virtual_machine::{VirtualMachine, VirtualMachineSpec};
