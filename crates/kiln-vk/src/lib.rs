// SPDX-License-Identifier: CEPL-1.0
//! Vulkan startup negotiation: capability resolution, physical-device
//! selection and queue-family assignment, feeding instance and logical
//! device creation.
//!
//! The negotiation runs once, synchronously, on the initializing thread.
//! Any failure is fatal to initialization and surfaces as [`VkError`].

pub mod catalog;
pub mod config;
pub mod context;
pub mod debug;
pub mod device;
pub mod error;
pub mod queue;
pub mod resolve;

pub use catalog::CapabilityCatalog;
pub use config::ContextConfig;
pub use context::{Context, Queues, REQUIRED_DEVICE_EXTENSIONS};
pub use device::{DeviceCandidate, DeviceClass};
pub use error::{CapabilityScope, VkError};
pub use queue::{QueueAssignment, QueueFamilyProfile, QueuePurpose, QueueRequest};
pub use resolve::{resolve, Requirements, Resolution};
