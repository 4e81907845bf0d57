// SPDX-License-Identifier: CEPL-1.0
use std::fmt;

use ash::vk;
use thiserror::Error;

use crate::queue::QueuePurpose;

/// Which capability namespace a resolution step was working in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityScope {
    InstanceExtension,
    InstanceLayer,
    DeviceExtension,
}

impl fmt::Display for CapabilityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapabilityScope::InstanceExtension => "instance extension",
            CapabilityScope::InstanceLayer => "instance layer",
            CapabilityScope::DeviceExtension => "device extension",
        })
    }
}

/// Every variant is fatal to initialization. The driver capability set and
/// device topology do not change within a process lifetime, so nothing here
/// is retried.
#[derive(Debug, Error)]
pub enum VkError {
    #[error("mandatory {scope} not present: {name}")]
    MissingMandatoryCapability {
        scope: CapabilityScope,
        name: String,
    },

    #[error("required {scope} not present: {name}")]
    MissingRequiredCapability {
        scope: CapabilityScope,
        name: String,
    },

    #[error("no physical device supports the required device extensions")]
    NoQualifyingDevice,

    #[error("no queue family supports {0}")]
    NoFamilyFor(QueuePurpose),

    #[error("queue families supporting {0} have no queue capacity left")]
    QueueCapacityExhausted(QueuePurpose),

    #[error("failed to enumerate available {0}s")]
    Enumerate(CapabilityScope, #[source] vk::Result),

    #[error("vkEnumeratePhysicalDevices failed")]
    EnumerateDevices(#[source] vk::Result),

    #[error("vkCreateInstance failed")]
    CreateInstance(#[source] vk::Result),

    #[error("vkCreateDevice failed")]
    CreateDevice(#[source] vk::Result),

    #[error("failed to create presentation surface")]
    CreateSurface(#[source] vk::Result),

    #[error("failed to create debug messenger")]
    CreateDebugMessenger(#[source] vk::Result),

    #[error("name contains an interior NUL byte")]
    InvalidName(#[from] std::ffi::NulError),

    #[error("window or display handle unavailable")]
    Handle(#[from] raw_window_handle::HandleError),
}
