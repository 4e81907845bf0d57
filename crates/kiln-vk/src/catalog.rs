// SPDX-License-Identifier: CEPL-1.0
use std::collections::HashSet;
use std::ffi::c_char;

use ash::{vk, Entry, Instance};

use crate::error::{CapabilityScope, VkError};

/// Immutable set of available capability names, captured once per
/// negotiation step and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCatalog {
    names: HashSet<String>,
}

impl CapabilityCatalog {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Extensions the loader reports for the whole instance.
    pub unsafe fn instance_extensions(entry: &Entry) -> Result<Self, VkError> {
        let props = entry
            .enumerate_instance_extension_properties(None)
            .map_err(|e| VkError::Enumerate(CapabilityScope::InstanceExtension, e))?;
        Ok(props
            .iter()
            .map(|p| decode_name(&p.extension_name))
            .collect())
    }

    /// Layers the loader reports for the whole instance.
    pub unsafe fn instance_layers(entry: &Entry) -> Result<Self, VkError> {
        let props = entry
            .enumerate_instance_layer_properties()
            .map_err(|e| VkError::Enumerate(CapabilityScope::InstanceLayer, e))?;
        Ok(props.iter().map(|p| decode_name(&p.layer_name)).collect())
    }

    /// Extensions one physical device reports.
    pub unsafe fn device_extensions(
        instance: &Instance,
        phys: vk::PhysicalDevice,
    ) -> Result<Self, VkError> {
        let props = instance
            .enumerate_device_extension_properties(phys)
            .map_err(|e| VkError::Enumerate(CapabilityScope::DeviceExtension, e))?;
        Ok(props
            .iter()
            .map(|p| decode_name(&p.extension_name))
            .collect())
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilityCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        CapabilityCatalog {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Vulkan hands names back as fixed-size NUL-terminated `c_char` arrays.
pub(crate) fn decode_name(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_name_stops_at_nul() {
        let mut raw = [0 as c_char; 256];
        for (i, &b) in b"VK_KHR_swapchain\0".iter().enumerate() {
            raw[i] = b as c_char;
        }
        assert_eq!(decode_name(&raw), "VK_KHR_swapchain");
    }

    #[test]
    fn decode_name_empty() {
        let raw = [0 as c_char; 256];
        assert_eq!(decode_name(&raw), "");
    }

    #[test]
    fn catalog_membership() {
        let catalog: CapabilityCatalog = ["A", "B"].into_iter().collect();
        assert!(catalog.contains("A"));
        assert!(catalog.contains("B"));
        assert!(!catalog.contains("C"));
        assert_eq!(catalog.len(), 2);
    }
}
