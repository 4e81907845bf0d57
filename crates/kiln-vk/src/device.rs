// SPDX-License-Identifier: CEPL-1.0
use ash::{vk, Instance};
use tracing::{debug, info};

use crate::catalog::{decode_name, CapabilityCatalog};
use crate::error::VkError;

/// Closed device-class variant with an explicit weight table, so the
/// selection ordering stays auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Other,
}

impl DeviceClass {
    pub fn from_vk(raw: vk::PhysicalDeviceType) -> Self {
        match raw {
            vk::PhysicalDeviceType::DISCRETE_GPU => DeviceClass::Discrete,
            vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceClass::Integrated,
            vk::PhysicalDeviceType::VIRTUAL_GPU => DeviceClass::Virtual,
            vk::PhysicalDeviceType::CPU => DeviceClass::Cpu,
            _ => DeviceClass::Other,
        }
    }

    /// Left-shift applied to a supported candidate's base rating of 1.
    /// Discrete ends up rated 4, integrated/virtual 2, CPU/other 1.
    pub fn weight(self) -> u32 {
        match self {
            DeviceClass::Discrete => 2,
            DeviceClass::Integrated | DeviceClass::Virtual => 1,
            DeviceClass::Cpu | DeviceClass::Other => 0,
        }
    }
}

/// One enumerated physical device with the data the scorer needs. The
/// extension catalog is queried per device, once, during the survey.
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    pub name: String,
    pub class: DeviceClass,
    pub features: vk::PhysicalDeviceFeatures,
    pub extensions: CapabilityCatalog,
}

impl DeviceCandidate {
    /// 0 iff the candidate is disqualified by a missing required extension;
    /// otherwise strictly positive and monotonic in device class.
    pub fn rating(&self, required_extensions: &[String]) -> u32 {
        let supported = required_extensions.iter().all(|e| self.extensions.contains(e));
        if !supported {
            return 0;
        }
        1u32 << self.class.weight()
    }
}

/// Index of the best-rated candidate. Ties go to the first occurrence in
/// enumeration order; the driver's enumeration order is not stable across
/// hardware, which is why tests feed this a fixed candidate list.
pub fn pick_candidate(
    candidates: &[DeviceCandidate],
    required_extensions: &[String],
) -> Result<usize, VkError> {
    let mut best: Option<(usize, u32)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let rating = candidate.rating(required_extensions);
        debug!(
            "device candidate {:?} ({:?}) rated {}",
            candidate.name, candidate.class, rating
        );
        if rating > best.map_or(0, |(_, r)| r) {
            best = Some((i, rating));
        }
    }
    match best {
        Some((i, _)) => Ok(i),
        None => Err(VkError::NoQualifyingDevice),
    }
}

/// Enumerates physical devices and gathers per-device properties, features
/// and extension catalogs.
pub unsafe fn survey_devices(
    instance: &Instance,
) -> Result<(Vec<vk::PhysicalDevice>, Vec<DeviceCandidate>), VkError> {
    let devices = instance
        .enumerate_physical_devices()
        .map_err(VkError::EnumerateDevices)?;

    let mut candidates = Vec::with_capacity(devices.len());
    for &phys in &devices {
        let props = instance.get_physical_device_properties(phys);
        let features = instance.get_physical_device_features(phys);
        let extensions = CapabilityCatalog::device_extensions(instance, phys)?;
        candidates.push(DeviceCandidate {
            name: decode_name(&props.device_name),
            class: DeviceClass::from_vk(props.device_type),
            features,
            extensions,
        });
    }
    Ok((devices, candidates))
}

pub unsafe fn pick_device(
    instance: &Instance,
    required_extensions: &[String],
) -> Result<(vk::PhysicalDevice, DeviceCandidate), VkError> {
    let (devices, mut candidates) = survey_devices(instance)?;
    let index = pick_candidate(&candidates, required_extensions)?;
    info!(
        "picked device {:?} ({:?})",
        candidates[index].name, candidates[index].class
    );
    Ok((devices[index], candidates.swap_remove(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(class: DeviceClass, extensions: &[&str]) -> DeviceCandidate {
        DeviceCandidate {
            name: format!("{class:?} test device"),
            class,
            features: vk::PhysicalDeviceFeatures::default(),
            extensions: extensions.iter().copied().collect(),
        }
    }

    fn swapchain() -> Vec<String> {
        vec!["VK_KHR_swapchain".to_string()]
    }

    #[test]
    fn weight_table_orders_classes() {
        assert!(DeviceClass::Discrete.weight() > DeviceClass::Integrated.weight());
        assert_eq!(
            DeviceClass::Integrated.weight(),
            DeviceClass::Virtual.weight()
        );
        assert!(DeviceClass::Virtual.weight() > DeviceClass::Cpu.weight());
        assert_eq!(DeviceClass::Cpu.weight(), DeviceClass::Other.weight());
    }

    #[test]
    fn discrete_beats_integrated_regardless_of_order() {
        let required = swapchain();
        let a = candidate(DeviceClass::Integrated, &["VK_KHR_swapchain"]);
        let b = candidate(DeviceClass::Discrete, &["VK_KHR_swapchain"]);

        assert_eq!(pick_candidate(&[a.clone(), b.clone()], &required).unwrap(), 1);
        assert_eq!(pick_candidate(&[b, a], &required).unwrap(), 0);
    }

    #[test]
    fn missing_required_extension_rates_zero() {
        let required = swapchain();
        let discrete = candidate(DeviceClass::Discrete, &[]);
        assert_eq!(discrete.rating(&required), 0);

        let cpu = candidate(DeviceClass::Cpu, &["VK_KHR_swapchain"]);
        assert_eq!(cpu.rating(&required), 1);

        // A disqualified discrete GPU loses to a supported CPU fallback.
        assert_eq!(pick_candidate(&[discrete, cpu], &required).unwrap(), 1);
    }

    #[test]
    fn all_zero_is_no_qualifying_device() {
        let required = swapchain();
        let list = [
            candidate(DeviceClass::Discrete, &[]),
            candidate(DeviceClass::Integrated, &["VK_EXT_other"]),
        ];
        assert!(matches!(
            pick_candidate(&list, &required),
            Err(VkError::NoQualifyingDevice)
        ));
    }

    #[test]
    fn tie_breaks_to_first_enumerated() {
        let required = swapchain();
        let list = [
            candidate(DeviceClass::Discrete, &["VK_KHR_swapchain"]),
            candidate(DeviceClass::Discrete, &["VK_KHR_swapchain"]),
        ];
        assert_eq!(pick_candidate(&list, &required).unwrap(), 0);
    }

    #[test]
    fn empty_candidate_list_fails() {
        assert!(matches!(
            pick_candidate(&[], &swapchain()),
            Err(VkError::NoQualifyingDevice)
        ));
    }
}
