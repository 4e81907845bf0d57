// SPDX-License-Identifier: CEPL-1.0
//! Full negotiation walk-through over injected catalogs and profiles, the
//! way the orchestrator sequences it, with no driver involved.

use ash::vk;
use kiln_vk::device::{pick_candidate, DeviceCandidate};
use kiln_vk::queue::{allocate, queue_requests};
use kiln_vk::{
    resolve, CapabilityCatalog, CapabilityScope, DeviceClass, QueueFamilyProfile, QueuePurpose,
    QueueRequest, Requirements, VkError, REQUIRED_DEVICE_EXTENSIONS,
};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn required_device_extensions() -> Vec<String> {
    names(REQUIRED_DEVICE_EXTENSIONS)
}

fn candidate(name: &str, class: DeviceClass, extensions: &[&str]) -> DeviceCandidate {
    DeviceCandidate {
        name: name.to_string(),
        class,
        features: vk::PhysicalDeviceFeatures::default(),
        extensions: extensions.iter().copied().collect(),
    }
}

#[test]
fn happy_path_from_catalogs_to_queue_plan() {
    // Instance step: windowing extensions are mandatory, one optional
    // extension is missing and degrades to a warning.
    let instance_catalog: CapabilityCatalog = [
        "VK_KHR_surface",
        "VK_KHR_xcb_surface",
        "VK_KHR_get_physical_device_properties2",
    ]
    .into_iter()
    .collect();

    let mandatory = names(&["VK_KHR_surface", "VK_KHR_xcb_surface"]);
    let reqs = Requirements {
        required: vec![],
        optional: names(&[
            "VK_KHR_get_physical_device_properties2",
            "VK_EXT_swapchain_colorspace",
        ]),
    };
    let extensions = resolve(
        CapabilityScope::InstanceExtension,
        &mandatory,
        &reqs,
        &[],
        &instance_catalog,
    )
    .unwrap();
    assert_eq!(
        extensions.enabled,
        names(&[
            "VK_KHR_surface",
            "VK_KHR_xcb_surface",
            "VK_KHR_get_physical_device_properties2",
        ])
    );
    assert_eq!(extensions.skipped, names(&["VK_EXT_swapchain_colorspace"]));

    // Device step: the discrete card wins over the integrated one.
    let candidates = [
        candidate("iGPU", DeviceClass::Integrated, &["VK_KHR_swapchain"]),
        candidate("dGPU", DeviceClass::Discrete, &["VK_KHR_swapchain"]),
        candidate("llvmpipe", DeviceClass::Cpu, &["VK_KHR_swapchain"]),
    ];
    let picked = pick_candidate(&candidates, &required_device_extensions()).unwrap();
    assert_eq!(candidates[picked].name, "dGPU");

    // Device extensions resolve against the winner's catalog.
    let device_list = resolve(
        CapabilityScope::DeviceExtension,
        &required_device_extensions(),
        &Requirements::default(),
        &[],
        &candidates[picked].extensions,
    )
    .unwrap();
    assert_eq!(device_list.enabled, names(&["VK_KHR_swapchain"]));

    // Queue step: present-only family plus a general family.
    let profiles = [
        QueueFamilyProfile {
            flags: vk::QueueFlags::empty(),
            queue_count: 1,
            present_support: true,
        },
        QueueFamilyProfile {
            flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            queue_count: 3,
            present_support: false,
        },
    ];
    let assignment = allocate(&profiles).unwrap();
    assert_eq!(assignment.slot(QueuePurpose::Present).family, 0);
    assert_eq!(assignment.slot(QueuePurpose::Graphics).family, 1);

    assert_eq!(
        queue_requests(&assignment),
        vec![
            QueueRequest {
                family: 0,
                count: 1
            },
            QueueRequest {
                family: 1,
                count: 3
            },
        ]
    );
}

#[test]
fn missing_windowing_extension_aborts_negotiation() {
    let catalog: CapabilityCatalog = ["VK_KHR_surface"].into_iter().collect();
    let mandatory = names(&["VK_KHR_surface", "VK_KHR_wayland_surface"]);
    let err = resolve(
        CapabilityScope::InstanceExtension,
        &mandatory,
        &Requirements::default(),
        &[],
        &catalog,
    )
    .unwrap_err();
    match err {
        VkError::MissingMandatoryCapability { name, .. } => {
            assert_eq!(name, "VK_KHR_wayland_surface");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn no_device_supports_swapchain() {
    let candidates = [
        candidate("dGPU", DeviceClass::Discrete, &["VK_EXT_something_else"]),
        candidate("iGPU", DeviceClass::Integrated, &[]),
    ];
    assert!(matches!(
        pick_candidate(&candidates, &required_device_extensions()),
        Err(VkError::NoQualifyingDevice)
    ));
}
