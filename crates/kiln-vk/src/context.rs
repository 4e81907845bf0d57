// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, c_void, CStr, CString};

use ash::khr::surface;
use ash::{vk, Device, Entry, Instance};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use tracing::{debug, info};

use kiln_core::Version;

use crate::catalog::CapabilityCatalog;
use crate::config::ContextConfig;
use crate::debug::{self, DebugMessenger};
use crate::device;
use crate::error::{CapabilityScope, VkError};
use crate::queue::{self, QueueAssignment, QueuePurpose, QUEUE_PRIORITY};
use crate::resolve::{resolve, Resolution};

/// Engine-mandated device extensions, resolved ahead of any caller list.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&str] = &["VK_KHR_swapchain"];

/// Queue handles retrieved after logical-device creation, one per purpose.
/// Handles may alias when purposes share a (family, index) slot.
pub struct Queues {
    pub graphics: vk::Queue,
    pub transfer: vk::Queue,
    pub present: vk::Queue,
    pub compute: vk::Queue,
}

/// Fully negotiated Vulkan context. Owns the instance, surface, debug
/// messenger and logical device; `Drop` tears them down in reverse order.
pub struct Context {
    _entry: Entry,
    instance: Instance,
    messenger: Option<DebugMessenger>,
    surface_loader: surface::Instance,
    surface: vk::SurfaceKHR,
    physical: vk::PhysicalDevice,
    device: Device,
    assignment: QueueAssignment,
    queues: Queues,
}

impl Context {
    /// Runs the whole startup negotiation. Synchronous, meant to be called
    /// once from the initializing thread; every failure aborts the attempt.
    pub fn new(
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
        config: &ContextConfig,
    ) -> Result<Self, VkError> {
        let ctx = unsafe { build(window, display, config) }?;
        info!("Vulkan context ready");
        Ok(ctx)
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn queues(&self) -> &Queues {
        &self.queues
    }

    pub fn queue_assignment(&self) -> &QueueAssignment {
        &self.assignment
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            if let Some(messenger) = &mut self.messenger {
                messenger.destroy();
            }
            self.instance.destroy_instance(None);
        }
        info!("Vulkan context destroyed");
    }
}

unsafe fn build(
    window: &dyn HasWindowHandle,
    display: &dyn HasDisplayHandle,
    config: &ContextConfig,
) -> Result<Context, VkError> {
    let entry = Entry::linked();

    let dh: RawDisplayHandle = display.display_handle()?.as_raw();
    let wh: RawWindowHandle = window.window_handle()?.as_raw();

    // Instance-level negotiation: extensions (mandatory list comes from the
    // windowing system), then layers (no mandatory entries).
    let mandatory = window_extensions(dh)?;
    let extension_catalog = CapabilityCatalog::instance_extensions(&entry)?;
    let debug_extensions: &[&str] = if cfg!(debug_assertions) {
        debug::DEBUG_EXTENSIONS
    } else {
        &[]
    };
    let extensions = resolve(
        CapabilityScope::InstanceExtension,
        &mandatory,
        &config.instance_extensions,
        debug_extensions,
        &extension_catalog,
    )?;

    let layer_catalog = CapabilityCatalog::instance_layers(&entry)?;
    let debug_layers: &[&str] = if cfg!(debug_assertions) {
        debug::DEBUG_LAYERS
    } else {
        &[]
    };
    let layers = resolve(
        CapabilityScope::InstanceLayer,
        &[],
        &config.layers,
        debug_layers,
        &layer_catalog,
    )?;

    for name in &extensions.enabled {
        debug!("enabled instance extension: {name}");
    }
    for name in &layers.enabled {
        debug!("enabled instance layer: {name}");
    }

    let debug_utils_enabled = messenger_requested(&extensions.enabled);

    let instance = create_instance(&entry, config, &extensions, &layers, debug_utils_enabled)?;

    let messenger = if debug_utils_enabled {
        Some(DebugMessenger::new(&entry, &instance)?)
    } else {
        None
    };

    let surface = ash_window::create_surface(&entry, &instance, dh, wh, None)
        .map_err(VkError::CreateSurface)?;
    let surface_loader = surface::Instance::new(&entry, &instance);

    // Device-level negotiation: score candidates on the union of the
    // engine-mandated and caller-required extensions, then resolve the full
    // device list (optionals included) against the winner's catalog.
    let mut scoring_extensions: Vec<String> = REQUIRED_DEVICE_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect();
    scoring_extensions.extend(config.device_extensions.required.iter().cloned());

    let (physical, candidate) = device::pick_device(&instance, &scoring_extensions)?;

    let mandatory_device: Vec<String> = REQUIRED_DEVICE_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect();
    let device_extensions = resolve(
        CapabilityScope::DeviceExtension,
        &mandatory_device,
        &config.device_extensions,
        &[],
        &candidate.extensions,
    )?;
    for name in &device_extensions.enabled {
        debug!("enabled device extension: {name}");
    }

    // Queue negotiation against the chosen device.
    let profiles = queue::profile_families(&instance, physical, &surface_loader, surface);
    let assignment = queue::allocate(&profiles)?;
    let requests = queue::queue_requests(&assignment);
    for purpose in QueuePurpose::ALL {
        let slot = assignment.slot(purpose);
        debug!(
            "queue {purpose}: family {} index {}",
            slot.family, slot.index
        );
    }

    let device = create_device(&instance, physical, &device_extensions, &requests)?;

    let graphics_slot = assignment.slot(QueuePurpose::Graphics);
    let transfer_slot = assignment.slot(QueuePurpose::Transfer);
    let present_slot = assignment.slot(QueuePurpose::Present);
    let compute_slot = assignment.slot(QueuePurpose::Compute);
    let queues = Queues {
        graphics: device.get_device_queue(graphics_slot.family, graphics_slot.index),
        transfer: device.get_device_queue(transfer_slot.family, transfer_slot.index),
        present: device.get_device_queue(present_slot.family, present_slot.index),
        compute: device.get_device_queue(compute_slot.family, compute_slot.index),
    };

    Ok(Context {
        _entry: entry,
        instance,
        messenger,
        surface_loader,
        surface,
        physical,
        device,
        assignment,
        queues,
    })
}

/// Surface extensions the windowing system needs. Missing any of these is
/// fatal, so they feed the resolver's mandatory list.
unsafe fn window_extensions(display: RawDisplayHandle) -> Result<Vec<String>, VkError> {
    let names = ash_window::enumerate_required_extensions(display)
        .map_err(|e| VkError::Enumerate(CapabilityScope::InstanceExtension, e))?;
    Ok(names
        .iter()
        .map(|&ptr| CStr::from_ptr(ptr).to_string_lossy().into_owned())
        .collect())
}

unsafe fn create_instance(
    entry: &Entry,
    config: &ContextConfig,
    extensions: &Resolution,
    layers: &Resolution,
    debug_chain: bool,
) -> Result<Instance, VkError> {
    let app_name = CString::new(config.app_name.as_str())?;
    let engine_name = CString::new(kiln_core::ENGINE.name)?;

    let extension_names = to_cstrings(&extensions.enabled)?;
    let extension_ptrs: Vec<*const c_char> = extension_names.iter().map(|n| n.as_ptr()).collect();
    let layer_names = to_cstrings(&layers.enabled)?;
    let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|n| n.as_ptr()).collect();

    let app_info = vk::ApplicationInfo {
        s_type: vk::StructureType::APPLICATION_INFO,
        p_application_name: app_name.as_ptr(),
        application_version: version_to_vk(config.app_version),
        p_engine_name: engine_name.as_ptr(),
        engine_version: version_to_vk(kiln_core::ENGINE.version),
        api_version: vk::API_VERSION_1_0,
        ..Default::default()
    };

    // Chaining the messenger create-info covers instance creation and
    // destruction, before the standalone messenger exists.
    let debug_info = debug::messenger_create_info();
    let p_next: *const c_void = if debug_chain {
        &debug_info as *const _ as *const c_void
    } else {
        std::ptr::null()
    };

    let create_info = vk::InstanceCreateInfo {
        s_type: vk::StructureType::INSTANCE_CREATE_INFO,
        p_next,
        p_application_info: &app_info,
        enabled_layer_count: layer_ptrs.len() as u32,
        pp_enabled_layer_names: layer_ptrs.as_ptr(),
        enabled_extension_count: extension_ptrs.len() as u32,
        pp_enabled_extension_names: extension_ptrs.as_ptr(),
        ..Default::default()
    };

    entry
        .create_instance(&create_info, None)
        .map_err(VkError::CreateInstance)
}

unsafe fn create_device(
    instance: &Instance,
    physical: vk::PhysicalDevice,
    extensions: &Resolution,
    requests: &[queue::QueueRequest],
) -> Result<Device, VkError> {
    let priorities = [QUEUE_PRIORITY; 4];
    let queue_infos: Vec<_> = requests
        .iter()
        .map(|request| vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            queue_family_index: request.family,
            queue_count: request.count,
            p_queue_priorities: priorities.as_ptr(),
            ..Default::default()
        })
        .collect();

    let extension_names = to_cstrings(&extensions.enabled)?;
    let extension_ptrs: Vec<*const c_char> = extension_names.iter().map(|n| n.as_ptr()).collect();

    // No optional device features are enabled yet.
    let features = vk::PhysicalDeviceFeatures::default();

    let create_info = vk::DeviceCreateInfo {
        s_type: vk::StructureType::DEVICE_CREATE_INFO,
        queue_create_info_count: queue_infos.len() as u32,
        p_queue_create_infos: queue_infos.as_ptr(),
        enabled_extension_count: extension_ptrs.len() as u32,
        pp_enabled_extension_names: extension_ptrs.as_ptr(),
        p_enabled_features: &features,
        ..Default::default()
    };

    instance
        .create_device(physical, &create_info, None)
        .map_err(VkError::CreateDevice)
}

/// The messenger is a debug-configuration tool. A release-build config may
/// still list `VK_EXT_debug_utils` and get the extension enabled, but the
/// messenger itself is never created outside debug builds.
fn messenger_requested(enabled: &[String]) -> bool {
    cfg!(debug_assertions)
        && enabled
            .iter()
            .any(|name| name == debug::DEBUG_EXTENSIONS[0])
}

fn to_cstrings(names: &[String]) -> Result<Vec<CString>, VkError> {
    names
        .iter()
        .map(|name| CString::new(name.as_str()).map_err(VkError::from))
        .collect()
}

fn version_to_vk(version: Version) -> u32 {
    vk::make_api_version(0, version.major, version.minor, version.patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_packing_round_trips() {
        let packed = version_to_vk(Version::new(1, 2, 3));
        assert_eq!(vk::api_version_major(packed), 1);
        assert_eq!(vk::api_version_minor(packed), 2);
        assert_eq!(vk::api_version_patch(packed), 3);
    }

    #[test]
    fn engine_device_extensions_include_swapchain() {
        assert!(REQUIRED_DEVICE_EXTENSIONS.contains(&"VK_KHR_swapchain"));
    }

    #[test]
    fn messenger_only_in_debug_builds() {
        let with_debug_utils = vec![
            "VK_KHR_surface".to_string(),
            "VK_EXT_debug_utils".to_string(),
        ];
        let without = vec!["VK_KHR_surface".to_string()];

        assert_eq!(
            messenger_requested(&with_debug_utils),
            cfg!(debug_assertions)
        );
        assert!(!messenger_requested(&without));
    }

    #[test]
    fn to_cstrings_rejects_interior_nul() {
        let names = vec!["bad\0name".to_string()];
        assert!(matches!(to_cstrings(&names), Err(VkError::InvalidName(_))));
    }
}
