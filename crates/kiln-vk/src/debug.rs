// SPDX-License-Identifier: CEPL-1.0
//! Validation-layer plumbing. Negotiated like any optional capability, but
//! only requested at all in debug builds.

use std::ffi::{c_void, CStr};

use ash::ext::debug_utils;
use ash::{vk, Entry, Instance};
use tracing::{error, info, trace, warn};

use crate::error::VkError;

/// Extra names appended to the optional lists of a debug-build resolution.
pub const DEBUG_EXTENSIONS: &[&str] = &["VK_EXT_debug_utils"];
pub const DEBUG_LAYERS: &[&str] = &["VK_LAYER_KHRONOS_validation"];

pub struct DebugMessenger {
    loader: debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

/// Shared between messenger creation and the instance create-info `p_next`
/// chain, so validation also covers instance create/destroy itself.
pub fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    }
}

impl DebugMessenger {
    pub unsafe fn new(entry: &Entry, instance: &Instance) -> Result<Self, VkError> {
        let loader = debug_utils::Instance::new(entry, instance);
        let messenger = loader
            .create_debug_utils_messenger(&messenger_create_info(), None)
            .map_err(VkError::CreateDebugMessenger)?;
        Ok(DebugMessenger { loader, messenger })
    }

    pub unsafe fn destroy(&mut self) {
        self.loader
            .destroy_debug_utils_messenger(self.messenger, None);
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _kind: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if data.is_null() || (*data).p_message.is_null() {
        String::new()
    } else {
        CStr::from_ptr((*data).p_message)
            .to_string_lossy()
            .into_owned()
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!("vulkan: {message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!("vulkan: {message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        info!("vulkan: {message}");
    } else {
        trace!("vulkan: {message}");
    }

    vk::FALSE
}
