// SPDX-License-Identifier: CEPL-1.0
use kiln_core::Version;

use crate::resolve::Requirements;

/// Everything the negotiation consumes from the caller. The name lists are
/// ordered; required names are fatal when absent, optional names degrade
/// to warnings.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub app_name: String,
    pub app_version: Version,
    pub instance_extensions: Requirements,
    pub layers: Requirements,
    pub device_extensions: Requirements,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            app_name: "kiln application".to_string(),
            app_version: Version::new(1, 0, 0),
            instance_extensions: Requirements::default(),
            layers: Requirements::default(),
            device_extensions: Requirements::default(),
        }
    }
}
