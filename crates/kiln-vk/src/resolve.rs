// SPDX-License-Identifier: CEPL-1.0
use tracing::warn;

use crate::catalog::CapabilityCatalog;
use crate::error::{CapabilityScope, VkError};

/// Caller-supplied name lists, in insertion order. Duplicates are the
/// caller's responsibility and are passed through untouched.
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl Requirements {
    pub fn required<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Requirements {
            required: names.into_iter().map(Into::into).collect(),
            optional: Vec::new(),
        }
    }
}

/// Outcome of one resolution step. `enabled` is what downstream creation
/// calls receive, in the order mandatory, required, optional-found,
/// debug-found. `skipped` records every optional or debug name that was
/// not present; each of those is also logged as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub enabled: Vec<String>,
    pub skipped: Vec<String>,
}

/// Resolves requirement lists against a capability catalog.
///
/// Mandatory names (platform prerequisites such as the windowing system's
/// surface extensions) are checked first and fail hard; required names fail
/// on the first miss; optional and debug names degrade to warnings. Output
/// ordering is deterministic because some drivers are sensitive to the
/// enabled-name array varying across runs.
pub fn resolve(
    scope: CapabilityScope,
    mandatory: &[String],
    requirements: &Requirements,
    debug_names: &[&str],
    catalog: &CapabilityCatalog,
) -> Result<Resolution, VkError> {
    let mut enabled = Vec::with_capacity(
        mandatory.len()
            + requirements.required.len()
            + requirements.optional.len()
            + debug_names.len(),
    );
    let mut skipped = Vec::new();

    for name in mandatory {
        if !catalog.contains(name) {
            return Err(VkError::MissingMandatoryCapability {
                scope,
                name: name.clone(),
            });
        }
        enabled.push(name.clone());
    }

    for name in &requirements.required {
        if !catalog.contains(name) {
            return Err(VkError::MissingRequiredCapability {
                scope,
                name: name.clone(),
            });
        }
        enabled.push(name.clone());
    }

    for name in &requirements.optional {
        if catalog.contains(name) {
            enabled.push(name.clone());
        } else {
            warn!("optional {scope} not present: {name}, skipping");
            skipped.push(name.clone());
        }
    }

    for &name in debug_names {
        if catalog.contains(name) {
            enabled.push(name.to_owned());
        } else {
            warn!("debug {scope} not present: {name}, skipping");
            skipped.push(name.to_owned());
        }
    }

    Ok(Resolution { enabled, skipped })
}
