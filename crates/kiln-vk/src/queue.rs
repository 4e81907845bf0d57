// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeMap;
use std::fmt;

use ash::khr::surface;
use ash::{vk, Instance};

use crate::error::VkError;

/// Logical role a queue is assigned to. Declaration order is the fixed
/// allocation order; queue indices within a family depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueuePurpose {
    Graphics,
    Transfer,
    Present,
    Compute,
}

impl QueuePurpose {
    pub const ALL: [QueuePurpose; 4] = [
        QueuePurpose::Graphics,
        QueuePurpose::Transfer,
        QueuePurpose::Present,
        QueuePurpose::Compute,
    ];
}

impl fmt::Display for QueuePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueuePurpose::Graphics => "graphics",
            QueuePurpose::Transfer => "transfer",
            QueuePurpose::Present => "present",
            QueuePurpose::Compute => "compute",
        })
    }
}

/// Per-family capability snapshot. `present_support` is surface-dependent
/// and queried per surface, not a property of the family alone.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyProfile {
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
    pub present_support: bool,
}

impl QueueFamilyProfile {
    fn eligible_for(&self, purpose: QueuePurpose) -> bool {
        match purpose {
            QueuePurpose::Graphics => self.flags.contains(vk::QueueFlags::GRAPHICS),
            QueuePurpose::Transfer => self.flags.contains(vk::QueueFlags::TRANSFER),
            QueuePurpose::Compute => self.flags.contains(vk::QueueFlags::COMPUTE),
            QueuePurpose::Present => self.present_support,
        }
    }

    /// Fewer advertised capability bits means more specialized.
    fn advertised_bits(&self) -> u32 {
        self.flags.as_raw().count_ones()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSlot {
    pub family: u32,
    pub index: u32,
}

/// Purpose → (family, index) map for one chosen device. For any family the
/// number of slots pointing at it never exceeds that family's queue count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAssignment {
    slots: [QueueSlot; 4],
}

impl QueueAssignment {
    pub fn slot(&self, purpose: QueuePurpose) -> QueueSlot {
        self.slots[purpose as usize]
    }
}

/// One logical-device queue-creation record per distinct family in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRequest {
    pub family: u32,
    pub count: u32,
}

pub const QUEUE_PRIORITY: f32 = 1.0;

/// Assigns each purpose a queue family and a queue index within it.
///
/// Purposes are placed independently, in [`QueuePurpose::ALL`] order. Each
/// prefers the most specialized eligible family so a transfer-only family
/// is taken for transfer work before a general graphics+compute+transfer
/// family, leaving the general family's capacity to purposes that need it.
/// A family whose queues are all taken is no longer eligible; a purpose
/// whose capable families are all full fails with
/// [`VkError::QueueCapacityExhausted`] instead of requesting an
/// out-of-range queue index at device-creation time.
pub fn allocate(profiles: &[QueueFamilyProfile]) -> Result<QueueAssignment, VkError> {
    let mut used = vec![0u32; profiles.len()];
    let mut slots = [QueueSlot {
        family: 0,
        index: 0,
    }; 4];

    for purpose in QueuePurpose::ALL {
        let mut best: Option<usize> = None;
        let mut capable = false;

        for (i, profile) in profiles.iter().enumerate() {
            if !profile.eligible_for(purpose) {
                continue;
            }
            capable = true;
            if used[i] >= profile.queue_count {
                continue;
            }
            // Strictly fewer bits wins; ties keep the earlier family.
            let better = match best {
                Some(b) => profile.advertised_bits() < profiles[b].advertised_bits(),
                None => true,
            };
            if better {
                best = Some(i);
            }
        }

        let family = match best {
            Some(i) => i,
            None if capable => return Err(VkError::QueueCapacityExhausted(purpose)),
            None => return Err(VkError::NoFamilyFor(purpose)),
        };

        slots[purpose as usize] = QueueSlot {
            family: family as u32,
            index: used[family],
        };
        used[family] += 1;
    }

    Ok(QueueAssignment { slots })
}

/// Groups an assignment into per-family creation records, ordered by
/// family index so the array handed to the driver is stable across runs.
pub fn queue_requests(assignment: &QueueAssignment) -> Vec<QueueRequest> {
    let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
    for purpose in QueuePurpose::ALL {
        let slot = assignment.slot(purpose);
        let count = counts.entry(slot.family).or_insert(0);
        *count = (*count).max(slot.index + 1);
    }
    counts
        .into_iter()
        .map(|(family, count)| QueueRequest { family, count })
        .collect()
}

/// Snapshots every queue family of a device, including per-surface present
/// support. A failed support query counts as no support.
pub unsafe fn profile_families(
    instance: &Instance,
    phys: vk::PhysicalDevice,
    surface_loader: &surface::Instance,
    surface: vk::SurfaceKHR,
) -> Vec<QueueFamilyProfile> {
    instance
        .get_physical_device_queue_family_properties(phys)
        .iter()
        .enumerate()
        .map(|(i, family)| QueueFamilyProfile {
            flags: family.queue_flags,
            queue_count: family.queue_count,
            present_support: surface_loader
                .get_physical_device_surface_support(phys, i as u32, surface)
                .unwrap_or(false),
        })
        .collect()
}
