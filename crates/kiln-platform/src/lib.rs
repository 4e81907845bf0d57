// SPDX-License-Identifier: CEPL-1.0
//! Windowing seam: the rest of the workspace reaches winit through here.

pub use winit;
