//! Compute entry points of the wavefront pipeline; one module per stage.
//!
//! Thin wrappers only: the algorithms live in `glimt-gpu` where the host can
//! compile and test them natively.

#![cfg_attr(target_arch = "spirv", no_std)]

pub mod accumulate;
pub mod generate;
pub mod primary;
pub mod shade_dielectric;
pub mod shade_diffuse;
pub mod shade_glossy;
pub mod shadow_trace;
pub mod sort;
pub mod svgf;
pub mod taa;
pub mod trace;
