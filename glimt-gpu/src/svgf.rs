use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Vec2, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::Normal;

/// History length saturates here; at 255 frames the temporal blend factor
/// has long since bottomed out anyway.
pub const SVGF_HISTORY_LIMIT: u32 = 255;

/// History below this many frames falls back to spatial variance estimation.
pub const SVGF_SPATIAL_VARIANCE_THRESHOLD: u32 = 4;

/// Edge-stopping parameters of the À-trous filter; uploaded as a uniform.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct SvgfParams {
    pub phi_luminance: f32,
    pub phi_normal: f32,
    pub phi_depth: f32,
    pub _pad: f32,
}

impl Default for SvgfParams {
    fn default() -> Self {
        Self {
            phi_luminance: 4.0,
            phi_normal: 128.0,
            phi_depth: 1.0,
            _pad: 0.0,
        }
    }
}

pub fn advance_history(history: u32) -> u32 {
    (history + 1).min(SVGF_HISTORY_LIMIT)
}

/// Temporal blend factor; young histories lean on the current frame, mature
/// ones settle at 0.2.
pub fn temporal_alpha(history: u32) -> f32 {
    (1.0 / history.max(1) as f32).max(0.2)
}

pub fn edge_stop_luminance(
    center_luma: f32,
    sample_luma: f32,
    denominator: f32,
) -> f32 {
    (-(center_luma - sample_luma).abs() / denominator.max(1.0e-8)).exp()
}

pub fn edge_stop_normal(
    center_normal: Vec3,
    sample_normal: Vec3,
    phi_normal: f32,
) -> f32 {
    center_normal.dot(sample_normal).max(0.0).powf(phi_normal)
}

pub fn edge_stop_depth(
    center_depth: f32,
    sample_depth: f32,
    denominator: f32,
) -> f32 {
    (-(center_depth - sample_depth).abs() / denominator.max(1.0e-8)).exp()
}

/// B3-spline coefficients of the 5x5 À-trous kernel.
pub fn atrous_kernel(offset: IVec2) -> f32 {
    const H: [f32; 3] = [3.0 / 8.0, 1.0 / 4.0, 1.0 / 16.0];

    H[offset.x.abs() as usize] * H[offset.y.abs() as usize]
}

/// Whether a reprojected history sample still describes the same surface;
/// depth is compared with a leeway proportional to the screen-space depth
/// gradient so slanted walls don't reject their own history.
pub fn reprojection_valid(
    prev_normal: Vec3,
    normal: Vec3,
    prev_depth: f32,
    depth: f32,
    depth_gradient: f32,
) -> bool {
    if prev_depth <= 0.0 {
        return false;
    }

    let depth_leeway = 2.0 * depth_gradient.abs() + 1.0e-2;

    (prev_depth - depth).abs() / depth.max(1.0e-4) < depth_leeway
        && prev_normal.dot(normal) > 0.9
}

/// Packs the surface description the next frame's reprojection validates
/// against.
pub fn pack_normal_depth(normal: Vec3, depth: f32) -> Vec4 {
    let encoded = Normal::encode(normal);

    Vec4::new(encoded.x, encoded.y, depth, 0.0)
}

pub fn unpack_normal_depth(packed: Vec4) -> (Vec3, f32) {
    (Normal::decode(Vec2::new(packed.x, packed.y)), packed.z)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{ivec2, vec3};

    use super::*;

    #[test]
    fn history_saturates() {
        assert_eq!(1, advance_history(0));
        assert_eq!(SVGF_HISTORY_LIMIT, advance_history(SVGF_HISTORY_LIMIT));
        assert_eq!(
            SVGF_HISTORY_LIMIT,
            advance_history(SVGF_HISTORY_LIMIT - 1)
        );
    }

    #[test]
    fn alpha_settles_at_one_fifth() {
        assert_relative_eq!(temporal_alpha(1), 1.0);
        assert_relative_eq!(temporal_alpha(2), 0.5);
        assert_relative_eq!(temporal_alpha(100), 0.2);
    }

    #[test]
    fn edge_stops_peak_at_equality() {
        assert_relative_eq!(edge_stop_luminance(0.5, 0.5, 1.0), 1.0);
        assert!(edge_stop_luminance(0.5, 5.0, 1.0) < 0.05);

        let n = vec3(0.0, 1.0, 0.0);

        assert_relative_eq!(edge_stop_normal(n, n, 128.0), 1.0);
        assert!(edge_stop_normal(n, vec3(1.0, 0.0, 0.0), 128.0) < 1.0e-6);

        assert_relative_eq!(edge_stop_depth(3.0, 3.0, 1.0), 1.0);
        assert!(edge_stop_depth(3.0, 30.0, 1.0) < 1.0e-6);
    }

    #[test]
    fn kernel_is_symmetric_and_peaks_at_center() {
        let center = atrous_kernel(ivec2(0, 0));

        for x in -2..=2 {
            for y in -2..=2 {
                let w = atrous_kernel(ivec2(x, y));

                assert!(w <= center);
                assert_relative_eq!(w, atrous_kernel(ivec2(-x, -y)));
            }
        }
    }

    #[test]
    fn reprojection_rejects_disocclusions() {
        let n = vec3(0.0, 1.0, 0.0);

        assert!(reprojection_valid(n, n, 10.0, 10.0, 0.0));
        assert!(!reprojection_valid(n, n, 5.0, 10.0, 0.0));
        assert!(!reprojection_valid(vec3(1.0, 0.0, 0.0), n, 10.0, 10.0, 0.0));
        assert!(!reprojection_valid(n, n, 0.0, 10.0, 0.0));
    }

    #[test]
    fn normal_depth_round_trip() {
        let n = vec3(0.3, 0.8, -0.52).normalize();
        let (decoded, depth) = unpack_normal_depth(pack_normal_depth(n, 7.5));

        assert_relative_eq!(depth, 7.5);
        assert!(decoded.dot(n) > 0.999);
    }
}
