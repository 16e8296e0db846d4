use bytemuck::{Pod, Zeroable};
use glam::{uvec2, vec2, IVec2, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::Ray;

/// Camera in viewing-pyramid form, ready for primary ray generation: the
/// bottom-left corner and the two axes are pre-rotated and scaled so that a
/// pixel's direction is `bottom_left + x * axis_x + y * axis_y`.
///
/// ```text
/// position.w    - aperture radius
/// bottom_left.w - focal distance
/// axis_x.w      - jitter.x (TAA)
/// axis_y.w      - jitter.y (TAA)
/// screen        - bits: width, height, pitch, cone spread angle (f32)
/// ```
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Camera {
    pub position: Vec4,
    pub bottom_left: Vec4,
    pub axis_x: Vec4,
    pub axis_y: Vec4,
    pub screen: Vec4,
}

impl Camera {
    pub fn origin(&self) -> Vec3 {
        self.position.xyz()
    }

    pub fn aperture(&self) -> f32 {
        self.position.w
    }

    pub fn focal_distance(&self) -> f32 {
        self.bottom_left.w
    }

    pub fn jitter(&self) -> Vec2 {
        vec2(self.axis_x.w, self.axis_y.w)
    }

    pub fn screen_width(&self) -> u32 {
        self.screen.x.to_bits()
    }

    pub fn screen_height(&self) -> u32 {
        self.screen.y.to_bits()
    }

    /// Row stride of the frame buffers; the width rounded up so that rows
    /// start warp-aligned.
    pub fn screen_pitch(&self) -> u32 {
        self.screen.z.to_bits()
    }

    pub fn cone_angle(&self) -> f32 {
        self.screen.w
    }

    pub fn screen_size(&self) -> UVec2 {
        uvec2(self.screen_width(), self.screen_height())
    }

    pub fn contains(&self, pos: impl ToScreenPos) -> bool {
        let pos = pos.to_screen_pos();

        pos.x >= 0
            && pos.y >= 0
            && pos.x < self.screen_width() as i32
            && pos.y < self.screen_height() as i32
    }

    /// Maps a screen position to its frame-buffer index (pitch, not width).
    pub fn screen_to_idx(&self, pos: UVec2) -> u32 {
        pos.x + pos.y * self.screen_pitch()
    }

    /// Casts a primary ray through given sub-pixel position; `lens` is a
    /// point on the aperture (already scaled by the aperture radius) and
    /// displaces the origin for depth of field.
    pub fn ray(&self, pixel: Vec2, lens: Vec2) -> Ray {
        let direction = (self.bottom_left.xyz()
            + pixel.x * self.axis_x.xyz()
            + pixel.y * self.axis_y.xyz())
        .normalize();

        if self.aperture() <= 0.0 {
            return Ray::new(self.origin(), direction);
        }

        let focal_point = self.origin() + direction * self.focal_distance();

        let origin = self.origin()
            + lens.x * self.axis_x.xyz()
            + lens.y * self.axis_y.xyz();

        Ray::new(origin, (focal_point - origin).normalize())
    }
}

pub trait ToScreenPos {
    fn to_screen_pos(self) -> IVec2;
}

impl ToScreenPos for IVec2 {
    fn to_screen_pos(self) -> IVec2 {
        self
    }
}

impl ToScreenPos for UVec2 {
    fn to_screen_pos(self) -> IVec2 {
        self.as_ivec2()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, vec4};

    use super::*;

    fn camera() -> Camera {
        // 4x2 screen looking down -z, pinhole
        Camera {
            position: vec4(0.0, 0.0, 0.0, 0.0),
            bottom_left: vec3(-2.0, -1.0, -1.0).extend(10.0),
            axis_x: vec4(1.0, 0.0, 0.0, 0.0),
            axis_y: vec4(0.0, 1.0, 0.0, 0.0),
            screen: vec4(
                f32::from_bits(4),
                f32::from_bits(2),
                f32::from_bits(64),
                0.001,
            ),
        }
    }

    #[test]
    fn center_ray_looks_forward() {
        let ray = camera().ray(vec2(2.0, 1.0), Vec2::ZERO);

        assert_relative_eq!(ray.direction().x, 0.0);
        assert_relative_eq!(ray.direction().y, 0.0);
        assert_relative_eq!(ray.direction().z, -1.0);
    }

    #[test]
    fn screen_mapping() {
        let camera = camera();

        assert!(camera.contains(uvec2(3, 1)));
        assert!(!camera.contains(uvec2(4, 1)));
        assert!(!camera.contains(IVec2::new(-1, 0)));

        assert_eq!(64 + 2, camera.screen_to_idx(uvec2(2, 1)));
    }
}
