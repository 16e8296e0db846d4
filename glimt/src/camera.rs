use glam::{uvec2, Mat4, Quat, UVec2, Vec2, Vec3, Vec4};

use crate::{gpu, Settings};

/// Host-side camera description; serialized into the viewing-pyramid form
/// the generate kernel consumes.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,

    /// Vertical field of view, radians.
    pub fov_y: f32,

    pub viewport_size: UVec2,
}

impl Camera {
    /// Rows of the frame buffers start at a multiple of this, so warps read
    /// them aligned.
    pub const PITCH_ALIGNMENT: u32 = 64;

    pub fn screen_pitch(&self) -> u32 {
        let align = Self::PITCH_ALIGNMENT;

        (self.viewport_size.x + align - 1) / align * align
    }

    pub fn pixel_count(&self) -> usize {
        (self.viewport_size.x as usize) * (self.viewport_size.y as usize)
    }

    /// Size of a screen-shaped buffer in elements (pitch times height).
    pub fn padded_pixel_count(&self) -> usize {
        (self.screen_pitch() as usize) * (self.viewport_size.y as usize)
    }

    /// View-projection matrix for the external rasterizer; the same matrix
    /// (from the previous frame) produces the motion G-buffer.
    pub fn view_projection(&self) -> Mat4 {
        let projection = Mat4::perspective_rh(
            self.fov_y,
            self.viewport_size.x as f32 / self.viewport_size.y as f32,
            0.1,
            10000.0,
        );

        let view =
            Mat4::from_rotation_translation(self.rotation, self.position)
                .inverse();

        projection * view
    }

    /// Whether this describes the same view as `other`, within the epsilon
    /// used to decide that the camera "moved".
    pub fn is_approx_eq(&self, other: &Self) -> bool {
        self.viewport_size == other.viewport_size
            && self.position.abs_diff_eq(other.position, 1.0e-6)
            && self.rotation.abs_diff_eq(other.rotation, 1.0e-6)
            && (self.fov_y - other.fov_y).abs() < 1.0e-6
    }

    pub(crate) fn serialize(
        &self,
        settings: &Settings,
        jitter: Vec2,
    ) -> gpu::Camera {
        let width = self.viewport_size.x as f32;
        let height = self.viewport_size.y as f32;

        let half_width = 0.5 * width;
        let half_height = 0.5 * height;

        // Distance to the viewing plane, in pixel units
        let d = half_height / (0.5 * self.fov_y).tan();

        let bottom_left =
            self.rotation * Vec3::new(-half_width, -half_height, -d);

        let axis_x = self.rotation * Vec3::X;
        let axis_y = self.rotation * Vec3::Y;

        let cone_angle =
            (2.0 * (0.5 * self.fov_y).tan() / height).atan();

        gpu::Camera {
            position: self.position.extend(settings.camera_aperture),
            bottom_left: bottom_left.extend(settings.camera_focal_distance),
            axis_x: axis_x.extend(jitter.x),
            axis_y: axis_y.extend(jitter.y),
            screen: Vec4::new(
                f32::from_bits(self.viewport_size.x),
                f32::from_bits(self.viewport_size.y),
                f32::from_bits(self.screen_pitch()),
                cone_angle,
            ),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: 90.0f32.to_radians(),
            viewport_size: uvec2(1280, 720),
        }
    }
}

/// The 4-cycle Halton jitter driving TAA's sub-pixel offsets, in pixel
/// units.
pub(crate) fn halton_jitter(index: u32) -> Vec2 {
    const HALTON_X: [f32; 4] = [0.3, 0.7, 0.2, 0.8];
    const HALTON_Y: [f32; 4] = [0.2, 0.8, 0.7, 0.3];

    let index = (index & 3) as usize;

    Vec2::new(HALTON_X[index] - 0.5, HALTON_Y[index] - 0.5)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn pitch_is_aligned() {
        let camera = Camera {
            viewport_size: uvec2(1280, 720),
            ..Default::default()
        };

        assert_eq!(1280, camera.screen_pitch());

        let camera = Camera {
            viewport_size: uvec2(1000, 500),
            ..Default::default()
        };

        assert_eq!(1024, camera.screen_pitch());
        assert_eq!(1024 * 500, camera.padded_pixel_count());
    }

    #[test]
    fn serialized_camera_looks_forward() {
        let camera = Camera::default();

        let serialized =
            camera.serialize(&Settings::default(), Vec2::ZERO);

        // Center pixel's ray points down -z for an identity rotation
        let center = serialized.ray(
            glam::vec2(640.0, 360.0),
            Vec2::ZERO,
        );

        assert_relative_eq!(center.direction().x, 0.0, epsilon = 1.0e-6);
        assert_relative_eq!(center.direction().y, 0.0, epsilon = 1.0e-6);
        assert_relative_eq!(center.direction().z, -1.0, epsilon = 1.0e-6);
    }

    #[test]
    fn halton_cycles() {
        assert_eq!(halton_jitter(0), halton_jitter(4));
        assert_ne!(halton_jitter(0), halton_jitter(1));

        for index in 0..4 {
            let jitter = halton_jitter(index);

            assert!(jitter.x.abs() <= 0.5);
            assert!(jitter.y.abs() <= 0.5);
        }
    }

    #[test]
    fn movement_detection() {
        let camera = Camera::default();
        let mut moved = camera.clone();

        assert!(camera.is_approx_eq(&moved));

        moved.position.x += 0.1;

        assert!(!camera.is_approx_eq(&moved));
    }
}
