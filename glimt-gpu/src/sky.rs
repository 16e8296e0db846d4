use core::f32::consts::PI;

use glam::{Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Equirectangular sky image; a pure function of direction (sampling the
/// same direction twice always yields the same radiance).
#[derive(Clone, Copy)]
pub struct SkyView<'a> {
    data: &'a [Vec4],
    width: u32,
    height: u32,
}

impl<'a> SkyView<'a> {
    pub fn new(data: &'a [Vec4], width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    pub fn sample(&self, direction: Vec3) -> Vec3 {
        let u = 0.5 + direction.x.atan2(-direction.z) / (2.0 * PI);
        let v = direction.y.clamp(-1.0, 1.0).acos() / PI;

        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);

        unsafe {
            self.data
                .get_unchecked((x + y * self.width) as usize)
                .xyz()
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec;
    use alloc::vec::Vec;

    use glam::{vec3, vec4};

    use super::*;

    fn sky() -> Vec<Vec4> {
        // 4x2: top row red-ish gradient, bottom row blue
        vec![
            vec4(1.0, 0.0, 0.0, 0.0),
            vec4(0.8, 0.0, 0.0, 0.0),
            vec4(0.6, 0.0, 0.0, 0.0),
            vec4(0.4, 0.0, 0.0, 0.0),
            vec4(0.0, 0.0, 1.0, 0.0),
            vec4(0.0, 0.0, 1.0, 0.0),
            vec4(0.0, 0.0, 1.0, 0.0),
            vec4(0.0, 0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn is_pure() {
        let data = sky();
        let sky = SkyView::new(&data, 4, 2);

        let direction = vec3(0.3, 0.5, -0.8).normalize();

        assert_eq!(sky.sample(direction), sky.sample(direction));
    }

    #[test]
    fn up_hits_the_top_row() {
        let data = sky();
        let sky = SkyView::new(&data, 4, 2);

        let up = sky.sample(vec3(0.0, 1.0, 0.0));
        let down = sky.sample(vec3(0.0, -1.0, 0.0));

        assert!(up.x > 0.0 && up.z == 0.0);
        assert!(down.z > 0.0 && down.x == 0.0);
    }
}
