use core::f32::consts::PI;

use glam::{vec2, vec3, UVec2, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Cheap per-thread white noise (PCG hash); seeded per dispatch from the
/// host so that consecutive frames decorrelate.
#[derive(Copy, Clone)]
pub struct WhiteNoise {
    state: u32,
}

impl WhiteNoise {
    pub fn new(seed: u32, id: UVec2) -> Self {
        Self {
            state: seed ^ (48619 * id.x) ^ (95461 * id.y),
        }
    }

    pub fn from_index(seed: u32, idx: u32) -> Self {
        Self {
            state: seed ^ (48619 * idx),
        }
    }

    /// Generates a uniform sample in range `(0.0, 1.0)`.
    pub fn sample(&mut self) -> f32 {
        (self.sample_int() as f32) / (u32::MAX as f32)
    }

    /// Generates a uniform sample in range `(0, u32::MAX)`.
    pub fn sample_int(&mut self) -> u32 {
        self.state = self.state * 747796405 + 2891336453;

        let word =
            ((self.state >> ((self.state >> 28) + 4)) ^ self.state) * 277803737;

        (word >> 22) ^ word
    }

    /// Generates a Gaussian sample (Box-Muller) with given sigma.
    pub fn sample_gaussian(&mut self, sigma: f32) -> f32 {
        let u1 = self.sample().max(1.0e-7);
        let u2 = self.sample();

        sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

/// Lane offsets of the three static blue-noise tables inside the combined
/// buffer the host uploads (sobol, then scrambling tile, then ranking tile).
pub const BLUE_NOISE_SOBOL: u32 = 0;
pub const BLUE_NOISE_SCRAMBLING_TILE: u32 = 256 * 256;
pub const BLUE_NOISE_RANKING_TILE: u32 = 256 * 256 + 128 * 128 * 8;
pub const BLUE_NOISE_LEN: usize = (256 * 256 + 2 * 128 * 128 * 8) as usize;

/// Low-discrepancy sampler over the three static blue-noise tables
/// (256-sample scrambled Sobol with per-pixel ranking, after Heitz et al.);
/// used wherever sample placement matters more than speed.
pub struct LdsBlueNoise<'a> {
    tables: &'a [u32],
    pixel: UVec2,
    sample_index: u32,
    sample_dimension: u32,
}

impl<'a> LdsBlueNoise<'a> {
    pub fn new(
        tables: &'a [u32],
        pixel: UVec2,
        sample_index: u32,
        sample_dimension: u32,
    ) -> Self {
        Self {
            tables,
            pixel,
            sample_index,
            sample_dimension,
        }
    }

    /// Generates a sample in `(0.0, 1.0)`, advancing the dimension.
    pub fn sample(&mut self) -> f32 {
        let dim = self.sample_dimension;

        self.sample_dimension += 1;
        self.sample_dim(dim)
    }

    pub fn sample_vec2(&mut self) -> Vec2 {
        vec2(self.sample(), self.sample())
    }

    fn get(&self, lane: u32) -> u32 {
        unsafe { *self.tables.get_unchecked(lane as usize) }
    }

    fn sample_dim(&self, dim: u32) -> f32 {
        let x = self.pixel.x & 127;
        let y = self.pixel.y & 127;
        let index = self.sample_index & 255;
        let dim = dim & 255;

        let tile = (dim & 7) + (x + y * 128) * 8;

        let ranked_index =
            index ^ self.get(BLUE_NOISE_RANKING_TILE + tile);

        let value = self.get(BLUE_NOISE_SOBOL + dim + ranked_index * 256);
        let value = value ^ self.get(BLUE_NOISE_SCRAMBLING_TILE + tile);

        (0.5 + value as f32) / 256.0
    }
}

/// Generates a cosine-weighted sample on the hemisphere around given normal;
/// the returned direction's pdf is `cos(theta) / PI`.
pub fn sample_hemisphere_cosine(normal: Vec3, u: Vec2) -> Vec3 {
    let radius = u.x.sqrt();
    let angle = 2.0 * PI * u.y;

    let b = normal.cross(vec3(0.0, 1.0, 1.0)).normalize();
    let t = b.cross(normal);

    let z = (1.0 - u.x).max(0.0).sqrt();

    (radius * angle.sin() * b + z * normal + radius * angle.cos() * t)
        .normalize()
}

/// Generates a uniform sample on a regular hexagon with given circumradius;
/// models the camera's aperture blades. `corner` picks the fan triangle and
/// must be uniform in `[0.0, 1.0)`.
pub fn sample_hexagon(u: Vec2, corner: f32, radius: f32) -> Vec2 {
    let corner = (corner * 6.0) as u32 % 6;

    let angle_a = (corner as f32) * (PI / 3.0);
    let angle_b = angle_a + PI / 3.0;

    let a = vec2(angle_a.cos(), angle_a.sin());
    let b = vec2(angle_b.cos(), angle_b.sin());

    let (mut s, mut t) = (u.x, u.y);

    if s + t > 1.0 {
        s = 1.0 - s;
        t = 1.0 - t;
    }

    (a * s + b * t) * radius
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3};

    use super::*;

    #[test]
    fn white_noise_is_uniformish() {
        let mut noise = WhiteNoise::new(0xcafe, uvec2(1, 2));
        let mut sum = 0.0;

        for _ in 0..1024 {
            let sample = noise.sample();

            assert!(sample >= 0.0 && sample <= 1.0);
            sum += sample;
        }

        let mean = sum / 1024.0;

        assert!(mean > 0.45 && mean < 0.55, "mean = {mean}");
    }

    #[test]
    fn hemisphere_respects_normal() {
        let normal = vec3(0.0, 1.0, 0.0);
        let mut noise = WhiteNoise::new(123, uvec2(0, 0));

        for _ in 0..256 {
            let dir = sample_hemisphere_cosine(
                normal,
                vec2(noise.sample(), noise.sample()),
            );

            assert!(dir.dot(normal) >= 0.0);
            assert!((dir.length() - 1.0).abs() < 1.0e-4);
        }
    }

    #[test]
    fn hexagon_stays_within_circumradius() {
        let mut noise = WhiteNoise::new(7, uvec2(0, 0));

        for _ in 0..256 {
            let point = sample_hexagon(
                vec2(noise.sample(), noise.sample()),
                noise.sample(),
                2.0,
            );

            assert!(point.length() <= 2.0 + 1.0e-4);
        }
    }
}
