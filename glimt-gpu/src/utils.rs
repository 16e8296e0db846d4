mod f32_ext;
mod u32_ext;
mod vec3_ext;

use spirv_std::Image;

pub use self::f32_ext::*;
pub use self::u32_ext::*;
pub use self::vec3_ext::*;

pub type Tex<'a> = &'a Image!(2D, type = f32, sampled);
pub type TexRgba32f<'a> = &'a Image!(2D, format = rgba32f, sampled = false);

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// One step of an online average: folds the `frames + 1`-th sample into the
/// running mean. `frames == 0` restarts the sequence.
pub fn online_mean(
    previous: glam::Vec3,
    sample: glam::Vec3,
    frames: u32,
) -> glam::Vec3 {
    if frames == 0 {
        sample
    } else {
        previous + (sample - previous) / (frames as f32 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn online_mean_equals_the_batch_mean() {
        let samples = [
            vec3(1.0, 0.0, 2.0),
            vec3(3.0, 1.0, 0.0),
            vec3(2.0, 5.0, 4.0),
            vec3(0.0, 2.0, 2.0),
        ];

        let mut running = glam::Vec3::ZERO;

        for (frames, sample) in samples.iter().enumerate() {
            running = online_mean(running, *sample, frames as u32);
        }

        let mean = samples.iter().sum::<glam::Vec3>() / samples.len() as f32;

        assert!((running - mean).length() < 1.0e-6);
    }

    #[test]
    fn online_mean_restarts_at_zero() {
        let sample = vec3(9.0, 9.0, 9.0);

        assert_eq!(sample, online_mean(vec3(1.0, 2.0, 3.0), sample, 0));
    }
}
