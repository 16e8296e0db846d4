use glam::{vec3, Vec3};

use crate::F32Ext;

pub trait Vec3Ext {
    /// Perceived brightness; used by the denoiser's moment estimation and by
    /// Russian roulette.
    fn luminance(self) -> f32;

    /// Reflects `self` across given normal.
    fn reflect(self, normal: Self) -> Self;

    /// See [`F32Ext::sanitize()`].
    fn sanitize(self) -> Self;
}

impl Vec3Ext for Vec3 {
    fn luminance(self) -> f32 {
        self.dot(vec3(0.2126, 0.7152, 0.0722))
    }

    fn reflect(self, normal: Self) -> Self {
        self - 2.0 * self.dot(normal) * normal
    }

    fn sanitize(self) -> Self {
        vec3(self.x.sanitize(), self.y.sanitize(), self.z.sanitize())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn reflect() {
        let reflected = vec3(1.0, -1.0, 0.0).reflect(vec3(0.0, 1.0, 0.0));

        assert_relative_eq!(reflected.x, 1.0);
        assert_relative_eq!(reflected.y, 1.0);
        assert_relative_eq!(reflected.z, 0.0);
    }
}
