#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Conical footprint carried along a ray to estimate texture LOD (after
/// Akenine-Möller et al. 2021): `angle` is the cone's spread, `width` its
/// radius at the current ray origin.
#[derive(Copy, Clone, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct RayCone {
    pub angle: f32,
    pub width: f32,
}

impl RayCone {
    /// Cone of a primary ray: zero width at the pinhole, spread covering one
    /// pixel of the viewing pyramid.
    pub fn from_camera(fov_y: f32, screen_height: f32) -> Self {
        Self {
            angle: (2.0 * (0.5 * fov_y).tan() / screen_height).atan(),
            width: 0.0,
        }
    }

    /// Grows the footprint over the distance to the next hit.
    pub fn propagate(self, distance: f32) -> Self {
        Self {
            angle: self.angle,
            width: self.width + self.angle * distance,
        }
    }

    /// Widens the spread at a curved surface; flat surfaces keep the angle.
    pub fn widen(self, surface_spread: f32) -> Self {
        Self {
            angle: self.angle + surface_spread,
            width: self.width,
        }
    }

    /// Mip level for a triangle with the given base LOD, viewed at an angle
    /// of `n_dot_d`; `atlas_bias` folds the texture resolution in.
    pub fn lod(self, triangle_lod: f32, n_dot_d: f32, atlas_bias: f32) -> f32 {
        let width = self.width.abs().max(1.0e-8);
        let n_dot_d = n_dot_d.abs().max(1.0e-4);

        triangle_lod + atlas_bias + width.log2() - n_dot_d.log2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_grows_with_distance() {
        let cone = RayCone::from_camera(1.0, 1080.0);

        let near = cone.propagate(1.0);
        let far = cone.propagate(100.0);

        assert!(far.width > near.width);
        assert!(cone.angle > 0.0);
    }

    #[test]
    fn lod_grows_with_width_and_grazing_angles() {
        let cone = RayCone {
            angle: 0.001,
            width: 0.1,
        };

        let head_on = cone.lod(0.0, 1.0, 0.0);
        let grazing = cone.lod(0.0, 0.05, 0.0);

        assert!(grazing > head_on);

        let wider = RayCone {
            angle: 0.001,
            width: 0.4,
        };

        assert!(wider.lod(0.0, 1.0, 0.0) > head_on);
    }
}
