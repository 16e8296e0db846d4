use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use spirv_std::Sampler;

use crate::Tex;

pub const MATERIAL_DIFFUSE: u32 = 0;
pub const MATERIAL_DIELECTRIC: u32 = 1;
pub const MATERIAL_GLOSSY: u32 = 2;
pub const MATERIAL_LIGHT: u32 = 3;

/// Packed material; a tagged variant over four kinds, with the tag deciding
/// which shading queue the sort stage routes a hit into.
///
/// ```text
/// d0.xyz  - diffuse tint   (diffuse, glossy)
///           absorption     (dielectric)
///           emission       (light)
/// d0.w    - kind tag (bits)
/// d1.x    - index of refraction (dielectric, glossy)
/// d1.y    - roughness           (glossy)
/// d2      - albedo-texture atlas rectangle; zero when untextured
/// ```
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Material {
    pub d0: Vec4,
    pub d1: Vec4,
    pub d2: Vec4,
}

impl Material {
    pub fn diffuse(tint: Vec3) -> Self {
        Self {
            d0: tint.extend(f32::from_bits(MATERIAL_DIFFUSE)),
            ..Default::default()
        }
    }

    pub fn dielectric(ior: f32, absorption: Vec3) -> Self {
        Self {
            d0: absorption.extend(f32::from_bits(MATERIAL_DIELECTRIC)),
            d1: Vec4::new(ior, 0.0, 0.0, 0.0),
            ..Default::default()
        }
    }

    pub fn glossy(tint: Vec3, roughness: f32, ior: f32) -> Self {
        Self {
            d0: tint.extend(f32::from_bits(MATERIAL_GLOSSY)),
            d1: Vec4::new(ior, roughness, 0.0, 0.0),
            ..Default::default()
        }
    }

    pub fn light(emission: Vec3) -> Self {
        Self {
            d0: emission.extend(f32::from_bits(MATERIAL_LIGHT)),
            ..Default::default()
        }
    }

    pub fn with_texture(mut self, atlas_rect: Vec4) -> Self {
        self.d2 = atlas_rect;
        self
    }

    pub fn kind(&self) -> u32 {
        self.d0.w.to_bits()
    }

    pub fn is_light(&self) -> bool {
        self.kind() == MATERIAL_LIGHT
    }

    pub fn tint(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn emission(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn absorption(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn ior(&self) -> f32 {
        self.d1.x
    }

    pub fn roughness(&self) -> f32 {
        self.d1.y
    }

    pub fn has_texture(&self) -> bool {
        self.d2 != Vec4::ZERO
    }

    /// Samples the albedo with an explicit mip level; bounces >= 1 use this,
    /// with the level derived from the ray cone's width.
    pub fn albedo(
        &self,
        atlas_tex: Tex,
        atlas_sampler: &Sampler,
        uv: Vec2,
        lod: f32,
    ) -> Vec3 {
        if self.has_texture() {
            let uv = self.atlas_uv(uv);
            let texel: Vec4 = atlas_tex.sample_by_lod(*atlas_sampler, uv, lod);

            self.tint() * texel.xyz()
        } else {
            self.tint()
        }
    }

    /// Samples the albedo anisotropically from screen-space UV gradients;
    /// bounce 0 uses this since the rasterized G-buffer provides gradients.
    pub fn albedo_grad(
        &self,
        atlas_tex: Tex,
        atlas_sampler: &Sampler,
        uv: Vec2,
        uv_dx: Vec2,
        uv_dy: Vec2,
    ) -> Vec3 {
        if self.has_texture() {
            let scale = self.d2.zw();

            let texel: Vec4 = atlas_tex.sample_by_gradient(
                *atlas_sampler,
                self.atlas_uv(uv),
                uv_dx * scale,
                uv_dy * scale,
            );

            self.tint() * texel.xyz()
        } else {
            self.tint()
        }
    }

    fn atlas_uv(&self, mut uv: Vec2) -> Vec2 {
        let wrap = |t: f32| {
            if t >= 0.0 {
                t % 1.0
            } else {
                1.0 - (-t % 1.0)
            }
        };

        uv.x = wrap(uv.x);
        uv.y = wrap(uv.y);

        self.d2.xy() + uv * self.d2.zw()
    }
}

#[derive(Clone, Copy)]
pub struct MaterialsView<'a> {
    buffer: &'a [Material],
}

impl<'a> MaterialsView<'a> {
    pub fn new(buffer: &'a [Material]) -> Self {
        Self { buffer }
    }

    pub fn get(&self, id: u32) -> Material {
        unsafe { *self.buffer.get_unchecked(id as usize) }
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            MATERIAL_DIFFUSE,
            Material::diffuse(vec3(1.0, 0.0, 1.0)).kind()
        );

        assert_eq!(
            MATERIAL_DIELECTRIC,
            Material::dielectric(1.5, Vec3::ZERO).kind()
        );

        assert_eq!(
            MATERIAL_GLOSSY,
            Material::glossy(Vec3::ONE, 0.2, 1.3).kind()
        );

        assert!(Material::light(vec3(10.0, 10.0, 10.0)).is_light());
    }

    #[test]
    fn fields_survive_packing() {
        let material = Material::glossy(vec3(0.5, 0.25, 0.125), 0.33, 1.45);

        assert_eq!(vec3(0.5, 0.25, 0.125), material.tint());
        assert_eq!(0.33, material.roughness());
        assert_eq!(1.45, material.ior());
        assert!(!material.has_texture());
    }
}
