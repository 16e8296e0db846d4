use glam::Vec4;

use crate::gpu::{self, Material};
use crate::{AtlasLayout, Bindable, SceneMaterial, StorageBuffer};

/// Packed materials; the sort stage dispatches on their kind tag.
#[derive(Debug)]
pub struct Materials {
    buffer: StorageBuffer,
    has_diffuse: bool,
    has_dielectric: bool,
    has_glossy: bool,
    has_lights: bool,
}

impl Materials {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        materials: &[SceneMaterial],
        atlas: &AtlasLayout,
    ) -> Self {
        let data: Vec<_> = materials
            .iter()
            .map(|material| serialize(material, atlas))
            .collect();

        let mut this = Self {
            buffer: StorageBuffer::new(
                device,
                queue,
                "glimt_materials",
                &data,
            ),
            has_diffuse: false,
            has_dielectric: false,
            has_glossy: false,
            has_lights: false,
        };

        // Knowing which kinds the scene uses lets the controller skip whole
        // shading dispatches
        for material in materials {
            match material {
                SceneMaterial::Diffuse { .. } => this.has_diffuse = true,
                SceneMaterial::Dielectric { .. } => {
                    this.has_dielectric = true;
                }
                SceneMaterial::Glossy { .. } => this.has_glossy = true,
                SceneMaterial::Light { .. } => this.has_lights = true,
            }
        }

        log::info!(
            "Scene materials: diffuse={}, dielectric={}, glossy={}, \
             lights={}",
            this.has_diffuse,
            this.has_dielectric,
            this.has_glossy,
            this.has_lights,
        );

        this
    }

    pub fn has_diffuse(&self) -> bool {
        self.has_diffuse
    }

    pub fn has_dielectric(&self) -> bool {
        self.has_dielectric
    }

    pub fn has_glossy(&self) -> bool {
        self.has_glossy
    }

    pub fn has_lights(&self) -> bool {
        self.has_lights
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.buffer.bind_readable()
    }
}

fn serialize(material: &SceneMaterial, atlas: &AtlasLayout) -> Material {
    let rect = |texture: &Option<crate::ImageId>| {
        texture.map(|id| atlas.rect(id)).unwrap_or(Vec4::ZERO)
    };

    match material {
        SceneMaterial::Diffuse { tint, texture } => {
            Material::diffuse(*tint).with_texture(rect(texture))
        }

        SceneMaterial::Dielectric {
            index_of_refraction,
            absorption,
        } => Material::dielectric(*index_of_refraction, *absorption),

        SceneMaterial::Glossy {
            tint,
            texture,
            roughness,
            index_of_refraction,
        } => Material::glossy(*tint, *roughness, *index_of_refraction)
            .with_texture(rect(texture)),

        SceneMaterial::Light { emission } => Material::light(*emission),
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn serialization_preserves_the_kind() {
        let atlas = AtlasLayout::default();

        let diffuse = serialize(
            &SceneMaterial::Diffuse {
                tint: vec3(0.5, 0.5, 0.5),
                texture: None,
            },
            &atlas,
        );

        assert_eq!(gpu::MATERIAL_DIFFUSE, diffuse.kind());
        assert!(!diffuse.has_texture());

        let light = serialize(
            &SceneMaterial::Light {
                emission: vec3(5.0, 5.0, 5.0),
            },
            &atlas,
        );

        assert!(light.is_light());
        assert_eq!(vec3(5.0, 5.0, 5.0), light.emission());
    }
}
