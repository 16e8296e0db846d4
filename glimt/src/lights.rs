use crate::gpu::Triangle;
use crate::{Bindable, SceneMaterial, StorageBuffer};

/// The emissive-triangle table: triangle ids sorted by area plus a
/// cumulative-area table, in the layout `glimt_gpu::LightsView` reads.
#[derive(Debug)]
pub struct Lights {
    buffer: StorageBuffer,
    len: usize,
    total_area: f32,
}

impl Lights {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        triangles: &[Triangle],
        materials: &[SceneMaterial],
    ) -> Self {
        let (data, len, total_area) = build(triangles, materials);

        log::info!(
            "Scene has {len} emissive triangles, total area {total_area}"
        );

        Self {
            buffer: StorageBuffer::new(device, queue, "glimt_lights", &data),
            len,
            total_area,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn total_area(&self) -> f32 {
        self.total_area
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.buffer.bind_readable()
    }
}

fn build(
    triangles: &[Triangle],
    materials: &[SceneMaterial],
) -> (Vec<u32>, usize, f32) {
    let mut lights: Vec<_> = triangles
        .iter()
        .enumerate()
        .filter_map(|(id, triangle)| {
            let material =
                materials.get(triangle.material_id() as usize)?;

            let area = triangle.area();

            (material.is_light() && area > 0.0)
                .then_some((id as u32, area))
        })
        .collect();

    lights.sort_by(|(_, a), (_, b)| a.total_cmp(b));

    let mut data = Vec::with_capacity(2 * lights.len() + 2);

    data.push(lights.len() as u32);

    for (id, _) in &lights {
        data.push(*id);
    }

    let mut total_area = 0.0f32;

    for (_, area) in &lights {
        data.push(total_area.to_bits());
        total_area += area;
    }

    data.push(total_area.to_bits());

    (data, lights.len(), total_area)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec2, Vec3};

    use super::*;
    use crate::gpu::LightsView;

    fn triangle(scale: f32, material_id: u32) -> Triangle {
        Triangle::new(
            [
                vec3(0.0, 0.0, 0.0),
                vec3(scale, 0.0, 0.0),
                vec3(0.0, scale, 0.0),
            ],
            [Vec3::Z; 3],
            [Vec2::ZERO; 3],
            material_id,
        )
    }

    #[test]
    fn table_matches_the_gpu_view() {
        let triangles = [
            triangle(1.0, 0),
            triangle(2.0, 1),
            triangle(4.0, 1),
            triangle(8.0, 0),
        ];

        let materials = [
            SceneMaterial::Diffuse {
                tint: Vec3::ONE,
                texture: None,
            },
            SceneMaterial::Light {
                emission: Vec3::ONE,
            },
        ];

        let (data, len, total_area) = build(&triangles, &materials);

        assert_eq!(2, len);
        assert_relative_eq!(total_area, 0.5 * (4.0 + 16.0));

        let view = LightsView::new(&data);

        assert_eq!(2, view.len());
        assert_relative_eq!(view.total_area(), total_area);

        // The small light covers the first fifth of the table
        assert_eq!(1, view.pick(0.1));
        assert_eq!(2, view.pick(0.9));
    }

    #[test]
    fn degenerate_lights_are_skipped() {
        let triangles = [triangle(0.0, 0)];

        let materials = [SceneMaterial::Light {
            emission: Vec3::ONE,
        }];

        let (_, len, total_area) = build(&triangles, &materials);

        assert_eq!(0, len);
        assert_eq!(0.0, total_area);
    }
}
