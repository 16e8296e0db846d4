use crate::gpu::Triangle;
use crate::{Bindable, BvhData, MeshTriangle, StorageBuffer};

/// Render-form triangles (anchor + edges), permuted into BVH-leaf order so
/// leaves address them by contiguous ranges.
#[derive(Debug)]
pub struct Triangles {
    buffer: StorageBuffer,
    data: Vec<Triangle>,
}

impl Triangles {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        triangles: &[MeshTriangle],
        bvh: &BvhData,
    ) -> Self {
        let data = build(triangles, &bvh.indices);

        log::info!("Uploading {} triangles", data.len());

        Self {
            buffer: StorageBuffer::new(
                device,
                queue,
                "glimt_triangles",
                &data,
            ),
            data,
        }
    }

    /// Reuses triangles that already went through the permutation once, as
    /// read back from the BVH cache.
    pub fn from_cached(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: Vec<Triangle>,
    ) -> Self {
        log::info!("Uploading {} cached triangles", data.len());

        Self {
            buffer: StorageBuffer::new(
                device,
                queue,
                "glimt_triangles",
                &data,
            ),
            data,
        }
    }

    pub fn data(&self) -> &[Triangle] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.buffer.bind_readable()
    }
}

fn build(triangles: &[MeshTriangle], indices: &[u32]) -> Vec<Triangle> {
    indices
        .iter()
        .map(|&index| {
            let triangle = &triangles[index as usize];

            Triangle::new(
                triangle.positions,
                triangle.normals,
                triangle.uvs,
                triangle.material_id,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3, Vec2, Vec3};

    use super::*;
    use crate::BvhLayout;

    #[test]
    fn permutation_follows_the_index_array() {
        let mesh = |material_id| MeshTriangle {
            positions: [
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                vec3(0.0, 1.0, 0.0),
            ],
            normals: [Vec3::Z; 3],
            uvs: [vec2(0.0, 0.0), Vec2::ZERO, Vec2::ZERO],
            material_id,
        };

        let bvh = BvhData {
            layout: BvhLayout::Bvh2,
            nodes: vec![],
            indices: vec![2, 0, 1],
        };

        let built = build(&[mesh(10), mesh(11), mesh(12)], &bvh.indices);

        assert_eq!(12, built[0].material_id());
        assert_eq!(10, built[1].material_id());
        assert_eq!(11, built[2].material_id());
    }
}
