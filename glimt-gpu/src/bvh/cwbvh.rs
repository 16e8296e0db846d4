use bytemuck::{Pod, Zeroable};
use glam::{uvec2, vec3, UVec2, Vec4};

use crate::{
    BvhStack, BvhView, Hit, Ray, TraversalMode, TrianglesView, U32Ext,
    BVH_STACK_SIZE, EPSILON,
};

/// Compressed 8-wide BVH node (Ylitie-style); five lanes per node.
///
/// ```text
/// d0.xyz - grid origin p
/// d0.w   - bits: ex | ey << 8 | ez << 16 | imask << 24
/// d1.x   - bits: child base node index
/// d1.y   - bits: primitive base triangle index
/// d1.z   - bits: meta bytes for children 0..4
/// d1.w   - bits: meta bytes for children 4..8
/// d2     - bits: q_lo_x[0..4], q_lo_x[4..8], q_hi_x[0..4], q_hi_x[4..8]
/// d3     - same for y
/// d4     - same for z
/// ```
///
/// Meta byte per child: `0` marks an empty slot; a leaf stores a unary
/// triangle count in bits 5..8 and its first triangle-bit slot in bits 0..5;
/// an internal child stores `0x20 | (24 + slot)`, which the octant reorder
/// maps into the hit mask's high byte.
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct CwBvhNode {
    pub d0: Vec4,
    pub d1: Vec4,
    pub d2: Vec4,
    pub d3: Vec4,
    pub d4: Vec4,
}

impl CwBvhNode {
    pub const SIZE: usize = 5;

    pub fn meta_leaf(slot: u32, count: u32) -> u32 {
        // Unary count: n triangles set the n lowest of bits 5..8
        ((1 << count) - 1) << 5 | slot
    }

    pub fn meta_internal(slot: u32) -> u32 {
        0x20 | (24 + slot)
    }
}

fn firstbithigh(x: u32) -> u32 {
    31 - x.leading_zeros()
}

/// Replicates the ray's inverted octant over four meta bytes; child slots are
/// stored pre-sorted by octant so that xor-ing restores a front-to-back pop
/// order for any direction sign combination.
fn octant_inv4(ray: &Ray) -> u32 {
    let mut oct = 0;

    if ray.direction().x >= 0.0 {
        oct |= 0x04040404;
    }

    if ray.direction().y >= 0.0 {
        oct |= 0x02020202;
    }

    if ray.direction().z >= 0.0 {
        oct |= 0x01010101;
    }

    oct
}

/// Tests the ray against all eight child AABBs at once; returns the hit mask
/// (children in the high byte, triangles in the low 24 bits).
fn intersect_node(
    bvh: BvhView,
    base: u32,
    ray: &Ray,
    oct_inv4: u32,
    max_distance: f32,
) -> (u32, u32, u32) {
    let d0 = bvh.get(base);
    let d1 = bvh.get(base + 1);

    let e = d0.w.to_bits();
    let imask = e >> 24;

    let adjusted_inv_dir = vec3(
        f32::from_bits((e & 0xff) << 23),
        f32::from_bits(((e >> 8) & 0xff) << 23),
        f32::from_bits(((e >> 16) & 0xff) << 23),
    ) * ray.inv_direction();

    let adjusted_origin =
        (vec3(d0.x, d0.y, d0.z) - ray.origin()) * ray.inv_direction();

    let rdx = ray.direction().x < 0.0;
    let rdy = ray.direction().y < 0.0;
    let rdz = ray.direction().z < 0.0;

    let mut hit_mask = 0;

    let mut half = 0;

    while half < 2 {
        let meta4 = if half == 0 {
            d1.z.to_bits()
        } else {
            d1.w.to_bits()
        };

        let is_inner4 = (meta4 & (meta4 << 1)) & 0x10101010;
        let inner_mask4 = (is_inner4 >> 4) * 0xff;
        let bit_index4 = (meta4 ^ (oct_inv4 & inner_mask4)) & 0x1f1f1f1f;
        let child_bits4 = (meta4 >> 5) & 0x07070707;

        let qx = bvh.get(base + 2);
        let qy = bvh.get(base + 3);
        let qz = bvh.get(base + 4);

        let (qx_lo, qx_hi) = if half == 0 {
            (qx.x.to_bits(), qx.z.to_bits())
        } else {
            (qx.y.to_bits(), qx.w.to_bits())
        };

        let (qy_lo, qy_hi) = if half == 0 {
            (qy.x.to_bits(), qy.z.to_bits())
        } else {
            (qy.y.to_bits(), qy.w.to_bits())
        };

        let (qz_lo, qz_hi) = if half == 0 {
            (qz.x.to_bits(), qz.z.to_bits())
        } else {
            (qz.y.to_bits(), qz.w.to_bits())
        };

        let mut j = 0;

        while j < 4 {
            let x_lo = qx_lo.extract_byte(j);
            let x_hi = qx_hi.extract_byte(j);
            let y_lo = qy_lo.extract_byte(j);
            let y_hi = qy_hi.extract_byte(j);
            let z_lo = qz_lo.extract_byte(j);
            let z_hi = qz_hi.extract_byte(j);

            let x_min = if rdx { x_hi } else { x_lo };
            let x_max = if rdx { x_lo } else { x_hi };
            let y_min = if rdy { y_hi } else { y_lo };
            let y_max = if rdy { y_lo } else { y_hi };
            let z_min = if rdz { z_hi } else { z_lo };
            let z_max = if rdz { z_lo } else { z_hi };

            let t_lo = vec3(x_min as f32, y_min as f32, z_min as f32)
                * adjusted_inv_dir
                + adjusted_origin;

            let t_hi = vec3(x_max as f32, y_max as f32, z_max as f32)
                * adjusted_inv_dir
                + adjusted_origin;

            let t_min = t_lo.max_element().max(0.0);
            let t_max = t_hi.min_element().min(max_distance);

            if t_min < t_max {
                let child_bits = child_bits4.extract_byte(j);
                let bit_index = bit_index4.extract_byte(j);

                hit_mask |= child_bits << bit_index;
            }

            j += 1;
        }

        half += 1;
    }

    (hit_mask, d1.x.to_bits(), imask)
}

pub fn trace_nearest(
    ray: Ray,
    local_idx: u32,
    triangles: TrianglesView,
    bvh: BvhView,
    stack: BvhStack,
) -> Hit {
    let mut hit = Hit::none();

    trace(
        ray,
        local_idx,
        triangles,
        bvh,
        stack,
        TraversalMode::Nearest,
        &mut hit,
    );

    hit
}

pub fn trace_any(
    ray: Ray,
    local_idx: u32,
    triangles: TrianglesView,
    bvh: BvhView,
    stack: BvhStack,
    max_distance: f32,
) -> bool {
    let mut hit = Hit {
        distance: max_distance,
        ..Hit::none()
    };

    trace(
        ray,
        local_idx,
        triangles,
        bvh,
        stack,
        TraversalMode::Any,
        &mut hit,
    );

    hit.distance < max_distance
}

fn trace(
    ray: Ray,
    local_idx: u32,
    triangles: TrianglesView,
    bvh: BvhView,
    stack: BvhStack,
    mode: TraversalMode,
    hit: &mut Hit,
) {
    let oct_inv4 = octant_inv4(&ray);

    // Stack entries are (base index, hits) pairs, so each thread's stack
    // window holds half as many entries as the binary traversal's.
    let stack_begins_at = local_idx * (BVH_STACK_SIZE as u32);
    let mut stack_ptr = stack_begins_at;

    let mut current_group = uvec2(0, 0x80000000);
    let mut primitive_group = UVec2::ZERO;

    loop {
        while primitive_group.y != 0 {
            let local_id = firstbithigh(primitive_group.y);

            primitive_group.y &= !(1 << local_id);

            let triangle_id = primitive_group.x + local_id;

            if triangles.get(triangle_id).hit(ray, EPSILON, hit) {
                hit.triangle_id = triangle_id;

                if mode == TraversalMode::Any {
                    return;
                }
            }
        }

        primitive_group = UVec2::ZERO;

        if current_group.y & 0xff000000 != 0 {
            let hits_imask = current_group.y;
            let child_index_offset = firstbithigh(hits_imask);
            let child_index_base = current_group.x;

            current_group.y &= !(1 << child_index_offset);

            if current_group.y & 0xff000000 != 0 {
                stack[stack_ptr as usize] = current_group.x;
                stack[stack_ptr as usize + 1] = current_group.y;
                stack_ptr += 2;
            }

            let slot_index = (child_index_offset - 24) ^ (oct_inv4 & 0xff);
            let relative_index =
                (hits_imask & !(0xffffffffu32 << slot_index)).count_ones();

            let node_index = child_index_base + relative_index;
            let base = node_index * (CwBvhNode::SIZE as u32);

            let (hit_mask, child_base, imask) =
                intersect_node(bvh, base, &ray, oct_inv4, hit.distance);

            current_group.x = child_base;
            current_group.y = (hit_mask & 0xff000000) | imask;

            primitive_group.x = bvh.get(base + 1).y.to_bits();
            primitive_group.y = hit_mask & 0x00ffffff;
        } else {
            primitive_group = current_group;
            current_group = UVec2::ZERO;
        }

        if primitive_group.y == 0 && (current_group.y & 0xff000000) == 0 {
            if stack_ptr == stack_begins_at {
                break;
            }

            stack_ptr -= 2;
            current_group.x = stack[stack_ptr as usize];
            current_group.y = stack[stack_ptr as usize + 1];
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec;
    use alloc::vec::Vec;

    use glam::{vec4, Vec2, Vec3};

    use super::*;
    use crate::{quantize_aabb, Triangle, INVALID_ID};

    fn tri(z: f32) -> Triangle {
        Triangle::new(
            [
                vec3(-1.0, -1.0, z),
                vec3(3.0, -1.0, z),
                vec3(-1.0, 3.0, z),
            ],
            [vec3(0.0, 0.0, -1.0); 3],
            [Vec2::ZERO; 3],
            0,
        )
    }

    /// One root with two leaf children (one triangle each); mirrors the node
    /// encoding the external builder emits.
    fn scene() -> (Vec<Triangle>, Vec<Vec4>) {
        let triangles = vec![tri(2.0), tri(5.0)];

        let p = Vec3::splat(-8.0);
        let e = [123u32, 123, 123];

        let children = [
            (
                CwBvhNode::meta_leaf(0, 1),
                vec3(-1.0, -1.0, 2.0),
                vec3(3.0, 3.0, 2.0),
            ),
            (
                CwBvhNode::meta_leaf(1, 1),
                vec3(-1.0, -1.0, 5.0),
                vec3(3.0, 3.0, 5.0),
            ),
        ];

        let mut meta = [0u32; 8];
        let mut q_lo = [[0u32; 8]; 3];
        let mut q_hi = [[0u32; 8]; 3];

        for (slot, (child_meta, aabb_min, aabb_max)) in
            children.iter().enumerate()
        {
            let (lo, hi) = quantize_aabb(p, e, *aabb_min, *aabb_max);

            meta[slot] = *child_meta;

            for axis in 0..3 {
                q_lo[axis][slot] = lo[axis];
                q_hi[axis][slot] = hi[axis];
            }
        }

        let bytes = |v: &[u32; 8], half: usize| {
            u32::from_bytes([
                v[half * 4],
                v[half * 4 + 1],
                v[half * 4 + 2],
                v[half * 4 + 3],
            ])
        };

        let node = CwBvhNode {
            d0: p.extend(f32::from_bits(123 | (123 << 8) | (123 << 16))),
            d1: vec4(
                f32::from_bits(0),
                f32::from_bits(0),
                f32::from_bits(bytes(&meta, 0)),
                f32::from_bits(bytes(&meta, 1)),
            ),
            d2: vec4(
                f32::from_bits(bytes(&q_lo[0], 0)),
                f32::from_bits(bytes(&q_lo[0], 1)),
                f32::from_bits(bytes(&q_hi[0], 0)),
                f32::from_bits(bytes(&q_hi[0], 1)),
            ),
            d3: vec4(
                f32::from_bits(bytes(&q_lo[1], 0)),
                f32::from_bits(bytes(&q_lo[1], 1)),
                f32::from_bits(bytes(&q_hi[1], 0)),
                f32::from_bits(bytes(&q_hi[1], 1)),
            ),
            d4: vec4(
                f32::from_bits(bytes(&q_lo[2], 0)),
                f32::from_bits(bytes(&q_lo[2], 1)),
                f32::from_bits(bytes(&q_hi[2], 0)),
                f32::from_bits(bytes(&q_hi[2], 1)),
            ),
        };

        (
            triangles,
            vec![node.d0, node.d1, node.d2, node.d3, node.d4],
        )
    }

    fn stack() -> [u32; BVH_STACK_SIZE * 64] {
        [0; BVH_STACK_SIZE * 64]
    }

    #[test]
    fn nearest() {
        let (triangles, lanes) = scene();
        let mut stack = stack();

        let hit = trace_nearest(
            Ray::new(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0)),
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&lanes),
            &mut stack,
        );

        assert_eq!(0, hit.triangle_id);
        assert!((hit.distance - 2.0).abs() < 1.0e-5);
    }

    #[test]
    fn nearest_from_behind() {
        let (triangles, lanes) = scene();
        let mut stack = stack();

        let hit = trace_nearest(
            Ray::new(vec3(0.0, 0.0, 10.0), vec3(0.0, 0.0, -1.0)),
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&lanes),
            &mut stack,
        );

        assert_eq!(1, hit.triangle_id);
    }

    #[test]
    fn miss_escapes() {
        let (triangles, lanes) = scene();
        let mut stack = stack();

        let hit = trace_nearest(
            Ray::new(vec3(10.0, 10.0, 0.0), vec3(0.0, 0.0, 1.0)),
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&lanes),
            &mut stack,
        );

        assert_eq!(INVALID_ID, hit.triangle_id);
    }

    #[test]
    fn any_respects_max_distance() {
        let (triangles, lanes) = scene();
        let mut stack = stack();

        let ray = Ray::new(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0));

        assert!(trace_any(
            ray,
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&lanes),
            &mut stack,
            3.0,
        ));

        assert!(!trace_any(
            ray,
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&lanes),
            &mut stack,
            1.0,
        ));
    }
}
