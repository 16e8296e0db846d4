use bytemuck::{Pod, Zeroable};
use glam::{vec3, Vec3, Vec4};

use crate::{
    BvhStack, BvhView, Hit, Ray, TraversalMode, TrianglesView, U32Ext,
    BVH_STACK_SIZE, EPSILON,
};

/// 4-wide quantized BVH node; four lanes per node.
///
/// Child AABBs are stored as `u8` grid coordinates relative to the node's
/// origin `p`, scaled by a per-axis power-of-two exponent, so one node holds
/// four boxes in the space two full-precision boxes would take. All four
/// slab tests run against the same transformed ray.
///
/// ```text
/// d0.xyz - grid origin p
/// d0.w   - bits: ex | ey << 8 | ez << 16
/// d1     - bits: per-child descriptor
///            0xffff_ffff            - empty slot
///            node index             - internal (high bit clear means leaf)
///            (first << 5) | count | 0x8000_0000 - leaf
/// d2     - bits: q_lo_x, q_lo_y, q_lo_z, q_hi_x  (one byte per child)
/// d3     - bits: q_hi_y, q_hi_z, -, -
/// ```
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct QbvhNode {
    pub d0: Vec4,
    pub d1: Vec4,
    pub d2: Vec4,
    pub d3: Vec4,
}

pub const QBVH_EMPTY: u32 = 0xffff_ffff;
pub const QBVH_LEAF: u32 = 0x8000_0000;

impl QbvhNode {
    pub const SIZE: usize = 4;

    pub fn child_leaf(first: u32, count: u32) -> u32 {
        QBVH_LEAF | (first << 5) | count
    }

    pub fn child_internal(node: u32) -> u32 {
        node
    }
}

fn child_arg(d1: Vec4, child: usize) -> u32 {
    match child {
        0 => d1.x.to_bits(),
        1 => d1.y.to_bits(),
        2 => d1.z.to_bits(),
        _ => d1.w.to_bits(),
    }
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
    let stack_begins_at = local_idx * (BVH_STACK_SIZE as u32);
    let mut stack_ptr = stack_begins_at;

    // The root is node 0; seed traversal with a synthetic internal reference
    let mut arg = QbvhNode::child_internal(0);

    loop {
        if arg & QBVH_LEAF != 0 {
            let first = (arg & !QBVH_LEAF) >> 5;
            let count = arg & 0b11111;

            let mut i = 0;

            while i < count {
                let triangle_id = first + i;

                if triangles.get(triangle_id).hit(ray, EPSILON, hit) {
                    hit.triangle_id = triangle_id;

                    if mode == TraversalMode::Any {
                        return;
                    }
                }

                i += 1;
            }
        } else {
            let base = arg * (QbvhNode::SIZE as u32);

            let d0 = bvh.get(base);
            let d1 = bvh.get(base + 1);
            let d2 = bvh.get(base + 2);
            let d3 = bvh.get(base + 3);

            let p = vec3(d0.x, d0.y, d0.z);
            let e = d0.w.to_bits();

            // A byte exponent moved straight into the float's exponent field
            // yields the power-of-two scale of the quantization grid.
            let scale = vec3(
                f32::from_bits((e & 0xff) << 23),
                f32::from_bits(((e >> 8) & 0xff) << 23),
                f32::from_bits(((e >> 16) & 0xff) << 23),
            );

            // All four child slab tests share this transformed ray
            let adj_inv_dir = scale * ray.inv_direction();
            let adj_origin = (p - ray.origin()) * ray.inv_direction();

            let mut dists = [f32::MAX; 4];
            let mut args = [QBVH_EMPTY; 4];

            let mut child = 0;

            while child < 4 {
                let child_desc = child_arg(d1, child);

                if child_desc != QBVH_EMPTY {
                    let q_lo = vec3(
                        d2.x.to_bits().extract_byte(child as u32) as f32,
                        d2.y.to_bits().extract_byte(child as u32) as f32,
                        d2.z.to_bits().extract_byte(child as u32) as f32,
                    );

                    let q_hi = vec3(
                        d2.w.to_bits().extract_byte(child as u32) as f32,
                        d3.x.to_bits().extract_byte(child as u32) as f32,
                        d3.y.to_bits().extract_byte(child as u32) as f32,
                    );

                    let t_lo = q_lo * adj_inv_dir + adj_origin;
                    let t_hi = q_hi * adj_inv_dir + adj_origin;

                    let t_min = t_lo.min(t_hi).max_element().max(0.0);
                    let t_max = t_lo.max(t_hi).min_element().min(hit.distance);

                    if t_min < t_max {
                        dists[child] = t_min;
                        args[child] = child_desc;
                    }
                }

                child += 1;
            }

            // Push the hit children far-to-near, then continue with the
            // nearest; a tiny insertion sort keeps the four candidates
            // ordered.
            let mut order = [0usize, 1, 2, 3];

            let mut i = 1;

            while i < 4 {
                let mut j = i;

                while j > 0 && dists[order[j - 1]] > dists[order[j]] {
                    order.swap(j - 1, j);
                    j -= 1;
                }

                i += 1;
            }

            let mut next_arg = QBVH_EMPTY;

            let mut i = 4;

            while i > 0 {
                i -= 1;

                let slot = order[i];

                if dists[slot] == f32::MAX {
                    continue;
                }

                if next_arg != QBVH_EMPTY {
                    stack[stack_ptr as usize] = next_arg;
                    stack_ptr += 1;
                }

                next_arg = args[slot];
            }

            if next_arg != QBVH_EMPTY {
                arg = next_arg;
                continue;
            }
        }

        if stack_ptr > stack_begins_at {
            stack_ptr -= 1;
            arg = stack[stack_ptr as usize];
        } else {
            break;
        }
    }
}

/// Quantizes an AABB (in world space) against a node grid, rounding the
/// minimum down and the maximum strictly up, so the quantized box always
/// strictly contains the original (zero-thickness boxes gain one grid cell,
/// keeping them visible to the strict slab test).
pub fn quantize_aabb(
    p: Vec3,
    scale_exp: [u32; 3],
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> ([u32; 3], [u32; 3]) {
    let scale = vec3(
        f32::from_bits(scale_exp[0] << 23),
        f32::from_bits(scale_exp[1] << 23),
        f32::from_bits(scale_exp[2] << 23),
    );

    let lo = ((aabb_min - p) / scale).floor().max(Vec3::ZERO);

    let hi = (((aabb_max - p) / scale).floor() + 1.0)
        .min(Vec3::splat(255.0));

    (
        [lo.x as u32, lo.y as u32, lo.z as u32],
        [hi.x as u32, hi.y as u32, hi.z as u32],
    )
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec;
    use alloc::vec::Vec;

    use glam::{vec4, Vec2};

    use super::*;
    use crate::{Triangle, U32Ext};

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

    fn node(children: [(u32, Vec3, Vec3); 2]) -> QbvhNode {
        // Exponent byte 123 = 2^-4, so the 256-cell grid spans 16 units
        let p = Vec3::splat(-8.0);
        let e = [123u32, 123, 123];

        let pack = |bytes: [u32; 4]| f32::from_bits(u32::from_bytes(bytes));

        let mut d1 = [QBVH_EMPTY; 4];
        let mut q_lo = [[0u32; 4]; 3];
        let mut q_hi = [[0u32; 4]; 3];

        for (slot, (arg, aabb_min, aabb_max)) in children.iter().enumerate() {
            let (lo, hi) = quantize_aabb(p, e, *aabb_min, *aabb_max);

            d1[slot] = *arg;

            for axis in 0..3 {
                q_lo[axis][slot] = lo[axis];
                q_hi[axis][slot] = hi[axis];
            }
        }

        QbvhNode {
            d0: p.extend(f32::from_bits(e[0] | (e[1] << 8) | (e[2] << 16))),
            d1: vec4(
                f32::from_bits(d1[0]),
                f32::from_bits(d1[1]),
                f32::from_bits(d1[2]),
                f32::from_bits(d1[3]),
            ),
            d2: vec4(
                pack(q_lo[0]),
                pack(q_lo[1]),
                pack(q_lo[2]),
                pack(q_hi[0]),
            ),
            d3: vec4(pack(q_hi[1]), pack(q_hi[2]), 0.0, 0.0),
        }
    }

    fn scene() -> (Vec<Triangle>, Vec<Vec4>) {
        let triangles = vec![tri(2.0), tri(5.0)];

        let root = node([
            (
                QbvhNode::child_leaf(0, 1),
                vec3(-1.0, -1.0, 2.0),
                vec3(3.0, 3.0, 2.0),
            ),
            (
                QbvhNode::child_leaf(1, 1),
                vec3(-1.0, -1.0, 5.0),
                vec3(3.0, 3.0, 5.0),
            ),
        ]);

        (triangles, vec![root.d0, root.d1, root.d2, root.d3])
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
    fn any_short_circuits_on_distance() {
        let (triangles, lanes) = scene();
        let mut stack = stack();

        let ray = Ray::new(vec3(0.0, 0.0, 3.0), vec3(0.0, 0.0, 1.0));

        assert!(trace_any(
            ray,
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&lanes),
            &mut stack,
            10.0,
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

    #[test]
    fn quantization_is_conservative() {
        let p = Vec3::splat(-8.0);
        let e = [123u32, 123, 123];

        let aabb_min = vec3(-1.3, 0.7, 2.1);
        let aabb_max = vec3(3.9, 3.2, 5.8);

        let (lo, hi) = quantize_aabb(p, e, aabb_min, aabb_max);

        let scale = f32::from_bits(123 << 23);

        for axis in 0..3 {
            let world_lo = p[axis] + lo[axis] as f32 * scale;
            let world_hi = p[axis] + hi[axis] as f32 * scale;

            assert!(world_lo <= aabb_min[axis]);
            assert!(world_hi >= aabb_max[axis]);
        }
    }
}
