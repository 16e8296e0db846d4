use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::{
    BvhStack, BvhView, Hit, Ray, TraversalMode, TrianglesView, BVH_STACK_SIZE,
    EPSILON,
};

/// Binary BVH node; two lanes per node.
///
/// ```text
/// d0.xyz - aabb min
/// d0.w   - bits: (child_base_or_first_triangle << 3) | (split_axis << 1) | is_leaf
/// d1.xyz - aabb max
/// d1.w   - bits: triangle count (leaves only)
/// ```
///
/// Internal nodes address both children from a single base index (left at
/// `base`, right at `base + 1`); the split axis picks the near child against
/// the ray's direction sign so the far child's AABB test runs with a tighter
/// distance bound.
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Bvh2Node {
    pub d0: Vec4,
    pub d1: Vec4,
}

impl Bvh2Node {
    pub const SIZE: usize = 2;

    pub fn internal(
        aabb_min: Vec3,
        aabb_max: Vec3,
        child_base: u32,
        axis: u32,
    ) -> Self {
        Self {
            d0: aabb_min.extend(f32::from_bits((child_base << 3) | (axis << 1))),
            d1: aabb_max.extend(f32::from_bits(0)),
        }
    }

    pub fn leaf(
        aabb_min: Vec3,
        aabb_max: Vec3,
        first_triangle: u32,
        count: u32,
    ) -> Self {
        Self {
            d0: aabb_min.extend(f32::from_bits((first_triangle << 3) | 1)),
            d1: aabb_max.extend(f32::from_bits(count)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.d0.w.to_bits() & 1 == 1
    }

    pub fn axis(&self) -> u32 {
        (self.d0.w.to_bits() >> 1) & 0b11
    }

    pub fn arg(&self) -> u32 {
        self.d0.w.to_bits() >> 3
    }

    pub fn count(&self) -> u32 {
        self.d1.w.to_bits()
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
    // Where this particular thread's stack begins; see `BvhStack`
    let stack_begins_at = local_idx * (BVH_STACK_SIZE as u32);
    let mut stack_ptr = stack_begins_at;

    let mut node_idx = 0;

    loop {
        let d0 = bvh.get(node_idx * 2);
        let args = d0.w.to_bits();

        if args & 1 == 1 {
            // Leaf; test its triangle range
            let first = args >> 3;
            let count = bvh.get(node_idx * 2 + 1).w.to_bits();

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
            let axis = (args >> 1) & 0b11;
            let left = args >> 3;
            let right = left + 1;

            // Visit the near child (by the node's split axis against the
            // ray's direction sign) first, so that the far child's AABB test
            // runs against an already-tightened distance bound.
            let dir_axis = match axis {
                0 => ray.direction().x,
                1 => ray.direction().y,
                _ => ray.direction().z,
            };

            let (near, far) = if dir_axis < 0.0 {
                (right, left)
            } else {
                (left, right)
            };

            let near_dist = {
                let d0 = bvh.get(near * 2);
                let d1 = bvh.get(near * 2 + 1);

                ray.hits_box_at(d0.xyz(), d1.xyz())
            };

            let far_dist = {
                let d0 = bvh.get(far * 2);
                let d1 = bvh.get(far * 2 + 1);

                ray.hits_box_at(d0.xyz(), d1.xyz())
            };

            if far_dist < hit.distance {
                stack[stack_ptr as usize] = far;
                stack_ptr += 1;
            }

            if near_dist < hit.distance {
                node_idx = near;
                continue;
            }
        }

        // Pop the next pending node; an empty stack means every reachable
        // node has been tested.
        if stack_ptr > stack_begins_at {
            stack_ptr -= 1;
            node_idx = stack[stack_ptr as usize];
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec;
    use alloc::vec::Vec;

    use glam::{vec2, vec3, Vec2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::{Triangle, INVALID_ID};

    fn to_lanes(nodes: &[Bvh2Node]) -> Vec<Vec4> {
        nodes.iter().flat_map(|node| [node.d0, node.d1]).collect()
    }

    fn tri(p0: Vec3, p1: Vec3, p2: Vec3) -> Triangle {
        Triangle::new(
            [p0, p1, p2],
            [vec3(0.0, 0.0, 1.0); 3],
            [Vec2::ZERO; 3],
            0,
        )
    }

    /// Two triangles behind each other, one leaf each.
    fn two_quads() -> (Vec<Triangle>, Vec<Vec4>) {
        let triangles = vec![
            tri(
                vec3(-1.0, -1.0, 2.0),
                vec3(3.0, -1.0, 2.0),
                vec3(-1.0, 3.0, 2.0),
            ),
            tri(
                vec3(-1.0, -1.0, 5.0),
                vec3(3.0, -1.0, 5.0),
                vec3(-1.0, 3.0, 5.0),
            ),
        ];

        // Flat geometry gets epsilon-padded boxes, as builders emit them
        let nodes = vec![
            Bvh2Node::internal(
                vec3(-1.0, -1.0, 1.99),
                vec3(3.0, 3.0, 5.01),
                1,
                2,
            ),
            Bvh2Node::leaf(vec3(-1.0, -1.0, 1.99), vec3(3.0, 3.0, 2.01), 0, 1),
            Bvh2Node::leaf(vec3(-1.0, -1.0, 4.99), vec3(3.0, 3.0, 5.01), 1, 1),
        ];

        (triangles, to_lanes(&nodes))
    }

    fn stack() -> [u32; BVH_STACK_SIZE * 64] {
        [0; BVH_STACK_SIZE * 64]
    }

    #[test]
    fn nearest_picks_the_closer_triangle() {
        let (triangles, lanes) = two_quads();
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
    fn nearest_against_reversed_ray() {
        let (triangles, lanes) = two_quads();
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
    fn any_respects_max_distance() {
        let (triangles, lanes) = two_quads();
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

    /// Builds a median-split BVH over the given triangles; test scaffolding
    /// only, production node arrays come from the external builder.
    fn build(triangles: &mut Vec<Triangle>) -> Vec<Bvh2Node> {
        fn aabb(triangles: &[Triangle]) -> (Vec3, Vec3) {
            let mut min = Vec3::splat(f32::MAX);
            let mut max = Vec3::splat(f32::MIN);

            for triangle in triangles {
                for v in [
                    triangle.position_at(0.0, 0.0),
                    triangle.position_at(1.0, 0.0),
                    triangle.position_at(0.0, 1.0),
                ] {
                    min = min.min(v);
                    max = max.max(v);
                }
            }

            (min, max)
        }

        fn split(
            triangles: &mut [Triangle],
            first: u32,
            nodes: &mut Vec<Bvh2Node>,
        ) -> Bvh2Node {
            let (min, max) = aabb(triangles);

            if triangles.len() <= 2 {
                return Bvh2Node::leaf(min, max, first, triangles.len() as u32);
            }

            let extent = max - min;

            let axis = if extent.x >= extent.y && extent.x >= extent.z {
                0
            } else if extent.y >= extent.z {
                1
            } else {
                2
            };

            triangles.sort_by(|a, b| {
                let ca = a.position_at(0.33, 0.33)[axis];
                let cb = b.position_at(0.33, 0.33)[axis];

                ca.total_cmp(&cb)
            });

            let mid = triangles.len() / 2;
            let (lhs, rhs) = triangles.split_at_mut(mid);

            let child_base = nodes.len() as u32;

            nodes.push(Default::default());
            nodes.push(Default::default());

            let left = split(lhs, first, nodes);
            let right = split(rhs, first + mid as u32, nodes);

            nodes[child_base as usize] = left;
            nodes[child_base as usize + 1] = right;

            Bvh2Node::internal(min, max, child_base, axis as u32)
        }

        let mut nodes = vec![Default::default()];
        let root = split(triangles, 0, &mut nodes);

        nodes[0] = root;
        nodes
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0x6c696d74);
        let mut triangles = Vec::new();

        for _ in 0..128 {
            let anchor = vec3(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );

            let e1 = vec3(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );

            let e2 = vec3(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );

            triangles.push(tri(anchor, anchor + e1, anchor + e2));
        }

        let nodes = build(&mut triangles);
        let lanes = to_lanes(&nodes);
        let mut stack = stack();

        for _ in 0..256 {
            let origin = vec3(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
            );

            let direction = vec3(
                rng.gen_range(-1.0..1.0f32),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );

            if direction.length() < 1.0e-3 {
                continue;
            }

            let ray = Ray::new(origin, direction.normalize());

            let expected = {
                let mut hit = Hit::none();

                for (id, triangle) in triangles.iter().enumerate() {
                    if triangle.hit(ray, EPSILON, &mut hit) {
                        hit.triangle_id = id as u32;
                    }
                }

                hit
            };

            let actual = trace_nearest(
                ray,
                0,
                TrianglesView::new(&triangles),
                BvhView::new(&lanes),
                &mut stack,
            );

            assert_eq!(expected.triangle_id, actual.triangle_id);

            if expected.triangle_id != INVALID_ID {
                assert!((expected.distance - actual.distance).abs() < 1.0e-5);
            }
        }
    }

    #[test]
    fn uv_interpolation_smoke() {
        // Guards the barycentric convention shared with the shade stages.
        let triangle = Triangle::new(
            [
                vec3(0.0, 0.0, 1.0),
                vec3(1.0, 0.0, 1.0),
                vec3(0.0, 1.0, 1.0),
            ],
            [vec3(0.0, 0.0, -1.0); 3],
            [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)],
            0,
        );

        let mut hit = Hit::none();

        triangle.hit(
            Ray::new(vec3(0.2, 0.6, 0.0), vec3(0.0, 0.0, 1.0)),
            EPSILON,
            &mut hit,
        );

        let uv = triangle.uv_at(hit.u, hit.v);

        assert!((uv.x - 0.2).abs() < 1.0e-5);
        assert!((uv.y - 0.6).abs() < 1.0e-5);
    }
}
