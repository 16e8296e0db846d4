use bytemuck::{Pod, Zeroable};
use glam::{vec2, Vec2, Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{Hit, Ray};

/// Triangle in render form: an anchor vertex plus two edges for positions,
/// normals and texture coordinates, so that interpolating an attribute at
/// `(u, v)` is two fused multiply-adds.
///
/// Triangles are stored in BVH-leaf order, i.e. already permuted the way the
/// external builder emitted its leaves.
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Triangle {
    pub d0: Vec4,
    pub d1: Vec4,
    pub d2: Vec4,
    pub d3: Vec4,
    pub d4: Vec4,
    pub d5: Vec4,
    pub d6: Vec4,
}

impl Triangle {
    pub const SIZE: usize = 7;

    pub fn new(
        positions: [Vec3; 3],
        normals: [Vec3; 3],
        uvs: [Vec2; 3],
        material_id: u32,
    ) -> Self {
        let [p0, p1, p2] = positions;
        let [n0, n1, n2] = normals;
        let [t0, t1, t2] = uvs;

        let pe1 = p1 - p0;
        let pe2 = p2 - p0;
        let ne1 = n1 - n0;
        let ne2 = n2 - n0;
        let te1 = t1 - t0;
        let te2 = t2 - t0;

        let lod = Self::lod_constant(pe1, pe2, te1, te2);

        Self {
            d0: p0.extend(t0.x),
            d1: pe1.extend(t0.y),
            d2: pe2.extend(f32::from_bits(material_id)),
            d3: n0.extend(te1.x),
            d4: ne1.extend(te1.y),
            d5: ne2.extend(te2.x),
            d6: Vec4::new(te2.y, lod, 0.0, 0.0),
        }
    }

    /// Base texture LOD of this triangle: `0.5 * log2(uv_area / world_area)`
    /// (Akenine-Möller 2021); the ray cone adds the footprint term on top.
    fn lod_constant(pe1: Vec3, pe2: Vec3, te1: Vec2, te2: Vec2) -> f32 {
        let world_area = pe1.cross(pe2).length();
        let uv_area = (te1.x * te2.y - te2.x * te1.y).abs();

        if world_area <= 0.0 || uv_area <= 0.0 {
            0.0
        } else {
            0.5 * (uv_area / world_area).log2()
        }
    }

    pub fn position0(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn position_edge1(&self) -> Vec3 {
        self.d1.xyz()
    }

    pub fn position_edge2(&self) -> Vec3 {
        self.d2.xyz()
    }

    pub fn material_id(&self) -> u32 {
        self.d2.w.to_bits()
    }

    pub fn lod(&self) -> f32 {
        self.d6.y
    }

    pub fn position_at(&self, u: f32, v: f32) -> Vec3 {
        self.position0()
            + u * self.position_edge1()
            + v * self.position_edge2()
    }

    /// Interpolated shading normal; not normalized.
    pub fn normal_at(&self, u: f32, v: f32) -> Vec3 {
        self.d3.xyz() + u * self.d4.xyz() + v * self.d5.xyz()
    }

    /// Geometric normal (cross of the edges); not normalized.
    pub fn geometric_normal(&self) -> Vec3 {
        self.position_edge1().cross(self.position_edge2())
    }

    pub fn uv_at(&self, u: f32, v: f32) -> Vec2 {
        let t0 = vec2(self.d0.w, self.d1.w);
        let te1 = vec2(self.d3.w, self.d4.w);
        let te2 = vec2(self.d5.w, self.d6.x);

        t0 + u * te1 + v * te2
    }

    pub fn area(&self) -> f32 {
        0.5 * self.geometric_normal().length()
    }

    /// Maps a world-space offset within the triangle's plane to the
    /// texture-coordinate delta it spans; feeds anisotropic albedo lookups.
    pub fn uv_delta(&self, offset: Vec3) -> Vec2 {
        let e1 = self.position_edge1();
        let e2 = self.position_edge2();

        let d00 = e1.dot(e1);
        let d01 = e1.dot(e2);
        let d11 = e2.dot(e2);

        let det = d00 * d11 - d01 * d01;

        if det.abs() < 1.0e-12 {
            return Vec2::ZERO;
        }

        let b0 = offset.dot(e1);
        let b1 = offset.dot(e2);

        let du = (d11 * b0 - d01 * b1) / det;
        let dv = (d00 * b1 - d01 * b0) / det;

        let te1 = vec2(self.d3.w, self.d4.w);
        let te2 = vec2(self.d5.w, self.d6.x);

        du * te1 + dv * te2
    }

    /// Per-triangle estimate of how much a curved surface spreads a ray
    /// cone: the largest normal variation across an edge, which for unit
    /// normals approximates the subtended angle.
    pub fn curvature_spread(&self) -> f32 {
        self.d4.xyz().length().max(self.d5.xyz().length())
    }

    /// Möller-Trumbore; updates `hit` when this triangle is closer than
    /// whatever `hit` already contains.
    ///
    /// Degenerate triangles have a zero determinant against every ray and
    /// are therefore never hit.
    pub fn hit(&self, ray: Ray, t_min: f32, hit: &mut Hit) -> bool {
        let e1 = self.position_edge1();
        let e2 = self.position_edge2();

        let pvec = ray.direction().cross(e2);
        let det = e1.dot(pvec);

        if det.abs() < f32::EPSILON {
            return false;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - self.position0();
        let u = tvec.dot(pvec) * inv_det;
        let qvec = tvec.cross(e1);
        let v = ray.direction().dot(qvec) * inv_det;
        let distance = e2.dot(qvec) * inv_det;

        if (u < 0.0)
            | (u > 1.0)
            | (v < 0.0)
            | (u + v > 1.0)
            | (distance <= t_min)
            | (distance >= hit.distance)
        {
            return false;
        }

        hit.distance = distance;
        hit.u = u;
        hit.v = v;

        true
    }
}

#[derive(Clone, Copy)]
pub struct TrianglesView<'a> {
    buffer: &'a [Triangle],
}

impl<'a> TrianglesView<'a> {
    pub fn new(buffer: &'a [Triangle]) -> Self {
        Self { buffer }
    }

    pub fn get(&self, id: u32) -> Triangle {
        unsafe { *self.buffer.get_unchecked(id as usize) }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;
    use crate::EPSILON;

    fn triangle() -> Triangle {
        Triangle::new(
            [
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                vec3(0.0, 1.0, 0.0),
            ],
            [vec3(0.0, 0.0, 1.0); 3],
            [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)],
            7,
        )
    }

    #[test]
    fn hit_reports_barycentrics() {
        let mut hit = Hit::none();

        let was_hit = triangle().hit(
            Ray::new(vec3(0.25, 0.25, -1.0), vec3(0.0, 0.0, 1.0)),
            EPSILON,
            &mut hit,
        );

        assert!(was_hit);
        assert_relative_eq!(hit.distance, 1.0);
        assert_relative_eq!(hit.u, 0.25);
        assert_relative_eq!(hit.v, 0.25);
    }

    #[test]
    fn miss_outside_edges() {
        let mut hit = Hit::none();

        let was_hit = triangle().hit(
            Ray::new(vec3(0.75, 0.75, -1.0), vec3(0.0, 0.0, 1.0)),
            EPSILON,
            &mut hit,
        );

        assert!(!was_hit);
        assert!(hit.is_none());
    }

    #[test]
    fn degenerate_triangle_is_never_hit() {
        let degenerate = Triangle::new(
            [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(2.0, 0.0, 0.0)],
            [vec3(0.0, 0.0, 1.0); 3],
            [Vec2::ZERO; 3],
            0,
        );

        let mut hit = Hit::none();

        assert!(!degenerate.hit(
            Ray::new(vec3(0.5, 0.0, -1.0), vec3(0.0, 0.0, 1.0)),
            EPSILON,
            &mut hit,
        ));
    }

    #[test]
    fn interpolation() {
        let triangle = triangle();

        let uv = triangle.uv_at(0.3, 0.4);

        assert_relative_eq!(uv.x, 0.3);
        assert_relative_eq!(uv.y, 0.4);

        let position = triangle.position_at(0.3, 0.4);

        assert_relative_eq!(position.x, 0.3);
        assert_relative_eq!(position.y, 0.4);

        assert_relative_eq!(triangle.area(), 0.5);
        assert_eq!(7, triangle.material_id());
    }

    #[test]
    fn uv_delta_follows_the_parameterization() {
        let triangle = triangle();

        let delta = triangle.uv_delta(vec3(0.5, 0.0, 0.0));

        assert_relative_eq!(delta.x, 0.5, epsilon = 1.0e-5);
        assert_relative_eq!(delta.y, 0.0, epsilon = 1.0e-5);

        // Out-of-plane offsets contribute nothing new
        let skewed = triangle.uv_delta(vec3(0.0, 0.25, 3.0));

        assert_relative_eq!(skewed.x, 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(skewed.y, 0.25, epsilon = 1.0e-5);
    }
}
