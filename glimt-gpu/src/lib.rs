//! Common structs and algorithms shared by Glimt's shaders and its host-side
//! renderer.

#![no_std]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::too_many_arguments)]

mod brdf;
mod bvh;
mod camera;
mod counters;
mod hit;
mod lights;
mod material;
mod noise;
mod normal;
mod passes;
mod pixel;
mod queues;
mod ray;
mod ray_cone;
mod sky;
mod svgf;
mod triangle;
mod utils;

pub use self::brdf::*;
pub use self::bvh::*;
pub use self::camera::*;
pub use self::counters::*;
pub use self::hit::*;
pub use self::lights::*;
pub use self::material::*;
pub use self::noise::*;
pub use self::normal::*;
pub use self::passes::*;
pub use self::pixel::*;
pub use self::queues::*;
pub use self::ray::*;
pub use self::ray_cone::*;
pub use self::sky::*;
pub use self::svgf::*;
pub use self::triangle::*;
pub use self::utils::*;

pub mod prelude {
    pub use glam::{
        ivec2, uvec2, vec2, vec3, vec4, IVec2, Mat4, UVec2, UVec3, UVec4,
        Vec2, Vec3, Vec4, Vec4Swizzles,
    };
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::num_traits::Float;
    pub use spirv_std::{spirv, Sampler};

    pub use crate::*;
}

/// Maximum number of bounces a single frame may be configured with; sizes the
/// per-bounce counter arrays.
pub const MAX_BOUNCES: usize = 8;

/// Self-intersection guard, in scene units; also pads shadow-ray distance
/// bounds.
pub const EPSILON: f32 = 1e-4;

/// Sentinel triangle id marking a ray that escaped the scene.
pub const INVALID_ID: u32 = u32::MAX;

/// Stack of nodes yet-to-be-visited when traversing the BVH.
///
/// For performance reasons, we use a per-workgroup shared memory array where
/// each workgroup-thread simply indexes into a different slice of this memory.
pub type BvhStack<'a> = &'a mut [u32; BVH_STACK_SIZE * 64];

/// Maximum traversal stack size per each workgroup-thread.
pub const BVH_STACK_SIZE: usize = 24;
