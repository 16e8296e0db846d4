//! Glimt is a real-time wavefront path tracer: per-frame work is split into
//! per-material ray queues driven by a fixed pipeline of compute kernels,
//! with SVGF + TAA reconstruction (or plain progressive accumulation) on the
//! back end.
//!
//! The crate is a library with deliberately narrow edges: the caller owns
//! the `wgpu::Device` (created with [`Engine::required_features()`] and
//! [`Engine::required_limits()`]), loads the scene, builds the BVH and - in
//! hybrid mode - rasterizes the G-buffers; Glimt turns those inputs into a
//! shared output surface.

mod buffers;
mod bvh;
mod camera;
mod camera_controller;
mod engine;
mod images;
mod lights;
mod materials;
mod noise;
mod profiler;
mod scene;
mod settings;
mod shaders;
mod sky;
mod triangles;

use std::io;

use thiserror::Error;

pub(crate) use glimt_gpu as gpu;

pub use self::buffers::*;
pub use self::bvh::*;
pub use self::camera::*;
pub use self::camera_controller::*;
pub use self::engine::*;
pub(crate) use self::images::*;
pub(crate) use self::lights::*;
pub(crate) use self::materials::*;
pub(crate) use self::noise::*;
pub use self::profiler::*;
pub use self::scene::*;
pub use self::settings::*;
pub(crate) use self::shaders::*;
pub(crate) use self::sky::*;
pub(crate) use self::triangles::*;

/// Upper bound on pixels processed per wavefront batch; larger viewports run
/// the bounce loop multiple times per frame.
pub const BATCH_SIZE: usize = 1 << 20;

/// Maximum number of bounces a frame may be configured with.
pub const MAX_BOUNCES: u32 = glimt_gpu::MAX_BOUNCES as u32;

#[derive(Debug, Error)]
pub enum Error {
    #[error("scene contains no triangles")]
    EmptyScene,

    #[error("sky image must contain at least one texel")]
    EmptySky,

    #[error("blue-noise tables have the wrong lengths")]
    MalformedBlueNoise,

    #[error("`num_bounces` must be within 1..={MAX_BOUNCES}, got {0}")]
    TooManyBounces(u32),

    #[error(
        "rasterization / SVGF / TAA need G-buffers, but none were provided"
    )]
    GBuffersRequired,

    #[error("texture {0:?} does not fit into the atlas")]
    AtlasFull(ImageId),

    #[error(
        "compiled shaders not found at {0:?}; run `glimt-shader-builder` \
         first"
    )]
    MissingShaders(std::path::PathBuf),

    #[error("bvh cache: {0}")]
    BvhCache(#[from] io::Error),
}
