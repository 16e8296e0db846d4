use crate::{
    BlueNoiseTables, Bvh, BvhData, Error, Images, Lights, Materials, Noise,
    SceneDescriptor, Shaders, Sky, SkyDescriptor, Triangles,
};

/// Scene-level state: everything uploaded once at init and immutable for
/// the renderer's lifetime. Per-viewport state (queues, frame buffers,
/// history) lives in [`crate::CameraController`].
#[derive(Debug)]
pub struct Engine {
    pub(crate) shaders: Shaders,
    pub(crate) triangles: Triangles,
    pub(crate) materials: Materials,
    pub(crate) bvh: Bvh,
    pub(crate) lights: Lights,
    pub(crate) sky: Sky,
    pub(crate) noise: Noise,
    pub(crate) images: Images,
}

impl Engine {
    /// Features the caller's device must be created with.
    pub fn required_features() -> wgpu::Features {
        wgpu::Features::PUSH_CONSTANTS
            | wgpu::Features::CLEAR_TEXTURE
            | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
    }

    /// Features that improve the renderer when present (per-stage timing).
    pub fn optional_features() -> wgpu::Features {
        wgpu::Features::TIMESTAMP_QUERY
    }

    /// Limits the caller's device must be created with.
    pub fn required_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_push_constant_size: 32,
            max_storage_buffers_per_shader_stage: 10,
            max_storage_textures_per_shader_stage: 8,
            max_storage_buffer_binding_size: 1 << 30,
            ..Default::default()
        }
    }

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneDescriptor,
        bvh: BvhData,
        sky: &SkyDescriptor,
        noise: &BlueNoiseTables,
    ) -> Result<Self, Error> {
        if scene.triangles.is_empty() || bvh.indices.is_empty() {
            return Err(Error::EmptyScene);
        }

        log::info!(
            "Initializing engine; triangles={}, materials={}, images={}",
            scene.triangles.len(),
            scene.materials.len(),
            scene.images.len(),
        );

        let shaders = Shaders::new(device)?;
        let images = Images::new(device, queue, &scene.images)?;

        let triangles =
            Triangles::new(device, queue, &scene.triangles, &bvh);

        let materials = Materials::new(
            device,
            queue,
            &scene.materials,
            images.layout(),
        );

        let lights = Lights::new(
            device,
            queue,
            triangles.data(),
            &scene.materials,
        );

        Ok(Self {
            shaders,
            triangles,
            materials,
            bvh: Bvh::new(device, queue, &bvh),
            lights,
            sky: Sky::new(device, queue, sky)?,
            noise: Noise::new(device, queue, noise)?,
            images,
        })
    }
}
