use glam::UVec2;

use crate::gpu::{
    self, Counters, MaterialQueueView, ShadowQueueView, TraceQueueView,
};
use crate::{
    Camera, DoubleBuffered, ExternalTexture, GBufferViews,
    MappedUniformBuffer, Texture, UnmappedStorageBuffer, BATCH_SIZE,
};

const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Everything sized to the viewport or the batch: ray queues, counters,
/// frame buffers and the denoiser's history. Recreated wholesale on resize.
#[derive(Debug)]
pub struct CameraBuffers {
    pub camera: MappedUniformBuffer<gpu::Camera>,
    pub frame_params: MappedUniformBuffer<gpu::FrameParams>,
    pub svgf_params: MappedUniformBuffer<gpu::SvgfParams>,

    pub counters: UnmappedStorageBuffer,
    pub counter_seeds: UnmappedStorageBuffer,

    pub trace_queue: DoubleBuffered<UnmappedStorageBuffer>,
    pub diffuse_queue: UnmappedStorageBuffer,
    pub dielectric_glossy_queue: UnmappedStorageBuffer,
    pub shadow_queue: UnmappedStorageBuffer,

    pub direct: Texture,
    pub indirect: Texture,
    pub albedo: Texture,

    pub moments: DoubleBuffered<Texture>,
    pub history_direct: Texture,
    pub history_indirect: Texture,
    pub history_normal_depth: Texture,
    pub history_length: DoubleBuffered<UnmappedStorageBuffer>,

    pub atrous_direct: DoubleBuffered<Texture>,
    pub atrous_indirect: DoubleBuffered<Texture>,

    pub composed: Texture,
    pub taa_prev: Texture,
    pub taa_curr: Texture,

    pub output: wgpu::TextureView,
    pub gbuffer: GBuffers,

    pub batch_size: usize,
    pub batch_count: usize,
}

impl CameraBuffers {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        output: wgpu::TextureView,
        gbuffers: Option<GBufferViews>,
    ) -> Self {
        log::debug!("Initializing camera buffers");

        let size = camera.viewport_size;
        let pixel_count = camera.pixel_count();
        let batch_size = BATCH_SIZE.min(pixel_count);
        let batch_count = pixel_count.div_ceil(batch_size);

        let camera_uniform = MappedUniformBuffer::new(
            device,
            "glimt_camera",
            Default::default(),
        );

        let frame_params = MappedUniformBuffer::new(
            device,
            "glimt_frame_params",
            Default::default(),
        );

        let svgf_params = MappedUniformBuffer::new(
            device,
            "glimt_svgf_params",
            Default::default(),
        );

        // ---------------------------------------------------------------- //

        let counters = UnmappedStorageBuffer::new(
            device,
            "glimt_counters",
            Counters::COUNT * 4,
        );

        // One pre-baked counter image per batch; the per-batch reset is a
        // plain buffer copy recorded between dispatches
        let counter_seeds = UnmappedStorageBuffer::new(
            device,
            "glimt_counter_seeds",
            batch_count * Counters::COUNT * 4,
        );

        let mut seeds = vec![0u32; batch_count * Counters::COUNT];

        for batch in 0..batch_count {
            let pixels =
                batch_size.min(pixel_count - batch * batch_size) as u32;

            seeds[batch * Counters::COUNT
                + Counters::trace(0) as usize] = pixels;
        }

        queue.write_buffer(
            counter_seeds.as_buffer(),
            0,
            bytemuck::cast_slice(&seeds),
        );

        // ---------------------------------------------------------------- //

        let trace_queue = DoubleBuffered::<UnmappedStorageBuffer>::new(
            device,
            "glimt_trace_queue",
            TraceQueueView::LANES * batch_size * 4,
        );

        let diffuse_queue = UnmappedStorageBuffer::new(
            device,
            "glimt_diffuse_queue",
            MaterialQueueView::LANES * batch_size * 4,
        );

        let dielectric_glossy_queue = UnmappedStorageBuffer::new(
            device,
            "glimt_dielectric_glossy_queue",
            MaterialQueueView::LANES * batch_size * 4,
        );

        let shadow_queue = UnmappedStorageBuffer::new(
            device,
            "glimt_shadow_queue",
            ShadowQueueView::LANES * batch_size * 4,
        );

        // ---------------------------------------------------------------- //

        let tex = |label: &str| {
            Texture::new(device, label, size, FRAME_FORMAT)
        };

        let tex2 = |label: &str| {
            DoubleBuffered::<Texture>::new(device, label, size, FRAME_FORMAT)
        };

        let history_length = DoubleBuffered::<UnmappedStorageBuffer>::new(
            device,
            "glimt_history_length",
            camera.padded_pixel_count() * 4,
        );

        Self {
            camera: camera_uniform,
            frame_params,
            svgf_params,

            counters,
            counter_seeds,

            trace_queue,
            diffuse_queue,
            dielectric_glossy_queue,
            shadow_queue,

            direct: tex("glimt_direct"),
            indirect: tex("glimt_indirect"),
            albedo: tex("glimt_albedo"),

            moments: tex2("glimt_moments"),
            history_direct: tex("glimt_history_direct"),
            history_indirect: tex("glimt_history_indirect"),
            history_normal_depth: tex("glimt_history_normal_depth"),
            history_length,

            atrous_direct: tex2("glimt_atrous_direct"),
            atrous_indirect: tex2("glimt_atrous_indirect"),

            composed: tex("glimt_composed"),
            taa_prev: tex("glimt_taa_prev"),
            taa_curr: tex("glimt_taa_curr"),

            output,
            gbuffer: GBuffers::new(device, gbuffers),

            batch_size,
            batch_count,
        }
    }

    pub fn bind_output(&self) -> impl crate::Bindable + '_ {
        ExternalTexture::new(&self.output).bind_writable(FRAME_FORMAT)
    }
}

/// The externally rasterized G-buffer views, or inert 1x1 stand-ins when the
/// caller runs without a rasterizer (pure mode never samples them).
#[derive(Debug)]
pub struct GBuffers {
    pub available: bool,

    pub normal_depth: wgpu::TextureView,
    pub uv: wgpu::TextureView,
    pub uv_gradient: wgpu::TextureView,
    pub triangle_id: wgpu::TextureView,
    pub motion: wgpu::TextureView,
    pub depth_gradient: wgpu::TextureView,
}

impl GBuffers {
    pub(crate) fn new(
        device: &wgpu::Device,
        views: Option<GBufferViews>,
    ) -> Self {
        if let Some(views) = views {
            return Self {
                available: true,
                normal_depth: views.normal_depth,
                uv: views.uv,
                uv_gradient: views.uv_gradient,
                triangle_id: views.triangle_id,
                motion: views.motion,
                depth_gradient: views.depth_gradient,
            };
        }

        let dummy = || {
            Texture::new(
                device,
                "glimt_gbuffer_dummy",
                UVec2::ONE,
                FRAME_FORMAT,
            )
            .tex()
            .create_view(&Default::default())
        };

        Self {
            available: false,
            normal_depth: dummy(),
            uv: dummy(),
            uv_gradient: dummy(),
            triangle_id: dummy(),
            motion: dummy(),
            depth_gradient: dummy(),
        }
    }

    pub fn bind_normal_depth(&self) -> impl crate::Bindable + '_ {
        sampled(&self.normal_depth)
    }

    pub fn bind_uv(&self) -> impl crate::Bindable + '_ {
        sampled(&self.uv)
    }

    pub fn bind_uv_gradient(&self) -> impl crate::Bindable + '_ {
        sampled(&self.uv_gradient)
    }

    pub fn bind_triangle_id(&self) -> impl crate::Bindable + '_ {
        sampled(&self.triangle_id)
    }

    pub fn bind_motion(&self) -> impl crate::Bindable + '_ {
        sampled(&self.motion)
    }

    pub fn bind_depth_gradient(&self) -> impl crate::Bindable + '_ {
        sampled(&self.depth_gradient)
    }
}

fn sampled(view: &wgpu::TextureView) -> impl crate::Bindable + '_ {
    crate::SampledTextureBinder {
        view,
        filterable: false,
    }
}
