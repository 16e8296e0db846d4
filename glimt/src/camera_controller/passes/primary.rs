use glam::uvec2;
use rand::Rng;

use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct PrimaryPass {
    pass: CameraComputePass<gpu::GeneratePassParams>,
}

impl PrimaryPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("primary")
            .bind([
                &buffers.frame_params,
                &buffers.counters.bind_writable(),
                &engine.triangles.bind_readable(),
                &engine.materials.bind_readable(),
                &engine.sky.bind_readable(),
            ])
            .bind([
                &buffers.camera,
                &buffers.diffuse_queue.bind_writable(),
                &buffers.dielectric_glossy_queue.bind_writable(),
                &buffers.direct.bind_writable(),
                &buffers.albedo.bind_writable(),
            ])
            .bind([
                &buffers.gbuffer.bind_uv(),
                &buffers.gbuffer.bind_triangle_id(),
            ])
            .build(device, engine.shaders.primary());

        Self { pass }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        frame: u32,
        pixel_offset: u32,
        pixel_count: u32,
    ) {
        let params = gpu::GeneratePassParams {
            seed: rand::thread_rng().gen(),
            frame,
            pixel_offset,
            pixel_count,
        };

        self.pass.run(
            encoder,
            false,
            uvec2(pixel_count.div_ceil(64), 1),
            params,
            profiler.stage("primary"),
        );
    }
}
