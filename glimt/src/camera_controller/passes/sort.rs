use glam::uvec2;
use rand::Rng;

use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct SortPass {
    pass: CameraComputePass<gpu::SortPassParams>,
}

impl SortPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("sort")
            .bind([
                &buffers.frame_params,
                &buffers.counters.bind_writable(),
                &engine.triangles.bind_readable(),
                &engine.materials.bind_readable(),
                &engine.sky.bind_readable(),
            ])
            .bind([
                &buffers.camera,
                &buffers.trace_queue.bind_writable(),
                &buffers.diffuse_queue.bind_writable(),
                &buffers.dielectric_glossy_queue.bind_writable(),
                &buffers.direct.bind_writable(),
                &buffers.indirect.bind_writable(),
                &buffers.albedo.bind_writable(),
            ])
            .build(device, engine.shaders.sort());

        Self { pass }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        batch_size: u32,
        bounce: u32,
    ) {
        let params = gpu::SortPassParams {
            seed: rand::thread_rng().gen(),
            bounce,
        };

        self.pass.run(
            encoder,
            bounce % 2 == 1,
            uvec2(batch_size.div_ceil(64), 1),
            params,
            profiler.stage("sort"),
        );
    }
}
