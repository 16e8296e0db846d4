use glam::uvec2;
use rand::Rng;

use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct GeneratePass {
    pass: CameraComputePass<gpu::GeneratePassParams>,
}

impl GeneratePass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("generate")
            .bind([
                &buffers.frame_params,
                &engine.noise.bind_readable(),
            ])
            .bind([
                &buffers.camera,
                &buffers.trace_queue.bind_writable(),
            ])
            .build(device, engine.shaders.generate());

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
            profiler.stage("generate"),
        );
    }
}
