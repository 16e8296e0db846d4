use glam::uvec2;
use rand::Rng;

use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct ShadeDielectricPass {
    pass: CameraComputePass<gpu::ShadePassParams>,
}

impl ShadeDielectricPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("shade_dielectric")
            .bind([
                &buffers.frame_params,
                &buffers.counters.bind_writable(),
                &engine.triangles.bind_readable(),
                &engine.materials.bind_readable(),
            ])
            .bind([
                &buffers.camera,
                &buffers.dielectric_glossy_queue.bind_writable(),
                &buffers.trace_queue.bind_writable_flipped(),
                &buffers.albedo.bind_writable(),
            ])
            .build(device, engine.shaders.shade_dielectric());

        Self { pass }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        batch_size: u32,
        frame: u32,
        bounce: u32,
    ) {
        let params = gpu::ShadePassParams {
            seed: rand::thread_rng().gen(),
            frame,
            bounce,
        };

        self.pass.run(
            encoder,
            bounce % 2 == 1,
            uvec2(batch_size.div_ceil(64), 1),
            params,
            profiler.stage("shade_dielectric"),
        );
    }
}
