use glam::UVec2;

use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct AccumulatePass {
    pass: CameraComputePass<gpu::AccumulatePassParams>,
}

impl AccumulatePass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("accumulate")
            .bind([&buffers.camera, &buffers.frame_params])
            .bind([
                &buffers.direct.bind_writable(),
                &buffers.indirect.bind_writable(),
                &buffers.albedo.bind_writable(),
                &buffers.bind_output(),
            ])
            .build(device, engine.shaders.accumulate());

        Self { pass }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        viewport: UVec2,
        frames: u32,
    ) {
        self.pass.run(
            encoder,
            false,
            (viewport + 7) / 8,
            gpu::AccumulatePassParams { frames },
            profiler.stage("accumulate"),
        );
    }
}
