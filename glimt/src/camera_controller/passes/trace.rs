use glam::uvec2;

use super::TRACER_WORKGROUPS;
use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct TracePass {
    pass: CameraComputePass<gpu::TracePassParams>,
}

impl TracePass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("trace")
            .bind([
                &buffers.frame_params,
                &buffers.counters.bind_writable(),
                &engine.triangles.bind_readable(),
                &engine.bvh.bind_readable(),
            ])
            .bind([&buffers.trace_queue.bind_writable()])
            .build(device, engine.shaders.trace());

        Self { pass }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        bounce: u32,
    ) {
        self.pass.run(
            encoder,
            bounce % 2 == 1,
            uvec2(TRACER_WORKGROUPS, 1),
            gpu::TracePassParams { bounce },
            profiler.stage("trace"),
        );
    }
}
