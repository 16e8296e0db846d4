use glam::uvec2;

use super::TRACER_WORKGROUPS;
use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct ShadowTracePass {
    pass: CameraComputePass<gpu::TracePassParams>,
}

impl ShadowTracePass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("shadow_trace")
            .bind([
                &buffers.frame_params,
                &buffers.counters.bind_writable(),
                &engine.triangles.bind_readable(),
                &engine.bvh.bind_readable(),
            ])
            .bind([
                &buffers.camera,
                &buffers.shadow_queue.bind_writable(),
                &buffers.direct.bind_writable(),
                &buffers.indirect.bind_writable(),
            ])
            .build(device, engine.shaders.shadow_trace());

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
            false,
            uvec2(TRACER_WORKGROUPS, 1),
            gpu::TracePassParams { bounce },
            profiler.stage("shadow_trace"),
        );
    }
}
