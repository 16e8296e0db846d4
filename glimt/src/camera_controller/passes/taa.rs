use glam::UVec2;

use crate::{
    CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct TaaPass {
    resolve: CameraComputePass<()>,
    promote: CameraComputePass<()>,
}

impl TaaPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let resolve = CameraComputePass::builder("taa_resolve")
            .bind([&buffers.camera, &buffers.gbuffer.bind_motion()])
            .bind([
                &buffers.composed.bind_writable(),
                &buffers.taa_prev.bind_writable(),
                &buffers.taa_curr.bind_writable(),
            ])
            .build(device, engine.shaders.taa_resolve());

        let promote = CameraComputePass::builder("taa_promote")
            .bind([&buffers.camera])
            .bind([
                &buffers.taa_curr.bind_writable(),
                &buffers.taa_prev.bind_writable(),
                &buffers.bind_output(),
            ])
            .build(device, engine.shaders.taa_promote());

        Self { resolve, promote }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        viewport: UVec2,
    ) {
        let size = (viewport + 7) / 8;

        self.resolve.run(
            encoder,
            false,
            size,
            (),
            profiler.stage("taa_resolve"),
        );

        self.promote.run(
            encoder,
            false,
            size,
            (),
            profiler.stage("taa_promote"),
        );
    }
}
