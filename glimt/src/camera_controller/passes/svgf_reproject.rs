use glam::UVec2;

use crate::{
    CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct SvgfReprojectPass {
    pass: CameraComputePass<()>,
}

impl SvgfReprojectPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("svgf_reproject")
            .bind([
                &buffers.camera,
                &buffers.gbuffer.bind_normal_depth(),
                &buffers.gbuffer.bind_motion(),
                &buffers.gbuffer.bind_depth_gradient(),
            ])
            .bind([
                &buffers.direct.bind_writable(),
                &buffers.indirect.bind_writable(),
                &buffers.moments.bind_writable(),
                &buffers.moments.bind_writable_flipped(),
                &buffers.history_direct.bind_writable(),
                &buffers.history_indirect.bind_writable(),
                &buffers.history_normal_depth.bind_writable(),
                &buffers.history_length.bind_readable(),
                &buffers.history_length.bind_writable_flipped(),
            ])
            .build(device, engine.shaders.svgf_reproject());

        Self { pass }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        viewport: UVec2,
        alternate: bool,
    ) {
        self.pass.run(
            encoder,
            alternate,
            (viewport + 7) / 8,
            (),
            profiler.stage("svgf_reproject"),
        );
    }
}
