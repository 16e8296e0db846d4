use glam::UVec2;

use crate::{
    CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

/// Feeds the first wavelet iteration; always runs so the filter chain has a
/// single entry buffer, with the spatial estimator inside gated by settings
/// and history length.
#[derive(Debug)]
pub struct SvgfVariancePass {
    pass: CameraComputePass<()>,
}

impl SvgfVariancePass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("svgf_variance")
            .bind([
                &buffers.camera,
                &buffers.frame_params,
                &buffers.gbuffer.bind_normal_depth(),
            ])
            .bind([
                &buffers.history_length.bind_readable_flipped(),
                &buffers.direct.bind_writable(),
                &buffers.indirect.bind_writable(),
                &buffers.atrous_direct.bind_writable_first(),
                &buffers.atrous_indirect.bind_writable_first(),
            ])
            .build(device, engine.shaders.svgf_variance());

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
            profiler.stage("svgf_variance"),
        );
    }
}
