use glam::UVec2;

use crate::{
    gpu, CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct SvgfWaveletPass {
    pass: CameraComputePass<gpu::SvgfAtrousPassParams>,
}

impl SvgfWaveletPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        let pass = CameraComputePass::builder("svgf_wavelet")
            .bind([
                &buffers.camera,
                &buffers.svgf_params,
                &buffers.gbuffer.bind_normal_depth(),
            ])
            .bind([
                &buffers.atrous_direct.bind_writable(),
                &buffers.atrous_direct.bind_writable_flipped(),
                &buffers.atrous_indirect.bind_writable(),
                &buffers.atrous_indirect.bind_writable_flipped(),
            ])
            .build(device, engine.shaders.svgf_wavelet());

        Self { pass }
    }

    /// Iteration `i` filters with stride `2^i`, ping-ponging the pair.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut FrameProfiler,
        viewport: UVec2,
        iteration: u32,
    ) {
        self.pass.run(
            encoder,
            iteration % 2 == 1,
            (viewport + 7) / 8,
            gpu::SvgfAtrousPassParams {
                stride: 1 << iteration,
            },
            profiler.stage("svgf_wavelet"),
        );
    }
}
