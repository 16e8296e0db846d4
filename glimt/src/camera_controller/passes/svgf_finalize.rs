use glam::UVec2;

use crate::{
    CameraBuffers, CameraComputePass, Engine, FrameProfiler, Settings,
};

#[derive(Debug)]
pub struct SvgfFinalizePass {
    pass: CameraComputePass<()>,
}

impl SvgfFinalizePass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        settings: &Settings,
        buffers: &CameraBuffers,
    ) -> Self {
        // Under TAA the recombined frame goes through the scratch target
        // first; otherwise straight to the output surface
        let composed = buffers.composed.bind_writable();
        let output = buffers.bind_output();

        let target: &dyn crate::Bindable = if settings.enable_taa {
            &composed
        } else {
            &output
        };

        let pass = CameraComputePass::builder("svgf_finalize")
            .bind([
                &buffers.camera,
                &buffers.frame_params,
                &buffers.gbuffer.bind_normal_depth(),
            ])
            .bind([
                &buffers.atrous_direct.bind_writable(),
                &buffers.atrous_indirect.bind_writable(),
                &buffers.albedo.bind_writable(),
                &buffers.history_direct.bind_writable(),
                &buffers.history_indirect.bind_writable(),
                &buffers.history_normal_depth.bind_writable(),
                target,
            ])
            .build(device, engine.shaders.svgf_finalize());

        Self { pass }
    }

    /// `alternate` picks the atrous side the last wavelet iteration wrote.
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
            profiler.stage("svgf_finalize"),
        );
    }
}
