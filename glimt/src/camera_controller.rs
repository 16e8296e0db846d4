mod buffers;
mod pass;
mod passes;

use glam::Vec2;
use log::{debug, info};

pub use self::buffers::*;
pub use self::pass::*;
pub use self::passes::*;
use crate::gpu::{self, Counters};
use crate::{
    advance_frame_counter, halton_jitter, Camera, Engine, Error,
    FrameProfiler, GBufferViews, Settings, MAX_BOUNCES,
};

/// Snapshot of the per-bounce queue counters; see
/// [`CameraController::read_queue_sizes()`].
#[derive(Clone, Debug)]
pub struct QueueSizes {
    counters: Vec<u32>,
}

impl QueueSizes {
    pub fn trace(&self, bounce: u32) -> u32 {
        self.counters[Counters::trace(bounce) as usize]
    }

    pub fn diffuse(&self, bounce: u32) -> u32 {
        self.counters[Counters::diffuse(bounce) as usize]
    }

    pub fn dielectric(&self, bounce: u32) -> u32 {
        self.counters[Counters::dielectric(bounce) as usize]
    }

    pub fn glossy(&self, bounce: u32) -> u32 {
        self.counters[Counters::glossy(bounce) as usize]
    }

    pub fn shadow(&self, bounce: u32) -> u32 {
        self.counters[Counters::shadow(bounce) as usize]
    }
}

/// Drives one viewport: owns the ray queues, frame buffers and denoiser
/// history, and records the full frame pipeline into the caller's encoder.
///
/// The host side is single-threaded cooperative over the GPU: every stage is
/// recorded in order, and encoder ordering is the only synchronization the
/// pipeline needs.
#[derive(Debug)]
pub struct CameraController {
    camera: Camera,
    settings: Option<Settings>,
    buffers: CameraBuffers,
    passes: CameraPasses,
    profiler: FrameProfiler,

    frame: u32,
    frames_since_camera_moved: u32,
    jitter_index: u32,
    needs_history_reset: bool,
}

impl CameraController {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: Camera,
        output: wgpu::TextureView,
        gbuffers: Option<GBufferViews>,
    ) -> Self {
        info!(
            "Creating camera; viewport={:?}",
            camera.viewport_size
        );

        let buffers =
            CameraBuffers::new(device, queue, &camera, output, gbuffers);

        let passes = CameraPasses::new(
            engine,
            device,
            &Settings::default(),
            &buffers,
        );

        Self {
            camera,
            settings: None,
            buffers,
            passes,
            profiler: FrameProfiler::new(device, queue),

            frame: 0,
            frames_since_camera_moved: 0,
            jitter_index: 0,
            needs_history_reset: true,
        }
    }

    /// Swaps in a fresh set of G-buffer views, e.g. after the caller's
    /// rasterizer followed a resize.
    pub fn set_gbuffers(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        gbuffers: Option<GBufferViews>,
    ) {
        self.buffers.gbuffer = GBuffers::new(device, gbuffers);

        let settings = self.settings.clone().unwrap_or_default();

        self.passes =
            CameraPasses::new(engine, device, &settings, &self.buffers);
    }

    /// Applies this frame's camera and settings; must be called once before
    /// each [`Self::render()`].
    pub fn update(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        settings: &Settings,
    ) -> Result<(), Error> {
        if settings.num_bounces < 1 || settings.num_bounces > MAX_BOUNCES {
            return Err(Error::TooManyBounces(settings.num_bounces));
        }

        let settings_changed =
            self.settings.as_ref() != Some(settings);

        let camera_moved = !self.camera.is_approx_eq(camera);
        let resized = self.camera.viewport_size != camera.viewport_size;

        // A settings change restarts the temporal pipeline: history length
        // drops to zero everywhere
        if settings_changed {
            self.needs_history_reset = true;
        }

        self.frames_since_camera_moved = advance_frame_counter(
            self.frames_since_camera_moved,
            settings_changed,
            settings.enable_svgf,
            camera_moved,
        );

        if resized {
            debug!("Rebuilding buffers; viewport={:?}", camera.viewport_size);

            // All viewport-sized resources are dropped and recreated; the
            // first frame afterwards must not see stale history. The old
            // G-buffer views are dropped too - they describe the old
            // viewport - and the caller re-supplies them via
            // `set_gbuffers()`.
            let output = self.buffers.output.clone();

            self.buffers = CameraBuffers::new(
                device,
                queue,
                camera,
                output,
                None,
            );

            self.needs_history_reset = true;
            self.frames_since_camera_moved = 0;
        }

        if settings.needs_gbuffers() && !self.buffers.gbuffer.available {
            return Err(Error::GBuffersRequired);
        }

        if resized || settings_changed {
            debug!("Rebuilding passes");

            self.passes =
                CameraPasses::new(engine, device, settings, &self.buffers);
        }

        let jitter = if settings.enable_taa {
            halton_jitter(self.jitter_index)
        } else {
            Vec2::ZERO
        };

        self.jitter_index = (self.jitter_index + 1) & 3;

        self.camera = camera.clone();
        self.settings = Some(settings.clone());

        *self.buffers.camera = camera.serialize(settings, jitter);

        *self.buffers.frame_params = gpu::FrameParams {
            flags: settings.serialize_flags(),
            num_bounces: settings.num_bounces,
            bvh_layout: engine.bvh.layout().serialize(),
            batch_size: self.buffers.batch_size as u32,
            sky_width: engine.sky.width(),
            sky_height: engine.sky.height(),
            atlas_lod_bias: engine.images.lod_bias(),
            total_light_area: engine.lights.total_area(),
        };

        *self.buffers.svgf_params = settings.serialize_svgf();

        self.buffers.camera.flush(queue);
        self.buffers.frame_params.flush(queue);
        self.buffers.svgf_params.flush(queue);

        Ok(())
    }

    /// Records a full frame: the wavefront bounce loop per batch, then the
    /// reconstruction pipeline.
    pub fn render(
        &mut self,
        engine: &Engine,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let settings = self
            .settings
            .clone()
            .expect("`update()` must be called before `render()`");

        let viewport = self.camera.viewport_size;
        let pixel_count = self.camera.pixel_count();
        let batch_size = self.buffers.batch_size;

        if std::mem::take(&mut self.needs_history_reset) {
            self.reset_history(encoder);
        }

        // Bounce 0 of the sort stage replaces `direct`; everything else
        // accumulates, so both buffers start from zero
        encoder
            .clear_texture(self.buffers.direct.tex(), &Default::default());

        encoder
            .clear_texture(self.buffers.indirect.tex(), &Default::default());

        // ------------------------------------------------------------------ //
        // Wavefront bounce loop, one batch of pixels at a time

        for batch in 0..self.buffers.batch_count {
            let pixel_offset = batch * batch_size;

            let batch_pixels =
                batch_size.min(pixel_count - pixel_offset) as u32;

            encoder.copy_buffer_to_buffer(
                self.buffers.counter_seeds.as_buffer(),
                (batch * Counters::COUNT * 4) as u64,
                self.buffers.counters.as_buffer(),
                0,
                (Counters::COUNT * 4) as u64,
            );

            if settings.enable_rasterization {
                self.passes.primary.run(
                    encoder,
                    &mut self.profiler,
                    self.frames_since_camera_moved,
                    pixel_offset as u32,
                    batch_pixels,
                );
            } else {
                self.passes.generate.run(
                    encoder,
                    &mut self.profiler,
                    self.frames_since_camera_moved,
                    pixel_offset as u32,
                    batch_pixels,
                );
            }

            for bounce in 0..settings.num_bounces {
                // Hybrid mode's bounce 0 came straight from the G-buffer
                if !(bounce == 0 && settings.enable_rasterization) {
                    self.passes.trace.run(
                        encoder,
                        &mut self.profiler,
                        bounce,
                    );

                    self.passes.sort.run(
                        encoder,
                        &mut self.profiler,
                        batch_pixels,
                        bounce,
                    );
                }

                if engine.materials.has_diffuse() {
                    self.passes.shade_diffuse.run(
                        encoder,
                        &mut self.profiler,
                        batch_pixels,
                        self.frames_since_camera_moved,
                        bounce,
                    );
                }

                if engine.materials.has_dielectric() {
                    self.passes.shade_dielectric.run(
                        encoder,
                        &mut self.profiler,
                        batch_pixels,
                        self.frames_since_camera_moved,
                        bounce,
                    );
                }

                if engine.materials.has_glossy() {
                    self.passes.shade_glossy.run(
                        encoder,
                        &mut self.profiler,
                        batch_pixels,
                        self.frames_since_camera_moved,
                        bounce,
                    );
                }

                if engine.materials.has_lights()
                    && settings.enable_next_event_estimation
                {
                    self.passes.shadow_trace.run(
                        encoder,
                        &mut self.profiler,
                        bounce,
                    );
                }
            }
        }

        // ------------------------------------------------------------------ //
        // Reconstruction

        if settings.enable_svgf {
            let frame_parity = self.frame % 2 == 1;

            self.passes.svgf_reproject.run(
                encoder,
                &mut self.profiler,
                viewport,
                frame_parity,
            );

            self.passes.svgf_variance.run(
                encoder,
                &mut self.profiler,
                viewport,
                frame_parity,
            );

            let iterations = settings.svgf.atrous_iterations;

            for iteration in 0..iterations {
                self.passes.svgf_wavelet.run(
                    encoder,
                    &mut self.profiler,
                    viewport,
                    iteration,
                );
            }

            self.passes.svgf_finalize.run(
                encoder,
                &mut self.profiler,
                viewport,
                iterations % 2 == 1,
            );

            if settings.enable_taa {
                self.passes.taa.run(encoder, &mut self.profiler, viewport);
            }
        } else {
            self.passes.accumulate.run(
                encoder,
                &mut self.profiler,
                viewport,
                self.frames_since_camera_moved,
            );
        }

        self.profiler.resolve(encoder);
        self.frame = self.frame.wrapping_add(1);
    }

    /// Most recent per-stage GPU timings, refreshed as readbacks complete.
    pub fn timings(
        &mut self,
        device: &wgpu::Device,
    ) -> Vec<(&'static str, std::time::Duration)> {
        self.profiler.report(device)
    }

    /// Debug aid: blocks on the device and reads back the per-bounce queue
    /// counters of the most recent batch. Also asserts (in debug builds)
    /// that no queue outgrew its capacity - overflow is a programming error,
    /// prevented by sizing every queue to the batch.
    pub fn read_queue_sizes(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> QueueSizes {
        let size = (Counters::COUNT * 4) as u64;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glimt_counters_staging"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glimt_counters_readback"),
            });

        encoder.copy_buffer_to_buffer(
            self.buffers.counters.as_buffer(),
            0,
            &staging,
            0,
            size,
        );

        queue.submit([encoder.finish()]);

        let slice = staging.slice(..);

        slice.map_async(wgpu::MapMode::Read, |_| ());
        device.poll(wgpu::Maintain::Wait);

        let counters: Vec<u32> = {
            let data = slice.get_mapped_range();

            bytemuck::pod_collect_to_vec(&data[..])
        };

        staging.unmap();

        let sizes = QueueSizes { counters };

        if cfg!(debug_assertions) {
            let capacity = self.buffers.batch_size as u32;

            for bounce in 0..MAX_BOUNCES {
                debug_assert!(sizes.trace(bounce) <= capacity);
                debug_assert!(sizes.diffuse(bounce) <= capacity);
                debug_assert!(sizes.shadow(bounce) <= capacity);

                // The shared double-ended buffer must never collide
                debug_assert!(
                    sizes.dielectric(bounce) + sizes.glossy(bounce)
                        <= capacity
                );
            }
        }

        sizes
    }

    /// Zeroes everything the temporal pipeline carries across frames, so
    /// the first frame after a (re)start has no ghosting to inherit.
    fn reset_history(&mut self, encoder: &mut wgpu::CommandEncoder) {
        debug!("Resetting temporal history");

        for texture in [
            &self.buffers.history_direct,
            &self.buffers.history_indirect,
            &self.buffers.history_normal_depth,
            &self.buffers.taa_prev,
        ] {
            encoder.clear_texture(texture.tex(), &Default::default());
        }

        for texture in self.buffers.moments.each() {
            encoder.clear_texture(texture.tex(), &Default::default());
        }

        for buffer in self.buffers.history_length.each() {
            encoder.clear_buffer(buffer.as_buffer(), 0, None);
        }
    }
}
