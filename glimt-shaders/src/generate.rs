use glimt_gpu::prelude::*;

/// Emits one primary extension ray per pixel of the current batch, with
/// sub-pixel jitter and thin-lens depth of field; bounce 0 of the pure
/// (non-rasterized) pipeline.
#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &GeneratePassParams,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] frame: &FrameParams,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)]
    blue_noise: &[u32],
    #[spirv(uniform, descriptor_set = 1, binding = 0)] camera: &Camera,
    #[spirv(storage_buffer, descriptor_set = 1, binding = 1)]
    trace_queue: &mut [u32],
) {
    let idx = global_id.x;

    if idx >= params.pixel_count {
        return;
    }

    let pixel_idx = params.pixel_offset + idx;
    let pos = uvec2(
        pixel_idx % camera.screen_width(),
        pixel_idx / camera.screen_width(),
    );

    let mut wnoise = WhiteNoise::new(params.seed, pos);
    let mut bnoise =
        LdsBlueNoise::new(blue_noise, pos, params.frame & 255, 0);

    // TAA drives a global Halton jitter; otherwise the reconstruction filter
    // decides the per-pixel jitter shape.
    let jitter = if frame.taa_enabled() {
        camera.jitter()
    } else if frame.gaussian_filter() {
        vec2(
            wnoise.sample_gaussian(0.5),
            wnoise.sample_gaussian(0.5),
        )
    } else {
        bnoise.sample_vec2() - 0.5
    };

    let lens = if camera.aperture() > 0.0 {
        sample_hexagon(
            bnoise.sample_vec2(),
            wnoise.sample(),
            camera.aperture(),
        )
    } else {
        Vec2::ZERO
    };

    let ray = camera.ray(pos.as_vec2() + 0.5 + jitter, lens);

    let mut queue = TraceQueueView::new(trace_queue, frame.batch_size);

    queue.write(
        idx,
        TraceRay {
            origin: ray.origin(),
            direction: ray.direction(),
            pixel: PixelId::from_pos(pos, camera.screen_pitch(), false),
            throughput: Vec3::ONE,
            last_pdf: 0.0,
            cone: RayCone {
                angle: camera.cone_angle(),
                width: 0.0,
            },
        },
    );
}
