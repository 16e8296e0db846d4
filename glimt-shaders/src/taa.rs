use glimt_gpu::prelude::*;

const BLEND: f32 = 0.1;

/// Temporal anti-aliasing: reprojects the previous output through the
/// G-buffer motion, clips it against the 3x3 neighborhood of the current
/// frame, and blends. Writes into a scratch target so neighboring threads
/// never observe half-updated history.
#[spirv(compute(threads(8, 8)))]
pub fn resolve(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] gbuffer_motion: Tex,
    #[spirv(descriptor_set = 1, binding = 0)] composed: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 1)] taa_prev: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 2)] taa_curr: TexRgba32f,
) {
    let pos = global_id.xy();

    if !camera.contains(pos) {
        return;
    }

    let current: Vec4 = composed.read(pos);

    let prev_pos = {
        let motion: Vec4 = gbuffer_motion.fetch(pos);

        ivec2((motion.x + 0.5) as i32, (motion.y + 0.5) as i32)
    };

    if !camera.contains(prev_pos) {
        unsafe {
            taa_curr.write(pos, current);
        }

        return;
    }

    // Neighborhood min/max of the current frame bounds the history; this is
    // what keeps stale colors from smearing
    let mut neighborhood_min = current.xyz();
    let mut neighborhood_max = current.xyz();

    let mut offset = ivec2(-1, -1);

    loop {
        let sample_pos = pos.as_ivec2() + offset;

        if camera.contains(sample_pos) {
            let sample: Vec4 = composed.read(sample_pos.as_uvec2());

            neighborhood_min = neighborhood_min.min(sample.xyz());
            neighborhood_max = neighborhood_max.max(sample.xyz());
        }

        offset.x += 1;

        if offset.x == 2 {
            offset.x = -1;
            offset.y += 1;

            if offset.y == 2 {
                break;
            }
        }
    }

    let history: Vec4 = taa_prev.read(prev_pos.as_uvec2());

    let clipped =
        history.xyz().clamp(neighborhood_min, neighborhood_max);

    let blended = clipped.lerp(current.xyz(), BLEND);

    unsafe {
        taa_curr.write(pos, blended.sanitize().extend(1.0));
    }
}

/// Publishes the resolved frame: copies the scratch target to the output
/// surface and promotes it to next frame's history.
#[spirv(compute(threads(8, 8)))]
pub fn promote(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] camera: &Camera,
    #[spirv(descriptor_set = 1, binding = 0)] taa_curr: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 1)] taa_prev: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 2)] output: TexRgba32f,
) {
    let pos = global_id.xy();

    if !camera.contains(pos) {
        return;
    }

    let color: Vec4 = taa_curr.read(pos);

    unsafe {
        taa_prev.write(pos, color);
        output.write(pos, color);
    }
}
