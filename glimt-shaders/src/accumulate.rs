use glimt_gpu::prelude::*;

/// Progressive accumulation for the denoiser-off path: an online average of
/// per-frame radiance over the frames since the camera last moved.
#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &AccumulatePassParams,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] camera: &Camera,
    #[spirv(uniform, descriptor_set = 0, binding = 1)] frame: &FrameParams,
    #[spirv(descriptor_set = 1, binding = 0)] direct: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 1)] indirect: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 2)] albedo: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 3)] output: TexRgba32f,
) {
    let pos = global_id.xy();

    if !camera.contains(pos) {
        return;
    }

    let direct: Vec4 = direct.read(pos);
    let indirect: Vec4 = indirect.read(pos);

    let mut color = (direct.xyz() + indirect.xyz()).sanitize();

    if frame.albedo_enabled() {
        let albedo: Vec4 = albedo.read(pos);

        color *= albedo.xyz();
    }

    let previous: Vec4 = output.read(pos);
    let color = online_mean(previous.xyz(), color, params.frames);

    unsafe {
        output.write(pos, color.extend(1.0));
    }
}
