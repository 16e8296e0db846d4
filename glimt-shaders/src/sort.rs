use glimt_gpu::prelude::*;

/// Classifies traced hits into the per-material queues and folds terminal
/// contributions (sky, emitters) into the frame buffers.
///
/// Russian roulette runs here, after classification and before the queue
/// write, so killed paths never occupy a queue slot.
#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &SortPassParams,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] frame: &FrameParams,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)]
    counters: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 2)]
    triangles: &[Triangle],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 3)]
    materials: &[Material],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 4)] sky: &[Vec4],
    #[spirv(uniform, descriptor_set = 1, binding = 0)] camera: &Camera,
    #[spirv(storage_buffer, descriptor_set = 1, binding = 1)]
    trace_queue: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 2)]
    diffuse_queue: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 3)]
    dielectric_glossy_queue: &mut [u32],
    #[spirv(descriptor_set = 1, binding = 4)] direct: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 5)] indirect: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 6)] albedo: TexRgba32f,
) {
    let idx = global_id.x;
    let bounce = params.bounce;

    if idx >= read_counter(counters, Counters::trace(bounce)) {
        return;
    }

    let queue = TraceQueueView::new(trace_queue, frame.batch_size);
    let ray = queue.read(idx, bounce);
    let hit = queue.read_hit(idx);

    let pos = ray.pixel.pos(camera.screen_pitch());

    // Sky; fold the environment term and terminate the path
    if hit.is_none() {
        let radiance = ray.throughput
            * SkyView::new(sky, frame.sky_width, frame.sky_height)
                .sample(ray.direction);

        deposit(direct, indirect, bounce, pos, radiance);

        if bounce == 0 {
            unsafe {
                albedo.write(pos, Vec4::ONE);
            }
        }

        return;
    }

    let triangle = TrianglesView::new(triangles).get(hit.triangle_id);
    let material = MaterialsView::new(materials).get(triangle.material_id());

    if material.is_light() {
        let emission = ray.throughput * material.emission();

        // The SVGF-path MIS contract: if the previous bounce could not have
        // been sampled by NEE (or NEE is off), the emission counts in full;
        // with MIS on, the BRDF-sampled estimator takes its balance share;
        // otherwise the NEE path already accounted for this light.
        if !frame.nee_enabled() || !ray.pixel.is_mis_eligible() {
            deposit(direct, indirect, bounce, pos, emission);
        } else if frame.mis_enabled() {
            let light_normal = triangle.geometric_normal().normalize();
            let cos_light = ray.direction.dot(light_normal).abs();

            let pdf_light = light_pdf(
                hit.distance,
                cos_light,
                frame.total_light_area,
            );

            let weight = mis_balance(ray.last_pdf, pdf_light);

            deposit(direct, indirect, bounce, pos, emission * weight);
        }

        if bounce == 0 {
            unsafe {
                albedo.write(pos, Vec4::ONE);
            }
        }

        return;
    }

    let mut throughput = ray.throughput;

    // Russian roulette; gated to bounce >= 1 so primary hits always shade
    if bounce >= 1 {
        let survival =
            russian_roulette_probability(throughput, material.tint());

        let mut wnoise = WhiteNoise::from_index(params.seed, idx);

        if wnoise.sample() >= survival {
            return;
        }

        throughput /= survival;
    }

    let record = MaterialRay {
        direction: ray.direction,
        hit,
        pixel: ray.pixel,
        throughput,
        cone: ray.cone,
    };

    match material.kind() {
        MATERIAL_DIELECTRIC => {
            let slot = bump(counters, Counters::dielectric(bounce));

            MaterialQueueView::new(
                dielectric_glossy_queue,
                frame.batch_size,
            )
            .write(slot, record);
        }
        MATERIAL_GLOSSY => {
            let slot = bump(counters, Counters::glossy(bounce));

            let mut queue = MaterialQueueView::new(
                dielectric_glossy_queue,
                frame.batch_size,
            );

            let idx = queue.back_idx(slot);

            queue.write(idx, record);
        }
        _ => {
            let slot = bump(counters, Counters::diffuse(bounce));

            MaterialQueueView::new(diffuse_queue, frame.batch_size)
                .write(slot, record);
        }
    }
}

/// Bounce 0 replaces `direct`, bounce 1 adds to it (one-bounce direct
/// lighting), deeper bounces add to `indirect`; this split is what the
/// denoiser later filters separately.
fn deposit(
    direct: TexRgba32f,
    indirect: TexRgba32f,
    bounce: u32,
    pos: UVec2,
    radiance: Vec3,
) {
    let radiance = radiance.sanitize();

    unsafe {
        if bounce == 0 {
            direct.write(pos, radiance.extend(0.0));
        } else if bounce == 1 {
            let prev: Vec4 = direct.read(pos);

            direct.write(pos, (prev.xyz() + radiance).extend(prev.w));
        } else {
            let prev: Vec4 = indirect.read(pos);

            indirect.write(pos, (prev.xyz() + radiance).extend(prev.w));
        }
    }
}
