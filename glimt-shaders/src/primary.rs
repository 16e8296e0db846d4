use glimt_gpu::prelude::*;

/// Hybrid-mode bounce 0: re-lifts the rasterized G-buffer into first hits
/// and follows the sort contract directly, skipping the trace dispatch for
/// primary visibility while keeping every later bounce ray traced.
#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &GeneratePassParams,
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
    diffuse_queue: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 2)]
    dielectric_glossy_queue: &mut [u32],
    #[spirv(descriptor_set = 1, binding = 3)] direct: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 4)] albedo: TexRgba32f,
    #[spirv(descriptor_set = 2, binding = 0)] gbuffer_uv: Tex,
    #[spirv(descriptor_set = 2, binding = 1)] gbuffer_triangle_id: Tex,
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

    let pixel = PixelId::from_pos(pos, camera.screen_pitch(), false);

    let ray = camera.ray(pos.as_vec2() + 0.5 + camera.jitter(), Vec2::ZERO);

    let triangle_id = {
        let texel: Vec4 = gbuffer_triangle_id.fetch(pos);

        texel.x.to_bits()
    };

    // Background pixels see the sky, exactly as a traced miss would
    if triangle_id == INVALID_ID {
        let radiance = SkyView::new(sky, frame.sky_width, frame.sky_height)
            .sample(ray.direction())
            .sanitize();

        unsafe {
            direct.write(pos, radiance.extend(0.0));
            albedo.write(pos, Vec4::ONE);
        }

        return;
    }

    let triangle = TrianglesView::new(triangles).get(triangle_id);
    let material = MaterialsView::new(materials).get(triangle.material_id());

    let bary: Vec4 = gbuffer_uv.fetch(pos);

    let hit_point = triangle.position_at(bary.x, bary.y);
    let distance = hit_point.distance(ray.origin());

    if material.is_light() {
        let radiance = material.emission().sanitize();

        unsafe {
            direct.write(pos, radiance.extend(0.0));
            albedo.write(pos, Vec4::ONE);
        }

        return;
    }

    let record = MaterialRay {
        direction: ray.direction(),
        hit: Hit {
            distance,
            u: bary.x,
            v: bary.y,
            triangle_id,
        },
        pixel,
        throughput: Vec3::ONE,
        cone: RayCone {
            angle: camera.cone_angle(),
            width: 0.0,
        },
    };

    match material.kind() {
        MATERIAL_DIELECTRIC => {
            let slot = bump(counters, Counters::dielectric(0));

            MaterialQueueView::new(
                dielectric_glossy_queue,
                frame.batch_size,
            )
            .write(slot, record);
        }
        MATERIAL_GLOSSY => {
            let slot = bump(counters, Counters::glossy(0));

            let mut queue = MaterialQueueView::new(
                dielectric_glossy_queue,
                frame.batch_size,
            );

            let idx = queue.back_idx(slot);

            queue.write(idx, record);
        }
        _ => {
            let slot = bump(counters, Counters::diffuse(0));

            MaterialQueueView::new(diffuse_queue, frame.batch_size)
                .write(slot, record);
        }
    }
}
