use glimt_gpu::prelude::*;

/// Shades the dielectric end of the shared queue: Fresnel-weighted choice
/// between reflection and refraction, Lambert-Beer absorption while inside
/// the medium, and deterministic reflection at (and beyond) the critical
/// angle.
///
/// The interaction is delta-like: no next-event estimation, and the emitted
/// ray is not MIS-eligible, so the next emitter it lands on counts in full.
#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ShadePassParams,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] frame: &FrameParams,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)]
    counters: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 2)]
    triangles: &[Triangle],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 3)]
    materials: &[Material],
    #[spirv(uniform, descriptor_set = 1, binding = 0)] camera: &Camera,
    #[spirv(storage_buffer, descriptor_set = 1, binding = 1)]
    dielectric_glossy_queue: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 2)]
    trace_queue_out: &mut [u32],
    #[spirv(descriptor_set = 1, binding = 3)] albedo_buffer: TexRgba32f,
) {
    let idx = global_id.x;
    let bounce = params.bounce;

    if idx >= read_counter(counters, Counters::dielectric(bounce)) {
        return;
    }

    let ray = MaterialQueueView::new(
        dielectric_glossy_queue,
        frame.batch_size,
    )
    .read(idx);

    let triangle = TrianglesView::new(triangles).get(ray.hit.triangle_id);

    let material =
        MaterialsView::new(materials).get(triangle.material_id());

    let hit_point = triangle.position_at(ray.hit.u, ray.hit.v);
    let pos = ray.pixel.pos(camera.screen_pitch());

    let normal = triangle.normal_at(ray.hit.u, ray.hit.v);

    if normal.length_squared() < 1.0e-12 {
        if bounce == 0 {
            unsafe {
                albedo_buffer.write(pos, Vec4::ONE);
            }
        }

        return;
    }

    let normal = normal.normalize();

    // Entering or leaving the medium decides the index ratio, and leaving
    // pays the absorption for the distance travelled inside
    let entering = ray.direction.dot(normal) < 0.0;

    let facing_normal = if entering { normal } else { -normal };

    let (eta_1, eta_2) = if entering {
        (1.0, material.ior())
    } else {
        (material.ior(), 1.0)
    };

    let mut throughput = ray.throughput;

    if !entering {
        throughput *=
            beer_lambert(material.absorption(), ray.hit.distance);
    }

    let eta = eta_1 / eta_2;
    let cos_incident = (-ray.direction).dot(facing_normal).clamp(0.0, 1.0);
    let k = refraction_k(eta, cos_incident);

    let (direction, transmitted) = if k <= 0.0 {
        // Total internal reflection; k == 0 deliberately lands here so the
        // grazing refraction direction never degenerates
        (ray.direction.reflect(facing_normal), false)
    } else {
        // Schlick against the denser side's angle
        let cos_fresnel = if eta_1 > eta_2 { k.sqrt() } else { cos_incident };
        let reflectance = fresnel_dielectric(eta_1, eta_2, cos_fresnel);

        let mut wnoise = WhiteNoise::from_index(params.seed, idx);

        if wnoise.sample() < reflectance {
            (ray.direction.reflect(facing_normal), false)
        } else {
            (refract(ray.direction, facing_normal, eta, k), true)
        }
    };

    if bounce == 0 {
        unsafe {
            albedo_buffer.write(pos, Vec4::ONE);
        }
    }

    if bounce + 1 >= frame.num_bounces {
        return;
    }

    let origin = if transmitted {
        hit_point - facing_normal * EPSILON
    } else {
        hit_point + facing_normal * EPSILON
    };

    let slot = bump(counters, Counters::trace(bounce + 1));

    TraceQueueView::new(trace_queue_out, frame.batch_size).write(
        slot,
        TraceRay {
            origin,
            direction: direction.normalize(),
            pixel: ray.pixel.with_mis_eligible(false),
            throughput,
            last_pdf: 0.0,
            cone: ray.cone.propagate(ray.hit.distance),
        },
    );
}
