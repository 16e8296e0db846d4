use glimt_gpu::prelude::*;

/// Shades the diffuse queue: cosine-weighted bounce, albedo lookup through
/// the ray cone, and next-event estimation with MIS.
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
    #[spirv(storage_buffer, descriptor_set = 0, binding = 4)] lights: &[u32],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 5)]
    blue_noise: &[u32],
    #[spirv(descriptor_set = 0, binding = 6)] atlas_tex: Tex,
    #[spirv(descriptor_set = 0, binding = 7)] atlas_sampler: &Sampler,
    #[spirv(uniform, descriptor_set = 1, binding = 0)] camera: &Camera,
    #[spirv(storage_buffer, descriptor_set = 1, binding = 1)]
    diffuse_queue: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 2)]
    trace_queue_out: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 3)]
    shadow_queue: &mut [u32],
    #[spirv(descriptor_set = 1, binding = 4)] albedo_buffer: TexRgba32f,
    #[spirv(descriptor_set = 2, binding = 0)] gbuffer_uv_gradient: Tex,
) {
    let idx = global_id.x;
    let bounce = params.bounce;

    if idx >= read_counter(counters, Counters::diffuse(bounce)) {
        return;
    }

    let triangles = TrianglesView::new(triangles);
    let materials = MaterialsView::new(materials);
    let lights = LightsView::new(lights);

    let ray =
        MaterialQueueView::new(diffuse_queue, frame.batch_size).read(idx);

    let triangle = triangles.get(ray.hit.triangle_id);
    let material = materials.get(triangle.material_id());

    let hit_point = triangle.position_at(ray.hit.u, ray.hit.v);
    let pos = ray.pixel.pos(camera.screen_pitch());

    // Degenerate shading frames end the path at this vertex
    let mut normal = triangle.normal_at(ray.hit.u, ray.hit.v);

    if normal.length_squared() < 1.0e-12 {
        if bounce == 0 {
            unsafe {
                albedo_buffer.write(pos, Vec4::ONE);
            }
        }

        return;
    }

    normal = normal.normalize();

    if normal.dot(ray.direction) > 0.0 {
        normal = -normal;
    }

    let cone = ray
        .cone
        .propagate(ray.hit.distance)
        .widen(triangle.curvature_spread());

    let n_dot_d = normal.dot(ray.direction);

    let albedo = if bounce == 0 && frame.rasterization_enabled() {
        // The rasterizer already measured the screen-space barycentric
        // gradients; push them through the triangle's parameterization
        let grad: Vec4 = gbuffer_uv_gradient.fetch(pos);
        let uv0 = triangle.uv_at(0.0, 0.0);

        material.albedo_grad(
            atlas_tex,
            atlas_sampler,
            triangle.uv_at(ray.hit.u, ray.hit.v),
            triangle.uv_at(grad.x, grad.y) - uv0,
            triangle.uv_at(grad.z, grad.w) - uv0,
        )
    } else if bounce == 0 {
        // The cone's footprint on the surface, pushed through the triangle's
        // parameterization, gives the anisotropic sampling ellipse
        let (axis_a, axis_b) = cone_footprint(ray.direction, normal, &cone);

        material.albedo_grad(
            atlas_tex,
            atlas_sampler,
            triangle.uv_at(ray.hit.u, ray.hit.v),
            triangle.uv_delta(axis_a),
            triangle.uv_delta(axis_b),
        )
    } else {
        let lod = cone.lod(triangle.lod(), n_dot_d, frame.atlas_lod_bias);

        material.albedo(
            atlas_tex,
            atlas_sampler,
            triangle.uv_at(ray.hit.u, ray.hit.v),
            lod,
        )
    };

    // At bounce 0 the albedo is demodulated into its own buffer and
    // re-applied after reconstruction; color weights enter the throughput
    // from bounce 1 on.
    let brdf_tint = if bounce == 0 {
        unsafe {
            albedo_buffer.write(pos, albedo.extend(1.0));
        }

        Vec3::ONE
    } else {
        albedo
    };

    let mut bnoise = LdsBlueNoise::new(
        blue_noise,
        pos,
        params.frame & 255,
        4 + 8 * bounce,
    );

    // Next-event estimation
    if frame.nee_enabled() && lights.len() > 0 {
        let light_triangle = triangles.get(lights.pick(bnoise.sample()));
        let light_material = materials.get(light_triangle.material_id());

        let bary = LightsView::sample_barycentric(bnoise.sample_vec2());
        let light_point = light_triangle.position_at(bary.x, bary.y);
        let light_normal = light_triangle.geometric_normal().normalize();

        let to_light = light_point - hit_point;
        let distance = to_light.length();
        let wi = to_light / distance;

        let cos_hit = normal.dot(wi);
        let cos_light = (-wi).dot(light_normal).abs();

        if cos_hit > 0.0 && cos_light > 0.0 && distance > EPSILON {
            let pdf_light =
                light_pdf(distance, cos_light, frame.total_light_area);

            let pdf_brdf = diffuse_pdf(cos_hit);

            // With the balance heuristic the weighted estimator collapses to
            // f * cos / (pdf_light + pdf_brdf)
            let denominator = if frame.mis_enabled() {
                pdf_light + pdf_brdf
            } else {
                pdf_light
            };

            if denominator > 0.0 {
                let radiance = ray.throughput
                    * light_material.emission()
                    * brdf_tint
                    * (core::f32::consts::FRAC_1_PI * cos_hit / denominator);

                let slot = bump(counters, Counters::shadow(bounce));

                ShadowQueueView::new(shadow_queue, frame.batch_size).write(
                    slot,
                    ShadowRay {
                        origin: hit_point + normal * EPSILON,
                        direction: wi,
                        max_distance: distance - EPSILON,
                        pixel_idx: ray.pixel.idx(),
                        radiance,
                    },
                );
            }
        }
    }

    // Extension ray for the next bounce
    if bounce + 1 >= frame.num_bounces {
        return;
    }

    let wi = sample_hemisphere_cosine(normal, bnoise.sample_vec2());
    let cos_theta = normal.dot(wi).max(0.0);

    if cos_theta <= 0.0 {
        return;
    }

    let slot = bump(counters, Counters::trace(bounce + 1));

    TraceQueueView::new(trace_queue_out, frame.batch_size).write(
        slot,
        TraceRay {
            origin: hit_point + normal * EPSILON,
            direction: wi,
            pixel: ray.pixel.with_mis_eligible(true),
            throughput: ray.throughput * brdf_tint,
            last_pdf: diffuse_pdf(cos_theta),
            cone,
        },
    );
}

/// Two world-space axes of the cone's elliptical footprint on the surface:
/// one stretched along the projected view direction by the grazing factor,
/// one perpendicular to it.
fn cone_footprint(
    direction: Vec3,
    normal: Vec3,
    cone: &RayCone,
) -> (Vec3, Vec3) {
    let n_dot_d = normal.dot(direction).abs().max(1.0e-4);

    let major_dir = direction - normal * normal.dot(direction);

    let major = if major_dir.length_squared() > 1.0e-8 {
        major_dir.normalize() * (cone.width / n_dot_d)
    } else {
        // Head-on view; the footprint is a disc
        let (t, _) = orthonormal_basis(normal);

        t * cone.width
    };

    let minor = normal.cross(major).normalize_or_zero() * cone.width;

    (major, minor)
}
