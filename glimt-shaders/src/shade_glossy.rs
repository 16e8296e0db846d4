use glimt_gpu::prelude::*;

/// Shades the glossy end of the shared queue: GGX importance sampling with
/// grazing-angle roughness widening, plus NEE + MIS against the microfacet
/// evaluator.
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
    dielectric_glossy_queue: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 2)]
    trace_queue_out: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 3)]
    shadow_queue: &mut [u32],
    #[spirv(descriptor_set = 1, binding = 4)] albedo_buffer: TexRgba32f,
) {
    let idx = global_id.x;
    let bounce = params.bounce;

    if idx >= read_counter(counters, Counters::glossy(bounce)) {
        return;
    }

    let triangles = TrianglesView::new(triangles);
    let materials = MaterialsView::new(materials);
    let lights = LightsView::new(lights);

    let queue = MaterialQueueView::new(
        dielectric_glossy_queue,
        frame.batch_size,
    );

    // Glossy records grow from the queue's back
    let ray = {
        let idx = queue.back_idx(idx);

        queue.read(idx)
    };

    let triangle = triangles.get(ray.hit.triangle_id);
    let material = materials.get(triangle.material_id());

    let hit_point = triangle.position_at(ray.hit.u, ray.hit.v);
    let pos = ray.pixel.pos(camera.screen_pitch());

    let mut normal = triangle.normal_at(ray.hit.u, ray.hit.v);

    if normal.length_squared() < 1.0e-12 {
        terminal_albedo(albedo_buffer, pos, bounce);
        return;
    }

    normal = normal.normalize();

    if normal.dot(ray.direction) > 0.0 {
        normal = -normal;
    }

    let v = -ray.direction;
    let n_dot_v = normal.dot(v).max(1.0e-4);

    let cone = ray
        .cone
        .propagate(ray.hit.distance)
        .widen(triangle.curvature_spread());

    let tint = {
        let lod = cone.lod(
            triangle.lod(),
            normal.dot(ray.direction),
            frame.atlas_lod_bias,
        );

        material.albedo(
            atlas_tex,
            atlas_sampler,
            triangle.uv_at(ray.hit.u, ray.hit.v),
            lod,
        )
    };

    let roughness = material.roughness();
    let alpha = (roughness * roughness).max(1.0e-4);
    let f0 = ((1.0 - material.ior()) / (1.0 + material.ior())).powi(2);

    let mut bnoise = LdsBlueNoise::new(
        blue_noise,
        pos,
        params.frame & 255,
        4 + 8 * bounce,
    );

    // Specular lobes below the cutoff behave like mirrors: NEE can't sample
    // them meaningfully, and their rays are not MIS-eligible
    let mis_eligible = roughness >= GLOSSY_MIS_ROUGHNESS_CUTOFF;

    let brdf_tint = if bounce == 0 { Vec3::ONE } else { tint };

    // Next-event estimation with the microfacet evaluator
    if frame.nee_enabled() && mis_eligible && lights.len() > 0 {
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
            let h = (wi + v).normalize();
            let n_dot_h = normal.dot(h).max(0.0);
            let v_dot_h = v.dot(h).max(0.0);

            let brdf = ggx_d(alpha, n_dot_h)
                * ggx_g(alpha, n_dot_v, cos_hit)
                * schlick(f0, v_dot_h)
                / (4.0 * n_dot_v * cos_hit).max(1.0e-6);

            let pdf_light =
                light_pdf(distance, cos_light, frame.total_light_area);

            let pdf_brdf = ggx_pdf(alpha, n_dot_h, v_dot_h);

            let denominator = if frame.mis_enabled() {
                pdf_light + pdf_brdf
            } else {
                pdf_light
            };

            if denominator > 0.0 {
                let radiance = ray.throughput
                    * light_material.emission()
                    * brdf_tint
                    * (brdf * cos_hit / denominator);

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

    // Importance-sample the next direction: draw a microfacet normal from
    // the (widened) GGX distribution and mirror the view direction across it
    let alpha_wide = ggx_widen_alpha(alpha, n_dot_v);

    let (t, b) = orthonormal_basis(normal);
    let m_local = ggx_sample_microfacet(alpha_wide, bnoise.sample_vec2());
    let m = to_world(t, b, normal, m_local);

    let wi = ray.direction.reflect(m);
    let n_dot_l = normal.dot(wi);

    if n_dot_l <= 0.0 {
        // Sampled below the horizon; the path ends here
        terminal_albedo(albedo_buffer, pos, bounce);
        return;
    }

    let i_dot_m = v.dot(m).max(0.0);
    let n_dot_m = normal.dot(m).max(0.0);

    let weight = ggx_sample_weight(alpha_wide, i_dot_m, n_dot_v, n_dot_l, n_dot_m)
        * schlick(f0, i_dot_m);

    // Bounce 0 folds the full sample weight into the albedo buffer so the
    // extension ray leaves with unit throughput
    let throughput = if bounce == 0 {
        unsafe {
            albedo_buffer.write(pos, (tint * weight).extend(1.0));
        }

        ray.throughput
    } else {
        ray.throughput * tint * weight
    };

    if bounce + 1 >= frame.num_bounces {
        return;
    }

    let slot = bump(counters, Counters::trace(bounce + 1));

    TraceQueueView::new(trace_queue_out, frame.batch_size).write(
        slot,
        TraceRay {
            origin: hit_point + normal * EPSILON,
            direction: wi.normalize(),
            pixel: ray.pixel.with_mis_eligible(mis_eligible),
            throughput,
            last_pdf: ggx_pdf(alpha_wide, n_dot_m, i_dot_m),
            cone,
        },
    );
}

fn terminal_albedo(albedo_buffer: TexRgba32f, pos: UVec2, bounce: u32) {
    if bounce == 0 {
        unsafe {
            albedo_buffer.write(pos, Vec4::ONE);
        }
    }
}
