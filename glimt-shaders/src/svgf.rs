use glimt_gpu::prelude::*;

/// Temporal reprojection: pulls last frame's integrated color and luminance
/// moments through the G-buffer motion, validates them against the current
/// surface, and blends. Also maintains the per-pixel history length.
#[spirv(compute(threads(8, 8)))]
pub fn reproject(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] gbuffer_normal_depth: Tex,
    #[spirv(descriptor_set = 0, binding = 2)] gbuffer_motion: Tex,
    #[spirv(descriptor_set = 0, binding = 3)] gbuffer_depth_gradient: Tex,
    #[spirv(descriptor_set = 1, binding = 0)] direct: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 1)] indirect: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 2)] prev_moments: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 3)] moments: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 4)] history_direct: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 5)] history_indirect: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 6)]
    history_normal_depth: TexRgba32f,
    #[spirv(storage_buffer, descriptor_set = 1, binding = 7)]
    prev_history_length: &[u32],
    #[spirv(storage_buffer, descriptor_set = 1, binding = 8)]
    history_length: &mut [u32],
) {
    let pos = global_id.xy();

    if !camera.contains(pos) {
        return;
    }

    let idx = camera.screen_to_idx(pos) as usize;

    let nd: Vec4 = gbuffer_normal_depth.fetch(pos);
    let (normal, depth) = unpack_normal_depth(nd);

    let cur_direct = {
        let texel: Vec4 = direct.read(pos);

        texel.xyz().sanitize()
    };

    let cur_indirect = {
        let texel: Vec4 = indirect.read(pos);

        texel.xyz().sanitize()
    };

    // Sky pixels carry no surface to accumulate on
    if depth <= 0.0 {
        history_length[idx] = 0;

        unsafe {
            direct.write(pos, cur_direct.extend(0.0));
            indirect.write(pos, cur_indirect.extend(0.0));
            moments.write(pos, Vec4::ZERO);
        }

        return;
    }

    let luma_direct = cur_direct.luminance();
    let luma_indirect = cur_indirect.luminance();

    let cur_moments = vec4(
        luma_direct,
        luma_direct * luma_direct,
        luma_indirect,
        luma_indirect * luma_indirect,
    );

    let prev_pos = {
        let motion: Vec4 = gbuffer_motion.fetch(pos);

        ivec2(
            (motion.x + 0.5) as i32,
            (motion.y + 0.5) as i32,
        )
    };

    let mut valid = camera.contains(prev_pos);

    if valid {
        let prev_nd: Vec4 =
            history_normal_depth.read(prev_pos.as_uvec2());

        let (prev_normal, prev_depth) = unpack_normal_depth(prev_nd);

        let depth_gradient: Vec4 = gbuffer_depth_gradient.fetch(pos);

        valid = reprojection_valid(
            prev_normal,
            normal,
            prev_depth,
            depth,
            depth_gradient.x,
        );
    }

    if valid {
        let prev_pos = prev_pos.as_uvec2();
        let prev_idx = camera.screen_to_idx(prev_pos) as usize;

        let history = advance_history(unsafe {
            *prev_history_length.get_unchecked(prev_idx)
        });

        let alpha = temporal_alpha(history);

        let prev_direct: Vec4 = history_direct.read(prev_pos);
        let prev_indirect: Vec4 = history_indirect.read(prev_pos);
        let prev_m: Vec4 = prev_moments.read(prev_pos);

        let out_direct = prev_direct.xyz().lerp(cur_direct, alpha);
        let out_indirect = prev_indirect.xyz().lerp(cur_indirect, alpha);
        let out_moments = prev_m.lerp(cur_moments, alpha);

        let var_direct =
            (out_moments.y - out_moments.x * out_moments.x).max(0.0);

        let var_indirect =
            (out_moments.w - out_moments.z * out_moments.z).max(0.0);

        history_length[idx] = history;

        unsafe {
            direct.write(pos, out_direct.extend(var_direct));
            indirect.write(pos, out_indirect.extend(var_indirect));
            moments.write(pos, out_moments);
        }
    } else {
        history_length[idx] = 1;

        unsafe {
            direct.write(pos, cur_direct.extend(0.0));
            indirect.write(pos, cur_indirect.extend(0.0));
            moments.write(pos, cur_moments);
        }
    }
}

/// Variance for the first wavelet iteration: straight from the integrated
/// moments once the history is long enough, otherwise (when enabled) a 7x7
/// edge-aware spatial estimate over luminance.
#[spirv(compute(threads(8, 8)))]
pub fn estimate_variance(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] camera: &Camera,
    #[spirv(uniform, descriptor_set = 0, binding = 1)] frame: &FrameParams,
    #[spirv(descriptor_set = 0, binding = 2)] gbuffer_normal_depth: Tex,
    #[spirv(storage_buffer, descriptor_set = 1, binding = 0)]
    history_length: &[u32],
    #[spirv(descriptor_set = 1, binding = 1)] direct_in: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 2)] indirect_in: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 3)] direct_out: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 4)] indirect_out: TexRgba32f,
) {
    let pos = global_id.xy();

    if !camera.contains(pos) {
        return;
    }

    let idx = camera.screen_to_idx(pos) as usize;
    let history = unsafe { *history_length.get_unchecked(idx) };

    let center_direct: Vec4 = direct_in.read(pos);
    let center_indirect: Vec4 = indirect_in.read(pos);

    let spatial = frame.spatial_variance_enabled()
        && history < SVGF_SPATIAL_VARIANCE_THRESHOLD;

    if !spatial {
        unsafe {
            direct_out.write(pos, center_direct);
            indirect_out.write(pos, center_indirect);
        }

        return;
    }

    let (center_normal, center_depth) =
        unpack_normal_depth(gbuffer_normal_depth.fetch(pos));

    let mut sum_direct = Vec3::ZERO;
    let mut sum_indirect = Vec3::ZERO;

    let mut offset = ivec2(-3, -3);

    loop {
        let sample_pos = pos.as_ivec2() + offset;

        if camera.contains(sample_pos) {
            let sample_pos = sample_pos.as_uvec2();

            let (sample_normal, sample_depth) =
                unpack_normal_depth(gbuffer_normal_depth.fetch(sample_pos));

            if sample_depth > 0.0 {
                let weight = edge_stop_normal(center_normal, sample_normal, 32.0)
                    * edge_stop_depth(
                        center_depth,
                        sample_depth,
                        0.1 * center_depth,
                    );

                let luma_direct = {
                    let texel: Vec4 = direct_in.read(sample_pos);

                    texel.xyz().luminance()
                };

                let luma_indirect = {
                    let texel: Vec4 = indirect_in.read(sample_pos);

                    texel.xyz().luminance()
                };

                sum_direct += vec3(
                    luma_direct,
                    luma_direct * luma_direct,
                    1.0,
                ) * weight;

                sum_indirect += vec3(
                    luma_indirect,
                    luma_indirect * luma_indirect,
                    1.0,
                ) * weight;
            }
        }

        offset.x += 1;

        if offset.x == 4 {
            offset.x = -3;
            offset.y += 1;

            if offset.y == 4 {
                break;
            }
        }
    }

    let var_direct = {
        let m1 = sum_direct.x / sum_direct.z.max(1.0e-6);
        let m2 = sum_direct.y / sum_direct.z.max(1.0e-6);

        (m2 - m1 * m1).abs() * 4.0
    };

    let var_indirect = {
        let m1 = sum_indirect.x / sum_indirect.z.max(1.0e-6);
        let m2 = sum_indirect.y / sum_indirect.z.max(1.0e-6);

        (m2 - m1 * m1).abs() * 4.0
    };

    unsafe {
        direct_out.write(pos, center_direct.xyz().extend(var_direct));

        indirect_out.write(pos, center_indirect.xyz().extend(var_indirect));
    }
}

/// One À-trous wavelet iteration: a 5x5 B3-spline kernel with taps spread by
/// the current stride, attenuated by luminance, normal and depth edge stops;
/// variance rides in the alpha channel and is filtered with squared weights.
#[spirv(compute(threads(8, 8)))]
pub fn wavelet(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &SvgfAtrousPassParams,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] camera: &Camera,
    #[spirv(uniform, descriptor_set = 0, binding = 1)] svgf: &SvgfParams,
    #[spirv(descriptor_set = 0, binding = 2)] gbuffer_normal_depth: Tex,
    #[spirv(descriptor_set = 1, binding = 0)] direct_in: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 1)] direct_out: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 2)] indirect_in: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 3)] indirect_out: TexRgba32f,
) {
    let pos = global_id.xy();

    if !camera.contains(pos) {
        return;
    }

    let (center_normal, center_depth) =
        unpack_normal_depth(gbuffer_normal_depth.fetch(pos));

    let center_direct: Vec4 = direct_in.read(pos);
    let center_indirect: Vec4 = indirect_in.read(pos);

    if center_depth <= 0.0 {
        unsafe {
            direct_out.write(pos, center_direct);
            indirect_out.write(pos, center_indirect);
        }

        return;
    }

    let center_luma_direct = center_direct.xyz().luminance();
    let center_luma_indirect = center_indirect.xyz().luminance();

    let sigma_direct =
        svgf.phi_luminance * center_direct.w.max(0.0).sqrt() + 1.0e-4;

    let sigma_indirect =
        svgf.phi_luminance * center_indirect.w.max(0.0).sqrt() + 1.0e-4;

    let mut sum_direct = center_direct.xyz();
    let mut sum_direct_var = center_direct.w;
    let mut sum_direct_weight = 1.0;

    let mut sum_indirect = center_indirect.xyz();
    let mut sum_indirect_var = center_indirect.w;
    let mut sum_indirect_weight = 1.0;

    let stride = params.stride as i32;
    let mut offset = ivec2(-2, -2);

    loop {
        let sample_pos = pos.as_ivec2() + offset * stride;

        if offset != ivec2(0, 0) && camera.contains(sample_pos) {
            let sample_pos = sample_pos.as_uvec2();

            let (sample_normal, sample_depth) =
                unpack_normal_depth(gbuffer_normal_depth.fetch(sample_pos));

            if sample_depth > 0.0 {
                let kernel = atrous_kernel(offset);

                let edge_weight = edge_stop_normal(
                    center_normal,
                    sample_normal,
                    svgf.phi_normal,
                ) * edge_stop_depth(
                    center_depth,
                    sample_depth,
                    svgf.phi_depth * (stride as f32) * center_depth * 0.01
                        + 1.0e-4,
                );

                let sample_direct: Vec4 =
                    direct_in.read(sample_pos);

                let weight_direct = kernel
                    * edge_weight
                    * edge_stop_luminance(
                        center_luma_direct,
                        sample_direct.xyz().luminance(),
                        sigma_direct,
                    );

                sum_direct += sample_direct.xyz() * weight_direct;
                sum_direct_var +=
                    sample_direct.w * weight_direct * weight_direct;
                sum_direct_weight += weight_direct;

                let sample_indirect: Vec4 =
                    indirect_in.read(sample_pos);

                let weight_indirect = kernel
                    * edge_weight
                    * edge_stop_luminance(
                        center_luma_indirect,
                        sample_indirect.xyz().luminance(),
                        sigma_indirect,
                    );

                sum_indirect += sample_indirect.xyz() * weight_indirect;
                sum_indirect_var +=
                    sample_indirect.w * weight_indirect * weight_indirect;
                sum_indirect_weight += weight_indirect;
            }
        }

        offset.x += 1;

        if offset.x == 3 {
            offset.x = -2;
            offset.y += 1;

            if offset.y == 3 {
                break;
            }
        }
    }

    unsafe {
        direct_out.write(
            pos,
            (sum_direct / sum_direct_weight)
                .extend(sum_direct_var / (sum_direct_weight * sum_direct_weight)),
        );

        indirect_out.write(
            pos,
            (sum_indirect / sum_indirect_weight).extend(
                sum_indirect_var
                    / (sum_indirect_weight * sum_indirect_weight),
            ),
        );
    }
}

/// Recombines the filtered direct and indirect fields, optionally
/// re-modulates the demodulated albedo, records this frame's surfaces and
/// colors as next frame's history, and writes the output surface.
#[spirv(compute(threads(8, 8)))]
pub fn finalize(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] camera: &Camera,
    #[spirv(uniform, descriptor_set = 0, binding = 1)] frame: &FrameParams,
    #[spirv(descriptor_set = 0, binding = 2)] gbuffer_normal_depth: Tex,
    #[spirv(descriptor_set = 1, binding = 0)] direct_in: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 1)] indirect_in: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 2)] albedo: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 3)] history_direct: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 4)] history_indirect: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 5)]
    history_normal_depth: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 6)] output: TexRgba32f,
) {
    let pos = global_id.xy();

    if !camera.contains(pos) {
        return;
    }

    let direct: Vec4 = direct_in.read(pos);
    let indirect: Vec4 = indirect_in.read(pos);

    let mut color = direct.xyz() + indirect.xyz();

    if frame.albedo_enabled() {
        let albedo: Vec4 = albedo.read(pos);

        color *= albedo.xyz();
    }

    let nd: Vec4 = gbuffer_normal_depth.fetch(pos);

    unsafe {
        history_direct.write(pos, direct);
        history_indirect.write(pos, indirect);
        history_normal_depth.write(pos, nd);
        output.write(pos, color.sanitize().extend(1.0));
    }
}
