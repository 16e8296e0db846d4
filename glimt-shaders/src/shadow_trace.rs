use glimt_gpu::prelude::*;

/// Persistent any-hit tracer over the shadow queue; unoccluded rays deposit
/// their staged radiance, occluded ones contribute nothing. Material queues
/// are never touched here.
#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(workgroup)] stack: BvhStack,
    #[spirv(push_constant)] params: &TracePassParams,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] frame: &FrameParams,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)]
    counters: &mut [u32],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 2)]
    triangles: &[Triangle],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 3)] bvh: &[Vec4],
    #[spirv(uniform, descriptor_set = 1, binding = 0)] camera: &Camera,
    #[spirv(storage_buffer, descriptor_set = 1, binding = 1)]
    shadow_queue: &mut [u32],
    #[spirv(descriptor_set = 1, binding = 2)] direct: TexRgba32f,
    #[spirv(descriptor_set = 1, binding = 3)] indirect: TexRgba32f,
) {
    let triangles = TrianglesView::new(triangles);
    let bvh = BvhView::new(bvh);

    let pending = read_counter(counters, Counters::shadow(params.bounce));

    loop {
        let ray_idx =
            bump(counters, Counters::rays_retired_shadow(params.bounce));

        if ray_idx >= pending {
            return;
        }

        let queue = ShadowQueueView::new(shadow_queue, frame.batch_size);
        let shadow = queue.read(ray_idx);
        let ray = Ray::new(shadow.origin, shadow.direction);

        let occluded = match frame.bvh_layout {
            BVH_LAYOUT_QBVH => qbvh::trace_any(
                ray,
                local_idx,
                triangles,
                bvh,
                stack,
                shadow.max_distance,
            ),
            BVH_LAYOUT_CWBVH => cwbvh::trace_any(
                ray,
                local_idx,
                triangles,
                bvh,
                stack,
                shadow.max_distance,
            ),
            _ => bvh2::trace_any(
                ray,
                local_idx,
                triangles,
                bvh,
                stack,
                shadow.max_distance,
            ),
        };

        if occluded {
            continue;
        }

        let pos = uvec2(
            shadow.pixel_idx % camera.screen_pitch(),
            shadow.pixel_idx / camera.screen_pitch(),
        );

        let radiance = shadow.radiance.sanitize();

        unsafe {
            if params.bounce <= 1 {
                let prev: Vec4 = direct.read(pos);

                direct.write(pos, (prev.xyz() + radiance).extend(prev.w));
            } else {
                let prev: Vec4 = indirect.read(pos);

                indirect.write(pos, (prev.xyz() + radiance).extend(prev.w));
            }
        }
    }
}
