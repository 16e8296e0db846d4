use glimt_gpu::prelude::*;

/// Persistent closest-hit tracer: a fixed grid of workgroups pulls pending
/// extension rays through the retired-ray counter until the queue drains,
/// which load-balances traversal cost across the whole device.
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
    #[spirv(storage_buffer, descriptor_set = 1, binding = 0)]
    trace_queue: &mut [u32],
) {
    let triangles = TrianglesView::new(triangles);
    let bvh = BvhView::new(bvh);

    let pending = read_counter(counters, Counters::trace(params.bounce));

    loop {
        let ray_idx =
            bump(counters, Counters::rays_retired(params.bounce));

        if ray_idx >= pending {
            return;
        }

        let mut queue = TraceQueueView::new(trace_queue, frame.batch_size);
        let (origin, direction) = queue.read_for_trace(ray_idx);
        let ray = Ray::new(origin, direction);

        let hit = match frame.bvh_layout {
            BVH_LAYOUT_QBVH => {
                qbvh::trace_nearest(ray, local_idx, triangles, bvh, stack)
            }
            BVH_LAYOUT_CWBVH => {
                cwbvh::trace_nearest(ray, local_idx, triangles, bvh, stack)
            }
            _ => bvh2::trace_nearest(ray, local_idx, triangles, bvh, stack),
        };

        queue.write_hit(ray_idx, hit);
    }
}
