pub mod bvh2;
pub mod cwbvh;
pub mod qbvh;

pub use self::bvh2::Bvh2Node;
pub use self::cwbvh::CwBvhNode;
pub use self::qbvh::{quantize_aabb, QbvhNode, QBVH_EMPTY, QBVH_LEAF};

pub const BVH_LAYOUT_BVH2: u32 = 0;
pub const BVH_LAYOUT_QBVH: u32 = 1;
pub const BVH_LAYOUT_CWBVH: u32 = 2;

/// Raw view over the node buffer; the typed traversals below interpret the
/// lanes according to the layout the external builder emitted.
#[derive(Clone, Copy)]
pub struct BvhView<'a> {
    buffer: &'a [glam::Vec4],
}

impl<'a> BvhView<'a> {
    pub fn new(buffer: &'a [glam::Vec4]) -> Self {
        Self { buffer }
    }

    pub fn get(&self, lane: u32) -> glam::Vec4 {
        unsafe { *self.buffer.get_unchecked(lane as usize) }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// Find the minimum-distance intersection.
    Nearest,
    /// Short-circuit on the first intersection; shadow rays only care about
    /// occlusion.
    Any,
}
