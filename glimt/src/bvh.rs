mod cache;

use glam::Vec4;

pub use self::cache::*;
use crate::{gpu, Bindable, StorageBuffer};

/// Node arrays emitted by the external BVH builder, in one of the three
/// on-device layouts. The traversal contract is identical across layouts;
/// only the node encoding differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BvhLayout {
    /// Binary nodes, two lanes each ([`glimt_gpu::Bvh2Node`]).
    Bvh2,

    /// 4-wide quantized nodes ([`glimt_gpu::QbvhNode`]).
    Qbvh,

    /// Compressed 8-wide nodes ([`glimt_gpu::CwBvhNode`]).
    Cwbvh,
}

impl BvhLayout {
    pub(crate) fn serialize(self) -> u32 {
        match self {
            Self::Bvh2 => gpu::BVH_LAYOUT_BVH2,
            Self::Qbvh => gpu::BVH_LAYOUT_QBVH,
            Self::Cwbvh => gpu::BVH_LAYOUT_CWBVH,
        }
    }

    fn deserialize(tag: u32) -> Option<Self> {
        match tag {
            gpu::BVH_LAYOUT_BVH2 => Some(Self::Bvh2),
            gpu::BVH_LAYOUT_QBVH => Some(Self::Qbvh),
            gpu::BVH_LAYOUT_CWBVH => Some(Self::Cwbvh),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BvhData {
    pub layout: BvhLayout,

    /// Node array, flattened to `Vec4` lanes in the layout's encoding.
    pub nodes: Vec<Vec4>,

    /// Permutation mapping leaf-order triangle slots back to the scene's
    /// triangle indices.
    pub indices: Vec<u32>,
}

/// The uploaded BVH.
#[derive(Debug)]
pub struct Bvh {
    buffer: StorageBuffer,
    layout: BvhLayout,
}

impl Bvh {
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &BvhData,
    ) -> Self {
        log::info!(
            "Uploading BVH; layout={:?}, nodes={} lanes",
            data.layout,
            data.nodes.len(),
        );

        Self {
            buffer: StorageBuffer::new(device, queue, "glimt_bvh", &data.nodes),
            layout: data.layout,
        }
    }

    pub(crate) fn layout(&self) -> BvhLayout {
        self.layout
    }

    pub(crate) fn bind_readable(&self) -> impl Bindable + '_ {
        self.buffer.bind_readable()
    }
}
