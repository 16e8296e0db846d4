use glam::UVec2;

use super::{Texture, UnmappedStorageBuffer};
use crate::Bindable;

/// A pair of identical resources flipped by the bind-group `alternate` flag.
///
/// `bind_*` exposes side `a` to bind group A and side `b` to group B; the
/// `_flipped` variants expose the opposite side, which is how a pass reads
/// one half of a ping-pong pair while writing the other.
#[derive(Debug)]
pub struct DoubleBuffered<T> {
    a: T,
    b: T,
}

impl DoubleBuffered<Texture> {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: UVec2,
        format: wgpu::TextureFormat,
    ) -> Self {
        let label = label.as_ref();

        Self {
            a: Texture::new(device, format!("{label}_a"), size, format),
            b: Texture::new(device, format!("{label}_b"), size, format),
        }
    }

    pub fn bind_writable(&self) -> impl Bindable + '_ {
        DoubleBufferedBinder {
            a: self.a.bind_writable(),
            b: self.b.bind_writable(),
        }
    }

    pub fn bind_writable_flipped(&self) -> impl Bindable + '_ {
        DoubleBufferedBinder {
            a: self.b.bind_writable(),
            b: self.a.bind_writable(),
        }
    }

    /// Pins side `a` for both bind-group variants; for passes whose
    /// `alternate` flag is driven by something other than this pair.
    pub fn bind_writable_first(&self) -> impl Bindable + '_ {
        DoubleBufferedBinder {
            a: self.a.bind_writable(),
            b: self.a.bind_writable(),
        }
    }
}

impl DoubleBuffered<UnmappedStorageBuffer> {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
    ) -> Self {
        let label = label.as_ref();

        Self {
            a: UnmappedStorageBuffer::new(device, format!("{label}_a"), size),
            b: UnmappedStorageBuffer::new(device, format!("{label}_b"), size),
        }
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        DoubleBufferedBinder {
            a: self.a.bind_readable(),
            b: self.b.bind_readable(),
        }
    }

    pub fn bind_writable(&self) -> impl Bindable + '_ {
        DoubleBufferedBinder {
            a: self.a.bind_writable(),
            b: self.b.bind_writable(),
        }
    }

    pub fn bind_readable_flipped(&self) -> impl Bindable + '_ {
        DoubleBufferedBinder {
            a: self.b.bind_readable(),
            b: self.a.bind_readable(),
        }
    }

    pub fn bind_writable_flipped(&self) -> impl Bindable + '_ {
        DoubleBufferedBinder {
            a: self.b.bind_writable(),
            b: self.a.bind_writable(),
        }
    }
}

impl<T> DoubleBuffered<T> {
    pub fn each(&self) -> [&T; 2] {
        [&self.a, &self.b]
    }
}

struct DoubleBufferedBinder<B> {
    a: B,
    b: B,
}

impl<B> Bindable for DoubleBufferedBinder<B>
where
    B: Bindable,
{
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let a = self.a.bind(binding);
        let b = self.b.bind(binding);

        a.into_iter()
            .zip(b)
            .map(|((layout, [resource_a, _]), (_, [resource_b, _]))| {
                (layout, [resource_a, resource_b])
            })
            .collect()
    }
}
