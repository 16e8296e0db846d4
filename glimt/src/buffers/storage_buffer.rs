use std::any;

use bytemuck::Pod;

use super::pad_size;
use crate::Bindable;

/// Read-only storage buffer for scene data; uploaded once at init and
/// immutable afterwards.
#[derive(Debug)]
pub struct StorageBuffer {
    buffer: wgpu::Buffer,
}

impl StorageBuffer {
    pub fn new<T>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: impl AsRef<str>,
        data: &[T],
    ) -> Self
    where
        T: Pod,
    {
        let label = label.as_ref();
        let bytes = bytemuck::cast_slice(data);
        let size = pad_size(bytes.len());

        log::debug!(
            "Allocating storage buffer `{label}`; ty={}, size={size}",
            any::type_name::<T>(),
        );

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::STORAGE,
            size: size as _,
            mapped_at_creation: false,
        });

        queue.write_buffer(&buffer, 0, bytes);

        Self { buffer }
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        StorageBufferBinder { parent: self }
    }
}

pub struct StorageBufferBinder<'a> {
    parent: &'a StorageBuffer,
}

impl Bindable for StorageBufferBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                // TODO should say `read_only: true`, but rust-gpu is not
                //      able to emit the matching attribute yet, causing naga
                //      to reject the shader later
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let resource = self.parent.buffer.as_entire_binding();

        vec![(layout, [resource.clone(), resource])]
    }
}
