mod bind_group;
mod double_buffered;
mod mapped_uniform_buffer;
mod storage_buffer;
mod texture;
mod unmapped_storage_buffer;

pub use self::bind_group::*;
pub use self::double_buffered::*;
pub use self::mapped_uniform_buffer::*;
pub use self::storage_buffer::*;
pub use self::texture::*;
pub use self::unmapped_storage_buffer::*;

/// Something that can occupy a binding slot.
///
/// Resources come in pairs so that double-buffered bind groups can be built
/// in one go; plain resources simply repeat themselves on both sides.
pub trait Bindable {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])>;
}

pub(crate) fn pad_size(size: usize) -> usize {
    (size + 31) & !31
}
