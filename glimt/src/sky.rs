use glam::Vec4;

use crate::{Bindable, Error, SkyDescriptor, StorageBuffer};

/// The equirectangular sky, uploaded as a flat texel array.
#[derive(Debug)]
pub struct Sky {
    buffer: StorageBuffer,
    width: u32,
    height: u32,
}

impl Sky {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sky: &SkyDescriptor,
    ) -> Result<Self, Error> {
        if sky.width == 0
            || sky.height == 0
            || sky.pixels.len() != (sky.width * sky.height) as usize
        {
            return Err(Error::EmptySky);
        }

        let data: Vec<Vec4> =
            sky.pixels.iter().map(|pixel| pixel.extend(0.0)).collect();

        log::info!("Uploading {}x{} sky", sky.width, sky.height);

        Ok(Self {
            buffer: StorageBuffer::new(device, queue, "glimt_sky", &data),
            width: sky.width,
            height: sky.height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.buffer.bind_readable()
    }
}
