use crate::{gpu, Bindable, BlueNoiseTables, Error, StorageBuffer};

/// The blue-noise sampler's three static tables, concatenated into the one
/// buffer layout `glimt_gpu::LdsBlueNoise` expects.
#[derive(Debug)]
pub struct Noise {
    buffer: StorageBuffer,
}

impl Noise {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        tables: &BlueNoiseTables,
    ) -> Result<Self, Error> {
        let sobol_len = gpu::BLUE_NOISE_SCRAMBLING_TILE as usize;
        let tile_len = (gpu::BLUE_NOISE_RANKING_TILE
            - gpu::BLUE_NOISE_SCRAMBLING_TILE) as usize;

        if tables.sobol.len() != sobol_len
            || tables.scrambling_tile.len() != tile_len
            || tables.ranking_tile.len() != tile_len
        {
            return Err(Error::MalformedBlueNoise);
        }

        let mut data = Vec::with_capacity(gpu::BLUE_NOISE_LEN);

        data.extend_from_slice(&tables.sobol);
        data.extend_from_slice(&tables.scrambling_tile);
        data.extend_from_slice(&tables.ranking_tile);

        Ok(Self {
            buffer: StorageBuffer::new(
                device,
                queue,
                "glimt_blue_noise",
                &data,
            ),
        })
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.buffer.bind_readable()
    }
}
