use std::collections::HashMap;

use glam::{vec4, Vec4};
use guillotiere::{size2, AtlasAllocator};

use crate::{Bindable, Error, ImageData, ImageId};

const ATLAS_SIZE: u32 = 4096;
const ATLAS_MIPS: u32 = 6;

/// Where each albedo texture landed inside the atlas, as the normalized
/// `[offset.xy, scale.zw]` rectangles the packed materials carry.
#[derive(Debug, Default)]
pub struct AtlasLayout {
    rects: HashMap<ImageId, Vec4>,
}

impl AtlasLayout {
    pub fn rect(&self, id: ImageId) -> Vec4 {
        self.rects.get(&id).copied().unwrap_or(Vec4::ZERO)
    }
}

/// All albedo textures packed into one mip-mapped atlas, so a single binding
/// serves every material and trilinear lookups stay a plain `sample_by_lod`.
#[derive(Debug)]
pub struct Images {
    layout: AtlasLayout,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl Images {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        images: &[ImageData],
    ) -> Result<Self, Error> {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glimt_atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: ATLAS_MIPS,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut allocator =
            AtlasAllocator::new(size2(ATLAS_SIZE as i32, ATLAS_SIZE as i32));

        let mut layout = AtlasLayout::default();

        for (idx, image) in images.iter().enumerate() {
            let id = ImageId(idx);

            let allocation = allocator
                .allocate(size2(image.width as i32, image.height as i32))
                .ok_or(Error::AtlasFull(id))?;

            let origin = allocation.rectangle.min;

            upload(queue, &texture, image, origin.x as u32, origin.y as u32);

            layout.rects.insert(
                id,
                vec4(
                    origin.x as f32 / ATLAS_SIZE as f32,
                    origin.y as f32 / ATLAS_SIZE as f32,
                    image.width as f32 / ATLAS_SIZE as f32,
                    image.height as f32 / ATLAS_SIZE as f32,
                ),
            );
        }

        log::info!("Packed {} textures into the atlas", images.len());

        let view = texture.create_view(&Default::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glimt_atlas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            layout,
            _texture: texture,
            view,
            sampler,
        })
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    /// Mip-zero resolution term of the texture LOD formula.
    pub fn lod_bias(&self) -> f32 {
        (ATLAS_SIZE as f32).log2()
    }

    pub fn bind_atlas(&self) -> impl Bindable + '_ {
        AtlasBinder { parent: self }
    }
}

/// Writes an image and its box-filtered mip chain into the atlas region at
/// `(x, y)`.
fn upload(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    image: &ImageData,
    x: u32,
    y: u32,
) {
    let mut level_data = image.data.clone();
    let mut width = image.width;
    let mut height = image.height;

    for mip in 0..ATLAS_MIPS {
        if width == 0 || height == 0 {
            break;
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: mip,
                origin: wgpu::Origin3d {
                    x: x >> mip,
                    y: y >> mip,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &level_data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        level_data = downsample(&level_data, width, height);
        width /= 2;
        height /= 2;
    }
}

/// 2x2 box filter over RGBA8 texels.
fn downsample(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let out_width = (width / 2).max(1) as usize;
    let out_height = (height / 2).max(1) as usize;

    let texel = |x: usize, y: usize, channel: usize| {
        data[(y * width as usize + x) * 4 + channel] as u32
    };

    let mut out = Vec::with_capacity(out_width * out_height * 4);

    for y in 0..out_height {
        for x in 0..out_width {
            for channel in 0..4 {
                let sum = texel(2 * x, 2 * y, channel)
                    + texel((2 * x + 1).min(width as usize - 1), 2 * y, channel)
                    + texel(
                        2 * x,
                        (2 * y + 1).min(height as usize - 1),
                        channel,
                    )
                    + texel(
                        (2 * x + 1).min(width as usize - 1),
                        (2 * y + 1).min(height as usize - 1),
                        channel,
                    );

                out.push((sum / 4) as u8);
            }
        }
    }

    out
}

struct AtlasBinder<'a> {
    parent: &'a Images,
}

impl Bindable for AtlasBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let tex_layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float {
                    filterable: true,
                },
            },
            count: None,
        };

        let sampler_layout = wgpu::BindGroupLayoutEntry {
            binding: binding + 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Sampler(
                wgpu::SamplerBindingType::Filtering,
            ),
            count: None,
        };

        let tex_resource = wgpu::BindingResource::TextureView(&self.parent.view);

        let sampler_resource =
            wgpu::BindingResource::Sampler(&self.parent.sampler);

        vec![
            (tex_layout, [tex_resource.clone(), tex_resource]),
            (sampler_layout, [sampler_resource.clone(), sampler_resource]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsample_averages() {
        // 2x2 gray checkerboard collapses to its mean
        let data = vec![
            0, 0, 0, 255, //
            100, 100, 100, 255, //
            100, 100, 100, 255, //
            0, 0, 0, 255, //
        ];

        let out = downsample(&data, 2, 2);

        assert_eq!(vec![50, 50, 50, 255], out);
    }

    #[test]
    fn missing_rect_is_zero() {
        let layout = AtlasLayout::default();

        assert_eq!(Vec4::ZERO, layout.rect(ImageId(42)));
    }
}
