use glam::UVec2;

use crate::Bindable;

/// A 2D texture plus its default view; frame buffers bind it as a
/// read-write storage texture, the atlas and G-buffers as sampled textures.
#[derive(Debug)]
pub struct Texture {
    tex: wgpu::Texture,
    tex_view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

impl Texture {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: UVec2,
        format: wgpu::TextureFormat,
    ) -> Self {
        let label = label.as_ref();

        log::debug!("Allocating texture `{label}`; size={size:?}");

        assert!(size.x > 0);
        assert!(size.y > 0);

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let tex_view = tex.create_view(&Default::default());

        Self {
            tex,
            tex_view,
            format,
        }
    }

    pub fn tex(&self) -> &wgpu::Texture {
        &self.tex
    }

    /// Binds as a sampled texture; shaders read it through `fetch()`.
    pub fn bind_sampled(&self) -> impl Bindable + '_ {
        SampledTextureBinder {
            view: &self.tex_view,
            filterable: false,
        }
    }

    /// Binds as a read-write storage texture.
    pub fn bind_writable(&self) -> impl Bindable + '_ {
        StorageTextureBinder {
            view: &self.tex_view,
            format: self.format,
        }
    }
}

pub struct SampledTextureBinder<'a> {
    pub(crate) view: &'a wgpu::TextureView,
    pub(crate) filterable: bool,
}

impl Bindable for SampledTextureBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float {
                    filterable: self.filterable,
                },
            },
            count: None,
        };

        let resource = wgpu::BindingResource::TextureView(self.view);

        vec![(layout, [resource.clone(), resource])]
    }
}

pub struct StorageTextureBinder<'a> {
    pub(crate) view: &'a wgpu::TextureView,
    pub(crate) format: wgpu::TextureFormat,
}

impl Bindable for StorageTextureBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::ReadWrite,
                format: self.format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        };

        let resource = wgpu::BindingResource::TextureView(self.view);

        vec![(layout, [resource.clone(), resource])]
    }
}

/// Binds a caller-owned texture view (the output surface, the G-buffers) the
/// same way [`Texture`] binds its own.
pub struct ExternalTexture<'a> {
    view: &'a wgpu::TextureView,
}

impl<'a> ExternalTexture<'a> {
    pub fn new(view: &'a wgpu::TextureView) -> Self {
        Self { view }
    }

    pub fn bind_sampled(self) -> SampledTextureBinder<'a> {
        SampledTextureBinder {
            view: self.view,
            filterable: false,
        }
    }

    pub fn bind_writable(
        self,
        format: wgpu::TextureFormat,
    ) -> StorageTextureBinder<'a> {
        StorageTextureBinder {
            view: self.view,
            format,
        }
    }
}
