use glam::{Vec2, Vec3};

/// Geometry, materials and textures, as handed over by the external asset
/// loader; everything here is immutable after [`crate::Engine::new()`].
#[derive(Clone, Debug)]
pub struct SceneDescriptor {
    /// Triangles in the loader's order; the BVH's index array permutes them
    /// into leaf order at upload.
    pub triangles: Vec<MeshTriangle>,
    pub materials: Vec<SceneMaterial>,
    pub images: Vec<ImageData>,
}

#[derive(Clone, Copy, Debug)]
pub struct MeshTriangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uvs: [Vec2; 3],
    pub material_id: u32,
}

/// The four material kinds the pipeline shades; one queue per kind (with
/// lights terminating paths in the sort stage instead).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneMaterial {
    Diffuse {
        tint: Vec3,
        texture: Option<ImageId>,
    },

    Dielectric {
        index_of_refraction: f32,
        absorption: Vec3,
    },

    Glossy {
        tint: Vec3,
        texture: Option<ImageId>,
        roughness: f32,
        index_of_refraction: f32,
    },

    Light {
        emission: Vec3,
    },
}

impl SceneMaterial {
    pub fn is_light(&self) -> bool {
        matches!(self, Self::Light { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

/// RGBA8 texel data for the albedo atlas.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Equirectangular float3 sky image.
#[derive(Clone, Debug)]
pub struct SkyDescriptor {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl SkyDescriptor {
    /// A constant-color sky; handy for tests and empty scenes.
    pub fn uniform(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }
}

/// The three static tables of the blue-noise sampler.
#[derive(Clone, Debug)]
pub struct BlueNoiseTables {
    pub sobol: Vec<u32>,
    pub scrambling_tile: Vec<u32>,
    pub ranking_tile: Vec<u32>,
}

/// Views over the externally rasterized G-buffers, consumed read-only.
///
/// All of them are `Rgba32Float`, point-sampled:
/// - `normal_depth`: octahedral normal in `xy`, view depth in `z`
///   (zero marks background),
/// - `uv`: barycentric coordinates of the hit in `xy`,
/// - `uv_gradient`: screen-space barycentric gradients (`d/dx` in `xy`,
///   `d/dy` in `zw`),
/// - `triangle_id`: triangle id bits in `x`, `u32::MAX` for background,
/// - `motion`: previous-frame pixel position in `xy`,
/// - `depth_gradient`: screen-space depth gradient magnitude in `x`.
#[derive(Debug)]
pub struct GBufferViews {
    pub normal_depth: wgpu::TextureView,
    pub uv: wgpu::TextureView,
    pub uv_gradient: wgpu::TextureView,
    pub triangle_id: wgpu::TextureView,
    pub motion: wgpu::TextureView,
    pub depth_gradient: wgpu::TextureView,
}
