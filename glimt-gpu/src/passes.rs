use bytemuck::{Pod, Zeroable};

/// Per-frame render parameters shared by every wavefront kernel.
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct FrameParams {
    pub flags: u32,
    pub num_bounces: u32,
    pub bvh_layout: u32,
    pub batch_size: u32,
    pub sky_width: u32,
    pub sky_height: u32,
    pub atlas_lod_bias: f32,
    pub total_light_area: f32,
}

pub const FLAG_RASTERIZATION: u32 = 1;
pub const FLAG_SVGF: u32 = 1 << 1;
pub const FLAG_SPATIAL_VARIANCE: u32 = 1 << 2;
pub const FLAG_TAA: u32 = 1 << 3;
pub const FLAG_ALBEDO: u32 = 1 << 4;
pub const FLAG_MODULATE_ALBEDO: u32 = 1 << 5;
pub const FLAG_NEE: u32 = 1 << 6;
pub const FLAG_MIS: u32 = 1 << 7;
pub const FLAG_FILTER_GAUSSIAN: u32 = 1 << 8;

impl FrameParams {
    fn flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn rasterization_enabled(&self) -> bool {
        self.flag(FLAG_RASTERIZATION)
    }

    pub fn svgf_enabled(&self) -> bool {
        self.flag(FLAG_SVGF)
    }

    pub fn spatial_variance_enabled(&self) -> bool {
        self.flag(FLAG_SPATIAL_VARIANCE)
    }

    pub fn taa_enabled(&self) -> bool {
        self.flag(FLAG_TAA)
    }

    pub fn albedo_enabled(&self) -> bool {
        self.flag(FLAG_ALBEDO)
    }

    pub fn nee_enabled(&self) -> bool {
        self.flag(FLAG_NEE)
    }

    pub fn mis_enabled(&self) -> bool {
        self.flag(FLAG_MIS)
    }

    pub fn gaussian_filter(&self) -> bool {
        self.flag(FLAG_FILTER_GAUSSIAN)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GeneratePassParams {
    pub seed: u32,
    pub frame: u32,
    pub pixel_offset: u32,
    pub pixel_count: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct TracePassParams {
    pub bounce: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct SortPassParams {
    pub seed: u32,
    pub bounce: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ShadePassParams {
    pub seed: u32,
    pub frame: u32,
    pub bounce: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct SvgfAtrousPassParams {
    pub stride: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct AccumulatePassParams {
    /// `frames_since_camera_moved`; zero restarts the online average.
    pub frames: u32,
}
