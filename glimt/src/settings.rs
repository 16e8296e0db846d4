use crate::gpu;

/// Per-frame renderer options; the controller compares against the previous
/// frame's value and a change resets temporal state.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Path length, `1..=MAX_BOUNCES`.
    pub num_bounces: u32,

    /// Hybrid mode: re-lift the rasterized G-buffer instead of tracing
    /// primary rays.
    pub enable_rasterization: bool,

    pub enable_svgf: bool,
    pub enable_spatial_variance: bool,

    /// Forces Halton jitter and ignores `reconstruction_filter`.
    pub enable_taa: bool,

    /// Re-modulate the final color by the demodulated first-hit albedo.
    pub enable_albedo: bool,

    /// Keep writing the albedo buffer even when SVGF is off.
    pub modulate_albedo: bool,

    pub enable_next_event_estimation: bool,
    pub enable_multiple_importance_sampling: bool,

    pub reconstruction_filter: ReconstructionFilter,

    pub camera_aperture: f32,
    pub camera_focal_distance: f32,

    pub svgf: SvgfSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconstructionFilter {
    Box,
    Gaussian,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SvgfSettings {
    pub atrous_iterations: u32,
    pub phi_luminance: f32,
    pub phi_normal: f32,
    pub phi_depth: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_bounces: 4,
            enable_rasterization: false,
            enable_svgf: false,
            enable_spatial_variance: true,
            enable_taa: false,
            enable_albedo: true,
            modulate_albedo: true,
            enable_next_event_estimation: true,
            enable_multiple_importance_sampling: true,
            reconstruction_filter: ReconstructionFilter::Box,
            camera_aperture: 0.0,
            camera_focal_distance: 10.0,
            svgf: Default::default(),
        }
    }
}

impl Default for SvgfSettings {
    fn default() -> Self {
        Self {
            atrous_iterations: 4,
            phi_luminance: 4.0,
            phi_normal: 128.0,
            phi_depth: 1.0,
        }
    }
}

impl Settings {
    pub(crate) fn serialize_flags(&self) -> u32 {
        let mut flags = 0;

        let mut flag = |condition: bool, bit: u32| {
            if condition {
                flags |= bit;
            }
        };

        flag(self.enable_rasterization, gpu::FLAG_RASTERIZATION);
        flag(self.enable_svgf, gpu::FLAG_SVGF);
        flag(self.enable_spatial_variance, gpu::FLAG_SPATIAL_VARIANCE);
        flag(self.enable_taa, gpu::FLAG_TAA);
        flag(self.enable_albedo, gpu::FLAG_ALBEDO);
        flag(self.modulate_albedo, gpu::FLAG_MODULATE_ALBEDO);
        flag(self.enable_next_event_estimation, gpu::FLAG_NEE);
        flag(
            self.enable_multiple_importance_sampling,
            gpu::FLAG_MIS,
        );
        flag(
            self.reconstruction_filter == ReconstructionFilter::Gaussian,
            gpu::FLAG_FILTER_GAUSSIAN,
        );

        flags
    }

    pub(crate) fn serialize_svgf(&self) -> gpu::SvgfParams {
        gpu::SvgfParams {
            phi_luminance: self.svgf.phi_luminance,
            phi_normal: self.svgf.phi_normal,
            phi_depth: self.svgf.phi_depth,
            _pad: 0.0,
        }
    }

    pub(crate) fn needs_gbuffers(&self) -> bool {
        self.enable_rasterization || self.enable_svgf || self.enable_taa
    }
}

/// The state machine of `frames_since_camera_moved`: a settings change
/// always restarts the sequence; under SVGF the counter is a sample-sequence
/// index and wraps at 256; otherwise it restarts whenever the camera moves
/// and counts accumulated frames.
pub(crate) fn advance_frame_counter(
    frames: u32,
    settings_changed: bool,
    svgf_enabled: bool,
    camera_moved: bool,
) -> u32 {
    if settings_changed {
        0
    } else if svgf_enabled {
        (frames + 1) & 255
    } else if camera_moved {
        0
    } else {
        frames + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_counter_state_machine() {
        // Settings change wins over everything
        assert_eq!(0, advance_frame_counter(10, true, true, false));

        // SVGF wraps at 256
        assert_eq!(11, advance_frame_counter(10, false, true, true));
        assert_eq!(0, advance_frame_counter(255, false, true, false));

        // Plain accumulation restarts on movement
        assert_eq!(0, advance_frame_counter(10, false, false, true));
        assert_eq!(11, advance_frame_counter(10, false, false, false));
    }

    #[test]
    fn flags_round_trip() {
        let mut settings = Settings::default();

        settings.enable_svgf = true;
        settings.enable_taa = true;
        settings.enable_next_event_estimation = false;

        let flags = settings.serialize_flags();

        assert_ne!(0, flags & gpu::FLAG_SVGF);
        assert_ne!(0, flags & gpu::FLAG_TAA);
        assert_eq!(0, flags & gpu::FLAG_NEE);
        assert_ne!(0, flags & gpu::FLAG_MIS);
    }
}
