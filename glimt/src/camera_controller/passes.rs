mod accumulate;
mod generate;
mod primary;
mod shade_dielectric;
mod shade_diffuse;
mod shade_glossy;
mod shadow_trace;
mod sort;
mod svgf_finalize;
mod svgf_reproject;
mod svgf_variance;
mod svgf_wavelet;
mod taa;
mod trace;

use log::debug;

pub use self::accumulate::*;
pub use self::generate::*;
pub use self::primary::*;
pub use self::shade_dielectric::*;
pub use self::shade_diffuse::*;
pub use self::shade_glossy::*;
pub use self::shadow_trace::*;
pub use self::sort::*;
pub use self::svgf_finalize::*;
pub use self::svgf_reproject::*;
pub use self::svgf_variance::*;
pub use self::svgf_wavelet::*;
pub use self::taa::*;
pub use self::trace::*;
use crate::{CameraBuffers, Engine, Settings};

/// How many workgroups the persistent tracers launch; they pull rays through
/// the retired-ray counters until the queue drains, so this is a saturation
/// knob rather than a work size.
pub(crate) const TRACER_WORKGROUPS: u32 = 240;

macro_rules! passes {
    ([ $( $name:ident => $class:ident, )* ]) => {
        #[derive(Debug)]
        pub struct CameraPasses {
            $( pub $name: $class, )*
        }

        impl CameraPasses {
            pub fn new(
                engine: &Engine,
                device: &wgpu::Device,
                settings: &Settings,
                buffers: &CameraBuffers,
            ) -> Self {
                debug!("Initializing camera passes");

                Self {
                    $( $name: $class::new(engine, device, settings, buffers), )*
                }
            }
        }
    };
}

passes!([
    generate => GeneratePass,
    primary => PrimaryPass,
    trace => TracePass,
    sort => SortPass,
    shade_diffuse => ShadeDiffusePass,
    shade_dielectric => ShadeDielectricPass,
    shade_glossy => ShadeGlossyPass,
    shadow_trace => ShadowTracePass,
    svgf_reproject => SvgfReprojectPass,
    svgf_variance => SvgfVariancePass,
    svgf_wavelet => SvgfWaveletPass,
    svgf_finalize => SvgfFinalizePass,
    taa => TaaPass,
    accumulate => AccumulatePass,
]);
