use std::fs;
use std::path::PathBuf;

use crate::Error;

/// The compiled shader module; `glimt-shader-builder` links every kernel
/// into one SPIR-V module and the entry-point name selects the pipeline.
#[derive(Debug)]
pub struct Shaders {
    module: wgpu::ShaderModule,
}

pub type Shader<'a> = (&'a wgpu::ShaderModule, &'static str);

fn module_path() -> PathBuf {
    PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../target/glimt-shaders.spv",
    ))
}

macro_rules! shaders {
    ([ $( $name:ident => $entry:literal, )* ]) => {
        impl Shaders {
            /// Loads the module `glimt-shader-builder` produced.
            pub fn new(device: &wgpu::Device) -> Result<Self, Error> {
                let path = module_path();

                let bytes = fs::read(&path)
                    .map_err(|_| Error::MissingShaders(path))?;

                let module =
                    device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some("glimt_shaders"),
                        source: wgpu::util::make_spirv(&bytes),
                    });

                Ok(Self { module })
            }

            $(
                pub fn $name(&self) -> Shader {
                    (&self.module, $entry)
                }
            )*
        }
    };
}

shaders!([
    generate => "generate::main",
    primary => "primary::main",
    trace => "trace::main",
    sort => "sort::main",
    shade_diffuse => "shade_diffuse::main",
    shade_dielectric => "shade_dielectric::main",
    shade_glossy => "shade_glossy::main",
    shadow_trace => "shadow_trace::main",
    svgf_reproject => "svgf::reproject",
    svgf_variance => "svgf::estimate_variance",
    svgf_wavelet => "svgf::wavelet",
    svgf_finalize => "svgf::finalize",
    taa_resolve => "taa::resolve",
    taa_promote => "taa::promote",
    accumulate => "accumulate::main",
]);
