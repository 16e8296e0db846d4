use std::{env, fs};

use spirv_builder::{Capability, MetadataPrintout, SpirvBuilder};

fn main() {
    // HACK spirv-builder normally compiles into the regular `target`
    //      directory, which invalidates the host crates' artifacts whenever
    //      shaders get rebuilt; simulating a nested Cargo invocation makes
    //      spirv-builder pick its own --target-dir and leaves the host
    //      artifacts alone.
    env::set_var("PROFILE", "release");
    env::set_var("OUT_DIR", "../target/spirv/release/build/shader/out");

    let compile_result =
        SpirvBuilder::new("glimt-shaders", "spirv-unknown-spv1.5")
            .print_metadata(MetadataPrintout::None)
            .capability(Capability::Int8)
            .release(true)
            .build()
            .unwrap();

    fs::copy(
        compile_result.module.unwrap_single(),
        "target/glimt-shaders.spv",
    )
    .unwrap();
}
