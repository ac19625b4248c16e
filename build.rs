//! Build script compiling the Mandelbrot kernel to SPIR-V
fn main() {
    use spirv_builder::SpirvBuilder;
    use std::path::PathBuf;

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let kernel_path = PathBuf::from(manifest_dir).join("kernel");

    let result = SpirvBuilder::new(kernel_path, "spirv-unknown-vulkan1.2")
        .scalar_block_layout(true)
        .print_metadata(spirv_builder::MetadataPrintout::Full)
        .build()
        .unwrap();

    // Export the kernel path and entry point for the runtime to embed
    println!(
        "cargo:rustc-env=MANDELBROT_KERNEL_SPV_PATH={}",
        result.module.unwrap_single().display()
    );
    println!(
        "cargo:rustc-env=MANDELBROT_KERNEL_SPV_ENTRY={}",
        result
            .entry_points
            .first()
            .expect("kernel crate exports no entry points")
    );
}
