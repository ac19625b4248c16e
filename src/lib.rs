//! GPU Mandelbrot renderer
//!
//! One Vulkan compute dispatch renders the whole image; the host seeds a
//! 4-byte uniform buffer, waits for completion and encodes the pixel
//! buffer as PNG. The kernel itself lives in the `kernel` crate and is
//! compiled to SPIR-V by the build script.

pub mod error;
pub mod export;
pub mod renderer;
pub mod seed;

pub use error::{RenderError, Result};
pub use renderer::{DeviceContext, Renderer};
pub use shared::RenderConfig;

/// Compiled SPIR-V for the Mandelbrot kernel, produced by the build
/// script.
pub const MANDELBROT_SPIRV: &[u8] = include_bytes!(env!("MANDELBROT_KERNEL_SPV_PATH"));
/// Entry point name inside [`MANDELBROT_SPIRV`].
pub const MANDELBROT_ENTRY: &str = env!("MANDELBROT_KERNEL_SPV_ENTRY");
