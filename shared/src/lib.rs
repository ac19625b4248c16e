//! Types and constants shared between the host and the compute kernel.
#![cfg_attr(not(test), no_std)]

use bytemuck::{Pod, Zeroable};

/// Width of the rendered image in pixels.
pub const WIDTH: u32 = 3200;
/// Height of the rendered image in pixels.
pub const HEIGHT: u32 = 2400;

/// Workgroup size of the compute kernel, per dimension.
/// IMPORTANT: This must be kept in sync with the literal value in
/// kernel/src/lib.rs (`threads(32, 32)`). A mismatch is not detected by
/// the API and silently corrupts dispatch coverage.
pub const WORKGROUP_SIZE: u32 = 32;

/// Escape-iteration cap for the Mandelbrot loop.
pub const MAX_ITERATIONS: u32 = 256;

/// One image cell as the kernel writes it: four packed float channels.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Pixel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Contents of the 4-byte uniform buffer the host rewrites before each
/// dispatch. Read-only on the device.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SeedParams {
    pub seed: u32,
}

#[inline]
pub const fn div_ceil_u32(n: u32, d: u32) -> u32 {
    // Precondition: d > 0
    n / d + ((n % d) != 0) as u32
}

/// Immutable render configuration, passed into pipeline construction
/// instead of living as ambient globals.
///
/// The GPU kernel itself is compiled against [`WIDTH`]/[`HEIGHT`], so the
/// default configuration is the only one a real dispatch may use; other
/// values exist for exercising the dispatch math.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub workgroup_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            workgroup_size: WORKGROUP_SIZE,
        }
    }
}

impl RenderConfig {
    /// 2D workgroup counts covering every pixel: `ceil(dim / workgroup_size)`.
    pub const fn workgroup_counts(&self) -> [u32; 3] {
        [
            div_ceil_u32(self.width, self.workgroup_size),
            div_ceil_u32(self.height, self.workgroup_size),
            1,
        ]
    }

    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the pixel storage buffer in bytes.
    pub const fn pixel_buffer_size(&self) -> u64 {
        self.pixel_count() as u64 * core::mem::size_of::<Pixel>() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_ceil_exact_and_remainder() {
        assert_eq!(div_ceil_u32(3200, 32), 100);
        assert_eq!(div_ceil_u32(2400, 32), 75);
        assert_eq!(div_ceil_u32(33, 32), 2);
        assert_eq!(div_ceil_u32(1, 32), 1);
        assert_eq!(div_ceil_u32(0, 32), 0);
    }

    #[test]
    fn workgroup_counts_cover_every_pixel() {
        let configs = [
            RenderConfig::default(),
            RenderConfig {
                width: 1,
                height: 1,
                workgroup_size: 32,
            },
            RenderConfig {
                width: 1023,
                height: 769,
                workgroup_size: 16,
            },
            RenderConfig {
                width: 33,
                height: 31,
                workgroup_size: 32,
            },
        ];
        for config in configs {
            let [gx, gy, gz] = config.workgroup_counts();
            assert!(gx * config.workgroup_size >= config.width, "{config:?}");
            assert!(gy * config.workgroup_size >= config.height, "{config:?}");
            assert!((gx - 1) * config.workgroup_size < config.width, "{config:?}");
            assert!((gy - 1) * config.workgroup_size < config.height, "{config:?}");
            assert_eq!(gz, 1);
        }
    }

    #[test]
    fn default_config_matches_kernel_constants() {
        let config = RenderConfig::default();
        assert_eq!(config.workgroup_counts(), [100, 75, 1]);
        assert_eq!(config.pixel_count(), 3200 * 2400);
        assert_eq!(config.pixel_buffer_size(), 3200 * 2400 * 16);
    }
}
