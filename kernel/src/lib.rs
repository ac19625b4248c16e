//! Mandelbrot escape-time compute kernel.
//!
//! The iteration math is plain Rust so the same code runs on SPIR-V and on
//! the CPU in tests; only the entry point at the bottom is GPU-specific.

#![cfg_attr(target_arch = "spirv", no_std)]

use shared::Pixel;
#[cfg(target_arch = "spirv")]
use shared::{SeedParams, HEIGHT, MAX_ITERATIONS, WIDTH};

#[cfg(target_arch = "spirv")]
use spirv_std::{glam::UVec3, spirv};

/// Center of the rendered window on the complex plane.
const CENTER_RE: f32 = -0.445;
const CENTER_IM: f32 = 0.0;
/// Vertical extent of the window; horizontal extent is aspect-corrected.
const VIEW_SCALE: f32 = 2.34;

/// Maps a pixel to its sample point `c` on the complex plane.
#[inline]
pub fn pixel_coordinate(x: u32, y: u32, width: u32, height: u32) -> (f32, f32) {
    let u = (x as f32 + 0.5) / width as f32 - 0.5;
    let v = (y as f32 + 0.5) / height as f32 - 0.5;
    let aspect = width as f32 / height as f32;
    (CENTER_RE + u * VIEW_SCALE * aspect, CENTER_IM + v * VIEW_SCALE)
}

/// Iterates z <- z^2 + c from z = 0 and returns the iteration count at
/// which |z|^2 exceeded 4, or `max_iterations` if it never did.
#[inline]
pub fn escape_iterations(cr: f32, ci: f32, max_iterations: u32) -> u32 {
    let mut zr = 0.0f32;
    let mut zi = 0.0f32;
    let mut n = 0u32;
    while n < max_iterations {
        let zr2 = zr * zr;
        let zi2 = zi * zi;
        if zr2 + zi2 > 4.0 {
            break;
        }
        zi = 2.0 * zr * zi + ci;
        zr = zr2 - zi2 + cr;
        n += 1;
    }
    n
}

/// Wang-style integer hash; decorrelates consecutive clock-derived seeds.
#[inline]
pub fn hash_seed(mut seed: u32) -> u32 {
    seed = (seed ^ 61) ^ (seed >> 16);
    seed = seed.wrapping_mul(9);
    seed ^= seed >> 4;
    seed = seed.wrapping_mul(0x27d4_eb2d);
    seed ^ (seed >> 15)
}

// Fractional part for x in [0, 2); enough for the palette phase and cheaper
// than pulling in libm on the SPIR-V side.
#[inline]
fn fract(x: f32) -> f32 {
    x - (x as i32 as f32)
}

#[inline]
fn clamp01(v: f32) -> f32 {
    if v < 0.0 {
        0.0
    } else if v > 1.0 {
        1.0
    } else {
        v
    }
}

/// Colors an escape count. Interior points are black; escaped points get a
/// polynomial palette whose phase is shifted per run by the hashed seed.
#[inline]
pub fn shade(n: u32, max_iterations: u32, seed: u32) -> Pixel {
    if n >= max_iterations {
        return Pixel {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        };
    }
    let phase = (hash_seed(seed) & 0xff) as f32 / 256.0;
    let t = fract(n as f32 / max_iterations as f32 + phase);
    let u = 1.0 - t;
    Pixel {
        r: clamp01(9.0 * u * t * t * t),
        g: clamp01(15.0 * u * u * t * t),
        b: clamp01(8.5 * u * u * u * t),
        a: 1.0,
    }
}

/// GPU entry point. Local size must stay in sync with
/// `shared::WORKGROUP_SIZE`.
#[cfg(target_arch = "spirv")]
#[spirv(compute(threads(32, 32)))]
pub fn mandelbrot_kernel(
    #[spirv(global_invocation_id)] gid: UVec3,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 0)] pixels: &mut [Pixel],
    #[spirv(uniform, descriptor_set = 0, binding = 1)] params: &SeedParams,
) {
    // The dispatch rounds up to whole workgroups; edge invocations fall
    // outside the image and must not write.
    if gid.x >= WIDTH || gid.y >= HEIGHT {
        return;
    }
    let (cr, ci) = pixel_coordinate(gid.x, gid.y, WIDTH, HEIGHT);
    let n = escape_iterations(cr, ci, MAX_ITERATIONS);
    let index = (gid.y * WIDTH + gid.x) as usize;
    pixels[index] = shade(n, MAX_ITERATIONS, params.seed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{HEIGHT, MAX_ITERATIONS, WIDTH};

    #[test]
    fn interior_point_never_escapes() {
        // The origin is inside the main cardioid.
        assert_eq!(escape_iterations(0.0, 0.0, MAX_ITERATIONS), MAX_ITERATIONS);
        assert_eq!(escape_iterations(-1.0, 0.0, MAX_ITERATIONS), MAX_ITERATIONS);
    }

    #[test]
    fn exterior_point_escapes_quickly() {
        let n = escape_iterations(2.0, 2.0, MAX_ITERATIONS);
        assert!(n < 3, "far exterior point took {n} iterations");
    }

    #[test]
    fn escape_count_is_capped() {
        for n in [
            escape_iterations(0.3, 0.5, 16),
            escape_iterations(0.0, 0.0, 16),
        ] {
            assert!(n <= 16);
        }
    }

    #[test]
    fn interior_shades_black_with_opaque_alpha() {
        let p = shade(MAX_ITERATIONS, MAX_ITERATIONS, 0x1234_5678);
        assert_eq!(p, Pixel { r: 0.0, g: 0.0, b: 0.0, a: 1.0 });
    }

    #[test]
    fn shade_stays_in_unit_range() {
        for n in 0..MAX_ITERATIONS {
            let p = shade(n, MAX_ITERATIONS, 0xdead_beef);
            for channel in [p.r, p.g, p.b, p.a] {
                assert!((0.0..=1.0).contains(&channel), "n={n} channel={channel}");
            }
            assert_eq!(p.a, 1.0);
        }
    }

    #[test]
    fn seed_shifts_the_palette() {
        let base = shade(1, MAX_ITERATIONS, 0);
        let shifted = (1..16).any(|seed| shade(1, MAX_ITERATIONS, seed) != base);
        assert!(shifted, "no seed in 1..16 changed the palette phase");
    }

    #[test]
    fn hash_decorrelates_neighboring_seeds() {
        assert_ne!(hash_seed(0), hash_seed(1));
        assert_ne!(hash_seed(41), hash_seed(42));
    }

    #[test]
    fn pixel_coordinates_span_the_window() {
        let (left, _) = pixel_coordinate(0, 0, WIDTH, HEIGHT);
        let (right, _) = pixel_coordinate(WIDTH - 1, 0, WIDTH, HEIGHT);
        let (_, top) = pixel_coordinate(0, 0, WIDTH, HEIGHT);
        let (_, bottom) = pixel_coordinate(0, HEIGHT - 1, WIDTH, HEIGHT);
        assert!(left < CENTER_RE && CENTER_RE < right);
        assert!(top < CENTER_IM && CENTER_IM < bottom);
        // Vertical span is VIEW_SCALE minus one pixel of half-sample inset.
        assert!((bottom - top - VIEW_SCALE).abs() < 2.0 * VIEW_SCALE / HEIGHT as f32);
    }
}
