//! Converts the kernel's packed float pixels to 8-bit RGBA and hands the
//! result to the PNG encoder.

use std::path::Path;

use image::RgbaImage;
use rayon::prelude::*;
use shared::{Pixel, RenderConfig};

use crate::error::{RenderError, Result};

#[inline]
fn channel_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Flattens float pixels into row-major RGBA bytes, one row per rayon
/// task.
pub fn pixels_to_rgba8(pixels: &[Pixel], width: u32) -> Vec<u8> {
    let w = width as usize;
    pixels
        .par_chunks(w)
        .flat_map_iter(|row| {
            row.iter().flat_map(|p| {
                [
                    channel_to_u8(p.r),
                    channel_to_u8(p.g),
                    channel_to_u8(p.b),
                    channel_to_u8(p.a),
                ]
            })
        })
        .collect()
}

/// Encodes the pixel buffer as a PNG at `output`.
pub fn save_png(output: &Path, config: RenderConfig, pixels: &[Pixel]) -> Result<()> {
    if pixels.len() != config.pixel_count() {
        return Err(RenderError::Other(format!(
            "pixel buffer holds {} cells, expected {}",
            pixels.len(),
            config.pixel_count()
        )));
    }

    let bytes = pixels_to_rgba8(pixels, config.width);
    let img = RgbaImage::from_raw(config.width, config.height, bytes).ok_or_else(|| {
        RenderError::Other("image buffer does not match its dimensions".into())
    })?;
    // save() picks the format from the extension.
    img.save(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(r: f32, g: f32, b: f32, a: f32) -> Pixel {
        Pixel { r, g, b, a }
    }

    #[test]
    fn channels_round_and_clamp() {
        assert_eq!(channel_to_u8(0.0), 0);
        assert_eq!(channel_to_u8(1.0), 255);
        assert_eq!(channel_to_u8(0.5), 128);
        assert_eq!(channel_to_u8(-1.0), 0);
        assert_eq!(channel_to_u8(2.0), 255);
    }

    #[test]
    fn output_is_row_major_rgba() {
        let pixels = [
            pixel(1.0, 0.0, 0.0, 1.0),
            pixel(0.0, 1.0, 0.0, 1.0),
            pixel(0.0, 0.0, 1.0, 1.0),
            pixel(0.0, 0.0, 0.0, 0.0),
        ];
        let bytes = pixels_to_rgba8(&pixels, 2);
        assert_eq!(
            bytes,
            vec![
                255, 0, 0, 255, //
                0, 255, 0, 255, //
                0, 0, 255, 255, //
                0, 0, 0, 0,
            ]
        );
    }

    #[test]
    fn alpha_byte_survives_the_conversion() {
        // A kernel writing seed-derived data into alpha must see the same
        // byte come out the encoder side.
        let byte = 0x42u8;
        let pixels = [pixel(0.0, 0.0, 0.0, byte as f32 / 255.0)];
        let bytes = pixels_to_rgba8(&pixels, 1);
        assert_eq!(bytes[3], byte);
    }

    #[test]
    fn save_rejects_mismatched_dimensions() {
        let config = RenderConfig {
            width: 4,
            height: 4,
            workgroup_size: 32,
        };
        let pixels = vec![pixel(0.0, 0.0, 0.0, 1.0); 3];
        let err = save_png(Path::new("/tmp/never-written.png"), config, &pixels).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn writes_a_png_to_disk() {
        let dir = std::env::temp_dir().join("gpu-mandelbrot-export-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tiny.png");

        let config = RenderConfig {
            width: 2,
            height: 2,
            workgroup_size: 32,
        };
        let pixels = vec![pixel(0.25, 0.5, 0.75, 1.0); 4];
        save_png(&path, config, &pixels).unwrap();

        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.dimensions(), (2, 2));
        assert_eq!(reloaded.get_pixel(0, 0).0, [64, 128, 191, 255]);

        std::fs::remove_file(&path).ok();
    }
}
