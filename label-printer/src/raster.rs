//! Image rasterization
//!
//! Decodes an encoded image (PNG/JPEG/WebP) and packs it into the 1-bit,
//! MSB-first rows that a ZPL graphic field expects.

use image::GenericImageView;
use tracing::{debug, instrument};

use crate::error::{PrintError, PrintResult};
use crate::zpl::ImagePlacement;

/// Packed monochrome bitmap, 1 = black
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub data: Vec<u8>,
    pub bytes_per_row: u32,
    pub rows: u32,
}

impl Raster {
    /// Place this raster on a label
    pub fn place(self, x: u32, y: u32) -> ImagePlacement {
        ImagePlacement::raster(x, y, self.data, self.bytes_per_row)
    }
}

/// Decode `bytes` and convert to a bitmap no wider than `max_width` dots
///
/// The image will be:
/// - Resized to fit the label width (aspect ratio kept)
/// - Converted to 1-bit monochrome (transparent pixels are white)
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn rasterize(bytes: &[u8], max_width: u32) -> PrintResult<Raster> {
    if max_width == 0 {
        return Err(PrintError::Image("Target width is zero".to_string()));
    }

    let img = image::load_from_memory(bytes).map_err(|e| PrintError::Image(e.to_string()))?;
    let (w, h) = img.dimensions();
    debug!(width = w, height = h, "image decoded");

    let (new_w, new_h) = if w > max_width {
        let ratio = max_width as f64 / w as f64;
        (max_width, ((h as f64 * ratio) as u32).max(1))
    } else {
        (w, h)
    };

    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Nearest);
    let rgba = resized.to_rgba8();

    let x_bytes = new_w.div_ceil(8);
    let mut data = Vec::with_capacity((x_bytes * new_h) as usize);

    for y in 0..new_h {
        for x_byte in 0..x_bytes {
            let mut byte = 0u8;
            for bit in 0..8 {
                let x = x_byte * 8 + bit;
                if x >= new_w {
                    break;
                }
                let pixel = rgba.get_pixel(x, y);
                if pixel[3] >= 128 {
                    let luma = (0.299 * pixel[0] as f32
                        + 0.587 * pixel[1] as f32
                        + 0.114 * pixel[2] as f32) as u8;
                    if luma < 128 {
                        byte |= 1 << (7 - bit);
                    }
                }
            }
            data.push(byte);
        }
    }

    Ok(Raster {
        data,
        bytes_per_row: x_bytes,
        rows: new_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_rasterize_packs_black_pixels() {
        // 10x2: first row black on the left half, second row white
        let mut img = RgbaImage::from_pixel(10, 2, Rgba([255, 255, 255, 255]));
        for x in 0..5 {
            img.put_pixel(x, 0, Rgba([0, 0, 0, 255]));
        }
        let raster = rasterize(&png(&img), 609).unwrap();
        assert_eq!(raster.bytes_per_row, 2);
        assert_eq!(raster.rows, 2);
        assert_eq!(raster.data, vec![0b1111_1000, 0, 0, 0]);
    }

    #[test]
    fn test_transparent_is_white() {
        let img = RgbaImage::from_pixel(8, 1, Rgba([0, 0, 0, 0]));
        let raster = rasterize(&png(&img), 609).unwrap();
        assert_eq!(raster.data, vec![0]);
    }

    #[test]
    fn test_wide_image_is_scaled_down() {
        let img = RgbaImage::from_pixel(64, 32, Rgba([0, 0, 0, 255]));
        let raster = rasterize(&png(&img), 16).unwrap();
        assert_eq!(raster.bytes_per_row, 2);
        assert_eq!(raster.rows, 8);
        assert!(raster.data.iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = rasterize(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], 609);
        assert!(matches!(err, Err(PrintError::Image(_))));
    }
}
