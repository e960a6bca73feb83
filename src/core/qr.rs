//! QR matrix rasterization. Encoding itself is delegated to the `qrcode` crate;
//! this module only paints modules onto a grayscale canvas with an explicit
//! box size and quiet-zone border.
use image::{GrayImage, Luma, imageops};
use qrcode::{Color, QrCode};

use crate::error::{Error, Result};
use crate::types::ErrorCorrection;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Smallest QR symbol holding `data`, painted `box_size` px per module
/// with `border` light modules around it
pub fn render_qr(
    data: &str,
    box_size: u32,
    border: u32,
    level: ErrorCorrection,
) -> Result<GrayImage> {
    if data.is_empty() {
        return Err(Error::InvalidArgument {
            arg: "data",
            value: String::new(),
        });
    }
    if box_size == 0 {
        return Err(Error::InvalidArgument {
            arg: "box_size",
            value: box_size.to_string(),
        });
    }

    let code = QrCode::with_error_correction_level(data.as_bytes(), level.into())?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * border) * box_size;

    let mut img = GrayImage::from_pixel(side, side, LIGHT);
    for (idx, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = idx as u32 % modules;
        let my = idx as u32 / modules;
        let x0 = (mx + border) * box_size;
        let y0 = (my + border) * box_size;
        for y in y0..y0 + box_size {
            for x in x0..x0 + box_size {
                img.put_pixel(x, y, DARK);
            }
        }
    }
    Ok(img)
}

/// `render_qr` scaled to exactly `size` x `size` with nearest-neighbour sampling
pub fn render_qr_sized(
    data: &str,
    box_size: u32,
    border: u32,
    level: ErrorCorrection,
    size: u32,
) -> Result<GrayImage> {
    let img = render_qr(data, box_size, border, level)?;
    if size == 0 || size == img.width() {
        return Ok(img);
    }
    Ok(imageops::resize(
        &img,
        size,
        size,
        imageops::FilterType::Nearest,
    ))
}
