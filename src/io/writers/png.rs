use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::GrayImage;
use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};

use crate::error::Result;

const METERS_PER_INCH: f64 = 0.0254;

/// Write an 8-bit grayscale PNG, recording `dpi` in the pHYs chunk when given
pub fn write_gray_png(
    output: &Path,
    cols: usize,
    rows: usize,
    data: &[u8],
    dpi: Option<u32>,
) -> Result<()> {
    let file = File::create(output)?;
    let writer = BufWriter::new(file);
    let mut encoder = Encoder::new(writer, cols as u32, rows as u32);
    encoder.set_color(ColorType::Grayscale);
    encoder.set_depth(BitDepth::Eight);
    if let Some(dpi) = dpi {
        let ppm = (dpi as f64 / METERS_PER_INCH).round() as u32;
        encoder.set_pixel_dims(Some(PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: Unit::Meter,
        }));
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;
    writer.finish()?;
    Ok(())
}

pub fn write_gray_image(output: &Path, image: &GrayImage, dpi: Option<u32>) -> Result<()> {
    write_gray_png(
        output,
        image.width() as usize,
        image.height() as usize,
        image.as_raw(),
        dpi,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn png_round_trips_dimensions_and_dpi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let img = GrayImage::from_pixel(3, 2, Luma([128]));
        write_gray_image(&path, &img, Some(203)).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (3, 2));
        let dims = info.pixel_dims.unwrap();
        assert_eq!(dims.unit, Unit::Meter);
        assert_eq!(dims.xppu, 7992);
    }
}
