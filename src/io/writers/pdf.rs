use std::path::Path;

use image::GrayImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::Result;

const POINTS_PER_INCH: f32 = 72.0;

/// Write a one-page PDF whose page is the image printed at `dpi`
pub fn write_gray_pdf(output: &Path, image: &GrayImage, dpi: u32) -> Result<()> {
    let mut doc = build_image_document(image, dpi)?;
    doc.save(output)?;
    Ok(())
}

pub fn build_image_document(image: &GrayImage, dpi: u32) -> Result<Document> {
    let dpi = dpi.max(1) as f32;
    let page_w = image.width() as f32 / dpi * POINTS_PER_INCH;
    let page_h = image.height() as f32 / dpi * POINTS_PER_INCH;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_w.into(),
                    0.into(),
                    0.into(),
                    page_h.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im0" => image_id,
        },
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn page_size_follows_dpi() {
        let img = GrayImage::from_pixel(406, 609, Luma([255]));
        let doc = build_image_document(&img, 203).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let width = media[2].as_float().unwrap();
        let height = media[3].as_float().unwrap();
        assert!((width - 144.0).abs() < 0.01);
        assert!((height - 216.0).abs() < 0.01);
    }

    #[test]
    fn written_file_starts_with_pdf_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.pdf");
        let img = GrayImage::from_pixel(10, 10, Luma([0]));
        write_gray_pdf(&path, &img, 100).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }
}
