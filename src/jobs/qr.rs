//! Single QR code to PNG.
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::qr::render_qr;
use crate::error::Result;
use crate::io::writers::png::write_gray_image;
use crate::types::ErrorCorrection;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrParams {
    pub data: String,
    pub output: PathBuf,
    /// Pixels per module
    pub box_size: u32,
    /// Quiet zone, in modules
    pub border: u32,
    pub error_correction: ErrorCorrection,
}

impl Default for QrParams {
    fn default() -> Self {
        Self {
            data: String::new(),
            output: PathBuf::from("qrcode.png"),
            box_size: 10,
            border: 4,
            error_correction: ErrorCorrection::H,
        }
    }
}

/// Encode `params.data` and write the PNG; returns the image side in pixels
pub fn generate_qr(params: &QrParams) -> Result<u32> {
    let img = render_qr(
        &params.data,
        params.box_size,
        params.border,
        params.error_correction,
    )?;
    if let Some(parent) = params.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_gray_image(&params.output, &img, None)?;
    info!(
        "Saved {}x{} QR code to {:?}",
        img.width(),
        img.height(),
        params.output
    );
    Ok(img.width())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_png_with_default_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("codes/github.png");
        let params = QrParams {
            data: "https://github.com/".to_string(),
            output: output.clone(),
            ..Default::default()
        };
        let side = generate_qr(&params).unwrap();
        assert!(output.is_file());
        // version >= 2 for 19 bytes at level H: (25 + 8) * 10
        assert!(side >= 330);
        assert_eq!(side % 10, 0);
        let decoded = image::open(&output).unwrap();
        assert_eq!(decoded.width(), side);
    }
}
