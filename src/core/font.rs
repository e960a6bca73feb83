//! Glyph rendering for label text: TrueType through `ab_glyph` when a font file
//! can be found, otherwise the built-in 8x8 bitmap font scaled to size.
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont, point};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::GrayImage;
use tracing::debug;

pub const DEFAULT_FONT: &str = "DejaVuSans.ttf";

const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/dejavu-sans-fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "C:\\Windows\\Fonts",
];

const BITMAP_CELL: u32 = 8;

pub enum LabelFont {
    TrueType { font: FontVec, scale: PxScale, size: u32 },
    Bitmap { scale: u32, size: u32 },
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::TrueType { size, .. } => write!(f, "TrueType({}px)", size),
            LabelFont::Bitmap { scale, .. } => write!(f, "Bitmap(x{})", scale),
        }
    }
}

/// Resolve a font name to a file: the path itself, or the name inside a
/// known system font directory
pub fn find_font_file(name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }
    if direct.components().count() != 1 {
        return None;
    }
    FONT_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find(|p| p.is_file())
}

impl LabelFont {
    /// Load `path` (or the default font) at `size` px per em, falling back to the bitmap font
    pub fn load(path: Option<&str>, size: u32) -> Self {
        let name = path.unwrap_or(DEFAULT_FONT);
        let loaded = find_font_file(name)
            .and_then(|p| fs::read(&p).ok())
            .and_then(|bytes| FontVec::try_from_vec(bytes).ok());
        match loaded {
            Some(font) => {
                let upem = font.units_per_em().unwrap_or_else(|| font.height_unscaled());
                let scale = PxScale::from(size as f32 * font.height_unscaled() / upem);
                LabelFont::TrueType { font, scale, size }
            }
            None => {
                debug!("Font '{}' unavailable; using bitmap fallback", name);
                Self::bitmap(size)
            }
        }
    }

    pub fn bitmap(size: u32) -> Self {
        let scale = ((size as f32 / BITMAP_CELL as f32).round() as u32).max(1);
        LabelFont::Bitmap { scale, size }
    }

    /// Nominal size in px
    pub fn size(&self) -> u32 {
        match self {
            LabelFont::TrueType { size, .. } | LabelFont::Bitmap { size, .. } => *size,
        }
    }

    pub fn ascent(&self) -> f32 {
        match self {
            LabelFont::TrueType { font, scale, .. } => font.as_scaled(*scale).ascent(),
            LabelFont::Bitmap { scale, .. } => (BITMAP_CELL * scale) as f32,
        }
    }

    pub fn line_height(&self) -> f32 {
        match self {
            LabelFont::TrueType { font, scale, .. } => {
                let scaled = font.as_scaled(*scale);
                scaled.ascent() - scaled.descent()
            }
            LabelFont::Bitmap { scale, .. } => (BITMAP_CELL * scale) as f32,
        }
    }

    pub fn text_width(&self, text: &str) -> f32 {
        match self {
            LabelFont::TrueType { font, scale, .. } => {
                let scaled = font.as_scaled(*scale);
                let mut width = 0.0;
                let mut prev: Option<GlyphId> = None;
                for c in text.chars() {
                    let id = font.glyph_id(c);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width
            }
            LabelFont::Bitmap { scale, .. } => (text.chars().count() as u32 * BITMAP_CELL * scale) as f32,
        }
    }

    /// Draw one line with its baseline at `baseline`
    pub fn draw_line(&self, img: &mut GrayImage, x: f32, baseline: f32, text: &str, fill: u8) {
        match self {
            LabelFont::TrueType { font, scale, .. } => {
                let scaled = font.as_scaled(*scale);
                let mut caret = x;
                let mut prev: Option<GlyphId> = None;
                for c in text.chars() {
                    let id = font.glyph_id(c);
                    if let Some(p) = prev {
                        caret += scaled.kern(p, id);
                    }
                    let glyph = id.with_scale_and_position(*scale, point(caret, baseline));
                    caret += scaled.h_advance(id);
                    prev = Some(id);
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|gx, gy, coverage| {
                            blend(
                                img,
                                bounds.min.x as i64 + gx as i64,
                                bounds.min.y as i64 + gy as i64,
                                fill,
                                coverage,
                            );
                        });
                    }
                }
            }
            LabelFont::Bitmap { scale, .. } => {
                let cell = (BITMAP_CELL * scale) as i64;
                let top = (baseline - self.ascent()).round() as i64;
                let left = x.round() as i64;
                for (i, c) in text.chars().enumerate() {
                    let Some(glyph) = BASIC_FONTS
                        .get(c)
                        .or_else(|| LATIN_FONTS.get(c))
                        .or_else(|| BASIC_FONTS.get('?'))
                    else {
                        continue;
                    };
                    let origin_x = left + i as i64 * cell;
                    for (row, bits) in glyph.iter().enumerate() {
                        for col in 0..BITMAP_CELL {
                            if bits & (1 << col) == 0 {
                                continue;
                            }
                            for dy in 0..*scale as i64 {
                                for dx in 0..*scale as i64 {
                                    blend(
                                        img,
                                        origin_x + col as i64 * *scale as i64 + dx,
                                        top + row as i64 * *scale as i64 + dy,
                                        fill,
                                        1.0,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn blend(img: &mut GrayImage, x: i64, y: i64, fill: u8, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = img.get_pixel_mut(x as u32, y as u32);
    let current = pixel[0] as f32;
    pixel[0] = (current + (fill as f32 - current) * coverage).round() as u8;
}
