//! Thermal label layout and rendering.
//!
//! A `LayoutTemplate` is the JSON shape users write; `Layout` is the same thing
//! resolved to pixels for a given DPI with every default filled in. The
//! `LabelRenderer` owns the loaded fonts and paints one label per row.
use std::fs;
use std::path::Path;

use image::{GrayImage, Luma, imageops};
use serde::{Deserialize, Serialize};

use crate::core::font::LabelFont;
use crate::core::qr::render_qr_sized;
use crate::core::row::Row;
use crate::core::template::Template;
use crate::error::{Error, Result};
use crate::types::ErrorCorrection;

/// Common for 4x6 thermal printers
pub const DEFAULT_DPI: u32 = 203;
pub const DEFAULT_LABEL_WIDTH_IN: f64 = 4.0;
pub const DEFAULT_LABEL_HEIGHT_IN: f64 = 6.0;
pub const DEFAULT_BACKGROUND: u8 = 255;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTemplate {
    pub label: LabelSection,
    pub qr: QrSection,
    pub text_blocks: Vec<TextBlockSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSection {
    pub width_in: Option<f64>,
    pub height_in: Option<f64>,
    pub background: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrSection {
    pub box_size: Option<f64>,
    pub border: Option<f64>,
    /// Rendered side in inches; takes precedence over `size_px`
    pub size_in: Option<f64>,
    pub size_px: Option<f64>,
    pub position: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBlockSection {
    pub text: String,
    pub position: Option<[f64; 2]>,
    pub font_size: Option<f64>,
    pub anchor: Option<String>,
    pub fill: Option<f64>,
    pub max_width: Option<f64>,
    pub line_spacing: Option<f64>,
    pub font_path: Option<String>,
}

/// Horizontal part of a two-letter anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Middle,
    Right,
}

/// Vertical part of a two-letter anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Ascender,
    Top,
    Middle,
    Baseline,
    Bottom,
    Descender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub h: HAlign,
    pub v: VAlign,
}

impl Default for Anchor {
    fn default() -> Self {
        Self {
            h: HAlign::Left,
            v: VAlign::Ascender,
        }
    }
}

impl std::str::FromStr for Anchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Anchor::default());
        }
        let invalid = || Error::InvalidArgument {
            arg: "anchor",
            value: s.to_string(),
        };
        let mut chars = s.chars();
        let (Some(h), Some(v), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };
        let h = match h {
            'l' => HAlign::Left,
            'm' => HAlign::Middle,
            'r' => HAlign::Right,
            _ => return Err(invalid()),
        };
        let v = match v {
            'a' => VAlign::Ascender,
            't' => VAlign::Top,
            'm' => VAlign::Middle,
            's' => VAlign::Baseline,
            'b' => VAlign::Bottom,
            'd' => VAlign::Descender,
            _ => return Err(invalid()),
        };
        Ok(Anchor { h, v })
    }
}

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub template: Template,
    pub position: (i64, i64),
    pub font_size: u32,
    pub anchor: Anchor,
    pub fill: u8,
    pub max_width: Option<u32>,
    pub line_spacing: Option<u32>,
    pub font_path: Option<String>,
}

impl TextBlock {
    fn new(text: &str, position: (i64, i64), font_size: u32) -> Result<Self> {
        Ok(Self {
            template: Template::parse(text)?,
            position,
            font_size,
            anchor: Anchor::default(),
            fill: 0,
            max_width: None,
            line_spacing: None,
            font_path: None,
        })
    }

    /// Filled from the row (unknown keys render empty) and trimmed
    pub fn build_text(&self, row: &Row) -> String {
        self.template
            .render_lenient(|key| row.raw(key))
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub background: u8,
    pub qr_box_size: u32,
    pub qr_border: u32,
    pub qr_size: u32,
    pub qr_position: (i64, i64),
    pub text_blocks: Vec<TextBlock>,
}

fn px(inches: f64, dpi: u32) -> i64 {
    (inches * dpi as f64).round() as i64
}

/// Truncating conversion for user-provided numbers
fn whole(value: f64) -> i64 {
    value.trunc() as i64
}

fn to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

fn to_u8(value: f64) -> u8 {
    whole(value).clamp(0, 255) as u8
}

impl Layout {
    /// 4x6 in label: id, destination and contents top-left, QR bottom-right
    pub fn default_for(dpi: u32) -> Result<Self> {
        let width = px(DEFAULT_LABEL_WIDTH_IN, dpi);
        let height = px(DEFAULT_LABEL_HEIGHT_IN, dpi);
        let margin = px(0.3, dpi);
        let qr_size = px(2.4, dpi);
        let qr_position = (width - qr_size - margin, height - qr_size - margin);

        let pallet = TextBlock::new(
            "Pallet: {pallet_id}",
            (margin, margin),
            to_u32(px(0.45, dpi).max(24)),
        )?;
        let mut destination = TextBlock::new(
            "Destination: {destination}",
            (margin, margin + px(0.7, dpi)),
            to_u32(px(0.28, dpi).max(18)),
        )?;
        destination.max_width = Some(to_u32(width - (2 * margin + qr_size + margin)));
        let mut contents = TextBlock::new(
            "Contents: {contents}",
            (margin, margin + px(1.2, dpi)),
            to_u32(px(0.26, dpi).max(16)),
        )?;
        contents.max_width = Some(to_u32(width - 2 * margin));
        contents.line_spacing = Some(to_u32(px(0.1, dpi)));

        Ok(Self {
            width: to_u32(width),
            height: to_u32(height),
            background: DEFAULT_BACKGROUND,
            qr_box_size: 10,
            qr_border: 4,
            qr_size: to_u32(qr_size),
            qr_position,
            text_blocks: vec![pallet, destination, contents],
        })
    }

    pub fn from_template(tpl: &LayoutTemplate, dpi: u32) -> Result<Self> {
        let width = px(tpl.label.width_in.unwrap_or(DEFAULT_LABEL_WIDTH_IN), dpi);
        let height = px(tpl.label.height_in.unwrap_or(DEFAULT_LABEL_HEIGHT_IN), dpi);
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidArgument {
                arg: "label size",
                value: format!("{}x{} px", width, height),
            });
        }
        let background = tpl
            .label
            .background
            .map(to_u8)
            .unwrap_or(DEFAULT_BACKGROUND);

        let quarter = whole(0.25 * dpi as f64);
        let qr_size = match (tpl.qr.size_in, tpl.qr.size_px) {
            (Some(size_in), _) => px(size_in, dpi),
            (None, Some(size_px)) => whole(size_px),
            (None, None) => px(2.5, dpi),
        };
        let qr_position = tpl
            .qr
            .position
            .map(|[x, y]| (whole(x), whole(y)))
            .unwrap_or((width - qr_size - quarter, quarter));

        let text_blocks = tpl
            .text_blocks
            .iter()
            .map(|b| {
                Ok(TextBlock {
                    template: Template::parse(&b.text)?,
                    position: b
                        .position
                        .map(|[x, y]| (whole(x), whole(y)))
                        .unwrap_or((quarter, quarter)),
                    font_size: to_u32(b.font_size.map(whole).unwrap_or(whole(0.3 * dpi as f64)))
                        .max(1),
                    anchor: b.anchor.as_deref().unwrap_or("la").parse()?,
                    fill: b.fill.map(to_u8).unwrap_or(0),
                    max_width: b.max_width.map(|w| to_u32(whole(w))),
                    line_spacing: b.line_spacing.map(|s| to_u32(whole(s))),
                    font_path: b.font_path.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            width: to_u32(width),
            height: to_u32(height),
            background,
            qr_box_size: to_u32(tpl.qr.box_size.map(whole).unwrap_or(10)).max(1),
            qr_border: to_u32(tpl.qr.border.map(whole).unwrap_or(4)),
            qr_size: to_u32(qr_size),
            qr_position,
            text_blocks,
        })
    }

    /// Layout from an optional JSON template file
    pub fn load(path: Option<&Path>, dpi: u32) -> Result<Self> {
        match path {
            None => Self::default_for(dpi),
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                let tpl: LayoutTemplate = serde_json::from_str(&fs::read_to_string(path)?)?;
                Self::from_template(&tpl, dpi)
            }
        }
    }
}

/// Greedy word wrap to `width` characters, breaking words longer than a line
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        if paragraph.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        let mut line: Vec<char> = Vec::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while !word.is_empty() {
                let gap = usize::from(!line.is_empty());
                if line.len() + gap + word.len() <= width {
                    if gap == 1 {
                        line.push(' ');
                    }
                    line.append(&mut word);
                } else if word.len() > width {
                    let room = width.saturating_sub(line.len() + gap);
                    if room > 0 {
                        if gap == 1 {
                            line.push(' ');
                        }
                        line.extend(word.drain(..room));
                    } else if line.is_empty() {
                        line.extend(word.drain(..width));
                    }
                    out.push(line.drain(..).collect());
                } else {
                    out.push(line.drain(..).collect());
                }
            }
        }
        if !line.is_empty() {
            out.push(line.into_iter().collect());
        }
    }
    out
}

pub struct LabelRenderer {
    layout: Layout,
    fonts: Vec<LabelFont>,
}

impl LabelRenderer {
    pub fn new(layout: Layout) -> Self {
        let fonts = layout
            .text_blocks
            .iter()
            .map(|b| LabelFont::load(b.font_path.as_deref(), b.font_size))
            .collect();
        Self { layout, fonts }
    }

    /// Renderer that never touches the filesystem for fonts
    pub fn with_bitmap_fonts(layout: Layout) -> Self {
        let fonts = layout
            .text_blocks
            .iter()
            .map(|b| LabelFont::bitmap(b.font_size))
            .collect();
        Self { layout, fonts }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Paint one label: QR of `qr_data`, then every text block filled from `row`
    pub fn render(&self, row: &Row, qr_data: &str) -> Result<GrayImage> {
        let layout = &self.layout;
        let mut image = GrayImage::from_pixel(
            layout.width,
            layout.height,
            Luma([layout.background]),
        );

        let qr = render_qr_sized(
            qr_data,
            layout.qr_box_size,
            layout.qr_border,
            ErrorCorrection::M,
            layout.qr_size,
        )?;
        imageops::overlay(&mut image, &qr, layout.qr_position.0, layout.qr_position.1);

        for (block, font) in layout.text_blocks.iter().zip(&self.fonts) {
            let text = block.build_text(row);
            if text.is_empty() {
                continue;
            }
            let lines = match block.max_width {
                Some(max_width) if max_width > 0 => {
                    let reference = font.text_width("M").max(1.0);
                    wrap_text(&text, ((max_width as f32 / reference) as usize).max(1))
                }
                _ => text.split('\n').map(str::to_string).collect(),
            };
            draw_block(&mut image, block, font, &lines);
        }
        Ok(image)
    }
}

fn draw_block(image: &mut GrayImage, block: &TextBlock, font: &LabelFont, lines: &[String]) {
    let spacing = block
        .line_spacing
        .unwrap_or_else(|| ((font.size() as f32 * 0.2) as u32).max(4)) as f32;
    let line_height = font.line_height();
    let block_height = lines.len() as f32 * line_height + (lines.len().saturating_sub(1)) as f32 * spacing;
    let block_width = lines
        .iter()
        .map(|l| font.text_width(l))
        .fold(0.0_f32, f32::max);

    let (x, y) = (block.position.0 as f32, block.position.1 as f32);
    let left = match block.anchor.h {
        HAlign::Left => x,
        HAlign::Middle => x - block_width / 2.0,
        HAlign::Right => x - block_width,
    };
    let top = match block.anchor.v {
        VAlign::Ascender | VAlign::Top => y,
        VAlign::Middle => y - block_height / 2.0,
        VAlign::Baseline => y - font.ascent(),
        VAlign::Bottom | VAlign::Descender => y - block_height,
    };

    for (i, line) in lines.iter().enumerate() {
        let baseline = top + i as f32 * (line_height + spacing) + font.ascent();
        font.draw_line(image, left, baseline, line, block.fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_four_by_six_at_203_dpi() {
        let layout = Layout::default_for(DEFAULT_DPI).unwrap();
        assert_eq!((layout.width, layout.height), (812, 1218));
        assert_eq!(layout.qr_size, 487);
        // margin = round(0.3 * 203) = 61
        assert_eq!(layout.qr_position, (812 - 487 - 61, 1218 - 487 - 61));
        assert_eq!(layout.text_blocks.len(), 3);
        assert_eq!(layout.text_blocks[0].font_size, 91);
    }

    #[test]
    fn template_defaults_fill_gaps() {
        let tpl: LayoutTemplate = serde_json::from_str(
            r#"{"label": {"width_in": 2, "height_in": 1},
                "qr": {"size_px": 100},
                "text_blocks": [{"text": "ID {pallet_id}", "font_size": 20.7}]}"#,
        )
        .unwrap();
        let layout = Layout::from_template(&tpl, 100).unwrap();
        assert_eq!((layout.width, layout.height), (200, 100));
        assert_eq!(layout.qr_size, 100);
        assert_eq!(layout.qr_position, (200 - 100 - 25, 25));
        let block = &layout.text_blocks[0];
        assert_eq!(block.position, (25, 25));
        assert_eq!(block.font_size, 20);
        assert_eq!(block.anchor, Anchor::default());
    }

    #[test]
    fn size_in_beats_size_px() {
        let tpl: LayoutTemplate =
            serde_json::from_str(r#"{"qr": {"size_in": 1.0, "size_px": 10}}"#).unwrap();
        assert_eq!(Layout::from_template(&tpl, 150).unwrap().qr_size, 150);
    }

    #[test]
    fn anchors_parse_two_letters() {
        assert_eq!(
            "rb".parse::<Anchor>().unwrap(),
            Anchor {
                h: HAlign::Right,
                v: VAlign::Bottom
            }
        );
        assert!("xx".parse::<Anchor>().is_err());
        assert!("lat".parse::<Anchor>().is_err());
    }

    #[test]
    fn wrap_breaks_on_words_and_splits_long_ones() {
        assert_eq!(
            wrap_text("ten boxes of bolts", 9),
            vec!["ten boxes", "of bolts"]
        );
        assert_eq!(wrap_text("ab abcdefgh", 5), vec!["ab ab", "cdefg", "h"]);
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn build_text_renders_missing_keys_empty() {
        let block = TextBlock::new("  Dest: {destination} ", (0, 0), 10).unwrap();
        let row = Row::from_pairs(2, [("pallet_id", "P1")]);
        assert_eq!(block.build_text(&row), "Dest:");
    }

    #[test]
    fn rendered_label_has_layout_size_and_ink() {
        let layout = Layout::default_for(100).unwrap();
        let renderer = LabelRenderer::with_bitmap_fonts(layout);
        let row = Row::from_pairs(2, [("pallet_id", "PAL-7"), ("destination", "Dock 4")]);
        let img = renderer.render(&row, "PAL-7").unwrap();
        assert_eq!(img.dimensions(), (400, 600));
        // text area top-left has ink
        let ink = (30..120).any(|y| (30..300).any(|x| img.get_pixel(x, y)[0] < 128));
        assert!(ink);
    }
}
