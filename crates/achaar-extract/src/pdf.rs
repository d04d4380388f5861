//! PDF text extraction via `hayro-interpret`.
//!
//! Each page is interpreted with a [`TextDevice`] that records glyph events.
//! Spaces and line breaks are inferred from glyph bounding boxes, because
//! PDFs often omit explicit space characters and rely on positioning.

use std::sync::Arc;

use async_trait::async_trait;
use hayro_interpret::font::Glyph;
use hayro_interpret::hayro_syntax::Pdf;
use hayro_interpret::util::PageExt;
use hayro_interpret::{
    interpret_page, BlendMode, ClipPath, Context, Device, GlyphDrawMode, Image,
    InterpreterSettings, Paint, PathDrawMode, SoftMask,
};
use kurbo::{Affine, Rect, Shape};

use crate::{DocumentExtractor, ExtractError, ExtractedText};

/// Minimum vertical overlap, relative to the smaller glyph height, for two
/// glyphs to sit on the same line.
const SAME_LINE_OVERLAP_RATIO: f64 = 0.5;

/// A horizontal gap wider than this fraction of the glyph height is a word
/// break.
const WORD_GAP_RATIO: f64 = 0.25;

/// Extracts text from every page and merges the pages with newlines.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Empty);
        }
        let data = bytes.to_vec();
        tokio::task::spawn_blocking(move || extract_pages(data))
            .await
            .map_err(|e| ExtractError::Task(e.to_string()))?
    }
}

fn extract_pages(data: Vec<u8>) -> Result<ExtractedText, ExtractError> {
    let pdf = Pdf::new(Arc::new(data)).map_err(|e| ExtractError::Parse(format!("{:?}", e)))?;
    let settings = InterpreterSettings::default();

    let mut pages = Vec::new();
    for page in pdf.pages().iter() {
        let (w, h) = page.render_dimensions();
        let bbox = Rect::new(0.0, 0.0, w as f64, h as f64);
        let mut ctx = Context::new(
            page.initial_transform(true),
            bbox,
            page.xref(),
            settings.clone(),
        );
        let mut device = TextDevice::default();
        interpret_page(page, &mut ctx, &mut device);
        pages.push(device.to_text());
    }

    tracing::debug!(pages = pages.len(), "PDF text extracted");

    Ok(ExtractedText {
        text: pages.join("\n"),
        page_count: pages.len(),
    })
}

/// A single glyph event with its best-effort Unicode mapping.
#[derive(Debug, Clone)]
struct PlacedChar {
    ch: Option<char>,
    /// Bounding box in page space, when it can be determined.
    bbox: Option<Rect>,
}

/// A [`Device`] that records glyphs and ignores everything else.
#[derive(Debug, Default)]
struct TextDevice {
    chars: Vec<PlacedChar>,
}

impl TextDevice {
    /// Rebuild text from the glyph stream, inserting a space on wide gaps
    /// within a line and a newline when the next glyph starts a new line.
    fn to_text(&self) -> String {
        let mut out = String::new();
        let mut last_bbox: Option<Rect> = None;
        let mut last_was_break = true;

        for glyph in &self.chars {
            if let (Some(prev), Some(cur)) = (last_bbox, glyph.bbox) {
                if is_same_line(prev, cur) {
                    let gap = cur.x0 - prev.x1;
                    let threshold = WORD_GAP_RATIO * 0.5 * (prev.height() + cur.height());
                    if gap > 0.0 && gap > threshold && !last_was_break {
                        out.push(' ');
                        last_was_break = true;
                    }
                } else if !last_was_break {
                    out.push('\n');
                    last_was_break = true;
                }
            }

            if let Some(ch) = glyph.ch {
                out.push(ch);
                last_was_break = ch.is_whitespace();
            }

            if glyph.bbox.is_some() {
                last_bbox = glyph.bbox;
            }
        }

        out.trim_end().to_string()
    }
}

fn is_same_line(a: Rect, b: Rect) -> bool {
    let overlap = a.y1.min(b.y1) - a.y0.max(b.y0);
    if overlap <= 0.0 {
        return false;
    }
    let denom = a.height().min(b.height());
    if denom <= 0.0 {
        return false;
    }
    overlap / denom >= SAME_LINE_OVERLAP_RATIO
}

impl<'a> Device<'a> for TextDevice {
    fn set_soft_mask(&mut self, _mask: Option<SoftMask<'a>>) {}

    fn set_blend_mode(&mut self, _blend_mode: BlendMode) {}

    fn draw_path(
        &mut self,
        _path: &kurbo::BezPath,
        _transform: Affine,
        _paint: &Paint<'a>,
        _draw_mode: &PathDrawMode,
    ) {
    }

    fn push_clip_path(&mut self, _clip_path: &ClipPath) {}

    fn push_transparency_group(
        &mut self,
        _opacity: f32,
        _mask: Option<SoftMask<'a>>,
        _blend_mode: BlendMode,
    ) {
    }

    fn draw_glyph(
        &mut self,
        glyph: &Glyph<'a>,
        transform: Affine,
        glyph_transform: Affine,
        _paint: &Paint<'a>,
        _draw_mode: &GlyphDrawMode,
    ) {
        let bbox = match glyph {
            Glyph::Outline(outline) => {
                let path = transform * (glyph_transform * outline.outline());
                Some(path.bounding_box())
            }
            // Type3 glyphs need their glyph program interpreted for a bbox.
            Glyph::Type3(_) => None,
        };
        self.chars.push(PlacedChar {
            ch: glyph.as_unicode(),
            bbox,
        });
    }

    fn draw_image(&mut self, _image: Image<'a, '_>, _transform: Affine) {}

    fn pop_clip_path(&mut self) {}

    fn pop_transparency_group(&mut self) {}
}
