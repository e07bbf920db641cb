//! Paragraph height estimation.
//!
//! The reader never measures rendered text. Heights come from a character
//! count heuristic that is cheap, monotonic in text length and in 1/width, and
//! close enough for windowing to stay smooth.
//!
//! Heights are snapped to a 1/64px grid. Sums of grid values are exact in
//! `f64`, so cumulative offsets never drift however long the book is.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_FONT_SIZE: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 24;
pub const DEFAULT_CHAR_ADVANCE_PX: f64 = 0.5;
pub const DEFAULT_PARAGRAPH_PADDING_PX: f64 = 12.0;
const HEIGHT_GRID_STEPS_PER_PX: f64 = 64.0;

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Inputs the estimator depends on. Any change here invalidates the offset index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub viewport_width_px: f64,
    pub font_size_px: f64,
    pub line_height_px: f64,
    pub char_advance_px: f64,
    pub paragraph_padding_px: f64,
}

impl LayoutMetrics {
    pub fn new(viewport_width_px: f64, font_size: u32, line_spacing: f64) -> Self {
        let font_size_px = font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE) as f64;
        Self {
            viewport_width_px: sanitize_width(viewport_width_px),
            font_size_px,
            line_height_px: line_height_for(font_size_px, line_spacing),
            char_advance_px: DEFAULT_CHAR_ADVANCE_PX,
            paragraph_padding_px: DEFAULT_PARAGRAPH_PADDING_PX,
        }
    }

    pub fn estimate(&self, text: &str) -> f64 {
        estimate_height(
            text,
            self.viewport_width_px,
            self.font_size_px,
            self.line_height_px,
            self.char_advance_px,
            self.paragraph_padding_px,
        )
    }
}

pub(crate) fn line_height_for(font_size_px: f64, line_spacing: f64) -> f64 {
    let spacing = if line_spacing.is_finite() {
        line_spacing.clamp(0.8, 3.0)
    } else {
        1.0
    };
    snap_to_grid((font_size_px * spacing).max(1.0))
}

pub(crate) fn snap_to_grid(px: f64) -> f64 {
    (px * HEIGHT_GRID_STEPS_PER_PX).round() / HEIGHT_GRID_STEPS_PER_PX
}

pub(crate) fn sanitize_width(width: f64) -> f64 {
    if width.is_finite() { width.max(0.0) } else { 0.0 }
}

/// Estimated pixel height of one paragraph.
///
/// With an unknown viewport width (zero) the estimate is exactly one line.
pub fn estimate_height(
    text: &str,
    viewport_width_px: f64,
    font_size_px: f64,
    line_height_px: f64,
    char_advance_px: f64,
    padding_px: f64,
) -> f64 {
    if !(viewport_width_px.is_finite() && viewport_width_px > 0.0) {
        return line_height_px;
    }

    let glyph_px = (font_size_px + char_advance_px).max(0.0);
    let mut rows = 0.0f64;
    for line in text.split('\n') {
        let collapsed = RE_WHITESPACE_RUN.replace_all(line.trim(), " ");
        let chars = collapsed.chars().count();
        if chars == 0 {
            continue;
        }
        rows += ((chars as f64 * glyph_px) / viewport_width_px).ceil().max(1.0);
    }

    snap_to_grid(rows.max(1.0) * line_height_px + padding_px.max(0.0))
}
