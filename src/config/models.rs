use crate::layout::{
    DEFAULT_CHAR_ADVANCE_PX, DEFAULT_PARAGRAPH_PADDING_PX, LayoutMetrics, MAX_FONT_SIZE,
    MIN_FONT_SIZE,
};
use crate::speech::DEFAULT_MAX_CHUNK_CHARS;
use crate::store::DEFAULT_STORE_DIR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) const DEFAULT_FONT_SIZE: u32 = 16;
pub(crate) const DEFAULT_LINE_SPACING: f64 = 1.6;
pub(crate) const DEFAULT_BUFFER_PARAGRAPHS: usize = 8;
const MAX_BUFFER_PARAGRAPHS: usize = 256;
const MIN_CHUNK_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub font_size: u32,
    pub line_spacing: f64,
    pub char_advance_px: f64,
    pub paragraph_padding_px: f64,
    pub buffer_paragraphs: usize,
    pub store_dir: String,
    pub max_chunk_chars: usize,
    pub auto_scroll_tts: bool,
    pub smooth_scroll_tts: bool,
    pub normalizer: NormalizerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            line_spacing: DEFAULT_LINE_SPACING,
            char_advance_px: DEFAULT_CHAR_ADVANCE_PX,
            paragraph_padding_px: DEFAULT_PARAGRAPH_PADDING_PX,
            buffer_paragraphs: DEFAULT_BUFFER_PARAGRAPHS,
            store_dir: DEFAULT_STORE_DIR.to_string(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            auto_scroll_tts: true,
            smooth_scroll_tts: true,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Clamp values that came from disk into the ranges the reader supports.
    pub fn sanitized(mut self) -> Self {
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.line_spacing = if self.line_spacing.is_finite() {
            self.line_spacing.clamp(0.8, 3.0)
        } else {
            DEFAULT_LINE_SPACING
        };
        if !self.char_advance_px.is_finite() || self.char_advance_px < 0.0 {
            self.char_advance_px = DEFAULT_CHAR_ADVANCE_PX;
        }
        if !self.paragraph_padding_px.is_finite() || self.paragraph_padding_px < 0.0 {
            self.paragraph_padding_px = DEFAULT_PARAGRAPH_PADDING_PX;
        }
        self.buffer_paragraphs = self.buffer_paragraphs.min(MAX_BUFFER_PARAGRAPHS);
        self.max_chunk_chars = self.max_chunk_chars.max(MIN_CHUNK_CHARS);
        self
    }

    pub fn tts(&self) -> TtsConfig {
        TtsConfig {
            max_chunk_chars: self.max_chunk_chars,
            auto_scroll: self.auto_scroll_tts,
            smooth_scroll: self.smooth_scroll_tts,
        }
    }

    pub fn layout_metrics(&self, viewport_width_px: f64) -> LayoutMetrics {
        let mut metrics = LayoutMetrics::new(viewport_width_px, self.font_size, self.line_spacing);
        metrics.char_advance_px = self.char_advance_px;
        metrics.paragraph_padding_px = self.paragraph_padding_px;
        metrics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub max_chunk_chars: usize,
    pub auto_scroll: bool,
    pub smooth_scroll: bool,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            auto_scroll: true,
            smooth_scroll: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub enabled: bool,
    pub collapse_whitespace: bool,
    pub remove_space_before_punctuation: bool,
    pub strip_inline_code: bool,
    pub strip_markdown_links: bool,
    pub drop_numeric_bracket_citations: bool,
    pub drop_parenthetical_numeric_citations: bool,
    pub drop_square_bracket_text: bool,
    pub drop_curly_brace_text: bool,
    pub require_alphanumeric: bool,
    pub drop_tokens: Vec<String>,
    pub replacements: BTreeMap<String, String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let mut replacements = BTreeMap::new();
        replacements.insert("#".to_string(), " ".to_string());

        Self {
            enabled: true,
            collapse_whitespace: true,
            remove_space_before_punctuation: true,
            strip_inline_code: true,
            strip_markdown_links: true,
            drop_numeric_bracket_citations: true,
            drop_parenthetical_numeric_citations: true,
            drop_square_bracket_text: false,
            drop_curly_brace_text: false,
            require_alphanumeric: true,
            drop_tokens: Vec::new(),
            replacements,
        }
    }
}
