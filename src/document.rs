//! The segment → estimate → index pipeline for one open book.
//!
//! Each stage is re-run only when one of its inputs changes: new content or
//! chapters re-segment, new metrics re-estimate heights. The offset index is
//! rebuilt synchronously before this returns, so readers never see a stale
//! index.

use crate::layout::LayoutMetrics;
use crate::offsets::OffsetIndex;
use crate::segmenter::{Paragraph, segment};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
    chapter_count: usize,
    heights: Vec<f64>,
    index: OffsetIndex,
    metrics: LayoutMetrics,
}

impl Document {
    pub fn new(content: &str, chapter_offsets: &[usize], metrics: LayoutMetrics) -> Self {
        let mut document = Self {
            paragraphs: Vec::new(),
            chapter_count: 0,
            heights: Vec::new(),
            index: OffsetIndex::default(),
            metrics,
        };
        document.replace_content(content, chapter_offsets);
        document
    }

    /// Re-segment from scratch. Content and chapter offsets always travel together.
    pub fn replace_content(&mut self, content: &str, chapter_offsets: &[usize]) {
        self.paragraphs = segment(content, chapter_offsets);
        self.chapter_count = chapter_offsets.len();
        debug!(
            paragraphs = self.paragraphs.len(),
            chapters = self.chapter_count,
            "Segmented content"
        );
        self.reestimate();
    }

    /// Apply new layout inputs. Returns `false` when nothing changed.
    pub fn relayout(&mut self, metrics: LayoutMetrics) -> bool {
        if metrics == self.metrics {
            return false;
        }
        self.metrics = metrics;
        self.reestimate();
        true
    }

    fn reestimate(&mut self) {
        self.heights = self
            .paragraphs
            .iter()
            .map(|paragraph| self.metrics.estimate(&paragraph.text))
            .collect();
        self.index = OffsetIndex::from_heights(&self.heights);
        debug!(
            total_height = self.index.total_height(),
            width = self.metrics.viewport_width_px,
            font_size = self.metrics.font_size_px,
            "Rebuilt offset index"
        );
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn index(&self) -> &OffsetIndex {
        &self.index
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn chapter_count(&self) -> usize {
        self.chapter_count
    }
}
