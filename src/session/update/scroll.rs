use super::super::{ReaderSession, RestoreTarget};
use super::Effect;
use crate::book::{Chapter, normalize_chapters};
use crate::layout::{LayoutMetrics, MAX_FONT_SIZE, MIN_FONT_SIZE, sanitize_width};
use crate::progress::sanitize_scroll;
use tracing::{debug, info};

impl ReaderSession {
    pub(super) fn handle_scrolled(&mut self, position: f64, effects: &mut Vec<Effect>) {
        if self.pending_restore.is_some() {
            debug!(position, "Ignoring scroll before the saved position is restored");
            return;
        }
        if self
            .progress
            .on_scroll(position, self.document.index(), self.viewport_height)
        {
            effects.push(Effect::RequestFrame);
        }
    }

    pub(super) fn handle_frame_tick(&mut self, effects: &mut Vec<Effect>) {
        if let Some(patch) = self.progress.on_frame() {
            effects.push(Effect::PersistProgress(patch));
        }
    }

    pub(super) fn handle_resized(&mut self, width: f64, height: f64, effects: &mut Vec<Effect>) {
        self.viewport_height = sanitize_width(height);
        let metrics = self.config.layout_metrics(width);
        self.relayout_keeping_anchor(metrics, effects);

        if metrics.viewport_width_px > 0.0
            && let Some(target) = self.pending_restore.take()
        {
            self.restore(target, effects);
        } else if self.pending_restore.is_none() {
            let current = self.progress.scroll_top();
            self.progress
                .set_position(current, self.document.index(), self.viewport_height);
        }
    }

    fn restore(&mut self, target: RestoreTarget, effects: &mut Vec<Effect>) {
        match target {
            RestoreTarget::Offset(saved) => {
                self.progress
                    .set_position(saved, self.document.index(), self.viewport_height);
                info!(
                    saved,
                    restored = self.progress.scroll_top(),
                    percent = self.progress.percent(),
                    "Restored reading position"
                );
                effects.push(Effect::ScrollTo {
                    offset_px: self.progress.scroll_top(),
                    smooth: false,
                });
            }
            RestoreTarget::Paragraph { index, fraction } => {
                let target = self.offset_within(index, fraction);
                info!(paragraph = index, offset = target, "Applied navigation made before layout");
                self.seek(target, false, effects);
            }
        }
    }

    pub(super) fn handle_content_replaced(
        &mut self,
        content: &str,
        chapters: Vec<Chapter>,
        effects: &mut Vec<Effect>,
    ) {
        // Paragraph indices shift, so any spoken position is meaningless now.
        if let Some(engine) = self.engine.as_deref_mut() {
            let events = self.speech.stop(engine);
            self.apply_speech_events(events, effects);
        }
        let chapters = normalize_chapters(content, &chapters);
        let offsets: Vec<usize> = chapters.iter().map(|chapter| chapter.char_offset).collect();
        self.document.replace_content(content, &offsets);
        self.chapter_titles = chapters.into_iter().map(|chapter| chapter.title).collect();
        info!(
            paragraphs = self.document.paragraphs().len(),
            chapters = self.chapter_titles.len(),
            "Replaced book content"
        );
        if self.pending_restore.is_none() {
            let current = self.progress.scroll_top();
            self.seek(current, false, effects);
        }
    }

    pub(super) fn handle_font_size_changed(&mut self, size: u32, effects: &mut Vec<Effect>) {
        let clamped = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        if clamped != self.config.font_size {
            debug!(old = self.config.font_size, new = clamped, "Font size changed");
            self.config.font_size = clamped;
            let metrics = self
                .config
                .layout_metrics(self.document.metrics().viewport_width_px);
            self.relayout_keeping_anchor(metrics, effects);
        }
    }

    pub(super) fn handle_line_spacing_changed(&mut self, spacing: f64, effects: &mut Vec<Effect>) {
        if !spacing.is_finite() {
            return;
        }
        let clamped = spacing.clamp(0.8, 3.0);
        if (clamped - self.config.line_spacing).abs() > f64::EPSILON {
            self.config.line_spacing = clamped;
            debug!(line_spacing = clamped, "Line spacing changed");
            let metrics = self
                .config
                .layout_metrics(self.document.metrics().viewport_width_px);
            self.relayout_keeping_anchor(metrics, effects);
        }
    }

    /// Rebuild heights and keep the paragraph at the top of the viewport in place.
    fn relayout_keeping_anchor(&mut self, metrics: LayoutMetrics, effects: &mut Vec<Effect>) {
        let scroll_top = self.progress.scroll_top();
        let anchor = self.anchor_at(scroll_top);

        if !self.document.relayout(metrics) {
            return;
        }
        if self.pending_restore.is_some() {
            return;
        }

        let target = match anchor {
            Some((idx, fraction)) => self.offset_within(idx, fraction),
            None => 0.0,
        };
        let target = sanitize_scroll(target);
        if (target - scroll_top).abs() > f64::EPSILON {
            debug!(from = scroll_top, to = target, "Re-anchored after relayout");
            self.seek(target, false, effects);
        } else {
            self.progress
                .set_position(target, self.document.index(), self.viewport_height);
        }
    }
}
