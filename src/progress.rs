//! Reading position tracking and throttled persistence.
//!
//! Scroll events update the in-memory position immediately. Writes to the
//! book store are coalesced: the first event after a write asks the host for
//! an animation frame, and the frame performs a single write carrying the
//! latest position. Teardown flushes unconditionally.

use crate::book::{BookId, ProgressPatch};
use crate::offsets::OffsetIndex;
use crate::store::BookStore;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    scroll_top: f64,
    percent: u8,
    write_scheduled: bool,
}

impl ProgressTracker {
    /// Start from a persisted position. Clamping waits until the layout is known.
    pub fn restore(progress_px: f64, percent: u8) -> Self {
        Self {
            scroll_top: sanitize_scroll(progress_px),
            percent: percent.min(100),
            write_scheduled: false,
        }
    }

    /// Record a new position. Returns `true` when the host must schedule a frame.
    pub fn on_scroll(&mut self, raw: f64, index: &OffsetIndex, viewport_height: f64) -> bool {
        self.set_position(raw, index, viewport_height);
        if self.write_scheduled {
            return false;
        }
        self.write_scheduled = true;
        true
    }

    /// Set the position without touching the write schedule.
    pub fn set_position(&mut self, raw: f64, index: &OffsetIndex, viewport_height: f64) {
        let max = index.max_scroll(viewport_height);
        self.scroll_top = sanitize_scroll(raw).min(max);
        self.percent = percent_for(self.scroll_top, index.total_height(), viewport_height);
    }

    /// The animation frame arrived: hand out the pending write, if any.
    pub fn on_frame(&mut self) -> Option<ProgressPatch> {
        if !self.write_scheduled {
            return None;
        }
        self.write_scheduled = false;
        Some(self.patch())
    }

    /// Current position for the teardown write, regardless of throttle state.
    pub fn flush(&mut self) -> ProgressPatch {
        self.write_scheduled = false;
        self.patch()
    }

    pub fn patch(&self) -> ProgressPatch {
        ProgressPatch {
            progress_px: self.scroll_top,
            percent: self.percent,
        }
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn write_scheduled(&self) -> bool {
        self.write_scheduled
    }
}

/// Completion percentage. Content shorter than the viewport divides by one.
pub fn percent_for(scroll_top: f64, total_height: f64, viewport_height: f64) -> u8 {
    let scrollable = (total_height - viewport_height).max(1.0);
    let ratio = (sanitize_scroll(scroll_top) / scrollable).clamp(0.0, 1.0);
    (ratio * 100.0).round() as u8
}

pub fn sanitize_scroll(raw: f64) -> f64 {
    if raw.is_finite() { raw.max(0.0) } else { 0.0 }
}

/// Write a progress patch. Failures are logged and not retried.
pub fn persist(store: &mut dyn BookStore, id: &BookId, patch: ProgressPatch) -> bool {
    match store.update(id, patch) {
        Ok(()) => {
            debug!(
                book = %id,
                progress_px = patch.progress_px,
                percent = patch.percent,
                "Saved reading position"
            );
            true
        }
        Err(err) => {
            warn!(book = %id, "Failed to persist reading position: {err:#}");
            false
        }
    }
}
