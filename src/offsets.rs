//! Cumulative paragraph offsets and the viewport window derived from them.
//!
//! Scrolling, chapter navigation and speech all look positions up here, so
//! every lookup shares one tie-break: the first paragraph whose offset is
//! strictly greater than the query.

/// Vertical start of each paragraph in the unvirtualized document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetIndex {
    offsets: Vec<f64>,
    total_height: f64,
}

/// Half-open range of paragraph indices to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRange {
    pub start: usize,
    pub end: usize,
}

impl WindowRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

impl OffsetIndex {
    pub fn from_heights(heights: &[f64]) -> Self {
        let mut offsets = Vec::with_capacity(heights.len());
        let mut acc = 0.0f64;
        for &height in heights {
            offsets.push(acc);
            acc += height;
        }
        Self {
            offsets,
            total_height: acc,
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    pub fn offset(&self, index: usize) -> Option<f64> {
        self.offsets.get(index).copied()
    }

    pub fn total_height(&self) -> f64 {
        self.total_height
    }

    /// Index of the first paragraph whose offset is strictly greater than `position`.
    pub fn first_after(&self, position: f64) -> Option<usize> {
        let idx = self.offsets.partition_point(|&offset| offset <= position);
        (idx < self.offsets.len()).then_some(idx)
    }

    /// Paragraph with the greatest offset not past `position`, i.e. the one at the top of the viewport.
    pub fn paragraph_at(&self, position: f64) -> Option<usize> {
        self.offsets
            .partition_point(|&offset| offset <= position)
            .checked_sub(1)
    }

    /// Largest scroll offset the reader accepts.
    ///
    /// Includes trailing slack so the last paragraph can reach the top of the viewport.
    pub fn max_scroll(&self, viewport_height: f64) -> f64 {
        let last = self.offsets.last().copied().unwrap_or(0.0);
        (self.total_height - viewport_height.max(0.0)).max(last).max(0.0)
    }

    pub fn window(&self, scroll_top: f64, viewport_height: f64, buffer: usize) -> WindowRange {
        let count = self.offsets.len();
        if count == 0 {
            return WindowRange { start: 0, end: 0 };
        }

        let start = match self.first_after(scroll_top) {
            Some(idx) => idx.saturating_sub(buffer),
            None => count - 1,
        };
        let bottom = scroll_top + viewport_height.max(0.0);
        let end = match self.first_after(bottom) {
            Some(idx) => (idx + buffer).min(count),
            None => count,
        };

        WindowRange {
            start,
            end: end.max(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> OffsetIndex {
        OffsetIndex::from_heights(&[10.0, 20.0, 30.0, 40.0, 50.0])
    }

    #[test]
    fn offsets_are_cumulative() {
        let heights = [12.5, 3.0, 40.0, 1.0];
        let index = OffsetIndex::from_heights(&heights);
        assert_eq!(index.len(), heights.len());
        assert_eq!(index.offset(0), Some(0.0));
        for i in 0..heights.len() - 1 {
            let delta = index.offsets()[i + 1] - index.offsets()[i];
            assert_eq!(delta, heights[i]);
        }
        assert_eq!(index.total_height(), 56.5);
    }

    #[test]
    fn empty_index_has_empty_window() {
        let index = OffsetIndex::from_heights(&[]);
        assert!(index.window(0.0, 100.0, 3).is_empty());
        assert_eq!(index.paragraph_at(0.0), None);
        assert_eq!(index.max_scroll(100.0), 0.0);
    }

    #[test]
    fn lookups_break_ties_past_the_boundary() {
        let index = index();
        // offsets: 0, 10, 30, 60, 100
        assert_eq!(index.first_after(10.0), Some(2));
        assert_eq!(index.first_after(9.9), Some(1));
        assert_eq!(index.first_after(100.0), None);
        assert_eq!(index.paragraph_at(10.0), Some(1));
        assert_eq!(index.paragraph_at(29.0), Some(1));
        assert_eq!(index.paragraph_at(-5.0), None);
    }

    #[test]
    fn window_applies_buffer_on_both_sides() {
        let index = index();
        assert_eq!(index.window(35.0, 30.0, 0), WindowRange { start: 3, end: 4 });
        assert_eq!(index.window(35.0, 30.0, 1), WindowRange { start: 2, end: 5 });
        assert_eq!(index.window(0.0, 5.0, 10), WindowRange { start: 0, end: 5 });
    }

    #[test]
    fn window_collapses_to_last_paragraph_past_the_end() {
        let index = index();
        let range = index.window(150.0, 40.0, 2);
        assert_eq!(range, WindowRange { start: 4, end: 5 });
        assert!(range.contains(4));
    }

    #[test]
    fn window_is_bounded_and_monotonic() {
        let heights: Vec<f64> = (0..200).map(|i| 10.0 + (i % 7) as f64 * 13.0).collect();
        let index = OffsetIndex::from_heights(&heights);
        let mut last = WindowRange { start: 0, end: 0 };
        let mut scroll = 0.0;
        while scroll <= index.total_height() {
            let range = index.window(scroll, 480.0, 4);
            assert!(range.start <= range.end);
            assert!(range.end <= index.len());
            assert!(range.start >= last.start);
            assert!(range.end >= last.end);
            last = range;
            scroll += 7.3;
        }
    }

    #[test]
    fn max_scroll_leaves_room_for_last_paragraph() {
        let index = index();
        assert_eq!(index.max_scroll(20.0), 130.0);
        assert_eq!(index.max_scroll(400.0), 100.0);
    }
}
