//! Chapter ⇄ offset mapping on top of the offset index.

use crate::document::Document;

#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub index: usize,
    pub title: String,
    /// `None` for chapters without visible text.
    pub offset_px: Option<f64>,
}

/// Chapter of the paragraph at the top of the viewport.
pub fn current_chapter(document: &Document, scroll_top: f64) -> Option<usize> {
    let idx = document.index().paragraph_at(scroll_top)?;
    document.paragraph(idx)?.chapter_index
}

/// First paragraph tagged with `chapter`, if the chapter has any text.
pub fn first_paragraph(document: &Document, chapter: usize) -> Option<usize> {
    let paragraphs = document.paragraphs();
    let idx = paragraphs.partition_point(|p| p.chapter_index < Some(chapter));
    paragraphs
        .get(idx)
        .filter(|p| p.chapter_index == Some(chapter))
        .map(|_| idx)
}

/// Scroll target for a chapter jump. Chapters with no paragraphs land at the top.
pub fn chapter_offset(document: &Document, chapter: usize) -> f64 {
    first_paragraph(document, chapter)
        .and_then(|idx| document.index().offset(idx))
        .unwrap_or(0.0)
}

pub fn previous_chapter(document: &Document, scroll_top: f64) -> Option<usize> {
    step(document, scroll_top, -1)
}

pub fn next_chapter(document: &Document, scroll_top: f64) -> Option<usize> {
    step(document, scroll_top, 1)
}

fn step(document: &Document, scroll_top: f64, delta: isize) -> Option<usize> {
    let count = document.chapter_count();
    if count == 0 {
        return None;
    }
    // From the preamble both directions go to the first chapter.
    let Some(current) = current_chapter(document, scroll_top) else {
        return Some(0);
    };
    let target = (current as isize + delta).clamp(0, count as isize - 1);
    Some(target as usize)
}

pub fn table_of_contents(document: &Document, titles: &[String]) -> Vec<TocEntry> {
    titles
        .iter()
        .take(document.chapter_count())
        .enumerate()
        .map(|(index, title)| TocEntry {
            index,
            title: title.clone(),
            offset_px: first_paragraph(document, index)
                .and_then(|idx| document.index().offset(idx)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutMetrics;

    fn document() -> Document {
        // Chapter 1 has only blank lines.
        let content = "Prologue\nCh A\nalpha\n\n\n\nCh C\ngamma\ndelta";
        let offsets = [9, 20, 23];
        Document::new(content, &offsets, LayoutMetrics::new(320.0, 16, 1.5))
    }

    #[test]
    fn go_to_then_current_round_trips() {
        let doc = document();
        for chapter in 0..doc.chapter_count() {
            if first_paragraph(&doc, chapter).is_none() {
                continue;
            }
            let offset = chapter_offset(&doc, chapter);
            assert_eq!(current_chapter(&doc, offset), Some(chapter));
        }
    }

    #[test]
    fn empty_chapter_lands_at_top() {
        let doc = document();
        assert_eq!(first_paragraph(&doc, 1), None);
        assert_eq!(chapter_offset(&doc, 1), 0.0);
        assert_eq!(chapter_offset(&doc, 99), 0.0);
    }

    #[test]
    fn preamble_has_no_chapter() {
        let doc = document();
        assert_eq!(current_chapter(&doc, 0.0), None);
        assert_eq!(next_chapter(&doc, 0.0), Some(0));
        assert_eq!(previous_chapter(&doc, 0.0), Some(0));
    }

    #[test]
    fn stepping_clamps_to_chapter_range() {
        let doc = document();
        let last = chapter_offset(&doc, 2);
        assert_eq!(next_chapter(&doc, last), Some(2));
        assert_eq!(previous_chapter(&doc, last), Some(1));
        let first = chapter_offset(&doc, 0);
        assert_eq!(previous_chapter(&doc, first), Some(0));
    }

    #[test]
    fn no_chapters_means_no_navigation() {
        let doc = Document::new("plain\ntext", &[], LayoutMetrics::new(320.0, 16, 1.5));
        assert_eq!(next_chapter(&doc, 0.0), None);
        assert_eq!(current_chapter(&doc, 0.0), None);
    }

    #[test]
    fn toc_lists_every_chapter() {
        let doc = document();
        let titles = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let toc = table_of_contents(&doc, &titles);
        assert_eq!(toc.len(), 3);
        assert!(toc[0].offset_px.is_some());
        assert_eq!(toc[1].offset_px, None);
        assert_eq!(toc[2].title, "C");
    }
}
