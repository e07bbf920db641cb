use super::super::ReaderSession;
use super::Effect;
use crate::chapters;
use tracing::{info, warn};

impl ReaderSession {
    pub(super) fn handle_go_to_chapter(&mut self, chapter: usize, effects: &mut Vec<Effect>) {
        let count = self.document.chapter_count();
        if chapter >= count {
            warn!(chapter, count, "Ignoring jump to unknown chapter");
            return;
        }
        let offset = chapters::chapter_offset(&self.document, chapter);
        info!(
            chapter,
            title = self.chapter_titles.get(chapter).map(String::as_str).unwrap_or(""),
            offset,
            "Navigated to chapter"
        );
        self.seek(offset, false, effects);
    }

    pub(super) fn handle_previous_chapter(&mut self, effects: &mut Vec<Effect>) {
        if let Some(target) = chapters::previous_chapter(&self.document, self.reading_offset()) {
            self.handle_go_to_chapter(target, effects);
        }
    }

    pub(super) fn handle_next_chapter(&mut self, effects: &mut Vec<Effect>) {
        if let Some(target) = chapters::next_chapter(&self.document, self.reading_offset()) {
            self.handle_go_to_chapter(target, effects);
        }
    }
}
