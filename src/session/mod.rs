//! One open book: document pipeline, reading position and speech, owned together.
//!
//! The host feeds [`Message`]s in and runs the [`Effect`]s that come back
//! (scrolling the surface, scheduling a frame, writing progress). Nothing here
//! captures ambient state; every handler works on the session it is given.

mod update;

pub use update::{Effect, Message};

use crate::book::{BookId, ProgressPatch};
use crate::chapters::{self, TocEntry};
use crate::config::AppConfig;
use crate::document::Document;
use crate::offsets::WindowRange;
use crate::progress::{self, ProgressTracker};
use crate::segmenter::Paragraph;
use crate::speech::{SpeechEngine, SpeechNormalizer, SpeechSequencer, SpeechState};
use crate::store::BookStore;
use anyhow::{Context, Result, bail};
use tracing::{info, warn};

/// Where to land once the first real layout arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RestoreTarget {
    /// The persisted pixel offset.
    Offset(f64),
    /// A paragraph chosen before layout, by navigation or speech.
    Paragraph { index: usize, fraction: f64 },
}

pub struct ReaderSession {
    book_id: BookId,
    title: String,
    chapter_titles: Vec<String>,
    config: AppConfig,
    document: Document,
    progress: ProgressTracker,
    viewport_height: f64,
    pending_restore: Option<RestoreTarget>,
    speech: SpeechSequencer,
    engine: Option<Box<dyn SpeechEngine>>,
    highlight: Option<usize>,
}

impl ReaderSession {
    /// Load a book and build its document. Fails when the book does not exist.
    ///
    /// The saved position is applied on the first [`Message::Resized`] with a
    /// known width, once heights mean something.
    pub fn open(store: &dyn BookStore, id: &BookId, config: AppConfig) -> Result<Self> {
        let Some(book) = store
            .get(id)
            .with_context(|| format!("Failed to load book {id}"))?
        else {
            bail!("book {id} not found");
        };

        let offsets = book.chapter_offsets();
        let chapter_titles = book.chapter_titles();
        let document = Document::new(&book.content, &offsets, config.layout_metrics(0.0));
        let progress = ProgressTracker::restore(book.progress_px, book.percent);
        let speech = SpeechSequencer::new(&config.tts(), SpeechNormalizer::new(config.normalizer.clone()));

        info!(
            book = %id,
            title = %book.title,
            paragraphs = document.paragraphs().len(),
            chapters = offsets.len(),
            progress_px = progress.scroll_top(),
            "Opened book"
        );

        Ok(Self {
            book_id: book.id,
            title: book.title,
            chapter_titles,
            pending_restore: (progress.scroll_top() > 0.0)
                .then(|| RestoreTarget::Offset(progress.scroll_top())),
            config,
            document,
            progress,
            viewport_height: 0.0,
            speech,
            engine: None,
            highlight: None,
        })
    }

    pub fn with_speech_engine(mut self, engine: Box<dyn SpeechEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Stop speech and write the current position, waiting for the store.
    pub fn close(mut self, store: &mut dyn BookStore) -> Result<()> {
        self.stop_speech();
        let patch = self.progress.flush();
        store
            .update(&self.book_id, patch)
            .inspect(|()| {
                info!(
                    book = %self.book_id,
                    progress_px = patch.progress_px,
                    percent = patch.percent,
                    "Flushed reading position"
                )
            })
            .inspect_err(|err| warn!(book = %self.book_id, "Failed to flush reading position: {err:#}"))
    }

    /// Run a persistence effect against the store. Failures are logged only.
    pub fn persist(&self, store: &mut dyn BookStore, patch: ProgressPatch) -> bool {
        progress::persist(store, &self.book_id, patch)
    }

    fn stop_speech(&mut self) {
        if let Some(engine) = self.engine.as_deref_mut() {
            self.speech.stop(engine);
        }
        self.highlight = None;
    }

    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn scroll_top(&self) -> f64 {
        self.progress.scroll_top()
    }

    pub fn percent(&self) -> u8 {
        self.progress.percent()
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    /// Height the host should give its scroll content so every offset is reachable.
    pub fn scroll_extent(&self) -> f64 {
        self.document.index().max_scroll(self.viewport_height) + self.viewport_height
    }

    pub fn window(&self) -> WindowRange {
        self.document.index().window(
            self.progress.scroll_top(),
            self.viewport_height,
            self.config.buffer_paragraphs,
        )
    }

    /// Paragraphs to materialize, with their index and vertical offset.
    pub fn visible_paragraphs(&self) -> impl Iterator<Item = (usize, f64, &Paragraph)> + '_ {
        let range = self.window();
        let offsets = self.document.index().offsets();
        let paragraphs = self.document.paragraphs();
        (range.start..range.end).map(move |idx| (idx, offsets[idx], &paragraphs[idx]))
    }

    pub fn current_chapter(&self) -> Option<usize> {
        chapters::current_chapter(&self.document, self.reading_offset())
    }

    /// Position that navigation and speech start from. Before the first
    /// layout this follows a paragraph chosen in the meantime.
    fn reading_offset(&self) -> f64 {
        match self.pending_restore {
            Some(RestoreTarget::Paragraph { index, fraction }) => self.offset_within(index, fraction),
            _ => self.progress.scroll_top(),
        }
    }

    /// Paragraph under `offset_px` and how far into it the offset falls.
    fn anchor_at(&self, offset_px: f64) -> Option<(usize, f64)> {
        let index = self.document.index();
        index.paragraph_at(offset_px).map(|idx| {
            let start = index.offsets()[idx];
            let height = self.document.heights()[idx].max(f64::EPSILON);
            (idx, ((offset_px - start) / height).clamp(0.0, 1.0))
        })
    }

    fn offset_within(&self, paragraph: usize, fraction: f64) -> f64 {
        match (
            self.document.index().offsets().get(paragraph),
            self.document.heights().get(paragraph),
        ) {
            (Some(start), Some(height)) => start + fraction * height,
            _ => 0.0,
        }
    }

    pub fn current_chapter_title(&self) -> Option<&str> {
        self.current_chapter()
            .and_then(|idx| self.chapter_titles.get(idx))
            .map(String::as_str)
    }

    pub fn table_of_contents(&self) -> Vec<TocEntry> {
        chapters::table_of_contents(&self.document, &self.chapter_titles)
    }

    pub fn speech_state(&self) -> SpeechState {
        self.speech.state()
    }

    pub fn speaking_paragraph(&self) -> Option<usize> {
        self.speech.current_paragraph()
    }

    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        if self.speech.is_active() {
            self.stop_speech();
        }
    }
}
