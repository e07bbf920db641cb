use super::{ReaderSession, RestoreTarget};
use crate::book::{Chapter, ProgressPatch};
use crate::speech::{SpeechEvent, UtteranceOutcome, UtteranceTicket};
use tracing::debug;

mod navigation;
mod scroll;
mod speech;

/// Input events from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Scrolled(f64),
    FrameTick,
    Resized { width: f64, height: f64 },
    /// New text for the open book. Chapters always come with it.
    ContentReplaced { content: String, chapters: Vec<Chapter> },
    FontSizeChanged(u32),
    LineSpacingChanged(f64),
    GoToChapter(usize),
    PreviousChapter,
    NextChapter,
    StartReading,
    PauseReading,
    ResumeReading,
    StopReading,
    SkipForward,
    SkipBackward,
    JumpToCurrentAudio,
    AutoScrollTtsChanged(bool),
    UtteranceFinished {
        ticket: UtteranceTicket,
        outcome: UtteranceOutcome,
    },
}

/// Describes work that must be performed outside the pure reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call back with [`Message::FrameTick`] on the next animation frame.
    RequestFrame,
    /// Fire-and-forget store write.
    PersistProgress(ProgressPatch),
    ScrollTo { offset_px: f64, smooth: bool },
    Highlight(Option<usize>),
    Notice(String),
}

impl ReaderSession {
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::Scrolled(position) => self.handle_scrolled(position, &mut effects),
            Message::FrameTick => self.handle_frame_tick(&mut effects),
            Message::Resized { width, height } => self.handle_resized(width, height, &mut effects),
            Message::ContentReplaced { content, chapters } => {
                self.handle_content_replaced(&content, chapters, &mut effects)
            }
            Message::FontSizeChanged(size) => self.handle_font_size_changed(size, &mut effects),
            Message::LineSpacingChanged(spacing) => {
                self.handle_line_spacing_changed(spacing, &mut effects)
            }
            Message::GoToChapter(chapter) => self.handle_go_to_chapter(chapter, &mut effects),
            Message::PreviousChapter => self.handle_previous_chapter(&mut effects),
            Message::NextChapter => self.handle_next_chapter(&mut effects),
            Message::StartReading => self.handle_start_reading(&mut effects),
            Message::PauseReading => self.handle_pause_reading(),
            Message::ResumeReading => self.handle_resume_reading(&mut effects),
            Message::StopReading => self.handle_stop_reading(&mut effects),
            Message::SkipForward => self.handle_skip(true, &mut effects),
            Message::SkipBackward => self.handle_skip(false, &mut effects),
            Message::JumpToCurrentAudio => self.handle_jump_to_current_audio(&mut effects),
            Message::AutoScrollTtsChanged(enabled) => {
                self.handle_auto_scroll_tts_changed(enabled, &mut effects)
            }
            Message::UtteranceFinished { ticket, outcome } => {
                self.handle_utterance_finished(ticket, outcome, &mut effects)
            }
        }

        effects
    }

    /// Move the reading position and ask for a throttled write.
    fn seek(&mut self, offset_px: f64, smooth: bool, effects: &mut Vec<Effect>) {
        if self.pending_restore.is_some() {
            // Heights are placeholders until the first layout; remember the
            // paragraph instead and land on it once the layout is real.
            if let Some((index, fraction)) = self.anchor_at(offset_px) {
                debug!(paragraph = index, "Deferred seek until first layout");
                self.pending_restore = Some(RestoreTarget::Paragraph { index, fraction });
            }
            return;
        }
        if self
            .progress
            .on_scroll(offset_px, self.document.index(), self.viewport_height)
        {
            effects.push(Effect::RequestFrame);
        }
        effects.push(Effect::ScrollTo {
            offset_px: self.progress.scroll_top(),
            smooth,
        });
    }

    fn apply_speech_events(&mut self, events: Vec<SpeechEvent>, effects: &mut Vec<Effect>) {
        for event in events {
            match event {
                SpeechEvent::ScrollTo { offset_px, smooth } => self.seek(offset_px, smooth, effects),
                SpeechEvent::Highlight(paragraph) => {
                    self.highlight = paragraph;
                    effects.push(Effect::Highlight(paragraph));
                }
                SpeechEvent::Notice(text) => effects.push(Effect::Notice(text)),
            }
        }
    }
}
