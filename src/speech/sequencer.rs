//! Paragraph-by-paragraph speech playback.
//!
//! Playback is an explicit queue: entering a paragraph enqueues its chunks,
//! each completion report pops and speaks the next one, and an empty queue
//! moves on to the next paragraph. Every session gets a fresh number; a
//! completion carrying an older number (or any ticket other than the one in
//! flight) is ignored, which is all `stop()` needs to cut a session short.

use super::chunker::split_chunks;
use super::engine::{SpeechEngine, Utterance, UtteranceOutcome, UtteranceTicket};
use super::normalizer::SpeechNormalizer;
use crate::config::TtsConfig;
use crate::document::Document;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

pub const SPEECH_UNAVAILABLE_NOTICE: &str = "Text-to-speech is unavailable on this device.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Requests for the presentation layer produced while reading.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    ScrollTo { offset_px: f64, smooth: bool },
    Highlight(Option<usize>),
    Notice(String),
}

#[derive(Debug)]
pub struct SpeechSequencer {
    state: SpeechState,
    current_paragraph: Option<usize>,
    pending: VecDeque<String>,
    in_flight: Option<UtteranceTicket>,
    session: u64,
    next_seq: u64,
    spoken_any: bool,
    normalizer: SpeechNormalizer,
    max_chunk_chars: usize,
    auto_scroll: bool,
    smooth_scroll: bool,
}

impl SpeechSequencer {
    pub fn new(config: &TtsConfig, normalizer: SpeechNormalizer) -> Self {
        Self {
            state: SpeechState::Idle,
            current_paragraph: None,
            pending: VecDeque::new(),
            in_flight: None,
            session: 0,
            next_seq: 0,
            spoken_any: false,
            normalizer,
            max_chunk_chars: config.max_chunk_chars.max(1),
            auto_scroll: config.auto_scroll,
            smooth_scroll: config.smooth_scroll,
        }
    }

    pub fn state(&self) -> SpeechState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != SpeechState::Idle
    }

    pub fn current_paragraph(&self) -> Option<usize> {
        self.current_paragraph
    }

    pub fn pending_chunks(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn in_flight(&self) -> Option<UtteranceTicket> {
        self.in_flight
    }

    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
    }

    /// Begin reading at the paragraph under the top of the viewport.
    pub fn start(
        &mut self,
        document: &Document,
        engine: &mut dyn SpeechEngine,
        scroll_top: f64,
    ) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        if self.state != SpeechState::Idle {
            debug!(state = ?self.state, "Ignoring start while a session is active");
            return events;
        }

        engine.cancel();
        self.pending.clear();
        self.in_flight = None;
        self.session = self.session.wrapping_add(1);
        self.spoken_any = false;
        self.current_paragraph = None;
        self.state = SpeechState::Speaking;

        let from = document.index().paragraph_at(scroll_top).unwrap_or(0);
        info!(session = self.session, paragraph = from, "Starting speech");
        if self.enter_paragraph(document, from, &mut events) {
            self.pump_document(document, engine, &mut events);
        }
        events
    }

    pub fn pause(&mut self, engine: &mut dyn SpeechEngine) {
        if self.state != SpeechState::Speaking {
            debug!(state = ?self.state, "Ignoring pause");
            return;
        }
        engine.pause();
        self.state = SpeechState::Paused;
        info!(paragraph = ?self.current_paragraph, "Paused speech");
    }

    pub fn resume(
        &mut self,
        document: &Document,
        engine: &mut dyn SpeechEngine,
    ) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        if self.state != SpeechState::Paused {
            debug!(state = ?self.state, "Ignoring resume");
            return events;
        }
        engine.resume();
        self.state = SpeechState::Speaking;
        info!(paragraph = ?self.current_paragraph, "Resumed speech");
        self.pump_document(document, engine, &mut events);
        events
    }

    /// Cancel playback and clear all session state. Safe to call when idle.
    pub fn stop(&mut self, engine: &mut dyn SpeechEngine) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        if self.state == SpeechState::Idle && self.current_paragraph.is_none() {
            return events;
        }
        engine.cancel();
        self.session = self.session.wrapping_add(1);
        info!("Stopped speech");
        self.reset(&mut events);
        events
    }

    /// The engine finished (or failed) an utterance.
    pub fn on_utterance_finished(
        &mut self,
        ticket: UtteranceTicket,
        outcome: UtteranceOutcome,
        document: &Document,
        engine: &mut dyn SpeechEngine,
    ) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        if ticket.session != self.session || self.in_flight != Some(ticket) {
            debug!(
                session = ticket.session,
                seq = ticket.seq,
                current = self.session,
                "Ignoring stale utterance completion"
            );
            return events;
        }
        self.in_flight = None;
        if let UtteranceOutcome::Failed(reason) = outcome {
            warn!(seq = ticket.seq, "Utterance failed, skipping: {reason}");
        }
        if self.state == SpeechState::Speaking {
            self.pump_document(document, engine, &mut events);
        }
        events
    }

    /// Restart at the next paragraph with speakable text.
    pub fn skip_forward(
        &mut self,
        document: &Document,
        engine: &mut dyn SpeechEngine,
    ) -> Vec<SpeechEvent> {
        let Some(current) = self.current_paragraph.filter(|_| self.is_active()) else {
            return Vec::new();
        };
        self.restart_at(document, engine, current + 1)
    }

    /// Restart at the previous paragraph with speakable text, or the current one at the start.
    pub fn skip_backward(
        &mut self,
        document: &Document,
        engine: &mut dyn SpeechEngine,
    ) -> Vec<SpeechEvent> {
        let Some(current) = self.current_paragraph.filter(|_| self.is_active()) else {
            return Vec::new();
        };
        let target = (0..current)
            .rev()
            .find(|&idx| self.speakable(document, idx).is_some())
            .unwrap_or(current);
        self.restart_at(document, engine, target)
    }

    /// Scroll back to the paragraph being read without touching playback.
    pub fn jump_to_current(&self, document: &Document) -> Option<SpeechEvent> {
        let idx = self.current_paragraph.filter(|_| self.is_active())?;
        let offset_px = document.index().offset(idx)?;
        Some(SpeechEvent::ScrollTo {
            offset_px,
            smooth: self.smooth_scroll,
        })
    }

    fn restart_at(
        &mut self,
        document: &Document,
        engine: &mut dyn SpeechEngine,
        from: usize,
    ) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        engine.cancel();
        if self.state == SpeechState::Paused {
            engine.resume();
        }
        self.session = self.session.wrapping_add(1);
        self.pending.clear();
        self.in_flight = None;
        self.state = SpeechState::Speaking;
        debug!(paragraph = from, "Restarting speech");
        if self.enter_paragraph(document, from, &mut events) {
            self.pump_document(document, engine, &mut events);
        }
        events
    }

    fn pump_document(
        &mut self,
        document: &Document,
        engine: &mut dyn SpeechEngine,
        events: &mut Vec<SpeechEvent>,
    ) {
        while self.state == SpeechState::Speaking && self.in_flight.is_none() {
            if self.pending.is_empty() {
                let from = self.current_paragraph.map_or(0, |idx| idx + 1);
                if !self.enter_paragraph(document, from, events) {
                    return;
                }
            }
            self.pump(engine, events);
        }
    }

    /// Speak queued chunks of the current paragraph until one is in flight or the queue is empty.
    fn pump(&mut self, engine: &mut dyn SpeechEngine, events: &mut Vec<SpeechEvent>) {
        while self.state == SpeechState::Speaking && self.in_flight.is_none() {
            let Some(text) = self.pending.pop_front() else {
                return;
            };
            let ticket = UtteranceTicket {
                session: self.session,
                seq: self.next_seq,
            };
            self.next_seq = self.next_seq.wrapping_add(1);
            let utterance = Utterance {
                ticket,
                paragraph: self.current_paragraph.unwrap_or(0),
                text,
            };
            match engine.speak(&utterance) {
                Ok(()) => {
                    self.in_flight = Some(ticket);
                    self.spoken_any = true;
                }
                Err(err) if !self.spoken_any => {
                    warn!("Speech engine unavailable: {err:#}");
                    engine.cancel();
                    self.session = self.session.wrapping_add(1);
                    events.push(SpeechEvent::Notice(SPEECH_UNAVAILABLE_NOTICE.to_string()));
                    self.reset(events);
                }
                Err(err) => {
                    warn!(seq = ticket.seq, "Failed to queue utterance, skipping: {err:#}");
                }
            }
        }
    }

    /// Load the first paragraph at or after `from` that has speakable text.
    /// Returns `false` (and ends the session) when the book is exhausted.
    fn enter_paragraph(
        &mut self,
        document: &Document,
        from: usize,
        events: &mut Vec<SpeechEvent>,
    ) -> bool {
        for idx in from..document.paragraphs().len() {
            let Some(text) = self.speakable(document, idx) else {
                debug!(paragraph = idx, "Skipping paragraph with nothing to say");
                continue;
            };
            self.pending.extend(split_chunks(&text, self.max_chunk_chars));
            self.current_paragraph = Some(idx);
            if self.auto_scroll {
                if let Some(offset_px) = document.index().offset(idx) {
                    events.push(SpeechEvent::ScrollTo {
                        offset_px,
                        smooth: self.smooth_scroll,
                    });
                }
            }
            events.push(SpeechEvent::Highlight(Some(idx)));
            return true;
        }

        info!("Reached the end of the book");
        self.reset(events);
        false
    }

    fn speakable(&self, document: &Document, idx: usize) -> Option<String> {
        let paragraph = document.paragraph(idx)?;
        self.normalizer.normalize(&paragraph.text)
    }

    fn reset(&mut self, events: &mut Vec<SpeechEvent>) {
        self.state = SpeechState::Idle;
        self.pending.clear();
        self.in_flight = None;
        self.current_paragraph = None;
        events.push(SpeechEvent::Highlight(None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NormalizerConfig, TtsConfig};
    use crate::layout::LayoutMetrics;
    use anyhow::bail;

    #[derive(Default)]
    struct ScriptedEngine {
        spoken: Vec<Utterance>,
        fail_texts: Vec<String>,
        unavailable: bool,
        pauses: usize,
        resumes: usize,
        cancels: usize,
    }

    impl SpeechEngine for ScriptedEngine {
        fn speak(&mut self, utterance: &Utterance) -> anyhow::Result<()> {
            if self.unavailable || self.fail_texts.contains(&utterance.text) {
                bail!("device error");
            }
            self.spoken.push(utterance.clone());
            Ok(())
        }

        fn pause(&mut self) {
            self.pauses += 1;
        }

        fn resume(&mut self) {
            self.resumes += 1;
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }
    }

    fn sequencer() -> SpeechSequencer {
        SpeechSequencer::new(&TtsConfig::default(), SpeechNormalizer::default())
    }

    fn document(text: &str) -> Document {
        Document::new(text, &[], LayoutMetrics::new(400.0, 16, 1.5))
    }

    fn finish_last(
        seq: &mut SpeechSequencer,
        doc: &Document,
        engine: &mut ScriptedEngine,
    ) -> Vec<SpeechEvent> {
        let ticket = engine.spoken.last().expect("something spoken").ticket;
        seq.on_utterance_finished(ticket, UtteranceOutcome::Completed, doc, engine)
    }

    fn spoken_texts(engine: &ScriptedEngine) -> Vec<&str> {
        engine.spoken.iter().map(|u| u.text.as_str()).collect()
    }

    #[test]
    fn reads_paragraphs_in_order_then_goes_idle() {
        let doc = document("One. Two.\nThree.");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();

        let events = seq.start(&doc, &mut engine, 0.0);
        assert_eq!(seq.state(), SpeechState::Speaking);
        assert_eq!(seq.current_paragraph(), Some(0));
        assert!(events.contains(&SpeechEvent::Highlight(Some(0))));
        assert!(matches!(events[0], SpeechEvent::ScrollTo { offset_px, smooth: true } if offset_px == 0.0));
        assert_eq!(seq.pending_chunks().collect::<Vec<_>>(), vec!["Two."]);

        finish_last(&mut seq, &doc, &mut engine);
        let events = finish_last(&mut seq, &doc, &mut engine);
        assert_eq!(seq.current_paragraph(), Some(1));
        assert!(events.contains(&SpeechEvent::Highlight(Some(1))));

        let events = finish_last(&mut seq, &doc, &mut engine);
        assert_eq!(seq.state(), SpeechState::Idle);
        assert_eq!(events, vec![SpeechEvent::Highlight(None)]);
        assert_eq!(spoken_texts(&engine), vec!["One.", "Two.", "Three."]);
        let paragraphs: Vec<_> = engine.spoken.iter().map(|u| u.paragraph).collect();
        assert_eq!(paragraphs, vec![0, 0, 1]);
    }

    #[test]
    fn starts_at_paragraph_under_viewport_top() {
        let doc = document("a\nb\nc\nd");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();
        let third = doc.index().offset(2).unwrap();

        seq.start(&doc, &mut engine, third + 1.0);
        assert_eq!(seq.current_paragraph(), Some(2));
        assert_eq!(spoken_texts(&engine), vec!["c"]);
    }

    #[test]
    fn unspeakable_paragraphs_are_skipped_without_audio() {
        let doc = document("first\n* * *\n---\nsecond");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();

        seq.start(&doc, &mut engine, 0.0);
        let events = finish_last(&mut seq, &doc, &mut engine);
        assert_eq!(seq.current_paragraph(), Some(3));
        assert!(!events.contains(&SpeechEvent::Highlight(Some(1))));
        assert_eq!(spoken_texts(&engine), vec!["first", "second"]);
    }

    #[test]
    fn stop_is_idempotent_and_silences_late_completions() {
        let doc = document("one\ntwo");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();
        seq.start(&doc, &mut engine, 0.0);
        let in_flight = seq.in_flight().unwrap();

        let events = seq.stop(&mut engine);
        assert_eq!(events, vec![SpeechEvent::Highlight(None)]);
        assert_eq!(seq.state(), SpeechState::Idle);
        let cancels = engine.cancels;

        assert!(seq.stop(&mut engine).is_empty());
        assert_eq!(engine.cancels, cancels);
        assert_eq!(seq.state(), SpeechState::Idle);
        assert_eq!(seq.current_paragraph(), None);
        assert_eq!(seq.pending_chunks().count(), 0);

        let late =
            seq.on_utterance_finished(in_flight, UtteranceOutcome::Completed, &doc, &mut engine);
        assert!(late.is_empty());
        assert_eq!(engine.spoken.len(), 1);
    }

    #[test]
    fn failed_chunks_are_skipped() {
        let doc = document("A. B. C.");
        let mut engine = ScriptedEngine {
            fail_texts: vec!["B.".to_string()],
            ..ScriptedEngine::default()
        };
        let mut seq = sequencer();
        seq.start(&doc, &mut engine, 0.0);

        let ticket = seq.in_flight().unwrap();
        seq.on_utterance_finished(
            ticket,
            UtteranceOutcome::Failed("interrupted".to_string()),
            &doc,
            &mut engine,
        );
        assert_eq!(spoken_texts(&engine), vec!["A.", "C."]);
        assert_eq!(seq.state(), SpeechState::Speaking);
    }

    #[test]
    fn unavailable_engine_reports_once_and_goes_idle() {
        let doc = document("hello\nworld");
        let mut engine = ScriptedEngine {
            unavailable: true,
            ..ScriptedEngine::default()
        };
        let mut seq = sequencer();
        let events = seq.start(&doc, &mut engine, 0.0);

        let notices = events
            .iter()
            .filter(|event| matches!(event, SpeechEvent::Notice(_)))
            .count();
        assert_eq!(notices, 1);
        assert_eq!(events.last(), Some(&SpeechEvent::Highlight(None)));
        assert_eq!(seq.state(), SpeechState::Idle);
    }

    #[test]
    fn pause_keeps_queue_and_resume_continues() {
        let doc = document("A. B.");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();
        seq.start(&doc, &mut engine, 0.0);

        seq.pause(&mut engine);
        assert_eq!(seq.state(), SpeechState::Paused);
        assert_eq!(engine.pauses, 1);
        assert_eq!(seq.pending_chunks().count(), 1);

        // The chunk in flight may still finish while paused; nothing new is spoken.
        finish_last(&mut seq, &doc, &mut engine);
        assert_eq!(engine.spoken.len(), 1);

        seq.resume(&doc, &mut engine);
        assert_eq!(engine.resumes, 1);
        assert_eq!(spoken_texts(&engine), vec!["A.", "B."]);

        seq.resume(&doc, &mut engine);
        assert_eq!(engine.resumes, 1);
    }

    #[test]
    fn invalid_transitions_are_ignored() {
        let doc = document("text");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();
        seq.pause(&mut engine);
        assert_eq!(engine.pauses, 0);
        assert!(seq.resume(&doc, &mut engine).is_empty());

        seq.start(&doc, &mut engine, 0.0);
        assert!(seq.start(&doc, &mut engine, 0.0).is_empty());
        assert_eq!(engine.spoken.len(), 1);
    }

    #[test]
    fn skipping_moves_between_paragraphs() {
        let doc = document("one\n~~~\ntwo\nthree");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();
        seq.start(&doc, &mut engine, 0.0);

        seq.skip_forward(&doc, &mut engine);
        assert_eq!(seq.current_paragraph(), Some(2));
        seq.skip_forward(&doc, &mut engine);
        assert_eq!(seq.current_paragraph(), Some(3));
        seq.skip_backward(&doc, &mut engine);
        assert_eq!(seq.current_paragraph(), Some(2));
        seq.skip_backward(&doc, &mut engine);
        assert_eq!(seq.current_paragraph(), Some(0));
        assert_eq!(spoken_texts(&engine), vec!["one", "two", "three", "two", "one"]);
    }

    #[test]
    fn auto_scroll_can_be_disabled() {
        let doc = document("one\ntwo");
        let mut engine = ScriptedEngine::default();
        let config = TtsConfig {
            auto_scroll: false,
            ..TtsConfig::default()
        };
        let mut seq = SpeechSequencer::new(&config, SpeechNormalizer::new(NormalizerConfig::default()));
        let events = seq.start(&doc, &mut engine, 0.0);
        assert_eq!(events, vec![SpeechEvent::Highlight(Some(0))]);
        assert!(seq.jump_to_current(&doc).is_some());
    }

    #[test]
    fn empty_document_finishes_immediately() {
        let doc = document("  \n\n ");
        let mut engine = ScriptedEngine::default();
        let mut seq = sequencer();
        let events = seq.start(&doc, &mut engine, 0.0);
        assert_eq!(events, vec![SpeechEvent::Highlight(None)]);
        assert_eq!(seq.state(), SpeechState::Idle);
        assert!(engine.spoken.is_empty());
    }
}
