use super::super::ReaderSession;
use super::Effect;
use crate::speech::{SPEECH_UNAVAILABLE_NOTICE, UtteranceOutcome, UtteranceTicket};
use tracing::{info, warn};

impl ReaderSession {
    pub(super) fn handle_start_reading(&mut self, effects: &mut Vec<Effect>) {
        let offset = self.reading_offset();
        let Some(engine) = self.engine.as_deref_mut() else {
            warn!("No speech engine attached");
            effects.push(Effect::Notice(SPEECH_UNAVAILABLE_NOTICE.to_string()));
            return;
        };
        let events = self
            .speech
            .start(&self.document, engine, offset);
        self.apply_speech_events(events, effects);
    }

    pub(super) fn handle_pause_reading(&mut self) {
        if let Some(engine) = self.engine.as_deref_mut() {
            self.speech.pause(engine);
        }
    }

    pub(super) fn handle_resume_reading(&mut self, effects: &mut Vec<Effect>) {
        if let Some(engine) = self.engine.as_deref_mut() {
            let events = self.speech.resume(&self.document, engine);
            self.apply_speech_events(events, effects);
        }
    }

    pub(super) fn handle_stop_reading(&mut self, effects: &mut Vec<Effect>) {
        if let Some(engine) = self.engine.as_deref_mut() {
            let events = self.speech.stop(engine);
            self.apply_speech_events(events, effects);
        }
    }

    pub(super) fn handle_skip(&mut self, forward: bool, effects: &mut Vec<Effect>) {
        let Some(engine) = self.engine.as_deref_mut() else {
            return;
        };
        let events = if forward {
            self.speech.skip_forward(&self.document, engine)
        } else {
            self.speech.skip_backward(&self.document, engine)
        };
        self.apply_speech_events(events, effects);
    }

    pub(super) fn handle_jump_to_current_audio(&mut self, effects: &mut Vec<Effect>) {
        if let Some(event) = self.speech.jump_to_current(&self.document) {
            info!(paragraph = ?self.speech.current_paragraph(), "Jumping to current audio paragraph");
            self.apply_speech_events(vec![event], effects);
        }
    }

    pub(super) fn handle_auto_scroll_tts_changed(&mut self, enabled: bool, effects: &mut Vec<Effect>) {
        if self.config.auto_scroll_tts == enabled {
            return;
        }
        self.config.auto_scroll_tts = enabled;
        self.speech.set_auto_scroll(enabled);
        info!(enabled, "Updated auto-scroll to spoken paragraph");
        if enabled {
            self.handle_jump_to_current_audio(effects);
        }
    }

    pub(super) fn handle_utterance_finished(
        &mut self,
        ticket: UtteranceTicket,
        outcome: UtteranceOutcome,
        effects: &mut Vec<Effect>,
    ) {
        let Some(engine) = self.engine.as_deref_mut() else {
            return;
        };
        let events = self
            .speech
            .on_utterance_finished(ticket, outcome, &self.document, engine);
        self.apply_speech_events(events, effects);
    }
}
