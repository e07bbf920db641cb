use anyhow::Result;
use tracing::{debug, info};

/// Identifies one utterance. Completion reports carry it back so stale ones can be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceTicket {
    pub session: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub ticket: UtteranceTicket,
    pub paragraph: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    Completed,
    Failed(String),
}

/// The audio output channel.
///
/// `speak` queues audio and returns immediately; the host reports completion
/// later with the utterance's ticket. An `Err` from `speak` counts as an
/// immediate failure of that utterance.
pub trait SpeechEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}

/// Engine that only records and logs what it is asked to say.
#[derive(Debug, Default)]
pub struct LogSpeechEngine {
    queued: Vec<Utterance>,
}

impl LogSpeechEngine {
    /// Utterances queued since the last call.
    pub fn drain(&mut self) -> Vec<Utterance> {
        std::mem::take(&mut self.queued)
    }
}

impl SpeechEngine for LogSpeechEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        info!(
            paragraph = utterance.paragraph,
            seq = utterance.ticket.seq,
            "Speaking: {}",
            utterance.text
        );
        self.queued.push(utterance.clone());
        Ok(())
    }

    fn pause(&mut self) {
        info!(queued = self.queued.len(), "Speech paused");
    }

    fn resume(&mut self) {
        info!(queued = self.queued.len(), "Speech resumed");
    }

    fn cancel(&mut self) {
        debug!(dropped = self.queued.len(), "Speech cancelled");
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(seq: u64, text: &str) -> Utterance {
        Utterance {
            ticket: UtteranceTicket { session: 1, seq },
            paragraph: 0,
            text: text.to_string(),
        }
    }

    #[test]
    fn log_engine_hands_out_queued_utterances_once() {
        let mut engine = LogSpeechEngine::default();
        engine.speak(&utterance(0, "one")).unwrap();
        engine.speak(&utterance(1, "two")).unwrap();

        let drained = engine.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].text, "two");
        assert!(engine.drain().is_empty());
    }

    #[test]
    fn cancel_drops_undelivered_utterances() {
        let mut engine = LogSpeechEngine::default();
        engine.speak(&utterance(0, "gone")).unwrap();
        engine.cancel();
        assert!(engine.drain().is_empty());
    }
}
