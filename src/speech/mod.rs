//! Read-aloud support: text cleanup, chunking, the engine seam and the sequencer.

mod chunker;
mod engine;
mod normalizer;
mod sequencer;

pub use chunker::{DEFAULT_MAX_CHUNK_CHARS, split_chunks};
pub use engine::{LogSpeechEngine, SpeechEngine, Utterance, UtteranceOutcome, UtteranceTicket};
pub use normalizer::SpeechNormalizer;
pub use sequencer::{SPEECH_UNAVAILABLE_NOTICE, SpeechEvent, SpeechSequencer, SpeechState};
