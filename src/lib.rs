//! Virtualized plain-text reader engine.
//!
//! Raw text is segmented into paragraphs, each paragraph gets an estimated
//! height, and a cumulative offset index answers every position question:
//! which paragraphs to materialize, which chapter is on screen, where the
//! spoken paragraph sits. [`session::ReaderSession`] ties these together with
//! throttled progress persistence and read-aloud sequencing.

pub mod book;
pub mod chapters;
pub mod config;
pub mod document;
pub mod layout;
pub mod logging;
pub mod offsets;
pub mod progress;
pub mod segmenter;
pub mod session;
pub mod speech;
pub mod store;

pub use book::{Book, BookId, Chapter, ProgressPatch};
pub use config::AppConfig;
pub use document::Document;
pub use session::{Effect, Message, ReaderSession};
pub use store::{BookStore, FileBookStore, MemoryBookStore};
