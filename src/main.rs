use anyhow::{Context, Result};
use clap::Parser;
use scroll_reader::book::{Book, BookId};
use scroll_reader::config::{self, DEFAULT_CONFIG_PATH};
use scroll_reader::logging;
use scroll_reader::session::{Effect, Message, ReaderSession};
use scroll_reader::speech::{LogSpeechEngine, SpeechEngine, Utterance, UtteranceOutcome};
use scroll_reader::store::FileBookStore;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "scroll-reader")]
#[command(about = "Open a stored book, lay it out and print the visible window", long_about = None)]
struct Args {
    /// Id of the book in the store
    book: String,

    /// Reader configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Book store root (defaults to `store_dir` from the config)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Plain-text file to store under the book id before opening
    #[arg(long)]
    import: Option<PathBuf>,

    /// Title for an imported book
    #[arg(long, requires = "import")]
    title: Option<String>,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 640.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// Scroll to this offset after layout
    #[arg(long)]
    scroll: Option<f64>,

    /// Jump to this chapter (0-based) after layout
    #[arg(long)]
    chapter: Option<usize>,

    /// Read this many utterances aloud through the logging engine
    #[arg(long, default_value_t = 0)]
    read: usize,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let book_id = BookId::from(args.book.as_str());
    let config = config::load_config(&args.config);
    let root = args
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.store_dir));
    let mut store = FileBookStore::new(root);

    if let Some(path) = &args.import {
        import_book(&store, &book_id, path, args.title.as_deref())?;
    }

    let engine = Rc::new(RefCell::new(LogSpeechEngine::default()));
    let mut session = ReaderSession::open(&store, &book_id, config)?
        .with_speech_engine(Box::new(SharedEngine(engine.clone())));

    dispatch(
        &mut session,
        &mut store,
        Message::Resized {
            width: args.width,
            height: args.height,
        },
    );
    if let Some(chapter) = args.chapter {
        dispatch(&mut session, &mut store, Message::GoToChapter(chapter));
    }
    if let Some(scroll) = args.scroll {
        dispatch(&mut session, &mut store, Message::Scrolled(scroll));
    }
    if args.read > 0 {
        read_aloud(&mut session, &mut store, &engine, args.read);
    }

    print_window(&session);
    session.close(&mut store)
}

/// Deliver a message and run its effects until the session settles.
fn dispatch(session: &mut ReaderSession, store: &mut FileBookStore, message: Message) {
    let mut queue = VecDeque::from([message]);
    while let Some(message) = queue.pop_front() {
        for effect in session.update(message) {
            match effect {
                Effect::RequestFrame => queue.push_back(Message::FrameTick),
                Effect::PersistProgress(patch) => {
                    session.persist(store, patch);
                }
                Effect::ScrollTo { offset_px, smooth } => {
                    debug!(offset_px, smooth, "Scroll surface")
                }
                Effect::Highlight(paragraph) => debug!(?paragraph, "Highlight"),
                Effect::Notice(text) => warn!("{text}"),
            }
        }
    }
}

/// Start speech and report `chunks` utterances as completed, in order.
fn read_aloud(
    session: &mut ReaderSession,
    store: &mut FileBookStore,
    engine: &Rc<RefCell<LogSpeechEngine>>,
    chunks: usize,
) {
    dispatch(session, store, Message::StartReading);
    let mut pending: VecDeque<Utterance> = VecDeque::new();
    for _ in 0..chunks {
        pending.extend(engine.borrow_mut().drain());
        let Some(utterance) = pending.pop_front() else {
            break;
        };
        dispatch(
            session,
            store,
            Message::UtteranceFinished {
                ticket: utterance.ticket,
                outcome: UtteranceOutcome::Completed,
            },
        );
    }
    info!(
        state = ?session.speech_state(),
        paragraph = ?session.speaking_paragraph(),
        "Finished simulated reading"
    );
}

fn print_window(session: &ReaderSession) {
    println!("{} [{}]", session.title(), session.book_id());
    println!(
        "chapter: {}",
        session.current_chapter_title().unwrap_or("(none)")
    );
    println!(
        "position: {:.1}px of {:.1}px ({}%)",
        session.scroll_top(),
        session.scroll_extent(),
        session.percent()
    );
    let range = session.window();
    println!(
        "window: {}..{} of {} paragraphs",
        range.start,
        range.end,
        session.document().paragraphs().len()
    );
    for (idx, offset, paragraph) in session.visible_paragraphs() {
        let marker = if session.highlight() == Some(idx) { '>' } else { ' ' };
        let preview: String = paragraph.text.chars().take(PREVIEW_CHARS).collect();
        println!("{marker} {idx:>6} {offset:>10.1}  {preview}");
    }
    if let Some(speaking) = session.highlight().filter(|&idx| !range.contains(idx)) {
        println!("speaking paragraph {speaking} is outside the window");
    }
}

fn import_book(
    store: &FileBookStore,
    id: &BookId,
    path: &Path,
    title: Option<&str>,
) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let book = Book {
        id: id.clone(),
        title: title.unwrap_or(id.as_str()).to_string(),
        content,
        chapters: Vec::new(),
        progress_px: 0.0,
        percent: 0,
    };
    store.insert(&book)?;
    info!(book = %id, path = %path.display(), "Imported book");
    Ok(())
}

/// Lets the CLI drain utterances the session hands to its boxed engine.
struct SharedEngine(Rc<RefCell<LogSpeechEngine>>);

impl SpeechEngine for SharedEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.0.borrow_mut().speak(utterance)
    }

    fn pause(&mut self) {
        self.0.borrow_mut().pause();
    }

    fn resume(&mut self) {
        self.0.borrow_mut().resume();
    }

    fn cancel(&mut self) {
        self.0.borrow_mut().cancel();
    }
}
