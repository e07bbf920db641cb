//! Book record access.
//!
//! The reader only needs to load a book and write its position back. The file
//! store keeps each book under `<root>/<sha256 of id>/` so arbitrary ids are
//! safe as directory names. The record itself is `book.json`; reading
//! position lives in a small `progress.toml` next to it so frequent writes
//! never rewrite the whole text.

use crate::book::{Book, BookId, ProgressPatch};
use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_STORE_DIR: &str = ".cache/books";

pub trait BookStore {
    fn get(&self, id: &BookId) -> Result<Option<Book>>;
    fn update(&mut self, id: &BookId, patch: ProgressPatch) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBookStore {
    books: HashMap<BookId, Book>,
}

impl MemoryBookStore {
    pub fn insert(&mut self, book: Book) {
        self.books.insert(book.id.clone(), book);
    }
}

impl BookStore for MemoryBookStore {
    fn get(&self, id: &BookId) -> Result<Option<Book>> {
        Ok(self.books.get(id).cloned())
    }

    fn update(&mut self, id: &BookId, patch: ProgressPatch) -> Result<()> {
        let Some(book) = self.books.get_mut(id) else {
            bail!("book {id} not found");
        };
        book.progress_px = patch.progress_px;
        book.percent = patch.percent;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileBookStore {
    root: PathBuf,
}

impl FileBookStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hash_dir(&self, id: &BookId) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(id.as_str().as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(hash)
    }

    fn record_path(&self, id: &BookId) -> PathBuf {
        self.hash_dir(id).join("book.json")
    }

    fn progress_path(&self, id: &BookId) -> PathBuf {
        self.hash_dir(id).join("progress.toml")
    }

    /// Write a full book record, replacing any previous one.
    pub fn insert(&self, book: &Book) -> Result<()> {
        let dir = self.hash_dir(&book.id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = self.record_path(&book.id);
        let contents = serde_json::to_string(book)?;
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        let progress = ProgressPatch {
            progress_px: book.progress_px,
            percent: book.percent,
        };
        self.write_progress(&book.id, progress)
    }

    fn read_progress(&self, id: &BookId) -> Option<ProgressPatch> {
        let path = self.progress_path(id);
        let data = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %path.display(), "No saved progress found or unreadable: {err}");
                return None;
            }
        };
        match toml::from_str::<ProgressPatch>(&data) {
            Ok(progress) => Some(progress),
            Err(err) => {
                warn!(path = %path.display(), "Saved progress invalid: {err}");
                None
            }
        }
    }

    fn write_progress(&self, id: &BookId, patch: ProgressPatch) -> Result<()> {
        let path = self.progress_path(id);
        let contents = toml::to_string(&patch)?;
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl BookStore for FileBookStore {
    fn get(&self, id: &BookId) -> Result<Option<Book>> {
        let path = self.record_path(id);
        let data = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(book = %id, path = %path.display(), "Book record not found");
                return Ok(None);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        let mut book: Book = serde_json::from_str(&data)
            .with_context(|| format!("Invalid book record at {}", path.display()))?;
        if let Some(progress) = self.read_progress(id) {
            book.progress_px = progress.progress_px;
            book.percent = progress.percent;
        }
        debug!(book = %id, chars = book.content.len(), "Loaded book record");
        Ok(Some(book))
    }

    fn update(&mut self, id: &BookId, patch: ProgressPatch) -> Result<()> {
        if !self.record_path(id).exists() {
            bail!("book {id} not found");
        }
        self.write_progress(id, patch)
    }
}
