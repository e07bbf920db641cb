//! Book records as the reader sees them.
//!
//! Books are owned by an external catalog. The reader only loads one by id and
//! writes its reading position back through a [`crate::store::BookStore`].

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        BookId(value.to_string())
    }
}

/// A chapter heading detected upstream. `char_offset` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub char_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub progress_px: f64,
    #[serde(default)]
    pub percent: u8,
}

impl Book {
    /// Chapter start offsets after [`normalize_chapters`].
    pub fn chapter_offsets(&self) -> Vec<usize> {
        normalize_chapters(&self.content, &self.chapters)
            .iter()
            .map(|chapter| chapter.char_offset)
            .collect()
    }

    /// Titles in the same order as [`Book::chapter_offsets`].
    pub fn chapter_titles(&self) -> Vec<String> {
        normalize_chapters(&self.content, &self.chapters)
            .into_iter()
            .map(|chapter| chapter.title)
            .collect()
    }
}

/// Clamp chapter offsets to the content length, sort them and drop repeats.
///
/// The sort is stable and the first chapter at a given offset wins, so titles
/// stay attached to their offsets.
pub fn normalize_chapters(content: &str, chapters: &[Chapter]) -> Vec<Chapter> {
    let len = content.chars().count();
    let mut normalized: Vec<Chapter> = chapters
        .iter()
        .map(|chapter| Chapter {
            title: chapter.title.clone(),
            char_offset: chapter.char_offset.min(len),
        })
        .collect();
    normalized.sort_by_key(|chapter| chapter.char_offset);
    normalized.dedup_by_key(|chapter| chapter.char_offset);
    if normalized.as_slice() != chapters {
        debug!(
            given = chapters.len(),
            kept = normalized.len(),
            "Normalized chapter list"
        );
    }
    normalized
}

/// Partial update written back to the store while reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressPatch {
    pub progress_px: f64,
    pub percent: u8,
}
