//! Break raw book text into the ordered paragraph list the reader lays out.
//!
//! Chapter boundaries arrive as character offsets from upstream heading
//! detection. Each chapter slice is split on blank lines first, then on the
//! single newlines left inside a block. Results are trimmed and empty pieces
//! are dropped, so re-running on the same input gives the same list.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n\s*\n").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub chapter_index: Option<usize>,
}

/// Split `text` into paragraphs tagged with the chapter that contains them.
///
/// `chapter_offsets[i]` is the character offset where chapter `i` starts.
/// Text before the first chapter is kept with no chapter tag. A chapter whose
/// range is empty, whitespace-only or inverted contributes no paragraphs.
pub fn segment(text: &str, chapter_offsets: &[usize]) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();

    if chapter_offsets.is_empty() {
        push_paragraphs(text, None, &mut paragraphs);
        return paragraphs;
    }

    let bounds = char_to_byte_offsets(text, chapter_offsets);
    // Everything before `cursor` has been assigned. Each chapter takes the
    // text from there to the next chapter's start, so out-of-order offsets
    // never repeat or lose text.
    let mut cursor = bounds.iter().copied().min().unwrap_or(0);
    push_paragraphs(&text[..cursor], None, &mut paragraphs);

    for chapter in 0..bounds.len() {
        let end = bounds.get(chapter + 1).copied().unwrap_or(text.len());
        if end <= cursor {
            debug!(chapter, "Chapter range is empty");
            continue;
        }
        let before = paragraphs.len();
        push_paragraphs(&text[cursor..end], Some(chapter), &mut paragraphs);
        if paragraphs.len() == before {
            debug!(chapter, "Chapter contains no visible text");
        }
        cursor = end;
    }

    paragraphs
}

fn push_paragraphs(slice: &str, chapter_index: Option<usize>, out: &mut Vec<Paragraph>) {
    for block in RE_BLANK_LINES.split(slice) {
        for line in block.lines() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                out.push(Paragraph {
                    text: trimmed.to_string(),
                    chapter_index,
                });
            }
        }
    }
}

/// Map character offsets to byte offsets in one pass. Offsets past the end map to `text.len()`.
fn char_to_byte_offsets(text: &str, offsets: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..offsets.len()).collect();
    order.sort_by_key(|&i| offsets[i]);

    let mut bytes = vec![text.len(); offsets.len()];
    let mut pending = order.into_iter().peekable();
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        while let Some(&i) = pending.peek() {
            if offsets[i] > char_idx {
                break;
            }
            bytes[i] = byte_idx;
            pending.next();
        }
        if pending.peek().is_none() {
            break;
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(paragraphs: &[Paragraph]) -> Vec<&str> {
        paragraphs.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn splits_chapters_then_lines() {
        let content = "第一章\nhello\n\n第二章\nworld";
        let paragraphs = segment(content, &[0, 9]);

        assert_eq!(texts(&paragraphs), vec!["第一章", "hello", "第二章", "world"]);
        let chapters: Vec<_> = paragraphs.iter().map(|p| p.chapter_index).collect();
        assert_eq!(chapters, vec![Some(0), Some(0), Some(1), Some(1)]);

        let rebuilt: String = paragraphs.iter().map(|p| p.text.as_str()).collect();
        let expected: String = content.split_whitespace().collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn without_chapters_every_paragraph_is_untagged() {
        let paragraphs = segment("  one  \n\n\n two\r\nthree \n \n", &[]);
        assert_eq!(texts(&paragraphs), vec!["one", "two", "three"]);
        assert!(paragraphs.iter().all(|p| p.chapter_index.is_none()));
    }

    #[test]
    fn whitespace_only_chapter_yields_nothing() {
        let content = "Intro\n   \n\t\nBody";
        // Chapter 1 starts at the blank run and chapter 2 at "Body".
        let paragraphs = segment(content, &[0, 6, 12]);
        let chapters: Vec<_> = paragraphs.iter().map(|p| p.chapter_index).collect();
        assert_eq!(texts(&paragraphs), vec!["Intro", "Body"]);
        assert_eq!(chapters, vec![Some(0), Some(2)]);
    }

    #[test]
    fn preamble_before_first_chapter_is_kept_untagged() {
        let content = "Foreword\nChapter 1\ntext";
        let paragraphs = segment(content, &[9]);
        assert_eq!(paragraphs[0].chapter_index, None);
        assert_eq!(paragraphs[1].chapter_index, Some(0));
        assert_eq!(paragraphs.len(), 3);
    }

    #[test]
    fn chapter_tags_never_decrease() {
        let content = "a\nb\n\nc\nd\n\ne";
        let paragraphs = segment(content, &[0, 2, 5, 10]);
        assert!(
            paragraphs
                .windows(2)
                .all(|pair| pair[0].chapter_index <= pair[1].chapter_index)
        );
    }

    #[test]
    fn unordered_offsets_never_repeat_text() {
        let paragraphs = segment("abcdefgh", &[0, 5, 2]);
        assert_eq!(texts(&paragraphs), vec!["abcde", "fgh"]);
        let chapters: Vec<_> = paragraphs.iter().map(|p| p.chapter_index).collect();
        assert_eq!(chapters, vec![Some(0), Some(2)]);

        let paragraphs = segment("abcdefgh", &[5, 3, 6, 1]);
        let rebuilt: String = paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(rebuilt, "abcdefgh");
        assert!(
            paragraphs
                .windows(2)
                .all(|pair| pair[0].chapter_index <= pair[1].chapter_index)
        );
    }

    #[test]
    fn segmentation_is_idempotent() {
        let content = "第一章\n  甲乙。\n\n\n丙丁\n第二章\n戊";
        let first = segment(content, &[0, 12]);
        let second = segment(content, &[0, 12]);
        assert_eq!(first, second);
    }

    #[test]
    fn offsets_past_the_end_map_to_text_length() {
        assert_eq!(char_to_byte_offsets("né", &[0, 1, 2, 7]), vec![0, 1, 3, 3]);
    }
}
