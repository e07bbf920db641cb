use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 160;

// A sentence runs up to its terminators plus any closing quotes or brackets.
static RE_SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^.!?。！？；;…]+(?:[.!?。！？；;…]+["'”’」』）)\]】]*)?|[.!?。！？；;…]+["'”’」』）)\]】]*"#)
        .unwrap()
});

/// Split text into utterances no longer than `max_chars` characters.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    for sentence in RE_SENTENCE.find_iter(text) {
        let sentence = sentence.as_str().trim();
        if sentence.is_empty() {
            continue;
        }
        if sentence.chars().count() <= max_chars {
            chunks.push(sentence.to_string());
        } else {
            hard_split(sentence, max_chars, &mut chunks);
        }
    }
    chunks
}

fn hard_split(sentence: &str, max_chars: usize, out: &mut Vec<String>) {
    let chars: Vec<char> = sentence.chars().collect();
    for piece in chars.chunks(max_chars) {
        let piece: String = piece.iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
    }
}
