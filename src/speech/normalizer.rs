use crate::config::NormalizerConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;

static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
// Citations in ASCII or full-width brackets: [3], ［1，2］, (4), （5）.
static RE_NUMERIC_BRACKET_CITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[［]\s*\d+(?:\s*[,，、]\s*\d+)*\s*[\]］]").unwrap());
static RE_PARENTHETICAL_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(（]\s*\d+(?:\s*[,，、]\s*\d+)*\s*[)）]").unwrap());
static RE_SQUARE_BRACKET_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|［[^］]*］|【[^】]*】").unwrap());
static RE_CURLY_BRACKET_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}|｛[^｝]*｝").unwrap());
static RE_HORIZONTAL_WS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{00A0}\u{3000}]+").unwrap());
static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{00A0}\u{3000}]+([,.;:!?，。！？；：、…）」』》〉】])").unwrap());
static RE_SPACE_AFTER_CJK_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([（「『《〈【])[ \t\u{00A0}\u{3000}]+").unwrap());

/// Cleans paragraph text before it is chunked for speech.
///
/// Display text is never touched; only what the speech engine hears.
#[derive(Debug, Clone, Default)]
pub struct SpeechNormalizer {
    config: NormalizerConfig,
}

impl SpeechNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Speakable form of `text`, or `None` when nothing worth reading remains.
    pub fn normalize(&self, text: &str) -> Option<String> {
        let cleaned = if self.config.enabled {
            self.clean(text)
        } else {
            text.trim().to_string()
        };
        self.finalize(&cleaned)
    }

    fn clean(&self, input: &str) -> String {
        let config = &self.config;
        let markup: [(bool, &Regex, &str); 6] = [
            (config.strip_markdown_links, &*RE_MARKDOWN_LINK, "$1"),
            (config.strip_inline_code, &*RE_INLINE_CODE, "$1"),
            (config.drop_numeric_bracket_citations, &*RE_NUMERIC_BRACKET_CITE, " "),
            (config.drop_parenthetical_numeric_citations, &*RE_PARENTHETICAL_NUMERIC, " "),
            (config.drop_square_bracket_text, &*RE_SQUARE_BRACKET_BLOCK, " "),
            (config.drop_curly_brace_text, &*RE_CURLY_BRACKET_BLOCK, " "),
        ];
        let mut text = markup
            .into_iter()
            .filter(|(enabled, _, _)| *enabled)
            .fold(input.to_string(), |text, (_, pattern, with)| {
                pattern.replace_all(&text, with).into_owned()
            });

        if !config.replacements.is_empty() {
            let mut entries: Vec<_> = config.replacements.iter().collect();
            entries.sort_by_key(|(from, _)| Reverse(from.chars().count()));
            for (from, to) in entries {
                text = text.replace(from.as_str(), to.as_str());
            }
        }

        for token in config.drop_tokens.iter().filter(|token| !token.is_empty()) {
            text = text.replace(token.as_str(), " ");
        }

        // Punctuation first, so a full-width space before `。` goes away
        // instead of collapsing into an ASCII one.
        if config.remove_space_before_punctuation {
            text = RE_SPACE_BEFORE_PUNCT.replace_all(&text, "$1").into_owned();
            text = RE_SPACE_AFTER_CJK_OPEN.replace_all(&text, "$1").into_owned();
        }

        if config.collapse_whitespace {
            text = RE_HORIZONTAL_WS.replace_all(&text, " ").into_owned();
        }

        text.trim().to_string()
    }

    fn finalize(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if self.config.require_alphanumeric && !trimmed.chars().any(char::is_alphanumeric) {
            return None;
        }
        Some(trimmed.to_string())
    }
}
