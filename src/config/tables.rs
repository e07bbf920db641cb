use super::models::{AppConfig, NormalizerConfig, TtsConfig};
use serde::{Deserialize, Serialize};

/// Sectioned on-disk layout. Unknown keys are rejected so flat files fall through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigTables {
    pub appearance: AppearanceTable,
    pub reader: ReaderTable,
    pub tts: TtsConfig,
    pub normalizer: NormalizerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceTable {
    pub font_size: u32,
    pub line_spacing: f64,
    pub char_advance_px: f64,
    pub paragraph_padding_px: f64,
}

impl Default for AppearanceTable {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            font_size: defaults.font_size,
            line_spacing: defaults.line_spacing,
            char_advance_px: defaults.char_advance_px,
            paragraph_padding_px: defaults.paragraph_padding_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderTable {
    pub buffer_paragraphs: usize,
    pub store_dir: String,
}

impl Default for ReaderTable {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            buffer_paragraphs: defaults.buffer_paragraphs,
            store_dir: defaults.store_dir,
        }
    }
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            font_size: tables.appearance.font_size,
            line_spacing: tables.appearance.line_spacing,
            char_advance_px: tables.appearance.char_advance_px,
            paragraph_padding_px: tables.appearance.paragraph_padding_px,
            buffer_paragraphs: tables.reader.buffer_paragraphs,
            store_dir: tables.reader.store_dir,
            max_chunk_chars: tables.tts.max_chunk_chars,
            auto_scroll_tts: tables.tts.auto_scroll,
            smooth_scroll_tts: tables.tts.smooth_scroll,
            normalizer: tables.normalizer,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            appearance: AppearanceTable {
                font_size: config.font_size,
                line_spacing: config.line_spacing,
                char_advance_px: config.char_advance_px,
                paragraph_padding_px: config.paragraph_padding_px,
            },
            reader: ReaderTable {
                buffer_paragraphs: config.buffer_paragraphs,
                store_dir: config.store_dir.clone(),
            },
            tts: config.tts(),
            normalizer: config.normalizer.clone(),
        }
    }
}
