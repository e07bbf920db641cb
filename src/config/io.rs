use super::models::AppConfig;
use super::tables::ConfigTables;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ConfigInput {
    Tables(ConfigTables),
    Flat(AppConfig),
}

/// Which of the two accepted file shapes a config was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigLayout {
    /// `[appearance]`, `[reader]`, `[tts]` and `[normalizer]` sections.
    Sectioned,
    /// Every key at the top level.
    Flat,
}

/// Load configuration from the given path, falling back to defaults on error.
///
/// A missing file is normal on first run and only logged at debug level.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No reader config, using defaults");
            return AppConfig::default();
        }
        Err(err) => {
            warn!(path = %path.display(), "Unreadable reader config, using defaults: {err}");
            return AppConfig::default();
        }
    };

    match read_config(&contents) {
        Ok((raw, layout)) => {
            let cfg = raw.clone().sanitized();
            if cfg != raw {
                warn!(path = %path.display(), "Clamped out-of-range config values");
            }
            info!(path = %path.display(), ?layout, "Loaded reader config");
            debug!(?cfg, "Effective configuration");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

/// Parse and clamp a config document in either layout.
pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    read_config(contents).map(|(cfg, _)| cfg.sanitized())
}

/// Parse without clamping, reporting which layout matched.
fn read_config(contents: &str) -> Result<(AppConfig, ConfigLayout), toml::de::Error> {
    Ok(match toml::from_str::<ConfigInput>(contents)? {
        ConfigInput::Tables(tables) => (AppConfig::from(tables), ConfigLayout::Sectioned),
        ConfigInput::Flat(flat) => (flat, ConfigLayout::Flat),
    })
}

pub fn serialize_config(config: &AppConfig) -> Result<String, toml::ser::Error> {
    toml::to_string(&ConfigTables::from(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sectioned_tables() {
        let cfg = parse_config(
            r#"
            [appearance]
            font_size = 20
            line_spacing = 1.4

            [reader]
            buffer_paragraphs = 3

            [tts]
            max_chunk_chars = 90
            auto_scroll = false

            [normalizer]
            drop_square_bracket_text = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.font_size, 20);
        assert_eq!(cfg.line_spacing, 1.4);
        assert_eq!(cfg.buffer_paragraphs, 3);
        assert_eq!(cfg.max_chunk_chars, 90);
        assert!(!cfg.auto_scroll_tts);
        assert!(cfg.smooth_scroll_tts);
        assert!(cfg.normalizer.drop_square_bracket_text);
    }

    #[test]
    fn parses_flat_keys() {
        let cfg = parse_config("font_size = 12\nauto_scroll_tts = false\n").unwrap();
        assert_eq!(cfg.font_size, 12);
        assert!(!cfg.auto_scroll_tts);
        assert_eq!(cfg.buffer_paragraphs, AppConfig::default().buffer_paragraphs);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = parse_config("[appearance]\nfont_size = 64\nline_spacing = 9.0\n").unwrap();
        assert_eq!(cfg.font_size, 24);
        assert_eq!(cfg.line_spacing, 3.0);
    }

    #[test]
    fn empty_input_is_default() {
        assert_eq!(parse_config("").unwrap(), AppConfig::default());
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut cfg = AppConfig::default();
        cfg.font_size = 18;
        cfg.max_chunk_chars = 120;
        let text = serialize_config(&cfg).unwrap();
        assert!(text.contains("[appearance]"));
        assert_eq!(parse_config(&text).unwrap(), cfg);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config(Path::new("does/not/exist.toml"));
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn layout_is_detected() {
        let (_, layout) = read_config("[reader]\nbuffer_paragraphs = 2\n").unwrap();
        assert_eq!(layout, ConfigLayout::Sectioned);
        let (_, layout) = read_config("buffer_paragraphs = 2\n").unwrap();
        assert_eq!(layout, ConfigLayout::Flat);
    }

    #[test]
    fn files_on_disk_are_clamped_and_bad_ones_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("config.toml");
        fs::write(&good, "[appearance]\nfont_size = 2\n").unwrap();
        assert_eq!(load_config(&good).font_size, 10);

        let bad = dir.path().join("broken.toml");
        fs::write(&bad, "font_size = \"large\"\n").unwrap();
        assert_eq!(load_config(&bad), AppConfig::default());

        // A directory cannot be read as a file.
        assert_eq!(load_config(dir.path()), AppConfig::default());
    }
}
