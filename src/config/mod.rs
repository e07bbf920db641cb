//! Reader configuration loaded from TOML.
//!
//! Both a sectioned layout (`[appearance]`, `[reader]`, `[tts]`,
//! `[normalizer]`) and flat top-level keys are accepted.

mod io;
mod models;
mod tables;

pub use io::{DEFAULT_CONFIG_PATH, load_config, parse_config, serialize_config};
pub use models::{AppConfig, NormalizerConfig, TtsConfig};
pub use tables::{AppearanceTable, ConfigTables, ReaderTable};
