use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Extension of voxlate package files.
pub const DEFAULT_PACKAGE_EXTENSION: &str = "vxpkg";

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Translation backends configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Directory holding `<src>-<tgt>/` Marian model directories.
    pub marian_base_path: PathBuf,
    /// Directory scanned for package files at startup. A relative path is
    /// taken from the working directory, not the data directory.
    pub package_source_dir: PathBuf,
    /// Where packages are extracted. None = `<data_dir>/packages`.
    pub package_install_dir: Option<PathBuf>,
    /// Extension (without dot) of package files.
    pub package_extension: String,
    /// Maximum number of loaded models per backend (0 = unbounded).
    pub model_cache_capacity: usize,
    /// Upper bound on generated tokens per translation.
    pub max_new_tokens: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            marian_base_path: PathBuf::from("models/marian"),
            package_source_dir: PathBuf::from("."),
            package_install_dir: None,
            package_extension: DEFAULT_PACKAGE_EXTENSION.to_string(),
            model_cache_capacity: 0,
            max_new_tokens: 512,
        }
    }
}

/// Offline speech capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Directory holding `ggml-<model>.bin` speech models.
    pub model_dir: PathBuf,
    /// Fixed capture window in seconds.
    pub capture_seconds: u64,
    /// Number of threads to use (0 = auto).
    pub threads: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/speech"),
            capture_seconds: 5,
            threads: 0,
        }
    }
}

/// Speech synthesis of translated text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub enabled: bool,
    /// Local text-to-speech program; the text is passed as the last argument.
    pub command: String,
    pub args: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "espeak-ng".to_string(),
            args: Vec::new(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub translation: TranslationConfig,
    pub speech: SpeechConfig,
    pub synthesis: SynthesisConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [translation]
            marian_base_path = "/opt/marian"
            model_cache_capacity = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.translation.marian_base_path, PathBuf::from("/opt/marian"));
        assert_eq!(config.translation.model_cache_capacity, 4);
        assert_eq!(config.translation.package_extension, "vxpkg");
        assert_eq!(config.speech.capture_seconds, 5);
        assert_eq!(config.logging.level, "info");
    }
}
