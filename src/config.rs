use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Gemini API key for chat replies and file analysis.
    gemini_api_key: String,
    /// Google Custom Search API key. Empty disables /websearch.
    #[serde(default)]
    search_api_key: String,
    /// Google Custom Search engine ID (the "cx" parameter).
    #[serde(default)]
    search_engine_id: String,
    /// Directory for state files (database, logs). Defaults to current directory.
    data_dir: Option<String>,
    /// Directory for transient attachment downloads. Defaults to <data_dir>/downloads.
    download_dir: Option<String>,
    /// Tesseract data directory. Falls back to TESSDATA_PREFIX when unset.
    tessdata_dir: Option<String>,
}

pub struct Config {
    pub telegram_bot_token: String,
    pub gemini_api_key: String,
    pub search_api_key: String,
    pub search_engine_id: String,
    /// Directory for state files (database, logs).
    pub data_dir: PathBuf,
    /// Directory for transient attachment downloads.
    pub download_dir: PathBuf,
    /// Tesseract data directory, if configured.
    pub tessdata_dir: Option<PathBuf>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.gemini_api_key.is_empty() {
            return Err(ConfigError::Validation("gemini_api_key is required".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let download_dir = file
            .download_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("downloads"));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            gemini_api_key: file.gemini_api_key,
            search_api_key: file.search_api_key,
            search_engine_id: file.search_engine_id,
            data_dir,
            download_dir,
            tessdata_dir: file.tessdata_dir.map(PathBuf::from),
        })
    }

    /// Whether the Custom Search credentials are configured.
    pub fn search_enabled(&self) -> bool {
        !self.search_api_key.is_empty() && !self.search_engine_id.is_empty()
    }
}
