//! Loader for `~/.config/autodidact/config.toml`.
//!
//! Every key is optional. A missing or blank file yields `Config::default()`;
//! unknown keys are accepted but logged so typos are visible in the log file.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable that overrides `api_base_url` (but not `--api-url`).
pub const API_URL_ENV: &str = "AUTODIDACT_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the syllabus backend.
    pub api_base_url: String,

    /// Model name preferred when the backend offers it.
    pub default_model: Option<String>,

    /// Start with completed topics visible.
    pub show_completed: bool,

    /// Per-request timeout. Generation and elaboration go through an LLM, so
    /// this is generous.
    pub request_timeout_secs: u64,

    /// "dark" or "light".
    pub theme: String,

    /// Action name to key string, e.g. `quit = "Ctrl+q"`.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_model: None,
            show_completed: false,
            request_timeout_secs: 120,
            theme: "dark".to_string(),
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "api_base_url",
        "default_model",
        "show_completed",
        "request_timeout_secs",
        "theme",
        "keybindings",
    ];

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys().filter(|k| !Self::KNOWN_KEYS.contains(&k.as_str())) {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            path = %path.display(),
            api_base_url = %config.api_base_url,
            theme = %config.theme,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Timeout for one backend request, never below one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Applies the precedence `--api-url` > `AUTODIDACT_API_URL` > file.
    /// Blank values are ignored.
    pub fn apply_api_url_overrides(&mut self, cli: Option<&str>, env: Option<&str>) {
        let chosen = [cli, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty());
        if let Some(url) = chosen {
            self.api_base_url = url.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("autodidact_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 120);
        assert!(!config.show_completed);
        assert!(config.default_model.is_none());
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = std::env::temp_dir().join("autodidact_no_such_config.toml");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_blank_file_returns_default() {
        let (dir, path) = write_config("blank", "  \n\n ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.theme, "dark");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let (dir, path) = write_config(
            "full",
            r#"
api_base_url = "http://study.lan:9000"
default_model = "models/gemini-1.5-pro"
show_completed = true
request_timeout_secs = 30
theme = "light"

[keybindings]
quit = "Ctrl+q"
generate = "n"
"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "http://study.lan:9000");
        assert_eq!(config.default_model.as_deref(), Some("models/gemini-1.5-pro"));
        assert!(config.show_completed);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.theme, "light");
        assert_eq!(config.keybindings.get("generate").map(String::as_str), Some("n"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "theme = \"dark\"\nrefresh_rate = 5\n");
        assert!(Config::load(&path).is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "api_base_url = [unterminated");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (dir, path) = write_config("wrongtype", "show_completed = \"yes\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"#".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_api_url_precedence() {
        let mut config = Config::default();
        config.apply_api_url_overrides(Some("http://cli:1"), Some("http://env:2"));
        assert_eq!(config.api_base_url, "http://cli:1");

        let mut config = Config::default();
        config.apply_api_url_overrides(None, Some("http://env:2"));
        assert_eq!(config.api_base_url, "http://env:2");

        let mut config = Config::default();
        config.apply_api_url_overrides(Some("  "), None);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }
}
