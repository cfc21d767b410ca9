use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub notion: NotionConfig,
    pub summarizer: SummarizerConfig,
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotionConfig {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub base_url: String,
    pub version: String,
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            base_url: "https://api.notion.com/v1".to_string(),
            version: "2022-06-28".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Transcripts longer than this are summarized chunk by chunk.
    pub chunk_threshold_chars: usize,
    pub min_transcript_chars: usize,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chunk_threshold_chars: 12_000,
            min_transcript_chars: 100,
            max_output_tokens: 1024,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExtractorConfig {
    pub ytdlp_path: PathBuf,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            language: "en".to_string(),
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl NotionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ExtractorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default config file location, e.g. `~/.config/tubenotes/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tubenotes").join("config.toml"))
}

impl Config {
    /// Load the TOML file (explicit path, else the default location if it
    /// exists) and overlay process environment variables.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        debug!(path = %path.display(), "loading config file");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay values from `lookup`; non-empty variables win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = get("NOTION_API_KEY") {
            self.notion.api_key = Some(v);
        }
        if let Some(v) = get("NOTION_DATABASE_ID") {
            self.notion.database_id = Some(v);
        }
        if let Some(v) = get("DEFAULT_LANGUAGE") {
            self.extractor.language = v;
        }
        if let Some(v) = get("YTDLP_PATH") {
            self.extractor.ytdlp_path = PathBuf::from(v);
        }
    }

    /// Fails listing every missing credential at once.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.notion.api_key.is_none() {
            missing.push("NOTION_API_KEY");
        }
        if self.notion.database_id.is_none() {
            missing.push("NOTION_DATABASE_ID");
        }
        if self.openai.api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVars(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.summarizer.chunk_threshold_chars, 12_000);
        assert_eq!(config.notion.version, "2022-06-28");
        assert_eq!(config.extractor.language, "en");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [summarizer]
            chunk_threshold_chars = 500

            [notion]
            database_id = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.summarizer.chunk_threshold_chars, 500);
        assert_eq!(config.summarizer.min_transcript_chars, 100);
        assert_eq!(config.notion.database_id.as_deref(), Some("abc"));
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("NOTION_DATABASE_ID", "db-from-env"),
            ("DEFAULT_LANGUAGE", "de"),
            ("NOTION_API_KEY", "  "),
        ]);
        let mut config: Config = toml::from_str("[notion]\ndatabase_id = \"db-from-file\"").unwrap();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.notion.database_id.as_deref(), Some("db-from-env"));
        assert_eq!(config.extractor.language, "de");
        assert!(config.notion.api_key.is_none());
    }

    #[test]
    fn test_require_credentials_lists_all_missing() {
        let err = Config::default().require_credentials().unwrap_err();
        match err {
            ConfigError::MissingVars(vars) => assert_eq!(
                vars,
                vec!["NOTION_API_KEY", "NOTION_DATABASE_ID", "OPENAI_API_KEY"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Config::from_file(Path::new("/nonexistent/tubenotes.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
