use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LemaConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub model: ModelConfig,
    pub analysis: AnalysisConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Language model backend used when the topic cache misses.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// `"ollama"` (local) or `"gemini"` (cloud). Chosen once at startup.
    pub provider: String,
    pub ollama_host: String,
    pub ollama_model: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Row cap for the topic-frequency partition of a topic analysis.
    pub topic_limit: usize,
    pub supervisor_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Messages kept per session; older ones are evicted first.
    pub history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_lema_dir()
            .join("transcripts.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            ollama_host: "http://localhost:11434".into(),
            ollama_model: "llama3.2".into(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-pro".into(),
            gemini_endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            temperature: 0.1,
            max_tokens: 50,
            timeout_secs: 10,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            topic_limit: 20,
            supervisor_limit: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

/// Returns `~/.lema/`, or `./.lema/` when no home directory can be determined.
pub fn default_lema_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lema")
}

/// Returns the default config file path: `~/.lema/config.toml`
pub fn default_config_path() -> PathBuf {
    default_lema_dir().join("config.toml")
}

impl LemaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LemaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// The model variables keep the names used by existing deployments
    /// (`LLM_PROVIDER`, `OLLAMA_HOST`, `GEMINI_API_KEY`, ...).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LEMA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LEMA_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("LLM_PROVIDER") {
            self.model.provider = val;
        }
        if let Ok(val) = std::env::var("OLLAMA_HOST") {
            self.model.ollama_host = val;
        }
        if let Ok(val) = std::env::var("OLLAMA_MODEL") {
            self.model.ollama_model = val;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            self.model.gemini_api_key = val;
        }
        if let Ok(val) = std::env::var("GEMINI_MODEL") {
            self.model.gemini_model = val;
        }
        if let Ok(val) = std::env::var("CONVERSATION_HISTORY_LIMIT") {
            match val.parse() {
                Ok(limit) => self.session.history_limit = limit,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid CONVERSATION_HISTORY_LIMIT"),
            }
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LemaConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.model.provider, "ollama");
        assert_eq!(config.model.timeout_secs, 10);
        assert_eq!(config.analysis.topic_limit, 20);
        assert_eq!(config.session.history_limit, 10);
        assert!(config.storage.db_path.ends_with("transcripts.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
db_path = "/tmp/test.db"

[model]
provider = "gemini"
gemini_model = "gemini-1.5-flash"

[session]
history_limit = 4
"#;
        let config: LemaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.model.provider, "gemini");
        assert_eq!(config.model.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.session.history_limit, 4);
        // defaults still apply for unset fields
        assert_eq!(config.model.ollama_host, "http://localhost:11434");
        assert_eq!(config.analysis.supervisor_limit, 10);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = LemaConfig::default();
        std::env::set_var("LEMA_DB", "/tmp/override.db");
        std::env::set_var("LEMA_LOG_LEVEL", "trace");
        std::env::set_var("LLM_PROVIDER", "gemini");
        std::env::set_var("CONVERSATION_HISTORY_LIMIT", "3");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.model.provider, "gemini");
        assert_eq!(config.session.history_limit, 3);

        // Clean up
        std::env::remove_var("LEMA_DB");
        std::env::remove_var("LEMA_LOG_LEVEL");
        std::env::remove_var("LLM_PROVIDER");
        std::env::remove_var("CONVERSATION_HISTORY_LIMIT");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/lib/x.db"), PathBuf::from("/var/lib/x.db"));
    }
}
