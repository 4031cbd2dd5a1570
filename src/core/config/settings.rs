use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::core::errors::ApiError;

/// Typed view of `config.yml`, with environment overrides applied.
///
/// Every field has a default so a missing config file yields a runnable
/// (if provider-less) service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub notifications: NotificationSettings,
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

/// Contact details surfaced in scheduling confirmations and notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: "+1 (555) 014-7788".to_string(),
            email: "hello@meridianlabs.ai".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            llm: LlmSettings::default(),
            retrieval: RetrievalSettings::default(),
            notifications: NotificationSettings::default(),
            contact: ContactInfo::default(),
        }
    }
}

impl Settings {
    /// Load `config.yml` from the data directory (or `RELAY_CONFIG_PATH`),
    /// then apply environment overrides and validate.
    pub fn load(paths: &AppPaths) -> Result<Self, ApiError> {
        let path = config_file_path(paths);

        let mut settings = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(ApiError::internal)?;
            serde_yaml::from_str::<Settings>(&contents).map_err(|e| {
                ApiError::Internal(format!("invalid config at {}: {}", path.display(), e))
            })?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("RELAY_API_KEY").or_else(|_| env::var("OPENAI_API_KEY")) {
            if !key.is_empty() {
                self.llm.api_key = key;
            }
        }
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Ok(url) = env::var("RELAY_NOTIFY_WEBHOOK_URL") {
            if !url.is_empty() {
                self.notifications.webhook_url = Some(url);
            }
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.retrieval.chunk_size == 0 {
            return Err(ApiError::Internal(
                "retrieval.chunk_size must be positive".to_string(),
            ));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ApiError::Internal(
                "retrieval.chunk_overlap must be smaller than chunk_size".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ApiError::Internal(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ApiError::Internal(
                "llm.max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_file_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("RELAY_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    paths.data_dir.join("config.yml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.retrieval.chunk_size, 1000);
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let mut settings = Settings::default();
        settings.retrieval.chunk_overlap = settings.retrieval.chunk_size;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn yaml_round_trip_keeps_fields() {
        let yaml = "server:\n  port: 9100\nretrieval:\n  top_k: 3\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.retrieval.top_k, 3);
        // Untouched sections fall back to defaults.
        assert_eq!(settings.llm.chat_model, "gpt-4o-mini");
    }
}
