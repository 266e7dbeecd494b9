//! Configuration management for Baitbot
//!
//! This module provides configuration loading, saving and validation.
//! Configuration is loaded from `~/.baitbot/config.json` with environment variable overrides.

mod types;
pub mod validate;

pub use types::*;

use crate::error::{BaitError, Result};
use std::path::{Path, PathBuf};

impl Config {
    /// Returns the Baitbot configuration directory path (~/.baitbot)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".baitbot")
    }

    /// Returns the path to the config file (~/.baitbot/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment variables can override config values using the pattern:
    /// `BAITBOT_SECTION_KEY`
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables follow the pattern: BAITBOT_SECTION_KEY
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BAITBOT_OWN_ID") {
            self.own_id = val;
        }

        // Agent policy
        if let Ok(val) = std::env::var("BAITBOT_AGENT_RESPONSE_WAIT_SECS") {
            if let Ok(v) = val.parse() {
                self.agent.response_wait_secs = v;
            }
        }
        if let Ok(val) = std::env::var("BAITBOT_AGENT_MAX_SILENCE_SECS") {
            if let Ok(v) = val.parse() {
                self.agent.max_silence_secs = v;
            }
        }
        if let Ok(val) = std::env::var("BAITBOT_AGENT_SILENCE_JITTER_SECS") {
            if let Ok(v) = val.parse() {
                self.agent.silence_jitter_secs = v;
            }
        }
        if let Ok(val) = std::env::var("BAITBOT_AGENT_MAX_INPUT_TOKENS") {
            if let Ok(v) = val.parse() {
                self.agent.max_input_tokens = v;
            }
        }

        // Provider
        if let Ok(val) = std::env::var("BAITBOT_PROVIDER_API_KEY") {
            self.provider.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("BAITBOT_PROVIDER_API_BASE") {
            self.provider.api_base = Some(val);
        }
        if let Ok(val) = std::env::var("BAITBOT_PROVIDER_MODEL") {
            self.provider.model = val;
        }

        // Logging
        if let Ok(val) = std::env::var("BAITBOT_LOGGING_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("BAITBOT_LOGGING_FILE") {
            self.logging.file = Some(val);
        }
    }

    /// Check semantic constraints the JSON schema cannot express.
    ///
    /// # Errors
    /// Returns `BaitError::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if !self.chats.is_empty() && self.own_id.trim().is_empty() {
            return Err(BaitError::Config(
                "own_id must be set when chats are configured".into(),
            ));
        }
        if let Some(i) = self.chats.iter().position(|c| c.chat.trim().is_empty()) {
            return Err(BaitError::Config(format!("chats[{}].chat is empty", i)));
        }
        if self.agent.max_input_tokens == 0 {
            return Err(BaitError::Config(
                "agent.max_input_tokens must be positive".into(),
            ));
        }
        if self.agent.max_silence_secs == 0 {
            return Err(BaitError::Config(
                "agent.max_silence_secs must be positive".into(),
            ));
        }
        if self.agent.max_silence_secs <= self.agent.response_wait_secs {
            return Err(BaitError::Config(format!(
                "agent.max_silence_secs ({}) must exceed agent.response_wait_secs ({})",
                self.agent.max_silence_secs, self.agent.response_wait_secs
            )));
        }
        if self.agent.history_fetch_limit == 0 {
            return Err(BaitError::Config(
                "agent.history_fetch_limit must be positive".into(),
            ));
        }
        if self.provider.max_tokens == 0 {
            return Err(BaitError::Config(
                "provider.max_tokens must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.own_id.is_empty());
        assert!(config.chats.is_empty());
        assert_eq!(config.agent.response_wait_secs, 10);
        assert_eq!(config.agent.max_silence_secs, 14400);
        assert_eq!(config.agent.silence_jitter_secs, 3600);
        assert_eq!(config.agent.history_fetch_limit, 1000);
        assert_eq!(config.agent.max_input_tokens, 3000);
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.provider.max_tokens, 256);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let json = r#"{
            "own_id": "111",
            "chats": [
                {"chat": "Hannah"},
                {"chat": "1234567", "preamble": "Be brief."}
            ],
            "agent": {"response_wait_secs": 3}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.own_id, "111");
        assert_eq!(config.chats.len(), 2);
        assert!(config.chats[0].preamble.is_none());
        assert_eq!(config.chats[1].preamble.as_deref(), Some("Be brief."));
        assert_eq!(config.agent.response_wait_secs, 3);
        assert_eq!(config.agent.max_silence_secs, 14400);
    }

    #[test]
    fn test_env_override() {
        env::set_var("BAITBOT_AGENT_RESPONSE_WAIT_SECS", "42");
        env::set_var("BAITBOT_PROVIDER_MODEL", "gpt-4o-mini");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.agent.response_wait_secs, 42);
        assert_eq!(config.provider.model, "gpt-4o-mini");

        env::remove_var("BAITBOT_AGENT_RESPONSE_WAIT_SECS");
        env::remove_var("BAITBOT_PROVIDER_MODEL");
    }

    #[test]
    fn test_env_override_ignores_unparsable_numbers() {
        env::set_var("BAITBOT_AGENT_MAX_INPUT_TOKENS", "lots");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.agent.max_input_tokens, 3000);
        env::remove_var("BAITBOT_AGENT_MAX_INPUT_TOKENS");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.own_id = "111".to_string();
        config.chats.push(ChatConfig {
            chat: "Hannah".to_string(),
            preamble: None,
        });
        config.agent.max_input_tokens = 2000;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.own_id, "111");
        assert_eq!(loaded.chats[0].chat, "Hannah");
        assert_eq!(loaded.agent.max_input_tokens, 2000);
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("missing.json")).unwrap();
        assert!(config.chats.is_empty());
        assert_eq!(config.agent.history_fetch_limit, 1000);
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(BaitError::Json(_))
        ));
    }

    #[test]
    fn test_validate_requires_own_id_with_chats() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.chats.push(ChatConfig {
            chat: "Hannah".to_string(),
            preamble: None,
        });
        assert!(config.validate().is_err());

        config.own_id = "111".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.agent.max_input_tokens = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_input_tokens"));
    }

    #[test]
    fn test_validate_rejects_silence_shorter_than_debounce() {
        let mut config = Config::default();
        config.agent.max_silence_secs = 5;
        config.agent.silence_jitter_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must exceed agent.response_wait_secs"));

        config.agent.max_silence_secs = config.agent.response_wait_secs;
        assert!(config.validate().is_err());

        config.agent.max_silence_secs = config.agent.response_wait_secs + 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_chat() {
        let mut config = Config::default();
        config.own_id = "111".to_string();
        config.chats.push(ChatConfig::default());
        assert!(config.validate().is_err());
    }
}
