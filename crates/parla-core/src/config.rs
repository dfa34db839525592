use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParlaError, Result};

/// Top-level configuration for the Parla assistant core.
///
/// Loaded from `~/.parla/config.toml` by default. Each section corresponds
/// to one crate or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParlaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub assist: AssistConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl ParlaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParlaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ParlaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the assistant widget is enabled at all.
    pub enabled: bool,
    /// Maximum user message length in characters.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_message_length: 2000,
        }
    }
}

/// AI fallback router settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Whether AI mode may be enabled per session.
    pub enabled: bool,
    /// Base URL of the text-generation service.
    pub endpoint: String,
    /// Model identifier passed to the generation service.
    pub model: String,
    /// Request timeout in seconds for generation calls.
    pub timeout_secs: u64,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://127.0.0.1:11434".to_string(),
            model: "parla-assist".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Interaction logger / event store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Base URL of the remote event store.
    pub endpoint: String,
    /// Request timeout in seconds for append and fetch calls.
    pub timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4100".to_string(),
            timeout_secs: 10,
        }
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Port the localhost API binds to.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 4080 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ParlaConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert!(config.chat.enabled);
        assert_eq!(config.chat.max_message_length, 2000);
        assert!(config.assist.enabled);
        assert_eq!(config.assist.timeout_secs, 30);
        assert_eq!(config.telemetry.timeout_secs, 10);
        assert_eq!(config.api.port, 4080);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[chat]
enabled = true
max_message_length = 500

[assist]
enabled = false
endpoint = "http://ai.internal:8080"
model = "gemini-pro"
timeout_secs = 15

[telemetry]
endpoint = "https://events.example.com"
timeout_secs = 5

[api]
port = 9090
"#;
        let file = create_temp_config(content);
        let config = ParlaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.chat.max_message_length, 500);
        assert!(!config.assist.enabled);
        assert_eq!(config.assist.endpoint, "http://ai.internal:8080");
        assert_eq!(config.assist.model, "gemini-pro");
        assert_eq!(config.telemetry.endpoint, "https://events.example.com");
        assert_eq!(config.api.port, 9090);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = ParlaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        // Remaining sections use defaults
        assert_eq!(config.chat.max_message_length, 2000);
        assert_eq!(config.api.port, 4080);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ParlaConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.api.port, 4080);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(ParlaConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = ParlaConfig::default();
        config.api.port = 5123;
        config.save(&path).unwrap();

        let reloaded = ParlaConfig::load(&path).unwrap();
        assert_eq!(reloaded.api.port, 5123);
        assert_eq!(reloaded.chat.max_message_length, 2000);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = ParlaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.chat.enabled);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = ParlaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let deserialized: ParlaConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.general.log_level, config.general.log_level);
        assert_eq!(deserialized.assist.endpoint, config.assist.endpoint);
        assert_eq!(deserialized.api.port, config.api.port);
    }
}
