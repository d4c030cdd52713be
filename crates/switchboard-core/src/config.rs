use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SwitchboardError};

/// Top-level configuration for the Switchboard router.
///
/// Loaded from `switchboard.toml` by default. Each section corresponds to a
/// component or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SwitchboardConfig = toml::from_str(&content)?;
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
        let content =
            toml::to_string_pretty(self).map_err(|e| SwitchboardError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// API server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            log_level: "info".to_string(),
        }
    }
}

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minutes of inactivity after which a session is evicted.
    pub ttl_minutes: u32,
    /// Seconds between background eviction sweeps.
    pub eviction_interval_secs: u64,
    /// Maximum turns retained per session; older turns are trimmed.
    pub max_turns: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            eviction_interval_secs: 60,
            max_turns: 100,
        }
    }
}

/// Intent classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Base URL of the language-understanding API.
    pub api_base: String,
    /// Model identifier used for intent classification.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-call classification deadline in milliseconds. Classification is
    /// on the critical path of every turn, so this stays short.
    pub timeout_ms: u64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_ms: 8_000,
        }
    }
}

/// Provider endpoints and the shared call policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    /// Base URL of the company-knowledge provider.
    pub knowledge_url: String,
    /// Base URL of the document question-answering provider.
    pub document_url: String,
    /// Base URL of the database-query provider.
    pub database_url: String,
    /// Base URL of the visualization provider.
    pub visualization_url: String,
    /// Per-call deadline in milliseconds for provider invocations.
    pub timeout_ms: u64,
    /// Retry schedule applied uniformly to every provider call.
    pub retry: RetryConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            knowledge_url: "http://127.0.0.1:8001".to_string(),
            document_url: "http://127.0.0.1:8002".to_string(),
            database_url: "http://127.0.0.1:8003".to_string(),
            visualization_url: "http://127.0.0.1:8004".to_string(),
            timeout_ms: 30_000,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry schedule for unreliable downstream calls: bounded attempts with
/// exponential backoff and jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total invocation attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Cap on the exponential backoff delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Upper bound of the uniform random jitter added to each delay,
    /// in milliseconds.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            jitter_ms: 500,
        }
    }
}

/// Input validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum message length in characters.
    pub max_message_chars: usize,
    /// Maximum attached file size in bytes.
    pub max_file_bytes: usize,
    /// Maximum page count for an attached document.
    pub max_file_pages: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 2_000,
            max_file_bytes: 5 * 1024 * 1024,
            max_file_pages: 20,
        }
    }
}
