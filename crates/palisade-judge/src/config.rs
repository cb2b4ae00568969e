//! Judge provider configuration.
//!
//! `JudgeConfig` is deserialized from TOML and holds everything the HTTP
//! judge needs to reach a chat-completion endpoint.
//!
//! Example:
//! ```toml
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//! timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use palisade_contracts::error::{GuardError, GuardResult};

/// Default judge call timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Configuration for [`HttpJudge`](crate::HttpJudge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Full chat-completions URL (OpenAI-compatible).
    pub endpoint: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    /// Requests are sent unauthenticated when unset or empty.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Per-call timeout; a judge call that outlives it fails soft.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl JudgeConfig {
    /// Parse `s` as TOML and build a `JudgeConfig`.
    ///
    /// Returns `GuardError::ConfigError` if the TOML is malformed or does
    /// not match the expected schema.
    pub fn from_toml_str(s: &str) -> GuardResult<Self> {
        toml::from_str(s).map_err(|e| GuardError::ConfigError {
            reason: format!("failed to parse judge config TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML judge configuration.
    pub fn from_file(path: &Path) -> GuardResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GuardError::ConfigError {
            reason: format!("failed to read judge config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The per-call timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the bearer token from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .filter(|name| !name.is_empty())
            .and_then(|name| std::env::var(name).ok())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::{JudgeConfig, DEFAULT_TIMEOUT_SECS};

    #[test]
    fn minimal_config_applies_defaults() {
        let config = JudgeConfig::from_toml_str(
            r#"
            endpoint = "https://api.openai.com/v1/chat/completions"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.api_key_env.is_none());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = JudgeConfig::from_toml_str("endpoint = ").unwrap_err();
        assert!(err.to_string().contains("configuration error"), "{}", err);
    }

    #[test]
    fn missing_required_field_is_a_config_error() {
        assert!(JudgeConfig::from_toml_str(r#"model = "gpt-4o-mini""#).is_err());
    }
}
