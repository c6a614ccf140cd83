//! Generation backend configuration types.

use serde::Deserialize;

/// Backend configuration (discriminated union).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend type discriminator: `anthropic` or `scripted`.
    #[serde(rename = "type")]
    pub backend_type: String,
    /// Anthropic Messages API configuration.
    pub anthropic: AnthropicConfig,
    /// Scripted replay configuration.
    pub scripted: ScriptedConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: "anthropic".to_string(),
            anthropic: AnthropicConfig::default(),
            scripted: ScriptedConfig::default(),
        }
    }
}

/// Anthropic Messages API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub api_version: String,
    pub max_tokens: u32,
    /// Whole-request timeout, including the streamed body.
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-7-sonnet-latest".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

/// Scripted replay configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptedConfig {
    /// YAML script path. Without one, every call fails immediately.
    pub path: Option<String>,
}
