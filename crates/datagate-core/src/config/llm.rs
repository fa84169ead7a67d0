//! Generation endpoint configuration.

use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_base_url() -> String {
    "https://api.mistral.ai/v1".to_string()
}

fn default_model() -> String {
    "mistral-large-latest".to_string()
}

fn default_api_key_env() -> String {
    "MISTRAL_API_KEY".to_string()
}
