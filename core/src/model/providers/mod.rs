//! Provider implementations

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use lathe_config::{ModelConfig, ProviderKind};
use reqwest::Client;

use super::provider::ModelProvider;
use super::types::ProviderConfig;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;

/// Create HTTP client with timeout
pub fn create_client(timeout: Option<u64>) -> Client {
  let timeout = std::time::Duration::from_secs(timeout.unwrap_or(300));

  Client::builder()
    .timeout(timeout)
    .build()
    .unwrap_or_else(|_| Client::new())
}

/// Provider selected by the model configuration
pub fn build_provider(config: &ModelConfig, api_key: String) -> Arc<dyn ModelProvider> {
  let provider_config = ProviderConfig {
    base_url: config.base_url.clone(),
    timeout: None,
  };

  match config.provider {
    ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(api_key, provider_config)),
    ProviderKind::OpenAi => Arc::new(OpenAIProvider::new(api_key, provider_config)),
  }
}

/// Tool-call arguments as a JSON value; providers that want objects get `{}`
/// for a payload that does not parse.
pub(crate) fn arguments_value(arguments: &str) -> serde_json::Value {
  serde_json::from_str(arguments)
    .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
}
