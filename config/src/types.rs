// Configuration Types
// All configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Completion provider and model selection
  pub model: ModelConfig,
  /// Outbound request pacing
  pub rate_limit: RateLimitConfig,
  /// Completion retry policy
  pub retry: RetryConfig,
  /// Conversation thread persistence
  pub thread: ThreadConfig,
  /// Built-in tool settings
  pub tools: ToolsConfig,
}

// ============================================================================
// MODEL CONFIGURATION
// ============================================================================

/// Supported completion providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  #[default]
  Anthropic,
  OpenAi,
}

impl ProviderKind {
  pub fn default_model(&self) -> &'static str {
    match self {
      ProviderKind::Anthropic => "claude-3-5-sonnet-20240620",
      ProviderKind::OpenAi => "gpt-4o",
    }
  }

  pub fn default_api_key_env(&self) -> &'static str {
    match self {
      ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
      ProviderKind::OpenAi => "OPENAI_API_KEY",
    }
  }
}

impl std::str::FromStr for ProviderKind {
  type Err = anyhow::Error;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_ascii_lowercase().as_str() {
      "anthropic" => Ok(ProviderKind::Anthropic),
      "openai" => Ok(ProviderKind::OpenAi),
      other => anyhow::bail!("Invalid provider: {other} (expected anthropic or openai)"),
    }
  }
}

/// Model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
  /// Model provider
  pub provider: ProviderKind,
  /// Model name, provider default when unset
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  /// Completion token budget per request
  pub max_tokens: u32,
  /// Base URL for API
  #[serde(skip_serializing_if = "Option::is_none")]
  pub base_url: Option<String>,
  /// Environment variable holding the API token
  #[serde(skip_serializing_if = "Option::is_none")]
  pub api_key_env: Option<String>,
  /// Request-level system instructions
  #[serde(skip_serializing_if = "Option::is_none")]
  pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      provider: ProviderKind::default(),
      model: None,
      max_tokens: 2000,
      base_url: None,
      api_key_env: None,
      system_prompt: None,
    }
  }
}

impl ModelConfig {
  pub fn model_name(&self) -> String {
    self
      .model
      .as_deref()
      .map(str::trim)
      .filter(|model| !model.is_empty())
      .unwrap_or_else(|| self.provider.default_model())
      .to_string()
  }

  pub fn api_key_env(&self) -> String {
    self
      .api_key_env
      .clone()
      .unwrap_or_else(|| self.provider.default_api_key_env().to_string())
  }
}

// ============================================================================
// RATE LIMIT CONFIGURATION
// ============================================================================

/// Process-wide pacing of completion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
  /// Steady request rate
  pub requests_per_second: f64,
  /// Requests admitted back-to-back after an idle period
  pub burst: u32,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self {
      requests_per_second: 2.0,
      burst: 1,
    }
  }
}

// ============================================================================
// RETRY CONFIGURATION
// ============================================================================

/// Completion retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  /// Fixed delay between attempts
  pub backoff_ms: u64,
  /// Attempt cap, 0 retries forever
  pub max_attempts: u32,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      backoff_ms: 1000,
      max_attempts: 0,
    }
  }
}

// ============================================================================
// THREAD CONFIGURATION
// ============================================================================

/// Thread persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
  /// Thread file, relative to the working directory
  pub file: PathBuf,
  /// Rewrite the file after every append
  pub persist: bool,
}

impl Default for ThreadConfig {
  fn default() -> Self {
    Self {
      file: PathBuf::from("thread.lathe.json"),
      persist: true,
    }
  }
}

// ============================================================================
// TOOLS CONFIGURATION
// ============================================================================

/// Built-in tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
  /// Interpreter used by `python_execute`
  pub python: String,
}

impl Default for ToolsConfig {
  fn default() -> Self {
    Self {
      python: "python3".to_string(),
    }
  }
}
