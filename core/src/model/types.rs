//! Model layer types
//!
//! Provider-neutral completion request and response

use lathe_protocol::{Message, ToolDefinition};

/// Connection settings shared by every provider
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
  /// Base URL override
  pub base_url: Option<String>,
  /// Request timeout in seconds
  pub timeout: Option<u64>,
}

/// One completion call: the whole thread plus the advertised tools
#[derive(Debug, Clone)]
pub struct CompletionRequest {
  pub model: String,
  pub max_tokens: u32,
  /// Request-level instructions, never stored in the thread
  pub system: Option<String>,
  pub messages: Vec<Message>,
  pub tools: Vec<ToolDefinition>,
}

/// Why the model stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
  Stop,
  ToolCalls,
  Length,
  Other(String),
}

impl FinishReason {
  pub fn from_anthropic(reason: Option<&str>) -> Self {
    match reason {
      Some("end_turn") | Some("stop_sequence") | None => FinishReason::Stop,
      Some("tool_use") => FinishReason::ToolCalls,
      Some("max_tokens") => FinishReason::Length,
      Some(other) => FinishReason::Other(other.to_string()),
    }
  }

  pub fn from_openai(reason: Option<&str>) -> Self {
    match reason {
      Some("stop") | None => FinishReason::Stop,
      Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
      Some("length") => FinishReason::Length,
      Some(other) => FinishReason::Other(other.to_string()),
    }
  }
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
  pub input_tokens: u32,
  pub output_tokens: u32,
}

/// Parsed model reply
#[derive(Debug, Clone)]
pub struct Completion {
  /// Assistant message: text, tool calls, or both
  pub message: Message,
  pub finish_reason: FinishReason,
  pub usage: Option<Usage>,
}
