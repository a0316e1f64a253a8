//! Anthropic Provider
//!
//! Messages API: tool calls are `tool_use` blocks, results go back as
//! `tool_result` blocks inside a user turn.

use async_trait::async_trait;
use lathe_protocol::{ContentBlock, Message, MessageContent, Role, ToolCallRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::error::{ModelError, Result};
use super::super::provider::{ModelProvider, check_status};
use super::super::types::{Completion, CompletionRequest, FinishReason, ProviderConfig, Usage};
use super::{arguments_value, create_client};

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider
pub struct AnthropicProvider {
  client: Client,
  api_key: String,
  base_url: String,
}

impl AnthropicProvider {
  /// Create a new Anthropic provider
  pub fn new(api_key: String, config: ProviderConfig) -> Self {
    let base_url = config
      .base_url
      .clone()
      .unwrap_or_else(|| "https://api.anthropic.com".to_string());

    Self {
      client: create_client(config.timeout),
      api_key,
      base_url,
    }
  }

  /// Get the API endpoint URL
  fn endpoint(&self, path: &str) -> String {
    format!("{}/v1/{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Convert message to Anthropic format.
  ///
  /// `None` for system messages and for messages left without content once
  /// empty text blocks are dropped; the API rejects both kinds of empty turn.
  fn convert_message(msg: &Message) -> Option<AnthropicMessage> {
    let role = match msg.role {
      Role::User | Role::ToolResult => "user",
      Role::Assistant => "assistant",
      Role::System => return None,
    };

    let content: Vec<AnthropicContent> = match &msg.content {
      MessageContent::Text(text) if text.is_empty() => Vec::new(),
      MessageContent::Text(text) => vec![AnthropicContent::Text { text: text.clone() }],
      MessageContent::Blocks(blocks) => blocks
        .iter()
        .filter(|block| !matches!(block, ContentBlock::Text { text } if text.is_empty()))
        .map(Self::convert_block)
        .collect(),
    };
    if content.is_empty() {
      debug!(role, "skipping message without content");
      return None;
    }

    Some(AnthropicMessage {
      role: role.to_string(),
      content,
    })
  }

  fn convert_block(block: &ContentBlock) -> AnthropicContent {
    match block {
      ContentBlock::Text { text } => AnthropicContent::Text { text: text.clone() },
      ContentBlock::ToolCall(call) => AnthropicContent::ToolUse {
        id: call.id.clone(),
        name: call.name.clone(),
        input: arguments_value(&call.arguments),
      },
      ContentBlock::ToolResult(result) => AnthropicContent::ToolResult {
        tool_use_id: result.id.clone(),
        content: result.content.clone(),
        is_error: result.is_error,
      },
    }
  }

  fn build_request(request: &CompletionRequest) -> AnthropicRequest {
    let mut system: Vec<String> = request.system.iter().cloned().collect();
    system.extend(
      request
        .messages
        .iter()
        .filter(|msg| msg.role == Role::System)
        .filter_map(Message::text),
    );

    AnthropicRequest {
      model: request.model.clone(),
      max_tokens: request.max_tokens,
      system: (!system.is_empty()).then(|| system.join("\n\n")),
      messages: request
        .messages
        .iter()
        .filter_map(Self::convert_message)
        .collect(),
      tools: request
        .tools
        .iter()
        .map(|tool| AnthropicTool {
          name: tool.name.clone(),
          description: tool.description.clone(),
          input_schema: tool.input_schema.clone(),
        })
        .collect(),
    }
  }
}

// Anthropic-specific types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
  model: String,
  max_tokens: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  system: Option<String>,
  messages: Vec<AnthropicMessage>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  tools: Vec<AnthropicTool>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
  role: String,
  content: Vec<AnthropicContent>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContent {
  Text {
    text: String,
  },
  ToolUse {
    id: String,
    name: String,
    input: serde_json::Value,
  },
  ToolResult {
    tool_use_id: String,
    content: String,
    #[serde(default)]
    is_error: bool,
  },
  /// Block kinds this client does not act on, such as `thinking`
  #[serde(other)]
  Unsupported,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
  name: String,
  description: String,
  input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
  content: Vec<AnthropicContent>,
  stop_reason: Option<String>,
  usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
  input_tokens: u32,
  output_tokens: u32,
}

fn convert_response(response: AnthropicResponse) -> Completion {
  let mut text = String::new();
  let mut tool_calls = Vec::new();

  for block in response.content {
    match block {
      AnthropicContent::Text { text: part } => text.push_str(&part),
      AnthropicContent::ToolUse { id, name, input } => {
        tool_calls.push(ToolCallRequest::new(id, name, input.to_string()));
      }
      AnthropicContent::ToolResult { .. } | AnthropicContent::Unsupported => {}
    }
  }

  Completion {
    message: Message::assistant(Some(text), tool_calls),
    finish_reason: FinishReason::from_anthropic(response.stop_reason.as_deref()),
    usage: response.usage.map(|usage| Usage {
      input_tokens: usage.input_tokens,
      output_tokens: usage.output_tokens,
    }),
  }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
  fn provider_id(&self) -> &'static str {
    "anthropic"
  }

  async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
    let url = self.endpoint("messages");
    let body = Self::build_request(&request);

    let response = self
      .client
      .post(&url)
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .header("Content-Type", "application/json")
      .json(&body)
      .send()
      .await
      .map_err(ModelError::NetworkError)?;

    let response = check_status(response).await?;
    let parsed: AnthropicResponse = serde_json::from_slice(&response.bytes().await?)?;
    let completion = convert_response(parsed);
    debug!(
      provider = self.provider_id(),
      finish_reason = ?completion.finish_reason,
      usage = ?completion.usage,
      "completion received"
    );
    Ok(completion)
  }
}
