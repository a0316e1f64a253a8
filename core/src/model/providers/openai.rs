//! OpenAI Provider
//!
//! Chat Completions API, also spoken by most OpenAI-compatible gateways.

use async_trait::async_trait;
use lathe_protocol::{Message, Role, ToolCallRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::super::error::{ModelError, Result};
use super::super::provider::{ModelProvider, check_status};
use super::super::types::{Completion, CompletionRequest, FinishReason, ProviderConfig, Usage};
use super::create_client;

/// OpenAI provider
pub struct OpenAIProvider {
  client: Client,
  api_key: String,
  base_url: String,
}

impl OpenAIProvider {
  /// Create a new OpenAI provider
  pub fn new(api_key: String, config: ProviderConfig) -> Self {
    let base_url = config
      .base_url
      .clone()
      .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

    Self {
      client: create_client(config.timeout),
      api_key,
      base_url,
    }
  }

  /// Get the API endpoint URL
  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Build authorization header
  fn auth_header(&self) -> String {
    format!("Bearer {}", self.api_key)
  }

  /// One thread message may expand to several chat messages: every tool
  /// result is its own `tool` message.
  fn convert_message(msg: &Message, out: &mut Vec<Value>) {
    match msg.role {
      Role::System | Role::User => out.push(json!({
        "role": msg.role.as_str(),
        "content": msg.text().unwrap_or_default(),
      })),
      Role::Assistant => {
        let text = msg.text().filter(|text| !text.is_empty());
        let tool_calls = msg.tool_calls();
        if text.is_none() && tool_calls.is_empty() {
          debug!("skipping empty assistant message");
          return;
        }

        let mut message = json!({ "role": "assistant", "content": text });
        let calls: Vec<Value> = tool_calls
          .into_iter()
          .map(|call| {
            json!({
              "id": call.id,
              "type": "function",
              "function": { "name": call.name, "arguments": call.arguments },
            })
          })
          .collect();
        if !calls.is_empty() {
          message["tool_calls"] = Value::Array(calls);
        }
        out.push(message);
      }
      Role::ToolResult => {
        for result in msg.tool_results_iter() {
          let content = if result.is_error {
            format!("error: {}", result.content)
          } else {
            result.content.clone()
          };
          out.push(json!({
            "role": "tool",
            "tool_call_id": result.id,
            "content": content,
          }));
        }
      }
    }
  }

  fn build_request(request: &CompletionRequest) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
      messages.push(json!({ "role": "system", "content": system }));
    }
    for msg in &request.messages {
      Self::convert_message(msg, &mut messages);
    }

    let mut body = json!({
      "model": request.model,
      "max_tokens": request.max_tokens,
      "messages": messages,
    });
    if !request.tools.is_empty() {
      body["tools"] = request
        .tools
        .iter()
        .map(|tool| {
          json!({
            "type": "function",
            "function": {
              "name": tool.name,
              "description": tool.description,
              "parameters": tool.input_schema,
            },
          })
        })
        .collect();
    }
    body
  }
}

// OpenAI-specific response types

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatMessage,
  finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
  content: Option<String>,
  #[serde(default)]
  tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
  id: String,
  function: ChatFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunction {
  name: String,
  #[serde(default)]
  arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
  prompt_tokens: u32,
  completion_tokens: u32,
}

fn convert_response(response: ChatCompletionResponse) -> Result<Completion> {
  let usage = response.usage.map(|usage| Usage {
    input_tokens: usage.prompt_tokens,
    output_tokens: usage.completion_tokens,
  });
  let choice = response
    .choices
    .into_iter()
    .next()
    .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))?;

  let tool_calls = choice
    .message
    .tool_calls
    .into_iter()
    .map(|call| ToolCallRequest::new(call.id, call.function.name, call.function.arguments))
    .collect();

  Ok(Completion {
    message: Message::assistant(choice.message.content, tool_calls),
    finish_reason: FinishReason::from_openai(choice.finish_reason.as_deref()),
    usage,
  })
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
  fn provider_id(&self) -> &'static str {
    "openai"
  }

  async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
    let url = self.endpoint("chat/completions");
    let body = Self::build_request(&request);

    let response = self
      .client
      .post(&url)
      .header("Authorization", self.auth_header())
      .header("Content-Type", "application/json")
      .json(&body)
      .send()
      .await
      .map_err(ModelError::NetworkError)?;

    let response = check_status(response).await?;
    let parsed: ChatCompletionResponse = serde_json::from_slice(&response.bytes().await?)?;
    let completion = convert_response(parsed)?;
    debug!(
      provider = self.provider_id(),
      finish_reason = ?completion.finish_reason,
      usage = ?completion.usage,
      "completion received"
    );
    Ok(completion)
  }
}
