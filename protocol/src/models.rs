use serde::{Deserialize, Serialize};

use crate::tools::{ToolCallRequest, ToolCallResult};

/// Author of a message in the thread.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  User,
  Assistant,
  System,
  ToolResult,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Assistant => "assistant",
      Role::System => "system",
      Role::ToolResult => "tool_result",
    }
  }
}

/// Typed content block inside a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
  Text { text: String },
  ToolCall(ToolCallRequest),
  ToolResult(ToolCallResult),
}

/// Message body: plain text or a sequence of typed blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
  Text(String),
  Blocks(Vec<ContentBlock>),
}

/// One entry of the conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
  pub role: Role,
  pub content: MessageContent,
}

impl Message {
  pub fn user(text: impl Into<String>) -> Self {
    Self {
      role: Role::User,
      content: MessageContent::Text(text.into()),
    }
  }

  pub fn system(text: impl Into<String>) -> Self {
    Self {
      role: Role::System,
      content: MessageContent::Text(text.into()),
    }
  }

  /// Assistant turn made of optional text followed by the requested tool calls.
  pub fn assistant(text: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
    let mut blocks = Vec::with_capacity(tool_calls.len() + 1);
    if let Some(text) = text
      && !text.is_empty()
    {
      blocks.push(ContentBlock::Text { text });
    }
    blocks.extend(tool_calls.into_iter().map(ContentBlock::ToolCall));

    Self {
      role: Role::Assistant,
      content: MessageContent::Blocks(blocks),
    }
  }

  /// Single tool-result message answering a whole batch; every entry carries its call id.
  pub fn tool_results(results: Vec<ToolCallResult>) -> Self {
    Self {
      role: Role::ToolResult,
      content: MessageContent::Blocks(results.into_iter().map(ContentBlock::ToolResult).collect()),
    }
  }

  /// Concatenated text of the message, `None` when it carries no text at all.
  pub fn text(&self) -> Option<String> {
    match &self.content {
      MessageContent::Text(text) => Some(text.clone()),
      MessageContent::Blocks(blocks) => {
        let parts: Vec<&str> = blocks
          .iter()
          .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
          })
          .collect();
        if parts.is_empty() {
          None
        } else {
          Some(parts.join(""))
        }
      }
    }
  }

  pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
    self
      .blocks()
      .filter_map(|block| match block {
        ContentBlock::ToolCall(call) => Some(call.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn tool_results_iter(&self) -> impl Iterator<Item = &ToolCallResult> {
    self.blocks().filter_map(|block| match block {
      ContentBlock::ToolResult(result) => Some(result),
      _ => None,
    })
  }

  pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
    let blocks: &[ContentBlock] = match &self.content {
      MessageContent::Text(_) => &[],
      MessageContent::Blocks(blocks) => blocks,
    };
    blocks.iter()
  }

  /// Whether the model is expected to speak next after this message.
  pub fn awaits_reply(&self) -> bool {
    matches!(self.role, Role::User | Role::ToolResult)
  }
}
