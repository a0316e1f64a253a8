// Lathe Protocol
// Conversation data model: messages, tool calls and tool results

pub mod models;
pub mod tools;

pub use models::{ContentBlock, Message, MessageContent, Role};
pub use tools::{ToolCallRequest, ToolCallResult, ToolDefinition};
