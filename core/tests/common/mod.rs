#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lathe_core::Prompter;
use lathe_core::model::{Completion, CompletionRequest, FinishReason, ModelError, ModelProvider};
use lathe_protocol::{Message, ToolCallRequest};

/// Provider that replays a fixed list of outcomes and records every request.
pub struct ScriptedProvider {
  replies: Mutex<VecDeque<Result<Completion, ModelError>>>,
  requests: Mutex<Vec<CompletionRequest>>,
  calls: AtomicUsize,
}

impl ScriptedProvider {
  pub fn new(replies: Vec<Result<Completion, ModelError>>) -> Arc<Self> {
    Arc::new(Self {
      replies: Mutex::new(replies.into()),
      requests: Mutex::new(Vec::new()),
      calls: AtomicUsize::new(0),
    })
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn requests(&self) -> Vec<CompletionRequest> {
    self.requests.lock().expect("requests lock").clone()
  }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
  fn provider_id(&self) -> &'static str {
    "scripted"
  }

  async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.requests.lock().expect("requests lock").push(request);
    self
      .replies
      .lock()
      .expect("replies lock")
      .pop_front()
      .unwrap_or_else(|| Err(ModelError::InvalidResponse("script exhausted".to_string())))
  }
}

pub fn text_reply(text: &str) -> Result<Completion, ModelError> {
  Ok(Completion {
    message: Message::assistant(Some(text.to_string()), vec![]),
    finish_reason: FinishReason::Stop,
    usage: None,
  })
}

pub fn tool_reply(calls: Vec<ToolCallRequest>) -> Result<Completion, ModelError> {
  Ok(Completion {
    message: Message::assistant(None, calls),
    finish_reason: FinishReason::ToolCalls,
    usage: None,
  })
}

pub fn failure(reason: &str) -> Result<Completion, ModelError> {
  Err(ModelError::InvalidResponse(reason.to_string()))
}

/// Prompter fed from a list; records what it was shown.
#[derive(Default)]
pub struct ScriptedPrompter {
  prompts: VecDeque<String>,
  pub asked: usize,
  pub replies: Vec<String>,
}

impl ScriptedPrompter {
  pub fn new(prompts: &[&str]) -> Self {
    Self {
      prompts: prompts.iter().map(|prompt| prompt.to_string()).collect(),
      ..Self::default()
    }
  }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
  async fn next_prompt(&mut self) -> std::io::Result<Option<String>> {
    self.asked += 1;
    Ok(self.prompts.pop_front())
  }

  fn show_reply(&mut self, text: &str) {
    self.replies.push(text.to_string());
  }
}
