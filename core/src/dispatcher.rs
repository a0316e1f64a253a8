// Dispatcher
// Turn loop: prompt, complete, run tool batches, repeat

use std::sync::Arc;

use async_trait::async_trait;
use lathe_config::{Config, ModelConfig};
use lathe_protocol::{Message, ToolCallRequest, ToolCallResult, ToolDefinition};
use tracing::{debug, info, warn};

use crate::model::{Completion, CompletionRequest, FinishReason, ModelError, ModelProvider};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::thread::{Thread, ThreadError};
use crate::tools::ToolCallRuntime;
use crate::tools::registry::ToolRegistry;

/// Errors that end the turn loop.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  #[error(transparent)]
  Thread(#[from] ThreadError),

  #[error("completion failed after {attempts} attempts: {source}")]
  RetriesExhausted { attempts: u32, source: ModelError },

  #[error("failed to read prompt: {0}")]
  Prompt(#[source] std::io::Error),
}

/// Source of human turns and sink for the model's text replies.
#[async_trait]
pub trait Prompter: Send {
  /// Next line of input; `None` once input is exhausted.
  async fn next_prompt(&mut self) -> std::io::Result<Option<String>>;

  fn show_reply(&mut self, _text: &str) {}
}

/// Drives one conversation thread against one completion provider.
pub struct Dispatcher {
  provider: Arc<dyn ModelProvider>,
  tools: ToolCallRuntime,
  definitions: Vec<ToolDefinition>,
  thread: Arc<Thread>,
  limiter: Arc<RateLimiter>,
  retry: RetryPolicy,
  model: String,
  max_tokens: u32,
  system_prompt: Option<String>,
}

impl Dispatcher {
  /// Dispatcher with default model settings, pacing and retry policy.
  pub fn new(
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    thread: Arc<Thread>,
  ) -> Self {
    let defaults = Config::default();
    let definitions = registry.definitions();

    Self {
      provider,
      tools: ToolCallRuntime::new(registry),
      definitions,
      thread,
      limiter: Arc::new(RateLimiter::from_config(&defaults.rate_limit)),
      retry: RetryPolicy::from_config(&defaults.retry),
      model: defaults.model.model_name(),
      max_tokens: defaults.model.max_tokens,
      system_prompt: None,
    }
  }

  pub fn from_config(
    config: &Config,
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    thread: Arc<Thread>,
    limiter: Arc<RateLimiter>,
  ) -> Self {
    Self::new(provider, registry, thread)
      .with_model_config(&config.model)
      .with_rate_limiter(limiter)
      .with_retry(RetryPolicy::from_config(&config.retry))
  }

  pub fn with_model_config(mut self, config: &ModelConfig) -> Self {
    self.model = config.model_name();
    self.max_tokens = config.max_tokens;
    self.system_prompt = config
      .system_prompt
      .clone()
      .filter(|prompt| !prompt.trim().is_empty());
    self
  }

  pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
    self.limiter = limiter;
    self
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn thread(&self) -> &Arc<Thread> {
    &self.thread
  }

  pub fn tool_definitions(&self) -> &[ToolDefinition] {
    &self.definitions
  }

  /// Run until the prompter runs dry.
  ///
  /// A restored thread whose last message still awaits the model is
  /// answered before any new input is requested.
  pub async fn run(&self, prompter: &mut dyn Prompter) -> Result<(), DispatchError> {
    let mut awaiting_reply = self
      .thread
      .last()
      .await
      .is_some_and(|message| message.awaits_reply());
    if awaiting_reply {
      info!("resuming thread that awaits a reply");
    }

    loop {
      if awaiting_reply {
        let reply = self.communicate().await?;
        if let Some(text) = reply.text() {
          prompter.show_reply(&text);
        }
      }

      let Some(prompt) = read_prompt(prompter).await? else {
        info!("input closed, ending session");
        return Ok(());
      };
      self.thread.append(Message::user(prompt)).await?;
      awaiting_reply = true;
    }
  }

  /// Append one human turn and work it through to the model's text reply.
  pub async fn interact(&self, prompt: impl Into<String>) -> Result<Message, DispatchError> {
    self.thread.append(Message::user(prompt)).await?;
    self.communicate().await
  }

  /// Request completions, running every requested tool batch, until the
  /// model answers without tool calls. Returns that final message.
  pub async fn communicate(&self) -> Result<Message, DispatchError> {
    loop {
      let completion = self.complete().await?;
      let message = completion.message;
      let calls = message.tool_calls();

      if calls.is_empty() {
        match completion.finish_reason {
          FinishReason::ToolCalls => warn!("model reported tool use without any tool calls"),
          FinishReason::Length => warn!("reply truncated at {} tokens", self.max_tokens),
          _ => {}
        }
        self.thread.append(message.clone()).await?;
        return Ok(message);
      }

      self.thread.append(message).await?;
      self.invoke_tools(&calls).await?;
    }
  }

  /// Run a batch concurrently and append its results as one message.
  pub async fn invoke_tools(
    &self,
    calls: &[ToolCallRequest],
  ) -> Result<Vec<ToolCallResult>, DispatchError> {
    debug!(calls = calls.len(), "invoking tool batch");
    let results = self.tools.invoke_batch(calls).await;
    self
      .thread
      .append(Message::tool_results(results.clone()))
      .await?;
    Ok(results)
  }

  /// One completion over the whole thread, paced and retried.
  pub async fn complete(&self) -> Result<Completion, DispatchError> {
    let request = CompletionRequest {
      model: self.model.clone(),
      max_tokens: self.max_tokens,
      system: self.system_prompt.clone(),
      messages: self.thread.snapshot().await,
      tools: self.definitions.clone(),
    };

    let mut attempts = 0u32;
    loop {
      self.limiter.take().await;
      attempts += 1;

      match self.provider.complete(request.clone()).await {
        Ok(completion) => return Ok(completion),
        Err(err) => {
          if !self.retry.allows_another(attempts) {
            return Err(DispatchError::RetriesExhausted {
              attempts,
              source: err,
            });
          }
          warn!(
            provider = self.provider.provider_id(),
            model = %self.model,
            attempt = attempts,
            backoff_ms = self.retry.backoff.as_millis() as u64,
            "completion failed, retrying: {err}"
          );
          tokio::time::sleep(self.retry.backoff).await;
        }
      }
    }
  }
}

async fn read_prompt(prompter: &mut dyn Prompter) -> Result<Option<String>, DispatchError> {
  loop {
    match prompter.next_prompt().await.map_err(DispatchError::Prompt)? {
      None => return Ok(None),
      Some(line) => {
        let line = line.trim();
        if !line.is_empty() {
          return Ok(Some(line.to_string()));
        }
      }
    }
  }
}
