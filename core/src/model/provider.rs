//! Model Provider trait
//!
//! This module defines the [ModelProvider] trait that all completion providers implement.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use super::error::{ModelError, Result};
use super::types::{Completion, CompletionRequest};

/// Model Provider trait
///
/// Turns the conversation so far into the model's next assistant message.
#[async_trait]
pub trait ModelProvider: Send + Sync {
  /// Returns the unique identifier for this provider
  fn provider_id(&self) -> &'static str;

  /// Creates a chat completion
  async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}

/// Map a non-success HTTP status onto a [ModelError].
pub(crate) async fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  Err(match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelError::AuthError(body),
    StatusCode::TOO_MANY_REQUESTS => ModelError::RateLimited(body),
    _ => ModelError::ApiError {
      status: status.as_u16(),
      body,
    },
  })
}
