use std::time::Duration;

use lathe_config::RetryConfig;

/// How many completion attempts a turn may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAttempts {
  Unbounded,
  Limited(u32),
}

/// Fixed-backoff retry schedule for completion requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub backoff: Duration,
  pub max_attempts: MaxAttempts,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::unbounded(Duration::from_secs(1))
  }
}

impl RetryPolicy {
  pub fn unbounded(backoff: Duration) -> Self {
    Self {
      backoff,
      max_attempts: MaxAttempts::Unbounded,
    }
  }

  pub fn limited(backoff: Duration, attempts: u32) -> Self {
    Self {
      backoff,
      max_attempts: MaxAttempts::Limited(attempts.max(1)),
    }
  }

  pub fn from_config(config: &RetryConfig) -> Self {
    let backoff = Duration::from_millis(config.backoff_ms);
    match config.max_attempts {
      0 => Self::unbounded(backoff),
      attempts => Self::limited(backoff, attempts),
    }
  }

  /// Whether another attempt may follow `attempts_made` failed ones.
  pub fn allows_another(&self, attempts_made: u32) -> bool {
    match self.max_attempts {
      MaxAttempts::Unbounded => true,
      MaxAttempts::Limited(limit) => attempts_made < limit,
    }
  }
}
