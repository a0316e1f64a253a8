//! Process-wide pacing of outbound completion requests.
//!
//! Admission follows a virtual schedule: every request claims the next free
//! slot, slots are spaced one interval apart, and after an idle period up to
//! `burst` slots may already be in the past.

use std::time::Duration;

use lathe_config::RateLimitConfig;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

pub struct RateLimiter {
  interval: Duration,
  tolerance: Duration,
  next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
  /// Steady `requests_per_second` with up to `burst` back-to-back admissions.
  /// A non-positive or non-finite rate disables pacing.
  pub fn new(requests_per_second: f64, burst: u32) -> Self {
    let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
      Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::ZERO)
    } else {
      Duration::ZERO
    };
    let tolerance = interval.saturating_mul(burst.max(1) - 1);

    Self {
      interval,
      tolerance,
      next_slot: Mutex::new(None),
    }
  }

  pub fn from_config(config: &RateLimitConfig) -> Self {
    Self::new(config.requests_per_second, config.burst)
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  /// Wait until a request may be sent.
  ///
  /// The schedule lock is held while sleeping, so waiters are admitted in
  /// arrival order and one at a time.
  pub async fn take(&self) {
    if self.interval.is_zero() {
      return;
    }

    let mut next_slot = self.next_slot.lock().await;
    let now = Instant::now();
    let earliest = now.checked_sub(self.tolerance).unwrap_or(now);
    let slot = match *next_slot {
      Some(slot) if slot > earliest => slot,
      _ => earliest,
    };
    *next_slot = Some(slot + self.interval);

    if slot > now {
      trace!(wait_ms = (slot - now).as_millis() as u64, "rate limited");
      tokio::time::sleep_until(slot).await;
    }
  }
}
