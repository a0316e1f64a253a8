// Lathe Core Library

pub mod dispatcher;
pub mod model;
pub mod rate_limit;
pub mod retry;
pub mod thread;
pub mod tools;

pub use dispatcher::{DispatchError, Dispatcher, Prompter};
pub use rate_limit::RateLimiter;
pub use retry::{MaxAttempts, RetryPolicy};
pub use thread::{Thread, ThreadError};
