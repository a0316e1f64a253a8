//! Lathe Model Provider Layer
//!
//! A single non-streaming completion call per turn, behind the
//! [ModelProvider] trait, with Anthropic and OpenAI wire formats in
//! [providers].

pub mod error;
pub mod provider;
pub mod providers;
pub mod types;

pub use error::{ModelError, Result};
pub use provider::ModelProvider;
pub use providers::build_provider;
pub use types::*;
