pub mod gemini;
pub mod mock;

pub use gemini::{GeminiClient, GeminiFactory};
pub use mock::{MockFactory, MockProvider};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::ChatMessage;

/// A generative-text backend with its system instruction already bound.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Send `utterance` as a new user turn on top of `history`.
    async fn send(&self, history: &[ChatMessage], utterance: &str) -> Result<String>;
}

/// Builds a provider client for a given system instruction.
///
/// Called again whenever the view mode changes, since the instruction is
/// fixed at construction.
pub trait ProviderFactory: Send + Sync {
    fn build(&self, system_instruction: String) -> Result<Arc<dyn ChatProvider>>;
}
