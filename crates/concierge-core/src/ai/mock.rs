//! Scripted provider for tests and offline demos.
//!
//! Outcomes are queued ahead of time; once the queue is empty every call
//! gets the default reply. All calls are recorded for verification.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ChatProvider, ProviderFactory};
use crate::error::{ProviderError, Result};
use crate::state::ChatMessage;

/// What the mock does for one call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Reply(String),
    CredentialMissing,
    ResourceNotFound,
    Malformed,
    /// Never resolves
    Hang,
}

/// One recorded `send` call
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system_instruction: String,
    pub history: Vec<ChatMessage>,
    pub utterance: String,
}

struct MockState {
    outcomes: VecDeque<MockOutcome>,
    default_reply: String,
    calls: Vec<MockCall>,
    built: Vec<String>,
    fail_build: bool,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct MockProvider {
    system_instruction: String,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, history: &[ChatMessage], utterance: &str) -> Result<String> {
        let outcome = {
            let mut state = lock(&self.state);
            state.calls.push(MockCall {
                system_instruction: self.system_instruction.clone(),
                history: history.to_vec(),
                utterance: utterance.to_string(),
            });
            let default_reply = state.default_reply.clone();
            state
                .outcomes
                .pop_front()
                .unwrap_or(MockOutcome::Reply(default_reply))
        };

        match outcome {
            MockOutcome::Reply(text) => Ok(text),
            MockOutcome::CredentialMissing => {
                Err(ProviderError::CredentialMissing("mock credential rejected".to_string()))
            }
            MockOutcome::ResourceNotFound => {
                Err(ProviderError::ResourceNotFound("models/mock".to_string()))
            }
            MockOutcome::Malformed => {
                Err(ProviderError::InvalidResponse("mock malformed payload".to_string()))
            }
            MockOutcome::Hang => std::future::pending().await,
        }
    }
}

/// Factory handing out [`MockProvider`]s that share one script and call log.
#[derive(Clone)]
pub struct MockFactory {
    state: Arc<Mutex<MockState>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                outcomes: VecDeque::new(),
                default_reply: "Amos is a software engineer focused on resilient AI.".to_string(),
                calls: Vec::new(),
                built: Vec::new(),
                fail_build: false,
            })),
        }
    }

    pub fn with_default_reply(self, reply: impl Into<String>) -> Self {
        lock(&self.state).default_reply = reply.into();
        self
    }

    /// Make every `build` fail as if no credential were configured.
    pub fn without_credential(self) -> Self {
        lock(&self.state).fail_build = true;
        self
    }

    pub fn push_outcome(&self, outcome: MockOutcome) {
        lock(&self.state).outcomes.push_back(outcome);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.state).calls.clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.state).calls.len()
    }

    /// System instructions passed to `build`, oldest first.
    pub fn built_instructions(&self) -> Vec<String> {
        lock(&self.state).built.clone()
    }
}

impl Default for MockFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for MockFactory {
    fn build(&self, system_instruction: String) -> Result<Arc<dyn ChatProvider>> {
        let mut state = lock(&self.state);
        if state.fail_build {
            return Err(ProviderError::CredentialMissing("mock has no credential".to_string()));
        }
        state.built.push(system_instruction.clone());
        drop(state);

        Ok(Arc::new(MockProvider {
            system_instruction,
            state: Arc::clone(&self.state),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[tokio::test]
    async fn test_outcomes_then_default() {
        let factory = MockFactory::new().with_default_reply("default");
        factory.push_outcome(MockOutcome::Reply("first".to_string()));
        factory.push_outcome(MockOutcome::ResourceNotFound);

        let provider = factory.build("sys".to_string()).ok().unwrap();
        assert_eq!(provider.send(&[], "a").await.unwrap(), "first");
        let err = provider.send(&[], "b").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::ResourceNotFound);
        assert_eq!(provider.send(&[], "c").await.unwrap(), "default");

        let calls = factory.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].utterance, "c");
        assert_eq!(calls[0].system_instruction, "sys");
    }

    #[test]
    fn test_build_failure() {
        let factory = MockFactory::new().without_credential();
        let err = factory.build("sys".to_string()).err().unwrap();
        assert_eq!(err.kind(), FailureKind::CredentialMissing);
        assert!(factory.built_instructions().is_empty());
    }
}
