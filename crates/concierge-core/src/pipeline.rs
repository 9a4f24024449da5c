//! Turns one user utterance into one assistant message.
//!
//! A request sleeps for the tier's artificial delay exactly once, then
//! calls the provider under a timeout. Every failure becomes an assistant
//! message with a fixed user-facing text; the raw error only goes to the
//! log.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::ai::{ChatProvider, ProviderFactory};
use crate::error::ProviderError;
use crate::prompt;
use crate::state::{ChatMessage, Transcript};
use crate::view::ViewMode;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub request_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct RequestPipeline {
    factory: Arc<dyn ProviderFactory>,
    provider: Result<Arc<dyn ChatProvider>, ProviderError>,
    mode: ViewMode,
    settings: PipelineSettings,
}

impl RequestPipeline {
    pub fn new(factory: Arc<dyn ProviderFactory>, mode: ViewMode, settings: PipelineSettings) -> Self {
        let provider = build_provider(factory.as_ref(), mode);
        Self {
            factory,
            provider,
            mode,
            settings,
        }
    }

    /// Replace the client with one built for `mode`.
    ///
    /// Requests already dispatched keep the client they captured. An init
    /// error is permanent: it is not retried here, only a new pipeline
    /// with a different factory can clear it.
    pub fn rebuild(&mut self, mode: ViewMode) {
        self.mode = mode;
        if self.provider.is_err() {
            return;
        }
        self.provider = build_provider(self.factory.as_ref(), mode);
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    pub fn init_error(&self) -> Option<&ProviderError> {
        self.provider.as_ref().err()
    }

    /// Capture everything a request needs. `None` if no client exists.
    pub fn prepare(&self, transcript: &Transcript, utterance: &str) -> Option<PendingRequest> {
        let provider = self.provider.as_ref().ok()?;
        Some(PendingRequest {
            provider: Arc::clone(provider),
            history: transcript.history().to_vec(),
            utterance: utterance.to_string(),
            delay: self.mode.tier.artificial_delay(),
            timeout: self.settings.request_timeout,
        })
    }
}

fn build_provider(
    factory: &dyn ProviderFactory,
    mode: ViewMode,
) -> Result<Arc<dyn ChatProvider>, ProviderError> {
    let instruction = prompt::compose(mode);
    match factory.build(instruction) {
        Ok(provider) => {
            debug!(
                provider = provider.name(),
                lens = mode.lens.as_str(),
                tier = mode.tier.as_str(),
                "built provider client"
            );
            Ok(provider)
        }
        Err(err) => {
            error!(context = "provider init", error = %err, "could not build provider client");
            Err(err)
        }
    }
}

/// A request captured at submit time, ready to run.
pub struct PendingRequest {
    provider: Arc<dyn ChatProvider>,
    history: Vec<ChatMessage>,
    utterance: String,
    delay: Duration,
    timeout: Duration,
}

impl PendingRequest {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn utterance(&self) -> &str {
        &self.utterance
    }

    /// Run the request to completion. Always yields an assistant message.
    pub async fn run(self) -> ChatMessage {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        debug!(
            provider = self.provider.name(),
            turns = self.history.len(),
            "dispatching chat request"
        );

        let call = self.provider.send(&self.history, &self.utterance);
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) => ChatMessage::assistant(text),
            Err(err) => {
                error!(
                    context = "chat request",
                    kind = ?err.kind(),
                    error = %err,
                    "provider call failed"
                );
                ChatMessage::assistant(err.user_message())
            }
        }
    }
}
