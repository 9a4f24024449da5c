use std::time::Duration;

use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Banner shown when the widget could not construct a provider client.
pub const CREDENTIAL_MISSING_BANNER: &str =
    "The concierge is offline: no Gemini API key is configured. Set GEMINI_API_KEY and restart to chat.";

/// Banner shown when the client failed to start for any other reason.
pub const INIT_FAILURE_BANNER: &str =
    "The concierge could not start. Check the configuration and restart to chat.";

/// Assistant reply when the provider rejects or lacks the credential.
pub const CREDENTIAL_MISSING_REPLY: &str =
    "My connection to Gemini isn't authorized right now (the API key is missing or invalid). Please let Amos know so it can be fixed.";

/// Assistant reply when the provider cannot find the model or endpoint.
pub const RESOURCE_NOT_FOUND_REPLY: &str =
    "The model behind this concierge is unavailable at the moment. Please notify Amos so the setup can be updated.";

/// Assistant reply for every other failure.
pub const GENERIC_FAILURE_REPLY: &str =
    "Connection flickered. Like a dry spell, please try again.";

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors raised while building or calling a provider client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No credential was supplied, or the provider rejected it.
    #[error("API key missing or rejected: {0}")]
    CredentialMissing(String),

    /// The provider reported the model or endpoint as not found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// An HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// The provider answered with an unexpected status code.
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered but the payload was unusable.
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// No answer within the configured request timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// User-facing failure categories. Each maps to one fixed reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    CredentialMissing,
    ResourceNotFound,
    Generic,
}

impl FailureKind {
    pub fn classify(error: &ProviderError) -> Self {
        match error {
            ProviderError::CredentialMissing(_) => FailureKind::CredentialMissing,
            ProviderError::ResourceNotFound(_) => FailureKind::ResourceNotFound,
            ProviderError::Request(err) if err.status().map(|s| s.as_u16()) == Some(404) => {
                FailureKind::ResourceNotFound
            }
            ProviderError::Status { status: 404, .. } => FailureKind::ResourceNotFound,
            ProviderError::Status { status: 401 | 403, .. } => FailureKind::CredentialMissing,
            _ => FailureKind::Generic,
        }
    }

    pub fn reply(&self) -> &'static str {
        match self {
            FailureKind::CredentialMissing => CREDENTIAL_MISSING_REPLY,
            FailureKind::ResourceNotFound => RESOURCE_NOT_FOUND_REPLY,
            FailureKind::Generic => GENERIC_FAILURE_REPLY,
        }
    }
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::classify(self)
    }

    /// Banner text for a client that could not be constructed.
    pub fn init_banner(&self) -> &'static str {
        match self.kind() {
            FailureKind::CredentialMissing => CREDENTIAL_MISSING_BANNER,
            _ => INIT_FAILURE_BANNER,
        }
    }

    /// The only text about this error an end user ever sees.
    pub fn user_message(&self) -> &'static str {
        self.kind().reply()
    }
}
