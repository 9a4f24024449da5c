pub mod ai;
pub mod config;
pub mod console;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod state;
pub mod view;
pub mod widget;

// Re-export main types for convenience
pub use ai::{ChatProvider, GeminiClient, GeminiFactory, MockFactory, MockProvider, ProviderFactory};
pub use config::Config;
pub use console::{Console, ConsoleEffect};
pub use error::{FailureKind, ProviderError};
pub use pipeline::{PendingRequest, PipelineSettings, RequestPipeline};
pub use state::{ChatMessage, ChatRole, Transcript};
pub use view::{AudienceLens, NetworkTier, ViewContext, ViewMode};
pub use widget::{ChatWidget, WidgetState, WidgetUiState};
