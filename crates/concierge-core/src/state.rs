//! UI-agnostic conversation state
//!
//! These types are shared by every front end and don't depend on any
//! specific UI framework.

use serde::{Deserialize, Serialize};

/// Opening line shown in every new conversation. Never sent to the provider.
pub const GREETING: &str =
    "Jambo! I am Amos's concierge. What would you like to know about Prism AI or his \"Resilient\" code?";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Role name in the provider's turn format
    pub fn provider_role(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        }
    }
}

/// Append-only message sequence, always starting with the greeting.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Everything after the greeting, i.e. what the provider sees as context.
    pub fn history(&self) -> &[ChatMessage] {
        &self.messages[1..]
    }

    /// Truncate back to the greeting.
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transcript_has_only_greeting() {
        let transcript = Transcript::new();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].content, GREETING);
        assert_eq!(transcript.messages()[0].role, ChatRole::Assistant);
        assert!(transcript.history().is_empty());
    }

    #[test]
    fn test_history_skips_greeting() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("hi"));
        transcript.push(ChatMessage::assistant("hello"));

        let history = transcript.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatMessage::user("hi"));
    }

    #[test]
    fn test_clear_keeps_greeting() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("one"));
        transcript.push(ChatMessage::assistant("two"));
        transcript.clear();

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().map(|m| m.content.as_str()), Some(GREETING));
    }

    #[test]
    fn test_provider_roles() {
        assert_eq!(ChatRole::User.provider_role(), "user");
        assert_eq!(ChatRole::Assistant.provider_role(), "model");
    }
}
