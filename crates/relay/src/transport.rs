use std::{fmt, path::Path};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::warn,
};

use crate::error::Result;

/// Opaque chat/session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message previously sent by the bot that can be edited or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub chat_id: ChatId,
    pub message_id: i32,
}

/// Outbound calls the pipeline makes against the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message and return a handle to it.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageHandle>;

    /// Replace the text of a previously sent message.
    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()>;

    async fn delete_message(&self, handle: MessageHandle) -> Result<()>;

    /// Upload a local file as a playable video.
    async fn send_video(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<()>;
}

/// Log-and-continue for calls whose failure must never change the outcome
/// of a request (status edits, status deletion).
pub trait LogErr<T> {
    fn log_err(self, operation: &'static str) -> Option<T>;
}

impl<T, E: fmt::Display> LogErr<T> for std::result::Result<T, E> {
    fn log_err(self, operation: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(operation, error = %e, "chat transport call failed, continuing");
                None
            },
        }
    }
}
