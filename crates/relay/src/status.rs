use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    messages,
    transport::{ChatId, ChatTransport, LogErr, MessageHandle},
};

/// Phases of the single status message owned by a request. Only ever moves
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusPhase {
    Queued,
    Downloading,
    Uploading,
    Terminal,
}

/// Owns the one progressively edited status message of a request.
///
/// Terminal operations consume the reporter, so at most one terminal edit or
/// deletion can happen. Transport failures are logged and swallowed.
pub struct StatusReporter {
    transport: Arc<dyn ChatTransport>,
    chat_id: ChatId,
    handle: Option<MessageHandle>,
    phase: StatusPhase,
}

impl StatusReporter {
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: ChatId) -> Self {
        Self {
            transport,
            chat_id,
            handle: None,
            phase: StatusPhase::Queued,
        }
    }

    pub fn phase(&self) -> StatusPhase {
        self.phase
    }

    pub fn handle(&self) -> Option<MessageHandle> {
        self.handle
    }

    fn advance(&mut self, next: StatusPhase) -> bool {
        if next <= self.phase {
            warn!(
                chat_id = %self.chat_id,
                from = ?self.phase,
                to = ?next,
                "ignoring backwards status transition"
            );
            return false;
        }
        debug!(chat_id = %self.chat_id, from = ?self.phase, to = ?next, "status phase");
        self.phase = next;
        true
    }

    /// Post the status message. If posting fails the request continues
    /// without a visible status.
    pub async fn downloading(&mut self) {
        if !self.advance(StatusPhase::Downloading) {
            return;
        }
        self.handle = self
            .transport
            .send_text(self.chat_id, messages::DOWNLOADING)
            .await
            .log_err("send status");
    }

    pub async fn uploading(&mut self, size_bytes: u64) {
        if !self.advance(StatusPhase::Uploading) {
            return;
        }
        self.edit(&messages::uploading_text(size_bytes), "edit status (uploading)")
            .await;
    }

    /// Terminal: replace the status with a final text.
    pub async fn finish_with(mut self, text: &str) {
        if self.advance(StatusPhase::Terminal) {
            self.edit(text, "edit status (terminal)").await;
        }
    }

    /// Terminal: remove the status message.
    pub async fn clear(mut self) {
        if !self.advance(StatusPhase::Terminal) {
            return;
        }
        if let Some(handle) = self.handle {
            self.transport
                .delete_message(handle)
                .await
                .log_err("delete status");
        }
    }

    async fn edit(&self, text: &str, operation: &'static str) {
        if let Some(handle) = self.handle {
            self.transport.edit_text(handle, text).await.log_err(operation);
        }
    }
}
