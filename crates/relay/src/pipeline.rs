use std::{sync::Arc, time::SystemTime};

use {
    reelbot_fetch::{FailureCause, FetchOutcome, Fetcher, is_supported_link},
    tokio::task::JoinHandle,
    tracing::{Instrument, debug, info, info_span, warn},
};

use crate::{
    artifacts::{Artifact, ArtifactStore},
    messages,
    status::StatusReporter,
    transport::{ChatId, ChatTransport},
};

/// One link-to-delivery cycle for a single chat message.
#[derive(Debug, Clone)]
pub struct Request {
    pub chat_id: ChatId,
    pub source_url: String,
    pub created_at: SystemTime,
}

impl Request {
    pub fn new(chat_id: ChatId, source_url: impl Into<String>) -> Self {
        Self {
            chat_id,
            source_url: source_url.into(),
            created_at: SystemTime::now(),
        }
    }
}

/// Per-request delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Queued,
    Downloading,
    Classifying,
    Uploading,
    Delivered,
    Failed,
}

impl DeliveryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    pub fn can_advance_to(self, next: Self) -> bool {
        use DeliveryState::*;
        matches!(
            (self, next),
            (Queued, Downloading)
                | (Downloading, Classifying | Failed)
                | (Classifying, Uploading | Failed)
                | (Uploading, Delivered | Failed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Fetch(FailureCause),
    /// The transport refused the upload, typically over its size limit.
    AttachmentTooLarge,
}

/// Terminal result of one request. Never an error: every failure is already
/// reported to the user when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { size_bytes: u64 },
    Failed(FailureReason),
}

/// Everything a pipeline run needs, injected explicitly.
pub struct Relay {
    transport: Arc<dyn ChatTransport>,
    fetcher: Arc<dyn Fetcher>,
    artifacts: ArtifactStore,
}

impl Relay {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        fetcher: Arc<dyn Fetcher>,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            transport,
            fetcher,
            artifacts,
        }
    }

    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.transport
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Start an independent delivery task for `text` if it is a supported
    /// link. Anything else is ignored without a reply.
    pub fn accept(self: &Arc<Self>, chat_id: ChatId, text: &str) -> Option<JoinHandle<DeliveryOutcome>> {
        if !is_supported_link(text) {
            debug!(%chat_id, "ignoring unsupported text");
            return None;
        }
        let request = Request::new(chat_id, text.trim());
        let relay = Arc::clone(self);
        let span = info_span!("delivery", %chat_id);
        Some(tokio::spawn(
            async move { relay.deliver(request).await }.instrument(span),
        ))
    }

    /// Run one request to a terminal state. The scratch file is gone when
    /// this returns.
    pub async fn deliver(&self, request: Request) -> DeliveryOutcome {
        let artifact = self.artifacts.reserve(request.chat_id, request.created_at);
        let mut status = StatusReporter::new(Arc::clone(&self.transport), request.chat_id);
        let mut state = DeliveryState::Queued;

        advance(&mut state, DeliveryState::Downloading);
        status.downloading().await;

        let fetched = self
            .fetcher
            .fetch(&request.source_url, artifact.path())
            .await;

        let outcome = match fetched {
            FetchOutcome::Success { size_bytes, .. } => {
                advance(&mut state, DeliveryState::Classifying);
                match artifact_size(&artifact).await {
                    Some(on_disk) => {
                        if on_disk != size_bytes {
                            debug!(reported = size_bytes, on_disk, "artifact size changed after fetch");
                        }
                        self.upload(&request, &artifact, on_disk, status, &mut state)
                            .await
                    },
                    None => {
                        warn!(path = %artifact.path().display(), "fetch reported success but artifact is missing");
                        advance(&mut state, DeliveryState::Failed);
                        status.finish_with(messages::GENERIC_FAILURE).await;
                        DeliveryOutcome::Failed(FailureReason::Fetch(FailureCause::Generic))
                    },
                }
            },
            FetchOutcome::Failure {
                diagnostic,
                timed_out,
            } => {
                let cause = FailureCause::from_failure(&diagnostic, timed_out);
                info!(%cause, timed_out, "fetch failed");
                advance(&mut state, DeliveryState::Failed);
                status.finish_with(messages::failure_text(cause)).await;
                DeliveryOutcome::Failed(FailureReason::Fetch(cause))
            },
        };

        artifact.release().await;
        debug_assert!(state.is_terminal());
        outcome
    }

    async fn upload(
        &self,
        request: &Request,
        artifact: &Artifact,
        size_bytes: u64,
        mut status: StatusReporter,
        state: &mut DeliveryState,
    ) -> DeliveryOutcome {
        advance(state, DeliveryState::Uploading);
        status.uploading(size_bytes).await;

        match self
            .transport
            .send_video(request.chat_id, artifact.path(), messages::VIDEO_CAPTION)
            .await
        {
            Ok(()) => {
                advance(state, DeliveryState::Delivered);
                status.clear().await;
                info!(size_bytes, "video delivered");
                DeliveryOutcome::Delivered { size_bytes }
            },
            Err(e) => {
                warn!(size_bytes, error = %e, "video upload rejected");
                advance(state, DeliveryState::Failed);
                status.finish_with(messages::ATTACHMENT_TOO_LARGE).await;
                DeliveryOutcome::Failed(FailureReason::AttachmentTooLarge)
            },
        }
    }
}

fn advance(state: &mut DeliveryState, next: DeliveryState) {
    debug_assert!(
        state.can_advance_to(next),
        "invalid delivery transition {state:?} -> {next:?}"
    );
    debug!(from = ?*state, to = ?next, "delivery state");
    *state = next;
}

/// Size of a non-empty artifact file, `None` if absent or empty.
async fn artifact_size(artifact: &Artifact) -> Option<u64> {
    tokio::fs::metadata(artifact.path())
        .await
        .ok()
        .filter(|m| m.is_file() && m.len() > 0)
        .map(|m| m.len())
}
