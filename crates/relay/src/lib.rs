//! Download-and-delivery pipeline.
//!
//! Turns one chat message containing a supported link into one delivered
//! video (or one fixed error text), keeping a single status message updated
//! along the way and removing the scratch file on every exit path.
//!
//! The chat platform is reached only through [`ChatTransport`]; the
//! downloader only through [`reelbot_fetch::Fetcher`].

pub mod artifacts;
pub mod error;
pub mod messages;
pub mod pipeline;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    artifacts::{Artifact, ArtifactStore},
    error::{Error, Result},
    pipeline::{DeliveryOutcome, DeliveryState, FailureReason, Relay, Request},
    status::{StatusPhase, StatusReporter},
    transport::{ChatId, ChatTransport, LogErr, MessageHandle},
};
