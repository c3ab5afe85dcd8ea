//! Media fetching for reelbot.
//!
//! Wraps the external `yt-dlp` extraction tool: decides which chat text is a
//! supported link, builds the bounded invocation, runs it under a wall-clock
//! timeout and maps its diagnostics onto a small set of user-facing causes.

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod failure;
pub mod link;

pub use {
    config::YtDlpConfig,
    error::{Error, Result},
    executor::{FetchOutcome, Fetcher, MISSING_OUTPUT_DIAGNOSTIC, SelfUpdateOutcome, YtDlp},
    failure::FailureCause,
    link::is_supported_link,
};
