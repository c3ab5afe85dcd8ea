//! Shared error plumbing used across all reelbot crates.

pub mod error;

pub use error::FromMessage;
