//! Telegram binding for reelbot.
//!
//! Implements [`reelbot_relay::ChatTransport`] on top of teloxide, runs the
//! long-polling loop and routes inbound messages to either the command
//! surface or the delivery pipeline.

pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod state;

#[cfg(test)]
mod mock_api;

pub use {
    config::BotConfig,
    error::{Error, Result},
    outbound::TelegramTransport,
    state::BotContext,
};
