use std::sync::Arc;

use {
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{BotCommand, ParseMode},
    },
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use {
    reelbot_fetch::{Fetcher, SelfUpdateOutcome},
    reelbot_relay::{ChatId, ChatTransport, DeliveryOutcome, LogErr, messages},
};

use crate::{error::Result, state::BotContext};

pub const GREETING_HTML: &str = "🎬 <b>Video Downloader Bot</b>

Send me a video link from:
• YouTube / Shorts
• Instagram Reels
• TikTok
• Facebook
• Twitter/X

I'll send you the video! 📥";

/// Slash commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Update,
}

impl Command {
    /// Parse `/name`, `/name@botname` or `/name args`. Unknown commands
    /// yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

/// Commands registered with Telegram for client autocomplete.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Show supported video sources"),
        BotCommand::new("help", "Show supported video sources"),
        BotCommand::new("update", "Update the video downloader"),
    ]
}

/// What a single inbound message turned into.
#[derive(Debug)]
pub enum Dispatch {
    /// Not text, not a known command, or not a supported link.
    Ignored,
    Greeting,
    Maintenance(JoinHandle<SelfUpdateOutcome>),
    Delivery(JoinHandle<DeliveryOutcome>),
}

/// Route one inbound Telegram message. Long-running work is spawned so the
/// polling loop is never blocked.
pub async fn handle_message(msg: &Message, ctx: &BotContext) -> Result<Dispatch> {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(Dispatch::Ignored);
    };
    let chat_id = ChatId(msg.chat.id.0);

    if text.starts_with('/') {
        return match Command::parse(text) {
            Some(Command::Start | Command::Help) => {
                ctx.bot
                    .send_message(msg.chat.id, GREETING_HTML)
                    .parse_mode(ParseMode::Html)
                    .await?;
                Ok(Dispatch::Greeting)
            },
            Some(Command::Update) => {
                info!(%chat_id, "self-update requested");
                Ok(Dispatch::Maintenance(spawn_self_update(
                    Arc::clone(ctx.relay.transport()),
                    Arc::clone(ctx.relay.fetcher()),
                    chat_id,
                )))
            },
            None => {
                debug!(%chat_id, "ignoring unknown command");
                Ok(Dispatch::Ignored)
            },
        };
    }

    Ok(ctx
        .relay
        .accept(chat_id, text)
        .map_or(Dispatch::Ignored, Dispatch::Delivery))
}

/// Run `selfUpdate` and report the result in the invoking chat.
fn spawn_self_update(
    transport: Arc<dyn ChatTransport>,
    fetcher: Arc<dyn Fetcher>,
    chat_id: ChatId,
) -> JoinHandle<SelfUpdateOutcome> {
    tokio::spawn(async move {
        let status = transport
            .send_text(chat_id, messages::UPDATE_STARTED)
            .await
            .log_err("send update status");

        let outcome = fetcher.self_update().await;
        let text = match &outcome {
            SelfUpdateOutcome::Updated { summary } => format!("{}\n{summary}", messages::UPDATE_OK),
            SelfUpdateOutcome::Failed { reason } => {
                warn!(%chat_id, %reason, "self-update failed");
                messages::UPDATE_FAILED.to_string()
            },
        };

        match status {
            Some(handle) => transport.edit_text(handle, &text).await.log_err("edit update status"),
            None => transport
                .send_text(chat_id, &text)
                .await
                .map(|_| ())
                .log_err("send update result"),
        };
        outcome
    })
}
