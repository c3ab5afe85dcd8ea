use std::time::Duration;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    config::BotConfig,
    error::{Context, Result},
    handlers,
    state::BotContext,
};

/// Build a bot whose HTTP client outlives the long-poll timeout, so the
/// client never aborts a `getUpdates` before Telegram answers.
pub fn build_bot(config: &BotConfig) -> Result<Bot> {
    bot_with_timeout(config, config.http_timeout_secs)
}

/// Build the bot used for video uploads. A 50 MB upload on a slow link
/// easily outlasts the polling client's timeout.
pub fn build_upload_bot(config: &BotConfig) -> Result<Bot> {
    bot_with_timeout(config, config.upload_timeout_secs)
}

fn bot_with_timeout(config: &BotConfig, timeout_secs: u64) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Verify credentials, clear any webhook, register commands and spawn the
/// polling loop. The loop runs until `cancel` fires or another instance
/// takes over the token.
pub async fn start_polling(
    ctx: BotContext,
    config: &BotConfig,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let bot = ctx.bot.clone();

    let me = bot
        .get_me()
        .await
        .context("telegram getMe failed, check BOT_TOKEN")?;
    let bot_username = me.username.clone();

    // Long polling does not work while a webhook is set.
    bot.delete_webhook()
        .send()
        .await
        .context("failed to clear telegram webhook")?;

    if let Err(e) = bot.set_my_commands(handlers::bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let poll_timeout = config.poll_timeout_secs;
    let backoff = Duration::from_secs(config.poll_backoff_secs);

    Ok(tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("telegram polling stopped");
                    break;
                },
                result = bot
                    .get_updates()
                    .offset(offset)
                    .timeout(poll_timeout)
                    .allowed_updates(vec![AllowedUpdate::Message])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                if let Err(e) = handlers::handle_message(&msg, &ctx).await {
                                    error!(
                                        chat_id = msg.chat.id.0,
                                        error = %e,
                                        "error handling telegram message"
                                    );
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        warn!(
                            "telegram polling disabled: another instance is already running with this token"
                        );
                        cancel.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {},
                    }
                },
            }
        }
    }))
}
