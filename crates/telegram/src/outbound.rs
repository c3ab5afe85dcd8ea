use std::{future::Future, path::Path, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        ApiError, RequestError,
        payloads::SendVideoSetters,
        prelude::*,
        types::{ChatId as TgChatId, InputFile, MessageId},
    },
    tracing::{debug, info, warn},
};

use reelbot_relay::{ChatId, ChatTransport, Error as RelayError, MessageHandle};

/// [`ChatTransport`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    upload_bot: Bot,
    retry_after_max_retries: usize,
}

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self {
            upload_bot: bot.clone(),
            bot,
            retry_after_max_retries: TELEGRAM_RETRY_AFTER_MAX_RETRIES,
        }
    }

    /// Send videos through `bot` instead, typically one whose client has a
    /// longer timeout.
    #[must_use]
    pub fn with_upload_bot(mut self, bot: Bot) -> Self {
        self.upload_bot = bot;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.retry_after_max_retries = retries;
        self
    }

    /// Retry only on Telegram's explicit `retry_after` flood control; every
    /// other error is returned to the caller untouched.
    async fn run_telegram_request_with_retry<T, F, Fut>(
        &self,
        chat_id: ChatId,
        operation: &'static str,
        mut request: F,
    ) -> Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= self.retry_after_max_retries {
                        warn!(
                            %chat_id,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        %chat_id,
                        operation,
                        retries,
                        max_retries = self.retry_after_max_retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn is_message_not_modified_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

fn tg_chat(chat_id: ChatId) -> TgChatId {
    TgChatId(chat_id.0)
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> reelbot_relay::Result<MessageHandle> {
        let message = self
            .run_telegram_request_with_retry(chat_id, "send message", || {
                let req = self.bot.send_message(tg_chat(chat_id), text);
                async move { req.await }
            })
            .await
            .map_err(|e| RelayError::transport("send message", e))?;
        debug!(%chat_id, message_id = message.id.0, "telegram status message sent");
        Ok(MessageHandle {
            chat_id,
            message_id: message.id.0,
        })
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> reelbot_relay::Result<()> {
        let result = self
            .run_telegram_request_with_retry(handle.chat_id, "edit message", || {
                let req = self.bot.edit_message_text(
                    tg_chat(handle.chat_id),
                    MessageId(handle.message_id),
                    text,
                );
                async move { req.await }
            })
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_message_not_modified_error(&e) => Ok(()),
            Err(e) => Err(RelayError::transport("edit message", e)),
        }
    }

    async fn delete_message(&self, handle: MessageHandle) -> reelbot_relay::Result<()> {
        self.run_telegram_request_with_retry(handle.chat_id, "delete message", || {
            let req = self
                .bot
                .delete_message(tg_chat(handle.chat_id), MessageId(handle.message_id));
            async move { req.await }
        })
        .await
        .map_err(|e| RelayError::transport("delete message", e))?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: &str,
    ) -> reelbot_relay::Result<()> {
        info!(%chat_id, path = %path.display(), "telegram video upload start");
        self.run_telegram_request_with_retry(chat_id, "send video", || {
            let req = self
                .upload_bot
                .send_video(tg_chat(chat_id), InputFile::file(path.to_path_buf()))
                .caption(caption)
                .supports_streaming(true);
            async move { req.await }
        })
        .await
        .map_err(|e| RelayError::transport("send video", e))?;
        info!(%chat_id, "telegram video upload done");
        Ok(())
    }
}
