use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for the Telegram bot connection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Long-poll timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,

    /// HTTP client timeout; must exceed the long-poll timeout.
    pub http_timeout_secs: u64,

    /// HTTP client timeout for video uploads, which can carry up to 50 MB.
    pub upload_timeout_secs: u64,

    /// Pause after a failed `getUpdates` call (seconds).
    pub poll_backoff_secs: u64,

    /// How many times a request rejected with `retry_after` is retried.
    pub retry_after_max_retries: usize,
}

impl BotConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
            ..Default::default()
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
            http_timeout_secs: 45,
            upload_timeout_secs: 600,
            poll_backoff_secs: 5,
            retry_after_max_retries: 4,
        }
    }
}
