//! Fixed texts shown to chat users. Raw extractor output never reaches them.

use reelbot_fetch::FailureCause;

pub const DOWNLOADING: &str = "⏳ Downloading...";
pub const VIDEO_CAPTION: &str = "✅ Here is your video!";
pub const ATTACHMENT_TOO_LARGE: &str = "❌ File too large for Telegram (50MB limit)";

pub const REQUIRES_AUTH: &str = "❌ This video requires login. Only public videos are supported.";
pub const PRIVATE: &str = "❌ This video is private.";
pub const UNAVAILABLE: &str = "❌ This video is unavailable or has been removed.";
pub const RATE_LIMITED: &str =
    "❌ The source is rate limiting downloads. Try again in a few minutes.";
pub const GENERIC_FAILURE: &str = "❌ Download failed. Check if video is public.";

pub const UPDATE_STARTED: &str = "🔄 Updating yt-dlp...";
pub const UPDATE_OK: &str = "✅ yt-dlp updated";
pub const UPDATE_FAILED: &str = "❌ yt-dlp update failed";

pub fn failure_text(cause: FailureCause) -> &'static str {
    match cause {
        FailureCause::RequiresAuth => REQUIRES_AUTH,
        FailureCause::Private => PRIVATE,
        FailureCause::Unavailable => UNAVAILABLE,
        FailureCause::RateLimited => RATE_LIMITED,
        FailureCause::Generic => GENERIC_FAILURE,
    }
}

/// Size in mebibytes with one decimal, e.g. `10.0MB`.
pub fn format_megabytes(size_bytes: u64) -> String {
    format!("{:.1}MB", size_bytes as f64 / (1024.0 * 1024.0))
}

pub fn uploading_text(size_bytes: u64) -> String {
    format!("📤 Uploading... ({})", format_megabytes(size_bytes))
}
