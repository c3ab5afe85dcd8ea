use {
    serde::{Deserialize, Serialize},
    std::path::PathBuf,
    tracing::warn,
};

/// Default name of the extractor binary looked up on `PATH`.
pub const YTDLP_BINARY: &str = "yt-dlp";

/// Browser user agent presented to video hosts.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Invocation policy for the `yt-dlp` extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct YtDlpConfig {
    /// Binary to execute.
    pub binary: PathBuf,

    /// Hard wall-clock limit for one download.
    pub timeout_secs: u64,

    /// Wall-clock limit for `yt-dlp -U`.
    pub update_timeout_secs: u64,

    /// Largest file the chat transport accepts, in megabytes.
    pub max_filesize_mb: u64,

    /// Container the downloaded streams are merged into.
    pub merge_format: String,

    /// Per-socket network timeout passed to yt-dlp.
    pub socket_timeout_secs: u64,

    /// yt-dlp's own retry count for failed network requests.
    pub retries: u32,

    pub user_agent: String,

    /// Keep at most this many bytes of stderr/stdout for classification.
    pub max_diagnostic_bytes: usize,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(YTDLP_BINARY),
            timeout_secs: 180,
            update_timeout_secs: 60,
            max_filesize_mb: 50,
            merge_format: "mp4".into(),
            socket_timeout_secs: 30,
            retries: 3,
            user_agent: DEFAULT_USER_AGENT.into(),
            max_diagnostic_bytes: 64 * 1024,
        }
    }
}

impl YtDlpConfig {
    /// Resolve the binary: an explicit existing path wins, then `PATH`, then
    /// the bare name (the spawn error is reported at fetch time).
    pub fn resolve_binary(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit {
            if path.is_file() {
                return path;
            }
            warn!(
                path = %path.display(),
                "configured yt-dlp binary not found, falling back to PATH lookup"
            );
        }
        which::which(YTDLP_BINARY).unwrap_or_else(|_| PathBuf::from(YTDLP_BINARY))
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }
}
