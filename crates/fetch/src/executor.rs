use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    tokio::process::Command,
    tracing::{debug, info, warn},
};

use crate::{
    command,
    config::YtDlpConfig,
    error::{Context, Error, Result},
};

/// Diagnostic for a zero exit that left no usable file. Classifies as
/// [`FailureCause::Generic`](crate::FailureCause::Generic).
pub const MISSING_OUTPUT_DIAGNOSTIC: &str = "yt-dlp exited 0 but wrote no output file";

/// Result of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A non-empty file exists at the reserved destination.
    Success { file_path: PathBuf, size_bytes: u64 },
    /// Nothing usable was produced. `diagnostic` is the tool's raw output and
    /// must never be shown to the end user.
    Failure { diagnostic: String, timed_out: bool },
}

impl FetchOutcome {
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self::Failure {
            diagnostic: diagnostic.into(),
            timed_out: false,
        }
    }
}

/// Result of the best-effort maintenance update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfUpdateOutcome {
    Updated { summary: String },
    Failed { reason: String },
}

/// Downloads media to a caller-chosen path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` to exactly `destination`. Never panics or errors;
    /// every problem is folded into [`FetchOutcome::Failure`].
    async fn fetch(&self, url: &str, destination: &Path) -> FetchOutcome;

    /// Update the underlying tool. Failures are logged and reported, never
    /// propagated.
    async fn self_update(&self) -> SelfUpdateOutcome;
}

enum RunResult {
    Exited {
        success: bool,
        exit_code: i32,
        stdout: String,
        diagnostic: String,
    },
    TimedOut,
}

/// [`Fetcher`] backed by the `yt-dlp` command line tool.
#[derive(Debug, Clone, Default)]
pub struct YtDlp {
    config: YtDlpConfig,
}

impl YtDlp {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &YtDlpConfig {
        &self.config
    }

    /// Ask the binary for its version; used as a startup probe.
    pub async fn probe_version(&self) -> Result<String> {
        match self
            .run(command::version_args(), Duration::from_secs(10))
            .await?
        {
            RunResult::Exited {
                success: true,
                stdout,
                ..
            } => Ok(stdout.trim().to_string()),
            RunResult::Exited {
                exit_code,
                diagnostic,
                ..
            } => Err(Error::message(format!(
                "yt-dlp --version exited with {exit_code}: {}",
                diagnostic.trim()
            ))),
            RunResult::TimedOut => Err(Error::message("yt-dlp --version timed out")),
        }
    }

    async fn run(&self, args: Vec<OsString>, timeout: Duration) -> Result<RunResult> {
        let binary = &self.config.binary;
        debug!(
            binary = %binary.display(),
            ?args,
            timeout_secs = timeout.as_secs(),
            "running yt-dlp"
        );

        let mut cmd = Command::new(binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout kills the child.
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| Error::Spawn {
            binary: binary.display().to_string(),
            source,
        })?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output.context("failed to wait for yt-dlp")?;
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let diagnostic = if stderr.trim().is_empty() {
                    stdout.clone()
                } else {
                    stderr
                };
                Ok(RunResult::Exited {
                    success: output.status.success(),
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout,
                    diagnostic: truncate_tail(diagnostic, self.config.max_diagnostic_bytes),
                })
            },
            Err(_) => Ok(RunResult::TimedOut),
        }
    }
}

#[async_trait]
impl Fetcher for YtDlp {
    async fn fetch(&self, url: &str, destination: &Path) -> FetchOutcome {
        let started = Instant::now();
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let args = command::download_args(&self.config, url, destination);

        let run = match self.run(args, timeout).await {
            Ok(run) => run,
            Err(e) => {
                warn!(error = %e, "yt-dlp could not be started");
                return FetchOutcome::failure(e.to_string());
            },
        };

        match run {
            RunResult::TimedOut => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    destination = %destination.display(),
                    "yt-dlp timed out, process killed"
                );
                FetchOutcome::Failure {
                    diagnostic: format!("yt-dlp timed out after {}s", timeout.as_secs()),
                    timed_out: true,
                }
            },
            RunResult::Exited {
                success: false,
                exit_code,
                diagnostic,
                ..
            } => {
                warn!(
                    exit_code,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    diagnostic = %diagnostic.trim(),
                    "yt-dlp failed"
                );
                FetchOutcome::failure(diagnostic)
            },
            RunResult::Exited {
                success: true,
                diagnostic,
                ..
            } => match tokio::fs::metadata(destination).await {
                Ok(meta) if meta.is_file() && meta.len() > 0 => {
                    info!(
                        destination = %destination.display(),
                        size_bytes = meta.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "yt-dlp download complete"
                    );
                    FetchOutcome::Success {
                        file_path: destination.to_path_buf(),
                        size_bytes: meta.len(),
                    }
                },
                // Exit status alone is not trusted: yt-dlp occasionally exits 0
                // without writing the output file.
                // Tool output here only echoes URLs and ids, never a cause.
                _ => {
                    warn!(
                        destination = %destination.display(),
                        diagnostic = %diagnostic.trim(),
                        "yt-dlp exited successfully but produced no usable file"
                    );
                    FetchOutcome::failure(MISSING_OUTPUT_DIAGNOSTIC)
                },
            },
        }
    }

    async fn self_update(&self) -> SelfUpdateOutcome {
        let timeout = Duration::from_secs(self.config.update_timeout_secs);
        info!(binary = %self.config.binary.display(), "updating yt-dlp");

        match self.run(command::update_args(), timeout).await {
            Ok(RunResult::Exited {
                success: true,
                stdout,
                ..
            }) => {
                let summary = stdout
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("up to date")
                    .trim()
                    .to_string();
                info!(%summary, "yt-dlp update finished");
                SelfUpdateOutcome::Updated { summary }
            },
            Ok(RunResult::Exited {
                exit_code,
                diagnostic,
                ..
            }) => {
                warn!(exit_code, diagnostic = %diagnostic.trim(), "yt-dlp update failed");
                SelfUpdateOutcome::Failed {
                    reason: format!("exit code {exit_code}"),
                }
            },
            Ok(RunResult::TimedOut) => {
                warn!(timeout_secs = timeout.as_secs(), "yt-dlp update timed out");
                SelfUpdateOutcome::Failed {
                    reason: "timed out".into(),
                }
            },
            Err(e) => {
                warn!(error = %e, "yt-dlp update could not be started");
                SelfUpdateOutcome::Failed {
                    reason: e.to_string(),
                }
            },
        }
    }
}

/// Keep the last `max_bytes` of `text`; extractor errors are printed last.
fn truncate_tail(text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("[... output truncated]\n{}", &text[start..])
}
