use std::{ffi::OsString, path::Path};

use crate::config::YtDlpConfig;

/// Format selector with three descending tiers: best single file under the
/// cap, best video under the cap merged with best audio, then anything.
pub fn format_selector(max_filesize_mb: u64) -> String {
    format!("best[filesize<{max_filesize_mb}M]/bestvideo[filesize<{max_filesize_mb}M]+bestaudio/best")
}

/// Build the argument list for downloading `url` to exactly `destination`.
///
/// Arguments are passed to the process as discrete values, never through a
/// shell. The URL follows `--` so text starting with `-` cannot be read as an
/// option.
pub fn download_args(config: &YtDlpConfig, url: &str, destination: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-f".into(),
        format_selector(config.max_filesize_mb).into(),
        "--merge-output-format".into(),
        config.merge_format.as_str().into(),
        "--no-check-certificates".into(),
        "--no-warnings".into(),
        "--user-agent".into(),
        config.user_agent.as_str().into(),
        "--socket-timeout".into(),
        config.socket_timeout_secs.to_string().into(),
        "--retries".into(),
        config.retries.to_string().into(),
        "-o".into(),
    ];
    args.push(destination.as_os_str().to_owned());
    args.push("--".into());
    args.push(url.into());
    args
}

pub fn update_args() -> Vec<OsString> {
    vec!["-U".into()]
}

pub fn version_args() -> Vec<OsString> {
    vec!["--version".into()]
}
