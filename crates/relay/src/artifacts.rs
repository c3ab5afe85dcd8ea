//! Ephemeral scratch files, one per in-flight request.

use std::{
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::{debug, info, warn};

use crate::{
    error::{Context, Result},
    transport::ChatId,
};

/// Scratch directory handing out collision-free artifact paths.
///
/// Paths embed the chat id, a nanosecond timestamp and a process-wide
/// sequence number, so two requests never share a file even when they arrive
/// in the same instant.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    extension: String,
    seq: AtomicU64,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "mp4".into(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the scratch directory if it does not exist.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create scratch dir {}", self.root.display()))
    }

    /// Reserve a unique path for a request. Nothing is created on disk.
    pub fn reserve(&self, chat_id: ChatId, created_at: SystemTime) -> Artifact {
        let nanos = created_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let stem = format!("{}_{nanos}_{seq}", chat_id.0);
        let path = self.root.join(format!("{stem}.{}", self.extension));
        debug!(%chat_id, path = %path.display(), "artifact reserved");
        Artifact {
            path,
            stem,
            released: false,
        }
    }

    /// Remove artifacts left behind by an earlier process. Only files that
    /// follow the artifact naming scheme are touched.
    pub async fn sweep(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_artifact_name(name) {
                continue;
            }
            match remove_if_present(&entry.path()).await {
                Ok(true) => removed += 1,
                Ok(false) => {},
                Err(e) => warn!(file = name, error = %e, "failed to sweep stale artifact"),
            }
        }
        if removed > 0 {
            info!(removed, root = %self.root.display(), "swept stale artifacts");
        }
        Ok(removed)
    }
}

/// `<chat>_<nanos>_<seq>.` prefix, chat may be negative (group chats).
fn is_artifact_name(name: &str) -> bool {
    let Some((stem, _)) = name.split_once('.') else {
        return false;
    };
    let stem = stem.strip_prefix('-').unwrap_or(stem);
    let parts: Vec<&str> = stem.split('_').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Delete a file, treating "already gone" as success. Returns whether a file
/// was actually removed.
pub async fn remove_if_present(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// A reserved scratch path, exclusively owned by one request.
///
/// Dropping an unreleased artifact removes its files synchronously, which
/// covers panics in the delivery path.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    stem: String,
    released: bool,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling files yt-dlp may leave next to the output (`.part`, per-format
    /// intermediates such as `<stem>.f137.mp4`).
    fn sibling_prefix(&self) -> String {
        format!("{}.", self.stem)
    }

    /// Delete the artifact and its siblings. Safe to call when nothing was
    /// ever written.
    pub async fn release(mut self) {
        self.released = true;
        match remove_if_present(&self.path).await {
            Ok(true) => debug!(path = %self.path.display(), "artifact removed"),
            Ok(false) => {},
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove artifact"),
        }
        let Some(dir) = self.path.parent() else {
            return;
        };
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return;
        };
        let prefix = self.sibling_prefix();
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(&prefix))
                && let Err(e) = remove_if_present(&entry.path()).await
            {
                warn!(file = %entry.path().display(), error = %e, "failed to remove partial artifact");
            }
        }
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(path = %self.path.display(), "artifact dropped without release, removing");
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "failed to remove artifact on drop");
        }
        let prefix = self.sibling_prefix();
        let Some(dir) = self.path.parent() else {
            return;
        };
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                if entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| n.starts_with(&prefix))
                    && let Err(e) = std::fs::remove_file(entry.path())
                    && e.kind() != io::ErrorKind::NotFound
                {
                    warn!(
                        file = %entry.path().display(),
                        error = %e,
                        "failed to remove partial artifact on drop"
                    );
                }
            }
        }
    }
}
