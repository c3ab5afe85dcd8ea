//! In-memory fakes for pipeline tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicI32, Ordering},
    },
};

use {
    async_trait::async_trait,
    reelbot_fetch::{FetchOutcome, Fetcher, SelfUpdateOutcome},
};

use crate::{
    error::{Error, Result},
    transport::{ChatId, ChatTransport, MessageHandle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send(ChatId, String),
    Edit(i32, String),
    Delete(i32),
    Video(ChatId, String),
}

/// Records every transport call; individual operations can be made to fail.
#[derive(Default)]
pub struct RecordingTransport {
    pub fail_send: bool,
    pub fail_edit: bool,
    pub fail_delete: bool,
    pub fail_video: bool,
    /// Panic inside `send_video`, after recording the call.
    pub panic_video: bool,
    pub calls: Mutex<Vec<Call>>,
    pub next_id: AtomicI32,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn video_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Video(..)))
            .count()
    }

    pub fn last_edit(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::Edit(_, text) => Some(text),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn refused(operation: &str) -> Error {
    Error::transport(operation, std::io::Error::other("Bad Request: refused by test"))
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageHandle> {
        self.record(Call::Send(chat_id, text.into()));
        if self.fail_send {
            return Err(refused("send message"));
        }
        Ok(MessageHandle {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        })
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()> {
        self.record(Call::Edit(handle.message_id, text.into()));
        if self.fail_edit {
            return Err(refused("edit message"));
        }
        Ok(())
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<()> {
        self.record(Call::Delete(handle.message_id));
        if self.fail_delete {
            return Err(refused("delete message"));
        }
        Ok(())
    }

    async fn send_video(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<()> {
        assert!(path.exists(), "artifact must exist while uploading");
        self.record(Call::Video(chat_id, caption.into()));
        if self.panic_video {
            panic!("upload blew up");
        }
        if self.fail_video {
            return Err(refused("send video"));
        }
        Ok(())
    }
}

pub enum Behavior {
    /// Write a file of this many bytes to the destination.
    Produce(u64),
    Fail {
        diagnostic: String,
        timed_out: bool,
        leave_partial: bool,
    },
    ClaimSuccessWithoutFile,
}

/// Fetcher that follows a fixed script instead of running yt-dlp.
pub struct ScriptedFetcher {
    behavior: Behavior,
    seen: Mutex<Vec<(String, PathBuf)>>,
}

impl ScriptedFetcher {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> FetchOutcome {
        self.seen
            .lock()
            .unwrap()
            .push((url.to_string(), destination.to_path_buf()));
        match &self.behavior {
            Behavior::Produce(size) => {
                let file = std::fs::File::create(destination).unwrap();
                file.set_len(*size).unwrap();
                FetchOutcome::Success {
                    file_path: destination.to_path_buf(),
                    size_bytes: *size,
                }
            },
            Behavior::Fail {
                diagnostic,
                timed_out,
                leave_partial,
            } => {
                if *leave_partial {
                    std::fs::write(destination, b"partial").unwrap();
                }
                FetchOutcome::Failure {
                    diagnostic: diagnostic.clone(),
                    timed_out: *timed_out,
                }
            },
            Behavior::ClaimSuccessWithoutFile => FetchOutcome::Success {
                file_path: destination.to_path_buf(),
                size_bytes: 1024,
            },
        }
    }

    async fn self_update(&self) -> SelfUpdateOutcome {
        SelfUpdateOutcome::Updated {
            summary: "up to date".into(),
        }
    }
}
