//! Durable per-channel watermarks.
//!
//! The store is a JSON object keyed by channel ID:
//!
//! ```json
//! {
//!   "UC1": { "last_published_at": "2024-01-02T00:00:00Z" },
//!   "UC2": { "last_published_at": "2024-01-03T12:30:00Z" }
//! }
//! ```
//!
//! Each watermark is the publish time of the newest video processed for that
//! channel, never the wall-clock time of the poll: YouTube surfaces some videos
//! with a delay, and a wall-clock watermark would skip those for good.

use eyre::Context;
use jiff::{SignedDuration, Timestamp, Zoned};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub last_published_at: Timestamp,
}

type StatusMap = BTreeMap<String, ChannelStatus>;

/// File-backed map from channel ID to [`ChannelStatus`].
///
/// [`CheckpointStore::update`] re-reads the file, merges one entry and writes
/// the whole map back through a temporary file and a rename. That is only
/// lossless with a single writer per channel, which the poller guarantees by
/// committing channels one after another.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    /// Last state read from or written to disk.
    snapshot: Mutex<StatusMap>,
}

impl CheckpointStore {
    /// Opens the store at `path`, creating it as an empty object if it does not
    /// exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> eyre::Result<Self> {
        let path = path.into();
        if !tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("check for checkpoint file {}", path.display()))?
        {
            tracing::info!(path = %path.display(), "creating empty checkpoint file");
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("create directory {}", parent.display()))?;
            }
            write_map(&path, &StatusMap::new()).await?;
        }

        let snapshot = read_map(&path).await?;
        tracing::debug!(
            path = %path.display(),
            channels = snapshot.len(),
            "loaded checkpoints"
        );
        Ok(Self {
            path,
            snapshot: Mutex::new(snapshot),
        })
    }

    /// The watermark for `channel_id`.
    ///
    /// Channels without a stored entry start at the beginning of the current
    /// local day.
    pub async fn get(&self, channel_id: &str) -> Timestamp {
        if let Some(status) = self.snapshot.lock().await.get(channel_id) {
            return status.last_published_at;
        }
        let fallback = start_of_today();
        tracing::debug!(channel = %channel_id, watermark = %fallback, "no checkpoint for channel yet");
        fallback
    }

    /// Durably records a new watermark for one channel, leaving every other
    /// channel's entry as it currently is on disk.
    ///
    /// A watermark older than the one already stored is ignored.
    pub async fn update(&self, channel_id: &str, last_published_at: Timestamp) -> eyre::Result<()> {
        let mut snapshot = self.snapshot.lock().await;
        let mut current = read_map(&self.path).await?;

        let new_status = ChannelStatus { last_published_at };
        match current.get(channel_id) {
            Some(existing) if existing.last_published_at > last_published_at => {
                tracing::warn!(
                    channel = %channel_id,
                    stored = %existing.last_published_at,
                    proposed = %last_published_at,
                    "refusing to move checkpoint backwards"
                );
            }
            _ => {
                current.insert(channel_id.to_string(), new_status);
                write_map(&self.path, &current).await?;
                tracing::debug!(channel = %channel_id, watermark = %last_published_at, "advanced checkpoint");
            }
        }

        *snapshot = current;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Midnight of the current day in the system time zone.
fn start_of_today() -> Timestamp {
    let now = Zoned::now();
    match now.start_of_day() {
        Ok(midnight) => midnight.timestamp(),
        Err(_) => now.timestamp() - SignedDuration::from_hours(24),
    }
}

async fn read_map(path: &Path) -> eyre::Result<StatusMap> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("read checkpoint file {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("parse checkpoint file {}", path.display()))
}

async fn write_map(path: &Path, map: &StatusMap) -> eyre::Result<()> {
    let json = serde_json::to_vec_pretty(map).context("serialize checkpoints")?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, &json)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("move {} into place", tmp.display()))?;
    Ok(())
}
