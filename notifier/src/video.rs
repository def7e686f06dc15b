//! Validated video records and their lifecycle classification.

use crate::youtube_api::Video;
use jiff::Timestamp;
use std::fmt;

/// What YouTube reports in `snippet.liveBroadcastContent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastState {
    None,
    Upcoming,
    Live,
}

impl std::str::FromStr for BroadcastState {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "upcoming" => Ok(Self::Upcoming),
            "live" => Ok(Self::Live),
            other => Err(eyre::eyre!("unknown liveBroadcastContent {other:?}")),
        }
    }
}

/// A video as reported by the platform, after shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVideo {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: Timestamp,
    pub broadcast_state: BroadcastState,
    pub scheduled_start_time: Option<Timestamp>,
    pub actual_end_time: Option<Timestamp>,
    /// Whether YouTube attached live streaming details, i.e. this is, was, or will
    /// be a stream.
    pub is_stream: bool,
}

impl TryFrom<Video> for RawVideo {
    type Error = eyre::Report;

    fn try_from(video: Video) -> Result<Self, Self::Error> {
        let Some(snippet) = video.snippet else {
            eyre::bail!("video {} has no snippet", video.id);
        };
        let missing = |field: &str| eyre::eyre!("video {} has no snippet.{field}", video.id);
        let published_at = snippet.published_at.ok_or_else(|| missing("publishedAt"))?;
        let channel_id = snippet.channel_id.ok_or_else(|| missing("channelId"))?;
        let title = snippet.title.ok_or_else(|| missing("title"))?;
        let channel_title = snippet
            .channel_title
            .ok_or_else(|| missing("channelTitle"))?;
        let broadcast_state = match snippet.live_broadcast_content.as_deref() {
            // a missing field is how plain uploads are sometimes reported
            None => BroadcastState::None,
            Some(state) => state
                .parse::<BroadcastState>()
                .map_err(|e: eyre::Report| e.wrap_err(format!("classify video {}", video.id)))?,
        };
        let is_stream = video.live_streaming_details.is_some();
        let details = video.live_streaming_details.unwrap_or_default();
        Ok(Self {
            id: video.id,
            title,
            channel_id,
            channel_title,
            published_at,
            broadcast_state,
            scheduled_start_time: details.scheduled_start_time,
            actual_end_time: details.actual_end_time,
            is_stream,
        })
    }
}

/// Where a video is in its broadcast lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// An ordinary upload.
    Uploaded,
    /// A scheduled stream that has not started.
    Upcoming,
    Live,
    /// A stream that is over. Never announced.
    Ended,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uploaded => "uploaded",
            Self::Upcoming => "upcoming",
            Self::Live => "live",
            Self::Ended => "ended",
        })
    }
}

/// A classified video, ready for filtering and dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub video_id: String,
    pub channel_id: String,
    pub channel_title: String,
    pub title: String,
    pub published_at: Timestamp,
    pub lifecycle_state: LifecycleState,
    /// Only set for [`LifecycleState::Upcoming`].
    pub scheduled_start_time: Option<Timestamp>,
}

impl VideoRecord {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// Maps a platform record onto its lifecycle state.
///
/// An end time trumps everything else: YouTube keeps reporting some finished
/// streams as `live` for a while, and those must not be announced.
pub fn classify(raw: RawVideo) -> VideoRecord {
    let (lifecycle_state, scheduled_start_time) = if raw.actual_end_time.is_some() {
        (LifecycleState::Ended, None)
    } else {
        match raw.broadcast_state {
            BroadcastState::Upcoming => (LifecycleState::Upcoming, raw.scheduled_start_time),
            BroadcastState::Live => (LifecycleState::Live, None),
            BroadcastState::None => (LifecycleState::Uploaded, None),
        }
    };

    VideoRecord {
        video_id: raw.id,
        channel_id: raw.channel_id,
        channel_title: raw.channel_title,
        title: raw.title,
        published_at: raw.published_at,
        lifecycle_state,
        scheduled_start_time,
    }
}

/// Validates a batch of platform records.
///
/// Records with an unexpected shape are logged and skipped; the rest go through.
pub fn validate_all(videos: impl IntoIterator<Item = Video>) -> Vec<RawVideo> {
    videos
        .into_iter()
        .filter_map(|video| {
            let id = video.id.clone();
            match RawVideo::try_from(video) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    tracing::warn!(video_id = %id, error = %e, "skipping malformed video record");
                    None
                }
            }
        })
        .collect()
}
