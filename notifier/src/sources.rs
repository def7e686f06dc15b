//! Where channels and their new videos come from.
//!
//! The poller only talks to the traits in this module. The YouTube-backed
//! implementations sit next to them and reach the API through [`VideoCatalog`].

use crate::Channel;
use crate::video::{self, VideoRecord};
use crate::youtube_api::{FeedEntry, Video, YouTubeClient};
use eyre::Context;
use futures::TryStreamExt;
use jiff::Timestamp;
use std::future::Future;

/// Enumerates the channels to poll.
pub trait ChannelRegistry {
    fn channels(&self) -> impl Future<Output = eyre::Result<Vec<Channel>>> + Send;
}

/// New uploads of a channel, with full metadata.
pub trait UploadSource {
    /// Uploads published in `[from, to)`; `to = None` means "up to now".
    fn fetch(
        &self,
        channel_id: &str,
        from: Timestamp,
        to: Option<Timestamp>,
    ) -> impl Future<Output = eyre::Result<Vec<VideoRecord>>> + Send;
}

/// Cheap detection of a channel's most recent live or upcoming stream.
pub trait LiveStreamSource {
    /// At most one record, and only for live-streaming content published no
    /// earlier than `from`.
    fn fetch(
        &self,
        channel_id: &str,
        from: Timestamp,
    ) -> impl Future<Output = eyre::Result<Vec<VideoRecord>>> + Send;
}

/// The video lookups the YouTube-backed sources are built from.
pub trait VideoCatalog {
    /// IDs of videos the channel uploaded in `[from, to)`, newest first.
    fn list_upload_activities(
        &self,
        channel_id: &str,
        from: Timestamp,
        to: Option<Timestamp>,
    ) -> impl Future<Output = eyre::Result<Vec<String>>> + Send;

    fn list_videos(
        &self,
        video_ids: &[String],
    ) -> impl Future<Output = eyre::Result<Vec<Video>>> + Send;

    fn latest_feed_entry(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = eyre::Result<Option<FeedEntry>>> + Send;
}

impl VideoCatalog for YouTubeClient {
    async fn list_upload_activities(
        &self,
        channel_id: &str,
        from: Timestamp,
        to: Option<Timestamp>,
    ) -> eyre::Result<Vec<String>> {
        YouTubeClient::list_upload_activities(self, channel_id, from, to).await
    }

    async fn list_videos(&self, video_ids: &[String]) -> eyre::Result<Vec<Video>> {
        YouTubeClient::list_videos(self, video_ids).await
    }

    async fn latest_feed_entry(&self, channel_id: &str) -> eyre::Result<Option<FeedEntry>> {
        YouTubeClient::latest_feed_entry(self, channel_id).await
    }
}

impl ChannelRegistry for YouTubeClient {
    async fn channels(&self) -> eyre::Result<Vec<Channel>> {
        let channels: Vec<Channel> = self
            .list_subscriptions()
            .map_ok(|subscription| Channel {
                id: subscription.snippet.resource_id.channel_id,
                name: subscription.snippet.title,
            })
            .try_collect()
            .await
            .context("list subscribed channels")?;
        tracing::info!(channels = channels.len(), "enumerated subscriptions");
        Ok(channels)
    }
}

/// Uploads via `activities.list` followed by one batched `videos.list`.
#[derive(Debug, Clone)]
pub struct ActivityUploads<C = YouTubeClient> {
    yt: C,
}

impl<C> ActivityUploads<C> {
    pub fn new(yt: C) -> Self {
        Self { yt }
    }
}

impl<C: VideoCatalog + Sync> UploadSource for ActivityUploads<C> {
    async fn fetch(
        &self,
        channel_id: &str,
        from: Timestamp,
        to: Option<Timestamp>,
    ) -> eyre::Result<Vec<VideoRecord>> {
        let video_ids = self
            .yt
            .list_upload_activities(channel_id, from, to)
            .await
            .context("list upload activities")?;
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let videos = self
            .yt
            .list_videos(&video_ids)
            .await
            .context("look up uploaded videos")?;
        Ok(video::validate_all(videos)
            .into_iter()
            .map(video::classify)
            .collect())
    }
}

/// Stream detection through the channel's public feed.
///
/// The feed is free to read, so the metadata lookup (which costs quota) only
/// happens when the newest feed entry is new since the last poll.
#[derive(Debug, Clone)]
pub struct FeedLiveStreams<C = YouTubeClient> {
    yt: C,
}

impl<C> FeedLiveStreams<C> {
    pub fn new(yt: C) -> Self {
        Self { yt }
    }
}

impl<C: VideoCatalog + Sync> LiveStreamSource for FeedLiveStreams<C> {
    async fn fetch(&self, channel_id: &str, from: Timestamp) -> eyre::Result<Vec<VideoRecord>> {
        let Some(entry) = self
            .yt
            .latest_feed_entry(channel_id)
            .await
            .context("read channel feed")?
        else {
            return Ok(Vec::new());
        };
        if entry.published < from {
            tracing::trace!(
                channel = %channel_id,
                video_id = %entry.video_id,
                published = %entry.published,
                "newest feed entry predates watermark"
            );
            return Ok(Vec::new());
        }

        let videos = self
            .yt
            .list_videos(std::slice::from_ref(&entry.video_id))
            .await
            .context("look up newest feed entry")?;
        Ok(video::validate_all(videos)
            .into_iter()
            .filter(|raw| {
                if !raw.is_stream {
                    tracing::debug!(
                        channel = %channel_id,
                        video_id = %raw.id,
                        "newest feed entry is not a stream"
                    );
                }
                raw.is_stream
            })
            .map(video::classify)
            .take(1)
            .collect())
    }
}
