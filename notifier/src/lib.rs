//! Announces new uploads and live streams of subscribed YouTube channels to a
//! chat webhook, exactly once per video.
//!
//! See [`poller`] for how a run works and [`checkpoint`] for how progress is kept
//! between runs.

use crate::checkpoint::CheckpointStore;
use crate::config::Config;
use crate::dispatch::{Dispatcher, HttpWebhook};
use crate::filter::ExclusionFilter;
use crate::poller::Poller;
use crate::sources::{ActivityUploads, FeedLiveStreams};
use crate::youtube_api::YouTubeClient;
use eyre::Context;

pub mod checkpoint;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod filter;
pub mod poller;
pub mod sources;
pub mod video;
pub mod youtube_api;

/// A subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    /// Display name, which is what `stream_channels` refers to.
    pub name: String,
}

/// The poller as wired up for production use.
pub type YouTubePoller = Poller<YouTubeClient, ActivityUploads, FeedLiveStreams, HttpWebhook>;

/// Builds every component from the configuration.
///
/// Anything missing or malformed (token file, checkpoint file, exclusion
/// patterns, time zone) fails here, before any channel is fetched.
pub async fn setup_poller(config: &Config) -> eyre::Result<YouTubePoller> {
    let access_token =
        credentials::load_access_token(&config.token_path).context("load YouTube credentials")?;
    let filter = ExclusionFilter::new(&config.exclude_words)?;
    let tz = config.time_zone()?;
    let checkpoints = CheckpointStore::open(&config.checkpoint_path)
        .await
        .context("open checkpoint store")?;

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("build HTTP client")?;
    let yt = YouTubeClient::new(access_token, http.clone());
    let dispatcher = Dispatcher::new(HttpWebhook::new(&config.webhook_url, http), tz);

    Ok(Poller::new(
        yt.clone(),
        ActivityUploads::new(yt.clone()),
        FeedLiveStreams::new(yt),
        dispatcher,
        filter,
        checkpoints,
    )
    .with_stream_channels(config.stream_channels.iter().cloned())
    .with_max_concurrent_channels(config.max_concurrent_channels))
}
