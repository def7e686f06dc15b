//! Minimal YouTube Data API v3 client.
//!
//! Covers the read-only calls a subscription poller needs:
//!
//! - [`client::YouTubeClient::list_subscriptions`]: the channels to watch
//! - [`client::YouTubeClient::list_upload_activities`]: recent uploads of one channel
//! - [`client::YouTubeClient::list_videos`]: full metadata, including live streaming
//!   details, for a batch of video IDs
//! - [`client::YouTubeClient::latest_feed_entry`]: newest entry of a channel's public
//!   feed, which is free in terms of API quota and is how scheduled or running live
//!   streams are spotted cheaply
//!
//! # Quota
//!
//! `activities.list`, `videos.list` and `subscriptions.list` each cost 1 unit per
//! call. A poll therefore costs roughly two units per channel with new uploads and
//! one per channel without, plus one per stream-capable channel whose feed shows
//! something new.

pub mod activities;
pub mod client;
pub mod feed;
pub mod subscriptions;
pub mod types;
pub mod videos;

pub use client::YouTubeClient;
pub use feed::FeedEntry;
pub use types::{ListResponse, PageInfo};
pub use videos::{LiveStreamingDetails, Video, VideoSnippet};
