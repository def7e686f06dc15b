//! One polling run across all subscribed channels.
//!
//! A run goes through these steps:
//!
//! 1. Enumerate the subscribed channels.
//! 2. Fetch every channel concurrently (bounded by `max_concurrent_channels`):
//!    read its watermark, ask the upload source, and for stream-capable channels
//!    also the live stream source. A channel whose fetch fails contributes
//!    nothing and keeps its watermark; the rest of the run is unaffected.
//! 3. Wait for all fetches, then go through the channels one at a time: drop
//!    records at or before the watermark, announce what is left unless it is an
//!    ended stream or excluded by title, and advance the watermark to the newest
//!    `publishedAt` seen, announced or not.
//!
//! Checkpoints are committed per channel, right after that channel's
//! notifications went out, so a crash mid-run keeps the progress made so far.
//! Committing sequentially also makes the poller the only writer of each entry.
//!
//! # Limitations
//!
//! The watermark is a timestamp only. A scheduled stream keeps its `publishedAt`
//! when it goes live, so once its "upcoming" announcement has moved the
//! watermark past it, the later "now live" transition is dropped with the other
//! already-seen records and never announced.

use crate::Channel;
use crate::checkpoint::CheckpointStore;
use crate::dispatch::{DispatchOutcome, Dispatcher, WebhookTransport};
use crate::filter::ExclusionFilter;
use crate::sources::{ChannelRegistry, LiveStreamSource, UploadSource};
use crate::video::VideoRecord;
use eyre::Context;
use futures::StreamExt;
use jiff::Timestamp;
use std::collections::HashSet;

/// Counters describing what one run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub channels: usize,
    pub failed_channels: usize,
    pub sent: usize,
    pub dispatch_failures: usize,
    /// Suppressed by an exclusion pattern.
    pub excluded: usize,
    /// Streams that were already over when seen.
    pub ended: usize,
    pub checkpoints_advanced: usize,
}

#[derive(Debug)]
struct FetchedChannel {
    channel: Channel,
    watermark: Timestamp,
    records: Vec<VideoRecord>,
}

pub struct Poller<R, U, L, T> {
    registry: R,
    uploads: U,
    live_streams: L,
    dispatcher: Dispatcher<T>,
    filter: ExclusionFilter,
    checkpoints: CheckpointStore,
    stream_channels: HashSet<String>,
    max_concurrent_channels: usize,
}

impl<R, U, L, T> Poller<R, U, L, T>
where
    R: ChannelRegistry,
    U: UploadSource,
    L: LiveStreamSource,
    T: WebhookTransport,
{
    pub fn new(
        registry: R,
        uploads: U,
        live_streams: L,
        dispatcher: Dispatcher<T>,
        filter: ExclusionFilter,
        checkpoints: CheckpointStore,
    ) -> Self {
        Self {
            registry,
            uploads,
            live_streams,
            dispatcher,
            filter,
            checkpoints,
            stream_channels: HashSet::new(),
            max_concurrent_channels: 8,
        }
    }

    /// Channels, by display name, that are also checked for live streams.
    pub fn with_stream_channels(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.stream_channels = names.into_iter().collect();
        self
    }

    pub fn with_max_concurrent_channels(mut self, limit: usize) -> Self {
        self.max_concurrent_channels = limit.max(1);
        self
    }

    /// Polls every subscribed channel once.
    ///
    /// Only failing to enumerate the channels fails the run; per-channel and
    /// per-video failures are logged and counted in the report.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> eyre::Result<RunReport> {
        let channels = self
            .registry
            .channels()
            .await
            .context("enumerate subscribed channels")?;
        let until = Timestamp::now();

        let fetched: Vec<eyre::Result<FetchedChannel>> = futures::stream::iter(channels)
            .map(|channel| self.fetch_channel(channel, until))
            .buffer_unordered(self.max_concurrent_channels)
            .collect()
            .await;

        let mut report = RunReport {
            channels: fetched.len(),
            ..Default::default()
        };
        for channel in fetched {
            match channel {
                Ok(channel) => self.process_channel(channel, &mut report).await,
                Err(e) => {
                    report.failed_channels += 1;
                    tracing::warn!(error = %format!("{e:#}"), "channel fetch failed; keeping its checkpoint");
                }
            }
        }

        tracing::info!(?report, "poll finished");
        Ok(report)
    }

    async fn fetch_channel(
        &self,
        channel: Channel,
        until: Timestamp,
    ) -> eyre::Result<FetchedChannel> {
        let watermark = self.checkpoints.get(&channel.id).await;
        tracing::debug!(channel = %channel.name, %watermark, "fetching channel");

        let uploads = self.uploads.fetch(&channel.id, watermark, Some(until));
        let records = if self.stream_channels.contains(&channel.name) {
            let streams = self.live_streams.fetch(&channel.id, watermark);
            let (uploads, streams) = tokio::try_join!(uploads, streams)
                .with_context(|| format!("fetch videos of {} ({})", channel.name, channel.id))?;
            merge(streams, uploads)
        } else {
            uploads
                .await
                .with_context(|| format!("fetch videos of {} ({})", channel.name, channel.id))?
        };

        Ok(FetchedChannel {
            channel,
            watermark,
            records,
        })
    }

    async fn process_channel(&self, fetched: FetchedChannel, report: &mut RunReport) {
        let FetchedChannel {
            channel,
            watermark,
            records,
        } = fetched;

        let (fresh, seen): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|record| record.published_at > watermark);
        if !seen.is_empty() {
            tracing::debug!(
                channel = %channel.name,
                count = seen.len(),
                "ignoring videos at or before the checkpoint"
            );
        }

        let mut newest = watermark;
        for record in &fresh {
            newest = newest.max(record.published_at);

            if !self.filter.accept(record) {
                tracing::info!(
                    video_id = %record.video_id,
                    title = %record.title,
                    "title matches an exclusion pattern"
                );
                report.excluded += 1;
                continue;
            }
            match self.dispatcher.send(record).await {
                DispatchOutcome::Sent => report.sent += 1,
                DispatchOutcome::Failed => report.dispatch_failures += 1,
                DispatchOutcome::Skipped => report.ended += 1,
            }
        }

        if newest > watermark {
            match self.checkpoints.update(&channel.id, newest).await {
                Ok(()) => report.checkpoints_advanced += 1,
                Err(e) => tracing::error!(
                    channel = %channel.name,
                    error = %format!("{e:#}"),
                    "failed to persist checkpoint; its videos may be announced again"
                ),
            }
        }
    }
}

/// Combines stream and upload records, keeping the first record per video ID.
///
/// Streams go first: for a video both sources returned, the stream source's
/// view is the fresher one.
fn merge(streams: Vec<VideoRecord>, uploads: Vec<VideoRecord>) -> Vec<VideoRecord> {
    let mut ids = HashSet::new();
    streams
        .into_iter()
        .chain(uploads)
        .filter(|record| ids.insert(record.video_id.clone()))
        .collect()
}
