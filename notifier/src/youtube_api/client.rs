//! Core YouTube API client functionality.

use crate::youtube_api::{
    activities::Activity,
    feed::{self, FeedEntry},
    subscriptions::Subscription,
    types::{ListResponse, paged},
    videos::Video,
};
use eyre::Context;
use futures::Stream;
use http::Method;
use jiff::Timestamp;
use oauth2::AccessToken;
use std::sync::Arc;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";

/// Activities fetched per channel per poll.
///
/// Only this one page is read. A channel that publishes more uploads than this
/// between two polls loses the excess.
pub const UPLOAD_PAGE_SIZE: u32 = 10;

/// Client for the read-only parts of the YouTube Data API v3 that the notifier needs,
/// plus the public channel feed.
///
/// All Data API calls are authenticated with a bearer access token. Obtaining and
/// refreshing that token happens elsewhere; an expired token shows up as a failed
/// request like any other.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    access_token: Arc<AccessToken>,
    /// HTTP client for API requests, carrying the per-request timeout.
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `access_token` - OAuth2 access token with at least the `youtube.readonly` scope
    /// * `client` - Shared HTTP client for making API requests
    pub fn new(access_token: AccessToken, client: reqwest::Client) -> Self {
        Self {
            access_token: Arc::new(access_token),
            client,
        }
    }

    /// Makes an authenticated GET request to the YouTube Data API and decodes the
    /// JSON response.
    ///
    /// Non-success status codes are turned into errors that carry the response
    /// body, which is where YouTube explains quota and permission failures.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn get_api<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> eyre::Result<T> {
        let url = format!("{API_BASE}/{endpoint}");
        let response = self
            .client
            .request(Method::GET, &url)
            .bearer_auth(self.access_token.secret())
            .query(query_params)
            .send()
            .await
            .with_context(|| format!("send GET request to YouTube API: {url}"))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(eyre::eyre!(
                "YouTube API request to {} failed with status {}: {}",
                endpoint,
                status_code,
                error_text
            ));
        }

        response
            .json()
            .await
            .with_context(|| format!("parse YouTube {endpoint} API response as JSON"))
    }

    /// Returns a paginated stream of the channels the authenticated user subscribes to.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.readonly`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/subscriptions/list>
    #[instrument(skip(self))]
    pub fn list_subscriptions(&self) -> impl Stream<Item = eyre::Result<Subscription>> + use<'_> {
        paged(move |page_token| async move {
            let mut query_params = vec![
                ("part", "snippet"),
                ("mine", "true"),
                ("maxResults", "50"),
            ];
            if let Some(ref token) = page_token {
                query_params.push(("pageToken", token.as_str()));
            }

            let page: ListResponse<Subscription> =
                self.get_api("subscriptions", &query_params).await?;
            tracing::debug!(
                returned_items = page.items.len(),
                has_next_page = page.next_page_token.is_some(),
                "fetched subscriptions"
            );
            Ok(page)
        })
    }

    /// Lists the IDs of videos a channel uploaded in `[from, to)`, newest first.
    ///
    /// Reads a single page of at most [`UPLOAD_PAGE_SIZE`] activities. When `to` is
    /// `None` the window is open-ended.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/activities/list>
    #[instrument(skip(self))]
    pub async fn list_upload_activities(
        &self,
        channel_id: &str,
        from: Timestamp,
        to: Option<Timestamp>,
    ) -> eyre::Result<Vec<String>> {
        let from = from.to_string();
        let to = to.map(|to| to.to_string());
        let max_results = UPLOAD_PAGE_SIZE.to_string();
        let mut query_params = vec![
            ("part", "snippet,contentDetails"),
            ("channelId", channel_id),
            ("publishedAfter", from.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(ref to) = to {
            query_params.push(("publishedBefore", to.as_str()));
        }

        let page: ListResponse<Activity> = self.get_api("activities", &query_params).await?;
        if page.next_page_token.is_some() {
            tracing::warn!(
                channel = %channel_id,
                page_size = UPLOAD_PAGE_SIZE,
                "more activities than fit in one page; older ones in this window are skipped"
            );
        }

        let video_ids: Vec<String> = page
            .items
            .iter()
            .filter_map(Activity::uploaded_video_id)
            .map(str::to_string)
            .collect();
        tracing::debug!(
            channel = %channel_id,
            activities = page.items.len(),
            uploads = video_ids.len(),
            "fetched channel activities"
        );
        Ok(video_ids)
    }

    /// Fetches snippet and live streaming details for a batch of videos in one call.
    ///
    /// Videos that no longer exist (or are private) are silently absent from the result.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self))]
    pub async fn list_videos(&self, video_ids: &[String]) -> eyre::Result<Vec<Video>> {
        let ids = video_ids.join(",");
        let query_params = [("part", "snippet,liveStreamingDetails"), ("id", ids.as_str())];

        let page: ListResponse<Video> = self.get_api("videos", &query_params).await?;
        tracing::debug!(
            requested = video_ids.len(),
            returned_items = page.items.len(),
            "fetched video metadata"
        );
        Ok(page.items)
    }

    /// Returns the newest entry of a channel's public feed, if it has any.
    ///
    /// The feed is unauthenticated and does not count against the API quota.
    #[instrument(skip(self))]
    pub async fn latest_feed_entry(&self, channel_id: &str) -> eyre::Result<Option<FeedEntry>> {
        let response = self
            .client
            .get(FEED_URL)
            .query(&[("channel_id", channel_id)])
            .send()
            .await
            .with_context(|| format!("request feed of channel {channel_id}"))?;

        let status_code = response.status();
        if !status_code.is_success() {
            return Err(eyre::eyre!(
                "feed request for channel {} failed with status {}",
                channel_id,
                status_code
            ));
        }

        let xml = response.text().await.context("read feed body")?;
        let entries = feed::parse_feed(&xml)
            .with_context(|| format!("parse feed of channel {channel_id}"))?;
        Ok(entries.into_iter().next())
    }
}
