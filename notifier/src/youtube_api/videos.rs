//! YouTube Videos API types.

use jiff::Timestamp;
use serde::Deserialize;

/// A `video` resource as returned by `videos.list` with
/// `part=snippet,liveStreamingDetails`.
///
/// A video without a snippet still deserializes; it is rejected when converted
/// into a [`crate::video::RawVideo`].
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    /// Only present for videos that are, were, or will be live broadcasts.
    #[serde(default)]
    pub live_streaming_details: Option<LiveStreamingDetails>,
}

/// Basic details about a video.
///
/// Fields the notifier needs are optional here and checked when the video is
/// converted, so a partial snippet is reported against its video ID.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    /// The date and time that the video was published.
    #[serde(default)]
    pub published_at: Option<Timestamp>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    /// `none`, `upcoming` or `live`.
    ///
    /// Kept as a string so that unexpected values surface as a classification
    /// error for this one record.
    #[serde(default)]
    pub live_broadcast_content: Option<String>,
}

/// Metadata about a video that is, was, or will be streamed live.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#liveStreamingDetails>
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamingDetails {
    #[serde(default)]
    pub actual_start_time: Option<Timestamp>,
    /// Unset until the broadcast is over.
    #[serde(default)]
    pub actual_end_time: Option<Timestamp>,
    #[serde(default)]
    pub scheduled_start_time: Option<Timestamp>,
    #[serde(default)]
    pub scheduled_end_time: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube_api::types::ListResponse;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_upcoming_stream() {
        let response: ListResponse<Video> = serde_json::from_str(
            r#"{
                "kind": "youtube#videoListResponse",
                "items": [{
                    "kind": "youtube#video",
                    "id": "abc123",
                    "snippet": {
                        "publishedAt": "2024-02-28T12:00:00Z",
                        "channelId": "UC1",
                        "title": "Weekly stream",
                        "channelTitle": "Some Channel",
                        "liveBroadcastContent": "upcoming"
                    },
                    "liveStreamingDetails": {
                        "scheduledStartTime": "2024-03-01T10:00:00Z"
                    }
                }],
                "pageInfo": {"totalResults": 1, "resultsPerPage": 1}
            }"#,
        )
        .unwrap();

        let video = &response.items[0];
        assert_eq!(video.id, "abc123");
        let snippet = video.snippet.as_ref().unwrap();
        assert_eq!(snippet.live_broadcast_content.as_deref(), Some("upcoming"));
        let details = video.live_streaming_details.as_ref().unwrap();
        assert_eq!(
            details.scheduled_start_time,
            Some("2024-03-01T10:00:00Z".parse().unwrap())
        );
        assert!(details.actual_end_time.is_none());
    }

    #[test]
    fn parses_plain_upload_without_details() {
        let video: Video = serde_json::from_str(
            r#"{
                "id": "v1",
                "snippet": {
                    "publishedAt": "2024-01-02T00:00:00Z",
                    "channelId": "UC1",
                    "title": "Hello",
                    "channelTitle": "Some Channel",
                    "liveBroadcastContent": "none"
                }
            }"#,
        )
        .unwrap();
        assert!(video.live_streaming_details.is_none());
    }

    #[test]
    fn partial_snippet_still_decodes() {
        let response: ListResponse<Video> = serde_json::from_str(
            r#"{
                "items": [
                    {"id": "good", "snippet": {"publishedAt": "2024-01-02T00:00:00Z", "channelId": "UC1", "title": "Hello", "channelTitle": "Some Channel"}},
                    {"id": "partial", "snippet": {"publishedAt": "2024-01-02T00:00:00Z", "channelId": "UC1", "title": "Hello"}},
                    {"id": "garbled", "snippet": {"publishedAt": "last tuesday", "title": "Hello"}}
                ]
            }"#,
        )
        .unwrap();
        let ids: Vec<_> = response.items.iter().map(|video| video.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "partial"]);
        assert!(response.items[1].snippet.as_ref().unwrap().channel_title.is_none());
    }
}
