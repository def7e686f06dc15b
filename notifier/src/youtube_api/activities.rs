//! YouTube Activities API types.

use serde::Deserialize;

/// An `activity` resource: something a channel did, such as uploading a video or
/// liking one.
///
/// See: <https://developers.google.com/youtube/v3/docs/activities#resource>
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub snippet: ActivitySnippet,
    #[serde(default)]
    pub content_details: Option<ActivityContentDetails>,
}

/// See: <https://developers.google.com/youtube/v3/docs/activities#snippet>
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnippet {
    /// `upload`, `like`, `playlistItem`, and so on.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivityContentDetails {
    #[serde(default)]
    pub upload: Option<UploadDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDetails {
    pub video_id: String,
}

impl Activity {
    /// The uploaded video's ID if this activity is an upload.
    pub fn uploaded_video_id(&self) -> Option<&str> {
        if self.snippet.kind != "upload" {
            return None;
        }
        self.content_details
            .as_ref()?
            .upload
            .as_ref()
            .map(|upload| upload.video_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube_api::types::ListResponse;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_uploads_yield_video_ids() {
        let page: ListResponse<Activity> = serde_json::from_str(
            r#"{
                "items": [
                    {
                        "snippet": {"publishedAt": "2024-01-02T00:00:00Z", "type": "upload"},
                        "contentDetails": {"upload": {"videoId": "v1"}}
                    },
                    {
                        "snippet": {"publishedAt": "2024-01-02T01:00:00Z", "type": "playlistItem"},
                        "contentDetails": {"playlistItem": {"playlistId": "PL1"}}
                    },
                    {
                        "snippet": {"publishedAt": "2024-01-02T02:00:00Z", "type": "upload"}
                    }
                ]
            }"#,
        )
        .unwrap();
        let ids: Vec<_> = page
            .items
            .iter()
            .filter_map(Activity::uploaded_video_id)
            .collect();
        assert_eq!(ids, vec!["v1"]);
    }

    #[test]
    fn broken_activity_does_not_hide_the_others() {
        let page: ListResponse<Activity> = serde_json::from_str(
            r#"{
                "items": [
                    {"contentDetails": {"upload": {"videoId": "orphan"}}},
                    {
                        "snippet": {"publishedAt": "2024-01-02T00:00:00Z", "type": "upload"},
                        "contentDetails": {"upload": {"videoId": "v2"}}
                    },
                    {
                        "snippet": {"type": "upload"},
                        "contentDetails": {"upload": {"videoId": "v3"}}
                    }
                ]
            }"#,
        )
        .unwrap();
        let ids: Vec<_> = page
            .items
            .iter()
            .filter_map(Activity::uploaded_video_id)
            .collect();
        assert_eq!(ids, vec!["v2", "v3"]);
    }
}
