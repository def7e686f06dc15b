//! Shared response envelope and pagination helpers for the YouTube API client.

use futures::{Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::future::Future;

/// Envelope shared by every `*.list` endpoint of the YouTube Data API.
///
/// Only the fields this crate reads are modelled; `kind` and `etag` are ignored.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list#response>
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ListResponse<T> {
    /// The resources on this page.
    ///
    /// YouTube omits the field entirely when a page is empty. Items that do not
    /// decode are logged and left out, so one odd resource does not cost the
    /// whole page.
    #[serde(default = "Vec::new", deserialize_with = "skip_malformed")]
    pub items: Vec<T>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: Option<PageInfo>,
    /// Token for the `pageToken` parameter of the next request, if there is one.
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

/// Paging details for lists of resources.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    #[serde(rename = "totalResults")]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
}

fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| {
            let id = value.get("id").cloned();
            match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(?id, error = %e, "skipping malformed API item");
                    None
                }
            }
        })
        .collect())
}

enum Cursor {
    First,
    Next(String),
    Exhausted,
}

/// Turns a page fetcher into a stream of items that follows `nextPageToken` until
/// the listing is exhausted.
///
/// The fetcher is called with `None` for the first page. An error ends the stream
/// after it has been yielded.
pub fn paged<'a, T, F, Fut>(fetch_page: F) -> impl Stream<Item = eyre::Result<T>> + 'a
where
    T: 'a,
    F: Fn(Option<String>) -> Fut + 'a,
    Fut: Future<Output = eyre::Result<ListResponse<T>>> + 'a,
{
    futures::stream::try_unfold(
        (fetch_page, Cursor::First),
        |(fetch_page, cursor)| async move {
            let page_token = match cursor {
                Cursor::First => None,
                Cursor::Next(token) => Some(token),
                Cursor::Exhausted => return Ok(None),
            };
            let page = fetch_page(page_token).await?;
            let cursor = page.next_page_token.map_or(Cursor::Exhausted, Cursor::Next);
            let items = futures::stream::iter(page.items.into_iter().map(Ok::<T, eyre::Report>));
            Ok::<_, eyre::Report>(Some((items, (fetch_page, cursor))))
        },
    )
    .try_flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn empty_page_without_items_field() {
        let page: ListResponse<String> = serde_json::from_str(
            r#"{"kind": "youtube#activityListResponse", "pageInfo": {"totalResults": 0, "resultsPerPage": 10}}"#,
        )
        .unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
        assert_eq!(page.page_info.unwrap().results_per_page, 10);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
        count: u32,
    }

    #[test]
    fn malformed_items_are_dropped_not_fatal() {
        let page: ListResponse<Item> = serde_json::from_str(
            r#"{
                "items": [
                    {"id": "a", "count": 1},
                    {"id": "b"},
                    {"id": "c", "count": "many"},
                    {"id": "d", "count": 4}
                ],
                "nextPageToken": "p2"
            }"#,
        )
        .unwrap();
        assert_eq!(
            page.items,
            vec![
                Item {
                    id: "a".to_string(),
                    count: 1
                },
                Item {
                    id: "d".to_string(),
                    count: 4
                },
            ]
        );
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn follows_page_tokens_until_exhausted() {
        let requested = Mutex::new(Vec::new());
        let stream = paged(|token: Option<String>| {
            requested.lock().unwrap().push(token.clone());
            async move {
                Ok(match token.as_deref() {
                    None => ListResponse {
                        items: vec![1, 2],
                        page_info: None,
                        next_page_token: Some("p2".to_string()),
                    },
                    Some("p2") => ListResponse {
                        items: vec![3],
                        page_info: None,
                        next_page_token: None,
                    },
                    Some(other) => panic!("unexpected page token {other}"),
                })
            }
        });
        let items: Vec<u32> = stream.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(
            *requested.lock().unwrap(),
            vec![None, Some("p2".to_string())]
        );
    }

    #[tokio::test]
    async fn error_ends_stream() {
        let stream = paged(|token: Option<String>| async move {
            if token.is_none() {
                Ok(ListResponse {
                    items: vec![1u32],
                    page_info: None,
                    next_page_token: Some("broken".to_string()),
                })
            } else {
                Err(eyre::eyre!("quota exceeded"))
            }
        });
        let results: Vec<eyre::Result<u32>> = stream.collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert!(results[1].is_err());
    }
}
