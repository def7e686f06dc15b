//! YouTube Subscriptions API types.

use serde::Deserialize;

/// A `subscription` resource: the authenticated user's subscription to one channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/subscriptions#resource>
#[derive(Debug, Deserialize)]
pub struct Subscription {
    pub snippet: SubscriptionSnippet,
}

/// See: <https://developers.google.com/youtube/v3/docs/subscriptions#snippet>
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnippet {
    /// The subscribed channel's title.
    pub title: String,
    pub resource_id: ResourceId,
}

/// Identifies the subscribed resource; for subscriptions this is always a channel.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub channel_id: String,
}
