//! Turning classified videos into webhook messages and delivering them.

use crate::video::{LifecycleState, VideoRecord};
use eyre::Context;
use jiff::tz::TimeZone;
use serde::Serialize;
use std::future::Future;

/// Delivers a text message somewhere.
pub trait WebhookTransport {
    fn post_text(&self, text: &str) -> impl Future<Output = eyre::Result<()>> + Send;
}

/// Incoming-webhook endpoint (Slack and compatibles) accepting `{"text": ...}`.
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    text: &'a str,
}

impl HttpWebhook {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

impl WebhookTransport for HttpWebhook {
    async fn post_text(&self, text: &str) -> eyre::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookBody { text })
            .send()
            .await
            .context("send webhook request")?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(eyre::eyre!(
                "webhook request failed with status {}: {}",
                status_code,
                error_text
            ));
        }
        Ok(())
    }
}

/// The text announcing one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub video_id: String,
    pub text: String,
}

impl NotificationMessage {
    /// Renders the announcement for `record`, with scheduled times shown in `tz`.
    ///
    /// Ended streams have no announcement.
    pub fn for_record(record: &VideoRecord, tz: &TimeZone) -> Option<Self> {
        let url = record.watch_url();
        let text = match record.lifecycle_state {
            LifecycleState::Upcoming => {
                let starts = match record.scheduled_start_time {
                    Some(at) => at.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M %:z").to_string(),
                    None => "an unannounced time".to_string(),
                };
                format!(
                    ":alarm_clock: {} plans to start live at {}.\n{}\n{}",
                    record.channel_title, starts, record.title, url
                )
            }
            LifecycleState::Live => format!(
                ":microphone: {} is now live!\n{}\n{}",
                record.channel_title, record.title, url
            ),
            LifecycleState::Uploaded => format!(
                ":clapper: {} uploaded a new video.\n{}\n{}",
                record.channel_title, record.title, url
            ),
            LifecycleState::Ended => return None,
        };
        Some(Self {
            video_id: record.video_id.clone(),
            text,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Nothing to announce (an ended stream).
    Skipped,
    Failed,
}

/// Sends one notification per video.
///
/// Failures are logged and reported, never retried: the checkpoint moves on
/// regardless, so a failed announcement is lost rather than repeated.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    transport: T,
    tz: TimeZone,
}

impl<T: WebhookTransport> Dispatcher<T> {
    pub fn new(transport: T, tz: TimeZone) -> Self {
        Self { transport, tz }
    }

    pub async fn send(&self, record: &VideoRecord) -> DispatchOutcome {
        let Some(message) = NotificationMessage::for_record(record, &self.tz) else {
            tracing::debug!(video_id = %record.video_id, "not announcing ended stream");
            return DispatchOutcome::Skipped;
        };

        match self.transport.post_text(&message.text).await {
            Ok(()) => {
                tracing::info!(
                    video_id = %message.video_id,
                    channel = %record.channel_title,
                    state = %record.lifecycle_state,
                    "sent notification"
                );
                DispatchOutcome::Sent
            }
            Err(e) => {
                tracing::error!(
                    video_id = %message.video_id,
                    error = %e,
                    "failed to send notification"
                );
                DispatchOutcome::Failed
            }
        }
    }
}
