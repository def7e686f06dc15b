//! Notifier configuration, read once at startup from a JSON file.

use eyre::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("status.json")
}

fn default_token_path() -> PathBuf {
    PathBuf::from("credentials/token.json")
}

fn default_max_concurrent_channels() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where notifications are POSTed as `{"text": ...}`.
    pub webhook_url: String,
    /// Regular expressions; a video whose title matches any of them is not announced.
    #[serde(default)]
    pub exclude_words: Vec<String>,
    /// Display names of channels whose feed is also checked for live streams.
    #[serde(default)]
    pub stream_channels: Vec<String>,
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    /// Stored OAuth token response for the YouTube Data API.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    #[serde(default = "default_max_concurrent_channels")]
    pub max_concurrent_channels: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Poll forever on this interval instead of running once.
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    /// IANA time zone for scheduled start times; the system zone if unset.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Config {
    /// Reads and validates the configuration file.
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.webhook_url.trim().is_empty() {
            eyre::bail!("webhook_url must not be empty");
        }
        reqwest::Url::parse(&self.webhook_url).context("parse webhook_url")?;
        if self.max_concurrent_channels == 0 {
            eyre::bail!("max_concurrent_channels must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            eyre::bail!("request_timeout_secs must be at least 1");
        }
        if self.poll_interval_secs == Some(0) {
            eyre::bail!("poll_interval_secs must be at least 1");
        }
        self.time_zone()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }

    /// The zone scheduled start times are rendered in.
    pub fn time_zone(&self) -> eyre::Result<jiff::tz::TimeZone> {
        match &self.timezone {
            Some(name) => jiff::tz::TimeZone::get(name)
                .with_context(|| format!("look up time zone {name:?}")),
            None => Ok(jiff::tz::TimeZone::system()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn load_str(json: &str) -> eyre::Result<Config> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        Config::load(file.path())
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = load_str(r#"{"webhook_url": "https://hooks.example.com/T000/B000"}"#).unwrap();
        assert!(config.exclude_words.is_empty());
        assert!(config.stream_channels.is_empty());
        assert_eq!(config.checkpoint_path, PathBuf::from("status.json"));
        assert_eq!(config.token_path, PathBuf::from("credentials/token.json"));
        assert_eq!(config.max_concurrent_channels, 8);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), None);
    }

    #[test]
    fn full_config() {
        let config = load_str(
            r##"{
                "webhook_url": "https://hooks.example.com/T000/B000",
                "exclude_words": ["#shorts", "^\\[Clip\\]"],
                "stream_channels": ["Some Channel"],
                "checkpoint_path": "/var/lib/notifier/status.json",
                "max_concurrent_channels": 2,
                "request_timeout_secs": 5,
                "poll_interval_secs": 600
            }"##,
        )
        .unwrap();
        assert_eq!(config.exclude_words, vec!["#shorts", "^\\[Clip\\]"]);
        assert_eq!(config.stream_channels, vec!["Some Channel"]);
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(600)));
        assert_eq!(config.max_concurrent_channels, 2);
    }

    #[test]
    fn missing_webhook_url_is_rejected() {
        assert!(load_str(r#"{"exclude_words": []}"#).is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(
            load_str(r#"{"webhook_url": "https://hooks.example.com/x", "max_concurrent_channels": 0}"#)
                .is_err()
        );
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        assert!(
            load_str(r#"{"webhook_url": "https://hooks.example.com/x", "timezone": "Mars/Olympus"}"#)
                .is_err()
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("/nonexistent/config.json").is_err());
    }
}
