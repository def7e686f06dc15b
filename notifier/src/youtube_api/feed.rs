//! Parsing for a channel's public Atom feed
//! (`https://www.youtube.com/feeds/videos.xml?channel_id=...`).
//!
//! The feed costs no API quota, lists the channel's most recent publications
//! newest first, and includes scheduled and running live streams. Only the
//! handful of fields needed to decide whether a full metadata lookup is worth
//! doing are extracted.

use eyre::Context;
use jiff::Timestamp;
use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<entry>` of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub video_id: String,
    pub channel_id: Option<String>,
    pub title: String,
    pub published: Timestamp,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    VideoId,
    ChannelId,
    Title,
    Published,
}

#[derive(Debug, Default)]
struct PartialEntry {
    video_id: Option<String>,
    channel_id: Option<String>,
    title: Option<String>,
    published: Option<String>,
}

impl PartialEntry {
    /// The first occurrence of a field wins, so `<media:title>` in the media group
    /// never replaces the entry's own `<title>`.
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::VideoId => &mut self.video_id,
            Field::ChannelId => &mut self.channel_id,
            Field::Title => &mut self.title,
            Field::Published => &mut self.published,
        };
        slot.get_or_insert(value);
    }

    fn finish(self) -> eyre::Result<FeedEntry> {
        let video_id = self
            .video_id
            .ok_or_else(|| eyre::eyre!("feed entry has no yt:videoId"))?;
        let published = self
            .published
            .ok_or_else(|| eyre::eyre!("feed entry {video_id} has no published time"))?;
        let published = published
            .parse::<Timestamp>()
            .with_context(|| format!("parse published time {published:?} of entry {video_id}"))?;
        Ok(FeedEntry {
            video_id,
            channel_id: self.channel_id,
            title: self.title.unwrap_or_default(),
            published,
        })
    }
}

/// Parses feed XML into its entries, in document order.
pub fn parse_feed(xml: &str) -> eyre::Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<PartialEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event().context("read feed XML")? {
            Event::Start(start) => {
                field = match start.local_name().as_ref() {
                    b"entry" => {
                        current = Some(PartialEntry::default());
                        None
                    }
                    b"videoId" => Some(Field::VideoId),
                    b"channelId" => Some(Field::ChannelId),
                    b"title" => Some(Field::Title),
                    b"published" => Some(Field::Published),
                    _ => None,
                };
            }
            Event::Text(text) => {
                if let (Some(entry), Some(field)) = (current.as_mut(), field) {
                    let value = text.unescape().context("unescape feed text")?;
                    entry.set(field, value.into_owned());
                }
            }
            Event::CData(cdata) => {
                if let (Some(entry), Some(field)) = (current.as_mut(), field) {
                    let value = std::str::from_utf8(&cdata).context("decode feed CDATA")?;
                    entry.set(field, value.to_owned());
                }
            }
            Event::End(end) => {
                field = None;
                if end.local_name().as_ref() == b"entry"
                    && let Some(entry) = current.take()
                {
                    entries.push(entry.finish()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UC1"/>
 <id>yt:channel:UC1</id>
 <yt:channelId>UC1</yt:channelId>
 <title>Some Channel</title>
 <published>2015-01-01T00:00:00+00:00</published>
 <entry>
  <id>yt:video:live1</id>
  <yt:videoId>live1</yt:videoId>
  <yt:channelId>UC1</yt:channelId>
  <title>Late night &amp; chill</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=live1"/>
  <author><name>Some Channel</name></author>
  <published>2024-03-01T09:00:00+00:00</published>
  <updated>2024-03-01T09:05:00+00:00</updated>
  <media:group>
   <media:title>Late night &amp; chill (media)</media:title>
  </media:group>
 </entry>
 <entry>
  <id>yt:video:v1</id>
  <yt:videoId>v1</yt:videoId>
  <yt:channelId>UC1</yt:channelId>
  <title>Hello</title>
  <published>2024-01-02T00:00:00+00:00</published>
 </entry>
</feed>"#;

    #[test]
    fn entries_in_document_order() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(
            entries,
            vec![
                FeedEntry {
                    video_id: "live1".to_string(),
                    channel_id: Some("UC1".to_string()),
                    title: "Late night & chill".to_string(),
                    published: "2024-03-01T09:00:00Z".parse().unwrap(),
                },
                FeedEntry {
                    video_id: "v1".to_string(),
                    channel_id: Some("UC1".to_string()),
                    title: "Hello".to_string(),
                    published: "2024-01-02T00:00:00Z".parse().unwrap(),
                },
            ]
        );
    }

    #[test]
    fn feed_without_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Empty</title></feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn entry_without_video_id_is_an_error() {
        let xml = r#"<feed><entry><title>x</title><published>2024-01-02T00:00:00+00:00</published></entry></feed>"#;
        assert!(parse_feed(xml).is_err());
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let xml = r#"<feed><entry><videoId>v1</videoId><published>yesterday</published></entry></feed>"#;
        assert!(parse_feed(xml).is_err());
    }
}
