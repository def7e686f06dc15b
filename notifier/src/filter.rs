//! Title-based exclusion of videos nobody wants to hear about.

use crate::video::VideoRecord;
use eyre::Context;
use regex::RegexSet;

/// Rejects videos whose title matches any configured pattern.
///
/// Patterns are unanchored regular expressions, so a plain word matches anywhere
/// in the title.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: RegexSet,
}

impl ExclusionFilter {
    pub fn new<I, S>(patterns: I) -> eyre::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSet::new(patterns).context("compile exclude_words patterns")?;
        Ok(Self { patterns })
    }

    /// `true` if the video should be announced.
    pub fn accept(&self, record: &VideoRecord) -> bool {
        !self.patterns.is_match(&record.title)
    }
}
