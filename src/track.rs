// Track identity and the raw samples scraped from the player page

use serde::Deserialize;
use std::fmt;

use crate::text_cleanup::TextCleaner;
use crate::time_parse::{parse_duration_with_default, parse_time};

/// The `{artist, title}` pair that decides whether the track changed.
///
/// Equality is exact and case-sensitive; values are cleaned before construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackIdentity {
    pub artist: String,
    pub title: String,
}

impl TrackIdentity {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// One poll result as emitted by the page scraping script
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSample {
    pub title: String,
    pub author: String,
    pub elapsed_time_text: String,
    pub total_time_text: String,
    pub artwork_url: String,
    pub is_playing: bool,
}

/// A cleaned, parsed sample ready for the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub identity: TrackIdentity,
    /// Position reported by the page, if it could be parsed
    pub elapsed_secs: Option<u64>,
    /// Track length, defaulted when the page shows nothing usable
    pub duration_secs: u64,
    pub artwork_url: Option<String>,
    pub is_playing: bool,
}

impl Sample {
    /// Clean and parse a raw sample.
    ///
    /// Returns `None` for an incomplete scrape (empty artist or title after cleanup).
    pub fn from_raw(raw: &RawSample, cleaner: &TextCleaner) -> Option<Self> {
        let title = cleaner.clean(&TextCleaner::strip_title_decorations(&raw.title));
        let artist = cleaner.clean(&raw.author);

        if title.is_empty() || artist.is_empty() {
            return None;
        }

        let total = raw.total_time_text.trim();
        let artwork_url = raw.artwork_url.trim();

        Some(Self {
            identity: TrackIdentity::new(artist, title),
            elapsed_secs: parse_time(&raw.elapsed_time_text),
            duration_secs: parse_duration_with_default((!total.is_empty()).then_some(total)),
            artwork_url: (!artwork_url.is_empty()).then(|| artwork_url.to_string()),
            is_playing: raw.is_playing,
        })
    }
}
