//! Placeholder ("fake null") tables.
//!
//! Some fields are required by the library even when a file carries no tag
//! for them. Rather than invent data, blank fields are filled with a
//! placeholder that can never be mistaken for a real value, and stripped
//! again before anything reaches a file's tags.
//!
//! | scope | field        | default placeholder |
//! |-------|--------------|---------------------|
//! | track | `title`      | `<Unknown Track>`   |
//! | track | `track_num`  | `-1`                |
//! | track | `disc`       | `1`                 |
//! | album | `title`      | `Unknown Album`     |
//! | album | `artist`     | `Unknown Artist`    |
//! | album | `date`       | `0001-01-01`        |
//! | album | `disc_total` | `1`                 |

use chrono::NaiveDate;

use crate::config::PlaceholderConfig;
use crate::error::{Error, Result};
use crate::model::FieldValue;

pub const TITLE: &str = "title";
pub const TRACK_NUM: &str = "track_num";
pub const DISC: &str = "disc";
pub const ARTIST: &str = "artist";
pub const DATE: &str = "date";
pub const DISC_TOTAL: &str = "disc_total";

/// Ordered (field name, placeholder) pairs for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullFieldTable {
    entries: Vec<(&'static str, FieldValue)>,
}

impl NullFieldTable {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// Track and album placeholder tables, built once from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullFieldPolicy {
    track: NullFieldTable,
    album: NullFieldTable,
}

impl NullFieldPolicy {
    /// Build the tables, rejecting placeholders that could pass for real data.
    pub fn new(config: &PlaceholderConfig) -> Result<Self> {
        if config.track.track_num >= 0 {
            return Err(Error::config(format!(
                "track_num placeholder must be negative, got {}",
                config.track.track_num
            )));
        }

        let track = NullFieldTable {
            entries: vec![
                (TITLE, FieldValue::Text(config.track.title.clone())),
                (TRACK_NUM, FieldValue::Int(config.track.track_num)),
                (DISC, FieldValue::Int(config.track.disc)),
            ],
        };
        let album = NullFieldTable {
            entries: vec![
                (TITLE, FieldValue::Text(config.album.title.clone())),
                (ARTIST, FieldValue::Text(config.album.artist.clone())),
                (DATE, FieldValue::Date(config.album.date)),
                (DISC_TOTAL, FieldValue::Int(config.album.disc_total)),
            ],
        };

        for (scope, table) in [("track", &track), ("album", &album)] {
            if let Some((name, _)) = table.iter().find(|(_, v)| v.is_blank()) {
                return Err(Error::config(format!(
                    "{scope} placeholder for '{name}' must not be blank"
                )));
            }
        }

        Ok(Self { track, album })
    }

    pub fn track(&self) -> &NullFieldTable {
        &self.track
    }

    pub fn album(&self) -> &NullFieldTable {
        &self.album
    }

    /// The configured album date placeholder.
    pub fn date(&self) -> Option<NaiveDate> {
        self.album.get(DATE).and_then(FieldValue::as_date)
    }

    /// Whether a stored or on-disk track number means "no real track number".
    pub fn is_null_track_num(&self, track_num: i64) -> bool {
        track_num <= 0
    }

    /// Whether a date is the album date placeholder.
    pub fn is_null_date(&self, date: NaiveDate) -> bool {
        self.date() == Some(date)
    }
}

impl Default for NullFieldPolicy {
    fn default() -> Self {
        // The default config always satisfies the checks in `new`
        Self::new(&PlaceholderConfig::default()).unwrap_or_else(|_| unreachable!())
    }
}
