//! Core data models for ingestion and the library.
//!
//! Two layers live here:
//! - [`FieldSet`]: transient, name-keyed metadata for one track or album while
//!   it is being ingested. Every entry remembers where its value came from.
//! - [`Track`], [`Album`] and [`LibItem`]: the records the library stores.
//!
//! # Database Schema
//!
//! The records map to the following tables:
//! - `albums` - Albums, unique on title and artist
//! - `tracks` - Individual audio files, unique on path

use chrono::NaiveDate;
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;

/// A single metadata value. The variant is the field's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Date(NaiveDate),
}

impl FieldValue {
    /// Whether this value counts as "absent" for fill-blanks purposes.
    ///
    /// Empty text and zero both read as blank, matching what tag readers
    /// hand back for a missing frame.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Int(n) => *n == 0,
            FieldValue::Date(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Human-readable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Int(_) => "integer",
            FieldValue::Date(_) => "date",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// Where a field's current value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Read from the file's embedded tags
    Tag,
    /// Guessed from the file path
    Guessed,
    /// Neither tags nor path had it; holds the configured placeholder
    Placeholder,
}

/// A value together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub value: FieldValue,
    pub provenance: Provenance,
}

impl Field {
    pub fn new(value: impl Into<FieldValue>, provenance: Provenance) -> Self {
        Self {
            value: value.into(),
            provenance,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.provenance == Provenance::Placeholder
    }
}

/// Ordered field name → [`Field`] mapping for one track or album.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<String, Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).map(|f| &f.value)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(FieldValue::as_text)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(FieldValue::as_int)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.value(name).and_then(FieldValue::as_date)
    }

    /// Missing entries are blank too.
    pub fn is_blank(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .map(|f| f.value.is_blank())
            .unwrap_or(true)
    }

    pub fn set(&mut self, name: impl Into<String>, field: Field) {
        self.fields.insert(name.into(), field);
    }

    /// Store a value read from embedded tags.
    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.set(name, Field::new(value, Provenance::Tag));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// An album in the library.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Album {
    /// Database ID (0 until committed)
    pub id: i64,
    pub title: String,
    pub artist: String,
    /// Release date, if any source provided one
    pub date: Option<NaiveDate>,
    pub disc_total: i64,
}

/// A track (audio file) in the library.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Track {
    /// Database ID (0 until committed)
    pub id: i64,
    /// Absolute file path (unique identifier)
    pub path: String,
    pub title: String,
    /// Track number on the disc; zero means unknown once persisted
    pub track_num: i64,
    pub disc: i64,
    /// Foreign key to albums table
    pub album_id: Option<i64>,
}

/// Heterogeneous batch element handed to the commit hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibItem {
    Album(Album),
    Track(Track),
}

impl LibItem {
    pub fn as_track(&self) -> Option<&Track> {
        match self {
            LibItem::Track(t) => Some(t),
            LibItem::Album(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values() {
        assert!(FieldValue::Text(String::new()).is_blank());
        assert!(FieldValue::Text("   ".to_string()).is_blank());
        assert!(FieldValue::Int(0).is_blank());
        assert!(!FieldValue::Int(-1).is_blank());
        assert!(!FieldValue::Text("x".to_string()).is_blank());
        assert!(!FieldValue::Date(NaiveDate::MIN).is_blank());
    }

    #[test]
    fn test_missing_field_is_blank() {
        let mut fields = FieldSet::new();
        assert!(fields.is_blank("title"));

        fields.set_tag("title", "Real Title");
        assert!(!fields.is_blank("title"));
        assert_eq!(fields.text("title"), Some("Real Title"));
        assert_eq!(fields.get("title").unwrap().provenance, Provenance::Tag);
    }

    #[test]
    fn test_typed_accessors_reject_other_kinds() {
        let mut fields = FieldSet::new();
        fields.set_tag("track_num", 7);
        assert_eq!(fields.int("track_num"), Some(7));
        assert_eq!(fields.text("track_num"), None);
        assert_eq!(fields.date("track_num"), None);
    }

    #[test]
    fn test_field_value_display() {
        let date = NaiveDate::from_ymd_opt(1999, 3, 4).unwrap();
        assert_eq!(FieldValue::Date(date).to_string(), "1999-03-04");
        assert_eq!(FieldValue::Int(-2).to_string(), "-2");
        assert_eq!(FieldValue::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_lib_item_as_track() {
        let track = Track {
            id: 1,
            path: "/m/a.mp3".to_string(),
            title: "A".to_string(),
            track_num: 1,
            disc: 1,
            album_id: None,
        };
        assert!(LibItem::Track(track).as_track().is_some());
        let album = Album {
            id: 1,
            title: "X".to_string(),
            artist: "Y".to_string(),
            date: None,
            disc_total: 1,
        };
        assert!(LibItem::Album(album).as_track().is_none());
    }
}
