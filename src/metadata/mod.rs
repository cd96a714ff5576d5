//! Audio file metadata reading and writing.
//!
//! Uses the lofty crate for format-independent metadata access.
//! Supports MP3, FLAC, OGG, M4A, and WAV files.
//!
//! # Features
//! - Read a file's tags into a track [`FieldSet`] and an album [`FieldSet`],
//!   leaving absent tags blank
//! - Write a stored [`Track`]/[`Album`] pair back into the file
//! - Strip placeholder values from written tags (see [`erase`])

pub mod erase;

use chrono::{Datelike, NaiveDate};
use lofty::config::WriteOptions;
use lofty::file::{TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Album, FieldSet, Track};
use crate::policy;

pub use erase::{ErasePlan, erase_placeholder_tags, plan_erasure};

/// Fields read from a file's embedded tags.
///
/// Absent text tags read as empty strings and absent numbers as zero, so the
/// reconciler sees them as blank. An absent date is left out entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFields {
    pub track: FieldSet,
    pub album: FieldSet,
}

pub fn read(path: &Path) -> Result<TagFields> {
    let tagged_file = open(path)?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let title = tag
        .and_then(|t| t.title().map(|s| s.to_string()))
        .unwrap_or_default();
    let track_num = tag.and_then(|t| t.track()).map(i64::from).unwrap_or(0);
    let disc = tag.and_then(|t| t.disk()).map(i64::from).unwrap_or(0);

    let mut track = FieldSet::new();
    track.set_tag(policy::TITLE, title);
    track.set_tag(policy::TRACK_NUM, track_num);
    track.set_tag(policy::DISC, disc);

    let album_title = tag
        .and_then(|t| t.album().map(|s| s.to_string()))
        .unwrap_or_default();
    // Prefer the album artist, fall back to the track artist
    let artist = tag
        .and_then(|t| {
            t.get_string(&ItemKey::AlbumArtist)
                .map(|s| s.to_string())
                .or_else(|| t.artist().map(|s| s.to_string()))
        })
        .unwrap_or_default();
    let disc_total = tag.and_then(|t| t.disk_total()).map(i64::from).unwrap_or(0);

    let mut album = FieldSet::new();
    album.set_tag(policy::TITLE, album_title);
    album.set_tag(policy::ARTIST, artist);
    if let Some(date) = tag.and_then(tag_date) {
        album.set_tag(policy::DATE, date);
    }
    album.set_tag(policy::DISC_TOTAL, disc_total);

    Ok(TagFields { track, album })
}

/// Write a track and its album into the file's tags.
///
/// Every value is written as stored, placeholders included; run
/// [`erase_placeholder_tags`] afterwards to strip those again.
/// Negative track numbers are written as zero since several formats
/// cannot hold them. The track artist is left alone; only the album
/// artist is written.
pub fn write(path: &Path, track: &Track, album: &Album) -> Result<()> {
    let mut tagged_file = open(path)?;

    // Get the primary tag type for this format, or create one
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.tag_mut(tag_type) else {
        return Err(Error::metadata(path, "Format has no writable tag"));
    };

    tag.set_title(track.title.clone());
    tag.set_track(u32::try_from(track.track_num).unwrap_or(0));
    if let Ok(disc) = u32::try_from(track.disc) {
        tag.set_disk(disc);
    }

    tag.set_album(album.title.clone());
    tag.insert_text(ItemKey::AlbumArtist, album.artist.clone());
    if let Some(date) = album.date {
        tag.insert_text(ItemKey::RecordingDate, date.format("%Y-%m-%d").to_string());
    }
    if let Ok(total) = u32::try_from(album.disc_total) {
        tag.set_disk_total(total);
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::metadata(path, format!("Failed to write tags to file: {e}")))?;

    tracing::debug!(target: "metadata", path = %path.display(), "Tags written");
    Ok(())
}

fn open(path: &Path) -> Result<TaggedFile> {
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("Failed to open file for probing: {e}")))?
        .read()
        .map_err(|e| Error::metadata(path, format!("Failed to read file metadata: {e}")))
}

/// The tag's date: the recording date if it parses, else January 1st of the year.
pub(crate) fn tag_date(tag: &Tag) -> Option<NaiveDate> {
    tag.get_string(&ItemKey::RecordingDate)
        .and_then(parse_tag_date)
        .or_else(|| {
            tag.year()
                .and_then(|y| i32::try_from(y).ok())
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        })
}

/// Accepts `YYYY-MM-DD` (with anything after, e.g. a time) or a bare `YYYY`.
fn parse_tag_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .or_else(|| {
            raw.get(..4)
                .and_then(|y| y.parse::<i32>().ok())
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        })
        .filter(|d| d.year() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;
    use crate::test_utils::{mock_album, mock_track, write_silent_wav};
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_read_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "This is just some text, not music.").expect("Failed to write to temp file");

        let result = read(file.path());
        assert!(matches!(result, Err(Error::Metadata { .. })));
    }

    #[test]
    fn test_read_non_existent_file_returns_error() {
        let path = Path::new("non_existent_file.mp3");
        assert!(matches!(read(path), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_read_untagged_file_is_all_blank() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.wav");
        write_silent_wav(&path);

        let fields = read(&path).unwrap();
        for name in [policy::TITLE, policy::TRACK_NUM, policy::DISC] {
            assert!(fields.track.is_blank(name), "{name}");
        }
        for name in [policy::TITLE, policy::ARTIST, policy::DATE, policy::DISC_TOTAL] {
            assert!(fields.album.is_blank(name), "{name}");
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_silent_wav(&path);

        let track = Track {
            track_num: 4,
            disc: 2,
            ..mock_track(path.to_str().unwrap())
        };
        let album = mock_album();
        write(&path, &track, &album).unwrap();

        let fields = read(&path).unwrap();
        assert_eq!(fields.track.text(policy::TITLE), Some(track.title.as_str()));
        assert_eq!(fields.track.int(policy::TRACK_NUM), Some(4));
        assert_eq!(fields.track.int(policy::DISC), Some(2));
        assert_eq!(fields.album.text(policy::TITLE), Some(album.title.as_str()));
        assert_eq!(fields.album.text(policy::ARTIST), Some(album.artist.as_str()));
        assert_eq!(fields.album.value(policy::DATE).cloned(), album.date.map(FieldValue::Date));
    }

    #[test]
    fn test_write_keeps_track_artist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compilation.wav");
        write_silent_wav(&path);

        let mut tagged_file = open(&path).unwrap();
        let tag_type = tagged_file.primary_tag_type();
        let mut tag = Tag::new(tag_type);
        tag.set_artist("Guest Singer".to_string());
        tagged_file.insert_tag(tag);
        tagged_file
            .tag(tag_type)
            .unwrap()
            .save_to_path(&path, WriteOptions::default())
            .unwrap();

        let album = Album {
            artist: "Various Artists".to_string(),
            ..mock_album()
        };
        write(&path, &mock_track(path.to_str().unwrap()), &album).unwrap();

        let tagged_file = open(&path).unwrap();
        let tag = tagged_file.primary_tag().unwrap();
        assert_eq!(tag.artist().as_deref(), Some("Guest Singer"));
        assert_eq!(tag.get_string(&ItemKey::AlbumArtist), Some("Various Artists"));
        assert_eq!(read(&path).unwrap().album.text(policy::ARTIST), Some("Various Artists"));
    }

    #[test]
    fn test_write_clamps_negative_track_num() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("neg.wav");
        write_silent_wav(&path);

        let track = Track {
            track_num: -3,
            ..mock_track(path.to_str().unwrap())
        };
        write(&path, &track, &mock_album()).unwrap();

        let fields = read(&path).unwrap();
        assert_eq!(fields.track.int(policy::TRACK_NUM), Some(0));
    }

    #[test]
    fn test_parse_tag_date() {
        assert_eq!(parse_tag_date("1999-12-31"), NaiveDate::from_ymd_opt(1999, 12, 31));
        assert_eq!(parse_tag_date("1999-12-31T10:00"), NaiveDate::from_ymd_opt(1999, 12, 31));
        assert_eq!(parse_tag_date("1984"), NaiveDate::from_ymd_opt(1984, 1, 1));
        assert_eq!(parse_tag_date("0001-01-01"), NaiveDate::from_ymd_opt(1, 1, 1));
        assert_eq!(parse_tag_date("soon"), None);
        assert_eq!(parse_tag_date(""), None);
    }
}
