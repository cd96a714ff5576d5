//! Test utilities and fixtures for path-tagger tests.
//!
//! This module provides common test helpers, mock factories, and
//! database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{temp_db, mock_track};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let track = mock_track("/music/song.mp3");
//!     // ... test logic
//! }
//! ```

use chrono::NaiveDate;
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use tempfile::TempDir;

use crate::model::{Album, FieldSet, Track};
use crate::policy;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = crate::db::db_url(Some(db_path.as_path()));

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Track fields as read from a file with no tags at all.
pub fn blank_track_fields() -> FieldSet {
    let mut fields = FieldSet::new();
    fields.set_tag(policy::TITLE, "");
    fields.set_tag(policy::TRACK_NUM, 0);
    fields.set_tag(policy::DISC, 0);
    fields
}

/// Album fields as read from a file with no tags at all. No date entry.
pub fn blank_album_fields() -> FieldSet {
    let mut fields = FieldSet::new();
    fields.set_tag(policy::TITLE, "");
    fields.set_tag(policy::ARTIST, "");
    fields.set_tag(policy::DISC_TOTAL, 0);
    fields
}

/// Creates a mock Track at `path`. Customize with struct update syntax:
///
/// ```ignore
/// let track = Track { track_num: 0, ..mock_track("/a.mp3") };
/// ```
pub fn mock_track(path: &str) -> Track {
    Track {
        id: 0,
        path: path.to_string(),
        title: "Test Track".to_string(),
        track_num: 1,
        disc: 1,
        album_id: None,
    }
}

/// Creates a mock Album with a real date.
pub fn mock_album() -> Album {
    Album {
        id: 0,
        title: "Test Album".to_string(),
        artist: "Test Artist".to_string(),
        date: NaiveDate::from_ymd_opt(2001, 5, 6),
        disc_total: 1,
    }
}

/// Writes a short, silent, untagged PCM WAV file to `path`.
///
/// Small enough to create per test, and a format lofty can tag (ID3v2 chunk).
pub fn write_silent_wav(path: &Path) {
    const SAMPLE_RATE: u32 = 8000;
    const SAMPLES: u32 = 800;
    let data_len = SAMPLES * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    std::fs::write(path, bytes).expect("Failed to write test WAV file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        // Should be able to query
        let tracks = crate::db::get_all_tracks(&pool).await.unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_blank_fields_are_blank() {
        let track = blank_track_fields();
        assert!(track.iter().all(|(name, _)| track.is_blank(name)));
        let album = blank_album_fields();
        assert!(album.is_blank(policy::DATE));
        assert!(album.iter().all(|(name, _)| album.is_blank(name)));
    }

    #[test]
    fn test_mock_defaults() {
        let track = mock_track("/music/song.flac");
        assert_eq!(track.path, "/music/song.flac");
        assert_eq!(track.track_num, 1);
        assert!(mock_album().date.is_some());
    }

    #[test]
    fn test_silent_wav_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.wav");
        write_silent_wav(&path);
        assert!(crate::metadata::read(&path).is_ok());
    }
}
