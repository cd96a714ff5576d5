//! Database module for track and album persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Album lookup/creation keyed on title and artist
//! - Track upserts keyed on file path, and edits by ID
//! - Queries used by the import pipeline and the `list` command
//!
//! # Example
//!
//! ```ignore
//! use path_tagger::db::{init_db, get_all_tracks_with_album};
//!
//! let pool = init_db("sqlite:path_tagger.db").await?;
//! let tracks = get_all_tracks_with_album(&pool).await?;
//! ```

use std::path::{Path, PathBuf};

use crate::model::{Album, Track};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "path_tagger.db";

const TRACK_COLUMNS: &str = "id, path, title, track_num, disc, album_id";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(target: "db", url = db_url, "Database ready");
    Ok(pool)
}

/// Get or create an album by title and artist.
///
/// An existing album keeps its stored date and disc total; the values on
/// `album` are only used when the row is created.
///
/// # Returns
///
/// The database ID of the (existing or new) album.
pub async fn get_or_create_album(pool: &SqlitePool, album: &Album) -> sqlx::Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM albums WHERE title = ? AND artist = ?")
        .bind(&album.title)
        .bind(&album.artist)
        .fetch_optional(pool)
        .await?;

    if let Some((id,)) = row {
        Ok(id)
    } else {
        let result =
            sqlx::query("INSERT INTO albums (title, artist, date, disc_total) VALUES (?, ?, ?, ?)")
                .bind(&album.title)
                .bind(&album.artist)
                .bind(album.date)
                .bind(album.disc_total)
                .execute(pool)
                .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Get an album by its database ID.
pub async fn get_album_by_id(pool: &SqlitePool, album_id: i64) -> sqlx::Result<Option<Album>> {
    sqlx::query_as::<_, Album>(
        "SELECT id, title, artist, date, disc_total FROM albums WHERE id = ?",
    )
    .bind(album_id)
    .fetch_optional(pool)
    .await
}

/// Insert or update a track record.
///
/// Uses SQLite's UPSERT to either insert a new track or update an existing
/// one based on the file path. The `id` field of `track` is ignored.
///
/// # Returns
///
/// The database ID of the inserted or updated track.
pub async fn insert_track(pool: &SqlitePool, track: &Track) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tracks (path, title, track_num, disc, album_id)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            title = excluded.title,
            track_num = excluded.track_num,
            disc = excluded.disc,
            album_id = excluded.album_id
        RETURNING id
        "#,
    )
    .bind(&track.path)
    .bind(&track.title)
    .bind(track.track_num)
    .bind(track.disc)
    .bind(track.album_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Update an existing track's editable fields by ID.
pub async fn update_track(pool: &SqlitePool, track: &Track) -> sqlx::Result<()> {
    sqlx::query("UPDATE tracks SET title = ?, track_num = ?, disc = ?, album_id = ? WHERE id = ?")
        .bind(&track.title)
        .bind(track.track_num)
        .bind(track.disc)
        .bind(track.album_id)
        .bind(track.id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Get all tracks from the database, ordered by path.
pub async fn get_all_tracks(pool: &SqlitePool) -> sqlx::Result<Vec<Track>> {
    sqlx::query_as::<_, Track>(&format!("SELECT {TRACK_COLUMNS} FROM tracks ORDER BY path"))
        .fetch_all(pool)
        .await
}

/// Get a track by its file path.
pub async fn get_track_by_path(pool: &SqlitePool, path: &str) -> sqlx::Result<Option<Track>> {
    sqlx::query_as::<_, Track>(&format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE path = ?"))
        .bind(path)
        .fetch_optional(pool)
        .await
}

/// Find another stored track holding `disc`/`track_num` on the same album.
///
/// Tracks at `exclude_path` are ignored so re-importing a file never
/// collides with itself.
pub async fn find_track_at_position(
    pool: &SqlitePool,
    album_id: i64,
    disc: i64,
    track_num: i64,
    exclude_path: &str,
) -> sqlx::Result<Option<Track>> {
    sqlx::query_as::<_, Track>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks \
         WHERE album_id = ? AND disc = ? AND track_num = ? AND path != ? LIMIT 1"
    ))
    .bind(album_id)
    .bind(disc)
    .bind(track_num)
    .bind(exclude_path)
    .fetch_optional(pool)
    .await
}

/// Track with its album's title and artist joined in.
///
/// Used for display where human-readable names are needed rather than
/// foreign key IDs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackWithAlbum {
    pub id: i64,
    pub title: String,
    pub path: String,
    pub track_num: i64,
    pub disc: i64,
    /// Album title (or "Unknown Album")
    pub album_title: String,
    /// Album artist (or "Unknown Artist")
    pub album_artist: String,
}

impl TrackWithAlbum {
    /// Convert the path string to a PathBuf.
    pub fn path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

/// Get all tracks with album names, ordered by album then position.
///
/// Performs a LEFT JOIN to include tracks even if they have no album.
pub async fn get_all_tracks_with_album(pool: &SqlitePool) -> sqlx::Result<Vec<TrackWithAlbum>> {
    sqlx::query_as::<_, TrackWithAlbum>(
        r#"
        SELECT
            t.id, t.title, t.path, t.track_num, t.disc,
            COALESCE(al.title, 'Unknown Album') as album_title,
            COALESCE(al.artist, 'Unknown Artist') as album_artist
        FROM tracks t
        LEFT JOIN albums al ON t.album_id = al.id
        ORDER BY album_artist, album_title, t.disc, t.track_num, t.path
        "#,
    )
    .fetch_all(pool)
    .await
}
