//! Library pipelines: import a directory, edit a stored track, write tags.
//!
//! Every pipeline calls [`LibraryHooks`] at fixed points:
//!
//! - import: read tags → `read_custom_tags` → build records → in-album
//!   duplicate check → `process_new_items` (or `process_changed_items` for
//!   a path already in the library) → commit
//! - edit: apply changes → `process_changed_items` → commit → write
//! - write: default tag write → `write_custom_tags`

use futures::{Stream, StreamExt};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::hooks::LibraryHooks;
use crate::metadata::{self, TagFields};
use crate::model::{Album, FieldSet, LibItem, Track};
use crate::policy;
use crate::reconcile::TrackNumberAllocator;
use crate::{db, scanner};

/// Outcome of importing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    /// A new track was committed
    Added { path: PathBuf, track_num: i64 },
    /// A track already in the library was refreshed
    Updated(PathBuf),
    /// Skipped: another file holds the same position on the same album
    Duplicate { path: PathBuf, existing: PathBuf },
    /// Reading, reconciling or committing failed; nothing was committed
    Error(PathBuf, String),
}

/// Running totals over [`ImportEvent`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub errors: usize,
}

impl ImportSummary {
    pub fn record(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::Added { .. } => self.added += 1,
            ImportEvent::Updated(_) => self.updated += 1,
            ImportEvent::Duplicate { .. } => self.duplicates += 1,
            ImportEvent::Error(..) => self.errors += 1,
        }
    }
}

/// Album identity plus position, used to spot duplicates within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AlbumPosition {
    album: String,
    artist: String,
    disc: i64,
    track_num: i64,
}

impl AlbumPosition {
    fn of(track: &Track, album: &Album) -> Self {
        Self {
            album: album.title.clone(),
            artist: album.artist.clone(),
            disc: track.disc,
            track_num: track.track_num,
        }
    }
}

struct Importer {
    pool: SqlitePool,
    hooks: Arc<dyn LibraryHooks>,
    paths: Pin<Box<dyn Stream<Item = PathBuf>>>,
    allocator: TrackNumberAllocator,
    seen: HashMap<AlbumPosition, PathBuf>,
}

impl Importer {
    async fn import_file(&mut self, path: PathBuf) -> ImportEvent {
        match self.try_import(&path).await {
            Ok(event) => event,
            Err(e) => {
                warn!(target: "library", path = %path.display(), error = %e, "Import failed");
                ImportEvent::Error(path, e.to_string())
            }
        }
    }

    async fn try_import(&mut self, path: &Path) -> Result<ImportEvent> {
        let TagFields {
            track: mut track_fields,
            album: mut album_fields,
        } = metadata::read(path)?;
        self.hooks
            .read_custom_tags(path, &mut track_fields, &mut album_fields, &mut self.allocator)?;

        let (track, album) = build_records(path, &track_fields, &album_fields);

        // Checked before the commit hooks run, while numberless tracks still
        // carry distinct placeholder numbers.
        let position = AlbumPosition::of(&track, &album);
        if let Some(existing) = self.seen.get(&position) {
            debug!(target: "library", path = %path.display(), existing = %existing.display(), "Duplicate position in album");
            return Ok(ImportEvent::Duplicate {
                path: path.to_path_buf(),
                existing: existing.clone(),
            });
        }

        let known = db::get_track_by_path(&self.pool, &track.path).await?.is_some();
        let mut items = vec![LibItem::Album(album), LibItem::Track(track)];
        if known {
            self.hooks.process_changed_items(&mut items);
        } else {
            self.hooks.process_new_items(&mut items);
        }
        let (album, mut track) = unpack(path, items)?;

        let album_id = db::get_or_create_album(&self.pool, &album).await?;
        track.album_id = Some(album_id);

        // Zero is "no number" once committed and never collides
        if track.track_num > 0
            && let Some(existing) = db::find_track_at_position(
                &self.pool,
                album_id,
                track.disc,
                track.track_num,
                &track.path,
            )
            .await?
        {
            return Ok(ImportEvent::Duplicate {
                path: path.to_path_buf(),
                existing: PathBuf::from(existing.path),
            });
        }

        db::insert_track(&self.pool, &track).await?;
        self.seen.insert(position, path.to_path_buf());

        debug!(target: "library", path = %path.display(), track_num = track.track_num, album = %album.title, "Committed");
        Ok(if known {
            ImportEvent::Updated(path.to_path_buf())
        } else {
            ImportEvent::Added {
                path: path.to_path_buf(),
                track_num: track.track_num,
            }
        })
    }
}

/// Scans `root` and imports every audio file into the database.
///
/// Files are processed one at a time in scan order, since placeholder
/// track numbers depend on the order files of an album are seen.
/// Returns a stream of [`ImportEvent`]s, one per file; a failing file does
/// not stop the run.
pub fn import_library(
    pool: SqlitePool,
    root: PathBuf,
    extensions: Vec<String>,
    hooks: Arc<dyn LibraryHooks>,
) -> impl Stream<Item = ImportEvent> {
    let importer = Importer {
        pool,
        hooks,
        paths: Box::pin(scanner::scan(root, extensions)),
        allocator: TrackNumberAllocator::new(),
        seen: HashMap::new(),
    };

    futures::stream::unfold(importer, |mut importer| async move {
        let path = importer.paths.next().await?;
        let event = importer.import_file(path).await;
        Some((event, importer))
    })
}

/// Build the records to store from reconciled field sets.
///
/// Fields that are still missing (no hooks filled them) fall back to empty
/// text and zero.
pub fn build_records(path: &Path, track: &FieldSet, album: &FieldSet) -> (Track, Album) {
    let track = Track {
        id: 0,
        path: path.to_string_lossy().into_owned(),
        title: track.text(policy::TITLE).unwrap_or_default().to_string(),
        track_num: track.int(policy::TRACK_NUM).unwrap_or(0),
        disc: track.int(policy::DISC).unwrap_or(0),
        album_id: None,
    };
    let album = Album {
        id: 0,
        title: album.text(policy::TITLE).unwrap_or_default().to_string(),
        artist: album.text(policy::ARTIST).unwrap_or_default().to_string(),
        date: album.date(policy::DATE),
        disc_total: album.int(policy::DISC_TOTAL).unwrap_or(0),
    };
    (track, album)
}

fn unpack(path: &Path, items: Vec<LibItem>) -> Result<(Album, Track)> {
    let (mut album, mut track) = (None, None);
    for item in items {
        match item {
            LibItem::Album(a) => album = Some(a),
            LibItem::Track(t) => track = Some(t),
        }
    }
    match (album, track) {
        (Some(album), Some(track)) => Ok((album, track)),
        _ => Err(Error::metadata(path, "Commit batch lost an item")),
    }
}

/// Changes to apply to a stored track. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackEdit {
    pub title: Option<String>,
    pub track_num: Option<i64>,
    pub disc: Option<i64>,
}

impl TrackEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.track_num.is_none() && self.disc.is_none()
    }

    fn apply(&self, track: &mut Track) {
        if let Some(title) = &self.title {
            track.title = title.clone();
        }
        if let Some(n) = self.track_num {
            track.track_num = n;
        }
        if let Some(disc) = self.disc {
            track.disc = disc;
        }
    }
}

/// Edit the stored track at `path`, commit it and rewrite the file's tags.
///
/// Returns the track as committed.
pub async fn edit_track(
    pool: &SqlitePool,
    path: &Path,
    edit: &TrackEdit,
    hooks: &dyn LibraryHooks,
) -> Result<Track> {
    let key = path.to_string_lossy();
    let mut track = db::get_track_by_path(pool, &key)
        .await?
        .ok_or_else(|| Error::not_found(path))?;
    edit.apply(&mut track);

    let mut items = vec![LibItem::Track(track)];
    hooks.process_changed_items(&mut items);
    let Some(LibItem::Track(track)) = items.pop() else {
        return Err(Error::metadata(path, "Commit batch lost the track"));
    };

    db::update_track(pool, &track).await?;
    write_track(pool, &track, hooks).await?;
    Ok(track)
}

/// Write a stored track and its album into the file, then run the write hook.
pub async fn write_track(pool: &SqlitePool, track: &Track, hooks: &dyn LibraryHooks) -> Result<()> {
    let path = Path::new(&track.path);
    let album = match track.album_id {
        Some(id) => db::get_album_by_id(pool, id).await?,
        None => None,
    }
    .ok_or_else(|| Error::metadata(path, "Track has no album record"))?;

    metadata::write(path, track, &album)?;
    hooks.write_custom_tags(track)?;
    Ok(())
}

/// Result of a bulk tag write.
#[derive(Debug, Clone, Default)]
pub struct WriteSummary {
    pub written: usize,
    pub failed: Vec<(PathBuf, String)>,
}

/// Rewrite tags for every stored track, or only those under `under`.
///
/// A failing file is recorded and the rest are still written.
pub async fn write_all(
    pool: &SqlitePool,
    under: Option<&Path>,
    hooks: &dyn LibraryHooks,
) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    for track in db::get_all_tracks(pool).await? {
        if let Some(root) = under
            && !Path::new(&track.path).starts_with(root)
        {
            continue;
        }
        match write_track(pool, &track, hooks).await {
            Ok(()) => summary.written += 1,
            Err(e) => {
                warn!(target: "library", path = %track.path, error = %e, "Tag write failed");
                summary.failed.push((PathBuf::from(&track.path), e.to_string()));
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hooks::{NoHooks, PathGuessPlugin};
    use crate::scanner::DEFAULT_EXTENSIONS;
    use crate::test_utils::{temp_db, write_silent_wav};
    use tempfile::tempdir;

    fn plugin() -> Arc<dyn LibraryHooks> {
        Arc::new(PathGuessPlugin::from_config(&Config::default()).unwrap())
    }

    fn extensions() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    fn album_dir(root: &Path, name: &str, files: &[&str]) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            write_silent_wav(&dir.join(file));
        }
        dir
    }

    async fn run_import(
        pool: &SqlitePool,
        root: &Path,
        hooks: Arc<dyn LibraryHooks>,
    ) -> (Vec<ImportEvent>, ImportSummary) {
        let events: Vec<ImportEvent> =
            import_library(pool.clone(), root.to_path_buf(), extensions(), hooks)
                .collect()
                .await;
        let mut summary = ImportSummary::default();
        for event in &events {
            summary.record(event);
        }
        (events, summary)
    }

    #[tokio::test]
    async fn test_import_commits_numberless_tracks_as_zero() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        album_dir(music.path(), "My Album", &["Other.wav", "Song.wav"]);

        let (events, summary) = run_import(&pool, music.path(), plugin()).await;
        assert_eq!(summary.added, 2, "{events:?}");
        assert_eq!(summary.duplicates, 0);

        let tracks = db::get_all_tracks_with_album(&pool).await.unwrap();
        assert_eq!(tracks.len(), 2);
        for track in &tracks {
            assert_eq!(track.track_num, 0);
            assert_eq!(track.album_title, "My Album");
            assert_eq!(track.album_artist, "Unknown Artist");
        }
        let mut titles: Vec<_> = tracks.iter().map(|t| t.title.as_str()).collect();
        titles.sort();
        assert_eq!(titles, vec!["Other", "Song"]);
    }

    #[tokio::test]
    async fn test_import_without_hooks_miscounts_numberless_tracks() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        album_dir(music.path(), "My Album", &["Other.wav", "Song.wav"]);

        let (_, summary) = run_import(&pool, music.path(), Arc::new(NoHooks)).await;
        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates, 1);
    }

    #[tokio::test]
    async fn test_import_skips_in_album_duplicates() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        album_dir(music.path(), "Album", &["01 First.wav", "01 Second.wav", "02 Third.wav"]);

        let (events, summary) = run_import(&pool, music.path(), plugin()).await;
        assert_eq!(summary.added, 2);
        assert_eq!(summary.duplicates, 1);
        assert!(events.iter().any(|e| matches!(
            e,
            ImportEvent::Duplicate { path, .. } if path.ends_with("01 Second.wav")
        )));
    }

    #[tokio::test]
    async fn test_same_position_on_different_albums_is_fine() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        album_dir(music.path(), "A", &["01 x.wav", "Loose.wav"]);
        album_dir(music.path(), "B", &["01 x.wav", "Loose.wav"]);

        let (_, summary) = run_import(&pool, music.path(), plugin()).await;
        assert_eq!(summary.added, 4);
        assert_eq!(summary.duplicates, 0);
    }

    #[tokio::test]
    async fn test_import_continues_after_bad_file() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        let dir = album_dir(music.path(), "Album", &["02 Good.wav"]);
        std::fs::write(dir.join("01 Broken.mp3"), "not audio").unwrap();

        let (events, summary) = run_import(&pool, music.path(), plugin()).await;
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.added, 1);
        assert!(matches!(&events[0], ImportEvent::Error(path, _) if path.ends_with("01 Broken.mp3")));
        assert_eq!(db::get_all_tracks(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reimport_updates_in_place() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        album_dir(music.path(), "Album", &["01 One.wav", "Untitled.wav"]);

        run_import(&pool, music.path(), plugin()).await;
        let (_, summary) = run_import(&pool, music.path(), plugin()).await;
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.duplicates, 0);
        assert_eq!(db::get_all_tracks(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_track_commits_and_writes() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        let dir = album_dir(music.path(), "Album", &["03 Song.wav"]);
        let path = dir.join("03 Song.wav");
        let hooks = plugin();
        run_import(&pool, music.path(), hooks.clone()).await;

        let edit = TrackEdit {
            title: Some("Better Title".to_string()),
            ..TrackEdit::default()
        };
        let track = edit_track(&pool, &path, &edit, hooks.as_ref()).await.unwrap();
        assert_eq!(track.title, "Better Title");
        assert_eq!(track.track_num, 3);

        let on_disk = metadata::read(&path).unwrap();
        assert_eq!(on_disk.track.text(policy::TITLE), Some("Better Title"));
        assert_eq!(on_disk.track.int(policy::TRACK_NUM), Some(3));
        assert_eq!(on_disk.album.text(policy::TITLE), Some("Album"));
        // Placeholder date never reaches the file
        assert!(on_disk.album.is_blank(policy::DATE));
    }

    #[tokio::test]
    async fn test_edit_negative_track_num_is_zeroed_and_erased() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        let dir = album_dir(music.path(), "Album", &["03 Song.wav"]);
        let path = dir.join("03 Song.wav");
        let hooks = plugin();
        run_import(&pool, music.path(), hooks.clone()).await;

        let edit = TrackEdit {
            track_num: Some(-4),
            ..TrackEdit::default()
        };
        let track = edit_track(&pool, &path, &edit, hooks.as_ref()).await.unwrap();
        assert_eq!(track.track_num, 0);

        let on_disk = metadata::read(&path).unwrap();
        assert!(on_disk.track.is_blank(policy::TRACK_NUM));
    }

    #[tokio::test]
    async fn test_edit_unknown_track_is_not_found() {
        let (pool, _db) = temp_db().await;
        let result = edit_track(
            &pool,
            Path::new("/nowhere/x.mp3"),
            &TrackEdit::default(),
            &NoHooks,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_all_respects_prefix() {
        let (pool, _db) = temp_db().await;
        let music = tempdir().unwrap();
        album_dir(music.path(), "A", &["01 a.wav"]);
        album_dir(music.path(), "B", &["01 b.wav"]);
        let hooks = plugin();
        run_import(&pool, music.path(), hooks.clone()).await;

        let summary = write_all(&pool, Some(music.path().join("A").as_path()), hooks.as_ref())
            .await
            .unwrap();
        assert_eq!(summary.written, 1);
        assert!(summary.failed.is_empty());

        let written = metadata::read(&music.path().join("A").join("01 a.wav")).unwrap();
        assert_eq!(written.track.text(policy::TITLE), Some("a"));
        let untouched = metadata::read(&music.path().join("B").join("01 b.wav")).unwrap();
        assert!(untouched.track.is_blank(policy::TITLE));
    }

    #[test]
    fn test_build_records_defaults_missing_fields() {
        let (track, album) = build_records(Path::new("/m/x.mp3"), &FieldSet::new(), &FieldSet::new());
        assert_eq!(track.path, "/m/x.mp3");
        assert_eq!(track.title, "");
        assert_eq!(track.track_num, 0);
        assert_eq!(album.date, None);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ImportSummary::default();
        summary.record(&ImportEvent::Added {
            path: "/a".into(),
            track_num: 1,
        });
        summary.record(&ImportEvent::Error("/b".into(), "bad".to_string()));
        assert_eq!(summary.added, 1);
        assert_eq!(summary.errors, 1);
        assert!(TrackEdit::default().is_empty());
    }
}
