//! Directory scanning for audio files.

use futures::stream::Stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::WalkDir;

/// Audio extensions scanned when the configuration does not name any.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "m4a", "wav"];

/// Whether `path` has one of `extensions` (case-insensitive, no leading dot).
pub fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Scans the given root directory recursively for audio files.
///
/// Entries are visited in file-name order, so the files of one directory
/// (usually one album) arrive together and in a stable order.
/// Returns a Stream of PathBufs.
pub fn scan(root: PathBuf, extensions: Vec<String>) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        let walker = WalkDir::new(&root).sort_by_file_name().into_iter();
        for entry in walker.filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(target: "library", error = %err, "Skipping unreadable entry");
                None
            }
        }) {
            if entry.file_type().is_file() && is_audio_file(entry.path(), &extensions) {
                // If the receiver is dropped, stop scanning.
                if tx.blocking_send(entry.into_path()).is_err() {
                    break;
                }
            }
        }
    });

    // Convert the mpsc Receiver into a Stream
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}
