//! Library import, listing, editing and tag writing commands.

use futures::StreamExt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

use super::{build_plugin, open_db};
use crate::config::Config;
use crate::db;
use crate::library::{self, ImportEvent, ImportSummary, TrackEdit};

/// Import a directory into the library
pub fn cmd_import(
    rt: &Runtime,
    config: &Config,
    path: &Path,
    db_path: Option<&Path>,
) -> anyhow::Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }
    let plugin = Arc::new(build_plugin(config)?);
    let root = std::path::absolute(path)?;

    rt.block_on(async {
        let pool = open_db(config, db_path).await?;
        println!("Importing directory: {}", root.display());

        let stream = library::import_library(
            pool,
            root.clone(),
            config.library.extensions.clone(),
            plugin,
        );
        let mut stream = std::pin::pin!(stream);
        let mut summary = ImportSummary::default();

        while let Some(event) = stream.next().await {
            summary.record(&event);
            match &event {
                ImportEvent::Added { .. } | ImportEvent::Updated(_) => {
                    let done = summary.added + summary.updated;
                    if done % 100 == 0 {
                        print!("\rImported {done} tracks...");
                        std::io::stdout().flush()?;
                    }
                }
                ImportEvent::Duplicate { path, existing } => {
                    eprintln!(
                        "\nSkipping duplicate {} (same position as {})",
                        path.display(),
                        existing.display()
                    );
                }
                ImportEvent::Error(path, e) => {
                    eprintln!("\nError processing {}: {e}", path.display());
                }
            }
        }

        info!(
            target: "library",
            added = summary.added,
            updated = summary.updated,
            duplicates = summary.duplicates,
            errors = summary.errors,
            "Import finished"
        );
        println!(
            "\nImport complete. Added: {}, updated: {}, duplicates: {}, errors: {}.",
            summary.added, summary.updated, summary.duplicates, summary.errors
        );
        Ok(())
    })
}

/// List all tracks in the library
pub fn cmd_list(rt: &Runtime, config: &Config, db_path: Option<&Path>) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(config, db_path).await?;
        let tracks = db::get_all_tracks_with_album(&pool).await?;

        let mut current_album: Option<(String, String)> = None;
        for track in &tracks {
            let album = (track.album_artist.clone(), track.album_title.clone());
            if current_album.as_ref() != Some(&album) {
                println!("{} - {}", album.0, album.1);
                current_album = Some(album);
            }
            let number = if track.track_num > 0 {
                format!("{}-{:02}", track.disc, track.track_num)
            } else {
                "  --".to_string()
            };
            println!("  {number}  {}  ({})", track.title, track.path_buf().display());
        }
        println!("{} tracks.", tracks.len());
        Ok(())
    })
}

/// Edit one stored track and rewrite its tags
pub fn cmd_edit(
    rt: &Runtime,
    config: &Config,
    path: &Path,
    edit: TrackEdit,
    db_path: Option<&Path>,
) -> anyhow::Result<()> {
    if edit.is_empty() {
        anyhow::bail!("Nothing to change: pass --title, --track-num or --disc");
    }
    let plugin = build_plugin(config)?;
    let path = std::path::absolute(path)?;

    rt.block_on(async {
        let pool = open_db(config, db_path).await?;
        let track = library::edit_track(&pool, &path, &edit, &plugin).await?;
        println!(
            "Updated {}: \"{}\", disc {}, track {}",
            track.path,
            track.title,
            track.disc,
            if track.track_num > 0 {
                track.track_num.to_string()
            } else {
                "none".to_string()
            }
        );
        Ok(())
    })
}

/// Rewrite tags for stored tracks
pub fn cmd_write(
    rt: &Runtime,
    config: &Config,
    path: Option<&Path>,
    db_path: Option<&Path>,
) -> anyhow::Result<()> {
    let plugin = build_plugin(config)?;
    let under = path.map(std::path::absolute).transpose()?;

    rt.block_on(async {
        let pool = open_db(config, db_path).await?;
        let summary = library::write_all(&pool, under.as_deref(), &plugin).await?;

        for (path, e) in &summary.failed {
            eprintln!("Error writing {}: {e}", path.display());
        }
        info!(target: "library", written = summary.written, failed = summary.failed.len(), "Tag write finished");
        println!(
            "Wrote tags for {} tracks ({} failed).",
            summary.written,
            summary.failed.len()
        );
        Ok(())
    })
}
