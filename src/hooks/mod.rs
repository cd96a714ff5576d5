//! Lifecycle hooks around library ingestion.
//!
//! The import and edit pipelines in [`crate::library`] call a
//! [`LibraryHooks`] implementation at four points:
//!
//! | hook                      | when                                       |
//! |---------------------------|--------------------------------------------|
//! | `read_custom_tags`        | after a file's tags are read               |
//! | `process_new_items`       | before new items are committed             |
//! | `process_changed_items`   | before changed items are committed         |
//! | `write_custom_tags`       | after the default tag write to a file      |
//!
//! [`PathGuessPlugin`] is the implementation that fills blank fields from the
//! file path and keeps placeholder values out of persisted data and tags.

mod normalize;

pub use normalize::normalize_track_numbers;

use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::guess::PathGuesser;
use crate::metadata;
use crate::model::{FieldSet, LibItem, Track};
use crate::policy::NullFieldPolicy;
use crate::reconcile::{Reconciler, TrackNumberAllocator};

/// Extension points of the library pipeline. Every hook defaults to a no-op.
pub trait LibraryHooks {
    /// Adjust freshly read fields before records are built from them.
    fn read_custom_tags(
        &self,
        _path: &Path,
        _track: &mut FieldSet,
        _album: &mut FieldSet,
        _allocator: &mut TrackNumberAllocator,
    ) -> Result<()> {
        Ok(())
    }

    /// Adjust items about to be committed for the first time.
    fn process_new_items(&self, _items: &mut [LibItem]) {}

    /// Adjust items about to be committed after an edit.
    fn process_changed_items(&self, _items: &mut [LibItem]) {}

    /// Post-process a file right after its tags were written.
    fn write_custom_tags(&self, _track: &Track) -> Result<()> {
        Ok(())
    }
}

/// Hooks that do nothing, for running the pipeline without plugins.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl LibraryHooks for NoHooks {}

/// Immutable settings for [`PathGuessPlugin`], built once from [`Config`].
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub policy: NullFieldPolicy,
    /// `None` when guessing is disabled
    pub guesser: Option<PathGuesser>,
}

impl PluginConfig {
    /// Validate the placeholder tables and compile the filename patterns.
    pub fn from_config(config: &Config) -> Result<Self> {
        let policy = NullFieldPolicy::new(&config.placeholders)?;
        let guesser = if config.guessing.enabled {
            Some(PathGuesser::new(&config.guessing.patterns)?)
        } else {
            None
        };
        Ok(Self { policy, guesser })
    }
}

/// Fills blank fields from the file path and strips placeholders again
/// before they reach the database or a file's tags.
#[derive(Debug, Clone)]
pub struct PathGuessPlugin {
    config: PluginConfig,
}

impl PathGuessPlugin {
    pub fn new(config: PluginConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        PluginConfig::from_config(config).map(Self::new)
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.config.policy, self.config.guesser.as_ref())
    }
}

impl LibraryHooks for PathGuessPlugin {
    fn read_custom_tags(
        &self,
        path: &Path,
        track: &mut FieldSet,
        album: &mut FieldSet,
        allocator: &mut TrackNumberAllocator,
    ) -> Result<()> {
        debug!(target: "hooks", path = %path.display(), "Filling blank fields");
        self.reconciler().reconcile(path, track, album, allocator)
    }

    fn process_new_items(&self, items: &mut [LibItem]) {
        normalize_track_numbers(items);
    }

    fn process_changed_items(&self, items: &mut [LibItem]) {
        normalize_track_numbers(items);
    }

    fn write_custom_tags(&self, track: &Track) -> Result<()> {
        debug!(target: "hooks", path = %track.path, "Erasing placeholder tags");
        metadata::erase_placeholder_tags(Path::new(&track.path), track, &self.config.policy)?;
        Ok(())
    }
}
