//! Removing placeholder values from written tags.
//!
//! Tag libraries cannot store "no value" for a numeric tag: clearing a track
//! number still serializes a zero. So after the normal tag write, the file is
//! reopened and tags that still mean "unknown" are deleted outright.
//!
//! The track number is checked twice, against the stored track and against
//! what is on disk. The stored value may already be zeroed while the file
//! still carries a stale number from an earlier write, and the two can
//! disagree in either direction.

use chrono::NaiveDate;
use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::tag::{Accessor, ItemKey, TagExt};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Track;
use crate::policy::NullFieldPolicy;

use super::{open, tag_date};

/// Which tags to delete from a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErasePlan {
    pub track_num: bool,
    pub date: bool,
}

impl ErasePlan {
    pub fn is_empty(&self) -> bool {
        !self.track_num && !self.date
    }
}

/// Decide which tags to delete.
///
/// The track number goes if the stored one is not positive, or the on-disk
/// one is not positive or missing. The date goes if the on-disk date is the
/// album date placeholder.
pub fn plan_erasure(
    track: &Track,
    on_disk_track: Option<u32>,
    on_disk_date: Option<NaiveDate>,
    policy: &NullFieldPolicy,
) -> ErasePlan {
    let disk_track_null = on_disk_track
        .map(|n| policy.is_null_track_num(i64::from(n)))
        .unwrap_or(true);

    ErasePlan {
        track_num: policy.is_null_track_num(track.track_num) || disk_track_null,
        date: on_disk_date.is_some_and(|d| policy.is_null_date(d)),
    }
}

/// Reopen `track`'s file and delete tags that still hold placeholders.
///
/// Call after the regular tag write. Errors reopening or saving the file
/// are returned as is; nothing is retried.
pub fn erase_placeholder_tags(
    path: &Path,
    track: &Track,
    policy: &NullFieldPolicy,
) -> Result<ErasePlan> {
    debug!(target: "metadata::erase", path = %path.display(), "Checking tags for placeholders");

    let mut tagged_file = open(path)?;
    let tag_type = tagged_file.primary_tag_type();
    let Some(tag) = tagged_file.tag_mut(tag_type) else {
        debug!(target: "metadata::erase", path = %path.display(), "File has no tag, nothing to erase");
        return Ok(ErasePlan::default());
    };

    let plan = plan_erasure(track, tag.track(), tag_date(tag), policy);
    if plan.is_empty() {
        return Ok(plan);
    }

    if plan.track_num {
        debug!(target: "metadata::erase", on_disk = ?tag.track(), stored = track.track_num, "Deleting track number tag");
        tag.remove_track();
    }
    if plan.date {
        debug!(target: "metadata::erase", on_disk = ?tag_date(tag), "Deleting date tag");
        tag.remove_key(&ItemKey::RecordingDate);
        tag.remove_year();
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::metadata(path, format!("Failed to save erased tags: {e}")))?;

    Ok(plan)
}
