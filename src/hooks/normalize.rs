//! Zeroing placeholder track numbers before commit.
//!
//! Negative track numbers only exist to keep numberless tracks apart while
//! an album is being read. They must not be stored, and some formats (m4a)
//! refuse to write them.

use tracing::debug;

use crate::model::LibItem;

/// Set every negative track number in `items` to zero. Returns how many
/// tracks changed. Non-track items are skipped; running it twice is a no-op.
pub fn normalize_track_numbers(items: &mut [LibItem]) -> usize {
    let mut changed = 0;
    for item in items.iter_mut() {
        if let LibItem::Track(track) = item
            && track.track_num < 0
        {
            debug!(target: "hooks", path = %track.path, track_num = track.track_num, "Zeroing placeholder track_num");
            track.track_num = 0;
            changed += 1;
        }
    }
    changed
}
