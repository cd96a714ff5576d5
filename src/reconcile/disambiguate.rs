//! Unique placeholder track numbers per album.
//!
//! Tracks without a track number would all carry the same placeholder and be
//! flagged as duplicates of each other inside their album. The allocator
//! hands out -1, -2, -3, ... per album instead. Counters are keyed by album,
//! so the order in which albums are processed does not matter.

use std::collections::HashMap;

/// Per-album placeholder track number counters for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct TrackNumberAllocator {
    counters: HashMap<String, i64>,
}

impl TrackNumberAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next placeholder track number for `album`: -1 for its first
    /// numberless track, then -2, and so on.
    pub fn next_placeholder(&mut self, album: &str) -> i64 {
        let count = self.counters.entry(album.to_string()).or_insert(0);
        *count += 1;
        -*count
    }

    /// Clear all counters, ending the current ingestion run.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}
