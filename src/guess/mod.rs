//! Field guessing from file paths.
//!
//! The file stem is matched against an ordered list of regexes; the first
//! one that matches supplies fields through its named capture groups.
//! The parent directory name is always offered as the album title.
//!
//! ```text
//! /music/Unknown Artist/01-02 Song.flac
//!        ^^^^^^^^^^^^^^ ^^ ^^ ^^^^
//!        album_title    |  |  title
//!                    disc  track_num
//! ```

use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Guessed field name → raw captured text. Values are never type-coerced here.
pub type GuessedFields = BTreeMap<String, String>;

/// Key under which the parent directory name is reported.
pub const ALBUM_TITLE_KEY: &str = "album_title";

/// A compiled filename pattern.
#[derive(Debug, Clone)]
struct FilenamePattern {
    source: String,
    regex: Regex,
}

/// Guesses track and album fields from a file path.
///
/// Built once from the configured pattern list and shared by reference.
#[derive(Debug, Clone)]
pub struct PathGuesser {
    patterns: Vec<FilenamePattern>,
}

impl PathGuesser {
    /// Compile the patterns, keeping their order as priority.
    ///
    /// Patterns are anchored at the start of the filename. A pattern that
    /// fails to compile, or that names no capture group, is rejected.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Guess fields for `path`.
    ///
    /// Always yields `title` (the file stem) and `album_title` (the parent
    /// directory name); a matching pattern adds its captures on top.
    pub fn guess_fields(&self, path: &Path) -> GuessedFields {
        let filename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let album_dir = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut fields = GuessedFields::new();
        fields.insert("title".to_string(), filename.clone());
        fields.insert(ALBUM_TITLE_KEY.to_string(), album_dir);

        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(&filename) else {
                continue;
            };
            for name in pattern.regex.capture_names().flatten() {
                if let Some(m) = caps.name(name) {
                    fields.insert(name.to_string(), m.as_str().to_string());
                }
            }
            debug!(target: "guess", pattern = %pattern.source, "Filename matched pattern");
            break;
        }

        debug!(target: "guess", path = %path.display(), ?fields, "Fields guessed from path");
        fields
    }
}

fn compile(source: &str) -> Result<FilenamePattern> {
    let regex = Regex::new(&format!("^(?:{source})"))
        .map_err(|e| Error::pattern(source, e.to_string()))?;
    if regex.capture_names().flatten().next().is_none() {
        return Err(Error::pattern(source, "pattern has no named capture groups"));
    }
    Ok(FilenamePattern {
        source: source.to_string(),
        regex,
    })
}
