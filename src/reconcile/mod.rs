//! Filling blank fields from path guesses and placeholders.
//!
//! Runs once per track while its tags are read. For every field named in the
//! placeholder tables:
//! 1. a value that came from the file's tags is left alone,
//! 2. otherwise a path guess is used, converted to the field's type,
//! 3. otherwise the placeholder is stored.
//!
//! Album fields look their guesses up under `album_<name>`. After all fields
//! are settled, a placeholder track number is replaced by a unique negative
//! number for its album (see [`TrackNumberAllocator`]).

mod disambiguate;

pub use disambiguate::TrackNumberAllocator;

use chrono::NaiveDate;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result, ResultExt};
use crate::guess::{GuessedFields, PathGuesser};
use crate::model::{Field, FieldSet, FieldValue, Provenance};
use crate::policy::{self, NullFieldPolicy, NullFieldTable};

/// Applies the placeholder tables and optional path guessing to field sets.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    policy: &'a NullFieldPolicy,
    guesser: Option<&'a PathGuesser>,
}

impl<'a> Reconciler<'a> {
    /// `guesser` is `None` when guessing is disabled; blanks then go
    /// straight to placeholders.
    pub fn new(policy: &'a NullFieldPolicy, guesser: Option<&'a PathGuesser>) -> Self {
        Self { policy, guesser }
    }

    /// Fill every blank policy field in `track` and `album`.
    ///
    /// Fails if a guessed value cannot be converted to its field's type.
    pub fn reconcile(
        &self,
        path: &Path,
        track: &mut FieldSet,
        album: &mut FieldSet,
        allocator: &mut TrackNumberAllocator,
    ) -> Result<()> {
        debug!(target: "reconcile", path = %path.display(), "Reconciling fields");

        let guessed = self
            .guesser
            .map(|g| g.guess_fields(path))
            .unwrap_or_default();

        fill_blanks(track, self.policy.track(), &guessed, "")
            .with_context(format!("guessing track fields for {}", path.display()))?;
        fill_blanks(album, self.policy.album(), &guessed, "album_")
            .with_context(format!("guessing album fields for {}", path.display()))?;

        if track.get(policy::TRACK_NUM).is_some_and(Field::is_placeholder) {
            let album_title = album
                .value(policy::TITLE)
                .map(ToString::to_string)
                .unwrap_or_default();
            let track_num = allocator.next_placeholder(&album_title);
            track.set(
                policy::TRACK_NUM,
                Field::new(track_num, Provenance::Placeholder),
            );
            debug!(target: "reconcile", album = %album_title, track_num, "Assigned placeholder track_num");
        }

        Ok(())
    }
}

/// Fill every blank policy field from `guessed`, else from its placeholder.
///
/// A guess that coerces to a blank value (a "00" track number) is treated as
/// no guess, so the field still ends up non-blank and numberless tracks get
/// disambiguated.
fn fill_blanks(
    fields: &mut FieldSet,
    table: &NullFieldTable,
    guessed: &GuessedFields,
    guess_prefix: &str,
) -> Result<()> {
    for (name, placeholder) in table.iter() {
        if !fields.is_blank(name) {
            debug!(target: "reconcile", field = name, "Keeping tag value");
            continue;
        }

        let key = format!("{guess_prefix}{name}");
        let guess = match guessed.get(&key) {
            Some(raw) => Some(coerce(name, raw, placeholder)?).filter(|v| !v.is_blank()),
            None => None,
        };

        match guess {
            Some(value) => {
                debug!(target: "reconcile", field = %key, %value, "Setting from file name");
                fields.set(name, Field::new(value, Provenance::Guessed));
            }
            None => {
                debug!(target: "reconcile", field = %key, value = %placeholder, "No guess, using placeholder");
                fields.set(name, Field::new(placeholder.clone(), Provenance::Placeholder));
            }
        }
    }
    Ok(())
}

/// Convert a raw guess to the type of the field's placeholder.
fn coerce(field: &str, raw: &str, like: &FieldValue) -> Result<FieldValue> {
    match like {
        FieldValue::Text(_) => Ok(FieldValue::Text(raw.to_string())),
        FieldValue::Int(_) => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| Error::coerce(field, raw, like.kind())),
        FieldValue::Date(_) => parse_date(raw.trim())
            .map(FieldValue::Date)
            .ok_or_else(|| Error::coerce(field, raw, like.kind())),
    }
}

/// `YYYY-MM-DD`, or a bare year meaning January 1st.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        raw.parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    })
}
