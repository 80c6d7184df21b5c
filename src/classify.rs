//! Capture-date classification
//!
//! A record is dated by its `DateTimeOriginal` tag, falling back to
//! `CreateDate`. Values must match `YYYY:MM:DD HH:MM:SS` exactly; anything
//! else degrades to "no date" with a warning, never an error.

use crate::types::ImageRecord;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Tags consulted for the capture date, in priority order
pub const DATE_TAGS: [&str; 2] = ["DateTimeOriginal", "CreateDate"];

/// chrono format of exiftool's native date strings
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Zero-padded year-month bucket format
const BUCKET_FORMAT: &str = "%Y-%m";

#[allow(clippy::expect_used)]
static EXIF_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}:\d{2}:\d{2} \d{2}:\d{2}:\d{2}$").expect("date pattern is valid")
});

/// Result of inspecting a record's date tags
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// A valid capture date was found
    Dated(NaiveDateTime),
    /// No non-blank date tag is present
    Missing,
    /// The first non-blank date tag does not hold a valid date
    Invalid {
        /// Name of the offending tag
        tag: String,
        /// The value that failed to parse
        value: String,
    },
}

impl Classification {
    /// The capture date, if any
    pub fn date(&self) -> Option<NaiveDateTime> {
        match self {
            Classification::Dated(date) => Some(*date),
            _ => None,
        }
    }
}

/// Inspect a record without logging
pub fn evaluate(record: &ImageRecord) -> Classification {
    let Some(tag) = DATE_TAGS
        .iter()
        .filter_map(|name| record.tag(name))
        .find(|tag| !tag.value.trim().is_empty())
    else {
        return Classification::Missing;
    };

    match parse_exif_date(&tag.value) {
        Some(date) => Classification::Dated(date),
        None => Classification::Invalid {
            tag: tag.name.clone(),
            value: tag.value.clone(),
        },
    }
}

/// Capture date of a record; an unparseable date is logged and treated as none
pub fn classify(record: &ImageRecord) -> Option<NaiveDateTime> {
    match evaluate(record) {
        Classification::Dated(date) => Some(date),
        Classification::Missing => None,
        Classification::Invalid { tag, value } => {
            warn!(
                source = ?record.source_path,
                tag = %tag,
                value = %value,
                "unrecognized date format, image will be unsorted"
            );
            None
        }
    }
}

/// Classify every record in place, returning how many received a date
pub fn classify_all(records: &mut [ImageRecord]) -> usize {
    let mut dated = 0;
    for record in records.iter_mut() {
        record.classified_date = classify(record);
        if record.classified_date.is_some() {
            dated += 1;
        }
    }
    dated
}

/// Parse `YYYY:MM:DD HH:MM:SS`, requiring zero padding and a real calendar date
pub fn parse_exif_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if !EXIF_DATE_PATTERN.is_match(value) {
        return None;
    }
    NaiveDateTime::parse_from_str(value, EXIF_DATE_FORMAT).ok()
}

/// Bucket directory name for a capture date, e.g. `2020-05`
pub fn bucket_name(date: &NaiveDateTime) -> String {
    date.format(BUCKET_FORMAT).to_string()
}
