//! Filter evaluators. Each one is independent of the others and of traversal.
use crate::error::{DetectiveError, Result};
use crate::metadata::FileCandidate;
use crate::output::ErrorSink;
use crate::request::{DateFallback, DateRange, SizeBounds};
use chrono::{NaiveDate, NaiveDateTime};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A content hit. Line numbers are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub line_number: usize,
    pub text: String,
}

/// Zero on either side of `bounds` means unconstrained on that side.
pub fn size_within(bounds: SizeBounds, size: u64) -> bool {
    if bounds.max != 0 && size > bounds.max {
        return false;
    }
    if bounds.min != 0 && size < bounds.min {
        return false;
    }
    true
}

pub fn size_check(bounds: SizeBounds, candidate: &FileCandidate<'_>) -> Result<bool> {
    if bounds.is_unbounded() {
        return Ok(true);
    }
    Ok(size_within(bounds, candidate.size()?))
}

/// Case-sensitive substring test on the raw name bytes, so names that are not
/// valid UTF-8 only match where the pattern's bytes actually occur. An empty
/// pattern matches every name.
pub fn name_contains(pattern: &str, filename: &OsStr) -> bool {
    let needle = pattern.as_bytes();
    if needle.is_empty() {
        return true;
    }
    filename
        .as_encoded_bytes()
        .windows(needle.len())
        .any(|window| window == needle)
}

/// Scans `path` as UTF-8 text for lines containing `pattern`.
///
/// A file that cannot be opened or decoded is reported to `errors` and yields
/// no matches, including any found before the failure.
pub fn content_contains(pattern: &str, path: &Path, errors: &mut dyn ErrorSink) -> Vec<LineMatch> {
    match read_matching_lines(pattern, path) {
        Ok(matches) => matches,
        Err(e) => {
            errors.file_error(path, &e);
            Vec::new()
        }
    }
}

pub fn read_matching_lines(pattern: &str, path: &Path) -> Result<Vec<LineMatch>> {
    let file = File::open(path).map_err(|source| DetectiveError::FileProcessing {
        path: path.to_path_buf(),
        source,
    })?;
    scan_lines(pattern, BufReader::new(file)).map_err(|source| DetectiveError::FileProcessing {
        path: path.to_path_buf(),
        source,
    })
}

pub fn scan_lines<R: BufRead>(pattern: &str, reader: R) -> std::io::Result<Vec<LineMatch>> {
    let mut matches = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.contains(pattern) {
            matches.push(LineMatch {
                line_number,
                text: line,
            });
        }
    }
    Ok(matches)
}

/// Returns the matched creation date, if any.
///
/// A single-day range matches only that day. A two-date range matches
/// inclusively; with [`DateFallback::StartDay`] a failed range test is retried
/// against the start date alone.
pub fn date_in_range(
    range: DateRange,
    created: NaiveDateTime,
    fallback: DateFallback,
) -> Option<NaiveDate> {
    let day = created.date();
    if range.is_single_day() {
        return (day == range.start()).then_some(day);
    }
    if range.start() <= day && day <= range.end() {
        return Some(day);
    }
    match fallback {
        DateFallback::RangeOnly => None,
        DateFallback::StartDay => (day == range.start()).then_some(day),
    }
}
