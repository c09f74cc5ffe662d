//! Search request model: what to look for, where, and with which filters.
use crate::error::{DetectiveError, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const RANGE_DELIMITER: char = '/';

/// Filters selectable for a run. Size bounds are not a filter kind: they gate
/// whether any filter runs at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKind {
    NameContains,
    ContentContains,
    CreationDateInRange,
}

impl FilterKind {
    /// Maps a `-f` code to its filter. The date filter has no code; it is
    /// enabled by supplying a date range.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(FilterKind::NameContains),
            2 => Some(FilterKind::ContentContains),
            _ => None,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::NameContains => write!(f, "name"),
            FilterKind::ContentContains => write!(f, "content"),
            FilterKind::CreationDateInRange => write!(f, "creation-date"),
        }
    }
}

/// Byte size bounds. A zero on either side means "no constraint on that side",
/// so a true zero-byte maximum cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeBounds {
    pub min: u64,
    pub max: u64,
}

impl SizeBounds {
    pub fn new(min: u64, max: u64) -> Result<Self> {
        if min != 0 && max != 0 && min > max {
            return Err(DetectiveError::Config(format!(
                "minimum size {min} is larger than maximum size {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Builds bounds from the `-s` values: first is `max`, optional second is `min`.
    pub fn from_values(values: &[u64]) -> Result<Option<Self>> {
        match values {
            [] => Ok(None),
            [max] => Self::new(0, *max).map(Some),
            [max, min] => Self::new(*min, *max).map(Some),
            _ => Err(DetectiveError::Config(format!(
                "expected at most two size values (max, min), got {}",
                values.len()
            ))),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min == 0 && self.max == 0
    }
}

impl fmt::Display for SizeBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |v: u64| {
            if v == 0 {
                "*".to_string()
            } else {
                format!("{v}B")
            }
        };
        write!(f, "{}..{}", side(self.min), side(self.max))
    }
}

/// Inclusive calendar-date range. A single date is stored as `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DetectiveError::Config(format!(
                "date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Parses `YYYY-MM-DD` or `YYYY-MM-DD/YYYY-MM-DD`.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens: Vec<&str> = input.split(RANGE_DELIMITER).map(str::trim).collect();
        match tokens.as_slice() {
            [day] => Ok(Self::single(parse_date(day)?)),
            [start, end] => Self::new(parse_date(start)?, parse_date(end)?),
            _ => Err(DetectiveError::Config(format!(
                "malformed date range '{input}' (expected YYYY-MM-DD or YYYY-MM-DD/YYYY-MM-DD)"
            ))),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.start.format(DATE_FORMAT))
        } else {
            write!(
                f,
                "{}{RANGE_DELIMITER}{}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            )
        }
    }
}

fn parse_date(token: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(token, DATE_FORMAT).map_err(|source| DetectiveError::InvalidDate {
        input: token.to_string(),
        source,
    })
}

/// What a size mismatch skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeSkip {
    /// Skip only the offending file.
    #[default]
    File,
    /// Skip the offending file and every later file listed in the same
    /// directory. Subdirectories are still visited.
    Directory,
}

/// What happens after a two-date range test fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFallback {
    #[default]
    RangeOnly,
    /// Re-check for exact equality with the range's start date.
    StartDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchPolicy {
    pub size_skip: SizeSkip,
    pub date_fallback: DateFallback,
}

/// Immutable configuration for one search run.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    base_path: PathBuf,
    pattern: String,
    filters: BTreeSet<FilterKind>,
    size_bounds: Option<SizeBounds>,
    date_range: Option<DateRange>,
    policy: SearchPolicy,
}

impl SearchRequest {
    pub fn builder(base_path: impl Into<PathBuf>, pattern: impl Into<String>) -> SearchRequestBuilder {
        SearchRequestBuilder::new(base_path, pattern)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn filters(&self) -> &BTreeSet<FilterKind> {
        &self.filters
    }

    pub fn is_enabled(&self, kind: FilterKind) -> bool {
        self.filters.contains(&kind)
    }

    pub fn size_bounds(&self) -> Option<SizeBounds> {
        self.size_bounds
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    pub fn policy(&self) -> SearchPolicy {
        self.policy
    }
}

pub struct SearchRequestBuilder {
    base_path: PathBuf,
    pattern: String,
    filters: BTreeSet<FilterKind>,
    size_bounds: Option<SizeBounds>,
    date_range: Option<DateRange>,
    policy: SearchPolicy,
}

impl SearchRequestBuilder {
    pub fn new(base_path: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            pattern: pattern.into(),
            filters: BTreeSet::new(),
            size_bounds: None,
            date_range: None,
            policy: SearchPolicy::default(),
        }
    }

    pub fn filter(mut self, kind: FilterKind) -> Self {
        self.filters.insert(kind);
        self
    }

    pub fn filters<I: IntoIterator<Item = FilterKind>>(mut self, kinds: I) -> Self {
        self.filters.extend(kinds);
        self
    }

    pub fn size_bounds(mut self, bounds: Option<SizeBounds>) -> Self {
        self.size_bounds = bounds;
        self
    }

    /// Supplying a range enables the creation-date filter.
    pub fn date_range(mut self, range: Option<DateRange>) -> Self {
        if range.is_some() {
            self.filters.insert(FilterKind::CreationDateInRange);
        }
        self.date_range = range;
        self
    }

    pub fn policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<SearchRequest> {
        if !self.base_path.exists() {
            return Err(DetectiveError::Config(format!(
                "base path '{}' does not exist",
                self.base_path.display()
            )));
        }
        if !self.base_path.is_dir() {
            return Err(DetectiveError::Config(format!(
                "base path '{}' is not a directory",
                self.base_path.display()
            )));
        }
        if let Err(e) = fs::read_dir(&self.base_path) {
            return Err(DetectiveError::Config(format!(
                "base path '{}' is not readable: {e}",
                self.base_path.display()
            )));
        }
        if self.filters.contains(&FilterKind::CreationDateInRange) && self.date_range.is_none() {
            return Err(DetectiveError::Config(
                "creation-date filter enabled without a date range".to_string(),
            ));
        }

        Ok(SearchRequest {
            base_path: self.base_path,
            pattern: self.pattern,
            filters: self.filters,
            size_bounds: self.size_bounds,
            date_range: self.date_range,
            policy: self.policy,
        })
    }
}
