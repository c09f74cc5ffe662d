//! Traversal engine: walks the base directory and runs the enabled filters on
//! every file, producing match reports as it goes.
use crate::cli::SearchType;
use crate::error::{DetectiveError, Result};
use crate::filters::{content_contains, date_in_range, name_contains, size_check};
use crate::metadata::{FileCandidate, MetadataSource, OsMetadata};
use crate::output::{ErrorSink, Reporter};
use crate::request::{FilterKind, SearchRequest, SizeSkip};
use crate::walker::{is_searchable_file, walk_dir};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One unit of search output, tied to the filter that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchReport {
    NameMatch {
        path: PathBuf,
    },
    ContentMatch {
        path: PathBuf,
        line_number: usize,
        line_text: String,
    },
    DateMatch {
        path: PathBuf,
        matched_date: NaiveDate,
    },
}

impl MatchReport {
    pub fn path(&self) -> &Path {
        match self {
            MatchReport::NameMatch { path }
            | MatchReport::ContentMatch { path, .. }
            | MatchReport::DateMatch { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub files_visited: usize,
    pub files_skipped_by_size: usize,
    pub file_errors: usize,
    pub reports: usize,
}

/// The available search kinds.
pub enum Searcher {
    File(FileSearcher),
}

impl From<SearchType> for Searcher {
    fn from(kind: SearchType) -> Self {
        match kind {
            SearchType::File => Searcher::File(FileSearcher::new(OsMetadata)),
        }
    }
}

impl Searcher {
    pub fn search(
        &self,
        request: &SearchRequest,
        reporter: &mut dyn Reporter,
        errors: &mut dyn ErrorSink,
    ) -> Result<SearchStats> {
        match self {
            Searcher::File(searcher) => searcher.run(request, reporter, errors),
        }
    }
}

/// Searches regular files under a base directory.
#[derive(Debug)]
pub struct FileSearcher<M: MetadataSource = OsMetadata> {
    metadata: M,
}

impl<M: MetadataSource> FileSearcher<M> {
    pub fn new(metadata: M) -> Self {
        Self { metadata }
    }

    /// Lazily walks the tree. Per-file failures go to `errors`; a traversal
    /// failure is yielded once as `Err` and ends the sequence.
    pub fn matches<'a>(
        &'a self,
        request: &'a SearchRequest,
        errors: &'a mut dyn ErrorSink,
    ) -> Matches<'a> {
        Matches {
            request,
            metadata: &self.metadata,
            errors,
            walker: walk_dir(request.base_path()),
            pending: VecDeque::new(),
            skipped_dirs: HashSet::new(),
            stats: SearchStats::default(),
            done: false,
        }
    }

    /// Streams every report to `reporter`, framed by `begin` and `finish`.
    /// The footer is written even when the traversal fails.
    pub fn run(
        &self,
        request: &SearchRequest,
        reporter: &mut dyn Reporter,
        errors: &mut dyn ErrorSink,
    ) -> Result<SearchStats> {
        let start_time = Instant::now();
        info!(
            "Searching '{}' for '{}' (filters: {:?}, size: {:?}, dates: {:?})",
            request.base_path().display(),
            request.pattern(),
            request.filters(),
            request.size_bounds(),
            request.date_range()
        );

        reporter.begin(request)?;
        let mut matches = self.matches(request, errors);
        let outcome = matches
            .by_ref()
            .try_for_each(|report| reporter.report(&report?).map_err(DetectiveError::from));
        let stats = matches.stats();
        let elapsed = start_time.elapsed();
        reporter.finish(elapsed)?;
        outcome?;

        info!(
            "Search finished in {:.2?}: {} files, {} skipped by size, {} errors, {} reports",
            elapsed, stats.files_visited, stats.files_skipped_by_size, stats.file_errors, stats.reports
        );
        Ok(stats)
    }
}

pub struct Matches<'a> {
    request: &'a SearchRequest,
    metadata: &'a dyn MetadataSource,
    errors: &'a mut dyn ErrorSink,
    walker: walkdir::IntoIter,
    pending: VecDeque<MatchReport>,
    skipped_dirs: HashSet<PathBuf>,
    stats: SearchStats,
    done: bool,
}

impl Matches<'_> {
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    fn evaluate(&mut self, path: PathBuf) {
        let request = self.request;
        self.stats.files_visited += 1;
        if request.filters().is_empty() {
            return;
        }

        let candidate = FileCandidate::new(path, self.metadata);

        if let Some(bounds) = request.size_bounds() {
            if self.in_skipped_directory(candidate.path()) {
                debug!("Skipping {} (directory abandoned)", candidate.path().display());
                self.stats.files_skipped_by_size += 1;
                return;
            }
            match size_check(bounds, &candidate) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Skipping {} (outside size bounds {})", candidate.path().display(), bounds);
                    self.stats.files_skipped_by_size += 1;
                    if request.policy().size_skip == SizeSkip::Directory {
                        if let Some(parent) = candidate.path().parent() {
                            self.skipped_dirs.insert(parent.to_path_buf());
                        }
                    }
                    return;
                }
                Err(e) => {
                    self.report_error(candidate.path(), &e);
                    return;
                }
            }
        }

        if request.is_enabled(FilterKind::NameContains)
            && name_contains(request.pattern(), candidate.name())
        {
            self.pending.push_back(MatchReport::NameMatch {
                path: candidate.path().to_path_buf(),
            });
        }

        if request.is_enabled(FilterKind::ContentContains) {
            let mut sink = CountingSink {
                inner: &mut *self.errors,
                count: 0,
            };
            let lines = content_contains(request.pattern(), candidate.path(), &mut sink);
            self.stats.file_errors += sink.count;
            self.pending
                .extend(lines.into_iter().map(|line| MatchReport::ContentMatch {
                    path: candidate.path().to_path_buf(),
                    line_number: line.line_number,
                    line_text: line.text,
                }));
        }

        if let Some(range) = request.date_range() {
            if request.is_enabled(FilterKind::CreationDateInRange) {
                match candidate.created() {
                    Ok(created) => {
                        if let Some(matched_date) =
                            date_in_range(range, created, request.policy().date_fallback)
                        {
                            self.pending.push_back(MatchReport::DateMatch {
                                path: candidate.into_path(),
                                matched_date,
                            });
                        }
                    }
                    Err(e) => self.report_error(candidate.path(), &e),
                }
            }
        }
    }

    fn in_skipped_directory(&self, path: &Path) -> bool {
        path.parent()
            .is_some_and(|parent| self.skipped_dirs.contains(parent))
    }

    fn report_error(&mut self, path: &Path, error: &DetectiveError) {
        self.stats.file_errors += 1;
        self.errors.file_error(path, error);
    }
}

impl Iterator for Matches<'_> {
    type Item = Result<MatchReport>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(report) = self.pending.pop_front() {
                self.stats.reports += 1;
                return Some(Ok(report));
            }
            if self.done {
                return None;
            }
            match self.walker.next() {
                None => self.done = true,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(DetectiveError::Walkdir(e)));
                }
                Some(Ok(entry)) => {
                    if is_searchable_file(&entry) {
                        self.evaluate(entry.into_path());
                    }
                }
            }
        }
    }
}

struct CountingSink<'s> {
    inner: &'s mut dyn ErrorSink,
    count: usize,
}

impl ErrorSink for CountingSink<'_> {
    fn file_error(&mut self, path: &Path, error: &DetectiveError) {
        self.count += 1;
        self.inner.file_error(path, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{CollectedErrors, ConsoleReporter, FrameStyle};
    use crate::request::{DateRange, SearchPolicy, SizeBounds};
    use chrono::NaiveDateTime;
    use std::collections::{BTreeSet, HashMap};
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    /// Real sizes, creation dates looked up by file name.
    struct FixedDates {
        dates: HashMap<String, NaiveDateTime>,
    }

    impl FixedDates {
        fn new(entries: &[(&str, &str)]) -> Self {
            let dates = entries
                .iter()
                .map(|(name, date)| {
                    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
                    (name.to_string(), day.and_hms_opt(14, 5, 0).unwrap())
                })
                .collect();
            Self { dates }
        }
    }

    impl MetadataSource for FixedDates {
        fn size(&self, path: &Path) -> io::Result<u64> {
            OsMetadata.size(path)
        }

        fn created(&self, path: &Path) -> io::Result<NaiveDateTime> {
            let name = path.file_name().unwrap().to_string_lossy();
            self.dates
                .get(name.as_ref())
                .copied()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no date"))
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn collect<M: MetadataSource>(
        searcher: &FileSearcher<M>,
        request: &SearchRequest,
    ) -> (Vec<MatchReport>, CollectedErrors) {
        let mut errors = CollectedErrors::default();
        let reports = searcher
            .matches(request, &mut errors)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        (reports, errors)
    }

    fn reported_paths(reports: &[MatchReport]) -> BTreeSet<PathBuf> {
        reports.iter().map(|r| r.path().to_path_buf()).collect()
    }

    #[test]
    fn size_gate_runs_before_other_filters() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a.txt", "hello\n1234");
        write(temp.path(), "b.log", &"z".repeat(500));
        write(temp.path(), "c.txt", &format!("hello{}", "x".repeat(9995)));

        let request = SearchRequest::builder(temp.path(), "hello")
            .filters([FilterKind::NameContains, FilterKind::ContentContains])
            .size_bounds(Some(SizeBounds { min: 0, max: 100 }))
            .build()
            .unwrap();
        let (reports, errors) = collect(&FileSearcher::new(OsMetadata), &request);

        assert!(errors.errors.is_empty());
        assert_eq!(
            reports,
            vec![MatchReport::ContentMatch {
                path: a,
                line_number: 0,
                line_text: "hello".to_string(),
            }]
        );
    }

    #[test]
    fn name_matches_are_reported_once_per_file_in_bounds() {
        let temp = TempDir::new().unwrap();
        let small = write(temp.path(), "report_small.txt", "tiny");
        let nested = write(temp.path(), "sub/deeper/report_nested.md", "also tiny");
        write(temp.path(), "report_huge.txt", &"x".repeat(4096));
        write(temp.path(), "other.txt", "tiny");

        let request = SearchRequest::builder(temp.path(), "report")
            .filter(FilterKind::NameContains)
            .size_bounds(Some(SizeBounds { min: 1, max: 1024 }))
            .build()
            .unwrap();
        let (reports, _) = collect(&FileSearcher::new(OsMetadata), &request);

        assert_eq!(reports.len(), 2);
        assert_eq!(reported_paths(&reports), BTreeSet::from([small, nested]));
    }

    #[test]
    fn zero_bounds_let_everything_through() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "empty_match", "");
        write(temp.path(), "big_match", &"x".repeat(100_000));

        let request = SearchRequest::builder(temp.path(), "match")
            .filter(FilterKind::NameContains)
            .size_bounds(Some(SizeBounds::default()))
            .build()
            .unwrap();
        let (reports, _) = collect(&FileSearcher::new(OsMetadata), &request);
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn filters_are_independent() {
        let temp = TempDir::new().unwrap();
        let both = write(temp.path(), "hello.txt", "first\nhello there\nhello again\n");

        let request = SearchRequest::builder(temp.path(), "hello")
            .filters([FilterKind::NameContains, FilterKind::ContentContains])
            .build()
            .unwrap();
        let (reports, _) = collect(&FileSearcher::new(OsMetadata), &request);

        assert_eq!(
            reports,
            vec![
                MatchReport::NameMatch { path: both.clone() },
                MatchReport::ContentMatch {
                    path: both.clone(),
                    line_number: 1,
                    line_text: "hello there".to_string(),
                },
                MatchReport::ContentMatch {
                    path: both,
                    line_number: 2,
                    line_text: "hello again".to_string(),
                },
            ]
        );
    }

    #[test]
    fn no_filters_match_nothing() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "hello.txt", "hello");

        let request = SearchRequest::builder(temp.path(), "hello").build().unwrap();
        let searcher = FileSearcher::new(OsMetadata);
        let mut errors = CollectedErrors::default();
        let mut matches = searcher.matches(&request, &mut errors);
        assert!(matches.next().is_none());
        assert_eq!(matches.stats().files_visited, 1);
    }

    #[test]
    fn unreadable_file_does_not_stop_traversal() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("a_binary.dat");
        fs::write(&bad, [0xffu8, 0xfe, 0xfd, b'\n']).unwrap();
        let good = write(temp.path(), "b_text.txt", "needle\n");

        let request = SearchRequest::builder(temp.path(), "needle")
            .filter(FilterKind::ContentContains)
            .build()
            .unwrap();
        let (reports, errors) = collect(&FileSearcher::new(OsMetadata), &request);

        assert_eq!(reported_paths(&reports), BTreeSet::from([good]));
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].0, bad);
    }

    #[test]
    fn date_range_reports_matching_creation_dates() {
        let temp = TempDir::new().unwrap();
        let mid = write(temp.path(), "mid.txt", "");
        write(temp.path(), "late.txt", "");
        write(temp.path(), "early.txt", "");
        let dates = FixedDates::new(&[
            ("mid.txt", "2024-01-15"),
            ("late.txt", "2024-02-01"),
            ("early.txt", "2023-12-31"),
        ]);

        let request = SearchRequest::builder(temp.path(), "")
            .date_range(Some(DateRange::parse("2024-01-01/2024-01-31").unwrap()))
            .build()
            .unwrap();
        let (reports, errors) = collect(&FileSearcher::new(dates), &request);

        assert!(errors.errors.is_empty());
        assert_eq!(
            reports,
            vec![MatchReport::DateMatch {
                path: mid,
                matched_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            }]
        );
    }

    #[test]
    fn single_date_matches_that_day_only() {
        let temp = TempDir::new().unwrap();
        let hit = write(temp.path(), "hit.txt", "");
        write(temp.path(), "miss.txt", "");
        let dates = FixedDates::new(&[("hit.txt", "2024-03-10"), ("miss.txt", "2024-03-11")]);

        let request = SearchRequest::builder(temp.path(), "")
            .date_range(Some(DateRange::parse("2024-03-10").unwrap()))
            .build()
            .unwrap();
        let (reports, _) = collect(&FileSearcher::new(dates), &request);
        assert_eq!(reported_paths(&reports), BTreeSet::from([hit]));
    }

    #[test]
    fn missing_creation_date_is_a_per_file_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "undated.txt", "");
        let dated = write(temp.path(), "dated.txt", "");
        let dates = FixedDates::new(&[("dated.txt", "2024-03-10")]);

        let request = SearchRequest::builder(temp.path(), "")
            .date_range(Some(DateRange::parse("2024-03-10").unwrap()))
            .build()
            .unwrap();
        let (reports, errors) = collect(&FileSearcher::new(dates), &request);
        assert_eq!(reported_paths(&reports), BTreeSet::from([dated]));
        assert_eq!(errors.errors.len(), 1);
    }

    /// Size lookups fail for one file name; everything else is read from disk.
    struct BrokenSize {
        broken: &'static str,
    }

    impl MetadataSource for BrokenSize {
        fn size(&self, path: &Path) -> io::Result<u64> {
            if path.file_name().is_some_and(|name| name == self.broken) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "vanished mid-scan"));
            }
            OsMetadata.size(path)
        }

        fn created(&self, path: &Path) -> io::Result<NaiveDateTime> {
            OsMetadata.created(path)
        }
    }

    #[test]
    fn failed_size_lookup_skips_only_that_file() {
        let temp = TempDir::new().unwrap();
        let broken = write(temp.path(), "a_log.txt", "log\n");
        let sibling = write(temp.path(), "b_log.txt", "log\n");

        let request = SearchRequest::builder(temp.path(), "log")
            .filters([FilterKind::NameContains, FilterKind::ContentContains])
            .size_bounds(Some(SizeBounds { min: 0, max: 100 }))
            .build()
            .unwrap();
        let searcher = FileSearcher::new(BrokenSize {
            broken: "a_log.txt",
        });
        let mut errors = CollectedErrors::default();
        let mut matches = searcher.matches(&request, &mut errors);
        let reports = matches.by_ref().collect::<Result<Vec<_>>>().unwrap();
        let stats = matches.stats();

        assert_eq!(stats.files_visited, 2);
        assert_eq!(stats.file_errors, 1);
        assert!(reports.iter().all(|r| r.path() != broken));
        assert_eq!(
            reports,
            vec![
                MatchReport::NameMatch {
                    path: sibling.clone(),
                },
                MatchReport::ContentMatch {
                    path: sibling,
                    line_number: 0,
                    line_text: "log".to_string(),
                },
            ]
        );
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].0, broken);
        assert!(errors.errors[0].1.contains("vanished mid-scan"));
    }

    // Behaviour choice: a size mismatch skips one file unless the
    // directory-level early exit is requested.
    #[test]
    fn size_mismatch_skips_only_that_file_by_default() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a_big.txt", &"x".repeat(200));
        let small = write(temp.path(), "b_small.txt", "x");

        let request = SearchRequest::builder(temp.path(), "txt")
            .filter(FilterKind::NameContains)
            .size_bounds(Some(SizeBounds { min: 0, max: 100 }))
            .build()
            .unwrap();
        let (reports, _) = collect(&FileSearcher::new(OsMetadata), &request);
        assert_eq!(reported_paths(&reports), BTreeSet::from([small]));
    }

    #[test]
    fn directory_skip_abandons_remaining_files_of_that_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a_big.txt", &"x".repeat(200));
        write(temp.path(), "b_small.txt", "x");
        let nested = write(temp.path(), "c_dir/d_small.txt", "x");
        write(temp.path(), "e_small.txt", "x");

        let request = SearchRequest::builder(temp.path(), "txt")
            .filter(FilterKind::NameContains)
            .size_bounds(Some(SizeBounds { min: 0, max: 100 }))
            .policy(SearchPolicy {
                size_skip: SizeSkip::Directory,
                ..SearchPolicy::default()
            })
            .build()
            .unwrap();
        let searcher = FileSearcher::new(OsMetadata);
        let mut errors = CollectedErrors::default();
        let mut matches = searcher.matches(&request, &mut errors);
        let reports = matches.by_ref().collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(reported_paths(&reports), BTreeSet::from([nested]));
        assert_eq!(matches.stats().files_skipped_by_size, 3);
    }

    #[test]
    fn repeated_runs_agree() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "one.txt", "alpha\nbeta\n");
        write(temp.path(), "sub/two_alpha.txt", "gamma\nalpha\n");

        let request = SearchRequest::builder(temp.path(), "alpha")
            .filters([FilterKind::NameContains, FilterKind::ContentContains])
            .build()
            .unwrap();
        let searcher = FileSearcher::new(OsMetadata);
        let (first, _) = collect(&searcher, &request);
        let (second, _) = collect(&searcher, &request);

        let first: BTreeSet<_> = first.into_iter().collect();
        let second: BTreeSet<_> = second.into_iter().collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn searcher_frames_output_and_counts() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "hello.txt", "hello\n");

        let request = SearchRequest::builder(temp.path(), "hello")
            .filters([FilterKind::NameContains, FilterKind::ContentContains])
            .build()
            .unwrap();
        let mut reporter = ConsoleReporter::new(Vec::new(), FrameStyle::default());
        let mut errors = CollectedErrors::default();
        let stats = Searcher::from(SearchType::File)
            .search(&request, &mut reporter, &mut errors)
            .unwrap();

        assert_eq!(stats.files_visited, 1);
        assert_eq!(stats.reports, 2);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.starts_with(&"`".repeat(80)));
        assert!(text.contains("Search Pattern: 'hello'"));
        assert!(text.contains("Line: 0"));
        assert!(text.trim_end().ends_with(&"`".repeat(80)));
    }

    #[test]
    fn vanished_base_path_is_fatal_but_footer_is_written() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        fs::create_dir(&base).unwrap();
        let request = SearchRequest::builder(&base, "x")
            .filter(FilterKind::NameContains)
            .build()
            .unwrap();
        fs::remove_dir(&base).unwrap();

        let mut reporter = ConsoleReporter::new(Vec::new(), FrameStyle::default());
        let mut errors = CollectedErrors::default();
        let err = FileSearcher::new(OsMetadata)
            .run(&request, &mut reporter, &mut errors)
            .unwrap_err();
        assert!(err.is_fatal());

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("Time:"));
    }
}
