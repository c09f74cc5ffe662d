pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod metadata;
pub mod output;
pub mod request;
pub mod search;
pub mod walker;

use crate::config::Config;
pub use crate::error::{DetectiveError, Result};
pub use clap::Parser;
pub use cli::{Cli, SearchType};
pub use metadata::{FileCandidate, MetadataSource, OsMetadata};
pub use output::{CollectedErrors, ConsoleErrors, ConsoleReporter, ErrorSink, FrameStyle, Reporter};
pub use request::{
    DateFallback, DateRange, FilterKind, SearchPolicy, SearchRequest, SizeBounds, SizeSkip,
};
pub use search::{FileSearcher, MatchReport, Matches, SearchStats, Searcher};

/// Maps parsed arguments, with `config` supplying the defaults, to a
/// validated request.
pub fn request_from_cli(cli: &Cli, config: &Config) -> Result<SearchRequest> {
    let codes = cli
        .filters
        .as_deref()
        .unwrap_or(&config.search.default_filters);
    let filters = codes
        .iter()
        .map(|code| {
            FilterKind::from_code(*code)
                .ok_or_else(|| DetectiveError::Config(format!("unknown filter code {code}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let date_range = cli.daterange.as_deref().map(DateRange::parse).transpose()?;
    let size_bounds = SizeBounds::from_values(&cli.size)?;

    let mut policy = config.compat.policy();
    if cli.legacy_size_skip {
        policy.size_skip = SizeSkip::Directory;
    }
    if cli.legacy_date_fallback {
        policy.date_fallback = DateFallback::StartDay;
    }

    SearchRequest::builder(&cli.path, cli.pattern.as_str())
        .filters(filters)
        .size_bounds(size_bounds)
        .date_range(date_range)
        .policy(policy)
        .build()
}

pub fn frame_style(config: &Config, color: bool) -> FrameStyle {
    FrameStyle {
        separator_char: config.display.separator_char,
        separator_width: config.display.separator_width,
        show_timing: config.display.show_timing,
        color,
    }
}
