use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "-- Detective, perform file searches. --", long_about = None)]
pub struct Cli {
    /// Base path for search
    pub path: PathBuf,

    /// Pattern to be searched
    pub pattern: String,

    /// Search filter: 1. Name, 2. Word included
    #[clap(short = 'f', value_name = "FILTER", num_args = 1.., value_parser = clap::value_parser!(u8).range(1..=2))]
    pub filters: Option<Vec<u8>>,

    /// Search type
    #[clap(short = 't', value_name = "TYPE", value_enum, default_value_t = SearchType::File)]
    pub search_type: SearchType,

    /// Search by creation date: YYYY-MM-DD or YYYY-MM-DD/YYYY-MM-DD
    #[clap(long, value_name = "DATERANGE")]
    pub daterange: Option<String>,

    /// Size in bytes of the searched files: MAX [MIN], 0 leaves a side open
    #[clap(short = 's', value_name = "SIZE", num_args = 1..=2)]
    pub size: Vec<u64>,

    /// After a failed date range test, also match files created on the start date
    #[clap(long, default_value_t = false)]
    pub legacy_date_fallback: bool,

    /// On a size mismatch, skip the rest of the files in that directory
    #[clap(long, default_value_t = false)]
    pub legacy_size_skip: bool,

    #[clap(long, default_value_t = false)]
    pub verbose: bool,

    /// Write log output to this file instead of stderr
    #[clap(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Configuration file (defaults to the usual config locations)
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the effective configuration to this file and exit
    #[clap(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,

    #[clap(long, default_value_t = false)]
    pub no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchType {
    #[default]
    File,
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchType::File => write!(f, "file"),
        }
    }
}
