//! Output and error-reporting collaborators for the search engine.
use crate::error::DetectiveError;
use crate::request::{SearchRequest, DATE_FORMAT};
use crate::search::MatchReport;
use colored::*;
use log::debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Receives per-file failures. Implementations must not abort the run.
pub trait ErrorSink {
    fn file_error(&mut self, path: &Path, error: &DetectiveError);
}

/// Prints per-file failures to stderr, one line each.
#[derive(Debug, Default)]
pub struct ConsoleErrors {
    pub color: bool,
}

impl ErrorSink for ConsoleErrors {
    fn file_error(&mut self, path: &Path, error: &DetectiveError) {
        debug!("Skipping {}", path.display());
        let line = error.to_string();
        if self.color {
            eprintln!("{}", line.red());
        } else {
            eprintln!("{line}");
        }
    }
}

/// Keeps per-file failures in memory.
#[derive(Debug, Default)]
pub struct CollectedErrors {
    pub errors: Vec<(PathBuf, String)>,
}

impl ErrorSink for CollectedErrors {
    fn file_error(&mut self, path: &Path, error: &DetectiveError) {
        self.errors.push((path.to_path_buf(), error.to_string()));
    }
}

/// Receives match reports as they are produced, framed by `begin`/`finish`.
pub trait Reporter {
    fn begin(&mut self, request: &SearchRequest) -> io::Result<()>;
    fn report(&mut self, report: &MatchReport) -> io::Result<()>;
    fn finish(&mut self, elapsed: Duration) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FrameStyle {
    pub separator_char: char,
    pub separator_width: usize,
    pub show_timing: bool,
    pub color: bool,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            separator_char: '`',
            separator_width: 80,
            show_timing: true,
            color: false,
        }
    }
}

/// Plain-text reporter writing to any `Write`, normally stdout.
pub struct ConsoleReporter<W: Write> {
    out: W,
    style: FrameStyle,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, style: FrameStyle) -> Self {
        Self { out, style }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn separator(&mut self) -> io::Result<()> {
        let line = self
            .style
            .separator_char
            .to_string()
            .repeat(self.style.separator_width);
        writeln!(self.out, "{line}")
    }

    fn label(&self, text: &str) -> String {
        if self.style.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn begin(&mut self, request: &SearchRequest) -> io::Result<()> {
        self.separator()?;
        let label = self.label("Search Pattern:");
        writeln!(self.out, "{} '{}'", label, request.pattern())
    }

    fn report(&mut self, report: &MatchReport) -> io::Result<()> {
        match report {
            MatchReport::NameMatch { path } => {
                let shown = path.display().to_string();
                if self.style.color {
                    writeln!(self.out, "{}", shown.green())
                } else {
                    writeln!(self.out, "{shown}")
                }
            }
            MatchReport::ContentMatch {
                path,
                line_number,
                line_text,
            } => {
                let (p, l, c) = (self.label("Path"), self.label("Line:"), self.label("Content:"));
                writeln!(self.out, "{} {}", p, path.display())?;
                writeln!(self.out, "{l} {line_number}")?;
                let text = if self.style.color {
                    line_text.yellow().to_string()
                } else {
                    line_text.clone()
                };
                writeln!(self.out, "{c} {text}")
            }
            MatchReport::DateMatch { path, matched_date } => {
                let (d, p) = (self.label("Date creation"), self.label("Path:"));
                writeln!(self.out)?;
                writeln!(self.out, "{} {}", d, matched_date.format(DATE_FORMAT))?;
                writeln!(self.out, "{} {}", p, path.display())
            }
        }
    }

    fn finish(&mut self, elapsed: Duration) -> io::Result<()> {
        if self.style.show_timing {
            let label = self.label("Time:");
            writeln!(self.out, "{label} {elapsed:.2?}")?;
            writeln!(self.out)?;
        }
        self.separator()?;
        self.out.flush()
    }
}
