//! File metadata capability and per-file candidates.
use crate::error::{DetectiveError, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use std::cell::OnceCell;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Source of the metadata the filters need. The engine only ever asks for
/// these two values, so tests can substitute a fixed table.
pub trait MetadataSource {
    fn size(&self, path: &Path) -> io::Result<u64>;

    /// Creation timestamp in local wall-clock time.
    fn created(&self, path: &Path) -> io::Result<NaiveDateTime>;
}

/// Reads metadata from the operating system. On Unix the status-change time
/// (`st_ctime`) stands in for creation time.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsMetadata;

impl MetadataSource for OsMetadata {
    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    #[cfg(unix)]
    fn created(&self, path: &Path) -> io::Result<NaiveDateTime> {
        use std::os::unix::fs::MetadataExt;

        let metadata = fs::metadata(path)?;
        let stamp = DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
            .ok_or_else(|| io::Error::other("status-change time out of range"))?;
        Ok(stamp.with_timezone(&Local).naive_local())
    }

    #[cfg(not(unix))]
    fn created(&self, path: &Path) -> io::Result<NaiveDateTime> {
        let metadata = fs::metadata(path)?;
        let time = metadata.created().or_else(|_| metadata.modified())?;
        Ok(DateTime::<Local>::from(time).naive_local())
    }
}

/// A file visited during traversal. Metadata is fetched on first use and
/// cached for the remaining filters.
pub struct FileCandidate<'a> {
    path: PathBuf,
    name: OsString,
    source: &'a dyn MetadataSource,
    size: OnceCell<u64>,
    created: OnceCell<NaiveDateTime>,
}

impl<'a> FileCandidate<'a> {
    pub fn new(path: PathBuf, source: &'a dyn MetadataSource) -> Self {
        let name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        Self {
            path,
            name,
            source,
            size: OnceCell::new(),
            created: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub fn size(&self) -> Result<u64> {
        if let Some(size) = self.size.get() {
            return Ok(*size);
        }
        let size = self
            .source
            .size(&self.path)
            .map_err(|source| self.metadata_error(source))?;
        Ok(*self.size.get_or_init(|| size))
    }

    pub fn created(&self) -> Result<NaiveDateTime> {
        if let Some(created) = self.created.get() {
            return Ok(*created);
        }
        let created = self
            .source
            .created(&self.path)
            .map_err(|source| self.metadata_error(source))?;
        Ok(*self.created.get_or_init(|| created))
    }

    fn metadata_error(&self, source: io::Error) -> DetectiveError {
        DetectiveError::Metadata {
            path: self.path.clone(),
            source,
        }
    }
}
