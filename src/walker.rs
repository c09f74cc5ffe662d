use std::path::Path;
use walkdir::WalkDir;

/// Depth-first walk of everything under `path`, entries of each directory in
/// file-name order. Symlinked directories are not descended into.
pub fn walk_dir(path: &Path) -> walkdir::IntoIter {
    WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
}

/// Regular files, and symlinks to regular files.
pub fn is_searchable_file(entry: &walkdir::DirEntry) -> bool {
    if entry.file_type().is_dir() {
        return false;
    }
    entry.path().is_file()
}
