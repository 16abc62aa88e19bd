use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use walkdir::{DirEntry, WalkDir};

use crate::item::FileEntry;

/// `~/Documents`, `~/Downloads`, `~/Desktop`, `~/Pictures`, `~/Videos`,
/// `~/Music`, then `~` itself.
pub fn default_file_roots() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    let mut roots: Vec<PathBuf> = ["Documents", "Downloads", "Desktop", "Pictures", "Videos", "Music"]
        .iter()
        .map(|dir| home.join(dir))
        .collect();
    roots.push(home);
    roots
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Collects files below each root, in root order.
///
/// A file directly inside a root is at depth 1; nothing deeper than
/// `max_depth` is visited. Hidden files and directories are ignored. The walk
/// stops as soon as `max_files` files have been collected across all roots.
pub fn scan_files(roots: &[PathBuf], max_depth: usize, max_files: usize) -> Vec<FileEntry> {
    let mut files = Vec::new();
    if max_files == 0 {
        return files;
    }

    for root in roots {
        if !root.is_dir() {
            continue;
        }

        let walker = WalkDir::new(root)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(file) = file_entry(entry.path()) else {
                continue;
            };
            files.push(file);
            if files.len() >= max_files {
                return files;
            }
        }
    }
    files
}

/// Stats the file, following symlinks. Broken links and links to directories
/// yield `None`.
fn file_entry(path: &Path) -> Option<FileEntry> {
    let metadata = fs::metadata(path).ok()?;
    if metadata.is_dir() {
        return None;
    }
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |d| d.as_secs_f64());

    Some(FileEntry {
        name: path.file_name()?.to_string_lossy().into_owned(),
        path: path.to_string_lossy().into_owned(),
        mtime,
        size: metadata.len(),
    })
}
