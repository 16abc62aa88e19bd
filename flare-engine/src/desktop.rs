//! Desktop entry discovery and decoding.

use std::fs;
use std::path::{Path, PathBuf};

use freedesktop_desktop_entry::DesktopEntry;

use crate::error::{Error, Result};
use crate::item::Application;

/// Application directories in priority order: XDG data dirs, the user's data
/// home, then snap and Flatpak exports.
pub fn default_application_dirs() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    match xdg::BaseDirectories::new() {
        Ok(xdg_dirs) => {
            roots.extend(xdg_dirs.get_data_dirs());
            roots.push(xdg_dirs.get_data_home());
        }
        Err(e) => {
            tracing::warn!(error = %e, "XDG base directories unavailable");
            roots.push(PathBuf::from("/usr/share"));
            roots.push(PathBuf::from("/usr/local/share"));
        }
    }
    roots.push(PathBuf::from("/var/lib/snapd/desktop"));
    roots.push(PathBuf::from("/var/lib/flatpak/exports/share"));
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".local/share/flatpak/exports/share"));
    }
    roots.into_iter().map(|p| p.join("applications")).collect()
}

/// Reads every `.desktop` file of every directory, in order.
///
/// Unreadable directories and undecodable entries are skipped. Entries with
/// the same name from different directories are all kept.
pub fn scan_applications(dirs: &[PathBuf]) -> Vec<Application> {
    let mut apps = Vec::new();
    for dir in dirs {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "skipping application directory");
                continue;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "desktop"))
            .collect();
        paths.sort();

        for path in paths {
            match parse_desktop_file(&path) {
                Ok(Some(app)) => apps.push(app),
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "skipping desktop entry"),
            }
        }
    }
    apps
}

/// Decodes one desktop entry. `Ok(None)` means the entry exists but should not
/// be listed (hidden, `NoDisplay`, or nameless).
pub fn parse_desktop_file(path: &Path) -> Result<Option<Application>> {
    let content = fs::read_to_string(path)?;
    let entry = DesktopEntry::decode(path, &content).map_err(|e| Error::Descriptor {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if entry.no_display() || flag(&entry, "Hidden") {
        return Ok(None);
    }

    let name = match entry.name(None) {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => return Ok(None),
    };

    Ok(Some(Application {
        name,
        exec: entry.exec().unwrap_or_default().to_string(),
        icon: entry.icon().unwrap_or_default().to_string(),
        comment: entry.comment(None).map(|s| s.to_string()),
        categories: split_list(entry.desktop_entry("Categories")),
        keywords: split_list(entry.desktop_entry("Keywords")),
        path: path.to_string_lossy().into_owned(),
    }))
}

fn flag(entry: &DesktopEntry<'_>, key: &str) -> bool {
    entry
        .desktop_entry(key)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
