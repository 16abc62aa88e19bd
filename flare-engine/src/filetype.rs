//! Labels shown under file results.

use std::path::Path;

/// Human-readable type of a file, from its extension.
pub fn file_type_label(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "PDF Document",
        "doc" | "docx" => "Word Document",
        "txt" => "Text File",
        "py" => "Python Script",
        "rs" => "Rust Source",
        "js" => "JavaScript File",
        "html" => "HTML File",
        "css" => "CSS File",
        "jpg" | "jpeg" => "JPEG Image",
        "png" => "PNG Image",
        "gif" => "GIF Image",
        "mp3" => "MP3 Audio",
        "mp4" => "MP4 Video",
        "zip" => "ZIP Archive",
        "tar" => "TAR Archive",
        "gz" => "GZIP Archive",
        _ => "File",
    }
}

/// `512.0 B`, `1.5 KB`, ... with one decimal.
pub fn format_file_size(size: u64) -> String {
    let mut size = size as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PB")
}
