//! MIME type probing module
//!
//! Guesses a Content-Type from the file extension. Anything unknown is served as
//! `application/octet-stream`.

use std::path::Path;

/// Content type used when the extension gives no hint
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Probe the Content-Type of a file by its extension (case-insensitive)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use fileman::http::mime::probe_content_type;
///
/// assert_eq!(probe_content_type(Path::new("notes/readme.TXT")), "text/plain; charset=utf-8");
/// assert_eq!(probe_content_type(Path::new("movie.mp4")), "video/mp4");
/// assert_eq!(probe_content_type(Path::new("Makefile")), "application/octet-stream");
/// ```
pub fn probe_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    content_type_for(extension.as_deref()).unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Look up a lowercase extension
fn content_type_for(extension: Option<&str>) -> Option<&'static str> {
    let content_type = match extension? {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" | "md" | "log" => "text/plain; charset=utf-8",
        "csv" => "text/csv",
        "xml" => "application/xml",

        // Scripts and data
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "bmp" => "image/bmp",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // Documents and archives
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",

        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(probe_content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(probe_content_type(Path::new("a.css")), "text/css");
        assert_eq!(probe_content_type(Path::new("a.json")), "application/json");
        assert_eq!(probe_content_type(Path::new("dir/a.PNG")), "image/png");
        assert_eq!(probe_content_type(Path::new("a.tar.gz")), "application/gzip");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(probe_content_type(Path::new("a.xyz")), DEFAULT_CONTENT_TYPE);
        assert_eq!(probe_content_type(Path::new("LICENSE")), DEFAULT_CONTENT_TYPE);
        assert_eq!(probe_content_type(Path::new(".hidden")), DEFAULT_CONTENT_TYPE);
    }
}
