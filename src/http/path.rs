//! Request path resolution module
//!
//! Maps a raw request path to a logical path below the mount point, and a logical path
//! to an absolute filesystem path that is guaranteed to stay inside the served root.

use std::fmt::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::FilemanError;

/// Strip the mount prefixes and percent-encoding from a request path, then collapse
/// empty, `.` and `..` segments
///
/// The result is the logical path rooted at the served directory: `""` for the root
/// itself, otherwise a `/`-prefixed path such as `/docs/a b.txt`. Climbing above the
/// root is a [`FilemanError::PathEscape`].
///
/// # Examples
/// ```
/// use fileman::http::path::resolve_logical_path;
///
/// let logical = resolve_logical_path("/app/files/docs/a%20b.txt", "/app", "/files").unwrap();
/// assert_eq!(logical, "/docs/a b.txt");
///
/// assert_eq!(resolve_logical_path("/files///", "", "/files").unwrap(), "");
/// assert_eq!(resolve_logical_path("/files/docs/%2e%2e", "", "/files").unwrap(), "");
/// ```
pub fn resolve_logical_path(
    request_path: &str,
    context_path: &str,
    servlet_path: &str,
) -> Result<String, FilemanError> {
    let mut remaining = request_path;
    for prefix in [context_path, servlet_path] {
        remaining = strip_mount_prefix(remaining, prefix)
            .ok_or_else(|| FilemanError::NotFound(request_path.to_string()))?;
    }

    let trimmed = remaining.trim_end_matches('/');
    let decoded = percent_decode(trimmed)
        .ok_or_else(|| FilemanError::InvalidPath(request_path.to_string()))?;
    if decoded.contains('\0') {
        return Err(FilemanError::InvalidPath(request_path.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FilemanError::PathEscape(request_path.to_string()));
                }
            }
            segment => segments.push(segment),
        }
    }
    Ok(segments.iter().fold(String::new(), |mut logical, segment| {
        logical.push('/');
        logical.push_str(segment);
        logical
    }))
}

/// Strip `prefix` only at a segment boundary, so `/files` does not match `/filesystem`
fn strip_mount_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Join a logical path onto the (canonical) root, refusing anything that leaves it
///
/// `..` segments are resolved lexically and may never climb above the root. The deepest
/// existing part of the target is canonicalized as well, so a symlink pointing outside
/// the root is refused too, even on the way to a path an upload is about to create.
pub fn join_root(root: &Path, logical: &str) -> Result<PathBuf, FilemanError> {
    let mut segments: Vec<&str> = Vec::new();
    for component in Path::new(logical).components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| FilemanError::InvalidPath(logical.to_string()))?;
                segments.push(segment);
            }
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(FilemanError::PathEscape(logical.to_string()));
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    let target = segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment));

    // Uploads may create the target, so check the deepest part that exists
    if let Some(existing) = target.ancestors().find(|p| p.symlink_metadata().is_ok()) {
        let canonical = existing.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FilemanError::NotFound(logical.to_string()),
            _ => FilemanError::Io(e),
        })?;
        if !canonical.starts_with(root) {
            crate::logger::log_warning(&format!(
                "Path traversal attempt blocked: {logical} -> {}",
                canonical.display()
            ));
            return Err(FilemanError::PathEscape(logical.to_string()));
        }
    }

    Ok(target)
}

/// Join URI pieces with single slashes, always rooted at `/`
pub fn join_uri(parts: &[&str]) -> String {
    let mut uri = String::from("/");
    for segment in parts.iter().flat_map(|p| p.split('/')).filter(|s| !s.is_empty()) {
        if !uri.ends_with('/') {
            uri.push('/');
        }
        uri.push_str(segment);
    }
    uri
}

/// Decode `%XX` escapes as UTF-8; `None` for a broken escape or invalid UTF-8
///
/// `+` is left alone, it only means space in form bodies, not in paths.
pub fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

/// Percent-encode everything but RFC 3986 unreserved characters
pub fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strips_prefixes_and_trailing_slashes() {
        assert_eq!(
            resolve_logical_path("/ctx/fm/a/b//", "/ctx", "/fm").unwrap(),
            "/a/b"
        );
        assert_eq!(resolve_logical_path("/", "", "").unwrap(), "");
        assert_eq!(resolve_logical_path("/fm", "", "/fm/").unwrap(), "");
    }

    #[test]
    fn test_dot_segments_are_collapsed() {
        assert_eq!(resolve_logical_path("/fm/a/../b/./c", "", "/fm").unwrap(), "/b/c");
        assert_eq!(resolve_logical_path("/fm/b/..", "", "/fm").unwrap(), "");
        assert_eq!(resolve_logical_path("/fm/%2e", "", "/fm").unwrap(), "");
        assert_eq!(resolve_logical_path("/fm/a/%2E%2E/", "", "/fm").unwrap(), "");
        assert!(matches!(
            resolve_logical_path("/fm/..", "", "/fm"),
            Err(FilemanError::PathEscape(_))
        ));
        assert!(matches!(
            resolve_logical_path("/fm/a/%2e%2e/..", "", "/fm"),
            Err(FilemanError::PathEscape(_))
        ));
    }

    #[test]
    fn test_prefix_must_match_whole_segment() {
        assert!(matches!(
            resolve_logical_path("/filesystem/a", "", "/files"),
            Err(FilemanError::NotFound(_))
        ));
    }

    #[test]
    fn test_decodes_utf8() {
        assert_eq!(
            resolve_logical_path("/%E6%96%87%E4%BB%B6/a+b", "", "").unwrap(),
            "/文件/a+b"
        );
    }

    #[test]
    fn test_broken_escapes_are_invalid() {
        for path in ["/a%2", "/a%zz", "/a%FF", "/a%00b"] {
            assert!(
                matches!(resolve_logical_path(path, "", ""), Err(FilemanError::InvalidPath(_))),
                "{path} should be invalid"
            );
        }
    }

    #[test]
    fn test_join_resolves_dot_segments_inside_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(join_root(&root, "/a/../b/./c").unwrap(), root.join("b").join("c"));
        assert_eq!(join_root(&root, "").unwrap(), root);
    }

    #[test]
    fn test_join_rejects_escape() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert!(matches!(
            join_root(&root, "/../etc/passwd"),
            Err(FilemanError::PathEscape(_))
        ));
        assert!(matches!(
            join_root(&root, "/a/../../x"),
            Err(FilemanError::PathEscape(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_join_rejects_symlink_out_of_root() {
        let outside = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();
        assert!(matches!(
            join_root(&root, "/link"),
            Err(FilemanError::PathEscape(_))
        ));
        // Not yet existing paths below the link escape as well
        assert!(matches!(
            join_root(&root, "/link/new/file.txt"),
            Err(FilemanError::PathEscape(_))
        ));
        assert_eq!(
            join_root(&root, "/new/file.txt").unwrap(),
            root.join("new").join("file.txt")
        );
    }

    #[test]
    fn test_join_uri_collapses_slashes() {
        assert_eq!(join_uri(&["/", "/files/", "/sub", "a.txt"]), "/files/sub/a.txt");
        assert_eq!(join_uri(&["", "", ""]), "/");
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a b&c.txt"), "a%20b%26c.txt");
        assert_eq!(percent_encode("文"), "%E6%96%87");
    }
}
