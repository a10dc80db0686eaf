//! File-extension derivation: URL path first, response content type second.

use std::path::{Path, PathBuf};

/// Extracts the extension (with leading dot) from a URL's path, if any.
///
/// Returns `None` when the URL has no path segments, the last segment has no
/// dot, or the dot is the segment's final character.
pub fn ext_from_url(raw_url: &str) -> Option<String> {
    let parsed = url::Url::parse(raw_url).ok()?;
    let segment = parsed
        .path()
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .last()?;
    let dot = segment.rfind('.')?;
    if dot == segment.len() - 1 {
        return None;
    }
    Some(segment[dot..].to_string())
}

/// Maps a MIME type to a conventional extension (with leading dot).
///
/// Fixed table of common types; parameters (`; charset=...`) are ignored.
pub fn ext_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
    let ext = match essence.as_str() {
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/flac" | "audio/x-flac" => ".flac",
        "audio/wav" | "audio/x-wav" => ".wav",
        "video/mp4" => ".mp4",
        "video/x-matroska" => ".mkv",
        "video/webm" => ".webm",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "text/html" => ".html",
        "text/plain" => ".txt",
        "application/pdf" => ".pdf",
        "application/zip" => ".zip",
        "application/gzip" | "application/x-gzip" => ".gz",
        "application/x-tar" => ".tar",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "application/octet-stream" => ".bin",
        _ => return None,
    };
    Some(ext)
}

/// Returns `path` with its extension replaced by `ext` (empty `ext` strips it).
pub fn replace_extension(path: &Path, ext: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    };
    match path.parent() {
        Some(parent) => parent.join(format!("{}{}", stem, ext)),
        None => PathBuf::from(format!("{}{}", stem, ext)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_from_url_normal() {
        assert_eq!(
            ext_from_url("https://example.com/a/b/track.mp3").as_deref(),
            Some(".mp3")
        );
        assert_eq!(
            ext_from_url("https://example.com/file.tar.gz?sig=abc").as_deref(),
            Some(".gz")
        );
    }

    #[test]
    fn ext_from_url_missing() {
        assert_eq!(ext_from_url("https://example.com/"), None);
        assert_eq!(ext_from_url("https://example.com/noext"), None);
        assert_eq!(ext_from_url("https://example.com/trailing."), None);
    }

    #[test]
    fn mime_table() {
        assert_eq!(ext_for_mime("audio/mpeg"), Some(".mp3"));
        assert_eq!(ext_for_mime("text/html; charset=utf-8"), Some(".html"));
        assert_eq!(ext_for_mime("application/x-made-up"), None);
    }

    #[test]
    fn replaces_extension() {
        assert_eq!(
            replace_extension(Path::new("/d/song.part"), ".mp3"),
            PathBuf::from("/d/song.mp3")
        );
        assert_eq!(
            replace_extension(Path::new("/d/song.part"), ""),
            PathBuf::from("/d/song")
        );
    }
}
