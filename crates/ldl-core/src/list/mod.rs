//! List-file parsing: turns a links file (plain text or M3U) into entries.
//!
//! Format is chosen by file extension. After parsing, entries without a URL
//! are dropped and empty captions are filled from the URL (last path segment
//! stem) or a hash of the URL as a last resort.

mod m3u;
pub mod mutate;
mod txt;

pub use mutate::ListFile;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// One parsed list entry: the URL to fetch and a caption that names the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub url: String,
    pub caption: String,
}

/// List-file flavor, detected from the path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Txt,
    M3u,
}

impl ListFormat {
    pub fn detect(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("m3u") | Some("m3u8") => ListFormat::M3u,
            _ => ListFormat::Txt,
        }
    }
}

/// Reads and parses a list file, dropping URL-less entries and filling
/// empty captions.
pub fn parse_list_file(path: &Path) -> Result<Vec<ListEntry>> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read list file {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    let mut entries = match ListFormat::detect(path) {
        ListFormat::M3u => m3u::parse(&text),
        ListFormat::Txt => txt::parse(&text),
    };

    entries.retain(|e| !e.url.is_empty());
    for entry in &mut entries {
        if entry.caption.is_empty() {
            entry.caption = caption_from_url(&entry.url);
        }
    }
    Ok(entries)
}

/// True if `s` parses as an absolute URL.
pub(crate) fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// Caption fallback: last path segment without extension, else a hash prefix.
fn caption_from_url(raw_url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(raw_url) {
        let segment = parsed
            .path()
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .last()
            .unwrap_or("");
        let stem = match segment.rfind('.') {
            Some(dot) if dot > 0 => &segment[..dot],
            _ => segment,
        };
        if !stem.is_empty() {
            return stem.to_string();
        }
    }
    let digest = Sha256::digest(raw_url.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn detects_format() {
        assert_eq!(ListFormat::detect(Path::new("a/list.m3u")), ListFormat::M3u);
        assert_eq!(ListFormat::detect(Path::new("a/list.M3U8")), ListFormat::M3u);
        assert_eq!(ListFormat::detect(Path::new("a/links.txt")), ListFormat::Txt);
        assert_eq!(ListFormat::detect(Path::new("a/links")), ListFormat::Txt);
    }

    #[test]
    fn caption_from_url_stem() {
        assert_eq!(
            caption_from_url("https://example.com/music/track01.mp3"),
            "track01"
        );
        assert_eq!(caption_from_url("https://example.com/readme"), "readme");
    }

    #[test]
    fn caption_from_url_hash_fallback() {
        let caption = caption_from_url("https://example.com/");
        assert_eq!(caption.len(), 16);
        assert!(caption.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn parse_fills_captions_and_drops_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "My Song").unwrap();
        writeln!(f, "https://example.com/a.mp3").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "https://example.com/music/other.mp3").unwrap();
        drop(f);

        let entries = parse_list_file(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].caption, "My Song");
        assert_eq!(entries[1].caption, "other");
    }
}
