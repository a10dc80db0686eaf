//! M3U / M3U8 playlist parsing.
//!
//! `#EXTINF:<duration>,<caption>` lines name the URL line that follows.
//! The nominally fixed encoding of these formats is widely ignored in the
//! wild, so the reader treats them as plain lines like the text parser does.

use super::{is_url, ListEntry};

pub(crate) fn parse(text: &str) -> Vec<ListEntry> {
    let mut entries: Vec<ListEntry> = Vec::new();
    let mut pending_caption: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("#EXTM3U") {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#EXTINF:") {
            pending_caption = Some(extinf_caption(rest));
        } else if line.starts_with('#') {
            // Unknown directive, skip.
        } else if is_url(line) {
            entries.push(ListEntry {
                url: line.to_string(),
                caption: pending_caption.take().unwrap_or_default(),
            });
        }
    }

    entries
}

/// Caption is everything after the first comma of the EXTINF payload.
fn extinf_caption(rest: &str) -> String {
    match rest.find(',') {
        Some(idx) => rest[idx + 1..].trim().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extinf_caption_and_url() {
        let entries = parse(
            "#EXTM3U\n#EXTINF:123,Artist - Title\nhttps://example.com/a.mp3\n",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].caption, "Artist - Title");
        assert_eq!(entries[0].url, "https://example.com/a.mp3");
    }

    #[test]
    fn url_without_extinf() {
        let entries = parse("#EXTM3U\nhttps://example.com/a.mp3\n");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].caption.is_empty());
    }

    #[test]
    fn extinf_without_comma() {
        let entries = parse("#EXTINF:42\nhttps://example.com/a.mp3\n");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].caption.is_empty());
    }

    #[test]
    fn unknown_directives_skipped() {
        let entries = parse(
            "#EXTM3U\n#PLAYLIST:x\n#EXTINF:1,One\nhttps://example.com/1.mp3\n",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].caption, "One");
    }
}
