//! Plain-text list parsing.
//!
//! A non-empty line that is not a URL names the next URL line; URLs with no
//! preceding caption line get an empty caption (filled later).

use super::{is_url, ListEntry};

pub(crate) fn parse(text: &str) -> Vec<ListEntry> {
    let mut entries = Vec::new();
    let mut pending_caption = String::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if is_url(line) {
            entries.push(ListEntry {
                url: line.to_string(),
                caption: std::mem::take(&mut pending_caption),
            });
        } else {
            pending_caption = line.to_string();
        }
    }

    entries
}
