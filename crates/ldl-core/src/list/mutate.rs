//! Source-list mutation: removing completed entries from the origin file.
//!
//! After a transfer succeeds, its lines are dropped from the list file so an
//! interrupted run can be re-pointed at the same file and only fetch what is
//! left. The rewrite goes through a temp file and a rename so a crash cannot
//! leave a half-written list.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{is_url, ListEntry, ListFormat};
use crate::scheduler::SourceMutator;

/// Handle on the origin list file, able to remove entries in place.
#[derive(Debug, Clone)]
pub struct ListFile {
    path: PathBuf,
    format: ListFormat,
}

impl ListFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            format: ListFormat::detect(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes `entry`'s URL line and its caption line (the preceding
    /// `#EXTINF` for M3U, the preceding caption text line for plain lists).
    pub fn remove_entry(&self, entry: &ListEntry) -> Result<()> {
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read list file {}", self.path.display()))?;
        let lines: Vec<&str> = data.lines().collect();

        let url_idx = lines
            .iter()
            .position(|line| line.trim() == entry.url)
            .with_context(|| format!("URL not found in list file: {}", entry.url))?;

        let mut drop = vec![url_idx];
        if let Some(caption_idx) = self.caption_line_for(&lines, url_idx, entry) {
            drop.push(caption_idx);
        }

        let kept: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|(i, _)| !drop.contains(i))
            .map(|(_, line)| *line)
            .collect();

        let tmp_path = self.path.with_extension("ldl-rewrite");
        let mut out = kept.join("\n");
        if data.ends_with('\n') && !out.is_empty() {
            out.push('\n');
        }
        fs::write(&tmp_path, out)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn caption_line_for(
        &self,
        lines: &[&str],
        url_idx: usize,
        entry: &ListEntry,
    ) -> Option<usize> {
        let prev_idx = url_idx.checked_sub(1)?;
        let prev = lines[prev_idx].trim();
        match self.format {
            ListFormat::M3u => prev.starts_with("#EXTINF:").then_some(prev_idx),
            ListFormat::Txt => {
                (!entry.caption.is_empty() && prev == entry.caption && !is_url(prev))
                    .then_some(prev_idx)
            }
        }
    }
}

impl SourceMutator for ListFile {
    fn on_success(&mut self, entry: &ListEntry) -> Result<()> {
        self.remove_entry(entry)?;
        tracing::debug!(url = %entry.url, "removed completed entry from list file");
        Ok(())
    }
}
