//! Destination-path derivation for downloads.
//!
//! Builds safe local paths from list captions, derives final extensions from
//! the URL path or the response content type, and applies the optional
//! sequence-number prefix.

mod ext;
mod sanitize;

pub use ext::{ext_for_mime, ext_from_url, replace_extension};
pub use sanitize::sanitize_caption;

use std::path::{Path, PathBuf};

/// Suffix used for in-progress staging files.
pub const STAGING_SUFFIX: &str = ".part";

/// Hard cap on the full path length, with headroom under common OS limits.
const MAX_PATH_BYTES: usize = 250;

/// Builds the path `folder/<sanitized caption><ext>`, truncating the caption
/// if the whole path would exceed the length cap.
pub fn build_file_path(folder: &Path, caption: &str, ext: &str) -> PathBuf {
    let name = sanitize_caption(caption);
    let ext = dotted(ext);

    let mut path = folder.join(format!("{}{}", name, ext));
    let len = path.as_os_str().len();
    if len > MAX_PATH_BYTES {
        let cut = len - MAX_PATH_BYTES;
        let keep = name.len().saturating_sub(cut).max(1);
        let mut take = keep;
        while take > 0 && !name.is_char_boundary(take) {
            take -= 1;
        }
        path = folder.join(format!("{}{}", &name[..take.max(1)], ext));
    }
    path
}

/// Prepends `prefix` to the file name component of `path`.
pub fn apply_file_prefix(path: &Path, prefix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.parent() {
        Some(parent) => parent.join(format!("{}{}", prefix, file_name)),
        None => PathBuf::from(format!("{}{}", prefix, file_name)),
    }
}

/// Numbering prefix for sequence number `seq`, e.g. `3. name.mp3`.
pub fn number_prefix(seq: usize) -> String {
    format!("{}. ", seq)
}

fn dotted(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}
