//! Caption sanitization for safe filenames.

/// Captions come from arbitrary list files, so cap their length.
const MAX_CAPTION: usize = 100;

/// Sanitizes a list caption for use as a filename.
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Replaces spaces and tabs with `_`
/// - Trims leading/trailing dots, spaces, and underscores
/// - Collapses consecutive underscores
/// - Limits length to 100 bytes
pub fn sanitize_caption(caption: &str) -> String {
    let mut out = String::with_capacity(caption.len());
    let mut prev_underscore = false;

    for c in caption.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            '_'
        } else if c == ' ' || c == '\t' {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '\t' || c == '.' || c == '_');

    if trimmed.len() > MAX_CAPTION {
        let mut take = MAX_CAPTION;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
