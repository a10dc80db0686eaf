//! Pure text helpers for the console view.

/// Human-readable byte count, e.g. `1.5 MB`.
pub fn format_bytes(bytes: i64) -> String {
    const SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 0 {
        return "?".to_string();
    }
    let mut value = bytes as f64;
    let mut idx = 0;
    while value >= 1024.0 && idx < SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{} {}", bytes, SUFFIXES[idx])
    } else {
        format!("{:.2} {}", value, SUFFIXES[idx])
    }
}

/// Digits needed to print `n` (for zero-padded sequence numbers).
pub fn digits(n: usize) -> usize {
    let mut n = n.max(1);
    let mut count = 0;
    while n > 0 {
        n /= 10;
        count += 1;
    }
    count
}

/// Lays `left`, `center`, and `right` out in a field of exactly `width`
/// characters, truncating from the right if they do not fit.
pub fn align(left: &str, center: &str, right: &str, width: usize) -> String {
    let mut s = String::with_capacity(width);
    s.push_str(left);
    let used = left.chars().count() + center.chars().count() + right.chars().count();
    if used >= width {
        s.push_str(center);
        s.push_str(right);
        return s.chars().take(width).collect();
    }
    let gap = width - used;
    let left_gap = gap / 2;
    s.push_str(&" ".repeat(left_gap));
    s.push_str(center);
    s.push_str(&" ".repeat(gap - left_gap));
    s.push_str(right);
    s
}

/// Number of filled cells for a bar of `width` at `done`/`total` progress.
pub fn filled_cells(done: i64, total: i64, width: usize) -> usize {
    if total <= 0 {
        return 0;
    }
    let frac = (done.max(0) as f64 / total as f64).min(1.0);
    (frac * width as f64).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_small_values_exact() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
    }

    #[test]
    fn bytes_scaled_values() {
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn bytes_negative_is_unknown() {
        assert_eq!(format_bytes(-1), "?");
    }

    #[test]
    fn digit_widths() {
        assert_eq!(digits(1), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(137), 3);
        assert_eq!(digits(0), 1);
    }

    #[test]
    fn align_fits_width() {
        let s = align("1 KB", " ", "10 KB", 24);
        assert_eq!(s.chars().count(), 24);
        assert!(s.starts_with("1 KB"));
        assert!(s.ends_with("10 KB"));
    }

    #[test]
    fn align_truncates_when_too_long() {
        let s = align("x".repeat(30).as_str(), "", "", 10);
        assert_eq!(s.chars().count(), 10);
    }

    #[test]
    fn bar_fill() {
        assert_eq!(filled_cells(0, 100, 20), 0);
        assert_eq!(filled_cells(50, 100, 20), 10);
        assert_eq!(filled_cells(100, 100, 20), 20);
        assert_eq!(filled_cells(10, -1, 20), 0);
        assert_eq!(filled_cells(200, 100, 20), 20);
    }
}
