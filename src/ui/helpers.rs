use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// What: Truncate text to a display width, appending an ellipsis when cut.
///
/// Inputs:
/// - `s`: Text to fit
/// - `max`: Available terminal columns
///
/// Output:
/// - `s` unchanged when it fits; otherwise the longest prefix that fits in
///   `max - 1` columns followed by `…`.
///
/// Details:
/// - Uses `unicode_width` so wide glyphs count as two columns.
#[must_use]
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Convert a row count in `f64` to whole terminal rows; negative or non-finite is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rows(v: f64) -> usize {
    if v.is_finite() && v > 0.0 {
        v.floor() as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Short text is untouched; long and wide text is cut with an ellipsis
    fn truncate_handles_ascii_and_wide() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    /// What: Row conversion floors and clamps non-finite or negative input
    fn rows_floors_and_clamps() {
        assert_eq!(rows(4.9), 4);
        assert_eq!(rows(-3.0), 0);
        assert_eq!(rows(f64::NAN), 0);
    }
}
