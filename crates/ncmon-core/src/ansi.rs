//! ANSI escape code handling for device log lines
//!
//! ESP-IDF's logger colours every line (`\x1b[0;32mI (1234) tag: ...\x1b[0m`).
//! The colour codes would otherwise split tokens and defeat anchor matching.

use regex::Regex;
use std::sync::LazyLock;

/// 7-bit and 8-bit (C1) escape sequences.
///
/// Covers `ESC [ params final` as well as the single-byte C1 introducers
/// some UART bridges emit instead of `ESC [`.
static ANSI_ESCAPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\x1b[@-_]|[\x{80}-\x{9f}])[0-?]*[ -/]*[@-~]")
        .expect("ANSI regex pattern is valid")
});

/// Strip ANSI escape sequences from a log line.
///
/// # Examples
///
/// ```
/// use ncmon_core::strip_ansi_codes;
///
/// assert_eq!(strip_ansi_codes("\x1b[0;32mI (12) relay: up\x1b[0m"), "I (12) relay: up");
/// ```
pub fn strip_ansi_codes(input: &str) -> String {
    ANSI_ESCAPE_PATTERN.replace_all(input, "").into_owned()
}

/// Normalise a raw line read from a device: strip escapes and surrounding
/// whitespace. Returns `None` when nothing is left.
pub fn clean_line(raw: &str) -> Option<String> {
    let stripped = strip_ansi_codes(raw);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_colour_codes() {
        let input = "\x1b[0;32mI (5021) relay: Received native packet 17\x1b[0m";
        assert_eq!(
            strip_ansi_codes(input),
            "I (5021) relay: Received native packet 17"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(strip_ansi_codes("GPIO4 EDGE RISING 1234"), "GPIO4 EDGE RISING 1234");
    }

    #[test]
    fn test_strip_c1_introducer() {
        let input = "\u{9b}31mDecoded packet 3";
        assert_eq!(strip_ansi_codes(input), "Decoded packet 3");
    }

    #[test]
    fn test_clean_line_trims_and_drops_empty() {
        assert_eq!(
            clean_line("  Decoded packet 9 \r"),
            Some("Decoded packet 9".to_string())
        );
        assert_eq!(clean_line("\x1b[0m   \r"), None);
        assert_eq!(clean_line(""), None);
    }
}
