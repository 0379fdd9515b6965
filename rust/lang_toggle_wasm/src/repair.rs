// Guard against broken Persian strings (mojibake, stray control bytes)

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CORRUPTION: Regex =
        Regex::new(r"[\x{FFFD}\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x9F]").unwrap();
}

/// Missing, blank, or containing replacement/control characters.
/// Tabs and line breaks are fine.
pub fn is_corrupt(text: Option<&str>) -> bool {
    match text {
        None => true,
        Some(t) => t.trim().is_empty() || CORRUPTION.is_match(t),
    }
}

/// Secondary text safe to display, and whether the stored value had to be replaced.
pub fn repaired_secondary(primary: &str, secondary: Option<&str>) -> (String, bool) {
    match secondary {
        Some(text) if !is_corrupt(Some(text)) => (text.to_string(), false),
        _ => (primary.to_string(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_corruption_markers() {
        assert!(is_corrupt(None));
        assert!(is_corrupt(Some("")));
        assert!(is_corrupt(Some("   ")));
        assert!(is_corrupt(Some("سل\u{FFFD}م")));
        assert!(is_corrupt(Some("abc\u{0001}")));
        assert!(is_corrupt(Some("\u{0085}x")));
    }

    #[test]
    fn accepts_normal_text() {
        assert!(!is_corrupt(Some("درباره من")));
        assert!(!is_corrupt(Some("line one\nline\ttwo\r\n")));
        assert!(!is_corrupt(Some("نیم‌فاصله")));
    }

    #[test]
    fn repair_copies_primary() {
        assert_eq!(repaired_secondary("About", Some("\u{FFFD}\u{FFFD}")), ("About".to_string(), true));
        assert_eq!(repaired_secondary("About", None), ("About".to_string(), true));
        assert_eq!(repaired_secondary("About", Some("درباره")), ("درباره".to_string(), false));
    }
}
