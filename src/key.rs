use std::sync::OnceLock;

use regex::Regex;

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digit-run pattern"))
}

/// Extract a join key from a composite identifier: the first maximal run of
/// decimal digits, parsed as an integer. `"37-A-0021"` yields 37.
///
/// Returns `None` when the string has no digits, or when the run overflows
/// an i64 (treated as "no key" rather than an error).
pub fn extract_key(raw: &str) -> Option<i64> {
    digit_run().find(raw).and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Strict key parse used on the tabular side: the whole trimmed value must
/// be decimal digits, otherwise the row is not usable as a join source.
pub fn strict_key(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::{extract_key, strict_key};

    #[test]
    fn extracts_first_digit_run() {
        assert_eq!(extract_key("37-A-0021"), Some(37));
        assert_eq!(extract_key("NC0370021"), Some(370021));
        assert_eq!(extract_key("42"), Some(42));
    }

    #[test]
    fn no_digits_yields_no_key() {
        assert_eq!(extract_key(""), None);
        assert_eq!(extract_key("N/A"), None);
        assert_eq!(extract_key("district"), None);
    }

    #[test]
    fn overflowing_run_yields_no_key() {
        assert_eq!(extract_key("99999999999999999999999999"), None);
    }

    #[test]
    fn strict_rejects_mixed_text() {
        assert_eq!(strict_key("37"), Some(37));
        assert_eq!(strict_key(" 37 "), Some(37));
        assert_eq!(strict_key("37-A"), None);
        assert_eq!(strict_key("N/A"), None);
        assert_eq!(strict_key(""), None);
        assert_eq!(strict_key("3.5"), None);
    }
}
