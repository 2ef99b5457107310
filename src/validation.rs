//! Pure checks and derivations shared by the edit forms. Forms call these
//! after every mutation instead of caching anything themselves.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    errors::{FormError, FormResult},
    session::CurrentUser,
};

pub const NOTE_MAX_CHARS: usize = 30;
pub const CIRCLE_SIZE_MAX: f64 = 2.0;

// digits with an optional fractional part; no sign, no exponent
static CIRCLE_SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());

// optionally signed decimal at the start of the text; trailing junk is ignored
static LEADING_NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap()
});

pub fn passwords_match(password: &str, confirm_password: &str) -> bool {
    password == confirm_password
}

pub fn is_self(username: &str, current: Option<&CurrentUser>) -> bool {
    current.is_some_and(|user| user.username() == username)
}

pub fn parse_circle_size(text: &str, max: f64) -> FormResult<f64> {
    if !CIRCLE_SIZE_PATTERN.is_match(text) {
        return Err(FormError::InvalidCircleSize(text.to_owned()));
    }

    match text.parse::<f64>() {
        Ok(value) if value <= max => Ok(value),
        _ => Err(FormError::InvalidCircleSize(text.to_owned())),
    }
}

/// Reads the number the text starts with, as a browser's `parseFloat` would:
/// `"-1abc"` gives `-1.0`, `"abc"` gives `None`.
pub fn leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER_PATTERN
        .find(text)
        .and_then(|m| m.as_str().trim_start().parse().ok())
}

// counts chars rather than bytes so multi-byte notes are never split mid-char
pub fn truncate_note(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_match_is_plain_equality() {
        assert!(passwords_match("", ""));
        assert!(passwords_match("hunter2", "hunter2"));
        assert!(!passwords_match("hunter2", "hunter3"));
        assert!(!passwords_match("", " "));
        assert!(!passwords_match("Secret", "secret"));
    }

    #[test]
    fn self_detection() {
        let alice = CurrentUser::new("alice");

        assert!(is_self("alice", Some(&alice)));
        assert!(!is_self("bob", Some(&alice)));
        assert!(!is_self("alice", None));
    }

    #[test]
    fn circle_size_bounds_and_pattern() {
        for ok in ["0", "2", "1.99", "0.15", "2.0", "002"] {
            assert!(parse_circle_size(ok, CIRCLE_SIZE_MAX).is_ok(), "{ok} should pass");
        }

        for bad in ["2.5", "-1", "abc", "", "1.", ".5", "1e0", " 1", "2.0001"] {
            assert_eq!(
                parse_circle_size(bad, CIRCLE_SIZE_MAX),
                Err(FormError::InvalidCircleSize(bad.to_owned())),
                "{bad} should be rejected"
            );
        }

        assert_eq!(parse_circle_size("1.25", CIRCLE_SIZE_MAX), Ok(1.25));
        assert!(parse_circle_size("3", 5.0).is_ok());
    }

    #[test]
    fn leading_number_ignores_trailing_text() {
        assert_eq!(leading_number("-1abc"), Some(-1.0));
        assert_eq!(leading_number("  -0.5"), Some(-0.5));
        assert_eq!(leading_number("-.25x"), Some(-0.25));
        assert_eq!(leading_number("2e1m"), Some(20.0));
        assert_eq!(leading_number("3."), Some(3.0));
        assert_eq!(leading_number("abc"), None);
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn note_truncation() {
        let forty = "abcdefghijklmnopqrstuvwxyz0123456789ABCD";
        assert_eq!(forty.len(), 40);

        let truncated = truncate_note(forty, NOTE_MAX_CHARS);
        assert_eq!(truncated, &forty[..30]);
        assert_eq!(truncate_note("short", NOTE_MAX_CHARS), "short");
        assert_eq!(truncate_note("ééééé", 3), "ééé");
    }
}
