//! Form field checks shared by the registration, profile and diagnostic test
//! forms.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Special characters accepted (and one required) in a registration password.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";
pub const MIN_PASSWORD_LEN: usize = 8;

pub const WEAK_PASSWORD_MESSAGE: &str = "Password must be at least 8 characters and include uppercase, lowercase, number, and special character.";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// At least eight characters drawn from letters, digits and `@$!%*?&`, with
/// at least one of each class.
pub fn is_strong_password(password: &str) -> bool {
    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);

    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().all(|c| c.is_ascii_alphanumeric() || is_special(c))
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special)
}

pub fn is_non_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_positive_number(value: &str) -> bool {
    parse_positive_number(value).is_some()
}

pub fn parse_positive_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emails() {
        assert!(is_valid_email("pat@example.com"));
        assert!(is_valid_email("first.last+tag@clinic.co.uk"));
        assert!(!is_valid_email("pat@example"));
        assert!(!is_valid_email("pat example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_strong_passwords() {
        assert!(is_strong_password("Secret1!"));
        assert!(is_strong_password("aB3$aB3$aB3$"));
        assert!(!is_strong_password("Secret1"), "missing special character");
        assert!(!is_strong_password("secret1!"), "missing uppercase");
        assert!(!is_strong_password("SECRET1!"), "missing lowercase");
        assert!(!is_strong_password("Secret!!"), "missing digit");
        assert!(!is_strong_password("Sec1!"), "too short");
        assert!(!is_strong_password("Secret1!#"), "'#' is not an allowed character");
    }

    #[test]
    fn test_non_empty() {
        assert!(is_non_empty(" x "));
        assert!(!is_non_empty("   "));
    }

    #[test]
    fn test_positive_numbers() {
        assert!(is_positive_number("5"));
        assert!(is_positive_number(" 2.5 "));
        assert!(!is_positive_number("0"));
        assert!(!is_positive_number("-3"));
        assert!(!is_positive_number("abc"));
        assert!(!is_positive_number("inf"));
        assert_eq!(parse_positive_number("7"), Some(7.0));
    }
}
