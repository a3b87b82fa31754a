use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref LOWERCASE_RE: Regex = Regex::new(r"[a-z]").unwrap();
    static ref UPPERCASE_RE: Regex = Regex::new(r"[A-Z]").unwrap();
    static ref DIGIT_RE: Regex = Regex::new(r"\d").unwrap();
    static ref SYMBOL_RE: Regex = Regex::new(r"[@$!%*?&]").unwrap();
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the password rules `password` fails. Empty means acceptable.
pub fn check_password_policy(password: &str) -> Vec<&'static str> {
    let mut failed = Vec::new();
    if !UPPERCASE_RE.is_match(password) {
        failed.push("uppercase letter");
    }
    if !LOWERCASE_RE.is_match(password) {
        failed.push("lowercase letter");
    }
    if !DIGIT_RE.is_match(password) {
        failed.push("number");
    }
    if !SYMBOL_RE.is_match(password) {
        failed.push("symbol (@$!%*?&)");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        failed.push("at least 8 characters");
    }
    failed
}
