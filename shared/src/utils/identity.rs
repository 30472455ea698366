//! Identity validation and masking utilities
//!
//! Codes are issued against either a phone number (E.164) or an email
//! address. Raw identities never appear in log output; use the masking
//! helpers whenever an identity is logged.

use once_cell::sync::Lazy;
use regex::Regex;

/// E.164: leading '+', 7 to 15 digits, no leading zero after the '+'
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("valid phone regex"));

/// Pragmatic email check; full RFC 5322 validation is not attempted
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Check whether a phone number is in valid E.164 format
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Check whether an email address is well formed
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Mask a phone number for logging, keeping the country prefix and last two
/// digits: `+919999999999` -> `+91********99`
pub fn mask_phone(phone: &str) -> String {
    // Char-wise, not byte-wise: the input may be arbitrary user text that
    // only fails E.164 validation further down the pipeline.
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 5 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 5), tail)
}

/// Mask an email address for logging, keeping the first character of the
/// local part and the domain: `tpo@college.edu` -> `t**@college.edu`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}{}@{}", first, "*".repeat(local.chars().count().saturating_sub(1)), domain)
        }
        _ => "*".repeat(email.len()),
    }
}
