//! Input validators for the signup form.
//!
//! All functions are pure and total: any string, including the empty one,
//! is accepted as input and simply reported invalid.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

// Looser check applied to CSV imports.
static LOOSE_EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("loose email regex"));

fn digits_of(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// CPF check: 11 digits after stripping punctuation, not a single repeated
/// digit, and both mod-11 check digits match.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits = digits_of(cpf);
    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    check_digit_matches(&digits, 9) && check_digit_matches(&digits, 10)
}

// Weights run from (len + 1) down to 2 over the first `len` digits.
fn check_digit_matches(digits: &[u32], len: usize) -> bool {
    let sum: u32 = digits[..len]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (len as u32 + 1 - i as u32))
        .sum();
    (sum * 10) % 11 % 10 == digits[len]
}

pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_RE.is_match(email)
}

pub fn looks_like_email(email: &str) -> bool {
    LOOSE_EMAIL_RE.is_match(email)
}

/// `(DD) DDDDD-DDDD` for mobile numbers, `(DD) DDDD-DDDD` for landlines,
/// anything else returned unchanged.
pub fn format_phone(phone: &str) -> String {
    let nums: String = phone.chars().filter(char::is_ascii_digit).collect();
    match nums.len() {
        11 => format!("({}) {}-{}", &nums[..2], &nums[2..7], &nums[7..]),
        10 => format!("({}) {}-{}", &nums[..2], &nums[2..6], &nums[6..]),
        _ => phone.to_string(),
    }
}
