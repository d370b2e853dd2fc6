//! Text normalization for rendered notebook output.
//!
//! # Overview
//!
//! Executed notebooks print object reprs such as
//! `<Figure at 0x7f3b2c1d9e50>`. The address changes on every run, so the
//! rendered text of a freshly executed notebook never matches the stored
//! one byte for byte. Normalization replaces every address with
//! [`HEXADDR_PLACEHOLDER`] before diffing.
//!
//! # Invariants
//!
//! - Pure: same input, same output.
//! - Idempotent: the placeholder never matches the address pattern, so
//!   `normalize_text(normalize_text(t)) == normalize_text(t)`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Token substituted for every hexadecimal address.
pub const HEXADDR_PLACEHOLDER: &str = "<HEXADDR>";

// `0x` followed by 7 to 12 lowercase hex digits, as printed by CPython reprs.
static HEXADDR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0x[0-9a-f]{7,12}").expect("invalid regex"));

/// Replace every hexadecimal address in `text` with the placeholder.
pub fn normalize_text(text: &str) -> String {
    match HEXADDR.replace_all(text, HEXADDR_PLACEHOLDER) {
        Cow::Borrowed(unchanged) => unchanged.to_string(),
        Cow::Owned(replaced) => replaced,
    }
}

/// Number of address-like substrings in `text`.
pub fn count_addresses(text: &str) -> usize {
    HEXADDR.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_long_address() {
        let out = normalize_text("value at 0x1a2b3c4d5e6 here");
        assert_eq!(out, "value at <HEXADDR> here");
        assert!(!out.contains("0x1a2b3c4d5e6"));
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = normalize_text("<obj at 0x7f3b2c1d9e50> and <obj at 0x7f3b2c1d9f10>");
        assert_eq!(out, "<obj at <HEXADDR>> and <obj at <HEXADDR>>");
    }

    #[test]
    fn short_hex_literals_are_kept() {
        assert_eq!(normalize_text("mask = 0xff"), "mask = 0xff");
        assert_eq!(normalize_text("0x123456"), "0x123456");
    }

    #[test]
    fn uppercase_hex_is_not_an_address() {
        assert_eq!(normalize_text("0xDEADBEEF00"), "0xDEADBEEF00");
    }

    #[test]
    fn overlong_run_keeps_trailing_digits() {
        // Pattern consumes at most 12 digits after the prefix.
        assert_eq!(normalize_text("0x1234567890abcdef"), "<HEXADDR>cdef");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "",
            "no addresses",
            "<Figure at 0x10f2a3b40>",
            "0x1234567 0x123456789abc 0xabcdef0123456",
        ];
        for input in inputs {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "input: {input:?}");
            assert_eq!(count_addresses(&once), 0);
        }
    }

    #[test]
    fn count_addresses_matches_replacements() {
        let text = "a 0x1234567 b 0x7f3b2c1d9e50 c 0xff";
        assert_eq!(count_addresses(text), 2);
    }
}
