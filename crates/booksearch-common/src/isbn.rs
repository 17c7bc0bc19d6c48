//! ISBN helpers.
//!
//! Only structural checks are performed: ten or thirteen digits (an `X` is
//! accepted in any position), optionally separated by single spaces or dashes.
//! Check digits are not verified.

use std::sync::LazyLock;

use regex::Regex;

static ISBN_10: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((\d|X)[ -]?){10}$").expect("valid ISBN-10 pattern"));

static ISBN_13: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((\d|X)[ -]?){13}$").expect("valid ISBN-13 pattern"));

/// Returns `true` if `isbn` looks like an ISBN-10 or ISBN-13.
pub fn is_valid_isbn(isbn: &str) -> bool {
    ISBN_10.is_match(isbn) || ISBN_13.is_match(isbn)
}

/// Strip separators, keeping digits and a trailing check character `X`.
pub fn clean_isbn(isbn: &str) -> String {
    let mut clean: String = isbn.chars().filter(|c| c.is_ascii_digit()).collect();
    if isbn
        .trim_end()
        .chars()
        .last()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'x'))
    {
        clean.push('X');
    }
    clean
}
