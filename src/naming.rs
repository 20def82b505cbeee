//! Name normalization.
//!
//! Collections, modes, variables and alias targets all go through
//! [`kebab_case`] so that token keys built from them are stable identifiers.
//! Words are split on separators, camel-case humps, acronym boundaries and
//! letter/digit boundaries. Combining marks stay inside their word.
//!
//! Lowercasing can itself change where a word splits (`İ` lowercases to `i`
//! plus a combining dot, and letters without a lowercase form stay upper), so
//! [`kebab_case`] re-splits its own output until it is stable. The result is
//! idempotent and hyphen-joined composites of results normalize to themselves.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD_RUN: Regex = Regex::new(r"[\p{L}\p{M}\p{N}]+").unwrap();
    static ref APOSTROPHES: Regex = Regex::new(r"['\u{2019}]").unwrap();
}

/// `"Color/Primary 500"` -> `"color-primary-500"`.
pub fn kebab_case(input: &str) -> String {
    let mut current = lower_words(input);
    loop {
        // each pass only adds separators, so this reaches a fixed point
        let next = lower_words(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn lower_words(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// `"border-radius"` -> `"borderRadius"`. Display only.
pub fn camel_case(input: &str) -> String {
    let mut out = String::new();
    for (i, word) in words(input).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Split a string into its words, preserving the original casing.
pub fn words(input: &str) -> Vec<String> {
    let cleaned = APOSTROPHES.replace_all(input, "");
    let mut words = Vec::new();
    for run in WORD_RUN.find_iter(&cleaned) {
        split_run(run.as_str(), &mut words);
    }
    words
}

fn split_run(run: &str, words: &mut Vec<String>) {
    let chars: Vec<char> = run.chars().collect();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && is_boundary(chars[i - 1], c, chars.get(i + 1).copied()) {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
}

fn is_boundary(prev: char, cur: char, next: Option<char>) -> bool {
    let digit_switch = prev.is_numeric() != cur.is_numeric();
    let camel_hump = prev.is_lowercase() && cur.is_uppercase();
    // "HTMLParser": break before the 'P' that starts a capitalized word
    let acronym_end =
        prev.is_uppercase() && cur.is_uppercase() && next.map_or(false, |n| n.is_lowercase());

    digit_switch || camel_hump || acronym_end
}
