//! Advantage and disadvantage keywords in free text.
//!
//! Users ask for advantage by writing a standalone `adv` or `dis` word next
//! to their expression (`!r 1d20+5 adv Stealth`). The word is removed before
//! the expression is compiled.

use crate::common::AdvType;
use regex::Regex;
use std::sync::LazyLock;

static ANY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(?:adv|dis)(?:\s|$)").unwrap());

static ADV_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)adv(?:\s|$)").unwrap());

static STRIP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:adv|dis)(?:\s+|$)").unwrap());

/// Splits the advantage keyword out of `raw`.
///
/// `adv` wins when both words are present. When no standalone keyword is
/// found the text comes back unchanged.
pub fn extract_advantage(raw: &str) -> (String, AdvType) {
    if !ANY_TOKEN.is_match(raw) {
        return (raw.to_string(), AdvType::None);
    }

    let adv = if ADV_TOKEN.is_match(raw) {
        AdvType::Adv
    } else {
        AdvType::Dis
    };
    (STRIP_TOKEN.replace_all(raw, "").into_owned(), adv)
}
