//! Text cleanup used by every matcher.
//! Lowercases, drops quantity/unit fragments ("500g", "2 tbsp") and collapses
//! punctuation so product names and ingredient lines compare on bare words.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Number followed by a packaging/mass/volume unit, e.g. `1,5 kg`, `2tbsp`, `6 st`.
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:[.,]\d+)?\s*(?:kg|g|ml|l|tbsp|tsp|dl|pack|pkt|st|x)\b").unwrap()
});

/// Anything that is not a word character. `\w` is Unicode-aware, so å/ä/ö and
/// other extended Latin letters survive.
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]+").unwrap());

static ALNUM_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());

/// Normalize free text into a space-separated lowercase token string.
/// Total over all inputs; returns an empty string when nothing word-like remains.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let without_qty = QUANTITY.replace_all(&lower, " ");
    let spaced = NON_WORD.replace_all(&without_qty, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a verbose ingredient line to a short search key: the first two
/// normalized tokens longer than two characters, or the whole normalized
/// string when there are none.
pub fn key_from_phrase(phrase: &str) -> String {
    let normalized = normalize(phrase);
    let words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .take(2)
        .collect();
    if words.is_empty() {
        normalized
    } else {
        words.join(" ")
    }
}

/// ASCII alphanumeric runs of the lowercased text, as a set.
pub fn tokens(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    ALNUM_RUN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}
