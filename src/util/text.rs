use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

/// 報價字串中的千分位符號
const NUMBER_ESCAPE_CHAR: &[char] = &[','];

/// Parses a decimal value from a given string.
///
/// The site publishes most quotes as strings, sometimes with thousands
/// separators, so the separators are removed and surrounding whitespace or
/// quotes trimmed before handing the text to `Decimal::from_str`. Anything
/// inside the number other than a separator makes it fail. Scientific notation
/// (`1.2e9`) is accepted as a fallback.
///
/// # Arguments
///
/// * `s`: The raw text of a quote.
/// * `escape_chars`: Optional extra characters to drop before parsing.
///
/// # Returns
///
/// * `Result<Decimal>`: The parsed value, or an error naming the cleaned text.
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Trims `s` and removes the default number escape characters plus any extra ones.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.trim_matches(|c: char| c.is_whitespace() || c == '"')
        .chars()
        .filter(|c| !filters.contains(c))
        .collect()
}

/// Cuts `s` down to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
