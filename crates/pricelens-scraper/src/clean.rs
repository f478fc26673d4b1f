//! Text and price cleanup shared by the marketplace extractors.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static STORE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Visit the .*? Store\s*").expect("valid regex"));
static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]*\.?[0-9]*)").expect("valid regex"));
static LINE_SPLITTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n|\.\s+|;\s+|\u{2022}\s*").expect("valid regex"));
static LINE_SANITIZER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9 .,'%()-]").expect("valid regex"));

/// Marketing boilerplate that gets dropped from feature bullet lists.
const FEATURE_BOILERPLATE: &[&str] = &[
    "click here",
    "see more",
    "visit the",
    "customer reviews",
    "best sellers rank",
    "asin",
    "department",
    "date first available",
    "make sure this fits",
    "imported",
    "country of origin",
];

/// Collapses runs of whitespace and strips zero-width characters.
#[must_use]
pub fn collapse_whitespace(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !matches!(c, '\u{200b}'..='\u{200d}' | '\u{feff}'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes the "Visit the X Store" byline that leaks into some titles.
#[must_use]
pub fn strip_store_prefix(title: &str) -> String {
    collapse_whitespace(&STORE_PREFIX.replace(title, ""))
}

/// Truncates to at most `max` characters, appending an ellipsis when cut.
#[must_use]
pub fn truncate_title(title: &str, max: usize) -> String {
    match title.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", title[..byte_idx].trim_end()),
        None => title.to_string(),
    }
}

/// Pulls the first numeric amount out of a raw price string.
///
/// Handles currency symbols, thousands separators with Indian grouping, and
/// surrounding labels like "MRP". Returns `None` when no digits are present.
#[must_use]
pub fn parse_price_number(raw: &str) -> Option<f64> {
    let captured = PRICE_NUMBER.captures(raw)?.get(1)?.as_str().replace(',', "");
    captured.parse::<f64>().ok().filter(|v| *v >= 0.0)
}

/// Renders a parsed amount as `{symbol}{rounded integer}`.
#[must_use]
pub fn format_price(value: f64, symbol: &str) -> String {
    format!("{symbol}{}", value.round() as i64)
}

/// Parses and reformats a raw price string, or "N/A" when unparseable.
#[must_use]
pub fn normalize_price(raw: &str, symbol: &str) -> String {
    parse_price_number(raw)
        .map(|value| format_price(value, symbol))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Keeps only the digits of a string, for review counts like "1,234 ratings".
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Picks the largest image URL out of a `data-a-dynamic-image` JSON map,
/// where each key is a URL and each value is a `[width, height]` pair.
#[must_use]
pub fn largest_dynamic_image(json: &str) -> Option<String> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json).ok()?;
    map.into_iter()
        .filter_map(|(url, dims)| {
            let dims = dims.as_array()?;
            let width = dims.first()?.as_f64()?;
            let height = dims.get(1)?.as_f64()?;
            Some((url, width * height))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(url, _)| url)
}

/// Splits a description blob into candidate feature lines.
#[must_use]
pub fn split_description(text: &str) -> Vec<String> {
    LINE_SPLITTER
        .split(text)
        .map(|part| collapse_whitespace(&LINE_SANITIZER.replace_all(part, " ")))
        .filter(|part| part.split_whitespace().count() >= 3)
        .collect()
}

/// Filters raw feature lines down to a deduplicated, bounded list.
///
/// Lines outside the `min_len..=max_len` character window, boilerplate, and
/// case-insensitive duplicates are dropped. At most `cap` lines survive.
#[must_use]
pub fn filter_features<I>(lines: I, min_len: usize, max_len: usize, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    for line in lines {
        let line = collapse_whitespace(&line);
        let len = line.chars().count();
        if len < min_len || len > max_len {
            continue;
        }
        let lowered = line.to_lowercase();
        if FEATURE_BOILERPLATE.iter().any(|b| lowered.contains(b)) {
            continue;
        }
        if !seen.insert(lowered) {
            continue;
        }
        kept.push(line);
        if kept.len() == cap {
            break;
        }
    }
    kept
}

/// Best-effort brand guess: the first capitalized token of a title.
#[must_use]
pub fn brand_from_title(title: &str) -> String {
    title
        .split_whitespace()
        .next()
        .filter(|token| {
            token.chars().count() > 1 && token.chars().next().is_some_and(char::is_uppercase)
        })
        .map(ToString::to_string)
        .unwrap_or_default()
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------
