//! Search query synthesis from an extracted product record.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

const MAX_QUERY_LEN: usize = 150;

/// Tokens that carry no cross-marketplace signal: generic stop words, colors,
/// marketing adjectives, demographics, units, and shopping boilerplate.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // basic stop words
        "the", "with", "for", "and", "or", "to", "of", "in", "on", "by", "from", "at", "a",
        "an", "is", "it", "as", "this", "that", "these", "those",
        // product descriptors
        "new", "latest", "best", "buy", "online", "original", "genuine", "imported", "pack",
        "set", "edition", "model", "series", "version", "type",
        // colors
        "black", "white", "grey", "gray", "blue", "red", "green", "yellow", "pink", "gold",
        "silver", "brown", "purple", "orange",
        // feature adjectives
        "wireless", "bluetooth", "portable", "smart", "pro", "plus", "max", "mini", "ultra",
        "lite", "classic", "advanced", "premium", "combo", "kit", "bundle",
        // demographics
        "unisex", "men", "women", "kids", "child", "children", "boy", "girl", "boys", "girls",
        "mens", "womens",
        // shopping terms
        "free", "shipping", "delivery", "offer", "sale", "discount", "deal", "price", "shop",
        "store", "review", "rating", "top", "quality", "official", "limited", "collection",
        // units
        "gb", "mb", "tb", "hz", "mah", "kg", "gm", "ml", "ltr", "cm", "mm", "inch", "hd",
        "4k", "led", "lcd", "amoled",
        // filler
        "without", "includes", "included", "exclusive", "exclusively", "only", "just", "very",
        "much", "many", "more", "less", "most", "least", "all", "some", "any", "none", "both",
        "either", "neither", "each", "every", "other", "another", "such", "same", "similar",
        "different", "various", "several", "few", "little", "lot", "lots", "plenty", "enough",
        "too", "also", "well", "good", "better", "bad", "worse", "worst", "high", "higher",
        "highest", "low", "lower", "lowest", "big", "bigger", "biggest", "small", "smaller",
        "smallest",
    ]
    .into_iter()
    .collect()
});

static PACK_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pack of \d+").expect("valid regex"));
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));
static QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+\s*(?:pack|piece|set|unit)s?\b").expect("valid regex"));
static CONNECTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:for|with|without|includes|included)\b").expect("valid regex")
});
static SHIPPING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:free|shipping|delivery)\b").expect("valid regex"));

/// Builds a compact, marketplace-neutral search string from a title and an
/// optional brand.
///
/// Deterministic and pure. An input with no usable tokens yields an empty
/// string, which callers treat as "skip the search entirely".
#[must_use]
pub fn synthesize_query(title: &str, brand: &str) -> String {
    let title = collapse(title);
    let brand = collapse(brand);

    // Variant suffixes after a dash describe the listing, not the product.
    let title = title.split(" - ").next().unwrap_or(&title).trim().to_string();

    let mut parts = Vec::new();
    if !brand.is_empty() {
        parts.push(brand.clone());
    }
    if !title.is_empty() {
        let without_brand = if !brand.is_empty()
            && title.to_lowercase().starts_with(&brand.to_lowercase())
        {
            title.get(brand.len()..).unwrap_or("").trim().to_string()
        } else {
            title
        };
        parts.push(without_brand);
    }

    let mut query = parts.join(" ");
    query = PACK_SIZE.replace_all(&query, "").into_owned();
    query = PARENTHETICAL.replace_all(&query, "").into_owned();
    query = QUANTITY.replace_all(&query, "").into_owned();
    query = CONNECTING.replace_all(&query, "").into_owned();
    query = SHIPPING.replace_all(&query, "").into_owned();

    let filtered: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .filter_map(|word| {
            let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            (cleaned.chars().count() > 1 && !STOP_WORDS.contains(cleaned.as_str()))
                .then_some(cleaned)
        })
        .collect();

    let joined = filtered.join(" ");
    let capped: String = joined.chars().take(MAX_QUERY_LEN).collect();
    collapse(&capped)
}

fn collapse(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------
