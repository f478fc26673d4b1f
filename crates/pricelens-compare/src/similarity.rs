/// Jaccard similarity over word sets.
///
/// Both strings are lowercased and split on non-alphanumeric runs; the score
/// is |intersection| / |union| of the resulting token sets. Returns 0.0 when
/// either side has no tokens.
#[must_use]
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a = token_set(a);
    let set_b = token_set(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

fn token_set(input: &str) -> std::collections::HashSet<String> {
    input
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------
