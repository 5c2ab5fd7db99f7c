// Paw Voice Engine — Fuzzy keyword matching
// Token-level correction for the instant rules: a token matches a keyword when
// it is identical, or when both are long enough and exactly one edit apart.

use crate::atoms::constants::{FUZZY_MAX_DISTANCE, FUZZY_MIN_LEN};

/// Levenshtein edit distance over chars, two-row DP.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Exact match, or a single edit when both words have at least `FUZZY_MIN_LEN` chars.
pub fn keyword_matches(token: &str, keyword: &str) -> bool {
    if token == keyword {
        return true;
    }
    let token_len = token.chars().count();
    let keyword_len = keyword.chars().count();
    if token_len < FUZZY_MIN_LEN || keyword_len < FUZZY_MIN_LEN {
        return false;
    }
    // Cheap length gate keeps the DP bounded by the keyword size.
    if token_len.abs_diff(keyword_len) > FUZZY_MAX_DISTANCE {
        return false;
    }
    levenshtein(token, keyword) == FUZZY_MAX_DISTANCE
}

/// True if `token` matches any keyword in the set.
pub fn matches_any(token: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| keyword_matches(token, kw))
}
