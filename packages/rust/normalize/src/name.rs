//! Name fingerprints and similarity scoring.

use rapidfuzz::distance::indel;

/// Letters-only, lowercase digest of a name.
///
/// Digits, punctuation, whitespace and non-ASCII letters are all removed, so
/// distinct people with the same letter sequence collide. Scoring resolves
/// those collisions.
pub fn fingerprint(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect()
}

/// Fingerprint with single-letter tokens (middle initials) removed.
///
/// `"Jane A. Doe"` and `"Jane Doe"` share this key even though their full
/// fingerprints differ.
pub fn initials_free_key(name: &str) -> String {
    name.split_whitespace()
        .map(fingerprint)
        .filter(|token| token.len() > 1)
        .collect()
}

/// Normalized similarity ratio in `0.0..=100.0`.
///
/// `100 * (1 - indel_distance / (len_a + len_b))`, where the indel distance
/// counts insertions and deletions only. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    100.0 * indel::normalized_similarity(a.chars(), b.chars())
}
