//! String similarity metrics.
//!
//! `similarity` ranks fuzzy candidates and gates acceptance; `trigram_similarity`
//! backs the `trigram_sim` SQL function used by the composition strategy.

use std::collections::HashSet;

use strsim::normalized_levenshtein;

/// Similarity between two strings in [0.0, 1.0].
///
/// Rules, first applicable wins:
/// 1. case-insensitive equality -> 1.0
/// 2. one contains the other -> 0.8 * (shorter / longer)
/// 3. otherwise -> normalized Levenshtein, floored at 0.0
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }

    if a.contains(&b) || b.contains(&a) {
        let a_len = a.chars().count();
        let b_len = b.chars().count();
        let shorter = a_len.min(b_len) as f64;
        let longer = a_len.max(b_len) as f64;
        return 0.8 * (shorter / longer);
    }

    normalized_levenshtein(&a, &b).max(0.0)
}

/// Trigram (Jaccard) similarity in [0.0, 1.0], pg_trgm style.
///
/// Strings are lowercased and padded with two leading and one trailing space
/// so short words and word boundaries contribute trigrams.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let ta = trigrams(&a);
    let tb = trigrams(&b);
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

fn trigrams(s: &str) -> HashSet<[char; 3]> {
    let padded: Vec<char> = std::iter::repeat(' ')
        .take(2)
        .chain(s.chars())
        .chain(std::iter::once(' '))
        .collect();
    padded
        .windows(3)
        .map(|w| [w[0], w[1], w[2]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equality_is_one() {
        assert_eq!(similarity("Paracetamol", "paracetamol"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_containment_scales_by_length_ratio() {
        // "para" (4) inside "paracetamol" (11)
        let s = similarity("para", "Paracetamol");
        assert!((s - 0.8 * 4.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_edit_distance_fallback() {
        // One dropped letter: distance 1 over length 11
        let s = similarity("Paracetmol", "Paracetamol");
        assert!((s - (1.0 - 1.0 / 11.0)).abs() < 1e-9);
        assert!(s >= 0.7);
    }

    #[test]
    fn test_one_empty_is_zero() {
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_trigram_basics() {
        assert_eq!(trigram_similarity("paracetamol", "Paracetamol"), 1.0);
        assert_eq!(trigram_similarity("", "paracetamol"), 0.0);
        assert!(trigram_similarity("paracetamol", "paracetmol") > 0.5);
        assert!(trigram_similarity("paracetamol", "metformin") < 0.2);
    }

    proptest! {
        #[test]
        fn prop_similarity_reflexive(s in "\\PC{0,32}") {
            prop_assert_eq!(similarity(&s, &s), 1.0);
        }

        #[test]
        fn prop_similarity_symmetric(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let ab = similarity(&a, &b);
            let ba = similarity(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-12);
        }

        #[test]
        fn prop_similarity_bounded(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn prop_trigram_bounded(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let s = trigram_similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
