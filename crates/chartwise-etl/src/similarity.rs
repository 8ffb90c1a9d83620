//! Token-set string similarity.
//!
//! Chart listings and catalog entries format the same song differently:
//! featured artists move between title and artist, punctuation differs,
//! words swap places. [`token_set_ratio`] compares the *sets* of words in
//! two strings so that reordering and extra credited words do not count
//! against a match.

use std::collections::BTreeSet;

/// Lowercase `s`, turn every non-alphanumeric character into a space and
/// trim the result.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

/// Indel similarity of two strings, 0-100.
///
/// Computed as `2 * LCS / (len(a) + len(b))` over characters, where LCS is
/// the length of the longest common subsequence.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }

    let common = lcs_len(&a, &b);
    (200.0 * common as f64 / total as f64).round() as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Word-set similarity of two strings, 0-100.
///
/// Both strings are normalised and split into sorted word sets. From the
/// shared words and each side's leftovers three strings are built:
/// `shared`, `shared + leftovers_a` and `shared + leftovers_b`. The score
/// is the best [`ratio`] among their pairings, so a string whose words are
/// a subset of the other's scores 100. Returns 0 when either string has no
/// words.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let shared = join(tokens_a.intersection(&tokens_b));
    let only_a = join(tokens_a.difference(&tokens_b));
    let only_b = join(tokens_b.difference(&tokens_a));

    let combined_a = format!("{shared} {only_a}").trim().to_string();
    let combined_b = format!("{shared} {only_b}").trim().to_string();

    [
        ratio(&shared, &combined_a),
        ratio(&shared, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

fn join<'a, 'b: 'a>(words: impl Iterator<Item = &'a &'b str>) -> String {
    words.copied().collect::<Vec<_>>().join(" ")
}
