//! Character-level similarity for fill-in-blank partial credit.

/// Ratio of unchanged characters to total characters in a character diff of
/// the two strings: `common / (len_a + len_b - common)` where `common` is the
/// longest-common-subsequence length. Identical strings score 1.0, disjoint
/// strings 0.0, and the ratio grows monotonically with the overlap.
#[must_use]
pub fn char_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() && b_chars.is_empty() {
        return 1.0;
    }
    let common = lcs_len(&a_chars, &b_chars);
    let total = a_chars.len() + b_chars.len() - common;
    common as f64 / total as f64
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(char_ratio("Paris", "Paris"), 1.0);
        assert_eq!(char_ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(char_ratio("abc", "xyz"), 0.0);
        assert_eq!(char_ratio("", "xyz"), 0.0);
    }

    #[test]
    fn near_misses_score_high() {
        // "Pari" vs "Paris": common 4, total 4 + 5 - 4 = 5
        assert_eq!(char_ratio("Pari", "Paris"), 0.8);
    }

    #[test]
    fn closer_answers_score_higher() {
        let close = char_ratio("mitochondria", "mitochondira");
        let far = char_ratio("mitochondria", "chloroplast");
        assert!(close > far);
        assert!(close > 0.8);
        assert!(far < 0.5);
    }

    #[test]
    fn ratio_is_symmetric() {
        assert_eq!(char_ratio("kernel", "kernal"), char_ratio("kernal", "kernel"));
    }
}
