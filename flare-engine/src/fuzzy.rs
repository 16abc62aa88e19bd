//! Normalized string similarity.

/// Similarity of two strings on a 0–100 scale.
///
/// This is the indel ratio: twice the length of the longest common
/// subsequence over the combined length. It is symmetric and reaches 100 only
/// when the strings are equal.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let common = lcs_len(&a, &b);
    200.0 * common as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            curr[j + 1] = if lc == sc {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(ratio("firefox", "firefox"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn disjoint_strings_score_0() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn is_symmetric() {
        for (a, b) in [("fire", "firefox"), ("gimp", "GNU Image"), ("térm", "terminal")] {
            assert_eq!(ratio(a, b), ratio(b, a));
        }
    }

    #[test]
    fn matches_reference_values() {
        // 2 * 4 / (4 + 7)
        assert!((ratio("fire", "firefox") - 72.727_272).abs() < 1e-4);
        // lewenstein vs levenshtein: common subsequence "leenstein"
        assert!((ratio("lewenstein", "levenshtein") - 200.0 * 9.0 / 21.0).abs() < 1e-9);
    }

    #[test]
    fn only_equal_strings_reach_100() {
        assert!(ratio("code", "coder") < 100.0);
        assert!(ratio("ab", "ba") < 100.0);
    }
}
