//! "Did you mean" suggestions for unresolved names
//!
//! Candidates are ranked by Damerau-Levenshtein distance (optimal string
//! alignment variant) and accepted only within a threshold that grows with the
//! length of the misspelled input.

/// Edit distance counting insertions, deletions, substitutions and adjacent
/// transpositions, each at cost 1.
pub fn distance(from: &str, to: &str) -> usize {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();

    if from.is_empty() {
        return to.len();
    }
    if to.is_empty() {
        return from.len();
    }

    let width = to.len() + 1;
    let mut table = vec![0usize; (from.len() + 1) * width];
    let at = |i: usize, j: usize| i * width + j;

    for i in 0..=from.len() {
        table[at(i, 0)] = i;
    }
    for j in 0..=to.len() {
        table[at(0, j)] = j;
    }

    for i in 1..=from.len() {
        for j in 1..=to.len() {
            let cost = usize::from(from[i - 1] != to[j - 1]);
            let mut best = (table[at(i - 1, j)] + 1)
                .min(table[at(i, j - 1)] + 1)
                .min(table[at(i - 1, j - 1)] + cost);

            if i > 1 && j > 1 && from[i - 1] == to[j - 2] && from[i - 2] == to[j - 1] {
                best = best.min(table[at(i - 2, j - 2)] + 1);
            }
            table[at(i, j)] = best;
        }
    }

    table[at(from.len(), to.len())]
}

/// Largest distance still considered a plausible typo for an input of
/// `len` characters.
pub fn threshold(len: usize) -> usize {
    match len {
        0..=4 => 1,
        5..=8 => 2,
        9..=12 => 3,
        _ => len / 4 + 1,
    }
}

/// Candidates closest to `input`, keeping every tie at the minimum distance.
///
/// The result is sorted and free of duplicates.
pub fn suggestions<I, S>(input: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let limit = threshold(input.chars().count());
    let mut best = usize::MAX;
    let mut kept: Vec<String> = Vec::new();

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let d = distance(input, candidate);
        if d > limit {
            continue;
        }
        if d < best {
            best = d;
            kept.clear();
            kept.push(candidate.to_string());
        } else if d == best {
            kept.push(candidate.to_string());
        }
    }

    kept.sort();
    kept.dedup();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let cases = [
            ("kitten", "sitting", 3),
            ("", "abc", 3),
            ("abc", "", 3),
            ("abc", "abc", 0),
            ("abcde", "acbde", 1),
            ("abc", "abdc", 1),
            ("abc", "ab", 1),
            ("abc", "abd", 1),
            ("flaw", "lawn", 2),
            ("intention", "execution", 5),
        ];
        for (from, to, want) in cases {
            assert_eq!(distance(from, to), want, "distance({:?}, {:?})", from, to);
        }
    }

    #[test]
    fn test_distance_counts_characters_not_bytes() {
        assert_eq!(distance("naïve", "naive"), 1);
    }

    #[test]
    fn test_threshold_scales_with_length() {
        assert_eq!(threshold(0), 1);
        assert_eq!(threshold(4), 1);
        assert_eq!(threshold(5), 2);
        assert_eq!(threshold(8), 2);
        assert_eq!(threshold(12), 3);
        assert_eq!(threshold(16), 5);
    }

    #[test]
    fn test_suggestions() {
        let cases: [(&str, &[&str], &[&str]); 6] = [
            ("", &["apple", "banana", "orange"], &[]),
            ("red", &["red1", "blue1", "red2"], &["red1", "red2"]),
            ("flawless", &["lawless", "lawn", "flawed"], &["lawless"]),
            (
                "interface",
                &["inheritance", "internship", "interpolate", "interstate"],
                &["interstate"],
            ),
            (
                "instrumentations",
                &["interpretation", "instrumentation", "initialization", "imperative"],
                &["instrumentation"],
            ),
            ("b", &["xyz"], &[]),
        ];
        for (input, candidates, want) in cases {
            let got = suggestions(input, candidates.iter());
            assert_eq!(got, want, "suggestions({:?})", input);
        }
    }

    #[test]
    fn test_suggestions_replace_kept_set_on_closer_match() {
        let got = suggestions("cat", ["cats", "bat", "cat"]);
        assert_eq!(got, vec!["cat".to_string()]);
    }

    #[test]
    fn test_suggestions_dedupe() {
        let got = suggestions("nme", ["name", "name", "none"]);
        assert_eq!(got, vec!["name".to_string()]);
    }
}
