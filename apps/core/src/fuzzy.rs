use crate::normalizer::NormalizedText;

/// A successful match: the relevance score and the matched code-point
/// positions in the candidate's normalized sequence, for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub score: i64,
    pub positions: Vec<usize>,
}

/// Scores candidates against one normalized query. Holds no mutable state, so
/// one scorer can be shared across provider threads for the whole turn.
#[derive(Debug, Clone)]
pub struct FuzzyScorer {
    query: Vec<char>,
}

const CONTIGUOUS_BASE: i64 = 10_000;
const SUBSEQUENCE_BASE: i64 = 5_000;
const WHOLE_MATCH_BONUS: i64 = 2_000;
const PREFIX_BONUS: i64 = 400;
const WORD_START_BONUS: i64 = 200;
const ADJACENCY_BONUS: i64 = 10;
const SEPARATOR_BONUS: i64 = 12;
const GAP_PENALTY: i64 = 6;

impl FuzzyScorer {
    pub fn new(query: &NormalizedText) -> Self {
        Self {
            query: query.code_points().to_vec(),
        }
    }

    pub fn query_is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Matches the query against one candidate field. The empty query matches
    /// everything at a neutral baseline (browse mode); otherwise every query
    /// code point must appear in the candidate in order or the field does not
    /// match at all.
    pub fn score(&self, candidate: &NormalizedText) -> Option<MatchInfo> {
        if self.query.is_empty() {
            return Some(MatchInfo {
                score: 0,
                positions: Vec::new(),
            });
        }

        let haystack = candidate.code_points();
        if haystack.is_empty() || self.query.len() > haystack.len() {
            return None;
        }

        if let Some(start) = find_contiguous(haystack, &self.query) {
            return Some(self.score_contiguous(haystack, start));
        }

        let positions = subsequence_positions(haystack, &self.query)?;
        Some(self.score_subsequence(haystack, positions))
    }

    fn score_contiguous(&self, haystack: &[char], start: usize) -> MatchInfo {
        let whole_bonus = if self.query.len() == haystack.len() {
            WHOLE_MATCH_BONUS
        } else {
            0
        };
        let prefix_bonus = if start == 0 { PREFIX_BONUS } else { 0 };
        let word_bonus = if starts_word(haystack, start) {
            WORD_START_BONUS
        } else {
            0
        };
        let compact_bonus = (self.query.len() as i64) * 40;
        let position_penalty = start as i64;
        let length_penalty = (haystack.len() - self.query.len()) as i64;

        MatchInfo {
            score: CONTIGUOUS_BASE + whole_bonus + prefix_bonus + word_bonus + compact_bonus
                - position_penalty
                - length_penalty,
            positions: (start..start + self.query.len()).collect(),
        }
    }

    fn score_subsequence(&self, haystack: &[char], positions: Vec<usize>) -> MatchInfo {
        let start_penalty = positions[0] as i64;
        let mut adjacency_bonus = 0;
        let mut gap_penalty = 0;
        for pair in positions.windows(2) {
            let gap = (pair[1] - pair[0] - 1) as i64;
            if gap == 0 {
                adjacency_bonus += ADJACENCY_BONUS;
            } else {
                gap_penalty += gap * GAP_PENALTY;
            }
        }
        let separator_bonus: i64 = positions
            .iter()
            .filter(|&&position| starts_word(haystack, position))
            .count() as i64
            * SEPARATOR_BONUS;
        let length_penalty = (haystack.len() - self.query.len()) as i64;

        MatchInfo {
            score: SUBSEQUENCE_BASE + (self.query.len() as i64) * 30 + adjacency_bonus
                + separator_bonus
                - gap_penalty
                - start_penalty
                - length_penalty,
            positions,
        }
    }
}

fn is_separator(ch: char) -> bool {
    !ch.is_alphanumeric()
}

fn starts_word(haystack: &[char], position: usize) -> bool {
    position == 0 || is_separator(haystack[position - 1])
}

fn find_contiguous(haystack: &[char], needle: &[char]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Greedy in-order scan, preferring word-boundary occurrences of each query
/// code point over the first raw occurrence so "wt" highlights the initials
/// of "Windows Terminal". The earliest occurrence is abandoned for a word
/// start only when the rest of the needle still fits afterwards, so the
/// preference can never turn a matchable candidate into a no-match.
fn subsequence_positions(haystack: &[char], needle: &[char]) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(needle.len());
    let mut next_start = 0;

    for (needle_index, &needle_char) in needle.iter().enumerate() {
        let earliest = find_from(haystack, needle_char, next_start)?;
        let mut chosen = earliest;

        if !starts_word(haystack, earliest) {
            // Look a bounded distance ahead for a word-start occurrence;
            // scanning the whole field for every character would make long
            // candidates quadratic.
            let mut scan = earliest + 1;
            while let Some(candidate) = find_from(haystack, needle_char, scan) {
                if candidate - earliest > 16 {
                    break;
                }
                if starts_word(haystack, candidate) {
                    if can_match_from(haystack, &needle[needle_index + 1..], candidate + 1) {
                        chosen = candidate;
                    }
                    break;
                }
                scan = candidate + 1;
            }
        }

        positions.push(chosen);
        next_start = chosen + 1;
    }

    Some(positions)
}

fn find_from(haystack: &[char], needle_char: char, start: usize) -> Option<usize> {
    haystack[start..]
        .iter()
        .position(|&hay_char| hay_char == needle_char)
        .map(|offset| start + offset)
}

fn can_match_from(haystack: &[char], needle: &[char], mut start: usize) -> bool {
    for &needle_char in needle {
        match find_from(haystack, needle_char, start) {
            Some(position) => start = position + 1,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::FuzzyScorer;
    use crate::normalizer::normalize;

    fn score(query: &str, candidate: &str) -> Option<i64> {
        FuzzyScorer::new(&normalize(query))
            .score(&normalize(candidate))
            .map(|info| info.score)
    }

    #[test]
    fn empty_query_matches_everything_at_baseline() {
        let scorer = FuzzyScorer::new(&normalize(""));
        for candidate in ["Camera", "Calculator", "Settings", ""] {
            let info = scorer.score(&normalize(candidate)).expect("browse match");
            assert_eq!(info.score, 0);
            assert!(info.positions.is_empty());
        }
    }

    #[test]
    fn non_subsequence_does_not_match() {
        assert_eq!(score("ca", "Settings"), None);
        assert_eq!(score("xyz", "Camera"), None);
        assert_eq!(score("cameraa", "Camera"), None);
    }

    #[test]
    fn prefix_and_word_start_outrank_mid_word() {
        let camera = score("ca", "Camera").expect("prefix match");
        let calculator = score("ca", "Calculator").expect("prefix match");
        let vocal = score("ca", "Vocal Remover").expect("mid-word match");
        assert!(camera > vocal);
        assert!(calculator > vocal);
    }

    #[test]
    fn whole_match_beats_prefix_match() {
        let exact = score("camera", "Camera").expect("whole match");
        let prefix = score("camera", "Camera Plus").expect("prefix match");
        assert!(exact > prefix);
    }

    #[test]
    fn contiguity_outranks_scattered_subsequence() {
        let contiguous = score("cam", "Camera").expect("contiguous");
        let scattered = score("cmr", "Camera").expect("scattered");
        assert!(contiguous > scattered);
    }

    #[test]
    fn shorter_candidate_wins_equal_match_quality() {
        let short = score("code", "Code").expect("match");
        let long = score("code", "Code Companion Tools").expect("match");
        assert!(short > long);
    }

    #[test]
    fn word_boundary_subsequence_highlights_initials() {
        let scorer = FuzzyScorer::new(&normalize("wt"));
        let info = scorer
            .score(&normalize("Windows Terminal"))
            .expect("initials match");
        assert_eq!(info.positions, vec![0, 8]);
    }

    #[test]
    fn word_start_preference_never_loses_a_match() {
        // The word-start 'a' of "Academy" has no 'l' after it; the scan must
        // stay with the earlier 'a' of "Vocal" to keep the match alive.
        let scorer = FuzzyScorer::new(&normalize("calm"));
        let info = scorer
            .score(&normalize("Vocal Music Academy"))
            .expect("in-order match exists");
        assert_eq!(info.positions, vec![2, 3, 4, 6]);
    }

    #[test]
    fn diacritic_query_matches_plain_candidate() {
        assert!(score("café", "Cafe Finder").is_some());
        assert!(score("cafe", "Café Finder").is_some());
    }

    #[test]
    fn positions_cover_the_contiguous_run() {
        let scorer = FuzzyScorer::new(&normalize("lcu"));
        let info = scorer.score(&normalize("Calculator")).expect("match");
        assert_eq!(info.positions, vec![2, 3, 4]);
    }
}
