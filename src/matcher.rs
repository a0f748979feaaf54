//! Approximate matching of normalized headers against canonical fields.
//!
//! Similarity is the sequence-matching ratio `2 * M / T`, where `M` is the
//! number of characters kept by an optimal character-level diff and `T` is
//! the combined length of both strings. Identical strings score `1.0`,
//! strings with nothing in common score `0.0`.

use similar::TextDiff;

/// Minimum similarity a candidate needs to be accepted.
pub const FUZZY_THRESHOLD: f32 = 0.78;

#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch<'a> {
    pub candidate: &'a str,
    pub score: f32,
}

pub fn similarity(left: &str, right: &str) -> f32 {
    TextDiff::from_chars(left, right).ratio()
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f32,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            threshold: FUZZY_THRESHOLD,
        }
    }
}

impl FuzzyMatcher {
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns the highest-scoring candidate that reaches the threshold.
    /// Candidates are scanned in order and only a strictly better score
    /// replaces the current best, so ties resolve to the earliest candidate.
    pub fn best_match<'a, I>(&self, needle: &str, candidates: I) -> Option<FuzzyMatch<'a>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<FuzzyMatch<'a>> = None;
        for candidate in candidates {
            let score = similarity(needle, candidate);
            if score < self.threshold {
                continue;
            }
            match &best {
                Some(current) if current.score >= score => {}
                _ => best = Some(FuzzyMatch { candidate, score }),
            }
        }
        best
    }
}
