use crate::identity::clean_name;
use strsim::jaro_winkler;

/// Suggests the closest known country for a name that failed to resolve.
///
/// Only used to enrich error messages. Reconciliation itself joins on exact
/// canonical keys.
pub struct FuzzyMatcher {
    /// Similarity threshold (0.0-1.0) for considering two strings as matches
    pub similarity_threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
        }
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            similarity_threshold: threshold,
        }
    }

    /// Lowercase, drop punctuation, collapse whitespace.
    pub fn normalize_string(&self, s: &str) -> String {
        let stripped: String = s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        clean_name(&stripped)
    }

    /// Jaro-Winkler similarity of the normalized strings, with a small bonus
    /// when one contains the other ("Korea" vs "South Korea").
    pub fn similarity(&self, s1: &str, s2: &str) -> f64 {
        let norm1 = self.normalize_string(s1);
        let norm2 = self.normalize_string(s2);
        if norm1.is_empty() || norm2.is_empty() {
            return 0.0;
        }

        let jw_score = jaro_winkler(&norm1, &norm2);
        let substring_bonus = if norm1.contains(&norm2) || norm2.contains(&norm1) {
            let len_diff = (norm1.len() as f64 - norm2.len() as f64).abs();
            let max_len = norm1.len().max(norm2.len()) as f64;
            (1.0 - (len_diff / max_len)) * 0.1
        } else {
            0.0
        };

        (jw_score + substring_bonus).min(1.0)
    }

    pub fn is_match(&self, s1: &str, s2: &str) -> bool {
        self.similarity(s1, s2) >= self.similarity_threshold
    }

    /// Best candidate at or above the threshold. Ties keep the earliest candidate.
    pub fn find_best_match<'a>(
        &self,
        target: &str,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Option<(String, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for candidate in candidates {
            let score = self.similarity(target, candidate);
            if score < self.similarity_threshold {
                continue;
            }
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(name, score)| (name.to_string(), score))
    }
}
