//! Keyword heuristic over reported symptoms.
//!
//! Clinical keywords in the free-text description or the symptom checklist
//! can decide a request before the statistical model is consulted.

use crate::features::Signals;
use crate::schemas::Decision;
use std::collections::HashSet;

/// Motor and speech symptoms that indicate Parkinson's disease.
pub const KEYWORDS: [&str; 8] = [
    "tremor",
    "rigidity",
    "bradykinesia",
    "slowness",
    "masked face",
    "postural instability",
    "shuffling",
    "speech",
];

/// Severity levels that count as a reported symptom.
pub const SEVERITY_LEVELS: [&str; 3] = ["mild", "moderate", "severe"];

/// Checklist hits needed to fire without a severity.
pub const STRONG_LIST_THRESHOLD: usize = 2;

const BASE_PROBABILITY: f64 = 0.65;
const PER_MATCH_STEP: f64 = 0.1;
const MAX_COUNTED_MATCHES: usize = 2;
const MAX_PROBABILITY: f64 = 0.95;

/// Keyword counts for one set of signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchReport {
    /// Keywords found as a substring of the text or an exact checklist entry
    pub match_count: usize,
    /// Distinct checklist entries that are exactly a keyword
    pub strong_list_match: usize,
    /// Severity is one of mild/moderate/severe
    pub has_severity: bool,
}

impl MatchReport {
    pub fn from_signals(signals: &Signals) -> Self {
        let match_count = KEYWORDS
            .iter()
            .filter(|kw| {
                signals.symptom_text.contains(*kw)
                    || signals.common_symptoms.iter().any(|s| s == *kw)
            })
            .count();

        let strong_list_match = signals
            .common_symptoms
            .iter()
            .filter(|s| KEYWORDS.contains(&s.as_str()))
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .len();

        Self {
            match_count,
            strong_list_match,
            has_severity: SEVERITY_LEVELS.contains(&signals.severity.as_str()),
        }
    }

    /// Keyword evidence together with a reported severity
    pub fn severity_path(&self) -> bool {
        self.match_count >= 1 && self.has_severity
    }

    /// Enough checklist hits on their own
    pub fn list_path(&self) -> bool {
        self.strong_list_match >= STRONG_LIST_THRESHOLD
    }

    pub fn fires(&self) -> bool {
        self.severity_path() || self.list_path()
    }

    /// Matches that feed the probability formula.
    ///
    /// Only the severity path contributes; a checklist-only firing sits at
    /// the base probability.
    pub fn effective_matches(&self) -> usize {
        if self.severity_path() {
            self.match_count
        } else {
            0
        }
    }
}

/// Probability assigned when the heuristic fires with `matches` keyword hits.
pub fn heuristic_probability(matches: usize) -> f64 {
    (BASE_PROBABILITY + PER_MATCH_STEP * matches.min(MAX_COUNTED_MATCHES) as f64)
        .min(MAX_PROBABILITY)
}

/// Deterministic keyword classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Return a positive decision when the heuristic fires, otherwise None.
    pub fn evaluate(&self, signals: &Signals) -> Option<Decision> {
        let report = MatchReport::from_signals(signals);
        if !report.fires() {
            return None;
        }
        Some(Decision::new(
            1,
            heuristic_probability(report.effective_matches()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn signals(text: &str, severity: &str, common: &[&str]) -> Signals {
        Signals {
            symptom_text: text.to_string(),
            severity: severity.to_string(),
            common_symptoms: common.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_probability_formula() {
        assert_eq!(heuristic_probability(0), 0.65);
        assert_eq!(heuristic_probability(1), 0.75);
        assert_relative_eq!(heuristic_probability(2), 0.85, epsilon = 1e-9);
        // capped at two counted matches
        assert_relative_eq!(heuristic_probability(7), 0.85, epsilon = 1e-9);
    }

    #[test]
    fn test_single_text_match_with_severity() {
        let decision = HeuristicClassifier::new()
            .evaluate(&signals("slight tremor in left hand", "moderate", &[]))
            .unwrap();
        assert_eq!(decision.label, 1);
        assert_eq!(decision.probability, 0.75);
    }

    #[test]
    fn test_two_matches_with_severity() {
        let decision = HeuristicClassifier::new()
            .evaluate(&signals("tremor and shuffling gait", "severe", &[]))
            .unwrap();
        assert_relative_eq!(decision.probability, 0.85, epsilon = 1e-9);
    }

    #[test]
    fn test_text_match_without_severity_does_not_fire() {
        assert!(HeuristicClassifier::new()
            .evaluate(&signals("tremor", "", &[]))
            .is_none());
        assert!(HeuristicClassifier::new()
            .evaluate(&signals("tremor", "extreme", &[]))
            .is_none());
    }

    #[test]
    fn test_severity_without_keywords_does_not_fire() {
        assert!(HeuristicClassifier::new()
            .evaluate(&signals("headache", "severe", &["fatigue"]))
            .is_none());
    }

    #[test]
    fn test_list_only_fires_at_base_probability() {
        let decision = HeuristicClassifier::new()
            .evaluate(&signals("", "", &["tremor", "rigidity"]))
            .unwrap();
        assert_eq!(decision.label, 1);
        assert_eq!(decision.probability, 0.65);
    }

    #[test]
    fn test_strong_list_counts_distinct_entries() {
        let report = MatchReport::from_signals(&signals("", "", &["tremor", "tremor"]));
        assert_eq!(report.strong_list_match, 1);
        assert!(!report.fires());
    }

    #[test]
    fn test_strong_list_is_exact_match_only() {
        let report = MatchReport::from_signals(&signals(
            "",
            "",
            &["resting tremor", "rigidity of arm"],
        ));
        assert_eq!(report.strong_list_match, 0);
        assert_eq!(report.match_count, 0);
    }

    #[test]
    fn test_list_entry_counts_toward_match_count() {
        let report = MatchReport::from_signals(&signals("", "mild", &["speech"]));
        assert_eq!(report.match_count, 1);
        assert!(report.severity_path());

        let decision = HeuristicClassifier::new()
            .evaluate(&signals("", "mild", &["speech"]))
            .unwrap();
        assert_eq!(decision.probability, 0.75);
    }

    #[test]
    fn test_keyword_counted_once_across_sources() {
        let report = MatchReport::from_signals(&signals("tremor", "mild", &["tremor"]));
        assert_eq!(report.match_count, 1);
    }

    #[test]
    fn test_multi_word_keyword_substring() {
        let report = MatchReport::from_signals(&signals(
            "patient shows masked face and postural instability",
            "moderate",
            &[],
        ));
        assert_eq!(report.match_count, 2);
    }
}
