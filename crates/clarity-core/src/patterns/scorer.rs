//! Trigger detection and match scoring.
//!
//! A trigger fires on the first of three increasingly loose tests:
//! exact substring, whole-word match (single-word triggers), then
//! Levenshtein distance <= 2 against any narrative token (triggers of 4 to
//! 10 characters).

use regex::Regex;
use std::sync::Arc;

use crate::types::{Pattern, PatternMatch};

/// Shortest trigger eligible for typo tolerance, in characters.
pub const FUZZY_MIN_LEN: usize = 4;
/// Longest trigger eligible for typo tolerance, in characters.
pub const FUZZY_MAX_LEN: usize = 10;
/// Largest edit distance still counted as a typo.
pub const MAX_EDIT_DISTANCE: usize = 2;

// Scores are kept in tenths so threshold comparisons see exact values.
const BASE_TENTHS: usize = 5;
const MAX_TENTHS: usize = 10;

/// Score a lowercased narrative against one pattern.
///
/// Returns `None` when no trigger fires.
pub fn score_pattern(narrative_lower: &str, pattern: &Arc<Pattern>) -> Option<PatternMatch> {
    let matched_triggers: Vec<String> = pattern
        .triggers
        .iter()
        .filter(|trigger| trigger_fires(narrative_lower, trigger))
        .cloned()
        .collect();

    if matched_triggers.is_empty() {
        return None;
    }

    Some(PatternMatch {
        pattern: Arc::clone(pattern),
        score: score_for(matched_triggers.len()),
        matched_triggers,
    })
}

/// Score for `fired` firing triggers: 0.5 for one, +0.1 per extra, capped
/// at 1.0. Zero fired triggers scores 0.
pub fn score_for(fired: usize) -> f64 {
    if fired == 0 {
        return 0.0;
    }
    let tenths = (BASE_TENTHS + fired - 1).min(MAX_TENTHS);
    tenths as f64 / 10.0
}

/// Whether `trigger` fires against a lowercased narrative.
pub fn trigger_fires(narrative_lower: &str, trigger: &str) -> bool {
    if trigger.is_empty() {
        return false;
    }

    if narrative_lower.contains(trigger) {
        return true;
    }

    if !trigger.contains(' ') && matches_whole_word(narrative_lower, trigger) {
        return true;
    }

    let len = trigger.chars().count();
    if (FUZZY_MIN_LEN..=FUZZY_MAX_LEN).contains(&len) {
        return narrative_lower
            .split_whitespace()
            .any(|word| strsim::levenshtein(word, trigger) <= MAX_EDIT_DISTANCE);
    }

    false
}

fn matches_whole_word(text: &str, word: &str) -> bool {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::warn!(trigger = word, error = %e, "Could not build word matcher");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(triggers: &[&str]) -> Arc<Pattern> {
        Arc::new(Pattern::new("Test", triggers.iter().copied()))
    }

    #[test]
    fn test_exact_substring_fires() {
        assert!(trigger_fires("i feel worthless today", "worthless"));
        assert!(trigger_fires("i think nobody likes me", "nobody likes me"));
    }

    #[test]
    fn test_typo_within_two_edits_fires() {
        // one deletion
        assert!(trigger_fires("i feel worthles", "worthless"));
        // two substitutions
        assert!(trigger_fires("total faelere", "failure"));
    }

    #[test]
    fn test_typo_beyond_two_edits_does_not_fire() {
        assert!(!trigger_fires("i feel wrthls", "worthless"));
    }

    #[test]
    fn test_fuzzy_length_window() {
        // 3 chars: too short for typo tolerance
        assert!(!trigger_fires("i am bed", "bad"));
        // 11 chars: too long for typo tolerance
        assert!(!trigger_fires("so embarassed", "embarrassed"));
        assert!(trigger_fires("so embarass", "embarrass"));
    }

    #[test]
    fn test_multi_word_trigger_skips_word_boundary_but_not_fuzzy() {
        // "give up" is 7 chars; the token "giveup" is one edit away
        assert!(trigger_fires("i want to giveup", "give up"));
        assert!(!trigger_fires("we never meet", "nobody likes me"));
    }

    #[test]
    fn test_regex_metacharacters_are_escaped() {
        assert!(!trigger_fires("abc", "a.c"));
        assert!(trigger_fires("is it c++ again", "c++"));
    }

    #[test]
    fn test_empty_trigger_never_fires() {
        assert!(!trigger_fires("anything", ""));
    }

    #[test]
    fn test_no_firing_triggers_is_none() {
        assert!(score_pattern("the weather is nice", &pattern(&["worthless"])).is_none());
    }

    #[test]
    fn test_score_floor_and_increments() {
        assert_eq!(score_for(0), 0.0);
        assert_eq!(score_for(1), 0.5);
        assert_eq!(score_for(2), 0.6);
        assert_eq!(score_for(3), 0.7);
        assert_eq!(score_for(6), 1.0);
        assert_eq!(score_for(40), 1.0);
    }

    #[test]
    fn test_score_is_monotonic_and_bounded() {
        for k in 1..20 {
            let current = score_for(k);
            let next = score_for(k + 1);
            assert!((0.5..=1.0).contains(&current));
            assert!(next >= current);
            if current < 1.0 {
                assert!((next - current - 0.1).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_matched_triggers_keep_pattern_order() {
        let p = pattern(&["nobody likes me", "alone", "worthless"]);
        let m = score_pattern("worthless and nobody likes me", &p).unwrap();
        assert_eq!(m.matched_triggers, vec!["nobody likes me", "worthless"]);
        assert_eq!(m.score, 0.6);
        assert!(Arc::ptr_eq(&m.pattern, &p));
    }

    #[test]
    fn test_rejection_spiral_example() {
        let p = pattern(&["worthless", "nobody likes me"]);
        let m = score_pattern("i feel worthless and nobody likes me", &p).unwrap();
        assert_eq!(m.matched_triggers.len(), 2);
        assert!((m.score - 0.6).abs() < 1e-9);
    }
}
