//! Option/candidate similarity on a 0..=1000 scale.

use std::collections::HashSet;

use perceiver_form::contains_phrase;

pub const MAX_SIMILARITY: u32 = 1000;
/// Default minimum score for activating an option.
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 560;

const NEGATION_CUES: &[&str] = &["no", "not", "never", "don", "doesn", "cannot", "unable"];
const MAX_RANK_PENALTY: usize = 9;

pub(crate) fn is_negated(text: &str) -> bool {
    text.split(' ').any(|token| NEGATION_CUES.contains(&token))
}

fn ratio(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (300 * part / whole) as u32
}

fn dice(a: &str, b: &str) -> u32 {
    let left: HashSet<&str> = a.split(' ').collect();
    let right: HashSet<&str> = b.split(' ').collect();
    let total = left.len() + right.len();
    if total == 0 {
        return 0;
    }
    let shared = left.intersection(&right).count();
    (700 * 2 * shared / total) as u32
}

/// Similarity of two normalized strings. A pair whose negation cues
/// disagree never matches.
pub fn similarity(option: &str, candidate: &str) -> u32 {
    if option.is_empty() || candidate.is_empty() {
        return 0;
    }
    if option == candidate {
        return MAX_SIMILARITY;
    }
    if is_negated(option) != is_negated(candidate) {
        return 0;
    }
    if contains_phrase(option, candidate) {
        return 600 + ratio(candidate.len(), option.len());
    }
    if contains_phrase(candidate, option) {
        return 450 + ratio(option.len(), candidate.len());
    }
    dice(option, candidate)
}

/// Best similarity of `option` against an ordered candidate list; later
/// candidates lose a point per rank so canonical phrasings win ties.
pub fn score_option(option: &str, candidates: &[String]) -> u32 {
    candidates
        .iter()
        .enumerate()
        .map(|(rank, candidate)| {
            let raw = similarity(option, candidate);
            if raw == 0 {
                0
            } else {
                raw.saturating_sub(rank.min(MAX_RANK_PENALTY) as u32)
            }
        })
        .max()
        .unwrap_or(0)
}
