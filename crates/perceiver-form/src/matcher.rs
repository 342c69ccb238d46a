use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::normalize::contains_phrase;
use crate::rules::{default_rules, FieldRule};
use crate::signals::{Channel, SignalBundle};

/// Minimum winning score for a confident match.
pub const MIN_CONFIDENT_SCORE: u32 = 5;
/// Minimum lead the winner needs over the runner-up.
pub const MIN_AMBIGUITY_GAP: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchThresholds {
    pub min_confidence: u32,
    pub min_gap: u32,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENT_SCORE,
            min_gap: MIN_AMBIGUITY_GAP,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub path: String,
    pub score: u32,
}

/// Why the matcher declined to pick a rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoMatch {
    NoCandidates,
    LowConfidence { best: MatchResult },
    Ambiguous {
        best: MatchResult,
        runner_up: MatchResult,
    },
}

/// Scores signal bundles against a rule table.
#[derive(Clone, Debug)]
pub struct RuleMatcher {
    rules: Vec<FieldRule>,
    thresholds: MatchThresholds,
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::new(default_rules(), MatchThresholds::default())
    }
}

impl RuleMatcher {
    pub fn new(rules: Vec<FieldRule>, thresholds: MatchThresholds) -> Self {
        Self { rules, thresholds }
    }

    pub fn with_thresholds(thresholds: MatchThresholds) -> Self {
        Self::new(default_rules(), thresholds)
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Sum of channel weights over every keyword found in that channel.
    pub fn score_rule(rule: &FieldRule, signals: &SignalBundle) -> u32 {
        rule.keywords
            .iter()
            .map(|keyword| {
                Channel::ALL
                    .iter()
                    .filter(|channel| contains_phrase(signals.channel(**channel), keyword))
                    .map(|channel| channel.weight())
                    .sum::<u32>()
            })
            .sum()
    }

    /// Positive-scoring rules, best first; equal scores keep table order.
    pub fn ranked(&self, signals: &SignalBundle) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = self
            .rules
            .iter()
            .map(|rule| MatchResult {
                path: rule.path.clone(),
                score: Self::score_rule(rule, signals),
            })
            .filter(|result| result.score > 0)
            .collect();
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }

    pub fn evaluate(&self, signals: &SignalBundle) -> Result<MatchResult, NoMatch> {
        let mut ranked = self.ranked(signals).into_iter();
        let Some(best) = ranked.next() else {
            return Err(NoMatch::NoCandidates);
        };
        if best.score < self.thresholds.min_confidence {
            return Err(NoMatch::LowConfidence { best });
        }
        if let Some(runner_up) = ranked.next() {
            if best.score - runner_up.score < self.thresholds.min_gap {
                trace!(best = %best.path, runner_up = %runner_up.path, "ambiguous match");
                return Err(NoMatch::Ambiguous { best, runner_up });
            }
        }
        Ok(best)
    }

    pub fn best_match(&self, signals: &SignalBundle) -> Option<MatchResult> {
        self.evaluate(signals).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> SignalBundle {
        SignalBundle {
            label: text.to_string(),
            ..SignalBundle::default()
        }
    }

    #[test]
    fn every_keyword_resolves_to_its_own_rule() {
        let matcher = RuleMatcher::default();
        for rule in matcher.rules() {
            for keyword in &rule.keywords {
                let result = matcher
                    .best_match(&label(keyword))
                    .unwrap_or_else(|| panic!("{keyword:?} did not match"));
                assert_eq!(result.path, rule.path, "keyword {keyword:?}");
                assert!(result.score >= MIN_CONFIDENT_SCORE);
            }
        }
    }

    #[test]
    fn equal_scores_are_ambiguous() {
        let matcher = RuleMatcher::default();
        let err = matcher.evaluate(&label("city state")).unwrap_err();
        match err {
            NoMatch::Ambiguous { best, runner_up } => {
                assert_eq!(best.score, runner_up.score);
                assert_eq!(best.path, "address.city");
                assert_eq!(runner_up.path, "address.state");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn weak_channels_alone_are_not_confident() {
        let matcher = RuleMatcher::default();
        let signals = SignalBundle {
            id: "email".into(),
            name: "email".into(),
            ..SignalBundle::default()
        };
        assert_eq!(
            matcher.evaluate(&signals),
            Err(NoMatch::LowConfidence {
                best: MatchResult {
                    path: "identity.email".into(),
                    score: 3
                }
            })
        );
    }

    #[test]
    fn channel_weights_accumulate() {
        let signals = SignalBundle {
            label: "email address".into(),
            autocomplete: "email".into(),
            ..SignalBundle::default()
        };
        let matcher = RuleMatcher::default();
        let result = matcher.best_match(&signals).unwrap();
        assert_eq!(result.path, "identity.email");
        // "email" in label and autocomplete, "email address" in label
        assert_eq!(result.score, 5 + 2 + 5);
    }

    #[test]
    fn no_keywords_means_no_candidates() {
        let matcher = RuleMatcher::default();
        assert_eq!(
            matcher.evaluate(&label("favourite colour")),
            Err(NoMatch::NoCandidates)
        );
    }

    #[test]
    fn thresholds_are_overridable() {
        let strict = RuleMatcher::with_thresholds(MatchThresholds {
            min_confidence: 20,
            min_gap: 2,
        });
        assert!(strict.best_match(&label("email")).is_none());
    }
}
