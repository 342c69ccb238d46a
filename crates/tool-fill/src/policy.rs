use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::similarity::DEFAULT_SIMILARITY_THRESHOLD;

/// Families whose existing answers yield to the profile when they disagree.
pub const OVERRIDE_FAMILIES: &[&str] = &[
    "demographics.",
    "work_auth.",
    "education.",
    "address.country",
];

/// Families a lone checkbox may be toggled for.
pub const CHECKBOX_FAMILIES: &[&str] = &[
    "work_auth.",
    "demographics.veteran_status",
    "demographics.disability_status",
];

fn in_families(path: &str, families: &[&str]) -> bool {
    families.iter().any(|family| {
        if family.ends_with('.') {
            path.starts_with(family)
        } else {
            path == *family
        }
    })
}

pub fn override_eligible(path: &str) -> bool {
    in_families(path, OVERRIDE_FAMILIES)
}

pub fn checkbox_eligible(path: &str) -> bool {
    in_families(path, CHECKBOX_FAMILIES)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FillPolicyView {
    pub similarity_threshold: u32,
    pub poll: PollSchedule,
}

impl Default for FillPolicyView {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            poll: PollSchedule::default(),
        }
    }
}

/// Upper bound on poll attempts whatever the configuration asks for.
pub const MAX_POLL_ATTEMPTS: u32 = 32;

/// Bounded backoff for search-and-pick option lists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollSchedule {
    pub attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub max_total_ms: u64,
}

impl PollSchedule {
    /// Pause before each attempt; never exceeds `attempts` entries (capped
    /// at [`MAX_POLL_ATTEMPTS`]) or `max_total_ms` in sum.
    pub fn delays(&self) -> Vec<Duration> {
        let mut out = Vec::new();
        let mut delay = self.initial_delay_ms as f64;
        let mut total = 0u64;
        for _ in 0..self.attempts.min(MAX_POLL_ATTEMPTS) {
            let step = (delay.round() as u64).min(self.max_delay_ms);
            if total + step > self.max_total_ms {
                break;
            }
            total += step;
            out.push(Duration::from_millis(step));
            delay *= self.backoff_factor.max(1.0);
        }
        out
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay_ms: 80,
            backoff_factor: 1.4,
            max_delay_ms: 230,
            max_total_ms: 1200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_backs_off_and_caps() {
        let delays: Vec<u64> = PollSchedule::default()
            .delays()
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![80, 112, 157, 220, 230]);
    }

    #[test]
    fn total_budget_truncates_schedule() {
        let schedule = PollSchedule {
            attempts: 10,
            max_total_ms: 300,
            ..PollSchedule::default()
        };
        let total: u128 = schedule.delays().iter().map(Duration::as_millis).sum();
        assert!(total <= 300);
        assert_eq!(schedule.delays().len(), 2);
    }

    #[test]
    fn configured_attempts_are_capped() {
        let schedule = PollSchedule {
            attempts: u32::MAX,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            ..PollSchedule::default()
        };
        assert_eq!(schedule.delays().len(), MAX_POLL_ATTEMPTS as usize);

        let schedule = PollSchedule {
            attempts: u32::MAX,
            ..PollSchedule::default()
        };
        let total: u128 = schedule.delays().iter().map(Duration::as_millis).sum();
        assert!(total <= 1200);
    }

    #[test]
    fn family_membership() {
        assert!(override_eligible("address.country"));
        assert!(!override_eligible("address.city"));
        assert!(override_eligible("education.school"));
        assert!(checkbox_eligible("work_auth.requires_sponsorship"));
        assert!(checkbox_eligible("demographics.veteran_status"));
        assert!(!checkbox_eligible("demographics.gender"));
    }
}
