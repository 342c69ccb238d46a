//! Fill orchestration: one pass over every interactive control of a page.

use std::sync::Arc;

use formfuse_core_types::{NodeId, PassId};
use formfuse_profile::{Profile, ProfileStore};
use parking_lot::Mutex;
use perceiver_form::dom;
use perceiver_form::{
    extract_signals, ignore_reason, infer_from_context, ControlKind, HostDocument,
    IgnoreReason, RuleMatcher,
};
use serde::{Deserialize, Serialize};
use tool_fill::{
    ControlReport, Decision, FillEventsPort, FillRequest, FillTool, FillToolBuilder,
    FillVerdict, GroupLedger, NullEvents, SkipReason,
};
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// Message returned when the profile cannot be read.
pub const PROFILE_UNAVAILABLE: &str = "Unable to read saved profile.";

/// Aggregate outcome of one pass, shaped like the extension's message reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResponse {
    pub ok: bool,
    pub scanned: usize,
    pub matched: usize,
    pub filled: usize,
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FillResponse {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn status_line(&self) -> String {
        if self.ok {
            format!(
                "Filled {} field(s) out of {} scanned.",
                self.filled, self.scanned
            )
        } else {
            self.error
                .clone()
                .unwrap_or_else(|| "Fill failed.".to_string())
        }
    }

    fn record(&mut self, report: &ControlReport) {
        self.scanned += 1;
        if report.filled() {
            self.filled += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Where a control's attribute path came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSource {
    Rules,
    Context,
}

/// Read-only resolution of one control: what the pass would fill it with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ControlPlan {
    pub control: NodeId,
    pub kind: Option<ControlKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<IgnoreReason>,
    pub path: Option<String>,
    pub score: Option<u32>,
    pub source: Option<PathSource>,
}

impl ControlPlan {
    fn skip_reason(&self) -> SkipReason {
        if self.ignored.is_some() {
            SkipReason::Ignored
        } else {
            SkipReason::NoMatch
        }
    }
}

/// Collects every control report of a pass.
#[derive(Debug, Default)]
pub struct CollectingEvents {
    reports: Mutex<Vec<ControlReport>>,
}

impl CollectingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ControlReport> {
        self.reports.lock().clone()
    }

    pub fn take(&self) -> Vec<ControlReport> {
        std::mem::take(&mut *self.reports.lock())
    }
}

impl FillEventsPort for CollectingEvents {
    fn control_finished(&self, report: &ControlReport) {
        self.reports.lock().push(report.clone());
    }
}

pub struct FillEngine {
    matcher: RuleMatcher,
    tool: Arc<dyn FillTool>,
    events: Arc<dyn FillEventsPort>,
}

impl FillEngine {
    pub fn new(matcher: RuleMatcher, tool: Arc<dyn FillTool>) -> Self {
        Self {
            matcher,
            tool,
            events: Arc::new(NullEvents),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let tool = FillToolBuilder::new(config.fill.clone()).build();
        Self::new(RuleMatcher::with_thresholds(config.matcher), tool)
    }

    pub fn with_events(mut self, events: Arc<dyn FillEventsPort>) -> Self {
        self.events = events;
        self
    }

    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }

    /// Signal extraction, rule matching and context inference for one
    /// control. A context inference, when available, overrides the rule
    /// table; structural ignore reasons stop resolution outright.
    pub fn resolve(&self, doc: &dyn HostDocument, control: NodeId) -> ControlPlan {
        let kind = dom::control_kind(doc, control);
        let signals = extract_signals(doc, control);
        let ignored = ignore_reason(doc, control, &signals, self.matcher.rules());
        let mut plan = ControlPlan {
            control,
            kind,
            ignored,
            path: None,
            score: None,
            source: None,
        };
        if ignored.map(IgnoreReason::is_structural).unwrap_or(false) {
            return plan;
        }

        if ignored.is_none() {
            match self.matcher.evaluate(&signals) {
                Ok(best) => {
                    plan.path = Some(best.path);
                    plan.score = Some(best.score);
                    plan.source = Some(PathSource::Rules);
                }
                Err(reason) => debug!(control = %control, ?reason, "rule table declined"),
            }
        }

        if kind.map(ControlKind::benefits_from_context).unwrap_or(false) {
            if let Some(path) = infer_from_context(doc, control) {
                plan.path = Some(path.to_string());
                plan.score = None;
                plan.source = Some(PathSource::Context);
            }
        }
        if plan.path.is_some() {
            plan.ignored = None;
        }
        plan
    }

    /// Resolution of every interactive control, without touching the page.
    pub fn plan(&self, doc: &dyn HostDocument) -> Vec<ControlPlan> {
        dom::interactive_controls(doc)
            .into_iter()
            .map(|control| self.resolve(doc, control))
            .collect()
    }

    /// Runs one pass with the profile held by `store`. An unreadable
    /// profile fails the pass before any control is touched.
    pub async fn run_fill(
        &self,
        doc: &mut dyn HostDocument,
        store: &dyn ProfileStore,
    ) -> FillResponse {
        match store.read() {
            Ok(profile) => self.run_with_profile(doc, &profile).await,
            Err(err) => {
                warn!(error = %err, "profile read failed; pass aborted");
                FillResponse::failure(PROFILE_UNAVAILABLE)
            }
        }
    }

    pub async fn run_with_profile(
        &self,
        doc: &mut dyn HostDocument,
        profile: &Profile,
    ) -> FillResponse {
        let pass = PassId::new();
        let mut ledger = GroupLedger::new();
        let mut response = FillResponse {
            ok: true,
            ..FillResponse::default()
        };

        for control in dom::interactive_controls(doc) {
            let plan = self.resolve(doc, control);
            let (decision, attempted) = self.decide(doc, &plan, profile, &mut ledger).await;
            if attempted {
                response.matched += 1;
            }
            let report = ControlReport {
                control,
                kind: plan.kind,
                path: plan.path,
                score: plan.score,
                decision,
            };
            response.record(&report);
            self.events.control_finished(&report);
        }

        info!(
            pass = %pass,
            scanned = response.scanned,
            matched = response.matched,
            filled = response.filled,
            skipped = response.skipped,
            groups = ledger.len(),
            "fill pass finished"
        );
        response
    }

    /// Decision for one control and whether a fill was attempted.
    async fn decide(
        &self,
        doc: &mut dyn HostDocument,
        plan: &ControlPlan,
        profile: &Profile,
        ledger: &mut GroupLedger,
    ) -> (Decision, bool) {
        let skipped = |reason| (Decision::Skipped { reason }, false);
        let (Some(kind), Some(path)) = (plan.kind, plan.path.as_deref()) else {
            return skipped(plan.skip_reason());
        };
        let value = profile.get(path).unwrap_or_default();
        if value.trim().is_empty() {
            debug!(control = %plan.control, path, "blank profile value");
            return skipped(SkipReason::BlankValue);
        }

        let request = FillRequest::new(plan.control, kind, path, value);
        match self.tool.fill(doc, &request, ledger).await {
            Ok(FillVerdict::Applied) => (Decision::Filled, true),
            Ok(verdict @ FillVerdict::NotApplied(reason)) => {
                (Decision::Skipped { reason }, verdict.attempted())
            }
            Err(err) => {
                warn!(control = %plan.control, path, error = %err, "fill failed; control skipped");
                (
                    Decision::Skipped {
                        reason: SkipReason::Failed,
                    },
                    true,
                )
            }
        }
    }
}

impl Default for FillEngine {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_reports_counts_or_reason() {
        let ok = FillResponse {
            ok: true,
            scanned: 7,
            matched: 3,
            filled: 2,
            skipped: 5,
            error: None,
        };
        assert_eq!(ok.status_line(), "Filled 2 field(s) out of 7 scanned.");
        assert_eq!(
            FillResponse::failure(PROFILE_UNAVAILABLE).status_line(),
            PROFILE_UNAVAILABLE
        );
    }

    #[test]
    fn response_serializes_without_absent_error() {
        let json = serde_json::to_value(FillResponse {
            ok: true,
            ..FillResponse::default()
        })
        .unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["scanned"], 0);
    }
}
