use serde::Serialize;

use formfuse_core_types::NodeId;
use perceiver_form::ControlKind;

/// One fill decision handed to the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillRequest {
    pub control: NodeId,
    pub kind: ControlKind,
    pub path: String,
    pub value: String,
}

impl FillRequest {
    pub fn new(control: NodeId, kind: ControlKind, path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            control,
            kind,
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Why a control was left as it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Ignored,
    NoMatch,
    BlankValue,
    AlreadyAnswered,
    GroupVisited,
    /// The chosen target already holds the desired state.
    AlreadySet,
    NoTarget,
    NotEligible,
    /// Search-and-pick never rendered a qualifying option.
    Exhausted,
    NoEffect,
    Failed,
}

impl SkipReason {
    pub fn label(self) -> &'static str {
        match self {
            SkipReason::Ignored => "ignored",
            SkipReason::NoMatch => "no confident match",
            SkipReason::BlankValue => "blank profile value",
            SkipReason::AlreadyAnswered => "already answered",
            SkipReason::GroupVisited => "group already visited",
            SkipReason::AlreadySet => "already set",
            SkipReason::NoTarget => "no qualifying option",
            SkipReason::NotEligible => "not eligible",
            SkipReason::Exhausted => "options never qualified",
            SkipReason::NoEffect => "activation had no effect",
            SkipReason::Failed => "failed",
        }
    }

    /// Whether a strategy actually ran for this control.
    pub fn attempted(self) -> bool {
        matches!(
            self,
            SkipReason::AlreadySet
                | SkipReason::NoTarget
                | SkipReason::NotEligible
                | SkipReason::Exhausted
                | SkipReason::NoEffect
                | SkipReason::Failed
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum FillVerdict {
    Applied,
    NotApplied(SkipReason),
}

impl FillVerdict {
    pub fn is_applied(self) -> bool {
        matches!(self, FillVerdict::Applied)
    }

    pub fn attempted(self) -> bool {
        match self {
            FillVerdict::Applied => true,
            FillVerdict::NotApplied(reason) => reason.attempted(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Filled,
    Skipped { reason: SkipReason },
}

/// Per-control record of one pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ControlReport {
    pub control: NodeId,
    pub kind: Option<ControlKind>,
    pub path: Option<String>,
    pub score: Option<u32>,
    #[serde(flatten)]
    pub decision: Decision,
}

impl ControlReport {
    pub fn filled(&self) -> bool {
        matches!(self.decision, Decision::Filled)
    }
}
