//! Per-control text evidence.

use serde::Serialize;

use crate::dom::{self, ControlKind, HostDocument, NodeId};
use crate::normalize::{collapse_whitespace, contains_phrase, normalize, truncate_chars};
use crate::rules::{allowed_keywords, FieldRule, FORBIDDEN_KEYWORDS};

/// Cap on container text folded into the label channel.
pub const CONTAINER_TEXT_LIMIT: usize = 320;

const QUESTION_CLASSES: &[&str] = &[
    "ashby-application-form-question",
    "ashby-application-form-field",
    "application-question",
    "question",
    "form-field",
    "field",
    "input-wrapper",
    "form-group",
];

/// Provenance of a piece of signal text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Label,
    Aria,
    Placeholder,
    Autocomplete,
    Name,
    Id,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Label,
        Channel::Aria,
        Channel::Placeholder,
        Channel::Autocomplete,
        Channel::Name,
        Channel::Id,
    ];

    pub const fn weight(self) -> u32 {
        match self {
            Channel::Label => 5,
            Channel::Aria => 4,
            Channel::Placeholder => 3,
            Channel::Autocomplete => 2,
            Channel::Name => 2,
            Channel::Id => 1,
        }
    }
}

/// Normalized text per channel for one control.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SignalBundle {
    pub label: String,
    pub aria: String,
    pub placeholder: String,
    pub name: String,
    pub id: String,
    pub autocomplete: String,
}

impl SignalBundle {
    pub fn channel(&self, channel: Channel) -> &str {
        match channel {
            Channel::Label => &self.label,
            Channel::Aria => &self.aria,
            Channel::Placeholder => &self.placeholder,
            Channel::Autocomplete => &self.autocomplete,
            Channel::Name => &self.name,
            Channel::Id => &self.id,
        }
    }

    /// Label, aria, placeholder, name and id joined; autocomplete is left
    /// out because it is a machine hint, not copy.
    pub fn combined(&self) -> String {
        [
            self.label.as_str(),
            self.aria.as_str(),
            self.placeholder.as_str(),
            self.name.as_str(),
            self.id.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Why a control is left alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    Disabled,
    ReadOnly,
    DisallowedKind,
    EmptySignals,
    ForbiddenTopic,
}

impl IgnoreReason {
    /// Structural reasons hold regardless of what surrounding text says;
    /// textual ones only veto the rule table.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            IgnoreReason::Disabled | IgnoreReason::ReadOnly | IgnoreReason::DisallowedKind
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            IgnoreReason::Disabled => "disabled",
            IgnoreReason::ReadOnly => "read-only",
            IgnoreReason::DisallowedKind => "disallowed kind",
            IgnoreReason::EmptySignals => "no signal text",
            IgnoreReason::ForbiddenTopic => "forbidden topic",
        }
    }
}

/// Nearest ancestor that wraps one question: fieldsets, ARIA groups, the
/// wrapper classes common applicant-tracking forms use, or a test id that
/// mentions "question".
pub fn question_container(doc: &dyn HostDocument, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent(node)?;
    dom::closest(doc, parent, |id| is_question_wrapper(doc, id))
}

fn is_question_wrapper(doc: &dyn HostDocument, id: NodeId) -> bool {
    if dom::is_tag(doc, id, "fieldset") {
        return true;
    }
    if matches!(
        dom::role(doc, id).as_deref(),
        Some("group") | Some("radiogroup")
    ) {
        return true;
    }
    if QUESTION_CLASSES.iter().any(|class| dom::has_class(doc, id, class)) {
        return true;
    }
    ["data-testid", "data-qa"].iter().any(|attr| {
        doc.attr(id, attr)
            .map(|v| v.to_ascii_lowercase().contains("question"))
            .unwrap_or(false)
    })
}

fn legend_text(doc: &dyn HostDocument, node: NodeId) -> Option<String> {
    let parent = doc.parent(node)?;
    let fieldset = dom::closest(doc, parent, |id| dom::is_tag(doc, id, "fieldset"))?;
    dom::element_descendants(doc, fieldset)
        .into_iter()
        .find(|id| dom::is_tag(doc, *id, "legend"))
        .map(|legend| doc.text_content(legend))
}

fn labelledby_text(doc: &dyn HostDocument, node: NodeId) -> Vec<String> {
    doc.attr(node, "aria-labelledby")
        .map(|ids| {
            ids.split_whitespace()
                .filter_map(|id| doc.element_by_id(id))
                .map(|target| doc.text_content(target))
                .filter(|text| !text.trim().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Gathers and normalizes the text evidence of one control.
pub fn extract_signals(doc: &dyn HostDocument, node: NodeId) -> SignalBundle {
    let mut pieces: Vec<String> = dom::labels_for(doc, node)
        .into_iter()
        .map(|label| doc.text_content(label))
        .filter(|text| !text.trim().is_empty())
        .collect();
    if let Some(legend) = legend_text(doc, node).filter(|text| !text.trim().is_empty()) {
        pieces.push(legend);
    }

    let mut aria_pieces: Vec<String> = doc
        .attr(node, "aria-label")
        .map(str::to_string)
        .into_iter()
        .collect();
    let labelledby = labelledby_text(doc, node);
    let has_direct_label = !pieces.is_empty() || !labelledby.is_empty();
    aria_pieces.extend(labelledby);

    let selection_style = matches!(
        dom::control_kind(doc, node),
        Some(ControlKind::Select)
            | Some(ControlKind::Radio)
            | Some(ControlKind::Checkbox)
            | Some(ControlKind::ChoiceWidget)
    );
    if selection_style || !has_direct_label {
        let container = question_container(doc, node).or_else(|| doc.parent(node));
        if let Some(container) = container {
            let text = collapse_whitespace(&doc.text_content(container));
            if !text.is_empty() {
                pieces.push(truncate_chars(&text, CONTAINER_TEXT_LIMIT));
            }
        }
    }

    let attr = |name: &str| normalize(doc.attr(node, name).unwrap_or_default());
    SignalBundle {
        label: normalize(&pieces.join(" ")),
        aria: normalize(&aria_pieces.join(" ")),
        placeholder: attr("placeholder"),
        name: attr("name"),
        id: attr("id"),
        autocomplete: attr("autocomplete"),
    }
}

/// Forbidden topics match at a word start, so plurals and inflections
/// ("skills", "experienced") count.
fn mentions_topic(text: &str, topic: &str) -> bool {
    format!(" {text}").contains(&format!(" {topic}"))
}

/// First reason the control must not be filled from the rule table.
pub fn ignore_reason(
    doc: &dyn HostDocument,
    node: NodeId,
    signals: &SignalBundle,
    rules: &[FieldRule],
) -> Option<IgnoreReason> {
    if dom::is_disabled(doc, node) {
        return Some(IgnoreReason::Disabled);
    }
    if dom::is_readonly(doc, node) {
        return Some(IgnoreReason::ReadOnly);
    }
    match dom::control_kind(doc, node) {
        None | Some(ControlKind::Disallowed) => return Some(IgnoreReason::DisallowedKind),
        Some(_) => {}
    }

    let combined = signals.combined();
    if combined.is_empty() {
        return Some(IgnoreReason::EmptySignals);
    }
    let forbidden = FORBIDDEN_KEYWORDS
        .iter()
        .any(|topic| mentions_topic(&combined, topic));
    if !forbidden {
        return None;
    }
    let rescued = allowed_keywords(rules).any(|keyword| contains_phrase(&combined, keyword));
    (!rescued).then_some(IgnoreReason::ForbiddenTopic)
}

pub fn should_ignore(
    doc: &dyn HostDocument,
    node: NodeId,
    signals: &SignalBundle,
    rules: &[FieldRule],
) -> bool {
    ignore_reason(doc, node, signals, rules).is_some()
}
