//! Context inference: resolving weak-signal controls from surrounding copy.
//!
//! Patterns run over normalized text in a fixed order. Specific questions
//! come before broad ones, so "require sponsorship to maintain your work
//! authorization" resolves to sponsorship, not eligibility.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::dom::{self, HostDocument, NodeId};
use crate::normalize::{collapse_whitespace, normalize, truncate_chars};
use crate::signals::question_container;

pub const CONTAINER_WINDOW: usize = 500;
pub const SIBLING_WINDOW: usize = 200;
pub const MAX_SIBLINGS: usize = 3;
pub const SECTION_WINDOW: usize = 600;

static CONTEXT_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "work_auth.requires_sponsorship",
            r"(?i)\bsponsor(s|ed|ing|ship)?\b|\bmaintain or extend\b",
        ),
        (
            "work_auth.eligible_to_work_us",
            r"(?i)\b(authori[sz]ed|eligible|permitted) to work\b|\bwork authori[sz]ation\b|\bauthori[sz]ation to work\b|\bright to work\b",
        ),
        (
            "work_auth.open_to_relocate",
            r"(?i)\brelocat(e|ion|ing)\b|\bcommuting distance\b",
        ),
        (
            "work_auth.worked_here_before",
            r"(?i)\b(previously|ever) (been )?(worked|employed)\b|\bworked (here|for us|for this company) before\b|\bformer employee\b|\bworked at \w+ in the past\b",
        ),
        (
            "demographics.veteran_status",
            r"(?i)\bveterans?\b|\bmilitary service\b|\barmed forces\b",
        ),
        (
            "demographics.disability_status",
            r"(?i)\bdisabilit(y|ies)\b|\bdisabled\b",
        ),
        ("demographics.pronouns", r"(?i)\bpronouns?\b"),
        ("demographics.gender", r"(?i)\bgender\b|\bsex\b"),
        (
            "demographics.ethnicity",
            r"(?i)\bethnicity\b|\bethnic\b|\brace\b|\bracial\b|\bhispanic or latino\b",
        ),
        (
            "education.field_of_study",
            r"(?i)\bfield of study\b|\bmajor\b|\barea of study\b|\bdiscipline\b",
        ),
        (
            "education.degree",
            r"(?i)\bdegree\b|\blevel of education\b|\beducation level\b",
        ),
        (
            "education.school",
            r"(?i)\bschool\b|\buniversity\b|\bcollege\b|\binstitution\b",
        ),
        ("address.country", r"(?i)\bcountry\b|\bnation\b"),
        ("address.state", r"(?i)\bstate\b|\bprovince\b"),
    ]
    .into_iter()
    .map(|(path, pattern)| (path, Regex::new(pattern).expect("static context pattern")))
    .collect()
});

/// Text neighbourhoods of a control, nearest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContextWindow {
    pub container: String,
    pub siblings: Vec<String>,
    pub section: String,
}

impl ContextWindow {
    /// The outermost enclosing question wrapper bounds the window: siblings
    /// are those of nested wrappers inside it and the section tier stays
    /// empty, so a neighbouring question's text never leaks in. Unwrapped controls climb
    /// to the nearest ancestor with preceding siblings, stopping at the
    /// section.
    pub fn capture(doc: &dyn HostDocument, node: NodeId) -> Self {
        let question = question_container(doc, node);
        let container_node = question.or_else(|| doc.parent(node));
        let container = container_node
            .map(|id| capped_text(doc, id, CONTAINER_WINDOW))
            .unwrap_or_default();

        let outer_question = question.map(|mut outer| {
            while let Some(next) = question_container(doc, outer) {
                outer = next;
            }
            outer
        });
        let section_node = match outer_question {
            Some(_) => None,
            None => container_node.and_then(|anchor| doc.parent(anchor)).and_then(|parent| {
                dom::closest(doc, parent, |id| {
                    matches!(doc.tag_name(id), Some("section" | "article" | "form"))
                        || dom::has_role(doc, id, "form")
                })
            }),
        };

        let (mut current, boundary) = match (question, outer_question) {
            (Some(inner), Some(outer)) => (inner, Some(outer)),
            _ => (container_node.unwrap_or(node), section_node),
        };
        let mut preceding = Vec::new();
        loop {
            if Some(current) == boundary {
                break;
            }
            preceding = dom::preceding_element_siblings(doc, current);
            if !preceding.is_empty() {
                break;
            }
            match doc.parent(current) {
                Some(parent) if Some(parent) != boundary && parent != doc.root() => {
                    current = parent;
                }
                _ => break,
            }
        }
        let siblings = preceding
            .into_iter()
            .map(|id| capped_text(doc, id, SIBLING_WINDOW))
            .filter(|text| !text.is_empty())
            .take(MAX_SIBLINGS)
            .collect();

        let section = section_node
            .map(|id| capped_text(doc, id, SECTION_WINDOW))
            .unwrap_or_default();

        Self {
            container,
            siblings,
            section,
        }
    }

    /// Tiers in evaluation order.
    pub fn tiers(&self) -> Vec<String> {
        vec![
            self.container.clone(),
            self.siblings.join(" "),
            self.section.clone(),
        ]
    }
}

fn capped_text(doc: &dyn HostDocument, node: NodeId, limit: usize) -> String {
    truncate_chars(&collapse_whitespace(&doc.text_content(node)), limit)
}

/// First pattern matching `text`, in table order.
pub fn infer_from_text(text: &str) -> Option<&'static str> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }
    CONTEXT_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&normalized))
        .map(|(path, _)| *path)
}

/// Resolves an attribute path from surrounding text, for control kinds
/// whose own signals are weak. Tiers are tried nearest first.
pub fn infer_from_context(doc: &dyn HostDocument, node: NodeId) -> Option<&'static str> {
    let kind = dom::control_kind(doc, node)?;
    if !kind.benefits_from_context() {
        return None;
    }
    let window = ContextWindow::capture(doc, node);
    let inferred = window
        .tiers()
        .iter()
        .find_map(|tier| infer_from_text(tier));
    if let Some(path) = inferred {
        debug!(control = %node, path, "context inference resolved control");
    }
    inferred
}
