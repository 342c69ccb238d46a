//! Already-answered checks, one per control kind.

use formfuse_core_types::NodeId;
use perceiver_form::dom::{self, HostDocument};
use perceiver_form::normalize;

use crate::candidates::{is_prefer_not_to_say, yes_no};
use crate::group::{is_option_selected, option_text, OptionGroup};
use crate::policy::override_eligible;
use crate::similarity::score_option;

const PLACEHOLDER_PREFIXES: &[&str] = &["select", "choose", "please select", "please choose", "pick"];
const PLACEHOLDER_EXACT: &[&str] = &["", "none", "n a", "na", "other please select"];

/// Option text that stands for "nothing chosen yet".
pub fn is_placeholder(text: &str) -> bool {
    let normalized = normalize(text);
    PLACEHOLDER_EXACT.contains(&normalized.as_str())
        || PLACEHOLDER_PREFIXES
            .iter()
            .any(|prefix| normalized == *prefix || normalized.starts_with(&format!("{prefix} ")))
}

/// Placeholders plus "prefer not to say"-class answers.
pub fn is_non_answer(text: &str) -> bool {
    is_placeholder(text) || is_prefer_not_to_say(&normalize(text))
}

fn matches_candidates(text: &str, candidates: &[String], threshold: u32) -> bool {
    score_option(&normalize(text), candidates) >= threshold
}

pub fn text_answered(doc: &dyn HostDocument, control: NodeId) -> bool {
    !doc.value(control).trim().is_empty()
}

pub fn select_answered(
    doc: &dyn HostDocument,
    select: NodeId,
    path: &str,
    candidates: &[String],
    threshold: u32,
) -> bool {
    let Some(selected) = dom::select_options(doc, select)
        .into_iter()
        .find(|option| doc.selected(*option))
    else {
        return false;
    };
    let text = doc.text_content(selected);
    let value = dom::option_value(doc, selected);
    if is_non_answer(&text) && is_non_answer(&value) {
        return false;
    }
    let matches = matches_candidates(&text, candidates, threshold)
        || matches_candidates(&value, candidates, threshold);
    matches || !override_eligible(path)
}

pub fn group_answered(
    doc: &dyn HostDocument,
    group: &OptionGroup,
    path: &str,
    candidates: &[String],
    threshold: u32,
) -> bool {
    let Some(selected) = group
        .options
        .iter()
        .copied()
        .find(|option| is_option_selected(doc, *option))
    else {
        return false;
    };
    let matches = score_option(&option_text(doc, selected), candidates) >= threshold;
    matches || !override_eligible(path)
}

/// Answered when the box already reflects the desired polarity.
pub fn checkbox_answered(doc: &dyn HostDocument, checkbox: NodeId, value: &str) -> bool {
    match yes_no(value) {
        Some(desired) => doc.checked(checkbox) == desired,
        None => false,
    }
}

pub fn combobox_answered(
    doc: &dyn HostDocument,
    control: NodeId,
    path: &str,
    candidates: &[String],
    threshold: u32,
) -> bool {
    let current = doc.value(control);
    if is_non_answer(&current) {
        return false;
    }
    matches_candidates(&current, candidates, threshold) || !override_eligible(path)
}
