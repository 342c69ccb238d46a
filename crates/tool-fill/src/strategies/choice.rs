use formfuse_core_types::NodeId;
use perceiver_form::dom::{self, DomEvent, HostDocument};
use tracing::debug;

use crate::candidates::yes_no;
use crate::errors::FillError;
use crate::group::{is_option_selected, option_text, OptionGroup};
use crate::model::{FillVerdict, SkipReason};
use crate::similarity::{is_negated, score_option};
use crate::strategies::{emit_activation, emit_input_events};

const YES_TOKENS: &[&str] = &["yes", "true"];
const NO_TOKENS: &[&str] = &["no", "false"];

fn has_token(text: &str, tokens: &[&str]) -> bool {
    text.split(' ').any(|token| tokens.contains(&token))
}

/// Option whose text carries the requested polarity.
fn polarity_option(doc: &dyn HostDocument, group: &OptionGroup, yes: bool) -> Option<NodeId> {
    group.options.iter().copied().find(|option| {
        let text = option_text(doc, *option);
        if yes {
            has_token(&text, YES_TOKENS) && !is_negated(&text)
        } else {
            has_token(&text, NO_TOKENS) || is_negated(&text)
        }
    })
}

fn pick_target(
    doc: &dyn HostDocument,
    group: &OptionGroup,
    candidates: &[String],
    raw: &str,
    threshold: u32,
) -> Option<NodeId> {
    let best = group
        .options
        .iter()
        .copied()
        .map(|option| (option, score_option(&option_text(doc, option), candidates)))
        .filter(|(_, score)| *score >= threshold)
        .fold(None::<(NodeId, u32)>, |best, current| match best {
            Some((_, top)) if top >= current.1 => best,
            _ => Some(current),
        });
    if let Some((option, score)) = best {
        debug!(option = %option, score, "option scored");
        return Some(option);
    }
    yes_no(raw).and_then(|yes| polarity_option(doc, group, yes))
}

fn is_native(doc: &dyn HostDocument, node: NodeId) -> bool {
    dom::is_tag(doc, node, "input")
}

/// Sets the ARIA state a custom option exposes and clears it on its peers.
fn mark_selected(
    doc: &mut dyn HostDocument,
    group: &OptionGroup,
    target: NodeId,
) -> Result<(), FillError> {
    let existing = dom::SELECTION_STATE_ATTRS
        .iter()
        .copied()
        .find(|attr| doc.attr(target, attr).is_some());
    let attr = match existing {
        Some(attr) => attr,
        None if dom::has_role(doc, target, "option") => "aria-selected",
        None if dom::is_button(doc, target) => "aria-pressed",
        None => "aria-checked",
    };
    let peers: Vec<NodeId> = group
        .options
        .iter()
        .copied()
        .filter(|peer| *peer != target && doc.attr(*peer, attr).is_some())
        .collect();
    for peer in peers {
        doc.set_attr(peer, attr, "false")?;
    }
    doc.set_attr(target, attr, "true")?;
    emit_input_events(doc, target)?;
    Ok(())
}

/// Clicks the option's first label, for widgets whose page script listens
/// there instead of on the option.
fn activate_label(doc: &mut dyn HostDocument, target: NodeId) -> Result<(), FillError> {
    if let Some(label) = dom::labels_for(doc, target).first().copied() {
        debug!(option = %target, label = %label, "falling back to label activation");
        doc.dispatch(label, DomEvent::Click)?;
    }
    Ok(())
}

/// Activates the best-matching option of a radio or custom choice group.
pub fn fill(
    doc: &mut dyn HostDocument,
    group: &OptionGroup,
    candidates: &[String],
    raw: &str,
    threshold: u32,
) -> Result<FillVerdict, FillError> {
    let Some(target) = pick_target(doc, group, candidates, raw, threshold) else {
        return Ok(FillVerdict::NotApplied(SkipReason::NoTarget));
    };
    if is_option_selected(doc, target) {
        return Ok(FillVerdict::NotApplied(SkipReason::AlreadySet));
    }

    if is_native(doc, target) {
        doc.set_checked(target, true)?;
        emit_activation(doc, target)?;
        emit_input_events(doc, target)?;
        if !is_option_selected(doc, target) {
            activate_label(doc, target)?;
        }
    } else {
        emit_activation(doc, target)?;
        if !is_option_selected(doc, target) {
            activate_label(doc, target)?;
        }
        if !is_option_selected(doc, target) {
            mark_selected(doc, group, target)?;
        }
    }

    if is_option_selected(doc, target) {
        Ok(FillVerdict::Applied)
    } else {
        Ok(FillVerdict::NotApplied(SkipReason::NoEffect))
    }
}
