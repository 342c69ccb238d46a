//! Search-and-pick: type the value, wait for the page to render
//! suggestions, activate the best one.

use formfuse_core_types::NodeId;
use perceiver_form::dom::{self, DomEvent, HostDocument};
use perceiver_form::normalize;
use perceiver_form::normalize::collapse_whitespace;
use tracing::{debug, warn};

use crate::errors::FillError;
use crate::model::{FillVerdict, SkipReason};
use crate::policy::FillPolicyView;
use crate::ports::Pacer;
use crate::similarity::score_option;
use crate::strategies::{emit_activation, emit_input_events};

/// Listbox ids the control points at through `aria-controls`/`aria-owns`.
fn owned_listboxes(doc: &dyn HostDocument, control: NodeId) -> Vec<NodeId> {
    ["aria-controls", "aria-owns"]
        .iter()
        .filter_map(|attr| doc.attr(control, attr))
        .flat_map(|ids| ids.split_whitespace())
        .filter_map(|id| doc.element_by_id(id))
        .collect()
}

/// Visible `role=option` elements the page currently offers for `control`.
pub(crate) fn visible_options(doc: &dyn HostDocument, control: NodeId) -> Vec<NodeId> {
    let mut scopes = owned_listboxes(doc, control);
    if scopes.is_empty() {
        scopes = dom::element_descendants(doc, doc.root())
            .into_iter()
            .filter(|id| dom::has_role(doc, *id, "listbox"))
            .collect();
    }
    let mut options = Vec::new();
    for scope in scopes {
        if !dom::is_visible(doc, scope) {
            continue;
        }
        for option in dom::element_descendants(doc, scope) {
            if dom::has_role(doc, option, "option")
                && dom::is_visible(doc, option)
                && !options.contains(&option)
            {
                options.push(option);
            }
        }
    }
    options
}

fn best_option(
    doc: &dyn HostDocument,
    control: NodeId,
    candidates: &[String],
    threshold: u32,
) -> Option<(NodeId, u32)> {
    visible_options(doc, control)
        .into_iter()
        .map(|option| (option, score_option(&normalize(&doc.text_content(option)), candidates)))
        .filter(|(_, score)| *score >= threshold)
        .fold(None, |best: Option<(NodeId, u32)>, current| match best {
            Some((_, top)) if top >= current.1 => best,
            _ => Some(current),
        })
}

pub async fn fill(
    doc: &mut dyn HostDocument,
    control: NodeId,
    raw: &str,
    candidates: &[String],
    pacer: &dyn Pacer,
    policy: &FillPolicyView,
) -> Result<FillVerdict, FillError> {
    let previous = doc.value(control);
    let query = raw.trim();

    doc.dispatch(control, DomEvent::Focus)?;
    doc.dispatch(control, DomEvent::Click)?;
    doc.set_value(control, query)?;
    doc.dispatch(control, DomEvent::Input)?;

    for (attempt, delay) in policy.poll.delays().into_iter().enumerate() {
        pacer.pause(delay).await;
        doc.run_pending_tasks();

        let Some((option, score)) = best_option(doc, control, candidates, policy.similarity_threshold)
        else {
            debug!(control = %control, attempt, "no qualifying suggestion yet");
            continue;
        };
        let text = collapse_whitespace(&doc.text_content(option));
        debug!(control = %control, option = %option, score, attempt, "activating suggestion");
        emit_activation(doc, option)?;
        if normalize(&doc.value(control)) != normalize(&text) {
            doc.set_value(control, &text)?;
            emit_input_events(doc, control)?;
        }
        return Ok(FillVerdict::Applied);
    }

    warn!(control = %control, query, "suggestions never offered a qualifying option");
    doc.set_value(control, &previous)?;
    emit_input_events(doc, control)?;
    collapse(doc, control)?;
    Ok(FillVerdict::NotApplied(SkipReason::Exhausted))
}

/// Closes the suggestion list the way Escape then Blur would.
fn collapse(doc: &mut dyn HostDocument, control: NodeId) -> Result<(), FillError> {
    if doc.attr(control, "aria-expanded").is_some() {
        doc.set_attr(control, "aria-expanded", "false")?;
    }
    doc.dispatch(control, DomEvent::Blur)?;
    Ok(())
}
