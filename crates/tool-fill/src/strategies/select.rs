use formfuse_core_types::NodeId;
use perceiver_form::dom::{self, HostDocument};
use perceiver_form::{contains_phrase, normalize};
use tracing::debug;

use crate::answered::is_placeholder;
use crate::errors::FillError;
use crate::model::{FillVerdict, SkipReason};
use crate::strategies::emit_input_events;

fn find_target(doc: &dyn HostDocument, select: NodeId, candidates: &[String]) -> Option<NodeId> {
    let options: Vec<(NodeId, String, String)> = dom::select_options(doc, select)
        .into_iter()
        .map(|option| {
            let text = doc.text_content(option);
            (
                option,
                normalize(&dom::option_value(doc, option)),
                normalize(&text),
            )
        })
        .collect();

    let exact = options.iter().find(|(_, value, text)| {
        candidates
            .iter()
            .any(|candidate| candidate == value || candidate == text)
    });
    if let Some((option, _, _)) = exact {
        return Some(*option);
    }

    candidates.iter().find_map(|candidate| {
        options
            .iter()
            .filter(|(_, _, text)| !is_placeholder(text))
            .find(|(_, value, text)| {
                contains_phrase(value, candidate) || contains_phrase(text, candidate)
            })
            .map(|(option, _, _)| *option)
    })
}

/// Exact option match first, then whole-phrase containment.
pub fn fill(
    doc: &mut dyn HostDocument,
    select: NodeId,
    candidates: &[String],
) -> Result<FillVerdict, FillError> {
    let Some(target) = find_target(doc, select, candidates) else {
        debug!(control = %select, "no option matched");
        return Ok(FillVerdict::NotApplied(SkipReason::NoTarget));
    };
    if doc.selected(target) {
        return Ok(FillVerdict::NotApplied(SkipReason::AlreadySet));
    }
    doc.select_option(select, target)?;
    emit_input_events(doc, select)?;
    Ok(FillVerdict::Applied)
}
