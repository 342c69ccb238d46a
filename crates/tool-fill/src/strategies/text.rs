use formfuse_core_types::NodeId;
use perceiver_form::HostDocument;

use crate::errors::FillError;
use crate::model::{FillVerdict, SkipReason};
use crate::strategies::emit_input_events;

/// Writes the trimmed profile value directly.
pub fn fill(doc: &mut dyn HostDocument, control: NodeId, raw: &str) -> Result<FillVerdict, FillError> {
    let next = raw.trim();
    if next.is_empty() {
        return Ok(FillVerdict::NotApplied(SkipReason::BlankValue));
    }
    if doc.value(control).trim() == next {
        return Ok(FillVerdict::NotApplied(SkipReason::AlreadySet));
    }
    doc.set_value(control, next)?;
    emit_input_events(doc, control)?;
    Ok(FillVerdict::Applied)
}
