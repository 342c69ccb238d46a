use formfuse_core_types::NodeId;
use perceiver_form::HostDocument;

use crate::candidates::yes_no;
use crate::errors::FillError;
use crate::model::{FillVerdict, SkipReason};
use crate::policy::checkbox_eligible;
use crate::strategies::emit_input_events;

/// Toggles a lone checkbox for allow-listed yes/no families.
pub fn fill(
    doc: &mut dyn HostDocument,
    control: NodeId,
    path: &str,
    raw: &str,
) -> Result<FillVerdict, FillError> {
    if !checkbox_eligible(path) {
        return Ok(FillVerdict::NotApplied(SkipReason::NotEligible));
    }
    let Some(desired) = yes_no(raw) else {
        return Ok(FillVerdict::NotApplied(SkipReason::NotEligible));
    };
    if doc.checked(control) == desired {
        return Ok(FillVerdict::NotApplied(SkipReason::AlreadySet));
    }
    doc.set_checked(control, desired)?;
    emit_input_events(doc, control)?;
    Ok(FillVerdict::Applied)
}
