use perceiver_form::{ControlKind, HostDocument};
use tracing::{debug, instrument};

use crate::answered::{
    checkbox_answered, combobox_answered, group_answered, select_answered, text_answered,
};
use crate::candidates::candidates_for;
use crate::errors::FillError;
use crate::group::{resolve_group, GroupLedger};
use crate::model::{FillRequest, FillVerdict, SkipReason};
use crate::policy::FillPolicyView;
use crate::ports::Pacer;
use crate::strategies::{checkbox, choice, combobox, select, text};

pub struct RuntimeDeps<'a> {
    pub pacer: &'a dyn Pacer,
    pub policy: &'a FillPolicyView,
}

fn answered() -> Result<FillVerdict, FillError> {
    Ok(FillVerdict::NotApplied(SkipReason::AlreadyAnswered))
}

/// Fills one matched control: blank values and answered controls are left
/// alone, choice groups are handled once per pass.
#[instrument(skip_all, fields(control = %request.control, path = %request.path, kind = request.kind.label()))]
pub async fn execute(
    doc: &mut dyn HostDocument,
    request: &FillRequest,
    ledger: &mut GroupLedger,
    deps: RuntimeDeps<'_>,
) -> Result<FillVerdict, FillError> {
    let candidates = candidates_for(&request.path, &request.value);
    if candidates.is_empty() {
        return Ok(FillVerdict::NotApplied(SkipReason::BlankValue));
    }
    let threshold = deps.policy.similarity_threshold;
    let control = request.control;
    let path = request.path.as_str();

    let verdict = match request.kind {
        ControlKind::Text | ControlKind::TextArea => {
            if text_answered(doc, control) {
                return answered();
            }
            text::fill(doc, control, &request.value)?
        }
        ControlKind::Select => {
            if select_answered(doc, control, path, &candidates, threshold) {
                return answered();
            }
            select::fill(doc, control, &candidates)?
        }
        ControlKind::Radio | ControlKind::ChoiceWidget => {
            let group = resolve_group(doc, control, path);
            if !ledger.visit(&group.key) {
                debug!(group = %group.key, "group already handled this pass");
                return Ok(FillVerdict::NotApplied(SkipReason::GroupVisited));
            }
            if group_answered(doc, &group, path, &candidates, threshold) {
                return answered();
            }
            choice::fill(doc, &group, &candidates, &request.value, threshold)?
        }
        ControlKind::Checkbox => {
            if checkbox_answered(doc, control, &request.value) {
                return answered();
            }
            checkbox::fill(doc, control, path, &request.value)?
        }
        ControlKind::Combobox => {
            if combobox_answered(doc, control, path, &candidates, threshold) {
                return answered();
            }
            combobox::fill(
                doc,
                control,
                &request.value,
                &candidates,
                deps.pacer,
                deps.policy,
            )
            .await?
        }
        ControlKind::Disallowed => return Err(FillError::Unsupported(control)),
    };
    debug!(?verdict, "fill finished");
    Ok(verdict)
}
