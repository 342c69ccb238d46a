//! One fill strategy per control kind.

pub mod checkbox;
pub mod choice;
pub mod combobox;
pub mod select;
pub mod text;

use formfuse_core_types::NodeId;
use perceiver_form::{DomEvent, HostDocument};

use crate::errors::FillError;

/// The two notifications host listeners react to after a value change.
pub(crate) fn emit_input_events(doc: &mut dyn HostDocument, node: NodeId) -> Result<(), FillError> {
    doc.dispatch(node, DomEvent::Input)?;
    doc.dispatch(node, DomEvent::Change)?;
    Ok(())
}

/// Pointer-down, pointer-up, click: what a manual activation delivers.
pub(crate) fn emit_activation(doc: &mut dyn HostDocument, node: NodeId) -> Result<(), FillError> {
    doc.dispatch(node, DomEvent::PointerDown)?;
    doc.dispatch(node, DomEvent::PointerUp)?;
    doc.dispatch(node, DomEvent::Click)?;
    Ok(())
}
