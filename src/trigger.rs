//! Request/response trigger interface.
//!
//! Mirrors the extension's message protocol: `FORMFUSE_FILL` runs a pass,
//! `FORMFUSE_TOGGLE_TRIGGER` shows or hides the on-page trigger button.

use formfuse_core_types::NodeId;
use formfuse_profile::ProfileStore;
use perceiver_form::dom;
use perceiver_form::HostDocument;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::FormFuseError;
use crate::fill::{FillEngine, FillResponse};

pub const TRIGGER_ID: &str = "formfuse-trigger";
pub const TRIGGER_LABEL: &str = "Autofill with FormFuse";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum TriggerRequest {
    #[serde(rename = "FORMFUSE_FILL")]
    Fill,
    #[serde(rename = "FORMFUSE_TOGGLE_TRIGGER")]
    ToggleTrigger { visible: bool },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerResponse {
    Fill(FillResponse),
    Trigger {
        ok: bool,
        trigger_visible: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl TriggerResponse {
    pub fn ok(&self) -> bool {
        match self {
            TriggerResponse::Fill(response) => response.ok,
            TriggerResponse::Trigger { ok, .. } => *ok,
        }
    }
}

fn find_trigger(doc: &dyn HostDocument) -> Option<NodeId> {
    doc.element_by_id(TRIGGER_ID)
}

pub fn trigger_visible(doc: &dyn HostDocument) -> bool {
    find_trigger(doc).is_some()
}

fn trigger_host(doc: &dyn HostDocument) -> NodeId {
    dom::element_descendants(doc, doc.root())
        .into_iter()
        .find(|id| dom::is_tag(doc, *id, "body"))
        .unwrap_or_else(|| doc.root())
}

/// Inserts or removes the trigger button. Repeating a request is a no-op.
pub fn set_trigger_visible(
    doc: &mut dyn HostDocument,
    visible: bool,
) -> Result<bool, FormFuseError> {
    match (find_trigger(doc), visible) {
        (None, true) => {
            let host = trigger_host(doc);
            doc.append_element(
                host,
                "button",
                &[
                    ("id", TRIGGER_ID),
                    ("type", "button"),
                    ("aria-label", TRIGGER_LABEL),
                ],
                Some(TRIGGER_LABEL),
            )?;
            debug!("trigger inserted");
        }
        (Some(node), false) => {
            doc.remove_node(node)?;
            debug!("trigger removed");
        }
        _ => {}
    }
    Ok(trigger_visible(doc))
}

pub async fn handle(
    engine: &FillEngine,
    doc: &mut dyn HostDocument,
    store: &dyn ProfileStore,
    request: TriggerRequest,
) -> TriggerResponse {
    match request {
        TriggerRequest::Fill => TriggerResponse::Fill(engine.run_fill(doc, store).await),
        TriggerRequest::ToggleTrigger { visible } => match set_trigger_visible(doc, visible) {
            Ok(now_visible) => TriggerResponse::Trigger {
                ok: true,
                trigger_visible: now_visible,
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "trigger toggle failed");
                TriggerResponse::Trigger {
                    ok: false,
                    trigger_visible: trigger_visible(doc),
                    error: Some(err.to_string()),
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_use_extension_action_names() {
        let fill: TriggerRequest = serde_json::from_str(r#"{"action":"FORMFUSE_FILL"}"#).unwrap();
        assert_eq!(fill, TriggerRequest::Fill);
        let toggle: TriggerRequest =
            serde_json::from_str(r#"{"action":"FORMFUSE_TOGGLE_TRIGGER","visible":true}"#)
                .unwrap();
        assert_eq!(toggle, TriggerRequest::ToggleTrigger { visible: true });
        assert!(serde_json::from_str::<TriggerRequest>(r#"{"action":"OTHER"}"#).is_err());
    }
}
