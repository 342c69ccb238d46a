//! Host document port.
//!
//! The engine never owns the page: it reads a tree of nodes through
//! [`HostDocument`] and writes back values, checked state and synthetic
//! events. The free functions in this module are the traversal vocabulary
//! every other stage is written in.

use serde::{Deserialize, Serialize};

pub use formfuse_core_types::NodeId;

use crate::errors::PerceiverError;

/// Synthetic notifications the engine dispatches on the controls it touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Focus,
    Input,
    Change,
    PointerDown,
    PointerUp,
    Click,
    Blur,
}

impl DomEvent {
    pub fn name(self) -> &'static str {
        match self {
            DomEvent::Focus => "focus",
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::PointerDown => "pointerdown",
            DomEvent::PointerUp => "pointerup",
            DomEvent::Click => "click",
            DomEvent::Blur => "blur",
        }
    }
}

/// Structural kind of an interactive control, which decides its fill strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Text,
    TextArea,
    Select,
    Radio,
    Checkbox,
    /// ARIA radio/option/checkbox/switch role, a stateful toggle button, or
    /// a Yes/No button inside a question wrapper.
    ChoiceWidget,
    /// Search-and-pick input backed by a dynamically rendered option list.
    Combobox,
    /// Hidden, password, file, submit and other inputs the engine never fills.
    Disallowed,
}

impl ControlKind {
    /// Kinds whose own signals tend to be weak enough that surrounding text
    /// is consulted.
    pub fn benefits_from_context(self) -> bool {
        matches!(
            self,
            ControlKind::Select
                | ControlKind::Radio
                | ControlKind::Checkbox
                | ControlKind::ChoiceWidget
                | ControlKind::Combobox
        )
    }

    /// Kinds resolved as a group of sibling options.
    pub fn is_choice(self) -> bool {
        matches!(self, ControlKind::Radio | ControlKind::ChoiceWidget)
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::TextArea => "textarea",
            ControlKind::Select => "select",
            ControlKind::Radio => "radio",
            ControlKind::Checkbox => "checkbox",
            ControlKind::ChoiceWidget => "choice",
            ControlKind::Combobox => "combobox",
            ControlKind::Disallowed => "disallowed",
        }
    }
}

/// Live document the engine reads from and mutates in place.
///
/// Element names are reported lower-case. Text and document nodes report no
/// tag name and no attributes.
pub trait HostDocument: Send {
    fn root(&self) -> NodeId;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn tag_name(&self, node: NodeId) -> Option<&str>;
    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;
    /// Concatenated text of the node and all its descendants.
    fn text_content(&self, node: NodeId) -> String;
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Current value; for a `select` the value of its selected option.
    fn value(&self, node: NodeId) -> String;
    fn checked(&self, node: NodeId) -> bool;
    /// Whether an `option` element is the selected one of its `select`.
    fn selected(&self, option: NodeId) -> bool;

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), PerceiverError>;
    fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), PerceiverError>;
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), PerceiverError>;
    fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<(), PerceiverError>;
    fn select_option(&mut self, select: NodeId, option: NodeId) -> Result<(), PerceiverError>;

    /// Delivers a synthetic event; the host runs its own listeners and
    /// default actions in response.
    fn dispatch(&mut self, node: NodeId, event: DomEvent) -> Result<(), PerceiverError>;

    fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: Option<&str>,
    ) -> Result<NodeId, PerceiverError>;
    fn remove_node(&mut self, node: NodeId) -> Result<(), PerceiverError>;

    /// Cooperative yield point: lets asynchronously scheduled page work run.
    fn run_pending_tasks(&mut self) {}
}

const DISALLOWED_INPUT_TYPES: &[&str] = &[
    "hidden", "submit", "reset", "button", "file", "image", "password",
];

const CHOICE_ROLES: &[&str] = &["radio", "checkbox", "switch", "option"];

pub const SELECTION_STATE_ATTRS: &[&str] = &["aria-pressed", "aria-checked", "aria-selected"];

/// Whole button captions that answer a yes/no question on their own.
pub const BARE_ANSWER_TEXT: &[&str] = &["yes", "no"];

pub fn is_element(doc: &dyn HostDocument, node: NodeId) -> bool {
    doc.tag_name(node).is_some()
}

pub fn is_tag(doc: &dyn HostDocument, node: NodeId, tag: &str) -> bool {
    doc.tag_name(node) == Some(tag)
}

/// Every node below `node` in document order, `node` excluded.
pub fn descendants(doc: &dyn HostDocument, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(node).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        out.push(current);
        stack.extend(doc.children(current).into_iter().rev());
    }
    out
}

pub fn element_descendants(doc: &dyn HostDocument, node: NodeId) -> Vec<NodeId> {
    descendants(doc, node)
        .into_iter()
        .filter(|id| is_element(doc, *id))
        .collect()
}

pub fn element_children(doc: &dyn HostDocument, node: NodeId) -> Vec<NodeId> {
    doc.children(node)
        .into_iter()
        .filter(|id| is_element(doc, *id))
        .collect()
}

/// Nearest inclusive ancestor satisfying `pred`.
pub fn closest<F>(doc: &dyn HostDocument, node: NodeId, pred: F) -> Option<NodeId>
where
    F: Fn(NodeId) -> bool,
{
    let mut current = Some(node);
    while let Some(id) = current {
        if is_element(doc, id) && pred(id) {
            return Some(id);
        }
        current = doc.parent(id);
    }
    None
}

/// Element siblings before `node`, nearest first.
pub fn preceding_element_siblings(doc: &dyn HostDocument, node: NodeId) -> Vec<NodeId> {
    let Some(parent) = doc.parent(node) else {
        return Vec::new();
    };
    let siblings = doc.children(parent);
    let position = siblings.iter().position(|id| *id == node).unwrap_or(0);
    siblings[..position]
        .iter()
        .rev()
        .copied()
        .filter(|id| is_element(doc, *id))
        .collect()
}

pub fn has_class(doc: &dyn HostDocument, node: NodeId, class: &str) -> bool {
    doc.attr(node, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub fn role(doc: &dyn HostDocument, node: NodeId) -> Option<String> {
    doc.attr(node, "role")
        .map(|r| r.trim().to_ascii_lowercase())
        .filter(|r| !r.is_empty())
}

pub fn has_role(doc: &dyn HostDocument, node: NodeId, expected: &str) -> bool {
    role(doc, node).as_deref() == Some(expected)
}

/// Lower-cased `type` of an input, `text` when absent.
pub fn input_type(doc: &dyn HostDocument, node: NodeId) -> String {
    doc.attr(node, "type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

fn attr_is(doc: &dyn HostDocument, node: NodeId, name: &str, expected: &str) -> bool {
    doc.attr(node, name)
        .map(|v| v.trim().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

pub fn is_button(doc: &dyn HostDocument, node: NodeId) -> bool {
    is_tag(doc, node, "button") || has_role(doc, node, "button")
}

/// A button captioned only "Yes" or "No". Submit and reset buttons never are.
pub fn is_bare_answer_button(doc: &dyn HostDocument, node: NodeId) -> bool {
    if !is_button(doc, node) {
        return false;
    }
    if attr_is(doc, node, "type", "submit") || attr_is(doc, node, "type", "reset") {
        return false;
    }
    let caption = crate::normalize::normalize(&doc.text_content(node));
    BARE_ANSWER_TEXT.contains(&caption.as_str())
}

fn has_selection_state(doc: &dyn HostDocument, node: NodeId) -> bool {
    SELECTION_STATE_ATTRS
        .iter()
        .any(|attr| doc.attr(node, attr).is_some())
}

fn looks_like_combobox(doc: &dyn HostDocument, node: NodeId) -> bool {
    has_role(doc, node, "combobox")
        || attr_is(doc, node, "aria-autocomplete", "list")
        || attr_is(doc, node, "aria-autocomplete", "both")
        || attr_is(doc, node, "aria-haspopup", "listbox")
}

/// Kind of an interactive control, or `None` for non-controls.
pub fn control_kind(doc: &dyn HostDocument, node: NodeId) -> Option<ControlKind> {
    let tag = doc.tag_name(node)?;
    match tag {
        "input" => {
            let ty = input_type(doc, node);
            let kind = if DISALLOWED_INPUT_TYPES.contains(&ty.as_str()) {
                ControlKind::Disallowed
            } else if ty == "radio" {
                ControlKind::Radio
            } else if ty == "checkbox" {
                ControlKind::Checkbox
            } else if looks_like_combobox(doc, node) {
                ControlKind::Combobox
            } else {
                ControlKind::Text
            };
            Some(kind)
        }
        "textarea" => Some(ControlKind::TextArea),
        "select" => Some(ControlKind::Select),
        _ => {
            if has_role(doc, node, "combobox") {
                return Some(ControlKind::Combobox);
            }
            let role = role(doc, node);
            if let Some(role) = role.as_deref() {
                if role == "option" {
                    // options inside a listbox belong to a picker, not a question
                    let in_listbox =
                        closest(doc, node, |id| has_role(doc, id, "listbox")).is_some();
                    return (!in_listbox).then_some(ControlKind::ChoiceWidget);
                }
                if CHOICE_ROLES.contains(&role) {
                    return Some(ControlKind::ChoiceWidget);
                }
            }
            if is_button(doc, node) && has_selection_state(doc, node) {
                return Some(ControlKind::ChoiceWidget);
            }
            // plain Yes/No toggles only count inside a question wrapper
            if is_bare_answer_button(doc, node)
                && crate::signals::question_container(doc, node).is_some()
            {
                return Some(ControlKind::ChoiceWidget);
            }
            None
        }
    }
}

/// Every interactive control in document order.
pub fn interactive_controls(doc: &dyn HostDocument) -> Vec<NodeId> {
    descendants(doc, doc.root())
        .into_iter()
        .filter(|id| control_kind(doc, *id).is_some())
        .collect()
}

/// `label[for=id]` elements first, then a wrapping `label`.
pub fn labels_for(doc: &dyn HostDocument, node: NodeId) -> Vec<NodeId> {
    let mut labels = Vec::new();
    if let Some(id) = doc.attr(node, "id").filter(|id| !id.is_empty()) {
        labels.extend(
            element_descendants(doc, doc.root())
                .into_iter()
                .filter(|candidate| is_tag(doc, *candidate, "label"))
                .filter(|candidate| doc.attr(*candidate, "for") == Some(id)),
        );
    }
    if let Some(parent) = doc.parent(node) {
        if let Some(wrapping) = closest(doc, parent, |id| is_tag(doc, id, "label")) {
            if !labels.contains(&wrapping) {
                labels.push(wrapping);
            }
        }
    }
    labels
}

/// The control a `label` activates: its `for` target or first nested input.
pub fn labelled_control(doc: &dyn HostDocument, label: NodeId) -> Option<NodeId> {
    if let Some(target) = doc.attr(label, "for").and_then(|id| doc.element_by_id(id)) {
        return Some(target);
    }
    element_descendants(doc, label).into_iter().find(|id| {
        matches!(
            doc.tag_name(*id),
            Some("input") | Some("select") | Some("textarea")
        )
    })
}

fn style_hides(style: &str) -> bool {
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.contains("display:none") || compact.contains("visibility:hidden")
}

/// False when the node or any ancestor is hidden, `aria-hidden` or styled away.
pub fn is_visible(doc: &dyn HostDocument, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if is_element(doc, id) {
            if doc.attr(id, "hidden").is_some() || attr_is(doc, id, "aria-hidden", "true") {
                return false;
            }
            if doc.attr(id, "style").map(style_hides).unwrap_or(false) {
                return false;
            }
        }
        current = doc.parent(id);
    }
    true
}

pub fn is_disabled(doc: &dyn HostDocument, node: NodeId) -> bool {
    if doc.attr(node, "disabled").is_some() || attr_is(doc, node, "aria-disabled", "true") {
        return true;
    }
    doc.parent(node)
        .and_then(|parent| {
            closest(doc, parent, |id| {
                is_tag(doc, id, "fieldset") && doc.attr(id, "disabled").is_some()
            })
        })
        .is_some()
}

pub fn is_readonly(doc: &dyn HostDocument, node: NodeId) -> bool {
    doc.attr(node, "readonly").is_some() || attr_is(doc, node, "aria-readonly", "true")
}

/// `option` elements of a `select`, optgroups included.
pub fn select_options(doc: &dyn HostDocument, select: NodeId) -> Vec<NodeId> {
    element_descendants(doc, select)
        .into_iter()
        .filter(|id| is_tag(doc, *id, "option"))
        .collect()
}

/// Value an option submits: its `value` attribute, else its text.
pub fn option_value(doc: &dyn HostDocument, option: NodeId) -> String {
    match doc.attr(option, "value") {
        Some(value) => value.to_string(),
        None => crate::normalize::collapse_whitespace(&doc.text_content(option)),
    }
}

/// ARIA selection state of a custom choice option.
pub fn aria_selected(doc: &dyn HostDocument, node: NodeId) -> bool {
    SELECTION_STATE_ATTRS
        .iter()
        .any(|attr| attr_is(doc, node, attr, "true"))
}
