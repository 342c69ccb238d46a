//! Option groups: the sibling choices that answer one question.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use formfuse_core_types::NodeId;
use perceiver_form::dom::{self, HostDocument};
use perceiver_form::normalize::{collapse_whitespace, truncate_chars};
use perceiver_form::{normalize, question_container};

const FINGERPRINT_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionGroup {
    pub key: String,
    pub options: Vec<NodeId>,
}

/// Group keys visited during one pass.
#[derive(Clone, Debug, Default)]
pub struct GroupLedger {
    visited: HashSet<String>,
}

impl GroupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key`; false when it was already visited.
    pub fn visit(&mut self, key: &str) -> bool {
        self.visited.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.visited.contains(key)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

fn fingerprint(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn is_native_radio(doc: &dyn HostDocument, node: NodeId) -> bool {
    dom::is_tag(doc, node, "input") && dom::input_type(doc, node) == "radio"
}

fn is_group_option(doc: &dyn HostDocument, node: NodeId) -> bool {
    if is_native_radio(doc, node) {
        return true;
    }
    if let Some(role) = dom::role(doc, node) {
        if matches!(role.as_str(), "radio" | "checkbox" | "switch") {
            return true;
        }
        if role == "option" {
            return dom::closest(doc, node, |id| dom::has_role(doc, id, "listbox")).is_none();
        }
    }
    if !dom::is_button(doc, node) {
        return false;
    }
    dom::SELECTION_STATE_ATTRS
        .iter()
        .any(|attr| doc.attr(node, attr).is_some())
        || dom::is_bare_answer_button(doc, node)
}

/// Resolves the group `control` belongs to and a key that is stable for
/// every member of that group within one pass.
pub fn resolve_group(doc: &dyn HostDocument, control: NodeId, path: &str) -> OptionGroup {
    if is_native_radio(doc, control) {
        if let Some(name) = doc.attr(control, "name").filter(|n| !n.is_empty()) {
            let options = dom::element_descendants(doc, doc.root())
                .into_iter()
                .filter(|id| is_native_radio(doc, *id) && doc.attr(*id, "name") == Some(name))
                .collect();
            return OptionGroup {
                key: format!("radio:{name}"),
                options,
            };
        }
    }

    let container = question_container(doc, control);
    let scope = container.or_else(|| doc.parent(control));
    let mut options: Vec<NodeId> = scope
        .map(|scope| {
            dom::element_descendants(doc, scope)
                .into_iter()
                .filter(|id| is_group_option(doc, *id))
                .collect()
        })
        .unwrap_or_default();
    if !options.contains(&control) {
        options.insert(0, control);
    }

    let key = container
        .and_then(|container| container_key(doc, container))
        .unwrap_or_else(|| format!("path:{path}"));
    OptionGroup { key, options }
}

fn container_key(doc: &dyn HostDocument, container: NodeId) -> Option<String> {
    if let Some(id) = doc.attr(container, "id").filter(|v| !v.trim().is_empty()) {
        return Some(format!("id:{id}"));
    }
    if let Some(label) = doc
        .attr(container, "aria-label")
        .map(normalize)
        .filter(|v| !v.is_empty())
    {
        return Some(format!("aria:{label}"));
    }
    for attr in ["data-testid", "data-qa"] {
        if let Some(test_id) = doc.attr(container, attr).filter(|v| !v.trim().is_empty()) {
            return Some(format!("testid:{test_id}"));
        }
    }
    let text = truncate_chars(
        &collapse_whitespace(&doc.text_content(container)),
        FINGERPRINT_CHARS,
    );
    if text.is_empty() {
        return None;
    }
    Some(format!("text:{}", fingerprint(&text)))
}

/// Normalized text identifying one option: its value, own labels, aria
/// label and, for custom widgets, its content. Repeated pieces collapse.
pub fn option_text(doc: &dyn HostDocument, option: NodeId) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut push = |raw: &str| {
        let piece = normalize(raw);
        if !piece.is_empty() && !pieces.contains(&piece) {
            pieces.push(piece);
        }
    };
    if let Some(value) = doc.attr(option, "value") {
        push(value);
    }
    if dom::is_tag(doc, option, "input") {
        for label in dom::labels_for(doc, option) {
            push(&doc.text_content(label));
        }
    } else {
        push(&doc.text_content(option));
    }
    if let Some(aria) = doc.attr(option, "aria-label") {
        push(aria);
    }
    pieces.join(" ")
}

pub fn is_option_selected(doc: &dyn HostDocument, option: NodeId) -> bool {
    if dom::is_tag(doc, option, "input") {
        return doc.checked(option);
    }
    dom::aria_selected(doc, option)
}
