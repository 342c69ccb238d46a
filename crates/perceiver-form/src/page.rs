//! In-memory arena document.
//!
//! `PageDom` is the [`HostDocument`] the CLI and the tests run passes
//! against. It is loaded from HTML with `scraper`, serializes its live state
//! back to HTML, records every dispatched event, and emulates the handful
//! of host behaviours the fill strategies observe: radio exclusivity, label
//! activation, role-widget selection and scripted suggestion lists.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::debug;

use crate::dom::{self, DomEvent, HostDocument, NodeId};
use crate::errors::PerceiverError;
use crate::normalize::{collapse_whitespace, normalize};

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// One event delivered to a node, in dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchedEvent {
    pub node: NodeId,
    pub event: DomEvent,
}

#[derive(Clone, Debug)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    value: String,
    checked: bool,
    selected: bool,
}

impl ElementData {
    fn new(tag: &str, attrs: &[(&str, &str)]) -> Self {
        let tag = tag.to_ascii_lowercase();
        let attrs: Vec<(String, String)> = attrs
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        let lookup = |name: &str| attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v);
        let value = if tag == "input" {
            lookup("value").cloned().unwrap_or_default()
        } else {
            String::new()
        };
        let checked = tag == "input" && lookup("checked").is_some();
        let selected = tag == "option" && lookup("selected").is_some();
        Self {
            tag,
            attrs,
            value,
            checked,
            selected,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }
}

#[derive(Clone, Debug)]
enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Suggestion list a page script renders for a search-and-pick control.
#[derive(Clone, Debug)]
struct ScriptedSuggestions {
    delay_ticks: u32,
    options: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
struct PendingRender {
    control: NodeId,
    remaining: u32,
}

#[derive(Clone, Debug)]
pub struct PageDom {
    nodes: Vec<Node>,
    root: NodeId,
    events: Vec<DispatchedEvent>,
    scripted: HashMap<NodeId, ScriptedSuggestions>,
    pending: Vec<PendingRender>,
    listbox_owner: HashMap<NodeId, NodeId>,
    label_activated: HashSet<NodeId>,
    generated_ids: usize,
}

impl Default for PageDom {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDom {
    /// Empty `<html><head></head><body></body></html>` document.
    pub fn new() -> Self {
        let mut page = Self::bare();
        let html = page.element(page.root, "html", &[]);
        page.element(html, "head", &[]);
        page.element(html, "body", &[]);
        page
    }

    fn bare() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: NodeId(0),
            events: Vec::new(),
            scripted: HashMap::new(),
            pending: Vec::new(),
            listbox_owner: HashMap::new(),
            label_activated: HashSet::new(),
            generated_ids: 0,
        }
    }

    pub fn from_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut page = Self::bare();
        let root = page.root;
        page.import_element(root, parsed.root_element());
        page.seed_textarea_values();
        debug!(nodes = page.nodes.len(), "page loaded");
        page
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PerceiverError> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)
            .map_err(|err| PerceiverError::HtmlLoad(format!("{}: {err}", path.display())))?;
        Ok(Self::from_html(&html))
    }

    fn import_element(&mut self, parent: NodeId, source: ElementRef<'_>) {
        let element = source.value();
        let name = element.name();
        if SKIPPED_TAGS.contains(&name) {
            return;
        }
        let attrs: Vec<(&str, &str)> = element.attrs().collect();
        let id = self.element(parent, name, &attrs);
        for child in source.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.import_element(id, child_element);
            } else if let Some(text) = child.value().as_text() {
                let content: &str = text;
                if !content.trim().is_empty() {
                    self.text(id, content);
                }
            }
        }
    }

    fn seed_textarea_values(&mut self) {
        let textareas: Vec<NodeId> = (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.tag_name(*id) == Some("textarea"))
            .collect();
        for id in textareas {
            let text = self.text_content(id);
            if let Some(el) = self.element_mut(id) {
                el.value = text;
            }
        }
    }

    /// The `body` element, falling back to the document node.
    pub fn body(&self) -> NodeId {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|id| self.tag_name(*id) == Some("body") && self.is_attached(*id))
            .unwrap_or(self.root)
    }

    /// Appends an element; state (`value`, `checked`, `selected`) is seeded
    /// from the matching attributes.
    pub fn element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push(parent, NodeData::Element(ElementData::new(tag, attrs)))
    }

    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeData::Text(text.to_string()))
    }

    pub fn element_with_text(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        let id = self.element(parent, tag, attrs);
        self.text(id, text);
        if tag.eq_ignore_ascii_case("textarea") {
            if let Some(el) = self.element_mut(id) {
                el.value = text.to_string();
            }
        }
        id
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        let attached = parent.0 < self.nodes.len();
        self.nodes.push(Node {
            parent: attached.then_some(parent),
            children: Vec::new(),
            data,
        });
        if attached {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Registers a page script for a search-and-pick control: every `input`
    /// event on it schedules a listbox of the options containing the typed
    /// query, rendered after `delay_ticks` cooperative yields.
    pub fn script_suggestions(&mut self, control: NodeId, delay_ticks: u32, options: &[&str]) {
        self.scripted.insert(
            control,
            ScriptedSuggestions {
                delay_ticks,
                options: options.iter().map(|o| o.to_string()).collect(),
            },
        );
    }

    /// Registers a page script that only listens on the labels of a custom
    /// widget: clicks on the widget itself do nothing, clicking one of its
    /// labels selects it.
    pub fn activate_through_label(&mut self, widget: NodeId) {
        self.label_activated.insert(widget);
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn events_for(&self, node: NodeId) -> Vec<DomEvent> {
        self.events
            .iter()
            .filter(|e| e.node == node)
            .map(|e| e.event)
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// First attached element with the given `id` attribute, as a convenience
    /// for tests.
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.element_by_id(id)
    }

    /// Serializes the live state: values, checked and selected flags are
    /// reflected as attributes.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        for child in &self.nodes[self.root.0].children {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.data {
            NodeData::Document => {}
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in self.serialized_attrs(id, el) {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{}\"", escape_attr(&value));
                    }
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                if el.tag == "textarea" {
                    out.push_str(&escape_text(&el.value));
                } else {
                    for child in &node.children {
                        self.write_node(*child, out);
                    }
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }

    fn serialized_attrs(&self, id: NodeId, el: &ElementData) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = el
            .attrs
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "value" | "checked" | "selected"))
            .cloned()
            .collect();
        match el.tag.as_str() {
            "input" => {
                let is_toggle = matches!(
                    dom::input_type(self, id).as_str(),
                    "radio" | "checkbox"
                );
                if is_toggle {
                    if let Some(value) = el.attr("value") {
                        attrs.push(("value".into(), value.to_string()));
                    }
                    if el.checked {
                        attrs.push(("checked".into(), String::new()));
                    }
                } else if !el.value.is_empty() {
                    attrs.push(("value".into(), el.value.clone()));
                }
            }
            "option" => {
                if let Some(value) = el.attr("value") {
                    attrs.push(("value".into(), value.to_string()));
                }
                if el.selected {
                    attrs.push(("selected".into(), String::new()));
                }
            }
            _ => {
                if let Some(value) = el.attr("value") {
                    attrs.push(("value".into(), value.to_string()));
                }
            }
        }
        attrs
    }

    fn element_ref(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn checked_element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, PerceiverError> {
        if id.0 >= self.nodes.len() {
            return Err(PerceiverError::UnknownNode(id));
        }
        self.element_mut(id).ok_or(PerceiverError::NotAnElement(id))
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current.0).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn owning_select(&self, option: NodeId) -> Option<NodeId> {
        dom::closest(self, option, |id| self.tag_name(id) == Some("select"))
    }

    /// Explicitly selected option, else the first one.
    fn effective_selection(&self, select: NodeId) -> Option<NodeId> {
        let options = dom::select_options(self, select);
        options
            .iter()
            .copied()
            .find(|id| self.element_ref(*id).map(|el| el.selected).unwrap_or(false))
            .or_else(|| options.first().copied())
    }

    fn record(&mut self, node: NodeId, event: DomEvent) {
        self.events.push(DispatchedEvent { node, event });
    }

    fn generate_id(&mut self, prefix: &str) -> String {
        self.generated_ids += 1;
        format!("{prefix}-{}", self.generated_ids)
    }

    fn check_radio(&mut self, radio: NodeId) {
        let name = self.attr(radio, "name").map(str::to_string);
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            let peers: Vec<NodeId> = dom::element_descendants(self, self.root)
                .into_iter()
                .filter(|id| *id != radio)
                .filter(|id| self.tag_name(*id) == Some("input"))
                .filter(|id| dom::input_type(self, *id) == "radio")
                .filter(|id| self.attr(*id, "name") == Some(name.as_str()))
                .collect();
            for peer in peers {
                if let Some(el) = self.element_mut(peer) {
                    el.checked = false;
                }
            }
        }
        if let Some(el) = self.element_mut(radio) {
            el.checked = true;
        }
    }

    fn click_default(&mut self, node: NodeId) -> Result<(), PerceiverError> {
        let Some(tag) = self.tag_name(node).map(str::to_string) else {
            return Ok(());
        };
        if tag == "label" {
            if let Some(target) = dom::labelled_control(self, node) {
                if target != node {
                    if self.label_activated.contains(&target) {
                        self.record(target, DomEvent::Click);
                        return self.activate_widget(target);
                    }
                    self.dispatch(target, DomEvent::Click)?;
                }
            }
            return Ok(());
        }
        if self.label_activated.contains(&node) {
            return Ok(());
        }
        if tag == "input" {
            match dom::input_type(self, node).as_str() {
                "radio" => {
                    if !self.checked(node) {
                        self.check_radio(node);
                        self.record(node, DomEvent::Input);
                        self.record(node, DomEvent::Change);
                    }
                }
                "checkbox" => {
                    let next = !self.checked(node);
                    if let Some(el) = self.element_mut(node) {
                        el.checked = next;
                    }
                    self.record(node, DomEvent::Input);
                    self.record(node, DomEvent::Change);
                }
                _ => {}
            }
            return Ok(());
        }
        self.activate_widget(node)
    }

    /// Default click action of a custom choice widget.
    fn activate_widget(&mut self, node: NodeId) -> Result<(), PerceiverError> {
        let role = dom::role(self, node);
        match role.as_deref() {
            Some("option") => {
                let listbox = dom::closest(self, node, |id| dom::has_role(self, id, "listbox"));
                match listbox.and_then(|lb| self.listbox_owner.get(&lb).copied().map(|c| (lb, c)))
                {
                    Some((listbox, control)) => self.commit_suggestion(listbox, control, node)?,
                    None => self.select_exclusive(node, "aria-selected")?,
                }
            }
            Some("radio") => self.select_exclusive(node, "aria-checked")?,
            Some("checkbox") | Some("switch") => {
                let next = if self.attr(node, "aria-checked") == Some("true") {
                    "false"
                } else {
                    "true"
                };
                self.set_attr(node, "aria-checked", next)?;
            }
            _ => {
                for attr in ["aria-pressed", "aria-checked", "aria-selected"] {
                    if self.attr(node, attr).is_some() {
                        self.select_exclusive(node, attr)?;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Sets `attr="true"` on `node` and `"false"` on peers carrying the same
    /// attribute inside its group container.
    fn select_exclusive(&mut self, node: NodeId, attr: &str) -> Result<(), PerceiverError> {
        let group = dom::closest(self, node, |id| {
            id != node
                && matches!(
                    dom::role(self, id).as_deref(),
                    Some("radiogroup") | Some("group") | Some("listbox")
                )
        })
        .or_else(|| self.parent(node));
        if let Some(group) = group {
            let peers: Vec<NodeId> = dom::element_descendants(self, group)
                .into_iter()
                .filter(|id| *id != node && self.attr(*id, attr).is_some())
                .collect();
            for peer in peers {
                self.set_attr(peer, attr, "false")?;
            }
        }
        self.set_attr(node, attr, "true")
    }

    fn commit_suggestion(
        &mut self,
        listbox: NodeId,
        control: NodeId,
        option: NodeId,
    ) -> Result<(), PerceiverError> {
        let text = collapse_whitespace(&self.text_content(option));
        self.select_exclusive(option, "aria-selected")?;
        self.set_value(control, &text)?;
        self.set_attr(listbox, "hidden", "")?;
        self.set_attr(control, "aria-expanded", "false")?;
        self.record(control, DomEvent::Input);
        self.record(control, DomEvent::Change);
        Ok(())
    }

    /// Losing focus cancels pending renders and hides the open listbox.
    fn close_suggestions(&mut self, control: NodeId) -> Result<(), PerceiverError> {
        if !self.scripted.contains_key(&control) {
            return Ok(());
        }
        self.pending.retain(|p| p.control != control);
        let open: Vec<NodeId> = self
            .listbox_owner
            .iter()
            .filter(|(_, owner)| **owner == control)
            .map(|(listbox, _)| *listbox)
            .collect();
        for listbox in open {
            self.set_attr(listbox, "hidden", "")?;
        }
        if self.attr(control, "aria-expanded").is_some() {
            self.set_attr(control, "aria-expanded", "false")?;
        }
        Ok(())
    }

    fn schedule_suggestions(&mut self, control: NodeId) -> Result<(), PerceiverError> {
        let Some(script) = self.scripted.get(&control) else {
            return Ok(());
        };
        let delay = script.delay_ticks;
        self.pending.retain(|p| p.control != control);
        if delay == 0 {
            self.render_suggestions(control)
        } else {
            self.pending.push(PendingRender {
                control,
                remaining: delay,
            });
            Ok(())
        }
    }

    fn render_suggestions(&mut self, control: NodeId) -> Result<(), PerceiverError> {
        let Some(script) = self.scripted.get(&control).cloned() else {
            return Ok(());
        };
        let query = normalize(&self.value(control));
        let matching: Vec<String> = script
            .options
            .into_iter()
            .filter(|option| query.is_empty() || normalize(option).contains(&query))
            .collect();

        let existing = self
            .attr(control, "aria-controls")
            .and_then(|id| self.element_by_id(id));
        let listbox = match existing {
            Some(listbox) => {
                for child in self.children(listbox) {
                    self.remove_node(child)?;
                }
                self.remove_attr(listbox, "hidden")?;
                listbox
            }
            None => {
                let configured = self.attr(control, "aria-controls").map(str::to_string);
                let listbox_id = match configured {
                    Some(id) => id,
                    None => self.generate_id("formfuse-listbox"),
                };
                let host = self.parent(control).unwrap_or(self.root);
                let listbox = self.append_element(
                    host,
                    "div",
                    &[("role", "listbox"), ("id", listbox_id.as_str())],
                    None,
                )?;
                self.set_attr(control, "aria-controls", &listbox_id)?;
                listbox
            }
        };
        self.listbox_owner.insert(listbox, control);
        for option in &matching {
            let option_id = self.generate_id("formfuse-option");
            self.append_element(
                listbox,
                "div",
                &[("role", "option"), ("id", option_id.as_str())],
                Some(option),
            )?;
        }
        self.set_attr(control, "aria-expanded", "true")?;
        debug!(control = %control, options = matching.len(), "suggestions rendered");
        Ok(())
    }
}

impl HostDocument for PageDom {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element_ref(node).map(|el| el.tag.as_str())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element_ref(node).and_then(|el| el.attr(name))
    }

    fn text_content(&self, node: NodeId) -> String {
        let Some(entry) = self.nodes.get(node.0) else {
            return String::new();
        };
        match &entry.data {
            NodeData::Text(text) => text.clone(),
            _ => {
                let mut out = String::new();
                for child in &entry.children {
                    let piece = self.text_content(*child);
                    if !piece.is_empty() {
                        if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                            out.push(' ');
                        }
                        out.push_str(&piece);
                    }
                }
                out
            }
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        dom::element_descendants(self, self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    fn value(&self, node: NodeId) -> String {
        match self.tag_name(node) {
            Some("select") => self
                .effective_selection(node)
                .map(|option| dom::option_value(self, option))
                .unwrap_or_default(),
            Some("input") | Some("textarea") => self
                .element_ref(node)
                .map(|el| el.value.clone())
                .unwrap_or_default(),
            Some("option") => dom::option_value(self, node),
            Some(_) => self
                .attr(node, "value")
                .map(str::to_string)
                .unwrap_or_else(|| collapse_whitespace(&self.text_content(node))),
            None => String::new(),
        }
    }

    fn checked(&self, node: NodeId) -> bool {
        self.element_ref(node).map(|el| el.checked).unwrap_or(false)
    }

    fn selected(&self, option: NodeId) -> bool {
        match self.owning_select(option) {
            Some(select) => self.effective_selection(select) == Some(option),
            None => self.element_ref(option).map(|el| el.selected).unwrap_or(false),
        }
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), PerceiverError> {
        if self.tag_name(node) == Some("select") {
            let option = dom::select_options(self, node)
                .into_iter()
                .find(|option| dom::option_value(self, *option) == value)
                .ok_or_else(|| {
                    PerceiverError::Unsupported(node, format!("no option with value {value:?}"))
                })?;
            return self.select_option(node, option);
        }
        self.checked_element_mut(node)?.value = value.to_string();
        Ok(())
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), PerceiverError> {
        self.checked_element_mut(node)?;
        let is_radio = self.tag_name(node) == Some("input") && dom::input_type(self, node) == "radio";
        if checked && is_radio {
            self.check_radio(node);
        } else if let Some(el) = self.element_mut(node) {
            el.checked = checked;
        }
        Ok(())
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), PerceiverError> {
        self.checked_element_mut(node)?
            .set_attr(&name.to_ascii_lowercase(), value);
        Ok(())
    }

    fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<(), PerceiverError> {
        self.checked_element_mut(node)?
            .remove_attr(&name.to_ascii_lowercase());
        Ok(())
    }

    fn select_option(&mut self, select: NodeId, option: NodeId) -> Result<(), PerceiverError> {
        let options = dom::select_options(self, select);
        if !options.contains(&option) {
            return Err(PerceiverError::Unsupported(
                option,
                format!("not an option of {select}"),
            ));
        }
        for candidate in options {
            if let Some(el) = self.element_mut(candidate) {
                el.selected = candidate == option;
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, node: NodeId, event: DomEvent) -> Result<(), PerceiverError> {
        if node.0 >= self.nodes.len() {
            return Err(PerceiverError::UnknownNode(node));
        }
        self.record(node, event);
        match event {
            DomEvent::Click => self.click_default(node),
            DomEvent::Input => self.schedule_suggestions(node),
            DomEvent::Blur => self.close_suggestions(node),
            _ => Ok(()),
        }
    }

    fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: Option<&str>,
    ) -> Result<NodeId, PerceiverError> {
        if parent.0 >= self.nodes.len() {
            return Err(PerceiverError::UnknownNode(parent));
        }
        if matches!(self.nodes[parent.0].data, NodeData::Text(_)) {
            return Err(PerceiverError::NotAnElement(parent));
        }
        let id = match text {
            Some(text) => self.element_with_text(parent, tag, attrs, text),
            None => self.element(parent, tag, attrs),
        };
        Ok(id)
    }

    fn remove_node(&mut self, node: NodeId) -> Result<(), PerceiverError> {
        if node == self.root {
            return Err(PerceiverError::Unsupported(node, "cannot remove the document".into()));
        }
        let parent = self
            .nodes
            .get(node.0)
            .ok_or(PerceiverError::UnknownNode(node))?
            .parent;
        if let Some(parent) = parent {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
        self.nodes[node.0].parent = None;
        self.listbox_owner.remove(&node);
        Ok(())
    }

    fn run_pending_tasks(&mut self) {
        let mut due = Vec::new();
        for task in &mut self.pending {
            task.remaining = task.remaining.saturating_sub(1);
            if task.remaining == 0 {
                due.push(task.control);
            }
        }
        self.pending.retain(|task| task.remaining > 0);
        for control in due {
            if let Err(err) = self.render_suggestions(control) {
                debug!(control = %control, error = %err, "suggestion render failed");
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <html><body>
          <script>window.evil = 1;</script>
          <form id="apply">
            <label for="email">Email</label>
            <input id="email" name="email" value="old@x.com">
            <textarea name="letter">Dear team</textarea>
            <select name="country">
              <option value="">Select...</option>
              <option value="us">United States</option>
            </select>
            <input type="radio" name="relo" value="yes" checked>
            <input type="radio" name="relo" value="no">
          </form>
        </body></html>
    "#;

    #[test]
    fn loads_state_from_markup() {
        let page = PageDom::from_html(FORM);
        let email = page.by_id("email").unwrap();
        assert_eq!(page.value(email), "old@x.com");

        let controls = dom::interactive_controls(&page);
        assert_eq!(controls.len(), 5);
        let textarea = controls[1];
        assert_eq!(page.value(textarea), "Dear team");
        let select = controls[2];
        assert_eq!(page.value(select), "");
        assert!(page.checked(controls[3]));
        assert!(!page.text_content(page.root()).contains("evil"));
    }

    #[test]
    fn radio_exclusivity_by_name() {
        let mut page = PageDom::from_html(FORM);
        let controls = dom::interactive_controls(&page);
        page.set_checked(controls[4], true).unwrap();
        assert!(!page.checked(controls[3]));
        assert!(page.checked(controls[4]));
    }

    #[test]
    fn select_value_follows_selected_option() {
        let mut page = PageDom::from_html(FORM);
        let select = dom::interactive_controls(&page)[2];
        page.set_value(select, "us").unwrap();
        assert_eq!(page.value(select), "us");
        assert!(page.set_value(select, "ca").is_err());
        assert!(page.to_html().contains(r#"<option value="us" selected>"#));
    }

    #[test]
    fn serialization_reflects_live_values() {
        let mut page = PageDom::from_html(FORM);
        let email = page.by_id("email").unwrap();
        page.set_value(email, "jane@x.com").unwrap();
        let html = page.to_html();
        assert!(html.contains(r#"value="jane@x.com""#));
        assert!(!html.contains("old@x.com"));
        assert!(!html.contains("<script"));

        let reloaded = PageDom::from_html(&html);
        assert_eq!(reloaded.value(reloaded.by_id("email").unwrap()), "jane@x.com");
    }

    #[test]
    fn label_click_activates_radio() {
        let mut page = PageDom::new();
        let body = page.body();
        let radio = page.element(body, "input", &[("type", "radio"), ("id", "r1"), ("name", "g")]);
        let label = page.element_with_text(body, "label", &[("for", "r1")], "Yes");
        page.dispatch(label, DomEvent::Click).unwrap();
        assert!(page.checked(radio));
        assert_eq!(
            page.events_for(radio),
            vec![DomEvent::Click, DomEvent::Input, DomEvent::Change]
        );
    }

    #[test]
    fn role_radio_click_is_exclusive() {
        let mut page = PageDom::new();
        let body = page.body();
        let group = page.element(body, "div", &[("role", "radiogroup")]);
        let yes = page.element_with_text(group, "div", &[("role", "radio"), ("aria-checked", "true")], "Yes");
        let no = page.element_with_text(group, "div", &[("role", "radio"), ("aria-checked", "false")], "No");
        page.dispatch(no, DomEvent::Click).unwrap();
        assert_eq!(page.attr(no, "aria-checked"), Some("true"));
        assert_eq!(page.attr(yes, "aria-checked"), Some("false"));
    }

    #[test]
    fn scripted_suggestions_render_after_yields() {
        let mut page = PageDom::new();
        let body = page.body();
        let combo = page.element(body, "input", &[("role", "combobox")]);
        page.script_suggestions(combo, 2, &["Stanford University", "Yale University"]);

        page.set_value(combo, "stanford").unwrap();
        page.dispatch(combo, DomEvent::Input).unwrap();
        assert!(page.attr(combo, "aria-controls").is_none());

        page.run_pending_tasks();
        assert!(page.attr(combo, "aria-controls").is_none());
        page.run_pending_tasks();

        let listbox = page
            .element_by_id(page.attr(combo, "aria-controls").unwrap())
            .unwrap();
        let options = page.children(listbox);
        assert_eq!(options.len(), 1);
        assert!(dom::is_visible(&page, options[0]));

        page.dispatch(options[0], DomEvent::Click).unwrap();
        assert_eq!(page.value(combo), "Stanford University");
        assert!(!dom::is_visible(&page, options[0]));
        assert_eq!(page.attr(combo, "aria-expanded"), Some("false"));
    }

    #[test]
    fn blur_closes_and_cancels_suggestions() {
        let mut page = PageDom::new();
        let body = page.body();
        let combo = page.element(body, "input", &[("role", "combobox")]);
        page.script_suggestions(combo, 0, &["Yale University"]);

        page.dispatch(combo, DomEvent::Input).unwrap();
        let listbox = page
            .element_by_id(page.attr(combo, "aria-controls").unwrap())
            .unwrap();
        assert!(dom::is_visible(&page, listbox));

        page.dispatch(combo, DomEvent::Blur).unwrap();
        assert!(!dom::is_visible(&page, listbox));
        assert_eq!(page.attr(combo, "aria-expanded"), Some("false"));

        page.script_suggestions(combo, 1, &["Yale University"]);
        page.dispatch(combo, DomEvent::Input).unwrap();
        page.dispatch(combo, DomEvent::Blur).unwrap();
        page.run_pending_tasks();
        assert!(!dom::is_visible(&page, listbox));
    }

    #[test]
    fn label_only_widgets_ignore_direct_clicks() {
        let page_html = r#"<div role="radiogroup">
               <div role="radio" id="remote" aria-checked="false"></div>
               <label for="remote">Remote</label>
             </div>"#;
        let mut page = PageDom::from_html(page_html);
        let remote = page.by_id("remote").unwrap();
        page.activate_through_label(remote);

        page.dispatch(remote, DomEvent::Click).unwrap();
        assert_eq!(page.attr(remote, "aria-checked"), Some("false"));

        let label = dom::labels_for(&page, remote)[0];
        page.dispatch(label, DomEvent::Click).unwrap();
        assert_eq!(page.attr(remote, "aria-checked"), Some("true"));
    }

    #[test]
    fn removed_nodes_leave_the_tree() {
        let mut page = PageDom::new();
        let body = page.body();
        let button = page
            .append_element(body, "button", &[("id", "formfuse-trigger")], Some("Fill"))
            .unwrap();
        assert_eq!(page.element_by_id("formfuse-trigger"), Some(button));
        page.remove_node(button).unwrap();
        assert_eq!(page.element_by_id("formfuse-trigger"), None);
        assert!(!page.to_html().contains("formfuse-trigger"));
    }
}
