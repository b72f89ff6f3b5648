use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::document::{ClientRect, Document};
use crate::dom::{InsertPosition, NodeId};
use crate::events::{EventState, HandlerId, Listener};
use crate::resolve::resolve;
use crate::{Error, Result};

/// Accepted inputs for [`Document::select`], normalized to one ordered
/// element sequence. Non-element nodes are filtered out silently.
#[derive(Debug, Clone)]
pub enum Target {
    Selector(String),
    Node(NodeId),
    Nodes(Vec<NodeId>),
    Wrapped {
        nodes: Vec<NodeId>,
        selector: Option<String>,
    },
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

impl From<Vec<NodeId>> for Target {
    fn from(nodes: Vec<NodeId>) -> Self {
        Target::Nodes(nodes)
    }
}

impl From<&Collection> for Target {
    fn from(collection: &Collection) -> Self {
        Target::Wrapped {
            nodes: collection.nodes.clone(),
            selector: collection.selector.clone(),
        }
    }
}

/// A snapshot of matched elements plus chainable operations over them.
///
/// Bulk mutations apply to every element and return `&mut Self`; a blank or
/// invalid argument is a silent no-op so chains never break. Reads that
/// need an element operate on the first one and fail with
/// [`Error::EmptyCollection`] when there is none. Traversal always builds a
/// new collection and never mutates in place.
pub struct Collection {
    doc: Document,
    nodes: Vec<NodeId>,
    // Advisory only: composed by find(), never re-executed.
    selector: Option<String>,
    // (element, event type) -> handlers this collection registered, so
    // removal never needs the closures back.
    events: HashMap<(NodeId, String), Vec<HandlerId>>,
    // Method-name hooks, run after the named operation completes.
    hooks: HashMap<String, Vec<Rc<dyn Fn()>>>,
}

impl Collection {
    pub(crate) fn from_parts(doc: Document, nodes: Vec<NodeId>, selector: Option<String>) -> Self {
        Self {
            doc,
            nodes,
            selector,
            events: HashMap::new(),
            hooks: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The advisory selector this collection was built from, if any.
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn first_node(&self, op: &str) -> Result<NodeId> {
        self.nodes
            .first()
            .copied()
            .ok_or_else(|| Error::EmptyCollection(op.into()))
    }

    fn derive(&self, nodes: Vec<NodeId>, selector: Option<String>) -> Collection {
        Collection::from_parts(self.doc.clone(), nodes, selector)
    }

    fn notify(&self, method: &str) {
        let Some(callbacks) = self.hooks.get(method) else {
            return;
        };
        for callback in callbacks.clone() {
            callback();
        }
    }

    // ---- bulk mutation ------------------------------------------------

    /// Adds each whitespace-separated class token to every element.
    pub fn add_class(&mut self, class_names: &str) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for token in class_names.split_whitespace() {
                for &node in &self.nodes {
                    let _ = state.dom.class_add(node, token);
                }
            }
        }
        self.notify("add_class");
        self
    }

    pub fn remove_class(&mut self, class_names: &str) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for token in class_names.split_whitespace() {
                for &node in &self.nodes {
                    let _ = state.dom.class_remove(node, token);
                }
            }
        }
        self.notify("remove_class");
        self
    }

    pub fn toggle_class(&mut self, class_names: &str) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for token in class_names.split_whitespace() {
                for &node in &self.nodes {
                    let _ = state.dom.class_toggle(node, token);
                }
            }
        }
        self.notify("toggle_class");
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> &mut Self {
        if !name.trim().is_empty() {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.set_attr(node, name, value);
            }
        }
        self.notify("set_attribute");
        self
    }

    pub fn remove_attribute(&mut self, name: &str) -> &mut Self {
        if !name.trim().is_empty() {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.remove_attr(node, name);
            }
        }
        self.notify("remove_attribute");
        self
    }

    pub fn show(&mut self) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.style_set(node, "display", "block");
            }
        }
        self.notify("show");
        self
    }

    pub fn hide(&mut self) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.style_set(node, "display", "none");
            }
        }
        self.notify("hide");
        self
    }

    /// Per element: hidden ones are shown, visible ones hidden.
    pub fn toggle(&mut self) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let value = if state.dom.is_visible(node) {
                    "none"
                } else {
                    "block"
                };
                let _ = state.dom.style_set(node, "display", value);
            }
        }
        self.notify("toggle");
        self
    }

    /// Removes all children of every element.
    pub fn empty(&mut self) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.set_text_content(node, "");
            }
        }
        self.notify("empty");
        self
    }

    /// Replaces the inner markup of every element. A fragment that fails to
    /// parse is a no-op.
    pub fn html(&mut self, markup: &str) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.set_inner_html(node, markup);
            }
        }
        self.notify("html");
        self
    }

    pub fn set_text(&mut self, text: &str) -> &mut Self {
        {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.set_text_content(node, text);
            }
        }
        self.notify("set_text");
        self
    }

    pub fn append(&mut self, markup: &str) -> &mut Self {
        self.insert(markup, InsertPosition::BeforeEnd);
        self.notify("append");
        self
    }

    pub fn prepend(&mut self, markup: &str) -> &mut Self {
        self.insert(markup, InsertPosition::AfterBegin);
        self.notify("prepend");
        self
    }

    pub fn before(&mut self, markup: &str) -> &mut Self {
        self.insert(markup, InsertPosition::BeforeBegin);
        self.notify("before");
        self
    }

    pub fn after(&mut self, markup: &str) -> &mut Self {
        self.insert(markup, InsertPosition::AfterEnd);
        self.notify("after");
        self
    }

    fn insert(&mut self, markup: &str, position: InsertPosition) {
        if markup.trim().is_empty() {
            return;
        }
        let mut state = self.doc.state_mut();
        for &node in &self.nodes {
            let _ = state.dom.insert_html(node, markup, position);
        }
    }

    /// Detaches every element from the tree, drops their listeners, and
    /// leaves this collection empty. Terminal for the collection.
    pub fn remove(&mut self) -> &mut Self {
        self.remove_all_events();
        {
            let mut state = self.doc.state_mut();
            for &node in &self.nodes {
                let _ = state.dom.remove_node(node);
                state.listeners.remove_node(node);
            }
        }
        self.nodes.clear();
        self.notify("remove");
        self
    }

    /// Runs `callback` once per element, in order. The callback receives
    /// the index and the node id.
    pub fn each(&mut self, mut callback: impl FnMut(usize, NodeId)) -> &mut Self {
        for (index, &node) in self.nodes.iter().enumerate() {
            callback(index, node);
        }
        self.notify("each");
        self
    }

    // ---- first-element reads ------------------------------------------

    pub fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let node = self.first_node("get_attribute")?;
        Ok(self.doc.state().dom.attr(node, name))
    }

    pub fn has_class(&self, class_name: &str) -> Result<bool> {
        let node = self.first_node("has_class")?;
        self.doc.state().dom.class_contains(node, class_name)
    }

    pub fn inner_html(&self) -> Result<String> {
        let node = self.first_node("inner_html")?;
        self.doc.state().dom.inner_html(node)
    }

    pub fn outer_html(&self) -> Result<String> {
        let node = self.first_node("outer_html")?;
        self.doc.state().dom.outer_html(node)
    }

    pub fn text(&self) -> Result<String> {
        let node = self.first_node("text")?;
        Ok(self.doc.state().dom.text_content(node))
    }

    /// Whether the first element has a descendant matching `selector`.
    pub fn contains(&self, selector: &str) -> Result<bool> {
        let node = self.first_node("contains")?;
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        let matched = resolve(&self.doc.state().dom, trimmed, Some(node))?;
        Ok(!matched.is_empty())
    }

    pub fn client_rect(&self) -> Result<ClientRect> {
        let node = self.first_node("client_rect")?;
        Ok(self.doc.rect_of(node))
    }

    pub fn in_viewport(&self) -> Result<bool> {
        let node = self.first_node("in_viewport")?;
        Ok(self.doc.rect_in_viewport(self.doc.rect_of(node)))
    }

    // ---- traversal ----------------------------------------------------

    /// Resolves `selector` against each element's subtree and concatenates
    /// the results. Matches repeating across overlapping parents are kept.
    /// The new collection's advisory selector is
    /// `parent-selector + " " + selector`.
    pub fn find(&self, selector: &str) -> Result<Collection> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidSelector(selector.into()));
        }

        let composed = match &self.selector {
            Some(parent) => format!("{parent} {trimmed}"),
            None => trimmed.to_string(),
        };

        let mut found = Vec::new();
        {
            let state = self.doc.state();
            for &node in &self.nodes {
                found.extend(resolve(&state.dom, trimmed, Some(node))?);
            }
        }
        debug!(selector = composed.as_str(), matched = found.len(), "find");
        Ok(self.derive(found, Some(composed)))
    }

    /// First element child of each element.
    pub fn child(&self) -> Collection {
        let nodes = {
            let state = self.doc.state();
            self.nodes
                .iter()
                .filter_map(|&node| state.dom.first_element_child(node))
                .collect()
        };
        self.derive(nodes, self.selector.clone())
    }

    /// Every element child of each element.
    pub fn children(&self) -> Collection {
        let nodes = {
            let state = self.doc.state();
            self.nodes
                .iter()
                .flat_map(|&node| state.dom.element_children(node))
                .collect()
        };
        self.derive(nodes, self.selector.clone())
    }

    /// Parent element of the first element.
    pub fn parent(&self) -> Collection {
        let nodes = {
            let state = self.doc.state();
            self.nodes
                .first()
                .and_then(|&node| state.dom.parent(node))
                .filter(|&parent| state.dom.element(parent).is_some())
                .into_iter()
                .collect()
        };
        self.derive(nodes, None)
    }

    /// Parent element of every element; duplicates across siblings are
    /// kept.
    pub fn parents(&self) -> Collection {
        let nodes = {
            let state = self.doc.state();
            self.nodes
                .iter()
                .filter_map(|&node| state.dom.parent(node))
                .filter(|&parent| state.dom.element(parent).is_some())
                .collect()
        };
        self.derive(nodes, None)
    }

    pub fn next(&self) -> Collection {
        let nodes = {
            let state = self.doc.state();
            self.nodes
                .iter()
                .filter_map(|&node| state.dom.next_element_sibling(node))
                .collect()
        };
        self.derive(nodes, None)
    }

    pub fn previous(&self) -> Collection {
        let nodes = {
            let state = self.doc.state();
            self.nodes
                .iter()
                .filter_map(|&node| state.dom.previous_element_sibling(node))
                .collect()
        };
        self.derive(nodes, None)
    }

    /// Element siblings of each element, the element itself excluded.
    pub fn siblings(&self) -> Collection {
        let nodes = {
            let state = self.doc.state();
            let mut out = Vec::new();
            for &node in &self.nodes {
                let Some(parent) = state.dom.parent(node) else {
                    continue;
                };
                out.extend(
                    state
                        .dom
                        .element_children(parent)
                        .into_iter()
                        .filter(|&sibling| sibling != node),
                );
            }
            out
        };
        self.derive(nodes, None)
    }

    /// New collection holding only the first element; keeps the selector.
    pub fn first(&self) -> Collection {
        self.derive(
            self.nodes.first().copied().into_iter().collect(),
            self.selector.clone(),
        )
    }

    pub fn last(&self) -> Collection {
        self.derive(
            self.nodes.last().copied().into_iter().collect(),
            self.selector.clone(),
        )
    }

    /// New collection holding the elements the predicate keeps.
    pub fn filter(&self, mut predicate: impl FnMut(usize, NodeId) -> bool) -> Collection {
        let nodes = self
            .nodes
            .iter()
            .copied()
            .enumerate()
            .filter(|&(index, node)| predicate(index, node))
            .map(|(_, node)| node)
            .collect();
        self.derive(nodes, self.selector.clone())
    }

    /// New collection holding this collection's elements followed by the
    /// matches of each given selector. Blank selectors are skipped.
    pub fn combine(&self, selectors: &[&str]) -> Result<Collection> {
        let mut nodes = self.nodes.clone();
        {
            let state = self.doc.state();
            for selector in selectors {
                if selector.trim().is_empty() {
                    continue;
                }
                nodes.extend(resolve(&state.dom, selector, None)?);
            }
        }
        Ok(self.derive(nodes, self.selector.clone()))
    }

    // ---- events -------------------------------------------------------

    /// Binds a bubble-phase listener on every element and records it so
    /// [`Collection::remove_event`] can unbind without the closure.
    pub fn add_event(
        &mut self,
        event: &str,
        handler: impl Fn(&mut EventState) + 'static,
    ) -> &mut Self {
        self.bind(event, None, false, handler);
        self.notify("add_event");
        self
    }

    pub fn add_event_capture(
        &mut self,
        event: &str,
        handler: impl Fn(&mut EventState) + 'static,
    ) -> &mut Self {
        self.bind(event, None, true, handler);
        self.notify("add_event_capture");
        self
    }

    /// Delegated binding: one listener per element that only fires when the
    /// event target matches `delegate_selector` (bubble-and-filter).
    pub fn on(
        &mut self,
        event: &str,
        delegate_selector: &str,
        handler: impl Fn(&mut EventState) + 'static,
    ) -> &mut Self {
        let delegate = delegate_selector.trim();
        if !delegate.is_empty() {
            self.bind(event, Some(delegate.to_string()), false, handler);
        }
        self.notify("on");
        self
    }

    fn bind(
        &mut self,
        event: &str,
        delegate: Option<String>,
        capture: bool,
        handler: impl Fn(&mut EventState) + 'static,
    ) {
        let event = event.trim();
        if event.is_empty() {
            return;
        }
        let handler: Rc<dyn Fn(&mut EventState)> = Rc::new(handler);

        let mut state = self.doc.state_mut();
        for &node in &self.nodes {
            let id = HandlerId(state.next_handler);
            state.next_handler += 1;
            state.listeners.add(
                node,
                event.to_string(),
                Listener {
                    id,
                    capture,
                    delegate: delegate.clone(),
                    handler: handler.clone(),
                },
            );
            self.events
                .entry((node, event.to_string()))
                .or_default()
                .push(id);
        }
    }

    /// Unbinds every handler this collection registered for `event`.
    /// Removal walks a snapshot of the registry keys, so it is safe to call
    /// from within a running handler.
    pub fn remove_event(&mut self, event: &str) -> &mut Self {
        let event = event.trim();
        if !event.is_empty() {
            let keys: Vec<(NodeId, String)> = self
                .events
                .keys()
                .filter(|(_, name)| name == event)
                .cloned()
                .collect();
            let mut state = self.doc.state_mut();
            for key in keys {
                if let Some(ids) = self.events.remove(&key) {
                    for id in ids {
                        state.listeners.remove_by_id(key.0, &key.1, id);
                    }
                }
            }
        }
        self.notify("remove_event");
        self
    }

    pub fn remove_all_events(&mut self) -> &mut Self {
        let keys: Vec<(NodeId, String)> = self.events.keys().cloned().collect();
        {
            let mut state = self.doc.state_mut();
            for key in keys {
                if let Some(ids) = self.events.remove(&key) {
                    for id in ids {
                        state.listeners.remove_by_id(key.0, &key.1, id);
                    }
                }
            }
        }
        self.notify("remove_all_events");
        self
    }

    /// Dispatches a synthetic event to every element in the collection.
    pub fn trigger(&self, event_type: &str) -> Vec<EventState> {
        self.nodes
            .iter()
            .map(|&node| self.doc.dispatch_node(node, event_type))
            .collect()
    }

    // ---- method hooks -------------------------------------------------

    /// Registers a callback to run after each completion of the named
    /// operation on this collection, in registration order.
    pub fn listen(&mut self, method: &str, callback: impl Fn() + 'static) -> &mut Self {
        let method = method.trim();
        if !method.is_empty() {
            self.hooks
                .entry(method.to_string())
                .or_default()
                .push(Rc::new(callback));
        }
        self
    }

    pub fn stop_listening(&mut self, method: &str) -> &mut Self {
        self.hooks.remove(method.trim());
        self
    }
}
