use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use tracing::trace;

use crate::collection::{Collection, Target};
use crate::dom::{Dom, NodeId};
use crate::events::{EventState, Handler, ListenerStore};
use crate::html;
use crate::resolve::resolve;
use crate::Result;

/// Synthetic viewport used by the in-viewport check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

/// Bounding box derived from the inline `style` declarations `top`, `left`,
/// `width` and `height` (px). Unstyled dimensions are zero; there is no
/// layout engine behind this.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientRect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub width: f64,
    pub height: f64,
}

pub(crate) struct DocInner {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) next_handler: u64,
    pub(crate) viewport: Viewport,
}

/// Shared handle to one document. Cloning is cheap and every clone sees the
/// same underlying tree; the model is single threaded.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocInner>>,
}

impl Document {
    pub fn new() -> Self {
        Self::from_dom(Dom::new())
    }

    pub fn from_html(markup: &str) -> Result<Self> {
        Ok(Self::from_dom(html::parse_html(markup)?))
    }

    fn from_dom(dom: Dom) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocInner {
                dom,
                listeners: ListenerStore::default(),
                next_handler: 0,
                viewport: Viewport::default(),
            })),
        }
    }

    pub(crate) fn state(&self) -> Ref<'_, DocInner> {
        self.inner.borrow()
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, DocInner> {
        self.inner.borrow_mut()
    }

    /// Builds a [`Collection`] from a selector string, a node, a node list,
    /// or another collection.
    pub fn select(&self, target: impl Into<Target>) -> Result<Collection> {
        match target.into() {
            Target::Selector(selector) => {
                let nodes = resolve(&self.state().dom, &selector, None)?;
                Ok(Collection::from_parts(self.clone(), nodes, Some(selector)))
            }
            Target::Node(node) => {
                let nodes = {
                    let state = self.state();
                    if state.dom.element(node).is_some() {
                        vec![node]
                    } else {
                        Vec::new()
                    }
                };
                Ok(Collection::from_parts(self.clone(), nodes, None))
            }
            Target::Nodes(ids) => {
                let nodes = {
                    let state = self.state();
                    ids.into_iter()
                        .filter(|id| state.dom.element(*id).is_some())
                        .collect()
                };
                Ok(Collection::from_parts(self.clone(), nodes, None))
            }
            Target::Wrapped { nodes, selector } => {
                Ok(Collection::from_parts(self.clone(), nodes, selector))
            }
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.state().viewport
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        self.state_mut().viewport = Viewport { width, height };
    }

    /// Serializes the whole tree back to markup.
    pub fn to_html(&self) -> String {
        let state = self.state();
        state.dom.dump_node(state.dom.root)
    }

    /// Dispatches a synthetic event to every element matching `selector`,
    /// in document order. Returns the final event state per target.
    pub fn dispatch(&self, selector: &str, event_type: &str) -> Result<Vec<EventState>> {
        let targets = resolve(&self.state().dom, selector, None)?;
        Ok(targets
            .into_iter()
            .map(|target| self.dispatch_node(target, event_type))
            .collect())
    }

    /// Capture phase root to parent, target phase (capture listeners before
    /// bubble listeners), then bubble phase parent to root.
    ///
    /// The whole plan, listener snapshots and delegate checks included, is
    /// computed before the first handler runs, so handlers are free to
    /// mutate the document or the listener store.
    pub(crate) fn dispatch_node(&self, target: NodeId, event_type: &str) -> EventState {
        let plan: Vec<(NodeId, Vec<Handler>)> = {
            let state = self.state();

            let mut path = Vec::new();
            let mut cursor = Some(target);
            while let Some(node) = cursor {
                path.push(node);
                cursor = state.dom.parent(node);
            }
            path.reverse();

            let ancestors = &path[..path.len().saturating_sub(1)];
            let mut plan = Vec::new();
            for node in ancestors {
                plan.push((*node, planned_handlers(&state, *node, target, event_type, true)));
            }
            plan.push((target, planned_handlers(&state, target, target, event_type, true)));
            plan.push((target, planned_handlers(&state, target, target, event_type, false)));
            for node in ancestors.iter().rev() {
                plan.push((*node, planned_handlers(&state, *node, target, event_type, false)));
            }
            plan
        };

        let mut event = EventState::new(event_type, target);
        'phases: for (node, handlers) in plan {
            event.current_target = node;
            for handler in handlers {
                handler(&mut event);
                if event.immediate_propagation_stopped {
                    break 'phases;
                }
            }
            if event.propagation_stopped {
                break;
            }
        }

        trace!(
            event = event.event_type.as_str(),
            default_prevented = event.default_prevented,
            stopped = event.propagation_stopped,
            "dispatch done"
        );
        event
    }

    pub(crate) fn rect_of(&self, node: NodeId) -> ClientRect {
        let state = self.state();
        let px = |property: &str| {
            state
                .dom
                .style_get(node, property)
                .ok()
                .and_then(|value| parse_px(&value))
                .unwrap_or(0.0)
        };

        let top = px("top");
        let left = px("left");
        let width = px("width");
        let height = px("height");
        ClientRect {
            top,
            left,
            bottom: top + height,
            right: left + width,
            width,
            height,
        }
    }

    pub(crate) fn rect_in_viewport(&self, rect: ClientRect) -> bool {
        let viewport = self.viewport();
        rect.top >= 0.0
            && rect.left >= 0.0
            && rect.bottom <= viewport.height
            && rect.right <= viewport.width
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn planned_handlers(
    state: &DocInner,
    node: NodeId,
    target: NodeId,
    event_type: &str,
    capture: bool,
) -> Vec<Handler> {
    state
        .listeners
        .get(node, event_type, capture)
        .into_iter()
        .filter(|listener| match &listener.delegate {
            None => true,
            Some(selector) => state
                .dom
                .matches_selector(target, selector)
                .unwrap_or(false),
        })
        .map(|listener| listener.handler)
        .collect()
}

fn parse_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number.parse().ok()
}
