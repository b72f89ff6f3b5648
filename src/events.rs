use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::NodeId;

/// Identity of a registered handler. Closures are not comparable, so
/// removal goes through the id handed out at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) u64);

pub(crate) type Handler = Rc<dyn Fn(&mut EventState)>;

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) id: HandlerId,
    pub(crate) capture: bool,
    /// Delegated binding: only fire when the event target matches this
    /// selector.
    pub(crate) delegate: Option<String>,
    pub(crate) handler: Handler,
}

#[derive(Default)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(listener);
    }

    pub(crate) fn remove_by_id(&mut self, node_id: NodeId, event: &str, id: HandlerId) -> bool {
        let Some(events) = self.map.get_mut(&node_id) else {
            return false;
        };
        let Some(listeners) = events.get_mut(event) else {
            return false;
        };

        if let Some(pos) = listeners.iter().position(|listener| listener.id == id) {
            listeners.remove(pos);
            if listeners.is_empty() {
                events.remove(event);
            }
            if events.is_empty() {
                self.map.remove(&node_id);
            }
            return true;
        }
        false
    }

    /// Drops every listener attached to `node_id`, used when the node is
    /// detached for good.
    pub(crate) fn remove_node(&mut self, node_id: NodeId) {
        self.map.remove(&node_id);
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Mutable event context handed to every handler during dispatch.
#[derive(Debug, Clone)]
pub struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The element the event was dispatched to.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The element whose listener is currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stops the event from visiting further nodes; remaining listeners on
    /// the current node still run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stops remaining listeners on the current node as well.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }
}
