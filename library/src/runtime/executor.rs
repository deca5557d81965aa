//! Runs a node graph.
//!
//! Each tick first fires deferred timers that have come due, then calls
//! `on_execute` on every pull-capable node in data-dependency order. Event
//! pins fire synchronously and depth-first: every action wired to the pin
//! runs, in connection order, before `fire` returns.
//!
//! A node's behavior is taken out of its slot while one of its hooks runs.
//! Reaching it again during that time means an event cycle, and the firing
//! is refused.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::config::ExecutorConfig;
use crate::error::LibraryError;
use crate::graph::analysis::execution_order;
use crate::graph::connection::{Connection, PinDefinition, PinId, PinKind};
use crate::graph::document::GraphDocument;
use crate::graph::node::{GraphNode, NodeId};
use crate::graph::property::PropertyMap;
use crate::logging::Severity;
use crate::node::behavior::{Capabilities, InputEvent, NodeBehavior};
use crate::node::context::NodeContext;
use crate::node::registry::{NodeEnv, NodeRegistry};
use crate::runtime::deferred::DeferredQueue;
use crate::value::Value;

/// A placed node: its pins, properties, output cache and behavior.
pub struct NodeSlot {
    pub id: NodeId,
    pub type_id: String,
    pub properties: PropertyMap,
    pub inputs: Vec<PinDefinition>,
    pub outputs: Vec<PinDefinition>,
    output_values: HashMap<String, Value>,
    /// `None` while one of its hooks is running.
    behavior: Option<Box<dyn NodeBehavior>>,
    capabilities: Capabilities,
}

impl NodeSlot {
    /// Last value written to an output pin.
    pub fn output(&self, pin: &str) -> Value {
        self.output_values.get(pin).cloned().unwrap_or_default()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Only data pins: reading its outputs never has side effects.
    pub fn is_pure(&self) -> bool {
        self.inputs.iter().chain(&self.outputs).all(|p| p.kind.is_data())
    }

    pub fn input_pin(&self, name: &str) -> Option<&PinDefinition> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output_pin(&self, name: &str) -> Option<&PinDefinition> {
        self.outputs.iter().find(|p| p.name == name)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.type_id, self.id)
    }
}

enum Hook<'e> {
    Start,
    Execute,
    Action(&'e str),
    Input(&'e InputEvent),
}

impl Hook<'_> {
    fn name(&self) -> &'static str {
        match self {
            Hook::Start => "on_start",
            Hook::Execute => "on_execute",
            Hook::Action(_) => "on_action",
            Hook::Input(_) => "on_input",
        }
    }

    fn capability(&self) -> Capabilities {
        match self {
            Hook::Start => Capabilities::RESET,
            Hook::Execute => Capabilities::PULL,
            Hook::Action(_) => Capabilities::PUSH,
            Hook::Input(_) => Capabilities::INPUT,
        }
    }
}

enum Dispatch {
    Ran,
    /// The node does not declare the hook's capability.
    Skipped,
    /// One of the node's hooks is already on the stack.
    Busy,
    Missing,
}

pub struct Executor {
    registry: Rc<NodeRegistry>,
    env: NodeEnv,
    /// Placement order.
    slots: Vec<NodeSlot>,
    index: HashMap<NodeId, usize>,
    /// Declaration order; an event fans out in this order.
    connections: Vec<Connection>,
    order: Vec<NodeId>,
    order_dirty: bool,
    timers: DeferredQueue,
    cohort: u64,
    running: bool,
    /// Nodes receiving device input during the current run.
    subscribers: Vec<NodeId>,
    depth: usize,
    max_fire_depth: usize,
    ticks: u64,
}

impl Executor {
    pub fn new(registry: Rc<NodeRegistry>, env: NodeEnv, config: &ExecutorConfig) -> Self {
        Self {
            registry,
            env,
            slots: Vec::new(),
            index: HashMap::new(),
            connections: Vec::new(),
            order: Vec::new(),
            order_dirty: false,
            timers: DeferredQueue::new(),
            cohort: 0,
            running: false,
            subscribers: Vec::new(),
            depth: 0,
            max_fire_depth: config.max_fire_depth,
            ticks: 0,
        }
    }

    pub fn env(&self) -> &NodeEnv {
        &self.env
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn cohort(&self) -> u64 {
        self.cohort
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // ---- graph editing ----

    pub fn add_node(&mut self, type_id: &str, properties: PropertyMap) -> Result<NodeId, LibraryError> {
        self.add_node_with_id(NodeId::new(), type_id, properties)
    }

    pub fn add_node_with_id(
        &mut self,
        id: NodeId,
        type_id: &str,
        mut properties: PropertyMap,
    ) -> Result<NodeId, LibraryError> {
        if self.index.contains_key(&id) {
            return Err(LibraryError::graph(format!("duplicate node id {}", id)));
        }
        let definition = self
            .registry
            .definition(type_id)
            .ok_or_else(|| LibraryError::UnknownNodeType(type_id.to_string()))?;
        properties.merge_defaults(&definition.default_properties);
        let inputs = definition.inputs_for(&properties);
        let outputs = definition.outputs.clone();
        let behavior = self.registry.create(type_id, &self.env)?;
        let capabilities = behavior.capabilities();

        if self.running && capabilities.contains(Capabilities::INPUT) {
            self.subscribers.push(id);
        }
        self.index.insert(id, self.slots.len());
        self.slots.push(NodeSlot {
            id,
            type_id: type_id.to_string(),
            properties,
            inputs,
            outputs,
            output_values: HashMap::new(),
            behavior: Some(behavior),
            capabilities,
        });
        self.order_dirty = true;
        debug!("Added node {} ({})", type_id, id);
        Ok(id)
    }

    /// Removes a node, its connections, its pending timers and its input
    /// subscription.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), LibraryError> {
        let idx = *self.index.get(&id).ok_or(LibraryError::NodeNotFound(id.0))?;
        let mut slot = self.slots.remove(idx);
        if let Some(behavior) = slot.behavior.as_mut() {
            behavior.on_removed();
        }
        self.connections
            .retain(|c| c.from.node_id != id && c.to.node_id != id);
        self.subscribers.retain(|s| *s != id);
        self.timers.cancel_node(id);
        self.rebuild_index();
        self.order_dirty = true;
        Ok(())
    }

    /// Wires an output pin to an input pin.
    ///
    /// Only event to action and data to data edges are valid, and a data
    /// input takes a single connection.
    pub fn connect(&mut self, from: NodeId, from_pin: &str, to: NodeId, to_pin: &str) -> Result<(), LibraryError> {
        let source = self.slot(from).ok_or(LibraryError::NodeNotFound(from.0))?;
        let out_kind = source
            .output_pin(from_pin)
            .map(|p| p.kind)
            .ok_or_else(|| LibraryError::graph(format!("{} has no output '{}'", source.type_id, from_pin)))?;
        let target = self.slot(to).ok_or(LibraryError::NodeNotFound(to.0))?;
        let in_kind = target
            .input_pin(to_pin)
            .map(|p| p.kind)
            .ok_or_else(|| LibraryError::graph(format!("{} has no input '{}'", target.type_id, to_pin)))?;

        match (out_kind, in_kind) {
            (PinKind::Event, PinKind::Action) => {}
            (PinKind::Data(_), PinKind::Data(_)) => {
                if self.connections.iter().any(|c| c.to.node_id == to && c.to.pin_name == to_pin) {
                    return Err(LibraryError::graph(format!(
                        "input '{}' of {} is already connected",
                        to_pin, target.type_id
                    )));
                }
            }
            (a, b) => {
                return Err(LibraryError::graph(format!("cannot connect {} pin to {} pin", a, b)));
            }
        }

        let connection = Connection::new(PinId::new(from, from_pin), PinId::new(to, to_pin));
        if self.connections.contains(&connection) {
            return Err(LibraryError::graph(format!(
                "{} -> {} is already connected",
                connection.from, connection.to
            )));
        }
        self.connections.push(connection);
        self.order_dirty = true;
        Ok(())
    }

    pub fn disconnect(&mut self, from: NodeId, from_pin: &str, to: NodeId, to_pin: &str) -> bool {
        let target = Connection::new(PinId::new(from, from_pin), PinId::new(to, to_pin));
        let before = self.connections.len();
        self.connections.retain(|c| *c != target);
        let removed = self.connections.len() != before;
        if removed {
            self.order_dirty = true;
        }
        removed
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn nodes(&self) -> &[NodeSlot] {
        &self.slots
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSlot> {
        self.slot(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sets a property. Variadic nodes recompute their inputs and lose
    /// connections into pins that no longer exist.
    pub fn set_property(&mut self, id: NodeId, key: &str, value: impl Into<Value>) -> Result<(), LibraryError> {
        let idx = *self.index.get(&id).ok_or(LibraryError::NodeNotFound(id.0))?;
        let registry = self.registry.clone();
        let remaining: Option<HashSet<String>> = {
            let slot = &mut self.slots[idx];
            slot.properties.set(key, value);
            match registry.definition(&slot.type_id) {
                Some(def) if def.dynamic_inputs.is_some() => {
                    slot.inputs = def.inputs_for(&slot.properties);
                    Some(slot.inputs.iter().map(|p| p.name.clone()).collect())
                }
                _ => None,
            }
        };
        if let Some(names) = remaining {
            self.connections
                .retain(|c| c.to.node_id != id || names.contains(&c.to.pin_name));
            self.order_dirty = true;
        }
        Ok(())
    }

    /// Last value on a node's output pin.
    pub fn output(&self, id: NodeId, pin: &str) -> Value {
        self.slot(id).map(|s| s.output(pin)).unwrap_or_default()
    }

    pub fn node_display(&self, id: NodeId) -> Option<String> {
        self.slot(id)?.behavior.as_ref()?.display()
    }

    /// Removes every node.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if let Some(behavior) = slot.behavior.as_mut() {
                behavior.on_removed();
            }
        }
        self.slots.clear();
        self.index.clear();
        self.connections.clear();
        self.order.clear();
        self.order_dirty = false;
        self.subscribers.clear();
        self.timers.clear();
    }

    /// Replaces the graph with `doc`. On error the previous graph is rebuilt
    /// and the error returned.
    pub fn load_graph(&mut self, doc: &GraphDocument) -> Result<(), LibraryError> {
        let previous = self.to_graph();
        self.clear();
        let Err(err) = self.build(doc) else {
            return Ok(());
        };
        self.clear();
        if let Err(restore) = self.build(&previous) {
            warn!("Could not rebuild the previous graph: {}", restore);
            self.clear();
        }
        Err(err)
    }

    fn build(&mut self, doc: &GraphDocument) -> Result<(), LibraryError> {
        for node in &doc.nodes {
            self.add_node_with_id(node.id, &node.type_id, node.properties.clone())?;
        }
        for c in &doc.connections {
            self.connect(c.from.node_id, &c.from.pin_name, c.to.node_id, &c.to.pin_name)?;
        }
        debug!(
            "Loaded graph with {} node(s) and {} connection(s)",
            doc.nodes.len(),
            doc.connections.len()
        );
        Ok(())
    }

    pub fn to_graph(&self) -> GraphDocument {
        GraphDocument {
            nodes: self
                .slots
                .iter()
                .map(|s| GraphNode::new_with_id(s.id, &s.type_id, s.properties.clone()))
                .collect(),
            connections: self.connections.clone(),
        }
    }

    /// Per-tick `on_execute` order.
    pub fn execution_order(&mut self) -> Vec<NodeId> {
        self.ensure_order();
        self.order.clone()
    }

    // ---- running ----

    /// Begins a run: cancels leftovers of any earlier run, resets every
    /// node through `on_start` and subscribes input nodes.
    pub fn start(&mut self) {
        self.cohort += 1;
        self.timers.clear();
        self.running = true;
        self.subscribers = self
            .slots
            .iter()
            .filter(|s| s.capabilities.contains(Capabilities::INPUT))
            .map(|s| s.id)
            .collect();
        let ids: Vec<NodeId> = self.slots.iter().map(|s| s.id).collect();
        for id in ids {
            self.run_hook(id, Hook::Start);
        }
        info!("Run {} started with {} node(s)", self.cohort, self.slots.len());
    }

    /// Ends the run. Deferred firings are dropped and input subscriptions
    /// closed; node state is reset by the next `start`.
    pub fn stop(&mut self) {
        let cancelled = self.timers.len();
        self.running = false;
        self.timers.clear();
        self.cohort += 1;
        for id in std::mem::take(&mut self.subscribers) {
            if let Some(behavior) = self.slot_mut(id).and_then(|s| s.behavior.as_mut()) {
                behavior.on_unsubscribed();
            }
        }
        info!("Run stopped, {} deferred firing(s) cancelled", cancelled);
    }

    /// One scheduler pass.
    pub fn tick(&mut self) {
        self.poll_timers();
        self.ensure_order();
        let order = self.order.clone();
        for id in order {
            self.run_hook(id, Hook::Execute);
        }
        self.ticks += 1;
        debug!("Tick {} done", self.ticks);
    }

    /// Fires every deferred event that is due. Returns how many fired.
    pub fn poll_timers(&mut self) -> usize {
        let due = self.timers.take_due(self.now(), self.cohort);
        let count = due.len();
        for entry in due {
            debug!("Deferred fire {}:{}", entry.node, entry.pin);
            self.fire(entry.node, &entry.pin);
        }
        count
    }

    /// Delivers a device event to the nodes subscribed in this run.
    pub fn dispatch_input(&mut self, event: &InputEvent) {
        if !self.running {
            debug!("Ignoring {:?}: not running", event);
            return;
        }
        for id in self.subscribers.clone() {
            self.run_hook(id, Hook::Input(event));
        }
    }

    /// Presses a node's button.
    pub fn click(&mut self, id: NodeId) -> Result<(), LibraryError> {
        match self.run_hook(id, Hook::Input(&InputEvent::Click)) {
            Dispatch::Missing => Err(LibraryError::NodeNotFound(id.0)),
            Dispatch::Skipped => Err(LibraryError::node(format!("{} cannot be clicked", self.describe(id)))),
            Dispatch::Ran | Dispatch::Busy => Ok(()),
        }
    }

    // ---- primitives behind NodeContext ----

    pub(crate) fn read_input(&mut self, node: NodeId, pin: &str) -> Value {
        let Some(source) = self
            .connections
            .iter()
            .find(|c| c.to.node_id == node && c.to.pin_name == pin)
            .map(|c| c.from.clone())
        else {
            return Value::Undefined;
        };
        // Outside the tick pass, pure producers are re-run so a reader sees
        // the state left by the actions that ran before it. Volatile ones
        // keep their value for the whole tick.
        let refresh = self
            .slot(source.node_id)
            .is_some_and(|s| s.is_pure() && !s.capabilities.contains(Capabilities::VOLATILE));
        if self.depth > 0 && refresh {
            self.run_hook(source.node_id, Hook::Execute);
        }
        self.output(source.node_id, &source.pin_name)
    }

    pub(crate) fn write_output(&mut self, node: NodeId, pin: &str, value: Value) {
        if let Some(idx) = self.index.get(&node).copied() {
            let slot = &mut self.slots[idx];
            if slot.output_pin(pin).is_none() {
                debug!("{} wrote undeclared output '{}'", slot.describe(), pin);
            }
            slot.output_values.insert(pin.to_string(), value);
        }
    }

    pub(crate) fn fire(&mut self, node: NodeId, pin: &str) {
        let targets: Vec<PinId> = self
            .connections
            .iter()
            .filter(|c| c.from.node_id == node && c.from.pin_name == pin)
            .map(|c| c.to.clone())
            .collect();
        if targets.is_empty() {
            return;
        }
        if self.depth >= self.max_fire_depth {
            let message = format!(
                "Event chain deeper than {} at {}:{}; branch aborted",
                self.max_fire_depth,
                self.describe(node),
                pin
            );
            error!("{}", message);
            self.log_line(&message, Severity::Error);
            return;
        }
        debug!("Fire {}:{} -> {} action(s)", node, pin, targets.len());
        self.depth += 1;
        for target in targets {
            if let Dispatch::Busy = self.run_hook(target.node_id, Hook::Action(&target.pin_name)) {
                let message = format!(
                    "Event cycle: {} is already running, firing from {}:{} refused",
                    self.describe(target.node_id),
                    self.describe(node),
                    pin
                );
                warn!("{}", message);
                self.log_line(&message, Severity::Error);
            }
        }
        self.depth -= 1;
    }

    pub(crate) fn schedule_fire(&mut self, node: NodeId, pin: &str, delay_ms: f64) {
        let due = self.now() + delay_ms.max(0.0);
        self.timers.schedule(due, self.cohort, node, pin);
    }

    pub(crate) fn node_properties(&self, node: NodeId) -> Option<&PropertyMap> {
        self.slot(node).map(|s| &s.properties)
    }

    pub(crate) fn data_input_names(&self, node: NodeId) -> Vec<String> {
        self.slot(node)
            .map(|s| {
                s.inputs
                    .iter()
                    .filter(|p| p.kind.is_data())
                    .map(|p| p.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn log_line(&self, message: &str, severity: Severity) {
        self.env.log.log(message, severity);
    }

    pub(crate) fn now(&self) -> f64 {
        self.env.clock.now_ms()
    }

    // ---- internals ----

    fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        self.index.get(&id).map(|&i| &self.slots[i])
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.index.get(&id).map(|&i| &mut self.slots[i])
    }

    fn describe(&self, id: NodeId) -> String {
        self.slot(id)
            .map(NodeSlot::describe)
            .unwrap_or_else(|| id.to_string())
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
    }

    fn is_data_connection(&self, c: &Connection) -> bool {
        self.slot(c.from.node_id)
            .and_then(|s| s.output_pin(&c.from.pin_name))
            .is_some_and(|p| p.kind.is_data())
    }

    fn ensure_order(&mut self) {
        if !self.order_dirty {
            return;
        }
        let ids: Vec<NodeId> = self.slots.iter().map(|s| s.id).collect();
        let order = execution_order(&ids, &self.connections, |c| self.is_data_connection(c));
        self.order = order;
        self.order_dirty = false;
    }

    fn run_hook(&mut self, id: NodeId, hook: Hook<'_>) -> Dispatch {
        let Some(idx) = self.index.get(&id).copied() else {
            return Dispatch::Missing;
        };
        if !self.slots[idx].capabilities.contains(hook.capability()) {
            return Dispatch::Skipped;
        }
        let Some(mut behavior) = self.slots[idx].behavior.take() else {
            return Dispatch::Busy;
        };
        let result = {
            let mut ctx = NodeContext::new(self, id);
            match &hook {
                Hook::Start => behavior.on_start(&mut ctx),
                Hook::Execute => behavior.on_execute(&mut ctx),
                Hook::Action(action) => behavior.on_action(action, &mut ctx),
                Hook::Input(event) => behavior.on_input(event, &mut ctx),
            }
        };
        if let Some(idx) = self.index.get(&id).copied() {
            self.slots[idx].behavior = Some(behavior);
        }
        if let Err(err) = result {
            let message = format!("{} failed in {}: {}", self.describe(id), hook.name(), err);
            warn!("{}", message);
            self.log_line(&message, Severity::Error);
        }
        Dispatch::Ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RuntimeConfig;
    use crate::logging::MemoryLog;
    use crate::node::registry::HeadlessHost;
    use crate::sprite::stage::Stage;
    use crate::vars::VariableStore;

    fn executor() -> Executor {
        let clock = Rc::new(ManualClock::new());
        let log = Rc::new(MemoryLog::new());
        let config = RuntimeConfig::default();
        let env = NodeEnv {
            vars: VariableStore::new(),
            stage: Stage::new(&config, clock.clone(), log.clone()).into_handle(),
            host: Rc::new(HeadlessHost::new(log.clone())),
            clock,
            log,
        };
        Executor::new(Rc::new(NodeRegistry::with_builtin()), env, &config.executor)
    }

    #[test]
    fn rejects_mismatched_pin_kinds() {
        let mut exec = executor();
        let start = exec.add_node("events.on_start", PropertyMap::new()).unwrap();
        let number = exec.add_node("math.number", PropertyMap::new()).unwrap();
        let add = exec.add_node("math.add", PropertyMap::new()).unwrap();
        assert!(exec.connect(start, "out", add, "a").is_err());
        assert!(exec.connect(number, "out", add, "missing").is_err());
        assert!(exec.connect(number, "out", add, "a").is_ok());
    }

    #[test]
    fn rejects_second_connection_into_data_input() {
        let mut exec = executor();
        let a = exec.add_node("math.number", PropertyMap::new()).unwrap();
        let b = exec.add_node("math.number", PropertyMap::new()).unwrap();
        let add = exec.add_node("math.add", PropertyMap::new()).unwrap();
        exec.connect(a, "out", add, "a").unwrap();
        let err = exec.connect(b, "out", add, "a").unwrap_err();
        assert!(matches!(err, LibraryError::Graph(_)));
    }

    #[test]
    fn unknown_type_is_reported() {
        let mut exec = executor();
        let err = exec.add_node("nope.nothing", PropertyMap::new()).unwrap_err();
        assert!(matches!(err, LibraryError::UnknownNodeType(_)));
    }

    #[test]
    fn defaults_are_merged_into_properties() {
        let mut exec = executor();
        let id = exec.add_node("control.loop", PropertyMap::new()).unwrap();
        assert_eq!(exec.node(id).unwrap().properties.get_number("count", 0.0), 10.0);
    }

    #[test]
    fn shrinking_combine_drops_dangling_connections() {
        let mut exec = executor();
        let n = exec.add_node("math.number", PropertyMap::new()).unwrap();
        let combine = exec
            .add_node("arrays.combine", PropertyMap::new().with("input_count", 3.0))
            .unwrap();
        exec.connect(n, "out", combine, "2").unwrap();
        exec.set_property(combine, "input_count", 2.0).unwrap();
        assert!(exec.connections().is_empty());
        assert_eq!(exec.node(combine).unwrap().inputs.len(), 2);
    }

    #[test]
    fn data_producers_run_first() {
        let mut exec = executor();
        let add = exec.add_node("math.add", PropertyMap::new()).unwrap();
        let n = exec
            .add_node("math.number", PropertyMap::new().with("value", 4.0))
            .unwrap();
        exec.connect(n, "out", add, "a").unwrap();
        exec.tick();
        assert_eq!(exec.output(add, "out"), Value::Number(4.0));
    }
}
