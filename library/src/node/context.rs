//! Scheduler primitives handed to node hooks.

use crate::graph::node::NodeId;
use crate::graph::property::PropertyMap;
use crate::logging::Severity;
use crate::runtime::executor::Executor;
use crate::value::Value;

/// A node's view of the running graph during one hook call.
pub struct NodeContext<'a> {
    exec: &'a mut Executor,
    node: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(exec: &'a mut Executor, node: NodeId) -> Self {
        Self { exec, node }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Current value on a data input; `Undefined` when unconnected.
    pub fn input(&mut self, pin: &str) -> Value {
        self.exec.read_input(self.node, pin)
    }

    /// The input, or `default` when it is `undefined`/`null`.
    pub fn input_or(&mut self, pin: &str, default: impl Into<Value>) -> Value {
        self.input(pin).or_else(default)
    }

    /// Numeric input. Nullish or non-numeric values give `default`.
    pub fn input_number(&mut self, pin: &str, default: f64) -> f64 {
        let n = self.input(pin).number_or(default);
        if n.is_nan() { default } else { n }
    }

    /// Numeric input falling back to the property of the same role.
    pub fn input_number_or_property(&mut self, pin: &str, key: &str, default: f64) -> f64 {
        let fallback = self.property_number(key, default);
        self.input_number(pin, fallback)
    }

    pub fn set_output(&mut self, pin: &str, value: impl Into<Value>) {
        self.exec.write_output(self.node, pin, value.into());
    }

    /// Synchronously runs every action wired to the event pin `pin`.
    pub fn fire(&mut self, pin: &str) {
        self.exec.fire(self.node, pin);
    }

    /// Fires `pin` once `delay_ms` have passed on the executor clock,
    /// unless the run is stopped first.
    pub fn schedule_fire(&mut self, delay_ms: f64, pin: &str) {
        self.exec.schedule_fire(self.node, pin, delay_ms);
    }

    pub fn properties(&self) -> Option<&PropertyMap> {
        self.exec.node_properties(self.node)
    }

    pub fn property(&self, key: &str) -> Value {
        self.properties().map(|p| p.value(key)).unwrap_or_default()
    }

    pub fn property_number(&self, key: &str, default: f64) -> f64 {
        self.properties()
            .map(|p| p.get_number(key, default))
            .unwrap_or(default)
    }

    pub fn property_bool(&self, key: &str, default: bool) -> bool {
        self.properties()
            .map(|p| p.get_bool(key, default))
            .unwrap_or(default)
    }

    pub fn property_string(&self, key: &str, default: &str) -> String {
        self.properties()
            .map(|p| p.get_string(key, default))
            .unwrap_or_else(|| default.to_string())
    }

    /// Names of this node's data inputs, in declaration order.
    pub fn data_inputs(&self) -> Vec<String> {
        self.exec.data_input_names(self.node)
    }

    pub fn log(&self, message: &str, severity: Severity) {
        self.exec.log_line(message, severity);
    }

    /// Executor clock, in milliseconds.
    pub fn now(&self) -> f64 {
        self.exec.now()
    }
}
