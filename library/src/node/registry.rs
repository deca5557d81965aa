//! Node type registry and the services injected into node behaviors.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use log::debug;

use crate::clock::ClockHandle;
use crate::error::LibraryError;
use crate::logging::{LogHandle, Severity};
use crate::node::behavior::NodeBehavior;
use crate::node::catalog;
use crate::node::types::NodeTypeDefinition;
use crate::sprite::stage::StageHandle;
use crate::vars::VariableStore;

/// Dialogs and sound the host environment provides.
pub trait HostServices {
    fn alert(&self, message: &str);
    /// `None` when the user cancels.
    fn prompt(&self, question: &str) -> Option<String>;
    fn beep(&self, frequency: f64, duration_ms: f64);
}

/// Host without a UI: alerts go to the log, prompts answer from a queue.
pub struct HeadlessHost {
    log: LogHandle,
    answers: RefCell<VecDeque<String>>,
    alerts: RefCell<Vec<String>>,
    beeps: RefCell<Vec<(f64, f64)>>,
}

impl HeadlessHost {
    pub fn new(log: LogHandle) -> Self {
        Self {
            log,
            answers: RefCell::new(VecDeque::new()),
            alerts: RefCell::new(Vec::new()),
            beeps: RefCell::new(Vec::new()),
        }
    }

    /// Queues answers returned by successive prompts.
    pub fn with_answers<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers.borrow_mut().extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn beeps(&self) -> Vec<(f64, f64)> {
        self.beeps.borrow().clone()
    }
}

impl HostServices for HeadlessHost {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
        self.log.log(message, Severity::Info);
    }

    fn prompt(&self, question: &str) -> Option<String> {
        let answer = self.answers.borrow_mut().pop_front();
        debug!("prompt '{}' answered with {:?}", question, answer);
        answer
    }

    fn beep(&self, frequency: f64, duration_ms: f64) {
        debug!("beep {}Hz for {}ms", frequency, duration_ms);
        self.beeps.borrow_mut().push((frequency, duration_ms));
    }
}

/// What a node behavior may touch, handed over at construction.
#[derive(Clone)]
pub struct NodeEnv {
    pub vars: VariableStore,
    pub stage: StageHandle,
    pub host: Rc<dyn HostServices>,
    pub clock: ClockHandle,
    pub log: LogHandle,
}

pub type NodeFactory = Rc<dyn Fn(&NodeEnv) -> Box<dyn NodeBehavior>>;

struct RegisteredType {
    definition: NodeTypeDefinition,
    factory: NodeFactory,
}

/// Maps type ids to definitions and behavior factories.
#[derive(Default)]
pub struct NodeRegistry {
    types: BTreeMap<String, RegisteredType>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in node type.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        catalog::register_all(&mut registry);
        registry
    }

    /// Registers (or replaces) a node type.
    pub fn register<F>(&mut self, definition: NodeTypeDefinition, factory: F)
    where
        F: Fn(&NodeEnv) -> Box<dyn NodeBehavior> + 'static,
    {
        debug!("Registering node type {}", definition.type_id);
        self.types.insert(
            definition.type_id.clone(),
            RegisteredType {
                definition,
                factory: Rc::new(factory),
            },
        );
    }

    pub fn definition(&self, type_id: &str) -> Option<&NodeTypeDefinition> {
        self.types.get(type_id).map(|t| &t.definition)
    }

    pub fn create(&self, type_id: &str, env: &NodeEnv) -> Result<Box<dyn NodeBehavior>, LibraryError> {
        let registered = self
            .types
            .get(type_id)
            .ok_or_else(|| LibraryError::UnknownNodeType(type_id.to_string()))?;
        Ok((registered.factory)(env))
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.types.values().map(|t| &t.definition)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
