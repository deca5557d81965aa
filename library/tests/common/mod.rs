#![allow(dead_code)]

use std::rc::Rc;

use fart_runtime::clock::ManualClock;
use fart_runtime::config::RuntimeConfig;
use fart_runtime::graph::{NodeId, PropertyMap};
use fart_runtime::logging::{MemoryLog, Severity};
use fart_runtime::node::HeadlessHost;
use fart_runtime::runtime::Executor;
use fart_runtime::Session;

pub struct Harness {
    pub session: Session,
    pub clock: Rc<ManualClock>,
    pub log: Rc<MemoryLog>,
    pub host: Rc<HeadlessHost>,
}

pub fn harness() -> Harness {
    harness_with(RuntimeConfig::default())
}

pub fn harness_with(config: RuntimeConfig) -> Harness {
    let clock = Rc::new(ManualClock::new());
    let log = Rc::new(MemoryLog::new());
    let host = Rc::new(HeadlessHost::new(log.clone()));
    let session = Session::new(config, clock.clone(), log.clone(), host.clone());
    Harness {
        session,
        clock,
        log,
        host,
    }
}

impl Harness {
    pub fn exec(&mut self) -> &mut Executor {
        self.session.executor_mut()
    }

    pub fn add(&mut self, type_id: &str, properties: PropertyMap) -> NodeId {
        self.exec().add_node(type_id, properties).unwrap()
    }

    pub fn wire(&mut self, from: NodeId, from_pin: &str, to: NodeId, to_pin: &str) {
        self.exec().connect(from, from_pin, to, to_pin).unwrap();
    }

    /// Lines written by print nodes.
    pub fn printed(&self) -> Vec<String> {
        self.log.with_severity(Severity::Log)
    }

    pub fn errors(&self) -> Vec<String> {
        self.log.with_severity(Severity::Error)
    }

    /// Advances the clock, then runs one tick.
    pub fn tick_after(&mut self, ms: f64) {
        self.clock.advance(ms);
        self.session.tick();
    }
}

pub fn props() -> PropertyMap {
    PropertyMap::new()
}
