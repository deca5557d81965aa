//! A running program: graph, variables, stage and the run/stop/step
//! controls around them.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::clock::ClockHandle;
use crate::config::RuntimeConfig;
use crate::error::LibraryError;
use crate::graph::document::GraphDocument;
use crate::logging::{LogHandle, Severity};
use crate::node::behavior::InputEvent;
use crate::node::registry::{HostServices, NodeEnv, NodeRegistry};
use crate::render::render_loop::RenderLoop;
use crate::render::renderer::{RenderedFrame, StageRenderer};
use crate::runtime::executor::Executor;
use crate::sprite::snapshot::StageSnapshot;
use crate::sprite::stage::{Stage, StageHandle};
use crate::value::Value;
use crate::vars::VariableStore;

/// Everything needed to reopen a program.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct ProgramDocument {
    pub graph: GraphDocument,
    pub variables: BTreeMap<String, Value>,
    pub stage: StageSnapshot,
}

impl ProgramDocument {
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

pub struct Session {
    config: RuntimeConfig,
    executor: Executor,
    render_loop: RenderLoop,
    vars: VariableStore,
    stage: StageHandle,
    clock: ClockHandle,
    log: LogHandle,
}

impl Session {
    /// A session with the built-in node catalog.
    pub fn new(config: RuntimeConfig, clock: ClockHandle, log: LogHandle, host: Rc<dyn HostServices>) -> Self {
        Self::with_registry(config, Rc::new(NodeRegistry::with_builtin()), clock, log, host)
    }

    pub fn with_registry(
        config: RuntimeConfig,
        registry: Rc<NodeRegistry>,
        clock: ClockHandle,
        log: LogHandle,
        host: Rc<dyn HostServices>,
    ) -> Self {
        let vars = VariableStore::new();
        let stage = Stage::new(&config, clock.clone(), log.clone()).into_handle();
        let env = NodeEnv {
            vars: vars.clone(),
            stage: stage.clone(),
            host,
            clock: clock.clone(),
            log: log.clone(),
        };
        let executor = Executor::new(registry, env, &config.executor);
        let render_loop = RenderLoop::new(StageRenderer::new(&config));
        Self {
            config,
            executor,
            render_loop,
            vars,
            stage,
            clock,
            log,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    pub fn stage(&self) -> &StageHandle {
        &self.stage
    }

    pub fn log(&self) -> &LogHandle {
        &self.log
    }

    pub fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn is_running(&self) -> bool {
        self.executor.is_running()
    }

    /// Starts the program. Returns whether a new run began.
    pub fn run(&mut self) -> bool {
        if self.executor.is_running() {
            return false;
        }
        if self.executor.is_empty() {
            self.log.log("No nodes to execute!", Severity::Warn);
            return false;
        }
        self.executor.start();
        self.log.log("Program started", Severity::Success);
        true
    }

    /// Stops the program and silences every sprite.
    pub fn stop(&mut self) -> bool {
        if !self.executor.is_running() {
            return false;
        }
        self.executor.stop();
        self.stage.borrow_mut().clear_speech();
        self.log.log("Program stopped", Severity::Warn);
        true
    }

    /// One executor tick, whether or not the program is running.
    pub fn step(&mut self) -> bool {
        if self.executor.is_empty() {
            self.log.log("No nodes to execute", Severity::Warn);
            return false;
        }
        self.executor.tick();
        self.log.log("Stepped", Severity::Info);
        true
    }

    /// The periodic tick; does nothing while stopped.
    pub fn tick(&mut self) {
        if self.executor.is_running() {
            self.executor.tick();
        }
    }

    pub fn frame(&mut self) -> Result<RenderedFrame, LibraryError> {
        self.render_loop.frame(&self.stage)
    }

    pub fn key_down(&mut self, key: &str, code: &str) {
        self.executor.dispatch_input(&InputEvent::key(key, code));
    }

    /// Replaces graph, variables and stage. A running program is stopped
    /// first. If the graph cannot be built the current program is kept
    /// as it was and the error is reported to the log sink.
    pub fn load_document(&mut self, doc: &ProgramDocument) -> Result<(), LibraryError> {
        self.stop();
        if let Err(err) = self.executor.load_graph(&doc.graph) {
            self.log.log(&format!("Failed to load program: {}", err), Severity::Error);
            return Err(err);
        }
        self.vars.restore(doc.variables.clone());
        self.stage.borrow_mut().restore(&doc.stage);
        info!(
            "Loaded program: {} node(s), {} variable(s), {} sprite(s)",
            doc.graph.nodes.len(),
            doc.variables.len(),
            doc.stage.sprites.len()
        );
        Ok(())
    }

    pub fn document(&self) -> ProgramDocument {
        ProgramDocument {
            graph: self.executor.to_graph(),
            variables: self.vars.snapshot(),
            stage: self.stage.borrow().snapshot(),
        }
    }
}
