//! Console log sink.
//!
//! Nodes and the session report user-facing messages through a [`LogSink`]
//! rather than straight to the `log` facade, because a console needs the
//! severity as data (to colour lines) and tests need to read the lines back.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Log,
    Info,
    Warn,
    Error,
    Success,
    Input,
    Output,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Log => "log",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Success => "success",
            Severity::Input => "input",
            Severity::Output => "output",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Severity {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Severity::Log),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "success" => Ok(Severity::Success),
            "input" => Ok(Severity::Input),
            "output" => Ok(Severity::Output),
            other => Err(LibraryError::Config(format!("unknown severity '{}'", other))),
        }
    }
}

pub trait LogSink {
    fn log(&self, message: &str, severity: Severity);
}

pub type LogHandle = Rc<dyn LogSink>;

/// Forwards console lines to the `log` facade under the `fart::console` target.
#[derive(Default)]
pub struct EnvLogSink;

impl LogSink for EnvLogSink {
    fn log(&self, message: &str, severity: Severity) {
        let level = match severity {
            Severity::Error => log::Level::Error,
            Severity::Warn => log::Level::Warn,
            Severity::Log | Severity::Input | Severity::Output => log::Level::Info,
            Severity::Info | Severity::Success => log::Level::Info,
        };
        log::log!(target: "fart::console", level, "[{}] {}", severity, message);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub message: String,
    pub severity: Severity,
}

/// Keeps every line in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryLog {
    entries: Rc<RefCell<Vec<LogEntry>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl LogSink for MemoryLog {
    fn log(&self, message: &str, severity: Severity) {
        log::debug!(target: "fart::console", "[{}] {}", severity, message);
        self.entries.borrow_mut().push(LogEntry {
            message: message.to_string(),
            severity,
        });
    }
}
