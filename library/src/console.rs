//! Console command interpreter.

use std::str::FromStr;

use crate::error::LibraryError;
use crate::logging::Severity;
use crate::session::Session;
use crate::value::format_number;
use crate::vars::VariableStore;

const HELP: &[&str] = &[
    "help      - Show commands",
    "run       - Run program",
    "stop      - Stop program",
    "step      - Step through",
    "vars      - List variables",
    "set x 10  - Set variable",
    "get x     - Get variable",
    "del x     - Delete variable",
    "sprites   - List sprites",
    "nodes     - List nodes",
    "time      - Show the session clock",
];

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Help,
    Run,
    Stop,
    Step,
    Vars,
    /// `None` when the name or value is missing.
    Set(Option<(String, String)>),
    Get(Option<String>),
    Del(Option<String>),
    Sprites,
    Nodes,
    Time,
    Unknown(String),
}

impl FromStr for Command {
    type Err = LibraryError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(LibraryError::runtime("empty command"));
        };
        let args: Vec<&str> = parts.collect();
        let first = args.first().map(|s| s.to_string());
        let command = match head.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "run" => Command::Run,
            "stop" => Command::Stop,
            "step" => Command::Step,
            "vars" | "variables" => Command::Vars,
            "set" => Command::Set(
                (args.len() >= 2).then(|| (args[0].to_string(), args[1..].join(" "))),
            ),
            "get" => Command::Get(first),
            "del" | "delete" => Command::Del(first),
            "sprites" => Command::Sprites,
            "nodes" => Command::Nodes,
            "time" => Command::Time,
            other => Command::Unknown(other.to_string()),
        };
        Ok(command)
    }
}

impl Command {
    pub fn execute(&self, session: &mut Session) {
        let log = session.log().clone();
        match self {
            Command::Help => HELP.iter().for_each(|line| log.log(line, Severity::Info)),
            Command::Run => {
                session.run();
            }
            Command::Stop => {
                session.stop();
            }
            Command::Step => {
                session.step();
            }
            Command::Vars => {
                let json = serde_json::to_string_pretty(&session.vars().snapshot())
                    .unwrap_or_else(|e| format!("<{}>", e));
                log.log(&json, Severity::Output);
            }
            Command::Set(Some((name, value))) => {
                session.vars().set(name, VariableStore::parse_value(value));
                log.log(&format!("{} set", name), Severity::Success);
            }
            Command::Set(None) => log.log("Usage: set <name> <value>", Severity::Warn),
            Command::Get(Some(name)) => {
                let value = session.vars().get(name);
                log.log(&format!("{} = {}", name, value.to_json()), Severity::Output);
            }
            Command::Del(Some(name)) => {
                if session.vars().delete(name) {
                    log.log(&format!("Deleted: {}", name), Severity::Success);
                }
            }
            Command::Get(None) | Command::Del(None) => {}
            Command::Sprites => {
                let stage = session.stage().borrow();
                for sprite in stage.sprites() {
                    log.log(
                        &format!(
                            "{}: ({}, {})",
                            sprite.name,
                            format_number(round_half_up(sprite.x)),
                            format_number(round_half_up(sprite.y))
                        ),
                        Severity::Output,
                    );
                }
            }
            Command::Nodes => {
                let executor = session.executor();
                log.log(&format!("Nodes: {}", executor.len()), Severity::Info);
                for (i, slot) in executor.nodes().iter().enumerate() {
                    let title = executor
                        .registry()
                        .definition(&slot.type_id)
                        .map_or(slot.type_id.as_str(), |d| d.display_name.as_str());
                    log.log(&format!("  {}: {}", i, title), Severity::Output);
                }
            }
            Command::Time => {
                log.log(&format!("{} ms", format_number(session.now())), Severity::Output);
            }
            Command::Unknown(cmd) => log.log(
                &format!("Unknown command: {}. Type 'help' for commands.", cmd),
                Severity::Error,
            ),
        }
    }
}

/// Echoes `line` as input, then runs it. Blank lines are ignored.
pub fn run_line(session: &mut Session, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    session.log().log(&format!("> {}", line), Severity::Input);
    if let Ok(command) = line.parse::<Command>() {
        command.execute(session);
    }
}

fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!("HELP".parse::<Command>().unwrap(), Command::Help);
        assert_eq!("?".parse::<Command>().unwrap(), Command::Help);
        assert_eq!(
            "set greeting hello world".parse::<Command>().unwrap(),
            Command::Set(Some(("greeting".into(), "hello world".into())))
        );
        assert_eq!("set x".parse::<Command>().unwrap(), Command::Set(None));
        assert_eq!("delete x".parse::<Command>().unwrap(), Command::Del(Some("x".into())));
        assert_eq!("frobnicate".parse::<Command>().unwrap(), Command::Unknown("frobnicate".into()));
        assert!("   ".parse::<Command>().is_err());
    }

    #[test]
    fn rounds_like_the_sprite_list_expects() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-0.2), 0.0);
    }
}
