//! `fart-run`: runs a saved program headless on a virtual clock.
//!
//! ```text
//! fart-run <program.json> [--frames N] [--out frame.png] [--config runtime.toml] [--keep-running]
//! ```

use std::path::PathBuf;
use std::rc::Rc;

use log::info;

use crate::clock::ManualClock;
use crate::config::RuntimeConfig;
use crate::error::LibraryError;
use crate::logging::EnvLogSink;
use crate::node::registry::HeadlessHost;
use crate::session::{ProgramDocument, Session};

#[derive(Debug, PartialEq)]
struct Options {
    program: PathBuf,
    frames: u32,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
    keep_running: bool,
}

fn parse_args(args: &[String]) -> Result<Options, LibraryError> {
    let usage = || {
        LibraryError::Config(
            "usage: fart-run <program.json> [--frames N] [--out frame.png] [--config runtime.toml] [--keep-running]"
                .to_string(),
        )
    };
    let mut iter = args.iter().skip(1);
    let mut program = None;
    let mut options = Options {
        program: PathBuf::new(),
        frames: 60,
        out: None,
        config: None,
        keep_running: false,
    };
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => {
                let n = iter.next().ok_or_else(usage)?;
                options.frames = n
                    .parse()
                    .map_err(|_| LibraryError::Config(format!("invalid frame count '{}'", n)))?;
            }
            "--out" => options.out = Some(PathBuf::from(iter.next().ok_or_else(usage)?)),
            "--config" => options.config = Some(PathBuf::from(iter.next().ok_or_else(usage)?)),
            "--keep-running" => options.keep_running = true,
            flag if flag.starts_with("--") => return Err(usage()),
            path => program = Some(PathBuf::from(path)),
        }
    }
    options.program = program.ok_or_else(usage)?;
    Ok(options)
}

pub fn run(args: Vec<String>) -> Result<(), LibraryError> {
    let options = parse_args(&args)?;
    let config = match &options.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::load_or_default(None),
    };
    let tick_ms = config.executor.tick_ms;

    let clock = Rc::new(ManualClock::new());
    let log = Rc::new(EnvLogSink);
    let host = Rc::new(HeadlessHost::new(log.clone()));
    let mut session = Session::new(config, clock.clone(), log, host);

    let document = ProgramDocument::load(&options.program)?;
    session.load_document(&document)?;
    session.stage().borrow_mut().finish_loads();

    session.run();
    let mut last = None;
    for _ in 0..options.frames {
        clock.advance(tick_ms);
        session.tick();
        last = Some(session.frame()?);
    }
    if !options.keep_running {
        session.stop();
    }

    println!(
        "Ran {} frame(s) of {} ms; {} node(s), {} variable(s)",
        options.frames,
        tick_ms,
        session.executor().len(),
        session.vars().len()
    );
    for (name, value) in session.vars().snapshot() {
        println!("  {} = {}", name, value.to_json());
    }

    if let (Some(path), Some(frame)) = (&options.out, &last) {
        frame.save_png(path)?;
        info!("Saved {}", path.display());
        println!("Saved {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("fart-run")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_flags_in_any_order() {
        let options = parse_args(&args(&["--frames", "5", "prog.json", "--out", "f.png"])).unwrap();
        assert_eq!(options.program, PathBuf::from("prog.json"));
        assert_eq!(options.frames, 5);
        assert_eq!(options.out, Some(PathBuf::from("f.png")));
        assert!(!options.keep_running);
    }

    #[test]
    fn rejects_missing_program_and_bad_counts() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["p.json", "--frames", "many"])).is_err());
        assert!(parse_args(&args(&["p.json", "--verbose"])).is_err());
    }
}
