//! `pinpoint validate`.

use std::path::Path;

use pinpoint_debug::{Debugger, DebuggerConfig};

/// Prints one verdict per expression. Returns false if any was rejected.
pub fn run_validate(expressions: &[String], config: Option<&Path>) -> anyhow::Result<bool> {
    let config = match config {
        Some(path) => DebuggerConfig::load(path)?,
        None => DebuggerConfig::default(),
    };
    let debugger = Debugger::new(&config);
    let mut all_ok = true;
    for expression in expressions {
        match debugger.process().validate(expression) {
            Ok(()) => println!("ok: {expression}"),
            Err(reason) => {
                all_ok = false;
                println!("rejected: {expression}: {reason}");
            }
        }
    }
    Ok(all_ok)
}
