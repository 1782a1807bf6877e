//! `pinpoint run`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use pinpoint_debug::{DebuggerConfig, LogpointMessage, RequestSummary, SnapshotResult};
use pinpoint_runtime::{FsLoader, Runtime};
use serde::Serialize;
use tracing::{error, info};

use crate::breakpoints::BreakpointFile;

pub struct RunOptions {
    pub entry: PathBuf,
    pub config: Option<PathBuf>,
    pub breakpoints: Option<PathBuf>,
    pub source_root: Option<PathBuf>,
    pub requests: usize,
}

#[derive(Debug, Serialize)]
struct RequestReport {
    request: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    snapshots: Vec<SnapshotResult>,
    logpoints: Vec<LogpointMessage>,
    summary: RequestSummary,
}

pub fn run_entry(options: &RunOptions) -> anyhow::Result<()> {
    let mut config = match &options.config {
        Some(path) => DebuggerConfig::load(path)?,
        None => DebuggerConfig::default(),
    };
    if let Some(root) = &options.source_root {
        config.source_root = Some(root.clone());
    }
    let breakpoints = match &options.breakpoints {
        Some(path) => BreakpointFile::load(path)?,
        None => BreakpointFile::default(),
    };
    let entry = std::fs::canonicalize(&options.entry)
        .with_context(|| format!("failed to resolve entry '{}'", options.entry.display()))?;
    let entry = entry.to_string_lossy().into_owned();

    let runtime = Runtime::new(&config, Arc::new(FsLoader));
    let mut stdout = std::io::stdout().lock();
    let mut failed = 0;
    for index in 1..=options.requests.max(1) {
        let mut request = runtime.begin_request();
        request.set_entry(&entry);
        let registered = breakpoints.register(request.debug_mut());
        info!("request {index}: {registered} breakpoint(s) registered");

        let execution = request.execute(&entry);
        stdout.write_all(execution.output.as_bytes())?;
        if !execution.output.is_empty() && !execution.output.ends_with('\n') {
            writeln!(stdout)?;
        }
        if let Some(err) = &execution.error {
            error!("request {index}: {err}");
            failed += 1;
        }

        let snapshots = request.snapshots();
        let logpoints = request.logpoints();
        let report = RequestReport {
            request: index,
            error: execution.error.map(|err| err.to_string()),
            snapshots,
            logpoints,
            summary: request.finish(),
        };
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    }
    stdout.flush()?;

    if failed > 0 {
        anyhow::bail!("{failed} request(s) failed");
    }
    Ok(())
}
