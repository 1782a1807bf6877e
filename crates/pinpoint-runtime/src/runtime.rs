//! Process and request handles for embedding the interpreter.
//!
//! One [`Runtime`] lives for the whole process. It owns the debugger, the
//! shared code cache and the standard library. Every unit of work starts with
//! [`Runtime::begin_request`], registers its breakpoints on the returned
//! [`Request`] and then runs one or more scripts.

#![allow(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use pinpoint_debug::{
    normalize_path, CacheInvalidator, DebugRequest, Debugger, DebuggerConfig, LogpointMessage,
    RequestSummary, SnapshotResult,
};
use tracing::debug;

use crate::cache::CodeCache;
use crate::error::RuntimeError;
use crate::eval::Interpreter;
use crate::loader::SourceLoader;
use crate::stdlib::StandardLibrary;

/// Process-wide state shared by every request.
pub struct Runtime {
    debugger: Debugger,
    cache: Arc<CodeCache>,
    loader: Arc<dyn SourceLoader>,
    stdlib: StandardLibrary,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("debugger", &self.debugger)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(config: &DebuggerConfig, loader: Arc<dyn SourceLoader>) -> Self {
        let cache = Arc::new(CodeCache::new());
        let invalidator: Arc<dyn CacheInvalidator> = cache.clone();
        Self {
            debugger: Debugger::new(config).with_invalidator(invalidator),
            cache,
            loader,
            stdlib: StandardLibrary::new(),
        }
    }

    #[must_use]
    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    #[must_use]
    pub fn cache(&self) -> &CodeCache {
        &self.cache
    }

    #[must_use]
    pub fn stdlib(&self) -> &StandardLibrary {
        &self.stdlib
    }

    /// Starts a request with its own breakpoint tables and budget.
    #[must_use]
    pub fn begin_request(&self) -> Request<'_> {
        Request {
            runtime: self,
            debug: self.debugger.begin_request(),
        }
    }
}

/// Output of one script run. The output is kept even when the run failed.
#[derive(Debug)]
pub struct Execution {
    pub output: String,
    pub error: Option<RuntimeError>,
}

impl Execution {
    /// The output, or the error that stopped the script.
    pub fn into_result(self) -> Result<String, RuntimeError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.output),
        }
    }
}

/// One request against a [`Runtime`].
#[derive(Debug)]
pub struct Request<'r> {
    runtime: &'r Runtime,
    debug: DebugRequest,
}

impl Request<'_> {
    #[must_use]
    pub fn debug(&self) -> &DebugRequest {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugRequest {
        &mut self.debug
    }

    /// Tells the debugger which file is about to run, so relative breakpoint
    /// filenames resolve against its directory.
    pub fn set_entry(&mut self, entry: &str) {
        self.debug
            .set_current_file(Some(normalize_path(Path::new(entry))));
    }

    /// Runs `entry` with a fresh interpreter.
    pub fn execute(&mut self, entry: &str) -> Execution {
        self.set_entry(entry);
        let runtime = self.runtime;
        let mut interpreter = Interpreter::new(
            &runtime.cache,
            runtime.loader.as_ref(),
            &runtime.stdlib,
            Some(&mut self.debug),
        );
        let error = interpreter.run(entry).err();
        if let Some(err) = &error {
            debug!("{entry} failed: {err}");
        }
        Execution {
            output: interpreter.take_output(),
            error,
        }
    }

    /// Runs `entry` and returns its output.
    pub fn run(&mut self, entry: &str) -> Result<String, RuntimeError> {
        self.execute(entry).into_result()
    }

    /// Drains the snapshots captured so far.
    pub fn snapshots(&mut self) -> Vec<SnapshotResult> {
        self.debug.list_snapshots()
    }

    /// Drains the logpoint messages emitted so far.
    pub fn logpoints(&mut self) -> Vec<LogpointMessage> {
        self.debug.list_logpoints()
    }

    pub fn finish(self) -> RequestSummary {
        self.debug.finish()
    }
}
