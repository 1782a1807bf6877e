//! Request-scoped entry points used by hosts.
//!
//! A host builds one [`Debugger`] per process and calls
//! [`Debugger::begin_request`] at the start of every request. The returned
//! [`DebugRequest`] owns the request-local tables and budget; the
//! [`ProcessRegistry`] behind the debugger is shared by all of them.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use pinpoint_syntax::SyntaxTree;
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use crate::capture::{self, Collected};
use crate::condition;
use crate::config::DebuggerConfig;
use crate::error::RegisterError;
use crate::governor::{Governor, RequestSummary};
use crate::process::ProcessRegistry;
use crate::registry::RequestRegistry;
use crate::rewrite;
use crate::scope::{CacheInvalidator, ExecutionScope};
use crate::types::{
    Breakpoint, BreakpointId, BreakpointKind, LogpointMessage, LogpointOptions, LogpointState,
    SnapshotOptions, SnapshotResult, SnapshotState, SourceRef, ValidatedExpr,
};

/// Version of this crate, for hosts that report agent versions.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Process-level handle.
#[derive(Clone)]
pub struct Debugger {
    process: Arc<ProcessRegistry>,
    invalidator: Option<Arc<dyn CacheInvalidator>>,
}

impl std::fmt::Debug for Debugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debugger")
            .field("process", &self.process)
            .field("invalidator", &self.invalidator.is_some())
            .finish()
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(&DebuggerConfig::default())
    }
}

impl Debugger {
    /// Creates a debugger with its own process registry.
    #[must_use]
    pub fn new(config: &DebuggerConfig) -> Self {
        Self {
            process: Arc::new(ProcessRegistry::new(config)),
            invalidator: None,
        }
    }

    /// Sets the collaborator that evicts compiled files after registration.
    #[must_use]
    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = Some(invalidator);
        self
    }

    /// Shared process-wide state.
    #[must_use]
    pub fn process(&self) -> &Arc<ProcessRegistry> {
        &self.process
    }

    /// Starts a request with fresh tables and a fresh budget.
    #[must_use]
    pub fn begin_request(&self) -> DebugRequest {
        let limits = self.process.limits();
        let max_time = self.process.max_time();
        trace!("request budget {max_time:?}, {} bytes", limits.max_memory);
        DebugRequest {
            process: Arc::clone(&self.process),
            invalidator: self.invalidator.clone(),
            registry: RequestRegistry::new(),
            collected: Collected::default(),
            governor: Governor::new(max_time, limits.max_memory),
            started: Instant::now(),
            current_file: None,
        }
    }

    /// Checks an expression against the sandbox without registering it.
    #[must_use]
    pub fn validate_statement(&self, source: &str) -> bool {
        self.process.validate(source).is_ok()
    }

    /// Ids currently injected, per file.
    #[must_use]
    pub fn list_breakpoint_ids(&self) -> Vec<(SmolStr, Vec<BreakpointId>)> {
        self.process.injected_ids()
    }
}

/// State of one request.
pub struct DebugRequest {
    process: Arc<ProcessRegistry>,
    invalidator: Option<Arc<dyn CacheInvalidator>>,
    registry: RequestRegistry,
    collected: Collected,
    governor: Governor,
    started: Instant,
    current_file: Option<PathBuf>,
}

impl std::fmt::Debug for DebugRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugRequest")
            .field("registry", &self.registry)
            .field("governor", &self.governor)
            .field("current_file", &self.current_file)
            .finish_non_exhaustive()
    }
}

impl DebugRequest {
    /// Tells the request which file is executing, for resolving relative
    /// breakpoint filenames when no source root is configured.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Registers a snapshot; rejections are logged and reported as `false`.
    pub fn register_snapshot(&mut self, filename: &str, line: u32, options: SnapshotOptions) -> bool {
        match self.add_snapshot(filename, line, options) {
            Ok(_) => true,
            Err(err) => {
                warn!("snapshot at {filename}:{line} rejected: {err}");
                false
            }
        }
    }

    /// Registers a logpoint; rejections are logged and reported as `false`.
    pub fn register_logpoint(&mut self, filename: &str, line: u32, options: LogpointOptions) -> bool {
        match self.add_logpoint(filename, line, options) {
            Ok(_) => true,
            Err(err) => {
                warn!("logpoint at {filename}:{line} rejected: {err}");
                false
            }
        }
    }

    /// Registers a snapshot and returns its id.
    pub fn add_snapshot(
        &mut self,
        filename: &str,
        line: u32,
        options: SnapshotOptions,
    ) -> Result<BreakpointId, RegisterError> {
        let kind = BreakpointKind::Snapshot(SnapshotState {
            max_stack_depth: options.max_stack_depth,
            fulfilled: false,
            callback: options.callback,
        });
        self.add(
            filename,
            line,
            options.id,
            options.condition,
            options.expressions,
            kind,
        )
    }

    /// Registers a logpoint and returns its id.
    pub fn add_logpoint(
        &mut self,
        filename: &str,
        line: u32,
        options: LogpointOptions,
    ) -> Result<BreakpointId, RegisterError> {
        let kind = BreakpointKind::Logpoint(LogpointState {
            log_level: options.log_level,
            format: options.format,
            callback: options.callback,
        });
        self.add(
            filename,
            line,
            options.id,
            options.condition,
            options.expressions,
            kind,
        )
    }

    fn add(
        &mut self,
        filename: &str,
        line: u32,
        id: Option<SmolStr>,
        condition: Option<SmolStr>,
        expressions: Vec<SmolStr>,
        kind: BreakpointKind,
    ) -> Result<BreakpointId, RegisterError> {
        let filename = self.resolve_filename(filename)?;
        if line == 0 {
            return Err(RegisterError::InvalidLine);
        }

        let condition = match condition.filter(|source| !source.is_empty()) {
            Some(source) => {
                self.process
                    .validate(&source)
                    .map_err(|reason| RegisterError::InvalidCondition {
                        expression: source.clone(),
                        reason,
                    })?;
                Some(ValidatedExpr::new(source))
            }
            None => None,
        };
        let watch_expressions = expressions
            .into_iter()
            .map(|source| match self.process.validate(&source) {
                Ok(()) => Ok(ValidatedExpr::new(source)),
                Err(reason) => Err(RegisterError::InvalidExpression {
                    expression: source,
                    reason,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generate_id);
        let breakpoint = Breakpoint {
            id: id.clone(),
            filename: filename.clone(),
            line,
            condition,
            watch_expressions,
            kind,
        };
        if self.registry.insert(breakpoint).is_some() {
            debug!("breakpoint {id} replaced");
        }

        if !self.process.is_injected(&filename, &id) {
            if let Some(invalidator) = &self.invalidator {
                debug!("invalidating compiled {filename} for breakpoint {id}");
                invalidator.invalidate(&filename);
            }
        }
        Ok(id)
    }

    /// Resolves a breakpoint filename to a normalized absolute path.
    pub fn resolve_filename(&self, filename: &str) -> Result<SmolStr, RegisterError> {
        if filename.is_empty() {
            return Err(RegisterError::EmptyFilename);
        }
        let path = Path::new(filename);
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(root) = self.process.source_root() {
            root.join(path)
        } else if let Some(dir) = self.current_file.as_deref().and_then(Path::parent) {
            dir.join(path)
        } else {
            path.to_path_buf()
        };
        Ok(SmolStr::new(normalize_path(&resolved).to_string_lossy()))
    }

    /// Instruments a freshly parsed tree for `filename`. Returns the number
    /// of probes spliced.
    pub fn on_compile(&mut self, filename: &str, tree: &mut SyntaxTree) -> usize {
        let filename = normalize_path(Path::new(filename));
        let filename = filename.to_string_lossy();
        let Some(pending) = self.registry.find_pending(&filename) else {
            return 0;
        };
        rewrite::instrument(tree, &filename, &pending, &self.process)
    }

    /// Handler for an injected snapshot probe.
    pub fn fire_snapshot(&mut self, id: &str, scope: &mut dyn ExecutionScope) -> bool {
        if !self.governor.admit() {
            trace!("snapshot {id} skipped: budget exhausted");
            return false;
        }
        let started = Instant::now();
        let (fired, bytes) = self.capture_snapshot(id, scope);
        self.governor.charge(started.elapsed(), bytes);
        fired
    }

    /// Handler for an injected logpoint probe.
    pub fn fire_logpoint(&mut self, id: &str, scope: &mut dyn ExecutionScope) -> bool {
        if !self.governor.admit() {
            trace!("logpoint {id} skipped: budget exhausted");
            return false;
        }
        let started = Instant::now();
        let (fired, bytes) = self.emit_logpoint(id, scope);
        self.governor.charge(started.elapsed(), bytes);
        fired
    }

    fn capture_snapshot(&mut self, id: &str, scope: &mut dyn ExecutionScope) -> (bool, usize) {
        let Some(breakpoint) = self.registry.find_by_id_mut(id) else {
            trace!("snapshot {id} is not registered in this request");
            return (false, 0);
        };
        let BreakpointKind::Snapshot(state) = &mut breakpoint.kind else {
            return (false, 0);
        };
        if state.fulfilled {
            return (false, 0);
        }
        if !condition::test(breakpoint.condition.as_ref(), scope) {
            return (false, 0);
        }
        state.fulfilled = true;

        let snapshot = capture::capture_snapshot(
            &breakpoint.id,
            state.max_stack_depth,
            &breakpoint.watch_expressions,
            scope,
        );
        let bytes = capture::snapshot_size(&snapshot);
        self.collected
            .record_snapshot(snapshot, state.callback.as_ref());
        (true, bytes)
    }

    fn emit_logpoint(&mut self, id: &str, scope: &mut dyn ExecutionScope) -> (bool, usize) {
        let Some(breakpoint) = self.registry.find_by_id(id) else {
            trace!("logpoint {id} is not registered in this request");
            return (false, 0);
        };
        let BreakpointKind::Logpoint(state) = &breakpoint.kind else {
            return (false, 0);
        };
        if !condition::test(breakpoint.condition.as_ref(), scope) {
            return (false, 0);
        }

        let results: Vec<_> = capture::evaluate_watches(&breakpoint.watch_expressions, scope)
            .into_iter()
            .map(|(_, result)| result)
            .collect();
        let source = SourceRef {
            filename: breakpoint.filename.clone(),
            line: breakpoint.line,
        };
        let message =
            capture::build_logpoint_message(&source, &state.log_level, &state.format, &results);
        let bytes = capture::message_size(&message);
        self.collected
            .record_logpoint(message, state.callback.as_ref());
        (true, bytes)
    }

    /// Drains the snapshots captured so far.
    pub fn list_snapshots(&mut self) -> Vec<SnapshotResult> {
        self.collected.drain_snapshots()
    }

    /// Drains the logpoint messages emitted so far.
    pub fn list_logpoints(&mut self) -> Vec<LogpointMessage> {
        self.collected.drain_logpoints()
    }

    /// Checks an expression against the sandbox without registering it.
    #[must_use]
    pub fn validate_statement(&self, source: &str) -> bool {
        self.process.validate(source).is_ok()
    }

    /// Breakpoints registered in this request.
    #[must_use]
    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    /// Time and memory charged to this request so far.
    #[must_use]
    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    /// Budget of this request, for hosts that charge work done outside the
    /// fire handlers (for example exporting results mid-request).
    pub fn governor_mut(&mut self) -> &mut Governor {
        &mut self.governor
    }

    /// Ends the request and folds its cost into the process totals.
    pub fn finish(self) -> RequestSummary {
        let elapsed = self.started.elapsed();
        self.process
            .record_request(elapsed.saturating_sub(self.governor.time_spent()));
        let summary = RequestSummary::from(&self.governor);
        debug!(
            "request finished: {} fired, {} skipped, {}us in handlers",
            summary.fired, summary.skipped, summary.handler_time_us
        );
        summary
    }
}

fn generate_id() -> BreakpointId {
    SmolStr::new((rand::random::<u32>() >> 1).to_string())
}

/// Resolves `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/srv/app/./lib/../index.php")),
            PathBuf::from("/srv/app/index.php")
        );
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_generated_ids_are_non_negative_decimals() {
        for _ in 0..32 {
            let id = generate_id();
            let value: u32 = id.parse().unwrap();
            assert!(value <= i32::MAX as u32);
        }
    }
}
