//! Breakpoint records and the results they produce.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;

use crate::error::EvalError;
use crate::scope::{LogpointSink, Sink, SnapshotSink};
use crate::value::CapturedValue;

/// Opaque breakpoint identifier.
pub type BreakpointId = SmolStr;

/// An expression that passed sandbox validation.
///
/// Only the sandbox-checked registration path can build one, so holding a
/// `ValidatedExpr` is proof that the source is side-effect free.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedExpr(SmolStr);

impl ValidatedExpr {
    pub(crate) fn new(source: SmolStr) -> Self {
        Self(source)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered breakpoint.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    pub id: BreakpointId,
    /// Resolved, normalized absolute path.
    pub filename: SmolStr,
    pub line: u32,
    pub condition: Option<ValidatedExpr>,
    pub watch_expressions: Vec<ValidatedExpr>,
    pub kind: BreakpointKind,
}

impl Breakpoint {
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        matches!(self.kind, BreakpointKind::Snapshot(_))
    }
}

#[derive(Debug, Clone)]
pub enum BreakpointKind {
    Snapshot(SnapshotState),
    Logpoint(LogpointState),
}

#[derive(Debug, Clone)]
pub struct SnapshotState {
    /// Frames deeper than this get no locals; zero means unlimited.
    pub max_stack_depth: usize,
    /// Set once the snapshot has been captured; never cleared.
    pub fulfilled: bool,
    pub callback: Option<Sink<dyn SnapshotSink>>,
}

#[derive(Debug, Clone)]
pub struct LogpointState {
    pub log_level: SmolStr,
    pub format: SmolStr,
    pub callback: Option<Sink<dyn LogpointSink>>,
}

/// Caller-supplied snapshot options.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    pub id: Option<SmolStr>,
    pub condition: Option<SmolStr>,
    pub expressions: Vec<SmolStr>,
    pub max_stack_depth: usize,
    pub callback: Option<Sink<dyn SnapshotSink>>,
}

/// Caller-supplied logpoint options.
#[derive(Debug, Clone)]
pub struct LogpointOptions {
    pub id: Option<SmolStr>,
    pub condition: Option<SmolStr>,
    pub expressions: Vec<SmolStr>,
    pub log_level: SmolStr,
    pub format: SmolStr,
    pub callback: Option<Sink<dyn LogpointSink>>,
}

impl LogpointOptions {
    pub fn new(log_level: impl Into<SmolStr>, format: impl Into<SmolStr>) -> Self {
        Self {
            id: None,
            condition: None,
            expressions: Vec::new(),
            log_level: log_level.into(),
            format: format.into(),
            callback: None,
        }
    }
}

/// Function name, file and line of one live frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub function: Option<SmolStr>,
    pub filename: SmolStr,
    pub line: u32,
}

/// One captured call-stack frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<SmolStr>,
    pub filename: SmolStr,
    pub line: u32,
    pub locals: IndexMap<SmolStr, CapturedValue>,
}

/// Outcome of evaluating one watch expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WatchResult {
    Value(CapturedValue),
    Error { error: SmolStr },
}

impl From<Result<CapturedValue, EvalError>> for WatchResult {
    fn from(result: Result<CapturedValue, EvalError>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(err) => Self::Error { error: err.message },
        }
    }
}

/// A captured snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotResult {
    pub id: BreakpointId,
    /// Innermost frame first.
    pub stackframes: Vec<StackFrame>,
    pub evaluated_expressions: IndexMap<SmolStr, WatchResult>,
}

/// A rendered logpoint line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogpointMessage {
    pub filename: SmolStr,
    pub line: u32,
    pub log_level: SmolStr,
    pub message: String,
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: i64,
}

/// Where a logpoint fired, passed to logpoint callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub filename: SmolStr,
    pub line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_result_serialization() {
        let value = WatchResult::Value(CapturedValue::Int(3));
        let error = WatchResult::Error {
            error: "undefined variable $x".into(),
        };
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"type":"int","value":3}"#
        );
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"error":"undefined variable $x"}"#
        );
    }

    #[test]
    fn test_frame_without_function_omits_field() {
        let frame = StackFrame {
            function: None,
            filename: "/app/index.php".into(),
            line: 4,
            locals: IndexMap::new(),
        };
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"filename":"/app/index.php","line":4,"locals":{}}"#
        );
    }
}
