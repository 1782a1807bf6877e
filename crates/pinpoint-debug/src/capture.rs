//! Snapshot capture and logpoint rendering.

#![allow(missing_docs)]

use indexmap::IndexMap;
use smol_str::SmolStr;
use time::OffsetDateTime;
use tracing::warn;

use crate::scope::{ExecutionScope, ExpressionEvaluator, LogpointSink, Sink, SnapshotSink};
use crate::types::{
    BreakpointId, LogpointMessage, SnapshotResult, SourceRef, StackFrame, ValidatedExpr,
    WatchResult,
};

const RECORD_OVERHEAD: usize = 64;

/// Evaluates every watch expression independently, in order.
pub fn evaluate_watches<E>(
    expressions: &[ValidatedExpr],
    evaluator: &mut E,
) -> Vec<(SmolStr, WatchResult)>
where
    E: ExpressionEvaluator + ?Sized,
{
    expressions
        .iter()
        .map(|expr| {
            let result = WatchResult::from(evaluator.evaluate(expr.as_str()));
            (SmolStr::new(expr.as_str()), result)
        })
        .collect()
}

/// Copies the live stack, innermost frame first.
///
/// Frames at or beyond `max_stack_depth` keep their location but no locals;
/// zero means every frame gets its locals.
pub fn capture_frames<S>(scope: &S, max_stack_depth: usize) -> Vec<StackFrame>
where
    S: ExecutionScope + ?Sized,
{
    (0..scope.frame_count())
        .filter_map(|depth| {
            let info = scope.frame(depth)?;
            let locals = if max_stack_depth == 0 || depth < max_stack_depth {
                scope.locals(depth).into_iter().collect()
            } else {
                IndexMap::new()
            };
            Some(StackFrame {
                function: info.function,
                filename: info.filename,
                line: info.line,
                locals,
            })
        })
        .collect()
}

/// Builds a full snapshot for breakpoint `id`.
pub fn capture_snapshot<S>(
    id: &BreakpointId,
    max_stack_depth: usize,
    expressions: &[ValidatedExpr],
    scope: &mut S,
) -> SnapshotResult
where
    S: ExecutionScope + ?Sized,
{
    let stackframes = capture_frames(scope, max_stack_depth);
    let evaluated_expressions = evaluate_watches(expressions, scope).into_iter().collect();
    SnapshotResult {
        id: id.clone(),
        stackframes,
        evaluated_expressions,
    }
}

/// Substitutes `$N` placeholders in `format` with the Nth watch result.
///
/// A placeholder is a `$` that is not preceded by another `$`, followed by
/// the longest run of digits. Indexes without a result, and results that
/// are errors, leave the placeholder as written. Substituted text is never
/// scanned again.
#[must_use]
pub fn render_format(format: &str, results: &[WatchResult]) -> String {
    let bytes = format.as_bytes();
    let mut out = String::with_capacity(format.len());
    let mut copied = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        let is_placeholder = bytes[pos] == b'$'
            && (pos == 0 || bytes[pos - 1] != b'$')
            && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit);
        if !is_placeholder {
            pos += 1;
            continue;
        }
        let digits_end = bytes[pos + 1..]
            .iter()
            .position(|byte| !byte.is_ascii_digit())
            .map_or(bytes.len(), |offset| pos + 1 + offset);
        let value = format[pos + 1..digits_end]
            .parse::<usize>()
            .ok()
            .and_then(|index| results.get(index))
            .and_then(|result| match result {
                WatchResult::Value(value) => Some(value),
                WatchResult::Error { .. } => None,
            });
        if let Some(value) = value {
            out.push_str(&format[copied..pos]);
            out.push_str(&value.to_string());
            copied = digits_end;
        }
        pos = digits_end;
    }
    out.push_str(&format[copied..]);
    out
}

/// Builds the message for one logpoint hit.
pub fn build_logpoint_message(
    source: &SourceRef,
    log_level: &SmolStr,
    format: &str,
    results: &[WatchResult],
) -> LogpointMessage {
    LogpointMessage {
        filename: source.filename.clone(),
        line: source.line,
        log_level: log_level.clone(),
        message: render_format(format, results),
        timestamp: OffsetDateTime::now_utc().unix_timestamp(),
    }
}

/// Approximate size of a snapshot, charged against the memory budget.
#[must_use]
pub fn snapshot_size(snapshot: &SnapshotResult) -> usize {
    let frames: usize = snapshot
        .stackframes
        .iter()
        .map(|frame| {
            RECORD_OVERHEAD
                + frame.filename.len()
                + frame.function.as_ref().map_or(0, SmolStr::len)
                + frame
                    .locals
                    .iter()
                    .map(|(name, value)| name.len() + value.estimated_size())
                    .sum::<usize>()
        })
        .sum();
    let watches: usize = snapshot
        .evaluated_expressions
        .iter()
        .map(|(source, result)| {
            source.len()
                + match result {
                    WatchResult::Value(value) => value.estimated_size(),
                    WatchResult::Error { error } => error.len(),
                }
        })
        .sum();
    RECORD_OVERHEAD + snapshot.id.len() + frames + watches
}

/// Approximate size of a logpoint message.
#[must_use]
pub fn message_size(message: &LogpointMessage) -> usize {
    RECORD_OVERHEAD + message.filename.len() + message.log_level.len() + message.message.len()
}

/// Request-local results that were not handed to a callback.
#[derive(Debug, Default)]
pub struct Collected {
    snapshots: IndexMap<BreakpointId, SnapshotResult>,
    logpoints: Vec<LogpointMessage>,
}

impl Collected {
    /// Sends `snapshot` to `callback`, or keeps it keyed by id.
    pub fn record_snapshot(
        &mut self,
        snapshot: SnapshotResult,
        callback: Option<&Sink<dyn SnapshotSink>>,
    ) {
        match callback {
            Some(sink) => {
                if let Err(err) = sink.deliver(&snapshot) {
                    warn!("snapshot {} not delivered: {err}", snapshot.id);
                }
            }
            None => {
                self.snapshots.insert(snapshot.id.clone(), snapshot);
            }
        }
    }

    /// Sends `message` to `callback`, or appends it.
    pub fn record_logpoint(
        &mut self,
        message: LogpointMessage,
        callback: Option<&Sink<dyn LogpointSink>>,
    ) {
        match callback {
            Some(sink) => {
                let source = SourceRef {
                    filename: message.filename.clone(),
                    line: message.line,
                };
                if let Err(err) = sink.deliver(&message.log_level, &message.message, &source) {
                    warn!(
                        "logpoint message for {}:{} not delivered: {err}",
                        source.filename, source.line
                    );
                }
            }
            None => self.logpoints.push(message),
        }
    }

    /// Removes and returns the kept snapshots in capture order.
    pub fn drain_snapshots(&mut self) -> Vec<SnapshotResult> {
        self.snapshots.drain(..).map(|(_, snapshot)| snapshot).collect()
    }

    /// Removes and returns the kept logpoint messages in emission order.
    pub fn drain_logpoints(&mut self) -> Vec<LogpointMessage> {
        std::mem::take(&mut self.logpoints)
    }
}
