//! Seams between the debugger and the host runtime.
//!
//! The debugger never walks host data structures itself. When a probe
//! fires, the host hands over an [`ExecutionScope`] that can evaluate
//! validated expressions and describe the live call stack. Results leave
//! through the sink traits.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::error::{EvalError, SinkError};
use crate::types::{FrameInfo, SnapshotResult, SourceRef};
use crate::value::CapturedValue;

/// Evaluates expression source in the current execution context.
pub trait ExpressionEvaluator {
    /// Evaluates `source` and returns a deep copy of the result.
    fn evaluate(&mut self, source: &str) -> Result<CapturedValue, EvalError>;

    /// Truthiness of an evaluated value.
    fn is_truthy(&self, value: &CapturedValue) -> bool {
        value.is_truthy()
    }
}

/// The live call stack at a probe, innermost frame at depth zero.
pub trait ExecutionScope: ExpressionEvaluator {
    /// Number of frames on the stack.
    fn frame_count(&self) -> usize;

    /// Function, file and line of the frame at `depth`.
    fn frame(&self, depth: usize) -> Option<FrameInfo>;

    /// Copies of the local variables of the frame at `depth`, in
    /// definition order.
    fn locals(&self, depth: usize) -> Vec<(SmolStr, CapturedValue)>;
}

/// Receives captured snapshots instead of the in-request collection.
pub trait SnapshotSink: Send + Sync {
    /// Delivers one snapshot.
    fn deliver(&self, snapshot: &SnapshotResult) -> Result<(), SinkError>;
}

impl<F> SnapshotSink for F
where
    F: Fn(&SnapshotResult) -> Result<(), SinkError> + Send + Sync,
{
    fn deliver(&self, snapshot: &SnapshotResult) -> Result<(), SinkError> {
        self(snapshot)
    }
}

/// Receives rendered logpoint messages instead of the in-request collection.
pub trait LogpointSink: Send + Sync {
    /// Delivers one message.
    fn deliver(&self, level: &str, message: &str, source: &SourceRef) -> Result<(), SinkError>;
}

impl<F> LogpointSink for F
where
    F: Fn(&str, &str, &SourceRef) -> Result<(), SinkError> + Send + Sync,
{
    fn deliver(&self, level: &str, message: &str, source: &SourceRef) -> Result<(), SinkError> {
        self(level, message, source)
    }
}

/// Drops compiled code so the next load recompiles (and re-instruments) it.
pub trait CacheInvalidator: Send + Sync {
    /// Invalidates every cached compilation of `filename`.
    fn invalidate(&self, filename: &str);
}

impl<F> CacheInvalidator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn invalidate(&self, filename: &str) {
        self(filename);
    }
}

/// Shared handle to a callback.
pub struct Sink<T: ?Sized>(Arc<T>);

impl<T: ?Sized> Sink<T> {
    /// Wraps an existing shared callback.
    pub fn from_arc(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

impl Sink<dyn SnapshotSink> {
    /// Wraps a snapshot callback.
    pub fn snapshot(sink: impl SnapshotSink + 'static) -> Self {
        Self(Arc::new(sink))
    }
}

impl Sink<dyn LogpointSink> {
    /// Wraps a logpoint callback.
    pub fn logpoint(sink: impl LogpointSink + 'static) -> Self {
        Self(Arc::new(sink))
    }
}

impl<T: ?Sized> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Sink<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sink(..)")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_closure_sinks() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sink = Sink::logpoint(
            move |level: &str, message: &str, source: &SourceRef| -> Result<(), SinkError> {
                assert_eq!(level, "INFO");
                assert_eq!(message, "hello");
                assert_eq!(source.line, 3);
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        let copy = sink.clone();
        copy.deliver(
            "INFO",
            "hello",
            &SourceRef {
                filename: "/a.php".into(),
                line: 3,
            },
        )
        .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(format!("{sink:?}"), "Sink(..)");
    }
}
