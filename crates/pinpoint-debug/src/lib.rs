//! `pinpoint-debug` - Production breakpoints for the pinpoint host language.
//!
//! Breakpoints are registered per request as snapshots (capture the stack
//! once) or logpoints (emit a message on every hit). When the host compiles
//! a file, [`DebugRequest::on_compile`] splices probe nodes into the parsed
//! tree; when execution reaches a probe, the host calls
//! [`DebugRequest::fire_snapshot`] or [`DebugRequest::fire_logpoint`].
//!
//! - **Sandbox**: conditions and watch expressions must be side-effect free
//!   and may only call allow-listed functions
//! - **Rewriter**: finds the statement for a line and splices a probe before it
//! - **Capture**: copies frames and locals, evaluates watches, renders messages
//! - **Governor**: caps the time and memory handlers may spend per request
//!
//! # Example
//!
//! ```
//! use pinpoint_debug::{Debugger, SnapshotOptions};
//!
//! let debugger = Debugger::default();
//! let mut request = debugger.begin_request();
//! assert!(request.register_snapshot("/app/index.php", 3, SnapshotOptions::default()));
//!
//! let mut tree = pinpoint_syntax::parse("<?php\n$a = 1;\n$b = 2;\n").into_tree();
//! assert_eq!(request.on_compile("/app/index.php", &mut tree), 1);
//! assert!(!request.validate_statement("$a = 2"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod condition;
pub mod config;
pub mod debugger;
pub mod error;
pub mod governor;
pub mod process;
pub mod registry;
pub mod rewrite;
pub mod sandbox;
pub mod scope;
pub mod types;
pub mod value;

pub use config::DebuggerConfig;
pub use debugger::{normalize_path, DebugRequest, Debugger, VERSION};
pub use error::{ConfigError, EvalError, RegisterError, RejectReason, SinkError};
pub use governor::{Governor, RequestSummary};
pub use process::{ProcessRegistry, ProcessStats};
pub use registry::RequestRegistry;
pub use rewrite::{instrument, locate_and_splice};
pub use sandbox::{AllowList, Sandbox};
pub use scope::{CacheInvalidator, ExecutionScope, ExpressionEvaluator, LogpointSink, Sink, SnapshotSink};
pub use types::{
    Breakpoint, BreakpointId, BreakpointKind, FrameInfo, LogpointMessage, LogpointOptions,
    SnapshotOptions, SnapshotResult, SourceRef, StackFrame, ValidatedExpr, WatchResult,
};
pub use value::{ArrayEntry, ArrayKey, CapturedObject, CapturedValue};
