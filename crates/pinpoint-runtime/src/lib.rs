//! `pinpoint-runtime` - Reference interpreter hosting pinpoint breakpoints.
//!
//! - **Cache**: every file is parsed once and instrumented by the debugger
//!   right after parsing; registrations evict stale trees
//! - **Interpreter**: a tree-walking evaluator for the pinpoint dialect of
//!   PHP, dispatching probe nodes to the request's debugger
//! - **Scope**: exposes frames, locals and expression evaluation to
//!   snapshot and logpoint handlers
//! - **Standard library**: the pure functions scripts and watch expressions
//!   may call
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use pinpoint_debug::{DebuggerConfig, LogpointOptions};
//! use pinpoint_runtime::{MemoryLoader, Runtime};
//!
//! let loader = MemoryLoader::new().with_file("/app/index.php", "<?php\n$n = 2;\necho $n * 21;\n");
//! let runtime = Runtime::new(&DebuggerConfig::default(), Arc::new(loader));
//!
//! let mut request = runtime.begin_request();
//! let mut options = LogpointOptions::new("INFO", "n is $0");
//! options.expressions = vec!["$n".into()];
//! assert!(request.debug_mut().register_logpoint("/app/index.php", 3, options));
//!
//! assert_eq!(request.run("/app/index.php").unwrap(), "42");
//! assert_eq!(request.logpoints()[0].message, "n is 2");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod eval;
pub mod loader;
pub mod runtime;
pub mod scope;
pub mod stdlib;
pub mod value;

pub use cache::{CodeCache, Script};
pub use error::RuntimeError;
pub use eval::{Interpreter, MAX_CALL_DEPTH};
pub use loader::{FsLoader, MemoryLoader, SourceLoader};
pub use runtime::{Execution, Request, Runtime};
pub use scope::ProbeScope;
pub use stdlib::StandardLibrary;
pub use value::Value;
