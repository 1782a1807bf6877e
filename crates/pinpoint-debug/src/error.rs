//! Error types for registration, evaluation and configuration.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Why the sandbox refused an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The source did not parse.
    #[error("unable to compile expression: {0}")]
    Syntax(SmolStr),

    /// The source parsed but uses a construct outside the allowed grammar.
    #[error("expression contains invalid operation {construct} on line {line}")]
    Disallowed { construct: &'static str, line: u32 },

    /// A called function is not on any allow-list.
    #[error("function '{0}' is not allowed")]
    FunctionNotAllowed(SmolStr),

    /// A called static method is not on the method allow-list.
    #[error("method '{0}' is not allowed")]
    MethodNotAllowed(SmolStr),

    /// The call target is computed at runtime (`$f()`).
    #[error("dynamic call targets are not allowed")]
    DynamicCall,

    /// The source is empty, a block, or more than one statement.
    #[error("expected a single expression")]
    NotAnExpression,
}

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("invalid condition '{expression}': {reason}")]
    InvalidCondition {
        expression: SmolStr,
        reason: RejectReason,
    },

    #[error("invalid watch expression '{expression}': {reason}")]
    InvalidExpression {
        expression: SmolStr,
        reason: RejectReason,
    },

    #[error("breakpoint filename is empty")]
    EmptyFilename,

    #[error("breakpoint line must be at least 1")]
    InvalidLine,
}

/// An expression failed while being evaluated in a live scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub message: SmolStr,
}

impl EvalError {
    pub fn new(message: impl Into<SmolStr>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A callback sink refused or failed to accept a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("callback failed: {message}")]
pub struct SinkError {
    pub message: SmolStr,
}

impl SinkError {
    pub fn new(message: impl Into<SmolStr>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Configuration loading failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {message}")]
    Io { path: SmolStr, message: SmolStr },

    #[error("invalid config: {0}")]
    Parse(SmolStr),

    #[error("invalid config value: {0}")]
    Invalid(SmolStr),
}
