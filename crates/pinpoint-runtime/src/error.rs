//! Runtime error types.

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while loading, compiling or executing a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Read of a variable that was never assigned.
    #[error("undefined variable ${0}")]
    UndefinedVariable(SmolStr),

    /// Read of a missing array key.
    #[error("undefined array key {0}")]
    UndefinedIndex(SmolStr),

    /// Read of a missing object property.
    #[error("undefined property {class}::${name}")]
    UndefinedProperty { class: SmolStr, name: SmolStr },

    /// Call of an unknown function.
    #[error("call to undefined function {0}()")]
    UndefinedFunction(SmolStr),

    /// Call of an unknown method.
    #[error("call to undefined method {class}::{name}()")]
    UndefinedMethod { class: SmolStr, name: SmolStr },

    /// Reference to an unknown class.
    #[error("class \"{0}\" not found")]
    UndefinedClass(SmolStr),

    /// Reference to an unknown constant.
    #[error("undefined constant {0}")]
    UndefinedConstant(SmolStr),

    /// Operand of the wrong type.
    #[error("type error: {0}")]
    TypeError(SmolStr),

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Too few arguments for a call.
    #[error("too few arguments to {function}(): {given} passed, at least {expected} expected")]
    ArgumentCount {
        function: SmolStr,
        expected: usize,
        given: usize,
    },

    /// Nested calls exceeded the depth limit.
    #[error("maximum call depth of {0} reached")]
    CallDepth(usize),

    /// Source file failed to parse.
    #[error("parse error in {filename}: {message}")]
    Compile { filename: SmolStr, message: SmolStr },

    /// Source file could not be read.
    #[error("failed to open '{filename}': {message}")]
    Load { filename: SmolStr, message: SmolStr },

    /// `break` or `continue` outside a loop, or `return` outside a function
    /// where it is not allowed.
    #[error("'{0}' not in loop context")]
    InvalidControlFlow(&'static str),
}

impl RuntimeError {
    pub(crate) fn type_error(message: impl Into<SmolStr>) -> Self {
        Self::TypeError(message.into())
    }
}
