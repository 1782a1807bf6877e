//! Standard library registry.
//!
//! Library functions receive evaluated arguments and return a value. Anything
//! that needs the interpreter (by-reference arguments, callbacks, output) is
//! an intrinsic in [`crate::eval::intrinsics`] instead.

pub mod array;
pub mod helpers;
pub mod json;
pub mod math;
pub mod output;
pub mod string;
pub mod types;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::eval::lowercase;
use crate::value::Value;

/// Standard function signature.
pub type StdFunc = fn(&[Value]) -> Result<Value, RuntimeError>;

/// Standard library registry.
#[derive(Debug, Default, Clone)]
pub struct StandardLibrary {
    functions: IndexMap<SmolStr, StdFunc>,
}

impl StandardLibrary {
    /// Build a standard library with default functions.
    #[must_use]
    pub fn new() -> Self {
        let mut lib = Self {
            functions: IndexMap::new(),
        };
        string::register(&mut lib);
        array::register(&mut lib);
        types::register(&mut lib);
        math::register(&mut lib);
        json::register(&mut lib);
        lib
    }

    /// Register a standard function by name. Names are case-insensitive.
    pub fn register(&mut self, name: &str, func: StdFunc) {
        self.functions.insert(lowercase(name), func);
    }

    /// Look up a function by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<StdFunc> {
        self.functions.get(&lowercase(name)).copied()
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&lowercase(name))
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.functions.keys()
    }
}
