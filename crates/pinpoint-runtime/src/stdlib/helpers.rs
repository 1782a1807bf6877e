//! Helpers for standard function implementations.

#![allow(missing_docs)]

use std::rc::Rc;

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::value::{ArrayValue, Value};

pub fn require_arity(name: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    require_min(name, args, expected)
}

pub fn require_min(name: &str, args: &[Value], min: usize) -> Result<(), RuntimeError> {
    if args.len() >= min {
        Ok(())
    } else {
        Err(RuntimeError::ArgumentCount {
            function: SmolStr::new(name),
            expected: min,
            given: args.len(),
        })
    }
}

/// Array argument at `index`.
pub fn array_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a Rc<ArrayValue>, RuntimeError> {
    match args.get(index) {
        Some(Value::Array(array)) => Ok(array),
        Some(other) => Err(RuntimeError::type_error(format!(
            "{name}(): Argument #{} must be of type array, {} given",
            index + 1,
            other.type_name()
        ))),
        None => Err(RuntimeError::ArgumentCount {
            function: SmolStr::new(name),
            expected: index + 1,
            given: args.len(),
        }),
    }
}

/// String argument at `index`.
pub fn str_arg(name: &str, args: &[Value], index: usize) -> Result<SmolStr, RuntimeError> {
    require_min(name, args, index + 1)?;
    args[index].to_str()
}

/// Integer argument at `index`, or `default` when absent.
pub fn int_or(args: &[Value], index: usize, default: i64) -> i64 {
    args.get(index).map_or(default, Value::to_int)
}

/// Boolean argument at `index`, or `false` when absent.
pub fn flag(args: &[Value], index: usize) -> bool {
    args.get(index).is_some_and(Value::to_bool)
}

/// Resolves an `(offset, length)` pair against a sequence of `len` items,
/// counting negative values from the end.
pub fn slice_bounds(len: usize, offset: i64, length: Option<i64>) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let start = if offset < 0 {
        (len_i + offset).max(0)
    } else {
        offset.min(len_i)
    };
    let end = match length {
        None => len_i,
        Some(length) if length < 0 => (len_i + length).max(start),
        Some(length) => start.saturating_add(length).min(len_i),
    };
    let start = usize::try_from(start).unwrap_or(0);
    let end = usize::try_from(end).unwrap_or(0).max(start);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice_bounds(5, 1, None), (1, 5));
        assert_eq!(slice_bounds(5, -2, None), (3, 5));
        assert_eq!(slice_bounds(5, 1, Some(2)), (1, 3));
        assert_eq!(slice_bounds(5, 1, Some(-1)), (1, 4));
        assert_eq!(slice_bounds(5, 9, Some(2)), (5, 5));
        assert_eq!(slice_bounds(5, -9, Some(1)), (0, 1));
    }
}
