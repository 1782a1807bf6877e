//! Array standard functions.

#![allow(missing_docs)]

use pinpoint_debug::ArrayKey;

use crate::error::RuntimeError;
use crate::stdlib::helpers::{array_arg, flag, int_or, require_min, slice_bounds};
use crate::stdlib::StandardLibrary;
use crate::value::{ArrayValue, Number, Value};

pub fn register(lib: &mut StandardLibrary) {
    lib.register("count", count);
    lib.register("sizeof", count);
    lib.register("array_keys", array_keys);
    lib.register("array_values", array_values);
    lib.register("in_array", in_array);
    lib.register("array_search", array_search);
    lib.register("array_key_exists", array_key_exists);
    lib.register("key_exists", array_key_exists);
    lib.register("array_key_first", array_key_first);
    lib.register("array_key_last", array_key_last);
    lib.register("array_merge", array_merge);
    lib.register("array_slice", array_slice);
    lib.register("array_reverse", array_reverse);
    lib.register("array_sum", array_sum);
    lib.register("array_product", array_product);
    lib.register("array_unique", array_unique);
    lib.register("array_flip", array_flip);
    lib.register("array_combine", array_combine);
    lib.register("array_fill", array_fill);
    lib.register("array_fill_keys", array_fill_keys);
    lib.register("array_count_values", array_count_values);
    lib.register("array_diff", array_diff);
    lib.register("array_intersect", array_intersect);
    lib.register("array_chunk", array_chunk);
    lib.register("array_column", array_column);
    lib.register("range", range);
}

fn len_value(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

fn count(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("count", args, 1)?;
    match &args[0] {
        Value::Array(array) => Ok(len_value(array.len())),
        other => Err(RuntimeError::type_error(format!(
            "count(): Argument #1 ($value) must be of type Countable|array, {} given",
            other.type_name()
        ))),
    }
}

fn array_keys(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_keys", args, 0)?;
    let keys = array.keys().cloned().map(Value::from);
    Ok(ArrayValue::from_list(keys).into())
}

fn array_values(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_values", args, 0)?;
    Ok(ArrayValue::from_list(array.values().cloned()).into())
}

fn same_value(needle: &Value, candidate: &Value, strict: bool) -> bool {
    if strict {
        needle == candidate
    } else {
        needle.loose_eq(candidate)
    }
}

fn in_array(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("in_array", args, 2)?;
    let haystack = array_arg("in_array", args, 1)?;
    let strict = flag(args, 2);
    Ok(Value::Bool(
        haystack.values().any(|value| same_value(&args[0], value, strict)),
    ))
}

fn array_search(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("array_search", args, 2)?;
    let haystack = array_arg("array_search", args, 1)?;
    let strict = flag(args, 2);
    Ok(haystack
        .iter()
        .find(|(_, value)| same_value(&args[0], value, strict))
        .map_or(Value::Bool(false), |(key, _)| Value::from(key.clone())))
}

fn array_key_exists(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("array_key_exists", args, 2)?;
    let array = array_arg("array_key_exists", args, 1)?;
    Ok(Value::Bool(array.contains_key(&args[0].to_key()?)))
}

fn array_key_first(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_key_first", args, 0)?;
    Ok(array.first_key().cloned().map_or(Value::Null, Value::from))
}

fn array_key_last(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_key_last", args, 0)?;
    Ok(array.last_key().cloned().map_or(Value::Null, Value::from))
}

/// Appends `source` to `target`: integer keys are renumbered, string keys
/// overwrite.
fn merge_into(target: &mut ArrayValue, source: &ArrayValue) {
    for (key, value) in source.iter() {
        match key {
            ArrayKey::Int(_) => target.push(value.clone()),
            ArrayKey::String(_) => target.insert(key.clone(), value.clone()),
        }
    }
}

fn array_merge(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut result = ArrayValue::new();
    for index in 0..args.len() {
        merge_into(&mut result, array_arg("array_merge", args, index)?);
    }
    Ok(result.into())
}

fn array_slice(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_slice", args, 0)?;
    let offset = int_or(args, 1, 0);
    let length = args.get(2).filter(|value| !value.is_null()).map(Value::to_int);
    let preserve = flag(args, 3);
    let (start, end) = slice_bounds(array.len(), offset, length);

    let mut result = ArrayValue::new();
    for (key, value) in array.iter().skip(start).take(end - start) {
        match key {
            ArrayKey::Int(_) if !preserve => result.push(value.clone()),
            _ => result.insert(key.clone(), value.clone()),
        }
    }
    Ok(result.into())
}

fn array_reverse(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_reverse", args, 0)?;
    let preserve = flag(args, 1);
    let entries: Vec<_> = array.iter().collect();
    let mut result = ArrayValue::new();
    for (key, value) in entries.into_iter().rev() {
        match key {
            ArrayKey::Int(_) if !preserve => result.push(value.clone()),
            _ => result.insert(key.clone(), value.clone()),
        }
    }
    Ok(result.into())
}

fn fold_numbers(
    name: &str,
    args: &[Value],
    initial: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    let array = array_arg(name, args, 0)?;
    let mut total = initial;
    for value in array.values() {
        total = match (total, value.to_number()) {
            (Number::Int(a), Number::Int(b)) => int_op(a, b).map_or_else(
                || Number::Float(float_op(a as f64, b as f64)),
                Number::Int,
            ),
            (a, b) => Number::Float(float_op(a.to_f64(), b.to_f64())),
        };
    }
    Ok(total.into())
}

fn array_sum(args: &[Value]) -> Result<Value, RuntimeError> {
    fold_numbers("array_sum", args, Number::Int(0), i64::checked_add, |a, b| a + b)
}

fn array_product(args: &[Value]) -> Result<Value, RuntimeError> {
    fold_numbers("array_product", args, Number::Int(1), i64::checked_mul, |a, b| a * b)
}

fn array_unique(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_unique", args, 0)?;
    let mut seen: Vec<&Value> = Vec::new();
    let mut result = ArrayValue::new();
    for (key, value) in array.iter() {
        if seen.iter().any(|earlier| earlier.loose_eq(value)) {
            continue;
        }
        seen.push(value);
        result.insert(key.clone(), value.clone());
    }
    Ok(result.into())
}

fn array_flip(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_flip", args, 0)?;
    let mut result = ArrayValue::new();
    for (key, value) in array.iter() {
        result.insert(value.to_key()?, Value::from(key.clone()));
    }
    Ok(result.into())
}

fn array_combine(args: &[Value]) -> Result<Value, RuntimeError> {
    let keys = array_arg("array_combine", args, 0)?;
    let values = array_arg("array_combine", args, 1)?;
    if keys.len() != values.len() {
        return Err(RuntimeError::type_error(
            "array_combine(): Argument #1 ($keys) and argument #2 ($values) must have the same number of elements",
        ));
    }
    let mut result = ArrayValue::new();
    for (key, value) in keys.values().zip(values.values()) {
        result.insert(key.to_key()?, value.clone());
    }
    Ok(result.into())
}

fn array_fill(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("array_fill", args, 3)?;
    let start = args[0].to_int();
    let count = args[1].to_int();
    if count < 0 {
        return Err(RuntimeError::type_error(
            "array_fill(): Argument #2 ($count) must be greater than or equal to 0",
        ));
    }
    let mut result = ArrayValue::new();
    for offset in 0..count {
        result.insert(ArrayKey::Int(start.saturating_add(offset)), args[2].clone());
    }
    Ok(result.into())
}

fn array_fill_keys(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("array_fill_keys", args, 2)?;
    let keys = array_arg("array_fill_keys", args, 0)?;
    let mut result = ArrayValue::new();
    for key in keys.values() {
        result.insert(key.to_key()?, args[1].clone());
    }
    Ok(result.into())
}

fn array_count_values(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_count_values", args, 0)?;
    let mut result = ArrayValue::new();
    for value in array.values() {
        if !matches!(value, Value::Int(_) | Value::String(_)) {
            continue;
        }
        let slot = result.slot(Some(value.to_key()?));
        *slot = Value::Int(slot.to_int() + 1);
    }
    Ok(result.into())
}

/// Entries of the first array whose string form does (or does not) occur in
/// every other array.
fn filter_by_presence(name: &str, args: &[Value], keep_present: bool) -> Result<Value, RuntimeError> {
    let first = array_arg(name, args, 0)?;
    let mut others = Vec::new();
    for index in 1..args.len() {
        let values = array_arg(name, args, index)?
            .values()
            .map(Value::to_str)
            .collect::<Result<Vec<_>, _>>()?;
        others.push(values);
    }
    let mut result = ArrayValue::new();
    for (key, value) in first.iter() {
        let text = value.to_str()?;
        let present = if keep_present {
            others.iter().all(|values| values.contains(&text))
        } else {
            others.iter().any(|values| values.contains(&text))
        };
        if present == keep_present {
            result.insert(key.clone(), value.clone());
        }
    }
    Ok(result.into())
}

fn array_diff(args: &[Value]) -> Result<Value, RuntimeError> {
    filter_by_presence("array_diff", args, false)
}

fn array_intersect(args: &[Value]) -> Result<Value, RuntimeError> {
    filter_by_presence("array_intersect", args, true)
}

fn array_chunk(args: &[Value]) -> Result<Value, RuntimeError> {
    let array = array_arg("array_chunk", args, 0)?;
    let size = usize::try_from(int_or(args, 1, 0))
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| {
            RuntimeError::type_error("array_chunk(): Argument #2 ($length) must be greater than 0")
        })?;
    let preserve = flag(args, 2);
    let entries: Vec<_> = array.iter().collect();
    let chunks = entries.chunks(size).map(|chunk| {
        let mut part = ArrayValue::new();
        for (key, value) in chunk {
            if preserve {
                part.insert((*key).clone(), (*value).clone());
            } else {
                part.push((*value).clone());
            }
        }
        Value::from(part)
    });
    Ok(ArrayValue::from_list(chunks).into())
}

fn array_column(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("array_column", args, 2)?;
    let rows = array_arg("array_column", args, 0)?;
    let column = match &args[1] {
        Value::Null => None,
        other => Some(other.to_key()?),
    };
    let index = match args.get(2) {
        None | Some(Value::Null) => None,
        Some(other) => Some(other.to_key()?),
    };

    let field = |row: &Value, key: &ArrayKey| -> Option<Value> {
        match row {
            Value::Array(row) => row.get(key).cloned(),
            Value::Object(object) => match key {
                ArrayKey::String(name) => object.borrow().properties.get(name).cloned(),
                ArrayKey::Int(_) => None,
            },
            _ => None,
        }
    };

    let mut result = ArrayValue::new();
    for row in rows.values() {
        let value = match &column {
            Some(column) => match field(row, column) {
                Some(value) => value,
                None => continue,
            },
            None => row.clone(),
        };
        match index.as_ref().and_then(|index| field(row, index)) {
            Some(key) => result.insert(key.to_key()?, value),
            None => result.push(value),
        }
    }
    Ok(result.into())
}

fn range(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("range", args, 2)?;
    let step = args.get(2).map_or(Number::Int(1), Value::to_number);

    if let (Value::String(start), Value::String(end)) = (&args[0], &args[1]) {
        let single = |text: &str| {
            let mut bytes = text.bytes();
            match (bytes.next(), bytes.next()) {
                (Some(byte), None) if !byte.is_ascii_digit() => Some(byte),
                _ => None,
            }
        };
        if let (Some(start), Some(end)) = (single(start), single(end)) {
            let step = usize::try_from(step.to_f64().abs() as i64).unwrap_or(1).max(1);
            let letters: Vec<u8> = if start <= end {
                (start..=end).step_by(step).collect()
            } else {
                (end..=start).rev().step_by(step).collect()
            };
            let values = letters.into_iter().map(|byte| Value::from(char::from(byte).to_string()));
            return Ok(ArrayValue::from_list(values).into());
        }
    }

    let start = args[0].to_number();
    let end = args[1].to_number();
    if step.to_f64() == 0.0 {
        return Err(RuntimeError::type_error(
            "range(): Argument #3 ($step) cannot be 0",
        ));
    }
    if let (Number::Int(start), Number::Int(end), Number::Int(step)) = (start, end, step) {
        let step = step.unsigned_abs();
        let span = start.abs_diff(end);
        if span / step > MAX_RANGE {
            return Err(RuntimeError::type_error("range(): too many elements"));
        }
        let values = (0..=span / step).map(|index| {
            let offset = i64::try_from(index * step).unwrap_or(i64::MAX);
            Value::Int(if start <= end { start + offset } else { start - offset })
        });
        return Ok(ArrayValue::from_list(values).into());
    }

    let (start, end, step) = (start.to_f64(), end.to_f64(), step.to_f64().abs());
    let steps = ((end - start).abs() / step).floor();
    if !steps.is_finite() || steps > MAX_RANGE as f64 {
        return Err(RuntimeError::type_error("range(): too many elements"));
    }
    let direction = if start <= end { 1.0 } else { -1.0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let values = (0..=steps as u64).map(|index| Value::Float(start + direction * step * index as f64));
    Ok(ArrayValue::from_list(values).into())
}

const MAX_RANGE: u64 = 1 << 24;

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[i64]) -> Value {
        ArrayValue::from_list(values.iter().copied().map(Value::Int)).into()
    }

    #[test]
    fn test_merge_renumbers_int_keys() {
        let mut named = ArrayValue::new();
        named.insert(ArrayKey::String("a".into()), Value::Int(1));
        named.insert(ArrayKey::Int(7), Value::Int(2));
        let merged = array_merge(&[named.into(), list(&[3])]).unwrap();
        let Value::Array(merged) = merged else {
            panic!("expected array");
        };
        let keys: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![ArrayKey::String("a".into()), ArrayKey::Int(0), ArrayKey::Int(1)]
        );
    }

    #[test]
    fn test_range_variants() {
        assert_eq!(range(&[Value::Int(1), Value::Int(4)]).unwrap(), list(&[1, 2, 3, 4]));
        assert_eq!(
            range(&[Value::Int(10), Value::Int(0), Value::Int(5)]).unwrap(),
            list(&[10, 5, 0])
        );
        let letters = range(&[Value::from("a"), Value::from("c")]).unwrap();
        let Value::Array(letters) = letters else {
            panic!("expected array");
        };
        assert_eq!(letters.values().cloned().collect::<Vec<_>>(), vec![
            Value::from("a"),
            Value::from("b"),
            Value::from("c")
        ]);
        assert!(range(&[Value::Int(1), Value::Int(2), Value::Int(0)]).is_err());
    }

    #[test]
    fn test_search_loose_and_strict() {
        let haystack: Value = ArrayValue::from_list([Value::from("1"), Value::Int(2)]).into();
        assert_eq!(
            array_search(&[Value::Int(1), Value::clone(&haystack)]).unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            in_array(&[Value::Int(1), haystack, Value::Bool(true)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_slice_and_sum() {
        assert_eq!(
            array_slice(&[list(&[1, 2, 3, 4]), Value::Int(1), Value::Int(2)]).unwrap(),
            list(&[2, 3])
        );
        assert_eq!(array_sum(&[list(&[1, 2, 3])]).unwrap(), Value::Int(6));
        assert_eq!(
            array_sum(&[ArrayValue::from_list([Value::Int(1), Value::Float(0.5)]).into()]).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn test_count_rejects_scalars() {
        assert!(count(&[Value::Int(3)]).is_err());
        assert_eq!(count(&[list(&[1, 2])]).unwrap(), Value::Int(2));
    }
}
