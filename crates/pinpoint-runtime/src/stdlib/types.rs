//! Type predicates and conversions.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::stdlib::helpers::require_min;
use crate::stdlib::StandardLibrary;
use crate::value::{parse_numeric, ArrayValue, Value};

pub fn register(lib: &mut StandardLibrary) {
    lib.register("is_null", is_null);
    lib.register("is_bool", is_bool);
    lib.register("is_int", is_int);
    lib.register("is_integer", is_int);
    lib.register("is_long", is_int);
    lib.register("is_float", is_float);
    lib.register("is_double", is_float);
    lib.register("is_string", is_string);
    lib.register("is_array", is_array);
    lib.register("is_object", is_object);
    lib.register("is_numeric", is_numeric);
    lib.register("is_scalar", is_scalar);
    lib.register("is_iterable", is_array);
    lib.register("gettype", gettype);
    lib.register("get_debug_type", get_debug_type);
    lib.register("intval", intval);
    lib.register("floatval", floatval);
    lib.register("doubleval", floatval);
    lib.register("strval", strval);
    lib.register("boolval", boolval);
    lib.register("get_class", get_class);
    lib.register("get_parent_class", get_parent_class);
    lib.register("get_object_vars", get_object_vars);
}

fn first<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, RuntimeError> {
    require_min(name, args, 1)?;
    Ok(&args[0])
}

fn is_null(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(first("is_null", args)?.is_null()))
}

fn is_bool(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(first("is_bool", args)?, Value::Bool(_))))
}

fn is_int(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(first("is_int", args)?, Value::Int(_))))
}

fn is_float(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(first("is_float", args)?, Value::Float(_))))
}

fn is_string(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(first("is_string", args)?, Value::String(_))))
}

fn is_array(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(first("is_array", args)?, Value::Array(_))))
}

fn is_object(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(
        first("is_object", args)?,
        Value::Object(_) | Value::Closure(_)
    )))
}

fn is_numeric(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(match first("is_numeric", args)? {
        Value::Int(_) | Value::Float(_) => true,
        Value::String(text) => parse_numeric(text).is_some(),
        _ => false,
    }))
}

fn is_scalar(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(
        first("is_scalar", args)?,
        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
    )))
}

fn gettype(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(first("gettype", args)?.type_name()))
}

fn get_debug_type(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match first("get_debug_type", args)? {
        Value::Object(object) => Value::String(object.borrow().class_name().clone()),
        Value::Closure(_) => Value::from("Closure"),
        Value::Null => Value::from("null"),
        Value::Bool(_) => Value::from("bool"),
        Value::Int(_) => Value::from("int"),
        Value::Float(_) => Value::from("float"),
        Value::String(_) => Value::from("string"),
        Value::Array(_) => Value::from("array"),
    })
}

fn intval(args: &[Value]) -> Result<Value, RuntimeError> {
    let value = first("intval", args)?;
    let base = args.get(1).map_or(10, Value::to_int);
    if base == 10 {
        return Ok(Value::Int(value.to_int()));
    }
    let Value::String(text) = value else {
        return Ok(Value::Int(value.to_int()));
    };
    let base = u32::try_from(base)
        .ok()
        .filter(|base| (2..=36).contains(base))
        .ok_or_else(|| RuntimeError::type_error("intval(): base must be between 2 and 36"))?;
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = match base {
        16 => digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")).unwrap_or(digits),
        8 => digits.strip_prefix("0o").unwrap_or(digits),
        2 => digits.strip_prefix("0b").unwrap_or(digits),
        _ => digits,
    };
    let valid: String = digits.chars().take_while(|c| c.is_digit(base)).collect();
    let magnitude = i64::from_str_radix(&valid, base).unwrap_or(if valid.is_empty() { 0 } else { i64::MAX });
    Ok(Value::Int(if negative { -magnitude } else { magnitude }))
}

fn floatval(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Float(first("floatval", args)?.to_float()))
}

fn strval(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(first("strval", args)?.to_str()?))
}

fn boolval(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(first("boolval", args)?.to_bool()))
}

fn get_class(args: &[Value]) -> Result<Value, RuntimeError> {
    match first("get_class", args)? {
        Value::Object(object) => Ok(Value::String(object.borrow().class_name().clone())),
        Value::Closure(_) => Ok(Value::from("Closure")),
        other => Err(RuntimeError::type_error(format!(
            "get_class(): Argument #1 ($object) must be of type object, {} given",
            other.type_name()
        ))),
    }
}

fn get_parent_class(args: &[Value]) -> Result<Value, RuntimeError> {
    let parent: Option<SmolStr> = match first("get_parent_class", args)? {
        Value::Object(object) => object.borrow().class.parent.clone(),
        _ => None,
    };
    Ok(parent.map_or(Value::Bool(false), Value::String))
}

fn get_object_vars(args: &[Value]) -> Result<Value, RuntimeError> {
    match first("get_object_vars", args)? {
        Value::Object(object) => Ok(object
            .borrow()
            .properties
            .iter()
            .map(|(name, value)| (pinpoint_debug::ArrayKey::String(name.clone()), value.clone()))
            .collect::<ArrayValue>()
            .into()),
        Value::Closure(_) => Ok(Value::empty_array()),
        other => Err(RuntimeError::type_error(format!(
            "get_object_vars(): Argument #1 ($object) must be of type object, {} given",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gettype_names() {
        assert_eq!(gettype(&[Value::Float(1.0)]).unwrap(), Value::from("double"));
        assert_eq!(gettype(&[Value::Null]).unwrap(), Value::from("NULL"));
        assert_eq!(gettype(&[Value::empty_array()]).unwrap(), Value::from("array"));
    }

    #[test]
    fn test_is_numeric_strings() {
        assert_eq!(is_numeric(&[Value::from(" 12 ")]).unwrap(), Value::Bool(true));
        assert_eq!(is_numeric(&[Value::from("1e3")]).unwrap(), Value::Bool(true));
        assert_eq!(is_numeric(&[Value::from("12abc")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_intval_bases() {
        assert_eq!(intval(&[Value::from("ff"), Value::Int(16)]).unwrap(), Value::Int(255));
        assert_eq!(intval(&[Value::from("0b101"), Value::Int(2)]).unwrap(), Value::Int(5));
        assert_eq!(intval(&[Value::from("42abc")]).unwrap(), Value::Int(42));
    }
}
