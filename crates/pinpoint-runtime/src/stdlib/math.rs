//! Math standard functions.

#![allow(missing_docs)]

use std::cmp::Ordering;

use crate::error::RuntimeError;
use crate::stdlib::helpers::{int_or, require_min};
use crate::stdlib::StandardLibrary;
use crate::value::{Number, Value};

pub fn register(lib: &mut StandardLibrary) {
    lib.register("abs", abs);
    lib.register("ceil", ceil);
    lib.register("floor", floor);
    lib.register("round", round);
    lib.register("max", max);
    lib.register("min", min);
    lib.register("intdiv", intdiv);
    lib.register("fmod", fmod);
    lib.register("sqrt", sqrt);
    lib.register("pow", pow);
    lib.register("pi", pi);
    lib.register("is_nan", is_nan);
    lib.register("is_finite", is_finite);
}

fn number(name: &str, args: &[Value]) -> Result<Number, RuntimeError> {
    require_min(name, args, 1)?;
    match &args[0] {
        Value::Array(_) | Value::Object(_) | Value::Closure(_) => Err(RuntimeError::type_error(
            format!("{name}(): Argument #1 ($num) must be of type int|float, {} given", args[0].type_name()),
        )),
        value => Ok(value.to_number()),
    }
}

fn abs(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match number("abs", args)? {
        Number::Int(value) => value
            .checked_abs()
            .map_or_else(|| Value::Float((value as f64).abs()), Value::Int),
        Number::Float(value) => Value::Float(value.abs()),
    })
}

fn ceil(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Float(number("ceil", args)?.to_f64().ceil()))
}

fn floor(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Float(number("floor", args)?.to_f64().floor()))
}

fn round(args: &[Value]) -> Result<Value, RuntimeError> {
    let value = number("round", args)?.to_f64();
    let precision = i32::try_from(int_or(args, 1, 0)).unwrap_or(0);
    let factor = 10f64.powi(precision);
    let rounded = (value * factor).round() / factor;
    Ok(Value::Float(if rounded.is_finite() { rounded } else { value }))
}

/// Candidates for `max`/`min`: a single array argument or all arguments.
fn candidates<'a>(name: &str, args: &'a [Value]) -> Result<Vec<&'a Value>, RuntimeError> {
    require_min(name, args, 1)?;
    let values: Vec<&Value> = match args {
        [Value::Array(array)] => array.values().collect(),
        [single] => {
            return Err(RuntimeError::type_error(format!(
                "{name}(): Argument #1 ($value) must be of type array, {} given",
                single.type_name()
            )))
        }
        many => many.iter().collect(),
    };
    if values.is_empty() {
        return Err(RuntimeError::type_error(format!(
            "{name}(): Argument #1 ($value) must contain at least one element"
        )));
    }
    Ok(values)
}

fn extreme(name: &str, args: &[Value], wanted: Ordering) -> Result<Value, RuntimeError> {
    let values = candidates(name, args)?;
    let mut best = values[0];
    for &value in &values[1..] {
        if value.compare(best) == wanted {
            best = value;
        }
    }
    Ok(best.clone())
}

fn max(args: &[Value]) -> Result<Value, RuntimeError> {
    extreme("max", args, Ordering::Greater)
}

fn min(args: &[Value]) -> Result<Value, RuntimeError> {
    extreme("min", args, Ordering::Less)
}

fn intdiv(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("intdiv", args, 2)?;
    let (a, b) = (args[0].to_int(), args[1].to_int());
    if b == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    a.checked_div(b)
        .map(Value::Int)
        .ok_or_else(|| RuntimeError::type_error("intdiv(): division of PHP_INT_MIN by -1 is not an integer"))
}

fn fmod(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("fmod", args, 2)?;
    Ok(Value::Float(args[0].to_float() % args[1].to_float()))
}

fn sqrt(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Float(number("sqrt", args)?.to_f64().sqrt()))
}

fn pow(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("pow", args, 2)?;
    crate::eval::ops::binary(pinpoint_syntax::BinaryOp::Pow, &args[0], &args[1])
}

fn pi(_args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Float(std::f64::consts::PI))
}

fn is_nan(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(number("is_nan", args)?.to_f64().is_nan()))
}

fn is_finite(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(number("is_finite", args)?.to_f64().is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArrayValue;

    #[test]
    fn test_max_min_over_arguments_and_arrays() {
        assert_eq!(max(&[Value::Int(1), Value::Int(5), Value::Int(3)]).unwrap(), Value::Int(5));
        let array = ArrayValue::from_list([Value::Float(2.5), Value::Int(-1)]);
        assert_eq!(min(&[array.into()]).unwrap(), Value::Int(-1));
        assert!(max(&[Value::empty_array()]).is_err());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(&[Value::Float(2.5)]).unwrap(), Value::Float(3.0));
        assert_eq!(round(&[Value::Float(-2.5)]).unwrap(), Value::Float(-3.0));
        assert_eq!(round(&[Value::Float(1.955), Value::Int(1)]).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn test_intdiv_by_zero() {
        assert_eq!(
            intdiv(&[Value::Int(1), Value::Int(0)]),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(intdiv(&[Value::Int(7), Value::Int(2)]).unwrap(), Value::Int(3));
    }
}
