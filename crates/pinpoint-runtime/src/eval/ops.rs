//! Operator semantics.

#![allow(missing_docs)]

use std::cmp::Ordering;
use std::rc::Rc;

use pinpoint_syntax::{BinaryOp, CastType, IncDecOp, UnaryOp};
use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::value::{parse_numeric, ArrayValue, Number, Value};

/// Applies a binary operator to evaluated operands. `&&`, `||` and `??`
/// are short-circuited by the caller; here they see both sides.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    Ok(match op {
        BinaryOp::Add => {
            if let (Value::Array(a), Value::Array(b)) = (left, right) {
                return Ok(array_union(a, b));
            }
            arithmetic(op, left, right)?
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
            arithmetic(op, left, right)?
        }
        BinaryOp::Concat => {
            let mut text = left.to_str()?.to_string();
            text.push_str(&right.to_str()?);
            Value::from(text)
        }
        BinaryOp::Eq => Value::Bool(left.loose_eq(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_eq(right)),
        BinaryOp::Identical => Value::Bool(left == right),
        BinaryOp::NotIdentical => Value::Bool(left != right),
        BinaryOp::Lt => Value::Bool(left.compare(right) == Ordering::Less),
        BinaryOp::LtEq => Value::Bool(left.compare(right) != Ordering::Greater),
        BinaryOp::Gt => Value::Bool(left.compare(right) == Ordering::Greater),
        BinaryOp::GtEq => Value::Bool(left.compare(right) != Ordering::Less),
        BinaryOp::And => Value::Bool(left.to_bool() && right.to_bool()),
        BinaryOp::Or => Value::Bool(left.to_bool() || right.to_bool()),
        BinaryOp::Coalesce => {
            if left.is_null() {
                right.clone()
            } else {
                left.clone()
            }
        }
    })
}

fn array_union(left: &Rc<ArrayValue>, right: &Rc<ArrayValue>) -> Value {
    let mut result = ArrayValue::clone(left);
    for (key, value) in right.iter() {
        if !result.contains_key(key) {
            result.insert(key.clone(), value.clone());
        }
    }
    Value::from(result)
}

fn operand(value: &Value) -> Result<Number, RuntimeError> {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Closure(_) => Err(RuntimeError::type_error(
            format!("unsupported operand type {}", value.type_name()),
        )),
        _ => Ok(value.to_number()),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let a = operand(left)?;
    let b = operand(right)?;
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        let exact = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            BinaryOp::Mul => x.checked_mul(y),
            BinaryOp::Div => {
                if y == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                if x % y == 0 {
                    x.checked_div(y)
                } else {
                    None
                }
            }
            BinaryOp::Pow => u32::try_from(y).ok().and_then(|exp| x.checked_pow(exp)),
            _ => None,
        };
        if let Some(value) = exact {
            return Ok(Value::Int(value));
        }
    }
    if op == BinaryOp::Mod {
        let (x, y) = (left.to_int(), right.to_int());
        if y == 0 {
            return Err(RuntimeError::DivisionByZero);
        }
        return Ok(Value::Int(x.checked_rem(y).unwrap_or(0)));
    }

    let (x, y) = (a.to_f64(), b.to_f64());
    Ok(Value::Float(match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            x / y
        }
        _ => x.powf(y),
    }))
}

pub fn unary(op: UnaryOp, value: &Value) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.to_bool())),
        UnaryOp::Neg => arithmetic(BinaryOp::Mul, value, &Value::Int(-1)),
        UnaryOp::Plus => Ok(operand(value)?.into()),
    }
}

pub fn cast(ty: CastType, value: Value) -> Result<Value, RuntimeError> {
    Ok(match ty {
        CastType::Int => Value::Int(value.to_int()),
        CastType::Float => Value::Float(value.to_float()),
        CastType::String => Value::String(value.to_str()?),
        CastType::Bool => Value::Bool(value.to_bool()),
        CastType::Array => match value {
            Value::Array(_) => value,
            Value::Null => Value::empty_array(),
            Value::Object(object) => object
                .borrow()
                .properties
                .iter()
                .map(|(name, value)| (pinpoint_debug::ArrayKey::String(name.clone()), value.clone()))
                .collect::<ArrayValue>()
                .into(),
            other => ArrayValue::from_list([other]).into(),
        },
    })
}

/// New value of an increment or decrement target.
pub fn step(op: IncDecOp, value: &Value) -> Result<Value, RuntimeError> {
    let increment = matches!(op, IncDecOp::PreInc | IncDecOp::PostInc);
    Ok(match value {
        Value::Null => {
            if increment {
                Value::Int(1)
            } else {
                Value::Null
            }
        }
        Value::Bool(_) => value.clone(),
        Value::Int(_) | Value::Float(_) => step_number(value.to_number(), increment),
        Value::String(text) => match parse_numeric(text) {
            Some(number) => step_number(number, increment),
            None if increment => Value::String(increment_string(text)),
            None => value.clone(),
        },
        Value::Array(_) | Value::Object(_) | Value::Closure(_) => {
            return Err(RuntimeError::type_error(format!(
                "cannot increment or decrement {}",
                value.type_name()
            )))
        }
    })
}

fn step_number(number: Number, increment: bool) -> Value {
    let delta = if increment { 1 } else { -1 };
    match number {
        Number::Int(value) => value
            .checked_add(delta)
            .map_or_else(|| Value::Float(value as f64 + delta as f64), Value::Int),
        Number::Float(value) => Value::Float(value + delta as f64),
    }
}

/// `"a"` becomes `"b"`, `"Az"` becomes `"Ba"`, `"zz"` becomes `"aaa"`.
fn increment_string(text: &str) -> SmolStr {
    if text.is_empty() {
        return SmolStr::new_inline("1");
    }
    let mut chars: Vec<char> = text.chars().collect();
    let mut index = chars.len();
    while index > 0 {
        index -= 1;
        let (next, carry) = match chars[index] {
            'z' => ('a', true),
            'Z' => ('A', true),
            '9' => ('0', true),
            c if c.is_ascii_alphanumeric() => (char::from(c as u8 + 1), false),
            _ => return SmolStr::from_iter(chars),
        };
        chars[index] = next;
        if !carry {
            return SmolStr::from_iter(chars);
        }
    }
    let first = match chars[0] {
        'a' => 'a',
        'A' => 'A',
        _ => '1',
    };
    chars.insert(0, first);
    SmolStr::from_iter(chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_overflow_becomes_float() {
        let result = binary(BinaryOp::Add, &Value::Int(i64::MAX), &Value::Int(1)).unwrap();
        assert!(matches!(result, Value::Float(_)));
    }

    #[test]
    fn test_division() {
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(6), &Value::Int(3)).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(7), &Value::Int(2)).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(1), &Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Mod, &Value::Int(7), &Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        );
    }

    #[test]
    fn test_concat_and_comparison() {
        assert_eq!(
            binary(BinaryOp::Concat, &Value::from("n="), &Value::Int(3)).unwrap(),
            Value::from("n=3")
        );
        assert_eq!(
            binary(BinaryOp::Lt, &Value::Int(2), &Value::from("10")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOp::Identical, &Value::Int(1), &Value::from("1")).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_arrays_reject_arithmetic() {
        assert!(binary(BinaryOp::Sub, &Value::empty_array(), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_string_increment() {
        assert_eq!(increment_string("a"), "b");
        assert_eq!(increment_string("Az"), "Ba");
        assert_eq!(increment_string("zz"), "aaa");
        assert_eq!(
            step(IncDecOp::PostInc, &Value::from("9")).unwrap(),
            Value::Int(10)
        );
    }
}
