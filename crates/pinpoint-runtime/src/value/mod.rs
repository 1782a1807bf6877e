//! Runtime values and conversions.

use std::cmp::Ordering;
use std::rc::Rc;

use pinpoint_debug::{value::format_float, ArrayEntry, ArrayKey, CapturedObject, CapturedValue};
use smol_str::SmolStr;

use crate::error::RuntimeError;

pub mod array;
pub mod object;

pub use array::{string_key, ArrayValue};
pub use object::{ClosureValue, Object, ObjectRef};

/// A runtime value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(SmolStr),
    Array(Rc<ArrayValue>),
    Object(ObjectRef),
    Closure(Rc<ClosureValue>),
}

/// Result of numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(value) => Self::Int(value),
            Number::Float(value) => Self::Float(value),
        }
    }
}

impl From<ArrayKey> for Value {
    fn from(key: ArrayKey) -> Self {
        match key {
            ArrayKey::Int(value) => Self::Int(value),
            ArrayKey::String(value) => Self::String(value),
        }
    }
}

impl From<ArrayValue> for Value {
    fn from(array: ArrayValue) -> Self {
        Self::Array(Rc::new(array))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::String(SmolStr::new(text))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::String(SmolStr::new(text))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Structural equality for scalars and arrays, identity for objects and
/// closures. This is `===`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                Rc::ptr_eq(a, b)
                    || (a.len() == b.len()
                        && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| ka == kb && va == vb))
            }
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    #[must_use]
    pub fn empty_array() -> Self {
        Self::Array(Rc::new(ArrayValue::new()))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name reported by `gettype`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "double",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) | Self::Closure(_) => "object",
        }
    }

    /// Truthiness: `null`, `false`, `0`, `0.0`, `""`, `"0"` and `[]` are
    /// false; everything else is true.
    #[must_use]
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::String(value) => !(value.is_empty() || value == "0"),
            Self::Array(array) => !array.is_empty(),
            Self::Object(_) | Self::Closure(_) => true,
        }
    }

    /// Numeric value; strings use their leading numeric prefix.
    #[must_use]
    pub fn to_number(&self) -> Number {
        match self {
            Self::Null => Number::Int(0),
            Self::Bool(value) => Number::Int(i64::from(*value)),
            Self::Int(value) => Number::Int(*value),
            Self::Float(value) => Number::Float(*value),
            Self::String(text) => numeric_prefix(text),
            Self::Array(array) => Number::Int(i64::from(!array.is_empty())),
            Self::Object(_) | Self::Closure(_) => Number::Int(1),
        }
    }

    #[must_use]
    pub fn to_int(&self) -> i64 {
        match self.to_number() {
            Number::Int(value) => value,
            Number::Float(value) => float_to_int(value),
        }
    }

    #[must_use]
    pub fn to_float(&self) -> f64 {
        self.to_number().to_f64()
    }

    /// String conversion as used by `echo` and `.`.
    pub fn to_str(&self) -> Result<SmolStr, RuntimeError> {
        Ok(match self {
            Self::Null | Self::Bool(false) => SmolStr::default(),
            Self::Bool(true) => SmolStr::new_inline("1"),
            Self::Int(value) => SmolStr::new(value.to_string()),
            Self::Float(value) => SmolStr::new(format_float(*value)),
            Self::String(text) => text.clone(),
            Self::Array(_) => SmolStr::new_inline("Array"),
            Self::Object(object) => {
                return Err(RuntimeError::type_error(format!(
                    "object of class {} could not be converted to string",
                    object.borrow().class_name()
                )))
            }
            Self::Closure(_) => {
                return Err(RuntimeError::type_error(
                    "object of class Closure could not be converted to string",
                ))
            }
        })
    }

    /// Converts to an array key.
    pub fn to_key(&self) -> Result<ArrayKey, RuntimeError> {
        Ok(match self {
            Self::Null => ArrayKey::String(SmolStr::default()),
            Self::Bool(value) => ArrayKey::Int(i64::from(*value)),
            Self::Int(value) => ArrayKey::Int(*value),
            Self::Float(value) => ArrayKey::Int(float_to_int(*value)),
            Self::String(text) => string_key(text),
            Self::Array(_) | Self::Object(_) | Self::Closure(_) => {
                return Err(RuntimeError::type_error(format!(
                    "illegal offset type {}",
                    self.type_name()
                )))
            }
        })
    }

    /// `==`
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), _) => *a == other.to_bool(),
            (_, Self::Bool(b)) => self.to_bool() == *b,
            (Self::Null, Self::String(text)) | (Self::String(text), Self::Null) => text.is_empty(),
            (Self::Null, _) => !other.to_bool(),
            (_, Self::Null) => !self.to_bool(),
            (Self::String(a), Self::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
                (Some(x), Some(y)) => x.to_f64() == y.to_f64(),
                _ => a == b,
            },
            (Self::Int(_) | Self::Float(_), Self::String(text))
            | (Self::String(text), Self::Int(_) | Self::Float(_)) => {
                let number = if matches!(self, Self::String(_)) {
                    other.to_number()
                } else {
                    self.to_number()
                };
                match parse_numeric(text) {
                    Some(parsed) => parsed.to_f64() == number.to_f64(),
                    None => Value::from(number)
                        .to_str()
                        .is_ok_and(|rendered| rendered == *text),
                }
            }
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                self.to_float() == other.to_float()
            }
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value.loose_eq(other)))
            }
            (Self::Object(a), Self::Object(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                Rc::ptr_eq(&a.class, &b.class)
                    && a.properties.len() == b.properties.len()
                    && a.properties.iter().all(|(name, value)| {
                        b.properties
                            .get(name)
                            .is_some_and(|other| value.loose_eq(other))
                    })
            }
            _ => self == other,
        }
    }

    /// `<=>`
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::String(text)) => "".cmp(text.as_str()),
            (Self::String(text), Self::Null) => text.as_str().cmp(""),
            (Self::Bool(_) | Self::Null, _) | (_, Self::Bool(_) | Self::Null) => {
                self.to_bool().cmp(&other.to_bool())
            }
            (Self::String(a), Self::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
                (Some(x), Some(y)) => compare_numbers(x, y),
                _ => a.as_str().cmp(b.as_str()),
            },
            (Self::Int(_) | Self::Float(_), Self::String(text)) => match parse_numeric(text) {
                Some(parsed) => compare_numbers(self.to_number(), parsed),
                None => match self.to_str() {
                    Ok(rendered) => rendered.as_str().cmp(text.as_str()),
                    Err(_) => Ordering::Equal,
                },
            },
            (Self::String(_), Self::Int(_) | Self::Float(_)) => other.compare(self).reverse(),
            (Self::Array(a), Self::Array(b)) => {
                if a.len() != b.len() {
                    return a.len().cmp(&b.len());
                }
                for (key, value) in a.iter() {
                    let Some(other) = b.get(key) else {
                        return Ordering::Greater;
                    };
                    let ordering = value.compare(other);
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            }
            (Self::Array(_), _) => Ordering::Greater,
            (_, Self::Array(_)) => Ordering::Less,
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            _ => compare_numbers(self.to_number(), other.to_number()),
        }
    }

    /// Deep copy for the debugger.
    #[must_use]
    pub fn capture(&self) -> CapturedValue {
        let mut path = Vec::new();
        self.capture_inner(&mut path)
    }

    fn capture_inner(&self, path: &mut Vec<u64>) -> CapturedValue {
        match self {
            Self::Null => CapturedValue::Null,
            Self::Bool(value) => CapturedValue::Bool(*value),
            Self::Int(value) => CapturedValue::Int(*value),
            Self::Float(value) => CapturedValue::Float(*value),
            Self::String(text) => CapturedValue::String(text.to_string()),
            Self::Array(array) => CapturedValue::Array(
                array
                    .iter()
                    .map(|(key, value)| ArrayEntry {
                        key: key.clone(),
                        value: value.capture_inner(path),
                    })
                    .collect(),
            ),
            Self::Object(object) => {
                let object = object.borrow();
                if path.contains(&object.handle) {
                    return CapturedValue::Recursion;
                }
                path.push(object.handle);
                let properties = object
                    .properties
                    .iter()
                    .map(|(name, value)| (name.clone(), value.capture_inner(path)))
                    .collect();
                path.pop();
                CapturedValue::Object(CapturedObject {
                    class: object.class_name().clone(),
                    handle: object.handle,
                    properties,
                })
            }
            Self::Closure(closure) => CapturedValue::Object(CapturedObject {
                class: SmolStr::new_inline("Closure"),
                handle: closure.handle,
                properties: Vec::new(),
            }),
        }
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        _ => a
            .to_f64()
            .partial_cmp(&b.to_f64())
            .unwrap_or(Ordering::Equal),
    }
}

fn float_to_int(value: f64) -> i64 {
    if value.is_finite() {
        value as i64
    } else {
        0
    }
}

/// Parses a whole numeric string, allowing surrounding whitespace.
#[must_use]
pub fn parse_numeric(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (number, consumed) = scan_number(trimmed)?;
    (consumed == trimmed.len()).then_some(number)
}

/// Leading numeric prefix of a string; `0` when there is none.
fn numeric_prefix(text: &str) -> Number {
    let trimmed = text.trim_start();
    scan_number(trimmed).map_or(Number::Int(0), |(number, _)| number)
}

fn scan_number(text: &str) -> Option<(Number, usize)> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut is_float = false;
    let mut fraction_digits = 0;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut probe = end + 1;
        while probe < bytes.len() && bytes[probe].is_ascii_digit() {
            probe += 1;
            fraction_digits += 1;
        }
        if end > digits_start || fraction_digits > 0 {
            is_float = true;
            end = probe;
        }
    }
    if end == digits_start {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut probe = end + 1;
        if matches!(bytes.get(probe), Some(b'+' | b'-')) {
            probe += 1;
        }
        let exponent_start = probe;
        while probe < bytes.len() && bytes[probe].is_ascii_digit() {
            probe += 1;
        }
        if probe > exponent_start {
            is_float = true;
            end = probe;
        }
    }
    let slice = &text[..end];
    if !is_float {
        if let Ok(value) = slice.parse::<i64>() {
            return Some((Number::Int(value), end));
        }
    }
    slice.parse::<f64>().ok().map(|value| (Number::Float(value), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_strings() {
        assert_eq!(parse_numeric("42"), Some(Number::Int(42)));
        assert_eq!(parse_numeric(" 1.5 "), Some(Number::Float(1.5)));
        assert_eq!(parse_numeric("1e3"), Some(Number::Float(1000.0)));
        assert_eq!(parse_numeric("12abc"), None);
        assert_eq!(parse_numeric("."), None);
        assert_eq!(Value::from("12abc").to_int(), 12);
        assert_eq!(Value::from("abc").to_int(), 0);
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Int(1).loose_eq(&Value::from("1")));
        assert!(Value::from("10").loose_eq(&Value::from("1e1")));
        assert!(!Value::from("abc").loose_eq(&Value::Int(0)));
        assert!(Value::Null.loose_eq(&Value::Bool(false)));
        assert!(Value::Null.loose_eq(&Value::from("")));
        assert!(!Value::Int(1).loose_eq(&Value::Int(2)));
    }

    #[test]
    fn test_compare() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(Value::from("b").compare(&Value::from("a")), Ordering::Greater);
        assert_eq!(Value::from("10").compare(&Value::from("9")), Ordering::Greater);
        assert_eq!(Value::Int(5).compare(&Value::from("5")), Ordering::Equal);
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(Value::Float(3.0).to_str().unwrap(), "3");
        assert_eq!(Value::Bool(true).to_str().unwrap(), "1");
        assert_eq!(Value::Null.to_str().unwrap(), "");
        assert_eq!(Value::empty_array().to_str().unwrap(), "Array");
    }

    #[test]
    fn test_capture_copies_arrays() {
        let mut array = ArrayValue::new();
        array.insert(ArrayKey::String("k".into()), Value::Int(1));
        let value = Value::from(array);
        assert_eq!(
            value.capture(),
            CapturedValue::Array(vec![ArrayEntry {
                key: ArrayKey::String("k".into()),
                value: CapturedValue::Int(1),
            }])
        );
    }
}
