//! Point-in-time copies of host values.
//!
//! A [`CapturedValue`] owns all of its data. Hosts build one by walking their
//! live value; nothing in here can alias host state, so later execution
//! cannot change a recorded snapshot.

use std::fmt;

use serde::Serialize;
use smol_str::SmolStr;

/// Fixed per-value overhead used by [`CapturedValue::estimated_size`].
const VALUE_OVERHEAD: usize = 16;

/// A deep copy of a runtime value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CapturedValue {
    /// `null`, and variables that exist but hold nothing.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    String(String),
    /// Ordered array entries.
    Array(Vec<ArrayEntry>),
    /// Object with its properties at capture time.
    Object(CapturedObject),
    /// An object already being captured further up the same path.
    Recursion,
}

/// One array entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayEntry {
    /// Entry key.
    pub key: ArrayKey,
    /// Entry value.
    pub value: CapturedValue,
}

/// Array keys are integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ArrayKey {
    /// Integer key.
    Int(i64),
    /// String key.
    String(SmolStr),
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// Captured object state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedObject {
    /// Class name.
    pub class: SmolStr,
    /// Host object handle, stable for the object's lifetime.
    pub handle: u64,
    /// Properties in declaration order.
    pub properties: Vec<(SmolStr, CapturedValue)>,
}

impl CapturedValue {
    /// Truthiness using the host language rules: `null`, `false`, `0`,
    /// `0.0`, `""`, `"0"` and empty arrays are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null | Self::Recursion => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::String(value) => !(value.is_empty() || value == "0"),
            Self::Array(entries) => !entries.is_empty(),
            Self::Object(_) => true,
        }
    }

    /// Name of the value's type, as reported by `gettype`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "double",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) | Self::Recursion => "object",
        }
    }

    /// Approximate heap footprint, used for memory budgeting.
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        VALUE_OVERHEAD
            + match self {
                Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Recursion => 0,
                Self::String(value) => value.len(),
                Self::Array(entries) => entries
                    .iter()
                    .map(|entry| {
                        let key = match &entry.key {
                            ArrayKey::Int(_) => VALUE_OVERHEAD,
                            ArrayKey::String(key) => VALUE_OVERHEAD + key.len(),
                        };
                        key + entry.value.estimated_size()
                    })
                    .sum(),
                Self::Object(object) => {
                    object.class.len()
                        + object
                            .properties
                            .iter()
                            .map(|(name, value)| name.len() + value.estimated_size())
                            .sum::<usize>()
                }
            }
    }
}

/// String conversion used for message rendering.
impl fmt::Display for CapturedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::Bool(false) => Ok(()),
            Self::Bool(true) => f.write_str("1"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&format_float(*value)),
            Self::String(value) => f.write_str(value),
            Self::Array(_) => f.write_str("Array"),
            Self::Object(object) => write!(f, "Object({})", object.class),
            Self::Recursion => f.write_str("*RECURSION*"),
        }
    }
}

/// Formats a float the way the host language prints it: integral values
/// lose the fraction, non-finite values use `INF`/`NAN`.
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let rounded = format!("{value:.14}");
    rounded.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!CapturedValue::Null.is_truthy());
        assert!(!CapturedValue::Int(0).is_truthy());
        assert!(CapturedValue::Int(-1).is_truthy());
        assert!(!CapturedValue::String("0".into()).is_truthy());
        assert!(CapturedValue::String("0.0".into()).is_truthy());
        assert!(!CapturedValue::String(String::new()).is_truthy());
        assert!(!CapturedValue::Array(Vec::new()).is_truthy());
        assert!(!CapturedValue::Float(0.0).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(CapturedValue::Int(5).to_string(), "5");
        assert_eq!(CapturedValue::Bool(true).to_string(), "1");
        assert_eq!(CapturedValue::Bool(false).to_string(), "");
        assert_eq!(CapturedValue::Null.to_string(), "");
        assert_eq!(CapturedValue::Float(2.0).to_string(), "2");
        assert_eq!(CapturedValue::Float(0.1 + 0.2).to_string(), "0.3");
        assert_eq!(CapturedValue::Float(1.5).to_string(), "1.5");
        assert_eq!(CapturedValue::String("abc".into()).to_string(), "abc");
    }

    #[test]
    fn test_estimated_size_grows_with_content() {
        let small = CapturedValue::String("a".into());
        let large = CapturedValue::String("a".repeat(100));
        assert!(large.estimated_size() > small.estimated_size());
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let value = CapturedValue::Array(vec![ArrayEntry {
            key: ArrayKey::String("k".into()),
            value: CapturedValue::Int(1),
        }]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            r#"{"type":"array","value":[{"key":"k","value":{"type":"int","value":1}}]}"#
        );
    }
}
