//! JSON encoding and decoding through `serde_json`.

#![allow(missing_docs)]

use pinpoint_debug::ArrayKey;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Number as JsonNumber, Value as Json};

use crate::error::RuntimeError;
use crate::stdlib::helpers::{int_or, require_min, str_arg};
use crate::stdlib::StandardLibrary;
use crate::value::{string_key, ArrayValue, Value};

pub const JSON_PRETTY_PRINT: i64 = 128;

const MAX_DEPTH: usize = 512;

pub fn register(lib: &mut StandardLibrary) {
    lib.register("json_encode", json_encode);
    lib.register("json_decode", json_decode);
}

fn to_json(value: &Value, depth: usize) -> Result<Json, RuntimeError> {
    if depth > MAX_DEPTH {
        return Err(RuntimeError::type_error("json_encode(): maximum depth exceeded"));
    }
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(value) => Json::Bool(*value),
        Value::Int(value) => Json::Number((*value).into()),
        Value::Float(value) => JsonNumber::from_f64(*value).map(Json::Number).ok_or_else(|| {
            RuntimeError::type_error("json_encode(): Inf and NaN cannot be JSON encoded")
        })?,
        Value::String(text) => Json::String(text.to_string()),
        Value::Array(array) if array.is_list() => Json::Array(
            array
                .values()
                .map(|value| to_json(value, depth + 1))
                .collect::<Result<_, _>>()?,
        ),
        Value::Array(array) => {
            let mut map = Map::new();
            for (key, value) in array.iter() {
                map.insert(key.to_string(), to_json(value, depth + 1)?);
            }
            Json::Object(map)
        }
        Value::Object(object) => {
            let mut map = Map::new();
            for (name, value) in &object.borrow().properties {
                map.insert(name.to_string(), to_json(value, depth + 1)?);
            }
            Json::Object(map)
        }
        Value::Closure(_) => Json::Object(Map::new()),
    })
}

fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(value) => Value::Bool(value),
        Json::Number(number) => match number.as_i64() {
            Some(value) => Value::Int(value),
            None => Value::Float(number.as_f64().unwrap_or(0.0)),
        },
        Json::String(text) => Value::from(text),
        Json::Array(items) => ArrayValue::from_list(items.into_iter().map(from_json)).into(),
        Json::Object(map) => map
            .into_iter()
            .map(|(key, value)| (string_key(&key), from_json(value)))
            .collect::<ArrayValue>()
            .into(),
    }
}

fn json_encode(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("json_encode", args, 1)?;
    let json = to_json(&args[0], 0)?;
    let encoded = if int_or(args, 1, 0) & JSON_PRETTY_PRINT != 0 {
        let mut out = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        json.serialize(&mut serializer)
            .map_err(|err| RuntimeError::type_error(format!("json_encode(): {err}")))?;
        String::from_utf8_lossy(&out).into_owned()
    } else {
        json.to_string()
    };
    Ok(Value::from(encoded))
}

/// Objects decode to associative arrays; there is no generic object class.
fn json_decode(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("json_decode", args, 0)?;
    Ok(serde_json::from_str::<Json>(&text).map_or(Value::Null, from_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_lists_and_maps() {
        let mut map = ArrayValue::new();
        map.insert(ArrayKey::String("b".into()), Value::Int(1));
        map.insert(ArrayKey::String("a".into()), ArrayValue::from_list([Value::Bool(true), Value::Null]).into());
        let encoded = json_encode(&[map.into()]).unwrap();
        assert_eq!(encoded, Value::from(r#"{"b":1,"a":[true,null]}"#));
    }

    #[test]
    fn test_pretty_print_uses_four_spaces() {
        let list = ArrayValue::from_list([Value::Int(1)]);
        let encoded = json_encode(&[list.into(), Value::Int(JSON_PRETTY_PRINT)]).unwrap();
        assert_eq!(encoded, Value::from("[\n    1\n]"));
    }

    #[test]
    fn test_decode_keeps_key_order() {
        let decoded = json_decode(&[Value::from(r#"{"z":1,"a":{"0":2.5}}"#)]).unwrap();
        let Value::Array(decoded) = decoded else {
            panic!("expected array");
        };
        let keys: Vec<_> = decoded.keys().cloned().collect();
        assert_eq!(keys, vec![ArrayKey::String("z".into()), ArrayKey::String("a".into())]);
        let Some(Value::Array(inner)) = decoded.get(&ArrayKey::String("a".into())) else {
            panic!("expected nested array");
        };
        assert_eq!(inner.get(&ArrayKey::Int(0)), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_invalid_json_decodes_to_null() {
        assert_eq!(json_decode(&[Value::from("{")]).unwrap(), Value::Null);
    }
}
