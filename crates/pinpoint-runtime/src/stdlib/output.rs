//! Text renderings used by `print_r` and `var_dump`.

#![allow(missing_docs)]

use std::fmt::Write;

use pinpoint_debug::value::format_float;
use pinpoint_debug::ArrayKey;

use crate::value::Value;

/// `print_r` rendering.
#[must_use]
pub fn print_r(value: &Value) -> String {
    let mut out = String::new();
    print_r_into(value, 0, &mut Vec::new(), &mut out);
    out
}

fn print_r_into(value: &Value, indent: usize, path: &mut Vec<u64>, out: &mut String) {
    let (header, entries): (String, Vec<(String, Value)>) = match value {
        Value::Array(array) => (
            "Array".to_string(),
            array
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        ),
        Value::Object(object) => {
            let object = object.borrow();
            if path.contains(&object.handle) {
                out.push_str(&format!("{} Object\n *RECURSION*", object.class_name()));
                return;
            }
            path.push(object.handle);
            let entries = object
                .properties
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect();
            (format!("{} Object", object.class_name()), entries)
        }
        Value::Closure(_) => ("Closure Object".to_string(), Vec::new()),
        scalar => {
            out.push_str(&scalar.to_str().unwrap_or_default());
            return;
        }
    };

    let pad = " ".repeat(indent);
    let _ = writeln!(out, "{header}\n{pad}(");
    for (key, entry) in &entries {
        let _ = write!(out, "{pad}    [{key}] => ");
        print_r_into(entry, indent + 8, path, out);
        out.push('\n');
    }
    let _ = writeln!(out, "{pad})");
    if let Value::Object(_) = value {
        path.pop();
    }
}

/// `var_dump` rendering.
#[must_use]
pub fn var_dump(value: &Value) -> String {
    let mut out = String::new();
    var_dump_into(value, 0, &mut Vec::new(), &mut out);
    out
}

fn var_dump_into(value: &Value, indent: usize, path: &mut Vec<u64>, out: &mut String) {
    let pad = " ".repeat(indent);
    match value {
        Value::Null => {
            let _ = writeln!(out, "{pad}NULL");
        }
        Value::Bool(value) => {
            let _ = writeln!(out, "{pad}bool({value})");
        }
        Value::Int(value) => {
            let _ = writeln!(out, "{pad}int({value})");
        }
        Value::Float(value) => {
            let _ = writeln!(out, "{pad}float({})", format_float(*value));
        }
        Value::String(text) => {
            let _ = writeln!(out, "{pad}string({}) \"{text}\"", text.len());
        }
        Value::Array(array) => {
            let _ = writeln!(out, "{pad}array({}) {{", array.len());
            for (key, entry) in array.iter() {
                match key {
                    ArrayKey::Int(index) => {
                        let _ = writeln!(out, "{pad}  [{index}]=>");
                    }
                    ArrayKey::String(name) => {
                        let _ = writeln!(out, "{pad}  [\"{name}\"]=>");
                    }
                }
                var_dump_into(entry, indent + 2, path, out);
            }
            let _ = writeln!(out, "{pad}}}");
        }
        Value::Object(object) => {
            let object = object.borrow();
            if path.contains(&object.handle) {
                let _ = writeln!(out, "{pad}*RECURSION*");
                return;
            }
            path.push(object.handle);
            let _ = writeln!(
                out,
                "{pad}object({})#{} ({}) {{",
                object.class_name(),
                object.handle,
                object.properties.len()
            );
            for (name, entry) in &object.properties {
                let _ = writeln!(out, "{pad}  [\"{name}\"]=>");
                var_dump_into(entry, indent + 2, path, out);
            }
            let _ = writeln!(out, "{pad}}}");
            path.pop();
        }
        Value::Closure(closure) => {
            let _ = writeln!(out, "{pad}object(Closure)#{} (0) {{\n{pad}}}", closure.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::value::ArrayValue;

    fn sample() -> Value {
        let mut array = ArrayValue::new();
        array.insert(ArrayKey::String("name".into()), Value::from("pin"));
        array.insert(
            ArrayKey::String("tags".into()),
            ArrayValue::from_list([Value::Int(1), Value::Float(2.5)]).into(),
        );
        array.into()
    }

    #[test]
    fn test_print_r_nested() {
        expect![[r#"
            Array
            (
                [name] => pin
                [tags] => Array
                    (
                        [0] => 1
                        [1] => 2.5
                    )

            )
        "#]]
        .assert_eq(&print_r(&sample()));
    }

    #[test]
    fn test_var_dump_nested() {
        expect![[r#"
            array(2) {
              ["name"]=>
              string(3) "pin"
              ["tags"]=>
              array(2) {
                [0]=>
                int(1)
                [1]=>
                float(2.5)
              }
            }
        "#]]
        .assert_eq(&var_dump(&sample()));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(print_r(&Value::Bool(true)), "1");
        assert_eq!(var_dump(&Value::Null), "NULL\n");
    }
}
