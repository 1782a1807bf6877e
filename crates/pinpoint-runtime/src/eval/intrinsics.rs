//! Functions that need the interpreter itself: by-reference arguments,
//! callbacks, program output and request state.
//!
//! Intrinsics receive their argument nodes unevaluated and shadow library
//! and user functions of the same name.

#![allow(missing_docs)]

use std::rc::Rc;

use pinpoint_debug::ArrayKey;
use pinpoint_syntax::{NodeId, NodeKind};
use smol_str::SmolStr;

use super::{lowercase, Binding, Interpreter, UserCode};
use crate::cache::Script;
use crate::error::RuntimeError;
use crate::stdlib::{output, string};
use crate::value::array::merge_sort_by;
use crate::value::{ArrayValue, Value};

/// Intrinsic signature.
pub type Intrinsic = fn(&mut Interpreter<'_>, &Script, &[NodeId]) -> Result<Value, RuntimeError>;

pub const ARRAY_FILTER_USE_BOTH: i64 = 1;
pub const ARRAY_FILTER_USE_KEY: i64 = 2;

#[must_use]
pub fn lookup(name: &str) -> Option<Intrinsic> {
    let intrinsic: Intrinsic = match lowercase(name).as_str() {
        "array_push" => array_push,
        "array_pop" => array_pop,
        "array_shift" => array_shift,
        "array_unshift" => array_unshift,
        "sort" => sort,
        "rsort" => rsort,
        "ksort" => ksort,
        "krsort" => krsort,
        "usort" => usort,
        "uasort" => uasort,
        "unset" => unset,
        "define" => define,
        "defined" => defined,
        "constant" => constant,
        "function_exists" => function_exists,
        "class_exists" => class_exists,
        "method_exists" => method_exists,
        "property_exists" => property_exists,
        "get_called_class" => get_called_class,
        "is_callable" => is_callable,
        "call_user_func" => call_user_func,
        "call_user_func_array" => call_user_func_array,
        "array_map" => array_map,
        "array_filter" => array_filter,
        "array_reduce" => array_reduce,
        "print_r" => print_r,
        "var_dump" => var_dump,
        "printf" => printf,
        _ => return None,
    };
    Some(intrinsic)
}

fn require(name: &str, args: &[NodeId], min: usize) -> Result<(), RuntimeError> {
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

fn count_value(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

/// Applies `f` to the array stored in the variable (or element) `target`.
fn with_array(
    interp: &mut Interpreter<'_>,
    script: &Script,
    target: NodeId,
    name: &str,
    f: &mut dyn FnMut(&mut ArrayValue) -> Value,
) -> Result<Value, RuntimeError> {
    interp.with_lvalue(script, target, &mut |slot: &mut Value| match slot {
        Value::Array(array) => Ok(f(Rc::make_mut(array))),
        other => Err(RuntimeError::type_error(format!(
            "{name}(): Argument #1 ($array) must be of type array, {} given",
            other.type_name()
        ))),
    })
}

fn array_push(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("array_push", args, 1)?;
    let mut values = interp.eval_nodes(script, &args[1..])?;
    with_array(interp, script, args[0], "array_push", &mut |array: &mut ArrayValue| {
        for value in values.drain(..) {
            array.push(value);
        }
        count_value(array.len())
    })
}

fn array_pop(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("array_pop", args, 1)?;
    with_array(interp, script, args[0], "array_pop", &mut |array: &mut ArrayValue| {
        array.pop().unwrap_or_default()
    })
}

fn array_shift(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("array_shift", args, 1)?;
    with_array(interp, script, args[0], "array_shift", &mut |array: &mut ArrayValue| {
        array.shift().unwrap_or_default()
    })
}

fn array_unshift(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("array_unshift", args, 1)?;
    let mut values = Some(interp.eval_nodes(script, &args[1..])?);
    with_array(interp, script, args[0], "array_unshift", &mut |array: &mut ArrayValue| {
        array.unshift(values.take().unwrap_or_default());
        count_value(array.len())
    })
}

fn sort(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("sort", args, 1)?;
    with_array(interp, script, args[0], "sort", &mut |array: &mut ArrayValue| {
        array.sort_values(false);
        Value::Bool(true)
    })
}

fn rsort(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("rsort", args, 1)?;
    with_array(interp, script, args[0], "rsort", &mut |array: &mut ArrayValue| {
        array.sort_values(true);
        Value::Bool(true)
    })
}

fn ksort(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("ksort", args, 1)?;
    with_array(interp, script, args[0], "ksort", &mut |array: &mut ArrayValue| {
        array.sort_keys(false);
        Value::Bool(true)
    })
}

fn krsort(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("krsort", args, 1)?;
    with_array(interp, script, args[0], "krsort", &mut |array: &mut ArrayValue| {
        array.sort_keys(true);
        Value::Bool(true)
    })
}

/// Sorts entries with a user comparator. The comparator runs while the array
/// is detached from its variable, so it may read but not modify it.
fn user_sort(
    interp: &mut Interpreter<'_>,
    script: &Script,
    args: &[NodeId],
    name: &str,
    keep_keys: bool,
) -> Result<Value, RuntimeError> {
    require(name, args, 2)?;
    let callback = interp.eval(script, args[1])?;
    let Value::Array(array) = interp.eval(script, args[0])? else {
        return Err(RuntimeError::type_error(format!(
            "{name}(): Argument #1 ($array) must be of type array"
        )));
    };
    let entries: Vec<(ArrayKey, Value)> = array
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let sorted = merge_sort_by(entries, &mut |(_, a): &(ArrayKey, Value), (_, b): &(ArrayKey, Value)| {
        let result = call_callable(interp, &callback, vec![a.clone(), b.clone()])?;
        Ok::<_, RuntimeError>(result.to_int().cmp(&0))
    })?;
    let sorted: ArrayValue = if keep_keys {
        sorted.into_iter().collect()
    } else {
        ArrayValue::from_list(sorted.into_iter().map(|(_, value)| value))
    };
    interp.assign(script, args[0], sorted.into())?;
    Ok(Value::Bool(true))
}

fn usort(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    user_sort(interp, script, args, "usort", false)
}

fn uasort(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    user_sort(interp, script, args, "uasort", true)
}

fn unset(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    for &arg in args {
        match script.tree.kind(arg) {
            NodeKind::Variable(name) => {
                interp.current.locals.shift_remove(name);
            }
            NodeKind::Index {
                base,
                index: Some(index),
            } => {
                if !matches!(interp.read_quiet(script, *base)?, Some(Value::Array(_))) {
                    continue;
                }
                let key = interp.eval(script, *index)?.to_key()?;
                interp.with_lvalue(script, *base, &mut |slot: &mut Value| {
                    if let Value::Array(array) = slot {
                        Rc::make_mut(array).remove(&key);
                    }
                    Ok(Value::Null)
                })?;
            }
            NodeKind::Property { object, name } => {
                if let Value::Object(object) = interp.eval(script, *object)? {
                    object.borrow_mut().properties.shift_remove(name);
                }
            }
            other => {
                return Err(RuntimeError::type_error(format!(
                    "cannot unset {}",
                    other.name()
                )))
            }
        }
    }
    Ok(Value::Null)
}

fn define(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("define", args, 2)?;
    let name = interp.eval(script, args[0])?.to_str()?;
    let value = interp.eval(script, args[1])?;
    let defined = interp.define(&name, value);
    if !defined {
        tracing::warn!("constant {name} already defined");
    }
    Ok(Value::Bool(defined))
}

fn defined(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("defined", args, 1)?;
    let name = interp.eval(script, args[0])?.to_str()?;
    Ok(Value::Bool(interp.constant(&name).is_ok()))
}

fn constant(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("constant", args, 1)?;
    let name = interp.eval(script, args[0])?.to_str()?;
    match name.split_once("::") {
        Some((class, constant)) => {
            let class = interp.resolve_class(class)?;
            interp.class_constant(&class, constant)
        }
        None => interp.constant(&name),
    }
}

fn function_exists(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("function_exists", args, 1)?;
    let name = interp.eval(script, args[0])?.to_str()?;
    let exists = interp.function(&name).is_some() || interp.stdlib().contains(&name) || lookup(&name).is_some();
    Ok(Value::Bool(exists))
}

fn class_exists(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("class_exists", args, 1)?;
    let name = interp.eval(script, args[0])?.to_str()?;
    Ok(Value::Bool(interp.has_class(&name)))
}

/// The class an object or class-name argument refers to.
fn class_of(interp: &Interpreter<'_>, value: &Value) -> Option<Rc<super::ClassDef>> {
    match value {
        Value::Object(object) => Some(Rc::clone(&object.borrow().class)),
        Value::String(name) => interp.resolve_class(name).ok(),
        _ => None,
    }
}

fn method_exists(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("method_exists", args, 2)?;
    let target = interp.eval(script, args[0])?;
    let method = interp.eval(script, args[1])?.to_str()?;
    let exists = class_of(interp, &target).is_some_and(|class| interp.find_method(&class, &method).is_some());
    Ok(Value::Bool(exists))
}

fn property_exists(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("property_exists", args, 2)?;
    let target = interp.eval(script, args[0])?;
    let property = interp.eval(script, args[1])?.to_str()?;
    if let Value::Object(object) = &target {
        if object.borrow().properties.contains_key(&property) {
            return Ok(Value::Bool(true));
        }
    }
    let declared = class_of(interp, &target).is_some_and(|class| {
        interp.lineage(&class).iter().any(|owner| {
            owner.properties.iter().any(|(name, _)| *name == property)
                || owner.statics.borrow().contains_key(&property)
        })
    });
    Ok(Value::Bool(declared))
}

fn get_called_class(interp: &mut Interpreter<'_>, _script: &Script, _args: &[NodeId]) -> Result<Value, RuntimeError> {
    Ok(interp
        .current
        .static_class
        .as_ref()
        .map_or(Value::Bool(false), |class| Value::String(class.name.clone())))
}

/// Splits `"Class::method"` and `[target, "method"]` callables.
fn method_callable(callee: &Value) -> Result<Option<(Value, SmolStr)>, RuntimeError> {
    match callee {
        Value::String(text) => Ok(text
            .split_once("::")
            .map(|(class, method)| (Value::from(class), SmolStr::new(method)))),
        Value::Array(pair) if pair.len() == 2 => {
            let target = pair.get(&ArrayKey::Int(0)).cloned();
            let method = pair.get(&ArrayKey::Int(1)).cloned();
            match (target, method) {
                (Some(target), Some(method)) => Ok(Some((target, method.to_str()?))),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

/// Calls any callable value: closures, function names, `"Class::method"`,
/// `[$object, "method"]` and `["Class", "method"]`.
pub(crate) fn call_callable(
    interp: &mut Interpreter<'_>,
    callee: &Value,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let Some((target, method)) = method_callable(callee)? else {
        return interp.call_value(callee, args);
    };
    if let Value::Object(_) = target {
        return interp.call_method(&target, &method, args);
    }
    let class_name = target.to_str()?;
    let class = interp.resolve_class(&class_name)?;
    let Some((owner, method_def)) = interp.find_method(&class, &method) else {
        return Err(RuntimeError::UndefinedMethod {
            class: class.name.clone(),
            name: method,
        });
    };
    if !method_def.is_static {
        return Err(RuntimeError::type_error(format!(
            "non-static method {}::{}() cannot be called statically",
            owner.name, method_def.name
        )));
    }
    let owner_script = owner.script.clone();
    let code = UserCode {
        name: SmolStr::new(format!("{}::{}", owner.name, method_def.name)),
        script: &owner_script,
        params: method_def.params,
        body: method_def.body,
    };
    let binding = Binding {
        this: None,
        class: Some(owner),
        static_class: Some(class),
        captured: Vec::new(),
    };
    interp.call_user(&code, args, binding)
}

fn is_callable(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("is_callable", args, 1)?;
    let value = interp.eval(script, args[0])?;
    let callable = match (&value, method_callable(&value)?) {
        (Value::Closure(_), _) => true,
        (_, Some((target, method))) => {
            class_of(interp, &target).is_some_and(|class| interp.find_method(&class, &method).is_some())
        }
        (Value::String(name), None) => {
            interp.function(name).is_some() || interp.stdlib().contains(name) || lookup(name).is_some()
        }
        _ => false,
    };
    Ok(Value::Bool(callable))
}

fn call_user_func(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("call_user_func", args, 1)?;
    let callee = interp.eval(script, args[0])?;
    let rest = interp.eval_nodes(script, &args[1..])?;
    call_callable(interp, &callee, rest)
}

fn call_user_func_array(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("call_user_func_array", args, 2)?;
    let callee = interp.eval(script, args[0])?;
    let Value::Array(list) = interp.eval(script, args[1])? else {
        return Err(RuntimeError::type_error(
            "call_user_func_array(): Argument #2 ($args) must be of type array",
        ));
    };
    call_callable(interp, &callee, list.values().cloned().collect())
}

fn array_argument(
    interp: &mut Interpreter<'_>,
    script: &Script,
    node: NodeId,
    name: &str,
    position: usize,
) -> Result<Rc<ArrayValue>, RuntimeError> {
    match interp.eval(script, node)? {
        Value::Array(array) => Ok(array),
        other => Err(RuntimeError::type_error(format!(
            "{name}(): Argument #{position} ($array) must be of type array, {} given",
            other.type_name()
        ))),
    }
}

fn array_map(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("array_map", args, 2)?;
    let callback = interp.eval(script, args[0])?;
    let mut arrays = Vec::with_capacity(args.len() - 1);
    for (offset, &node) in args[1..].iter().enumerate() {
        arrays.push(array_argument(interp, script, node, "array_map", offset + 2)?);
    }

    if let [array] = arrays.as_slice() {
        let mut result = ArrayValue::new();
        for (key, value) in array.iter() {
            let mapped = if callback.is_null() {
                value.clone()
            } else {
                call_callable(interp, &callback, vec![value.clone()])?
            };
            result.insert(key.clone(), mapped);
        }
        return Ok(result.into());
    }

    let columns: Vec<Vec<Value>> = arrays
        .iter()
        .map(|array| array.values().cloned().collect())
        .collect();
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    let mut result = ArrayValue::new();
    for row in 0..rows {
        let items: Vec<Value> = columns
            .iter()
            .map(|column| column.get(row).cloned().unwrap_or_default())
            .collect();
        let mapped = if callback.is_null() {
            ArrayValue::from_list(items).into()
        } else {
            call_callable(interp, &callback, items)?
        };
        result.push(mapped);
    }
    Ok(result.into())
}

fn array_filter(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("array_filter", args, 1)?;
    let array = array_argument(interp, script, args[0], "array_filter", 1)?;
    let callback = match args.get(1) {
        Some(node) => interp.eval(script, *node)?,
        None => Value::Null,
    };
    let mode = match args.get(2) {
        Some(node) => interp.eval(script, *node)?.to_int(),
        None => 0,
    };

    let mut result = ArrayValue::new();
    for (key, value) in array.iter() {
        let keep = if callback.is_null() {
            value.to_bool()
        } else {
            let call_args = match mode {
                ARRAY_FILTER_USE_KEY => vec![Value::from(key.clone())],
                ARRAY_FILTER_USE_BOTH => vec![value.clone(), Value::from(key.clone())],
                _ => vec![value.clone()],
            };
            call_callable(interp, &callback, call_args)?.to_bool()
        };
        if keep {
            result.insert(key.clone(), value.clone());
        }
    }
    Ok(result.into())
}

fn array_reduce(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("array_reduce", args, 2)?;
    let array = array_argument(interp, script, args[0], "array_reduce", 1)?;
    let callback = interp.eval(script, args[1])?;
    let mut carry = match args.get(2) {
        Some(node) => interp.eval(script, *node)?,
        None => Value::Null,
    };
    for value in array.values() {
        carry = call_callable(interp, &callback, vec![carry, value.clone()])?;
    }
    Ok(carry)
}

fn print_r(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("print_r", args, 1)?;
    let values = interp.eval_nodes(script, args)?;
    let text = output::print_r(&values[0]);
    if values.get(1).is_some_and(Value::to_bool) {
        return Ok(Value::from(text));
    }
    interp.write(&text);
    Ok(Value::Bool(true))
}

fn var_dump(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    require("var_dump", args, 1)?;
    for value in interp.eval_nodes(script, args)? {
        let text = output::var_dump(&value);
        interp.write(&text);
    }
    Ok(Value::Null)
}

fn printf(interp: &mut Interpreter<'_>, script: &Script, args: &[NodeId]) -> Result<Value, RuntimeError> {
    let values = interp.eval_nodes(script, args)?;
    let text = string::format("printf", &values)?;
    interp.write(&text);
    Ok(count_value(text.len()))
}

#[cfg(test)]
mod tests {
    use crate::cache::CodeCache;
    use crate::eval::Interpreter;
    use crate::loader::MemoryLoader;
    use crate::stdlib::StandardLibrary;

    fn run(source: &str) -> String {
        let loader = MemoryLoader::new().with_file("/t.php", source);
        let cache = CodeCache::new();
        let stdlib = StandardLibrary::new();
        let mut interpreter = Interpreter::new(&cache, &loader, &stdlib, None);
        interpreter.run("/t.php").unwrap();
        interpreter.take_output()
    }

    #[test]
    fn test_by_reference_array_functions() {
        let source = "<?php\n$a = [3, 1];\narray_push($a, 2);\nsort($a);\necho implode(',', $a);\necho '|' . array_pop($a) . '|' . count($a);\n";
        assert_eq!(run(source), "1,2,3|3|2");
    }

    #[test]
    fn test_push_onto_nested_element() {
        let source = "<?php\n$m = ['k' => []];\narray_push($m['k'], 'x');\necho count($m['k']);\n";
        assert_eq!(run(source), "1");
    }

    #[test]
    fn test_callbacks() {
        let source = r#"<?php
$double = function ($n) { return $n * 2; };
echo implode(',', array_map($double, [1, 2, 3]));
echo '|', implode(',', array_filter([1, 0, 2, null]));
echo '|', array_reduce([1, 2, 3], function ($c, $n) { return $c + $n; }, 10);
$list = [3, 1, 2];
usort($list, function ($a, $b) { return $b - $a; });
echo '|', implode(',', $list);
"#;
        assert_eq!(run(source), "2,4,6|1,2|16|3,2,1");
    }

    #[test]
    fn test_static_method_callables() {
        let source = r#"<?php
class Math { public static function twice($n) { return $n * 2; } }
echo call_user_func('Math::twice', 4), call_user_func(['Math', 'twice'], 5);
echo is_callable('strlen') ? 'y' : 'n', is_callable('nope') ? 'y' : 'n';
"#;
        assert_eq!(run(source), "810yn");
    }

    #[test]
    fn test_unset_and_constants() {
        let source = r#"<?php
$a = ['x' => 1, 'y' => 2];
unset($a['x'], $missing['k']);
echo implode(',', array_keys($a));
define('LIMIT', 5);
echo defined('LIMIT') ? LIMIT : 'none';
echo define('LIMIT', 6) ? 'redefined' : 'kept';
"#;
        assert_eq!(run(source), "y5kept");
    }

    #[test]
    fn test_printf_writes_output() {
        assert_eq!(run("<?php printf('%03d-%s', 7, 'x');"), "007-x");
    }
}
