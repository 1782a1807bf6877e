//! Expression evaluation and assignment targets.

#![allow(missing_docs)]

use std::rc::Rc;

use pinpoint_debug::ArrayKey;
use pinpoint_syntax::{BinaryOp, IncDecOp, Literal, NodeId, NodeKind};
use smol_str::SmolStr;

use super::{intrinsics, ops, Binding, ClassDef, Interpreter, UserCode};
use crate::cache::Script;
use crate::error::RuntimeError;
use crate::value::{object::next_handle, ArrayValue, ClosureValue, Value};

/// Callback applied to an assignment slot.
pub type SlotFn<'f> = dyn FnMut(&mut Value) -> Result<Value, RuntimeError> + 'f;

impl Interpreter<'_> {
    pub(crate) fn eval(&mut self, script: &Script, node: NodeId) -> Result<Value, RuntimeError> {
        match script.tree.kind(node) {
            NodeKind::Literal(literal) => Ok(literal_value(literal)),
            NodeKind::Variable(name) => self.read_variable(name),
            NodeKind::Constant(name) => self.constant(name),
            NodeKind::Name(name) => Ok(Value::String(name.clone())),
            NodeKind::ArrayLiteral(elements) => {
                let mut array = ArrayValue::new();
                for &element in elements {
                    let NodeKind::ArrayElement { key, value } = script.tree.kind(element) else {
                        continue;
                    };
                    let key = match key {
                        Some(key) => Some(self.eval(script, *key)?.to_key()?),
                        None => None,
                    };
                    let value = self.eval(script, *value)?;
                    match key {
                        Some(key) => array.insert(key, value),
                        None => array.push(value),
                    }
                }
                Ok(array.into())
            }
            NodeKind::Index { base, index } => {
                let base = self.eval(script, *base)?;
                let Some(index) = index else {
                    return Err(RuntimeError::type_error("cannot use [] for reading"));
                };
                let key = self.eval(script, *index)?.to_key()?;
                read_index(&base, &key)
            }
            NodeKind::Property { object, name } => {
                let object = self.eval(script, *object)?;
                read_property(&object, name)
            }
            NodeKind::StaticProperty { class, name } => {
                let class = self.class_ref(script, *class)?;
                let owner = self.static_owner(&class, name)?;
                let value = owner.statics.borrow().get(name).cloned().unwrap_or_default();
                Ok(value)
            }
            NodeKind::ClassConstant { class, name } => {
                let class = self.class_ref(script, *class)?;
                self.class_constant(&class, name)
            }
            NodeKind::Call { callee, args } => self.eval_call(script, *callee, *args),
            NodeKind::StaticCall {
                class,
                method,
                args,
            } => self.eval_static_call(script, *class, method, *args),
            NodeKind::MethodCall {
                object,
                method,
                args,
            } => {
                let object = self.eval(script, *object)?;
                let args = self.eval_args(script, *args)?;
                self.call_method(&object, method, args)
            }
            NodeKind::New { class, args } => {
                let class = self.class_ref(script, *class)?;
                let args = self.eval_args(script, *args)?;
                self.instantiate(&class, args)
            }
            NodeKind::Unary { op, operand } => {
                let value = self.eval(script, *operand)?;
                ops::unary(*op, &value)
            }
            NodeKind::IncDec { op, target } => {
                let op = *op;
                let post = matches!(op, IncDecOp::PostInc | IncDecOp::PostDec);
                self.with_lvalue(script, *target, &mut |slot: &mut Value| {
                    let next = ops::step(op, slot)?;
                    let old = std::mem::replace(slot, next.clone());
                    Ok(if post { old } else { next })
                })
            }
            NodeKind::Cast { ty, operand } => {
                let value = self.eval(script, *operand)?;
                ops::cast(*ty, value)
            }
            NodeKind::Isset(operand) => {
                let value = self.read_quiet(script, *operand)?;
                Ok(Value::Bool(value.is_some_and(|value| !value.is_null())))
            }
            NodeKind::Empty(operand) => {
                let value = self.read_quiet(script, *operand)?;
                Ok(Value::Bool(!value.is_some_and(|value| value.to_bool())))
            }
            NodeKind::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    let result =
                        self.eval(script, *left)?.to_bool() && self.eval(script, *right)?.to_bool();
                    Ok(Value::Bool(result))
                }
                BinaryOp::Or => {
                    let result =
                        self.eval(script, *left)?.to_bool() || self.eval(script, *right)?.to_bool();
                    Ok(Value::Bool(result))
                }
                BinaryOp::Coalesce => match self.read_quiet(script, *left)? {
                    Some(value) if !value.is_null() => Ok(value),
                    _ => self.eval(script, *right),
                },
                op => {
                    let left = self.eval(script, *left)?;
                    let right = self.eval(script, *right)?;
                    ops::binary(*op, &left, &right)
                }
            },
            NodeKind::Instanceof { operand, class } => {
                let value = self.eval(script, *operand)?;
                let NodeKind::Name(name) = script.tree.kind(*class) else {
                    return Ok(Value::Bool(false));
                };
                let result = match (&value, self.resolve_class(name)) {
                    (Value::Object(object), Ok(class)) => self.is_instance_of(object, &class),
                    (Value::Closure(_), _) => name.eq_ignore_ascii_case("Closure"),
                    _ => false,
                };
                Ok(Value::Bool(result))
            }
            NodeKind::Ternary {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.eval(script, *condition)?;
                if condition.to_bool() {
                    match then {
                        Some(then) => self.eval(script, *then),
                        None => Ok(condition),
                    }
                } else {
                    self.eval(script, *otherwise)
                }
            }
            NodeKind::Assign { target, value } => {
                let value = self.eval(script, *value)?;
                self.assign(script, *target, value.clone())?;
                Ok(value)
            }
            NodeKind::CompoundAssign { op, target, value } => {
                if *op == BinaryOp::Coalesce {
                    if let Some(current) = self.read_quiet(script, *target)? {
                        if !current.is_null() {
                            return Ok(current);
                        }
                    }
                    let value = self.eval(script, *value)?;
                    self.assign(script, *target, value.clone())?;
                    return Ok(value);
                }
                let op = *op;
                let rhs = self.eval(script, *value)?;
                self.with_lvalue(script, *target, &mut |slot: &mut Value| {
                    let result = ops::binary(op, slot, &rhs)?;
                    *slot = result.clone();
                    Ok(result)
                })
            }
            NodeKind::Include { kind, path } => {
                let path = self.eval(script, *path)?.to_str()?;
                self.include(&path, kind.is_once(), kind.is_require())
            }
            NodeKind::Closure { uses, .. } => {
                let captured = script
                    .tree
                    .kind(*uses)
                    .list_children()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|id| match script.tree.kind(*id) {
                        NodeKind::Variable(name) => Some((
                            name.clone(),
                            self.current.locals.get(name).cloned().unwrap_or_default(),
                        )),
                        _ => None,
                    })
                    .collect();
                Ok(Value::Closure(Rc::new(ClosureValue {
                    handle: next_handle(),
                    script: script.clone(),
                    node,
                    captured,
                    this: self.current.this.clone(),
                    class: self.current.class.clone(),
                })))
            }
            other => Err(RuntimeError::type_error(format!(
                "{} is not an expression",
                other.name()
            ))),
        }
    }

    pub(crate) fn eval_args(&mut self, script: &Script, args: NodeId) -> Result<Vec<Value>, RuntimeError> {
        let items = script.tree.kind(args).list_children().unwrap_or_default();
        self.eval_nodes(script, items)
    }

    pub(crate) fn eval_nodes(&mut self, script: &Script, nodes: &[NodeId]) -> Result<Vec<Value>, RuntimeError> {
        nodes.iter().map(|node| self.eval(script, *node)).collect()
    }

    fn read_variable(&self, name: &str) -> Result<Value, RuntimeError> {
        if name == "this" {
            return self
                .current
                .this
                .clone()
                .map(Value::Object)
                .ok_or_else(|| RuntimeError::UndefinedVariable(SmolStr::new(name)));
        }
        self.current
            .locals
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(SmolStr::new(name)))
    }

    pub(crate) fn constant(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = builtin_constant(name) {
            return Ok(value);
        }
        self.user_constant(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedConstant(SmolStr::new(name)))
    }

    /// Reads a value without failing on missing variables, keys or
    /// properties. Used by `isset`, `empty` and `??`.
    pub(crate) fn read_quiet(&mut self, script: &Script, node: NodeId) -> Result<Option<Value>, RuntimeError> {
        match script.tree.kind(node) {
            NodeKind::Variable(name) => Ok(self.read_variable(name).ok()),
            NodeKind::Index {
                base,
                index: Some(index),
            } => {
                let Some(base) = self.read_quiet(script, *base)? else {
                    return Ok(None);
                };
                let key = self.eval(script, *index)?.to_key()?;
                Ok(read_index(&base, &key).ok())
            }
            NodeKind::Property { object, name } => {
                let Some(object) = self.read_quiet(script, *object)? else {
                    return Ok(None);
                };
                Ok(read_property(&object, name).ok())
            }
            NodeKind::StaticProperty { class, name } => {
                let NodeKind::Name(class) = script.tree.kind(*class) else {
                    return Ok(None);
                };
                let Ok(class) = self.resolve_class(class) else {
                    return Ok(None);
                };
                let Ok(owner) = self.static_owner(&class, name) else {
                    return Ok(None);
                };
                let value = owner.statics.borrow().get(name).cloned();
                Ok(value)
            }
            _ => self.eval(script, node).map(Some),
        }
    }

    pub(crate) fn assign(&mut self, script: &Script, target: NodeId, value: Value) -> Result<(), RuntimeError> {
        let mut value = Some(value);
        self.with_lvalue(script, target, &mut |slot: &mut Value| {
            *slot = value.take().unwrap_or_default();
            Ok(Value::Null)
        })?;
        Ok(())
    }

    /// Finds (creating if needed) the storage `node` names and applies `f`
    /// to it. Index expressions are evaluated before the slot is borrowed,
    /// so `f` runs with no evaluation in flight.
    pub(crate) fn with_lvalue(
        &mut self,
        script: &Script,
        node: NodeId,
        f: &mut SlotFn<'_>,
    ) -> Result<Value, RuntimeError> {
        match script.tree.kind(node) {
            NodeKind::Variable(name) => {
                if name == "this" {
                    return Err(RuntimeError::type_error("cannot re-assign $this"));
                }
                let slot = self.current.locals.entry(name.clone()).or_default();
                f(slot)
            }
            NodeKind::Index { base, index } => {
                let key = match index {
                    Some(index) => Some(self.eval(script, *index)?.to_key()?),
                    None => None,
                };
                self.with_lvalue(script, *base, &mut |slot: &mut Value| {
                    if slot.is_null() {
                        *slot = Value::empty_array();
                    }
                    match slot {
                        Value::Array(array) => f(Rc::make_mut(array).slot(key.clone())),
                        other => Err(RuntimeError::type_error(format!(
                            "cannot use a value of type {} as an array",
                            other.type_name()
                        ))),
                    }
                })
            }
            NodeKind::Property { object, name } => {
                let object = match self.eval(script, *object)? {
                    Value::Object(object) => object,
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "attempt to assign property \"{name}\" on {}",
                            other.type_name()
                        )))
                    }
                };
                let mut object = object.borrow_mut();
                let slot = object.properties.entry(name.clone()).or_default();
                f(slot)
            }
            NodeKind::StaticProperty { class, name } => {
                let class = self.class_ref(script, *class)?;
                let owner = self.static_owner(&class, name)?;
                let mut statics = owner.statics.borrow_mut();
                let slot = statics.entry(name.clone()).or_default();
                f(slot)
            }
            other => Err(RuntimeError::type_error(format!(
                "cannot assign to {}",
                other.name()
            ))),
        }
    }

    /// Class named by a `Name` node.
    pub(crate) fn class_ref(&self, script: &Script, node: NodeId) -> Result<Rc<ClassDef>, RuntimeError> {
        match script.tree.kind(node) {
            NodeKind::Name(name) => self.resolve_class(name),
            other => Err(RuntimeError::type_error(format!(
                "expected a class name, found {}",
                other.name()
            ))),
        }
    }

    /// The class in `class`'s lineage that declares static `name`.
    fn static_owner(&self, class: &Rc<ClassDef>, name: &SmolStr) -> Result<Rc<ClassDef>, RuntimeError> {
        self.lineage(class)
            .into_iter()
            .find(|owner| owner.statics.borrow().contains_key(name))
            .ok_or_else(|| RuntimeError::UndefinedProperty {
                class: class.name.clone(),
                name: name.clone(),
            })
    }

    pub(crate) fn class_constant(&mut self, class: &Rc<ClassDef>, name: &str) -> Result<Value, RuntimeError> {
        for owner in self.lineage(class) {
            if let Some(node) = owner.constants.get(name) {
                return self.eval(&owner.script, *node);
            }
        }
        Err(RuntimeError::UndefinedConstant(SmolStr::new(format!(
            "{}::{name}",
            class.name
        ))))
    }

    fn eval_call(&mut self, script: &Script, callee: NodeId, args: NodeId) -> Result<Value, RuntimeError> {
        if let NodeKind::Name(name) = script.tree.kind(callee) {
            if let Some(intrinsic) = intrinsics::lookup(name) {
                let nodes = script.tree.kind(args).list_children().unwrap_or_default();
                return intrinsic(self, script, nodes);
            }
            let args = self.eval_args(script, args)?;
            return self.call_function(name, args);
        }
        let callee = self.eval(script, callee)?;
        let args = self.eval_args(script, args)?;
        self.call_value(&callee, args)
    }

    fn eval_static_call(
        &mut self,
        script: &Script,
        class: NodeId,
        method: &str,
        args: NodeId,
    ) -> Result<Value, RuntimeError> {
        let forwarding = matches!(
            script.tree.kind(class),
            NodeKind::Name(name) if ["self", "parent", "static"].iter().any(|kw| name.eq_ignore_ascii_case(kw))
        );
        let class = self.class_ref(script, class)?;
        let args = self.eval_args(script, args)?;
        let Some((owner, method_def)) = self.find_method(&class, method) else {
            return Err(RuntimeError::UndefinedMethod {
                class: class.name.clone(),
                name: SmolStr::new(method),
            });
        };

        let this = if method_def.is_static {
            None
        } else {
            match self.current.this.clone() {
                Some(this) if self.is_instance_of(&this, &owner) => Some(this),
                _ => {
                    return Err(RuntimeError::type_error(format!(
                        "non-static method {}::{}() cannot be called statically",
                        owner.name, method_def.name
                    )))
                }
            }
        };
        let static_class = if forwarding {
            self.current.static_class.clone().or(Some(class))
        } else {
            Some(class)
        };
        let owner_script = owner.script.clone();
        let code = UserCode {
            name: SmolStr::new(format!("{}::{}", owner.name, method_def.name)),
            script: &owner_script,
            params: method_def.params,
            body: method_def.body,
        };
        let binding = Binding {
            this,
            class: Some(owner),
            static_class,
            captured: Vec::new(),
        };
        self.call_user(&code, args, binding)
    }

    pub(crate) fn call_method(
        &mut self,
        object: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let object = match object {
            Value::Object(object) => Rc::clone(object),
            Value::Closure(_) if method.eq_ignore_ascii_case("__invoke") => {
                return self.call_value(object, args);
            }
            other => {
                return Err(RuntimeError::type_error(format!(
                    "call to a member function {method}() on {}",
                    other.type_name()
                )))
            }
        };
        let class = Rc::clone(&object.borrow().class);
        let Some((owner, method_def)) = self.find_method(&class, method) else {
            return Err(RuntimeError::UndefinedMethod {
                class: class.name.clone(),
                name: SmolStr::new(method),
            });
        };
        let owner_script = owner.script.clone();
        let code = UserCode {
            name: SmolStr::new(format!("{}::{}", owner.name, method_def.name)),
            script: &owner_script,
            params: method_def.params,
            body: method_def.body,
        };
        let binding = Binding {
            this: (!method_def.is_static).then_some(object),
            class: Some(owner),
            static_class: Some(class),
            captured: Vec::new(),
        };
        self.call_user(&code, args, binding)
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(value) => Value::Bool(*value),
        Literal::Int(value) => Value::Int(*value),
        Literal::Float(value) => Value::Float(*value),
        Literal::String(text) => Value::String(text.clone()),
    }
}

fn builtin_constant(name: &str) -> Option<Value> {
    Some(match name {
        "PHP_EOL" => Value::from("\n"),
        "PHP_INT_MAX" => Value::Int(i64::MAX),
        "PHP_INT_MIN" => Value::Int(i64::MIN),
        "PHP_INT_SIZE" => Value::Int(8),
        "PHP_FLOAT_EPSILON" => Value::Float(f64::EPSILON),
        "PHP_FLOAT_MAX" => Value::Float(f64::MAX),
        "NAN" => Value::Float(f64::NAN),
        "INF" => Value::Float(f64::INFINITY),
        "M_PI" => Value::Float(std::f64::consts::PI),
        "M_E" => Value::Float(std::f64::consts::E),
        "JSON_PRETTY_PRINT" => Value::Int(crate::stdlib::json::JSON_PRETTY_PRINT),
        "SORT_REGULAR" => Value::Int(0),
        "STR_PAD_LEFT" => Value::Int(crate::stdlib::string::STR_PAD_LEFT),
        "STR_PAD_RIGHT" => Value::Int(crate::stdlib::string::STR_PAD_RIGHT),
        "STR_PAD_BOTH" => Value::Int(crate::stdlib::string::STR_PAD_BOTH),
        "ARRAY_FILTER_USE_KEY" => Value::Int(super::intrinsics::ARRAY_FILTER_USE_KEY),
        "ARRAY_FILTER_USE_BOTH" => Value::Int(super::intrinsics::ARRAY_FILTER_USE_BOTH),
        _ => return None,
    })
}

/// `base[key]` as an rvalue.
pub(crate) fn read_index(base: &Value, key: &ArrayKey) -> Result<Value, RuntimeError> {
    match base {
        Value::Array(array) => array
            .get(key)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedIndex(SmolStr::new(key.to_string()))),
        Value::String(text) => {
            let offset = match key {
                ArrayKey::Int(offset) => *offset,
                ArrayKey::String(_) => {
                    return Err(RuntimeError::type_error("cannot access string offset of type string"))
                }
            };
            let len = i64::try_from(text.len()).unwrap_or(i64::MAX);
            let position = if offset < 0 { len + offset } else { offset };
            usize::try_from(position)
                .ok()
                .and_then(|position| text.get(position..=position))
                .map(Value::from)
                .ok_or_else(|| RuntimeError::UndefinedIndex(SmolStr::new(offset.to_string())))
        }
        Value::Null => Ok(Value::Null),
        other => Err(RuntimeError::type_error(format!(
            "cannot use a value of type {} as an array",
            other.type_name()
        ))),
    }
}

fn read_property(object: &Value, name: &SmolStr) -> Result<Value, RuntimeError> {
    match object {
        Value::Object(object) => {
            let object = object.borrow();
            object
                .properties
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedProperty {
                    class: object.class_name().clone(),
                    name: name.clone(),
                })
        }
        other => Err(RuntimeError::type_error(format!(
            "attempt to read property \"{name}\" on {}",
            other.type_name()
        ))),
    }
}
