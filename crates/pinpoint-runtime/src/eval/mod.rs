//! Tree-walking evaluator.
//!
//! An [`Interpreter`] executes one request: it owns the request's globals,
//! functions, classes and output buffer, and borrows the shared code cache
//! and the request's [`DebugRequest`]. Probe nodes spliced into cached trees
//! are dispatched to the debugger as they are reached.

#![allow(missing_docs)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use pinpoint_debug::{normalize_path, DebugRequest};
use pinpoint_syntax::{NodeId, NodeKind, ProbeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::trace;

use crate::cache::{CodeCache, Script};
use crate::error::RuntimeError;
use crate::loader::SourceLoader;
use crate::scope::ProbeScope;
use crate::stdlib::StandardLibrary;
use crate::value::{Object, ObjectRef, Value};

pub mod expr;
pub mod intrinsics;
pub mod ops;
pub mod stmt;

pub use stmt::StmtResult;

/// Nested user calls deeper than this fail with [`RuntimeError::CallDepth`].
pub const MAX_CALL_DEPTH: usize = 256;

const MAX_CLASS_CHAIN: usize = 64;

/// One activation record.
#[derive(Debug, Clone)]
pub struct Frame {
    /// `None` for top-level code.
    pub function: Option<SmolStr>,
    pub filename: SmolStr,
    pub line: u32,
    pub locals: IndexMap<SmolStr, Value>,
    pub this: Option<ObjectRef>,
    pub class: Option<Rc<ClassDef>>,
    pub static_class: Option<Rc<ClassDef>>,
}

impl Frame {
    fn top_level(filename: SmolStr) -> Self {
        Self {
            function: None,
            filename,
            line: 1,
            locals: IndexMap::new(),
            this: None,
            class: None,
            static_class: None,
        }
    }
}

/// A declared function.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: SmolStr,
    pub script: Script,
    pub params: NodeId,
    pub body: NodeId,
}

/// A declared method.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: SmolStr,
    pub is_static: bool,
    pub params: NodeId,
    pub body: NodeId,
}

/// A declared class.
#[derive(Debug)]
pub struct ClassDef {
    pub name: SmolStr,
    pub parent: Option<SmolStr>,
    pub script: Script,
    pub constants: IndexMap<SmolStr, NodeId>,
    pub properties: Vec<(SmolStr, Option<NodeId>)>,
    pub statics: RefCell<IndexMap<SmolStr, Value>>,
    /// Keyed by lowercase name.
    pub methods: IndexMap<SmolStr, MethodDef>,
}

/// What a user-code call runs.
pub(crate) struct UserCode<'a> {
    pub name: SmolStr,
    pub script: &'a Script,
    pub params: NodeId,
    pub body: NodeId,
}

/// Receiver and captured state for a user-code call.
#[derive(Default)]
pub(crate) struct Binding {
    pub this: Option<ObjectRef>,
    pub class: Option<Rc<ClassDef>>,
    pub static_class: Option<Rc<ClassDef>>,
    pub captured: Vec<(SmolStr, Value)>,
}

/// Executes code for one request.
pub struct Interpreter<'r> {
    cache: &'r CodeCache,
    loader: &'r dyn SourceLoader,
    stdlib: &'r StandardLibrary,
    debug: Option<&'r mut DebugRequest>,
    functions: FxHashMap<SmolStr, Rc<FunctionDef>>,
    classes: FxHashMap<SmolStr, Rc<ClassDef>>,
    constants: FxHashMap<SmolStr, Value>,
    included: FxHashSet<SmolStr>,
    current: Frame,
    callers: Vec<Frame>,
    output: String,
}

impl<'r> Interpreter<'r> {
    pub fn new(
        cache: &'r CodeCache,
        loader: &'r dyn SourceLoader,
        stdlib: &'r StandardLibrary,
        debug: Option<&'r mut DebugRequest>,
    ) -> Self {
        Self {
            cache,
            loader,
            stdlib,
            debug,
            functions: FxHashMap::default(),
            classes: FxHashMap::default(),
            constants: FxHashMap::default(),
            included: FxHashSet::default(),
            current: Frame::top_level(SmolStr::default()),
            callers: Vec::new(),
            output: String::new(),
        }
    }

    /// Compiles and runs `filename` as the entry script. Returns the value
    /// of a top-level `return`, or `1`.
    pub fn run(&mut self, filename: &str) -> Result<Value, RuntimeError> {
        let filename = SmolStr::new(normalize_path(Path::new(filename)).to_string_lossy());
        let script = self.compile(&filename)?;
        self.included.insert(filename);
        self.run_script(&script)
    }

    /// Evaluates a standalone expression in the innermost frame.
    pub fn evaluate_snippet(&mut self, source: &str) -> Result<Value, RuntimeError> {
        let parse = pinpoint_syntax::parse(&format!("{source};"));
        if let Some(err) = parse.errors().first() {
            return Err(RuntimeError::Compile {
                filename: SmolStr::new_inline("<expression>"),
                message: err.to_string().into(),
            });
        }
        let tree = parse.into_tree();
        let statement = tree
            .kind(tree.root())
            .list_children()
            .and_then(|items| items.first().copied());
        let Some(statement) = statement else {
            return Ok(Value::Null);
        };
        let script = Script {
            filename: SmolStr::new_inline("<expression>"),
            tree: Arc::new(tree),
        };
        self.eval(&script, statement)
    }

    /// Program output so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Frame at `depth`, innermost first.
    #[must_use]
    pub fn frame_at(&self, depth: usize) -> Option<&Frame> {
        if depth == 0 {
            return Some(&self.current);
        }
        let index = self.callers.len().checked_sub(depth)?;
        self.callers.get(index)
    }

    /// Number of frames on the stack, including top-level code.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.callers.len() + 1
    }

    /// A global or local variable of the innermost frame.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.current.locals.get(name)
    }

    pub(crate) fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub(crate) fn stdlib(&self) -> &StandardLibrary {
        self.stdlib
    }

    fn compile(&mut self, filename: &str) -> Result<Script, RuntimeError> {
        self.cache
            .compile(filename, self.loader, self.debug.as_deref_mut())
    }

    /// Runs a compiled file in the current frame.
    fn run_script(&mut self, script: &Script) -> Result<Value, RuntimeError> {
        self.hoist(script, script.tree.root())?;
        let saved_file = std::mem::replace(&mut self.current.filename, script.filename.clone());
        let saved_line = self.current.line;
        let result = self.exec(script, script.tree.root());
        self.current.filename = saved_file;
        self.current.line = saved_line;
        match result? {
            StmtResult::Return(value) => Ok(value),
            StmtResult::Continue => Ok(Value::Int(1)),
            StmtResult::Break => Err(RuntimeError::InvalidControlFlow("break")),
            StmtResult::LoopContinue => Err(RuntimeError::InvalidControlFlow("continue")),
        }
    }

    /// Resolves an include path against the directory of the running file.
    pub(crate) fn resolve_include(&self, path: &str) -> SmolStr {
        let path = Path::new(path);
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(self.current.filename.as_str())
                .parent()
                .map_or_else(|| path.to_path_buf(), |dir| dir.join(path))
        };
        SmolStr::new(normalize_path(&resolved).to_string_lossy())
    }

    pub(crate) fn include(
        &mut self,
        path: &str,
        once: bool,
        require: bool,
    ) -> Result<Value, RuntimeError> {
        let filename = self.resolve_include(path);
        if once && self.included.contains(&filename) {
            return Ok(Value::Bool(true));
        }
        let script = match self.compile(&filename) {
            Ok(script) => script,
            Err(err @ RuntimeError::Load { .. }) if !require => {
                tracing::warn!("include failed: {err}");
                return Ok(Value::Bool(false));
            }
            Err(err) => return Err(err),
        };
        self.included.insert(filename);
        self.run_script(&script)
    }

    /// Declares top-level functions and classes before a file runs.
    fn hoist(&mut self, script: &Script, list: NodeId) -> Result<(), RuntimeError> {
        let tree = Arc::clone(&script.tree);
        let Some(items) = tree.kind(list).list_children() else {
            return Ok(());
        };
        for &item in items {
            match tree.kind(item) {
                NodeKind::FunctionDecl { .. } => self.declare_function(script, item),
                NodeKind::Class { .. } => self.declare_class(script, item)?,
                // Probe wrappers and plain blocks.
                NodeKind::StatementList(_) => self.hoist(script, item)?,
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn declare_function(&mut self, script: &Script, node: NodeId) {
        let NodeKind::FunctionDecl { name, params, body } = script.tree.kind(node) else {
            return;
        };
        let key = lowercase(name);
        if self.functions.contains_key(&key) {
            return;
        }
        self.functions.insert(
            key,
            Rc::new(FunctionDef {
                name: name.clone(),
                script: script.clone(),
                params: *params,
                body: *body,
            }),
        );
    }

    pub(crate) fn declare_class(&mut self, script: &Script, node: NodeId) -> Result<(), RuntimeError> {
        let NodeKind::Class { name, parent, body } = script.tree.kind(node) else {
            return Ok(());
        };
        let key = lowercase(name);
        if self.classes.contains_key(&key) {
            return Ok(());
        }

        let mut constants = IndexMap::new();
        let mut properties = Vec::new();
        let mut statics = IndexMap::new();
        let mut methods = IndexMap::new();
        let members = script.tree.kind(*body).list_children().unwrap_or_default();
        for &member in members {
            match script.tree.kind(member) {
                NodeKind::ConstDecl { name, value } => {
                    constants.insert(name.clone(), *value);
                }
                NodeKind::PropertyDecl {
                    name,
                    is_static: true,
                    default,
                } => {
                    let value = match default {
                        Some(default) => self.eval(script, *default)?,
                        None => Value::Null,
                    };
                    statics.insert(name.clone(), value);
                }
                NodeKind::PropertyDecl { name, default, .. } => {
                    properties.push((name.clone(), *default));
                }
                NodeKind::Method {
                    name,
                    is_static,
                    params,
                    body,
                } => {
                    methods.insert(
                        lowercase(name),
                        MethodDef {
                            name: name.clone(),
                            is_static: *is_static,
                            params: *params,
                            body: *body,
                        },
                    );
                }
                _ => {}
            }
        }

        self.classes.insert(
            key,
            Rc::new(ClassDef {
                name: name.clone(),
                parent: parent.clone(),
                script: script.clone(),
                constants,
                properties,
                statics: RefCell::new(statics),
                methods,
            }),
        );
        Ok(())
    }

    pub(crate) fn function(&self, name: &str) -> Option<Rc<FunctionDef>> {
        self.functions.get(&lowercase(name)).cloned()
    }

    pub(crate) fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(&lowercase(name))
    }

    /// Looks up a class, resolving `self`, `static` and `parent`.
    pub(crate) fn resolve_class(&self, name: &str) -> Result<Rc<ClassDef>, RuntimeError> {
        let undefined = || RuntimeError::UndefinedClass(SmolStr::new(name));
        match lowercase(name).as_str() {
            "self" => self.current.class.clone().ok_or_else(undefined),
            "static" => self.current.static_class.clone().ok_or_else(undefined),
            "parent" => self
                .current
                .class
                .as_ref()
                .and_then(|class| self.parent_of(class))
                .ok_or_else(undefined),
            key => self.classes.get(key).cloned().ok_or_else(undefined),
        }
    }

    pub(crate) fn parent_of(&self, class: &ClassDef) -> Option<Rc<ClassDef>> {
        let parent = class.parent.as_ref()?;
        self.classes.get(&lowercase(parent)).cloned()
    }

    /// `class` followed by its ancestors.
    pub(crate) fn lineage(&self, class: &Rc<ClassDef>) -> Vec<Rc<ClassDef>> {
        let mut chain = vec![Rc::clone(class)];
        while chain.len() < MAX_CLASS_CHAIN {
            let Some(parent) = chain.last().and_then(|last| self.parent_of(last)) else {
                break;
            };
            if chain.iter().any(|seen| Rc::ptr_eq(seen, &parent)) {
                break;
            }
            chain.push(parent);
        }
        chain
    }

    pub(crate) fn find_method(
        &self,
        class: &Rc<ClassDef>,
        name: &str,
    ) -> Option<(Rc<ClassDef>, MethodDef)> {
        let key = lowercase(name);
        self.lineage(class).into_iter().find_map(|owner| {
            let method = owner.methods.get(&key)?.clone();
            Some((owner, method))
        })
    }

    pub(crate) fn is_instance_of(&self, object: &ObjectRef, class: &Rc<ClassDef>) -> bool {
        let own = Rc::clone(&object.borrow().class);
        self.lineage(&own)
            .iter()
            .any(|ancestor| Rc::ptr_eq(ancestor, class))
    }

    /// Creates an object and runs its constructor.
    pub(crate) fn instantiate(
        &mut self,
        class: &Rc<ClassDef>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let mut properties = IndexMap::new();
        for owner in self.lineage(class).into_iter().rev() {
            for (name, default) in &owner.properties {
                let value = match default {
                    Some(default) => self.eval(&owner.script, *default)?,
                    None => Value::Null,
                };
                properties.insert(name.clone(), value);
            }
        }
        let object = Object::new(Rc::clone(class), properties);

        if let Some((owner, constructor)) = self.find_method(class, "__construct") {
            let script = owner.script.clone();
            let code = UserCode {
                name: SmolStr::new(format!("{}::{}", owner.name, constructor.name)),
                script: &script,
                params: constructor.params,
                body: constructor.body,
            };
            let binding = Binding {
                this: Some(Rc::clone(&object)),
                class: Some(owner),
                static_class: Some(Rc::clone(class)),
                captured: Vec::new(),
            };
            self.call_user(&code, args, binding)?;
        }
        Ok(Value::Object(object))
    }

    /// Runs user code in a new frame.
    pub(crate) fn call_user(
        &mut self,
        code: &UserCode<'_>,
        args: Vec<Value>,
        binding: Binding,
    ) -> Result<Value, RuntimeError> {
        if self.callers.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepth(MAX_CALL_DEPTH));
        }
        let mut frame = Frame {
            function: Some(code.name.clone()),
            filename: code.script.filename.clone(),
            line: code.script.tree.line(code.body),
            locals: IndexMap::new(),
            this: binding.this,
            class: binding.class,
            static_class: binding.static_class,
        };
        frame.locals.extend(binding.captured);

        let caller = std::mem::replace(&mut self.current, frame);
        self.callers.push(caller);
        let result = self.bind_and_run(code, args);
        if let Some(caller) = self.callers.pop() {
            self.current = caller;
        }
        result
    }

    fn bind_and_run(&mut self, code: &UserCode<'_>, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let tree = Arc::clone(&code.script.tree);
        let params = tree.kind(code.params).list_children().unwrap_or_default();
        let required = params
            .iter()
            .filter(|param| matches!(tree.kind(**param), NodeKind::Parameter { default: None, .. }))
            .count();
        let given = args.len();
        let mut args = args.into_iter();
        for &param in params {
            let NodeKind::Parameter { name, default } = tree.kind(param) else {
                continue;
            };
            let value = match (args.next(), default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval(code.script, *default)?,
                (None, None) => {
                    return Err(RuntimeError::ArgumentCount {
                        function: code.name.clone(),
                        expected: required,
                        given,
                    })
                }
            };
            self.current.locals.insert(name.clone(), value);
        }

        match self.exec(code.script, code.body)? {
            StmtResult::Return(value) => Ok(value),
            StmtResult::Continue => Ok(Value::Null),
            StmtResult::Break => Err(RuntimeError::InvalidControlFlow("break")),
            StmtResult::LoopContinue => Err(RuntimeError::InvalidControlFlow("continue")),
        }
    }

    /// Calls a closure or a function named by a string.
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Closure(closure) => {
                let NodeKind::Closure { params, body, .. } = closure.script.tree.kind(closure.node)
                else {
                    return Err(RuntimeError::type_error("value is not callable"));
                };
                let code = UserCode {
                    name: SmolStr::new_inline("{closure}"),
                    script: &closure.script,
                    params: *params,
                    body: *body,
                };
                let binding = Binding {
                    this: closure.this.clone(),
                    class: closure.class.clone(),
                    static_class: closure.class.clone(),
                    captured: closure.captured.clone(),
                };
                self.call_user(&code, args, binding)
            }
            Value::String(name) => self.call_function(name, args),
            other => Err(RuntimeError::type_error(format!(
                "value of type {} is not callable",
                other.type_name()
            ))),
        }
    }

    /// Calls a user or library function with evaluated arguments.
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if let Some(function) = self.function(name) {
            let code = UserCode {
                name: function.name.clone(),
                script: &function.script,
                params: function.params,
                body: function.body,
            };
            return self.call_user(&code, args, Binding::default());
        }
        if let Some(func) = self.stdlib.get(name) {
            return func(&args);
        }
        Err(RuntimeError::UndefinedFunction(SmolStr::new(name)))
    }

    /// Dispatches a probe to the debugger. Handlers run with the debugger
    /// detached, so nothing they evaluate can fire another probe.
    fn fire_probe(&mut self, kind: ProbeKind, id: &str) {
        let Some(debug) = self.debug.take() else {
            trace!("probe {id} reached without a debugger");
            return;
        };
        {
            let mut scope = ProbeScope::new(self);
            match kind {
                ProbeKind::Snapshot => debug.fire_snapshot(id, &mut scope),
                ProbeKind::Logpoint => debug.fire_logpoint(id, &mut scope),
            };
        }
        self.debug = Some(debug);
    }

    pub(crate) fn define(&mut self, name: &str, value: Value) -> bool {
        if self.constants.contains_key(name) {
            return false;
        }
        self.constants.insert(SmolStr::new(name), value);
        true
    }

    pub(crate) fn user_constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }
}

pub(crate) fn lowercase(name: &str) -> SmolStr {
    if name.bytes().any(|byte| byte.is_ascii_uppercase()) {
        SmolStr::new(name.to_ascii_lowercase())
    } else {
        SmolStr::new(name)
    }
}
