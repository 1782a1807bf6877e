//! Arena-allocated syntax tree.
//!
//! Nodes live in a flat `Vec` owned by [`SyntaxTree`] and refer to each
//! other through [`NodeId`] handles. Rewriting a tree means allocating new
//! nodes and storing their ids in an existing list slot; ids handed out by a
//! tree stay valid for the lifetime of that tree.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use smol_str::SmolStr;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Handle to a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Process-unique identity of one parsed tree.
///
/// Two trees never share a stamp, so a stamp identifies "this exact parse"
/// across compile caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeStamp(u64);

impl TreeStamp {
    fn next() -> Self {
        Self(NEXT_STAMP.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw stamp value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Which debugger handler an injected probe calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// Calls the snapshot handler.
    Snapshot,
    /// Calls the logpoint handler.
    Logpoint,
}

impl ProbeKind {
    /// Lowercase name used in dumps and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Logpoint => "logpoint",
        }
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal with escapes already resolved.
    String(SmolStr),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
}

/// Increment and decrement operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncDecOp {
    /// `++$x`
    PreInc,
    /// `--$x`
    PreDec,
    /// `$x++`
    PostInc,
    /// `$x--`
    PostDec,
}

/// Binary operators, including comparisons and boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `.`
    Concat,
    /// `==`
    Eq,
    /// `!=` / `<>`
    NotEq,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&` / `and`
    And,
    /// `||` / `or`
    Or,
    /// `??`
    Coalesce,
}

/// Target type of a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastType {
    /// `(int)`
    Int,
    /// `(float)`
    Float,
    /// `(string)`
    String,
    /// `(bool)`
    Bool,
    /// `(array)`
    Array,
}

/// Flavour of an include expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// `include`
    Include,
    /// `include_once`
    IncludeOnce,
    /// `require`
    Require,
    /// `require_once`
    RequireOnce,
}

impl IncludeKind {
    /// Whether a second include of the same file is skipped.
    #[must_use]
    pub fn is_once(self) -> bool {
        matches!(self, Self::IncludeOnce | Self::RequireOnce)
    }

    /// Whether a missing file is fatal.
    #[must_use]
    pub fn is_require(self) -> bool {
        matches!(self, Self::Require | Self::RequireOnce)
    }
}

/// Shape of a node.
///
/// Variants fall into four groups: lists (variable child count),
/// declarations (with a body), leaves, and fixed-shape nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Lists
    /// Sequence of statements; also the root of every tree.
    StatementList(Vec<NodeId>),
    /// Call arguments.
    ArgumentList(Vec<NodeId>),
    /// `[...]` / `array(...)`; children are `ArrayElement`s.
    ArrayLiteral(Vec<NodeId>),
    /// Comma-separated expressions in a `for` header.
    ExpressionList(Vec<NodeId>),
    /// Function, method or closure parameters.
    ParameterList(Vec<NodeId>),
    /// Variables captured by a closure's `use (...)` clause.
    ClosureUses(Vec<NodeId>),
    /// `echo a, b;`
    Echo(Vec<NodeId>),
    /// An if/elseif/else chain; children are `IfBranch`es.
    If(Vec<NodeId>),

    // Declarations
    /// `function name(params) { body }`
    FunctionDecl {
        name: SmolStr,
        params: NodeId,
        body: NodeId,
    },
    /// `function (params) use (uses) { body }`
    Closure {
        params: NodeId,
        uses: NodeId,
        body: NodeId,
    },
    /// Class method.
    Method {
        name: SmolStr,
        is_static: bool,
        params: NodeId,
        body: NodeId,
    },
    /// `class Name extends Parent { body }`
    Class {
        name: SmolStr,
        parent: Option<SmolStr>,
        body: NodeId,
    },

    // Leaves
    /// Literal value.
    Literal(Literal),
    /// Bare identifier in callee or class position.
    Name(SmolStr),
    /// `$name` (stored without the sigil).
    Variable(SmolStr),
    /// Constant fetch.
    Constant(SmolStr),
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// Injected call to a debugger handler.
    Probe { kind: ProbeKind, id: SmolStr },

    // Fixed shape
    /// One arm of an `If`; `condition` is `None` for `else`.
    IfBranch {
        condition: Option<NodeId>,
        body: NodeId,
    },
    /// `callee(args)`; `callee` is a `Name` or an expression.
    Call { callee: NodeId, args: NodeId },
    /// `Class::method(args)`
    StaticCall {
        class: NodeId,
        method: SmolStr,
        args: NodeId,
    },
    /// `$object->method(args)`
    MethodCall {
        object: NodeId,
        method: SmolStr,
        args: NodeId,
    },
    /// `new Class(args)`
    New { class: NodeId, args: NodeId },
    /// Prefix operator.
    Unary { op: UnaryOp, operand: NodeId },
    /// `++`/`--` in prefix or postfix position.
    IncDec { op: IncDecOp, target: NodeId },
    /// `(type) operand`
    Cast { ty: CastType, operand: NodeId },
    /// `isset(operand)`; several arguments are combined with `And`.
    Isset(NodeId),
    /// `empty(operand)`
    Empty(NodeId),
    /// `base[index]`; `index` is `None` for the append form `base[]`.
    Index { base: NodeId, index: Option<NodeId> },
    /// `object->name`
    Property { object: NodeId, name: SmolStr },
    /// `Class::$name`
    StaticProperty { class: NodeId, name: SmolStr },
    /// `Class::NAME`
    ClassConstant { class: NodeId, name: SmolStr },
    /// Binary operator.
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    /// `operand instanceof Class`
    Instanceof { operand: NodeId, class: NodeId },
    /// `key => value` or `value` inside an array literal.
    ArrayElement { key: Option<NodeId>, value: NodeId },
    /// `condition ? then : otherwise`; `then` is `None` for `?:`.
    Ternary {
        condition: NodeId,
        then: Option<NodeId>,
        otherwise: NodeId,
    },
    /// `target = value`
    Assign { target: NodeId, value: NodeId },
    /// `target op= value`
    CompoundAssign {
        op: BinaryOp,
        target: NodeId,
        value: NodeId,
    },
    /// `include path`
    Include { kind: IncludeKind, path: NodeId },
    /// `return value;`
    Return(Option<NodeId>),
    /// `while (condition) body`
    While { condition: NodeId, body: NodeId },
    /// `do body while (condition);`
    DoWhile { body: NodeId, condition: NodeId },
    /// `for (init; condition; step) body`
    For {
        init: NodeId,
        condition: NodeId,
        step: NodeId,
        body: NodeId,
    },
    /// `foreach (subject as key => value) body`
    Foreach {
        subject: NodeId,
        key: Option<NodeId>,
        value: NodeId,
        body: NodeId,
    },
    /// Class property declaration.
    PropertyDecl {
        name: SmolStr,
        is_static: bool,
        default: Option<NodeId>,
    },
    /// Class constant declaration.
    ConstDecl { name: SmolStr, value: NodeId },
    /// Function parameter.
    Parameter {
        name: SmolStr,
        default: Option<NodeId>,
    },
}

impl NodeKind {
    /// Children of a list-kind node.
    #[must_use]
    pub fn list_children(&self) -> Option<&[NodeId]> {
        match self {
            Self::StatementList(items)
            | Self::ArgumentList(items)
            | Self::ArrayLiteral(items)
            | Self::ExpressionList(items)
            | Self::ParameterList(items)
            | Self::ClosureUses(items)
            | Self::Echo(items)
            | Self::If(items) => Some(items),
            _ => None,
        }
    }

    /// Mutable children of a list-kind node.
    pub fn list_children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::StatementList(items)
            | Self::ArgumentList(items)
            | Self::ArrayLiteral(items)
            | Self::ExpressionList(items)
            | Self::ParameterList(items)
            | Self::ClosureUses(items)
            | Self::Echo(items)
            | Self::If(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true for nodes with a variable number of children.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.list_children().is_some()
    }

    /// Returns true for function, closure, method and class declarations.
    #[must_use]
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Self::FunctionDecl { .. }
                | Self::Closure { .. }
                | Self::Method { .. }
                | Self::Class { .. }
        )
    }

    /// Body of a declaration.
    #[must_use]
    pub fn declaration_body(&self) -> Option<NodeId> {
        match self {
            Self::FunctionDecl { body, .. }
            | Self::Closure { body, .. }
            | Self::Method { body, .. }
            | Self::Class { body, .. } => Some(*body),
            _ => None,
        }
    }

    /// Returns true for declarations and value-carrying leaves
    /// (literals and bare names).
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.is_declaration() || matches!(self, Self::Literal(_) | Self::Name(_))
    }

    /// Returns true for the four-slot loop headers (`for`, `foreach`).
    #[must_use]
    pub fn is_four_slot(&self) -> bool {
        matches!(self, Self::For { .. } | Self::Foreach { .. })
    }

    /// Returns true for nodes that are neither lists, special nodes, nor
    /// four-slot loops. `echo` holds expressions rather than statements and
    /// counts as simple.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Echo(_))
            || (!self.is_list() && !self.is_special() && !self.is_four_slot())
    }

    /// All direct children in source order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        if let Some(items) = self.list_children() {
            return items.to_vec();
        }
        match self {
            Self::FunctionDecl { params, body, .. } | Self::Method { params, body, .. } => {
                vec![*params, *body]
            }
            Self::Closure { params, uses, body } => vec![*params, *uses, *body],
            Self::Class { body, .. } => vec![*body],
            Self::IfBranch { condition, body } => {
                condition.iter().copied().chain(Some(*body)).collect()
            }
            Self::Call { callee, args } => vec![*callee, *args],
            Self::StaticCall { class, args, .. } => vec![*class, *args],
            Self::MethodCall { object, args, .. } => vec![*object, *args],
            Self::New { class, args } => vec![*class, *args],
            Self::Unary { operand, .. } | Self::Cast { operand, .. } => vec![*operand],
            Self::IncDec { target, .. } => vec![*target],
            Self::Isset(inner) | Self::Empty(inner) => vec![*inner],
            Self::Index { base, index } => Some(*base).into_iter().chain(*index).collect(),
            Self::Property { object, .. } => vec![*object],
            Self::StaticProperty { class, .. } | Self::ClassConstant { class, .. } => {
                vec![*class]
            }
            Self::Binary { left, right, .. } => vec![*left, *right],
            Self::Instanceof { operand, class } => vec![*operand, *class],
            Self::ArrayElement { key, value } => key.iter().copied().chain(Some(*value)).collect(),
            Self::Ternary {
                condition,
                then,
                otherwise,
            } => Some(*condition)
                .into_iter()
                .chain(*then)
                .chain(Some(*otherwise))
                .collect(),
            Self::Assign { target, value } | Self::CompoundAssign { target, value, .. } => {
                vec![*target, *value]
            }
            Self::Include { path, .. } => vec![*path],
            Self::Return(value) => value.iter().copied().collect(),
            Self::While { condition, body } => vec![*condition, *body],
            Self::DoWhile { body, condition } => vec![*body, *condition],
            Self::For {
                init,
                condition,
                step,
                body,
            } => vec![*init, *condition, *step, *body],
            Self::Foreach {
                subject,
                key,
                value,
                body,
            } => Some(*subject)
                .into_iter()
                .chain(*key)
                .chain([*value, *body])
                .collect(),
            Self::PropertyDecl { default, .. } | Self::Parameter { default, .. } => {
                default.iter().copied().collect()
            }
            Self::ConstDecl { value, .. } => vec![*value],
            _ => Vec::new(),
        }
    }

    /// Short name of the node shape, used in dumps and diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatementList(_) => "StatementList",
            Self::ArgumentList(_) => "ArgumentList",
            Self::ArrayLiteral(_) => "ArrayLiteral",
            Self::ExpressionList(_) => "ExpressionList",
            Self::ParameterList(_) => "ParameterList",
            Self::ClosureUses(_) => "ClosureUses",
            Self::Echo(_) => "Echo",
            Self::If(_) => "If",
            Self::FunctionDecl { .. } => "FunctionDecl",
            Self::Closure { .. } => "Closure",
            Self::Method { .. } => "Method",
            Self::Class { .. } => "Class",
            Self::Literal(_) => "Literal",
            Self::Name(_) => "Name",
            Self::Variable(_) => "Variable",
            Self::Constant(_) => "Constant",
            Self::Break => "Break",
            Self::Continue => "Continue",
            Self::Probe { .. } => "Probe",
            Self::IfBranch { .. } => "IfBranch",
            Self::Call { .. } => "Call",
            Self::StaticCall { .. } => "StaticCall",
            Self::MethodCall { .. } => "MethodCall",
            Self::New { .. } => "New",
            Self::Unary { .. } => "Unary",
            Self::IncDec { .. } => "IncDec",
            Self::Cast { .. } => "Cast",
            Self::Isset(_) => "Isset",
            Self::Empty(_) => "Empty",
            Self::Index { .. } => "Index",
            Self::Property { .. } => "Property",
            Self::StaticProperty { .. } => "StaticProperty",
            Self::ClassConstant { .. } => "ClassConstant",
            Self::Binary { .. } => "Binary",
            Self::Instanceof { .. } => "Instanceof",
            Self::ArrayElement { .. } => "ArrayElement",
            Self::Ternary { .. } => "Ternary",
            Self::Assign { .. } => "Assign",
            Self::CompoundAssign { .. } => "CompoundAssign",
            Self::Include { .. } => "Include",
            Self::Return(_) => "Return",
            Self::While { .. } => "While",
            Self::DoWhile { .. } => "DoWhile",
            Self::For { .. } => "For",
            Self::Foreach { .. } => "Foreach",
            Self::PropertyDecl { .. } => "PropertyDecl",
            Self::ConstDecl { .. } => "ConstDecl",
            Self::Parameter { .. } => "Parameter",
        }
    }
}

/// A node: its shape plus the line of its first token.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Shape and children.
    pub kind: NodeKind,
    /// 1-based source line.
    pub line: u32,
}

/// An owned syntax tree.
///
/// Deliberately not `Clone`: a tree's [`TreeStamp`] names one parse, and
/// instrumentation bookkeeping relies on that.
#[derive(Debug)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    end_line: u32,
    stamp: TreeStamp,
}

impl SyntaxTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
            end_line: 1,
            stamp: TreeStamp::next(),
        }
    }

    pub(crate) fn finish(&mut self, root: NodeId, end_line: u32) {
        self.root = root;
        self.end_line = end_line;
    }

    /// Allocates a node and returns its id.
    pub fn alloc(&mut self, kind: NodeKind, line: u32) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node { kind, line });
        id
    }

    /// The root statement list.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Last line holding a token.
    #[must_use]
    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    /// Identity of this parse.
    #[must_use]
    pub fn stamp(&self) -> TreeStamp {
        self.stamp
    }

    /// Number of allocated nodes, including unreachable ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node was allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the node for `id` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Shape of the node for `id`.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Line of the node for `id`.
    #[must_use]
    pub fn line(&self, id: NodeId) -> u32 {
        self.node(id).line
    }

    /// Ids of every probe reachable from the root, in execution order.
    #[must_use]
    pub fn probes(&self) -> Vec<(ProbeKind, SmolStr)> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let kind = self.kind(id);
            if let NodeKind::Probe { kind, id } = kind {
                found.push((*kind, id.clone()));
            }
            stack.extend(kind.children().into_iter().rev());
        }
        found
    }

    /// Renders the reachable tree as indented text, one node per line.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "{}{}", "  ".repeat(depth), node.kind.name());
        match &node.kind {
            NodeKind::Literal(literal) => match literal {
                Literal::Null => out.push_str(" null"),
                Literal::Bool(value) => {
                    let _ = write!(out, " {value}");
                }
                Literal::Int(value) => {
                    let _ = write!(out, " {value}");
                }
                Literal::Float(value) => {
                    let _ = write!(out, " {value:?}");
                }
                Literal::String(value) => {
                    let _ = write!(out, " {value:?}");
                }
            },
            NodeKind::Name(name) | NodeKind::Constant(name) => {
                let _ = write!(out, " {name}");
            }
            NodeKind::Variable(name) => {
                let _ = write!(out, " ${name}");
            }
            NodeKind::Probe { kind, id } => {
                let _ = write!(out, " {} {id:?}", kind.as_str());
            }
            NodeKind::FunctionDecl { name, .. }
            | NodeKind::Method { name, .. }
            | NodeKind::Class { name, .. }
            | NodeKind::Property { name, .. }
            | NodeKind::StaticProperty { name, .. }
            | NodeKind::ClassConstant { name, .. }
            | NodeKind::PropertyDecl { name, .. }
            | NodeKind::ConstDecl { name, .. }
            | NodeKind::Parameter { name, .. } => {
                let _ = write!(out, " {name}");
            }
            NodeKind::StaticCall { method, .. } | NodeKind::MethodCall { method, .. } => {
                let _ = write!(out, " {method}");
            }
            NodeKind::Binary { op, .. } | NodeKind::CompoundAssign { op, .. } => {
                let _ = write!(out, " {op:?}");
            }
            NodeKind::Unary { op, .. } => {
                let _ = write!(out, " {op:?}");
            }
            NodeKind::IncDec { op, .. } => {
                let _ = write!(out, " {op:?}");
            }
            NodeKind::Cast { ty, .. } => {
                let _ = write!(out, " {ty:?}");
            }
            _ => {}
        }
        let _ = writeln!(out, " @{}", node.line);
        for child in node.kind.children() {
            self.dump_node(child, depth + 1, out);
        }
    }
}
