//! Static validation of conditions and watch expressions.
//!
//! An expression is accepted only if every node in its parse tree belongs
//! to a small read-only grammar and every call targets an allow-listed
//! function or static method. Validation is purely syntactic; nothing is
//! evaluated here.

mod allowlist;

pub use allowlist::{is_builtin_allowed, AllowList, BUILTIN_FUNCTIONS};

use pinpoint_syntax::{parse, NodeId, NodeKind, SyntaxTree};
use smol_str::SmolStr;

use crate::error::RejectReason;

/// Validates expressions against an [`AllowList`].
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    allow: AllowList,
}

impl Sandbox {
    /// Creates a sandbox with the given user allow-lists.
    #[must_use]
    pub fn new(allow: AllowList) -> Self {
        Self { allow }
    }

    /// The active allow-list.
    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    /// Mutable access to the allow-list for runtime updates.
    pub fn allow_list_mut(&mut self) -> &mut AllowList {
        &mut self.allow
    }

    /// Checks `source` as a standalone expression statement.
    pub fn validate(&self, source: &str) -> Result<(), RejectReason> {
        let wrapped = format!("{source};");
        let parsed = parse(&wrapped);
        if let Some(error) = parsed.errors().first() {
            return Err(RejectReason::Syntax(SmolStr::new(error.to_string())));
        }
        let tree = parsed.tree();
        let walker = Walker {
            tree,
            allow: &self.allow,
        };
        // Hosts evaluate only the first statement of a snippet.
        let items = tree.kind(tree.root()).list_children().unwrap_or_default();
        match items {
            [expr] if !matches!(tree.kind(*expr), NodeKind::StatementList(_) | NodeKind::If(_)) => {
                walker.check(*expr)
            }
            _ => Err(RejectReason::NotAnExpression),
        }
    }

    /// Returns true if `source` passes [`Sandbox::validate`].
    #[must_use]
    pub fn is_valid(&self, source: &str) -> bool {
        self.validate(source).is_ok()
    }
}

struct Walker<'a> {
    tree: &'a SyntaxTree,
    allow: &'a AllowList,
}

impl Walker<'_> {
    fn check(&self, id: NodeId) -> Result<(), RejectReason> {
        let kind = self.tree.kind(id);
        match kind {
            NodeKind::StatementList(items)
            | NodeKind::ArgumentList(items)
            | NodeKind::ArrayLiteral(items)
            | NodeKind::ExpressionList(items)
            | NodeKind::ParameterList(items)
            | NodeKind::ClosureUses(items)
            | NodeKind::If(items) => self.check_all(items),

            NodeKind::Literal(_)
            | NodeKind::Name(_)
            | NodeKind::Variable(_)
            | NodeKind::Constant(_) => Ok(()),

            NodeKind::Call { callee, args } => {
                let NodeKind::Name(name) = self.tree.kind(*callee) else {
                    return Err(RejectReason::DynamicCall);
                };
                if !self.allow.allows_function(name) {
                    return Err(RejectReason::FunctionNotAllowed(name.clone()));
                }
                self.check(*args)
            }

            NodeKind::StaticCall {
                class,
                method,
                args,
            } => {
                let NodeKind::Name(class_name) = self.tree.kind(*class) else {
                    return Err(RejectReason::DynamicCall);
                };
                if !self.allow.allows_method(class_name, method) {
                    return Err(RejectReason::MethodNotAllowed(
                        format!("{class_name}::{method}").into(),
                    ));
                }
                self.check(*args)
            }

            NodeKind::Unary { operand: inner, .. }
            | NodeKind::Cast { operand: inner, .. }
            | NodeKind::Isset(inner)
            | NodeKind::Empty(inner)
            | NodeKind::Property { object: inner, .. }
            | NodeKind::StaticProperty { class: inner, .. }
            | NodeKind::ClassConstant { class: inner, .. } => self.check(*inner),

            NodeKind::Index { base, index } => {
                self.check(*base)?;
                index.map_or(Ok(()), |index| self.check(index))
            }

            NodeKind::Binary { .. }
            | NodeKind::ArrayElement { .. }
            | NodeKind::Instanceof { .. }
            | NodeKind::Ternary { .. }
            | NodeKind::PropertyDecl { .. }
            | NodeKind::ConstDecl { .. } => self.check_all(&kind.children()),

            _ => Err(RejectReason::Disallowed {
                construct: kind.name(),
                line: self.tree.line(id),
            }),
        }
    }

    fn check_all(&self, ids: &[NodeId]) -> Result<(), RejectReason> {
        ids.iter().try_for_each(|id| self.check(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> Sandbox {
        Sandbox::new(AllowList::new(
            ["my_helper".into()],
            ["Cart::total".into()],
        ))
    }

    #[test]
    fn test_accepts_read_only_expressions() {
        let sandbox = sandbox();
        for source in [
            "1 + 2",
            "$x > 0",
            "strlen($s) == 0",
            "$a instanceof Foo",
            "$user->name",
            "$items[0]['id'] ?? 'none'",
            "isset($a, $b) && !empty($c)",
            "(int) $count",
            "$flag ? 'yes' : 'no'",
            "[1, 'k' => $v]",
            "Foo::BAR . Foo::$baz",
            "my_helper($x)",
            "Cart::total($cart)",
            "count($items) > 3 || in_array('a', $tags)",
        ] {
            assert_eq!(sandbox.validate(source), Ok(()), "{source}");
        }
    }

    #[test]
    fn test_rejects_side_effects() {
        let sandbox = sandbox();
        let cases: &[(&str, RejectReason)] = &[
            (
                "$x = 1",
                RejectReason::Disallowed {
                    construct: "Assign",
                    line: 1,
                },
            ),
            (
                "$x += 1",
                RejectReason::Disallowed {
                    construct: "CompoundAssign",
                    line: 1,
                },
            ),
            (
                "$i++",
                RejectReason::Disallowed {
                    construct: "IncDec",
                    line: 1,
                },
            ),
            (
                "new Foo()",
                RejectReason::Disallowed {
                    construct: "New",
                    line: 1,
                },
            ),
            (
                "$cart->clear()",
                RejectReason::Disallowed {
                    construct: "MethodCall",
                    line: 1,
                },
            ),
        ];
        for (source, expected) in cases {
            assert_eq!(sandbox.validate(source).as_ref(), Err(expected), "{source}");
        }
    }

    #[test]
    fn test_rejects_calls_outside_allow_list() {
        let sandbox = sandbox();
        assert_eq!(
            sandbox.validate("unlink('/tmp/x')"),
            Err(RejectReason::FunctionNotAllowed("unlink".into()))
        );
        assert_eq!(
            sandbox.validate("Cart::clear()"),
            Err(RejectReason::MethodNotAllowed("Cart::clear".into()))
        );
        assert_eq!(sandbox.validate("$f()"), Err(RejectReason::DynamicCall));
        assert_eq!(
            sandbox.validate("strlen(unlink('x'))"),
            Err(RejectReason::FunctionNotAllowed("unlink".into()))
        );
    }

    #[test]
    fn test_rejects_closures_and_statements() {
        let sandbox = sandbox();
        assert!(!sandbox.is_valid("function () { return 1; }"));
        assert!(!sandbox.is_valid("include 'x.php'"));
        assert!(!sandbox.is_valid("echo 1"));
    }

    #[test]
    fn test_rejects_anything_but_one_expression() {
        let sandbox = sandbox();
        for source in ["1; $secret", "{ }", "", "if ($a) { $b; }"] {
            assert_eq!(
                sandbox.validate(source),
                Err(RejectReason::NotAnExpression),
                "{source:?}"
            );
        }
        assert_eq!(sandbox.validate("$x;"), Ok(()));
    }

    #[test]
    fn test_rejects_syntax_errors() {
        let sandbox = sandbox();
        assert!(matches!(
            sandbox.validate("$x >"),
            Err(RejectReason::Syntax(_))
        ));
        assert!(matches!(sandbox.validate("("), Err(RejectReason::Syntax(_))));
    }

    #[test]
    fn test_runtime_allow_list_update() {
        let mut sandbox = sandbox();
        assert!(!sandbox.is_valid("audit($x)"));
        sandbox.allow_list_mut().set_functions(["audit".into()]);
        assert!(sandbox.is_valid("audit($x)"));
        assert!(!sandbox.is_valid("my_helper($x)"));
    }
}
