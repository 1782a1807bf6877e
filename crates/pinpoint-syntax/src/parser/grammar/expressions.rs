//! Expression parsing using Pratt parsing.
//!
//! Operator precedence (low to high):
//! - `or` (1-2)
//! - `and` (3-4)
//! - assignment (binds to any assignable left side, right associative)
//! - `? :` (7-8)
//! - `??` (10-9, right associative)
//! - `||` (11-12)
//! - `&&` (13-14)
//! - `==`, `!=`, `===`, `!==` (15-16)
//! - `<`, `<=`, `>`, `>=` (17-18)
//! - `.` (19-20)
//! - `+`, `-` (21-22)
//! - `*`, `/`, `%` (23-24)
//! - `!` (25)
//! - `instanceof` (27-28)
//! - unary `+`/`-`, casts, `++`/`--` (29)
//! - `**` (32-31, right associative)

use smol_str::SmolStr;

use super::strings::{unescape_double_quoted, unescape_single_quoted, StringPart};
use crate::lexer::TokenKind;
use crate::parser::parser::PResult;
use crate::parser::Parser;
use crate::tree::{BinaryOp, CastType, IncDecOp, IncludeKind, Literal, NodeId, NodeKind, UnaryOp};

const ASSIGNMENT_RHS_BP: u8 = 5;
const TERNARY_BP: (u8, u8) = (7, 8);
const INSTANCEOF_BP: u8 = 27;
const CAST_BP: u8 = 29;

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Power => BinaryOp::Pow,
        TokenKind::Dot => BinaryOp::Concat,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::Neq => BinaryOp::NotEq,
        TokenKind::Identical => BinaryOp::Identical,
        TokenKind::NotIdentical => BinaryOp::NotIdentical,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AndAnd | TokenKind::KwAnd => BinaryOp::And,
        TokenKind::OrOr | TokenKind::KwOr => BinaryOp::Or,
        TokenKind::Coalesce => BinaryOp::Coalesce,
        _ => return None,
    })
}

fn compound_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::PlusAssign => BinaryOp::Add,
        TokenKind::MinusAssign => BinaryOp::Sub,
        TokenKind::StarAssign => BinaryOp::Mul,
        TokenKind::SlashAssign => BinaryOp::Div,
        TokenKind::DotAssign => BinaryOp::Concat,
        TokenKind::PercentAssign => BinaryOp::Mod,
        TokenKind::CoalesceAssign => BinaryOp::Coalesce,
        _ => return None,
    })
}

fn cast_type(name: &str) -> Option<CastType> {
    Some(match name.to_ascii_lowercase().as_str() {
        "int" | "integer" => CastType::Int,
        "float" | "double" => CastType::Float,
        "string" => CastType::String,
        "bool" | "boolean" => CastType::Bool,
        "array" => CastType::Array,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Parse an expression using Pratt parsing.
    pub(crate) fn parse_expression(&mut self) -> PResult<NodeId> {
        self.parse_expr_bp(0)
    }

    /// Parse expression with minimum binding power.
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> PResult<NodeId> {
        let line = self.line();
        let mut lhs = if let Some(bp) = self.current().prefix_binding_power() {
            let op = self.current();
            self.bump();
            let operand = self.parse_expr_bp(bp)?;
            let kind = match op {
                TokenKind::Bang => NodeKind::Unary {
                    op: UnaryOp::Not,
                    operand,
                },
                TokenKind::Minus => NodeKind::Unary {
                    op: UnaryOp::Neg,
                    operand,
                },
                TokenKind::Plus => NodeKind::Unary {
                    op: UnaryOp::Plus,
                    operand,
                },
                _ => {
                    if !self.is_assignable(operand) {
                        return Err(self.error("expected variable after increment/decrement"));
                    }
                    let op = if op == TokenKind::PlusPlus {
                        IncDecOp::PreInc
                    } else {
                        IncDecOp::PreDec
                    };
                    NodeKind::IncDec {
                        op,
                        target: operand,
                    }
                }
            };
            self.alloc(kind, line)
        } else {
            self.parse_primary_expr()?
        };

        loop {
            let op = self.current();

            if op.is_assignment_op() {
                if !self.is_assignable(lhs) {
                    if min_bp <= ASSIGNMENT_RHS_BP {
                        return Err(self.error("cannot assign to this expression"));
                    }
                    break;
                }
                self.bump();
                let value = self.parse_expr_bp(ASSIGNMENT_RHS_BP)?;
                let kind = match compound_op(op) {
                    Some(op) => NodeKind::CompoundAssign {
                        op,
                        target: lhs,
                        value,
                    },
                    None => NodeKind::Assign { target: lhs, value },
                };
                lhs = self.alloc(kind, line);
                continue;
            }

            if op == TokenKind::Question {
                if TERNARY_BP.0 < min_bp {
                    break;
                }
                self.bump();
                let then = if self.eat(TokenKind::Colon) {
                    None
                } else {
                    let then = self.parse_expression()?;
                    self.expect(TokenKind::Colon, "`:`")?;
                    Some(then)
                };
                let otherwise = self.parse_expr_bp(TERNARY_BP.1)?;
                lhs = self.alloc(
                    NodeKind::Ternary {
                        condition: lhs,
                        then,
                        otherwise,
                    },
                    line,
                );
                continue;
            }

            if op == TokenKind::KwInstanceof {
                if INSTANCEOF_BP < min_bp {
                    break;
                }
                self.bump();
                let class = self.parse_class_reference()?;
                lhs = self.alloc(NodeKind::Instanceof { operand: lhs, class }, line);
                continue;
            }

            if let Some((l_bp, r_bp)) = op.infix_binding_power() {
                if l_bp < min_bp {
                    break;
                }
                let Some(bin_op) = binary_op(op) else {
                    break;
                };
                self.bump();
                let right = self.parse_expr_bp(r_bp)?;
                lhs = self.alloc(
                    NodeKind::Binary {
                        op: bin_op,
                        left: lhs,
                        right,
                    },
                    line,
                );
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// Returns true if `id` can appear on the left of an assignment.
    pub(crate) fn is_assignable(&self, id: NodeId) -> bool {
        matches!(
            self.kind_of(id),
            NodeKind::Variable(_)
                | NodeKind::Index { .. }
                | NodeKind::Property { .. }
                | NodeKind::StaticProperty { .. }
        )
    }

    fn parse_primary_expr(&mut self) -> PResult<NodeId> {
        let line = self.line();
        let primary = match self.current() {
            TokenKind::Variable => {
                let name = SmolStr::new(&self.text()[1..]);
                self.bump();
                self.alloc(NodeKind::Variable(name), line)
            }
            TokenKind::IntLiteral => self.parse_int_literal(),
            TokenKind::FloatLiteral => {
                let value = self.text().parse::<f64>().unwrap_or(0.0);
                self.bump();
                self.alloc(NodeKind::Literal(Literal::Float(value)), line)
            }
            TokenKind::SingleQuotedString => {
                let value = unescape_single_quoted(self.text());
                self.bump();
                self.alloc(NodeKind::Literal(Literal::String(value.into())), line)
            }
            TokenKind::DoubleQuotedString => {
                let parts = unescape_double_quoted(self.text());
                self.bump();
                self.build_interpolation(parts, line)
            }
            TokenKind::KwTrue | TokenKind::KwFalse | TokenKind::KwNull => {
                let literal = match self.current() {
                    TokenKind::KwTrue => Literal::Bool(true),
                    TokenKind::KwFalse => Literal::Bool(false),
                    _ => Literal::Null,
                };
                self.bump();
                self.alloc(NodeKind::Literal(literal), line)
            }
            TokenKind::LBracket => {
                self.bump();
                self.parse_array_elements(TokenKind::RBracket, line)?
            }
            TokenKind::KwArray => {
                self.bump();
                self.expect(TokenKind::LParen, "`(`")?;
                self.parse_array_elements(TokenKind::RParen, line)?
            }
            TokenKind::KwIsset => self.parse_isset()?,
            TokenKind::KwEmpty => {
                self.bump();
                self.expect(TokenKind::LParen, "`(`")?;
                let operand = self.parse_expression()?;
                self.expect(TokenKind::RParen, "`)`")?;
                self.alloc(NodeKind::Empty(operand), line)
            }
            TokenKind::KwNew => {
                self.bump();
                let class = self.parse_class_reference()?;
                let args = if self.at(TokenKind::LParen) {
                    self.parse_arg_list()?
                } else {
                    self.alloc(NodeKind::ArgumentList(Vec::new()), line)
                };
                self.alloc(NodeKind::New { class, args }, line)
            }
            TokenKind::KwFunction => self.parse_closure()?,
            TokenKind::KwInclude
            | TokenKind::KwIncludeOnce
            | TokenKind::KwRequire
            | TokenKind::KwRequireOnce => {
                let kind = match self.current() {
                    TokenKind::KwInclude => IncludeKind::Include,
                    TokenKind::KwIncludeOnce => IncludeKind::IncludeOnce,
                    TokenKind::KwRequire => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };
                self.bump();
                let path = self.parse_expr_bp(ASSIGNMENT_RHS_BP)?;
                self.alloc(NodeKind::Include { kind, path }, line)
            }
            TokenKind::Ident | TokenKind::KwStatic => {
                if self.nth(1) == TokenKind::DoubleColon {
                    let class = self.parse_class_reference()?;
                    self.parse_class_member(class, line)?
                } else if self.nth(1) == TokenKind::LParen {
                    let callee = self.parse_class_reference()?;
                    let args = self.parse_arg_list()?;
                    self.alloc(NodeKind::Call { callee, args }, line)
                } else if self.at(TokenKind::Ident) {
                    let name = SmolStr::new(self.text());
                    self.bump();
                    self.alloc(NodeKind::Constant(name), line)
                } else {
                    return Err(self.error("expected `::` after `static`"));
                }
            }
            TokenKind::LParen => {
                if let Some(ty) = self.peek_cast() {
                    self.bump();
                    self.bump();
                    self.bump();
                    let operand = self.parse_expr_bp(CAST_BP)?;
                    self.alloc(NodeKind::Cast { ty, operand }, line)
                } else {
                    self.bump();
                    let inner = self.parse_expression()?;
                    self.expect(TokenKind::RParen, "`)`")?;
                    inner
                }
            }
            _ => return Err(self.error("expected expression")),
        };

        self.parse_postfix_chain(primary)
    }

    /// `(int)`, `(string)` and friends.
    fn peek_cast(&self) -> Option<CastType> {
        if self.nth(2) != TokenKind::RParen {
            return None;
        }
        match self.nth(1) {
            TokenKind::Ident | TokenKind::KwArray => cast_type(self.nth_text(1)),
            _ => None,
        }
    }

    fn parse_int_literal(&mut self) -> NodeId {
        let line = self.line();
        let text = self.text();
        let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok()
        } else {
            text.parse::<i64>().ok()
        };
        let literal = match parsed {
            Some(value) => Literal::Int(value),
            None => Literal::Float(text.parse::<f64>().unwrap_or(f64::INFINITY)),
        };
        self.bump();
        self.alloc(NodeKind::Literal(literal), line)
    }

    fn build_interpolation(&mut self, parts: Vec<StringPart>, line: u32) -> NodeId {
        let mut nodes = parts.into_iter().map(|part| match part {
            StringPart::Text(text) => NodeKind::Literal(Literal::String(text.into())),
            StringPart::Variable(name) => NodeKind::Variable(name.into()),
        });
        let first = nodes
            .next()
            .unwrap_or(NodeKind::Literal(Literal::String(SmolStr::default())));
        let mut acc = if matches!(first, NodeKind::Variable(_)) {
            let empty = self.alloc(NodeKind::Literal(Literal::String(SmolStr::default())), line);
            let right = self.alloc(first, line);
            self.alloc(
                NodeKind::Binary {
                    op: BinaryOp::Concat,
                    left: empty,
                    right,
                },
                line,
            )
        } else {
            self.alloc(first, line)
        };
        for kind in nodes {
            let right = self.alloc(kind, line);
            acc = self.alloc(
                NodeKind::Binary {
                    op: BinaryOp::Concat,
                    left: acc,
                    right,
                },
                line,
            );
        }
        acc
    }

    /// Class name in `new`, `instanceof`, `X::` and callee position.
    fn parse_class_reference(&mut self) -> PResult<NodeId> {
        let line = self.line();
        match self.current() {
            TokenKind::Ident | TokenKind::KwStatic => {
                let name = SmolStr::new(self.text());
                self.bump();
                Ok(self.alloc(NodeKind::Name(name), line))
            }
            _ => Err(self.error("expected class name")),
        }
    }

    /// Everything after `Class::`.
    fn parse_class_member(&mut self, class: NodeId, line: u32) -> PResult<NodeId> {
        self.expect(TokenKind::DoubleColon, "`::`")?;
        if self.at(TokenKind::Variable) {
            let name = SmolStr::new(&self.text()[1..]);
            self.bump();
            return Ok(self.alloc(NodeKind::StaticProperty { class, name }, line));
        }
        if self.at(TokenKind::KwClass) {
            self.bump();
            let NodeKind::Name(name) = self.kind_of(class).clone() else {
                return Err(self.error("expected class name"));
            };
            return Ok(self.alloc(NodeKind::Literal(Literal::String(name)), line));
        }
        let member = self.expect_name("member name")?;
        if self.at(TokenKind::LParen) {
            let args = self.parse_arg_list()?;
            Ok(self.alloc(
                NodeKind::StaticCall {
                    class,
                    method: member,
                    args,
                },
                line,
            ))
        } else {
            Ok(self.alloc(NodeKind::ClassConstant { class, name: member }, line))
        }
    }

    /// Indexing, member access, calls and postfix increments.
    fn parse_postfix_chain(&mut self, mut lhs: NodeId) -> PResult<NodeId> {
        loop {
            let line = self.line();
            match self.current() {
                TokenKind::LBracket => {
                    self.bump();
                    let index = if self.at(TokenKind::RBracket) {
                        None
                    } else {
                        Some(self.parse_expression()?)
                    };
                    self.expect(TokenKind::RBracket, "`]`")?;
                    lhs = self.alloc(NodeKind::Index { base: lhs, index }, line);
                }
                TokenKind::Arrow => {
                    self.bump();
                    let name = self.expect_name("property or method name")?;
                    if self.at(TokenKind::LParen) {
                        let args = self.parse_arg_list()?;
                        lhs = self.alloc(
                            NodeKind::MethodCall {
                                object: lhs,
                                method: name,
                                args,
                            },
                            line,
                        );
                    } else {
                        lhs = self.alloc(NodeKind::Property { object: lhs, name }, line);
                    }
                }
                TokenKind::LParen => {
                    let args = self.parse_arg_list()?;
                    lhs = self.alloc(NodeKind::Call { callee: lhs, args }, line);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus if self.is_assignable(lhs) => {
                    let op = if self.at(TokenKind::PlusPlus) {
                        IncDecOp::PostInc
                    } else {
                        IncDecOp::PostDec
                    };
                    self.bump();
                    lhs = self.alloc(NodeKind::IncDec { op, target: lhs }, line);
                }
                _ => return Ok(lhs),
            }
        }
    }

    /// `( args )`
    pub(crate) fn parse_arg_list(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(self.alloc(NodeKind::ArgumentList(args), line))
    }

    /// Elements up to and including `end`; the opening token is consumed.
    fn parse_array_elements(&mut self, end: TokenKind, line: u32) -> PResult<NodeId> {
        let mut elements = Vec::new();
        while !self.at(end) {
            let element_line = self.line();
            let first = self.parse_expression()?;
            let element = if self.eat(TokenKind::FatArrow) {
                let value = self.parse_expression()?;
                NodeKind::ArrayElement {
                    key: Some(first),
                    value,
                }
            } else {
                NodeKind::ArrayElement {
                    key: None,
                    value: first,
                }
            };
            elements.push(self.alloc(element, element_line));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(end, "end of array literal")?;
        Ok(self.alloc(NodeKind::ArrayLiteral(elements), line))
    }

    /// `isset(a, b)` becomes `isset(a) && isset(b)`.
    fn parse_isset(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.bump();
        self.expect(TokenKind::LParen, "`(`")?;
        let mut acc: Option<NodeId> = None;
        loop {
            let operand = self.parse_expression()?;
            let check = self.alloc(NodeKind::Isset(operand), line);
            acc = Some(match acc {
                None => check,
                Some(left) => self.alloc(
                    NodeKind::Binary {
                        op: BinaryOp::And,
                        left,
                        right: check,
                    },
                    line,
                ),
            });
            if !self.eat(TokenKind::Comma) || self.at(TokenKind::RParen) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        acc.ok_or_else(|| self.error("expected variable"))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use crate::tree::{BinaryOp, NodeKind, SyntaxTree};

    fn first_statement(tree: &SyntaxTree) -> &NodeKind {
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        tree.kind(root[0])
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let parse = parse("1 + 2 * 3;");
        assert!(parse.ok());
        let tree = parse.tree();
        let NodeKind::Binary { op, right, .. } = first_statement(tree) else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(tree.kind(*right), NodeKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_assignment_binds_inside_boolean() {
        let parse = parse("$a && $b = 5;");
        assert!(parse.ok(), "{:?}", parse.errors());
        let tree = parse.tree();
        let NodeKind::Binary { op, right, .. } = first_statement(tree) else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::And);
        assert!(matches!(tree.kind(*right), NodeKind::Assign { .. }));
    }

    #[test]
    fn test_assignment_to_literal_is_error() {
        let parse = parse("1 = 2;");
        assert!(!parse.ok());
    }

    #[test]
    fn test_static_members() {
        let parse = parse("Foo::bar(1); Foo::BAZ; Foo::$count; Foo::class;");
        assert!(parse.ok(), "{:?}", parse.errors());
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        assert_eq!(tree.kind(root[0]).name(), "StaticCall");
        assert_eq!(tree.kind(root[1]).name(), "ClassConstant");
        assert_eq!(tree.kind(root[2]).name(), "StaticProperty");
        assert_eq!(tree.kind(root[3]).name(), "Literal");
    }

    #[test]
    fn test_cast_and_parenthesized() {
        let parse = parse("(int) $x; ($x);");
        assert!(parse.ok());
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        assert_eq!(tree.kind(root[0]).name(), "Cast");
        assert_eq!(tree.kind(root[1]).name(), "Variable");
    }

    #[test]
    fn test_isset_with_several_operands() {
        let parse = parse("isset($a, $b['k']);");
        assert!(parse.ok());
        let tree = parse.tree();
        let NodeKind::Binary { op, left, right } = first_statement(tree) else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::And);
        assert_eq!(tree.kind(*left).name(), "Isset");
        assert_eq!(tree.kind(*right).name(), "Isset");
    }

    #[test]
    fn test_interpolated_string_becomes_concat() {
        let parse = parse(r#""n=$n";"#);
        assert!(parse.ok());
        let tree = parse.tree();
        assert!(matches!(
            first_statement(tree),
            NodeKind::Binary {
                op: BinaryOp::Concat,
                ..
            }
        ));
    }

    #[test]
    fn test_postfix_chain() {
        let parse = parse("$o->items[0]->name;");
        assert!(parse.ok());
        let tree = parse.tree();
        let NodeKind::Property { object, name } = first_statement(tree) else {
            panic!("expected property");
        };
        assert_eq!(name, "name");
        assert_eq!(tree.kind(*object).name(), "Index");
    }

    #[test]
    fn test_short_ternary_and_coalesce() {
        let parse = parse("$a ?: $b; $a ?? $b ?? 3;");
        assert!(parse.ok(), "{:?}", parse.errors());
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        assert!(matches!(tree.kind(root[0]), NodeKind::Ternary { then: None, .. }));
        let NodeKind::Binary { right, .. } = tree.kind(root[1]) else {
            panic!("expected coalesce");
        };
        assert!(matches!(
            tree.kind(*right),
            NodeKind::Binary {
                op: BinaryOp::Coalesce,
                ..
            }
        ));
    }
}
