//! Statement parsing.
//!
//! Supported statements:
//! - Blocks `{ ... }` and the empty statement `;`
//! - `if` / `elseif` / `else if` / `else`
//! - `while`, `do ... while`, `for`, `foreach`
//! - `break`, `continue`, `return`, `echo`
//! - Function and class declarations
//! - Expression statements

use crate::lexer::TokenKind;
use crate::parser::parser::PResult;
use crate::parser::Parser;
use crate::tree::{NodeId, NodeKind};

impl Parser<'_> {
    /// Parses statements until `end` (not consumed) or end of input.
    pub(crate) fn parse_statement_list(&mut self, end: Option<TokenKind>) -> Vec<NodeId> {
        let mut statements = Vec::new();
        loop {
            if self.at_end() || end.is_some_and(|end| self.at(end)) {
                break;
            }
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            if end.is_none() && self.at(TokenKind::RBrace) {
                self.error("unexpected `}`");
                self.bump();
                continue;
            }
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(_) => self.recover(),
            }
        }
        statements
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> PResult<NodeId> {
        match self.current() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KwIf => self.parse_if_stmt(),
            TokenKind::KwWhile => self.parse_while_stmt(),
            TokenKind::KwDo => self.parse_do_while_stmt(),
            TokenKind::KwFor => self.parse_for_stmt(),
            TokenKind::KwForeach => self.parse_foreach_stmt(),
            TokenKind::KwFunction if self.nth(1) == TokenKind::Ident => self.parse_function_decl(),
            TokenKind::KwClass => self.parse_class_decl(),
            TokenKind::KwReturn => {
                let line = self.line();
                self.bump();
                let value = if self.at(TokenKind::Semicolon) || self.at_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect_semicolon()?;
                Ok(self.alloc(NodeKind::Return(value), line))
            }
            TokenKind::KwEcho => {
                let line = self.line();
                self.bump();
                let mut items = vec![self.parse_expression()?];
                while self.eat(TokenKind::Comma) {
                    items.push(self.parse_expression()?);
                }
                self.expect_semicolon()?;
                Ok(self.alloc(NodeKind::Echo(items), line))
            }
            TokenKind::KwBreak | TokenKind::KwContinue => {
                let line = self.line();
                let kind = if self.at(TokenKind::KwBreak) {
                    NodeKind::Break
                } else {
                    NodeKind::Continue
                };
                self.bump();
                self.expect_semicolon()?;
                Ok(self.alloc(kind, line))
            }
            kind if kind.can_start_expr() => {
                let expr = self.parse_expression()?;
                if !self.at_end() {
                    self.expect_semicolon()?;
                }
                Ok(expr)
            }
            _ => Err(self.error("expected statement")),
        }
    }

    /// `{ statements }`
    pub(crate) fn parse_block(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.expect(TokenKind::LBrace, "`{`")?;
        let statements = self.parse_statement_list(Some(TokenKind::RBrace));
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(self.alloc(NodeKind::StatementList(statements), line))
    }

    /// Body of a control statement: a block, or a single statement wrapped
    /// in a list of its own.
    pub(crate) fn parse_body(&mut self) -> PResult<NodeId> {
        if self.at(TokenKind::LBrace) {
            return self.parse_block();
        }
        let line = self.line();
        let statement = self.parse_statement()?;
        Ok(self.alloc(NodeKind::StatementList(vec![statement]), line))
    }

    fn parse_condition(&mut self) -> PResult<NodeId> {
        self.expect(TokenKind::LParen, "`(`")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(condition)
    }

    fn parse_if_stmt(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.bump();
        let condition = self.parse_condition()?;
        let body = self.parse_body()?;
        let mut branches = vec![self.alloc(
            NodeKind::IfBranch {
                condition: Some(condition),
                body,
            },
            line,
        )];

        loop {
            let branch_line = self.line();
            let is_elseif = if self.eat(TokenKind::KwElseif) {
                true
            } else if self.at(TokenKind::KwElse) && self.nth(1) == TokenKind::KwIf {
                self.bump();
                self.bump();
                true
            } else {
                false
            };

            if is_elseif {
                let condition = self.parse_condition()?;
                let body = self.parse_body()?;
                branches.push(self.alloc(
                    NodeKind::IfBranch {
                        condition: Some(condition),
                        body,
                    },
                    branch_line,
                ));
            } else if self.eat(TokenKind::KwElse) {
                let body = self.parse_body()?;
                branches.push(self.alloc(
                    NodeKind::IfBranch {
                        condition: None,
                        body,
                    },
                    branch_line,
                ));
                break;
            } else {
                break;
            }
        }

        Ok(self.alloc(NodeKind::If(branches), line))
    }

    fn parse_while_stmt(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.bump();
        let condition = self.parse_condition()?;
        let body = self.parse_body()?;
        Ok(self.alloc(NodeKind::While { condition, body }, line))
    }

    fn parse_do_while_stmt(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.bump();
        let body = self.parse_body()?;
        self.expect(TokenKind::KwWhile, "`while`")?;
        let condition = self.parse_condition()?;
        self.expect_semicolon()?;
        Ok(self.alloc(NodeKind::DoWhile { body, condition }, line))
    }

    fn parse_for_stmt(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.bump();
        self.expect(TokenKind::LParen, "`(`")?;
        let init = self.parse_expression_list(TokenKind::Semicolon)?;
        self.expect_semicolon()?;
        let condition = self.parse_expression_list(TokenKind::Semicolon)?;
        self.expect_semicolon()?;
        let step = self.parse_expression_list(TokenKind::RParen)?;
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.parse_body()?;
        Ok(self.alloc(
            NodeKind::For {
                init,
                condition,
                step,
                body,
            },
            line,
        ))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> PResult<NodeId> {
        let line = self.line();
        let mut items = Vec::new();
        if !self.at(end) {
            items.push(self.parse_expression()?);
            while self.eat(TokenKind::Comma) {
                items.push(self.parse_expression()?);
            }
        }
        Ok(self.alloc(NodeKind::ExpressionList(items), line))
    }

    fn parse_foreach_stmt(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.bump();
        self.expect(TokenKind::LParen, "`(`")?;
        let subject = self.parse_expression()?;
        self.expect(TokenKind::KwAs, "`as`")?;
        let first = self.parse_assignable()?;
        let (key, value) = if self.eat(TokenKind::FatArrow) {
            (Some(first), self.parse_assignable()?)
        } else {
            (None, first)
        };
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.parse_body()?;
        Ok(self.alloc(
            NodeKind::Foreach {
                subject,
                key,
                value,
                body,
            },
            line,
        ))
    }

    fn parse_assignable(&mut self) -> PResult<NodeId> {
        let target = self.parse_expr_bp(30)?;
        if self.is_assignable(target) {
            Ok(target)
        } else {
            Err(self.error("expected variable"))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use crate::tree::NodeKind;

    #[test]
    fn test_single_statement_body_is_wrapped() {
        let parse = parse("while ($i) $i--;");
        assert!(parse.ok(), "{:?}", parse.errors());
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        let NodeKind::While { body, .. } = tree.kind(root[0]) else {
            panic!("expected while");
        };
        assert!(matches!(tree.kind(*body), NodeKind::StatementList(items) if items.len() == 1));
    }

    #[test]
    fn test_recovers_after_bad_statement() {
        let parse = parse("$a = ;\n$b = 2;\n");
        assert_eq!(parse.errors().len(), 1);
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        assert_eq!(root.len(), 1);
        assert_eq!(tree.line(root[0]), 2);
    }

    #[test]
    fn test_stray_closing_brace_is_reported() {
        let parse = parse("$a = 1; } $b = 2;");
        assert_eq!(parse.errors().len(), 1);
        let tree = parse.tree();
        assert_eq!(tree.kind(tree.root()).list_children().map(<[_]>::len), Some(2));
    }
}
