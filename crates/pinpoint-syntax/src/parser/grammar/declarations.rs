//! Function, closure and class declarations.

use smol_str::SmolStr;

use crate::lexer::TokenKind;
use crate::parser::parser::PResult;
use crate::parser::Parser;
use crate::tree::{NodeId, NodeKind};

impl Parser<'_> {
    /// `function name(params) { body }`
    pub(crate) fn parse_function_decl(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.expect(TokenKind::KwFunction, "`function`")?;
        let name = self.expect_name("function name")?;
        let params = self.parse_param_list()?;
        self.skip_return_type();
        let body = self.parse_block()?;
        Ok(self.alloc(NodeKind::FunctionDecl { name, params, body }, line))
    }

    /// `function (params) use ($a, $b) { body }`
    pub(crate) fn parse_closure(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.expect(TokenKind::KwFunction, "`function`")?;
        let params = self.parse_param_list()?;
        let uses_line = self.line();
        let mut uses = Vec::new();
        if self.eat(TokenKind::KwUse) {
            self.expect(TokenKind::LParen, "`(`")?;
            while self.at(TokenKind::Variable) {
                let var_line = self.line();
                let name = SmolStr::new(&self.text()[1..]);
                self.bump();
                uses.push(self.alloc(NodeKind::Variable(name), var_line));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "`)`")?;
        }
        let uses = self.alloc(NodeKind::ClosureUses(uses), uses_line);
        self.skip_return_type();
        let body = self.parse_block()?;
        Ok(self.alloc(NodeKind::Closure { params, uses, body }, line))
    }

    /// `( [Type] $name [= default], ... )`
    fn parse_param_list(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let param_line = self.line();
            self.eat(TokenKind::Question);
            if self.at(TokenKind::Ident) || self.at(TokenKind::KwArray) {
                self.bump();
            }
            if !self.at(TokenKind::Variable) {
                return Err(self.error("expected parameter"));
            }
            let name = SmolStr::new(&self.text()[1..]);
            self.bump();
            let default = if self.eat(TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            params.push(self.alloc(NodeKind::Parameter { name, default }, param_line));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(self.alloc(NodeKind::ParameterList(params), line))
    }

    /// Return type hints are accepted and ignored.
    fn skip_return_type(&mut self) {
        if self.eat(TokenKind::Colon) {
            self.eat(TokenKind::Question);
            if self.at(TokenKind::Ident) || self.at(TokenKind::KwArray) || self.at(TokenKind::KwStatic) {
                self.bump();
            }
        }
    }

    /// `class Name [extends Parent] { members }`
    pub(crate) fn parse_class_decl(&mut self) -> PResult<NodeId> {
        let line = self.line();
        self.expect(TokenKind::KwClass, "`class`")?;
        let name = self.expect_name("class name")?;
        let parent = if self.eat(TokenKind::KwExtends) {
            Some(self.expect_name("parent class name")?)
        } else {
            None
        };

        let body_line = self.line();
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_end() {
            match self.parse_class_member_decl(&mut members) {
                Ok(()) => {}
                Err(_) => self.recover(),
            }
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        let body = self.alloc(NodeKind::StatementList(members), body_line);
        Ok(self.alloc(NodeKind::Class { name, parent, body }, line))
    }

    fn parse_class_member_decl(&mut self, members: &mut Vec<NodeId>) -> PResult<()> {
        let line = self.line();
        let mut is_static = false;
        loop {
            match self.current() {
                TokenKind::KwPublic
                | TokenKind::KwProtected
                | TokenKind::KwPrivate
                | TokenKind::KwVar => self.bump(),
                TokenKind::KwStatic => {
                    is_static = true;
                    self.bump();
                }
                _ => break,
            }
        }

        match self.current() {
            TokenKind::KwConst => {
                self.bump();
                loop {
                    let const_line = self.line();
                    let name = self.expect_name("constant name")?;
                    self.expect(TokenKind::Assign, "`=`")?;
                    let value = self.parse_expression()?;
                    members.push(self.alloc(NodeKind::ConstDecl { name, value }, const_line));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_semicolon()
            }
            TokenKind::KwFunction => {
                self.bump();
                let name = self.expect_name("method name")?;
                let params = self.parse_param_list()?;
                self.skip_return_type();
                let body = self.parse_block()?;
                members.push(self.alloc(
                    NodeKind::Method {
                        name,
                        is_static,
                        params,
                        body,
                    },
                    line,
                ));
                Ok(())
            }
            TokenKind::Variable | TokenKind::Ident | TokenKind::Question => {
                // Optional type before the property name.
                self.eat(TokenKind::Question);
                self.eat(TokenKind::Ident);
                loop {
                    let prop_line = self.line();
                    if !self.at(TokenKind::Variable) {
                        return Err(self.error("expected property name"));
                    }
                    let name = SmolStr::new(&self.text()[1..]);
                    self.bump();
                    let default = if self.eat(TokenKind::Assign) {
                        Some(self.parse_expression()?)
                    } else {
                        None
                    };
                    members.push(self.alloc(
                        NodeKind::PropertyDecl {
                            name,
                            is_static,
                            default,
                        },
                        prop_line,
                    ));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_semicolon()
            }
            _ => Err(self.error("expected class member")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use crate::tree::NodeKind;

    #[test]
    fn test_function_declaration() {
        let parse = parse("function add(int $a, $b = 2): int { return $a + $b; }");
        assert!(parse.ok(), "{:?}", parse.errors());
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        let NodeKind::FunctionDecl { name, params, .. } = tree.kind(root[0]) else {
            panic!("expected function");
        };
        assert_eq!(name, "add");
        assert_eq!(tree.kind(*params).list_children().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_closure_with_uses() {
        let parse = parse("$f = function ($x) use ($y, $z) { return $x + $y; };");
        assert!(parse.ok(), "{:?}", parse.errors());
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        let NodeKind::Assign { value, .. } = tree.kind(root[0]) else {
            panic!("expected assignment");
        };
        let NodeKind::Closure { uses, .. } = tree.kind(*value) else {
            panic!("expected closure");
        };
        assert_eq!(tree.kind(*uses).list_children().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_class_members() {
        let source = "class Cart extends Base {\n  const LIMIT = 10;\n  private static $count = 0;\n  public $items = [];\n  public function add($item) { $this->items[] = $item; }\n  static function make() { return new Cart(); }\n}";
        let parse = parse(source);
        assert!(parse.ok(), "{:?}", parse.errors());
        let tree = parse.tree();
        let root = tree.kind(tree.root()).list_children().unwrap_or_default();
        let NodeKind::Class { name, parent, body } = tree.kind(root[0]) else {
            panic!("expected class");
        };
        assert_eq!(name, "Cart");
        assert_eq!(parent.as_deref(), Some("Base"));
        let members = tree.kind(*body).list_children().unwrap_or_default();
        let names: Vec<_> = members.iter().map(|id| tree.kind(*id).name()).collect();
        assert_eq!(
            names,
            vec!["ConstDecl", "PropertyDecl", "PropertyDecl", "Method", "Method"]
        );
        assert!(matches!(
            tree.kind(members[1]),
            NodeKind::PropertyDecl { is_static: true, .. }
        ));
        assert!(matches!(tree.kind(members[4]), NodeKind::Method { is_static: true, .. }));
        assert_eq!(tree.line(members[3]), 5);
    }
}
