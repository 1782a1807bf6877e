//! Main parser implementation.

use smol_str::SmolStr;

use crate::lexer::{lex, LineIndex, Token, TokenKind};
use crate::parser::{Parse, ParseError};
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Parses source text into a syntax tree.
///
/// The `<?php` open tag is optional, so both whole files and bare
/// snippets such as `$x > 0;` are accepted.
#[must_use]
pub fn parse(source: &str) -> Parse {
    let tokens: Vec<Token> = lex(source)
        .into_iter()
        .filter(|token| !token.kind.is_trivia())
        .collect();
    let parser = Parser::new(tokens, source);
    parser.parse()
}

/// Marker returned when a construct could not be parsed.
///
/// The error has already been recorded; the caller decides where to resume.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Recover;

pub(crate) type PResult<T> = Result<T, Recover>;

/// The parser state.
pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    lines: LineIndex,
    pub(crate) tree: SyntaxTree,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            lines: LineIndex::new(source),
            tree: SyntaxTree::new(),
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> Parse {
        let statements = self.parse_statement_list(None);
        let root = self.tree.alloc(NodeKind::StatementList(statements), 1);
        let end_line = self
            .tokens
            .last()
            .map_or(1, |token| self.lines.line(token.range.start()));
        self.tree.finish(root, end_line);
        Parse {
            tree: self.tree,
            errors: self.errors,
        }
    }

    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Text of the current token.
    pub(crate) fn text(&self) -> &'src str {
        self.nth_text(0)
    }

    pub(crate) fn nth_text(&self, n: usize) -> &'src str {
        self.tokens.get(self.pos + n).map_or("", |token| {
            &self.source[usize::from(token.range.start())..usize::from(token.range.end())]
        })
    }

    /// Line of the current token, or of the last token at end of input.
    pub(crate) fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| self.lines.line(token.range.start()))
    }

    pub(crate) fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    pub(crate) fn expect_semicolon(&mut self) -> PResult<()> {
        self.expect(TokenKind::Semicolon, "`;`")
    }

    /// Consumes an identifier (keywords allowed) and returns its text.
    pub(crate) fn expect_name(&mut self, what: &str) -> PResult<SmolStr> {
        let kind = self.current();
        if kind == TokenKind::Ident || kind.is_keyword() {
            let name = SmolStr::new(self.text());
            self.bump();
            Ok(name)
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    /// Records an error at the current token.
    pub(crate) fn error(&mut self, message: &str) -> Recover {
        let found = if self.at_end() {
            "end of input".to_string()
        } else {
            format!("`{}`", self.text())
        };
        self.errors.push(ParseError {
            message: format!("{message}, found {found}"),
            line: self.line(),
        });
        Recover
    }

    /// Skips to the next statement boundary after an error.
    pub(crate) fn recover(&mut self) {
        while !self.at_end() {
            match self.current() {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace => return,
                _ => self.bump(),
            }
        }
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, line: u32) -> NodeId {
        self.tree.alloc(kind, line)
    }

    pub(crate) fn kind_of(&self, id: NodeId) -> &NodeKind {
        self.tree.kind(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_source() {
        let parse = parse("");
        assert!(parse.ok());
        let tree = parse.tree();
        assert_eq!(tree.kind(tree.root()), &NodeKind::StatementList(Vec::new()));
        assert_eq!(tree.end_line(), 1);
    }

    #[test]
    fn test_end_line_is_last_token_line() {
        let parse = parse("<?php\n$a = 1;\n\n$b = 2;\n\n");
        assert!(parse.ok());
        assert_eq!(parse.tree().end_line(), 4);
    }

    #[test]
    fn test_errors_report_line() {
        let parse = parse("<?php\n$a = ;\n");
        assert!(!parse.ok());
        assert_eq!(parse.errors()[0].line, 2);
    }
}
