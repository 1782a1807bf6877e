//! Token definitions for the pinpoint host language.
//!
//! The language is a compact PHP dialect. Keywords are matched without
//! regard to ASCII case, identifiers and variables keep their spelling.

use logos::Logos;

fn lex_block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let remainder = lex.remainder();
    if let Some(end) = remainder.find("*/") {
        lex.bump(end + 2);
        true
    } else {
        lex.bump(remainder.len());
        false
    }
}

/// All token kinds of the host language.
///
/// Token kinds are divided into categories:
/// - Trivia (whitespace, comments, open/close tags)
/// - Punctuation and operators
/// - Keywords
/// - Literals and names
/// - Special tokens (errors)
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[derive(Default)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    /// Whitespace (spaces, tabs, newlines)
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// Single-line comment: `// ...` or `# ...`
    #[regex(r"//[^\r\n]*", allow_greedy = true)]
    #[regex(r"#[^\r\n]*", allow_greedy = true)]
    LineComment,

    /// Block comment: `/* ... */`
    #[token("/*", lex_block_comment)]
    BlockComment,

    /// `<?php`
    #[token("<?php", ignore(case))]
    OpenTag,

    /// `?>`
    #[token("?>")]
    CloseTag,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    /// `;`
    #[token(";")]
    Semicolon,

    /// `:`
    #[token(":")]
    Colon,

    /// `::`
    #[token("::")]
    DoubleColon,

    /// `,`
    #[token(",")]
    Comma,

    /// `(`
    #[token("(")]
    LParen,

    /// `)`
    #[token(")")]
    RParen,

    /// `[`
    #[token("[")]
    LBracket,

    /// `]`
    #[token("]")]
    RBracket,

    /// `{`
    #[token("{")]
    LBrace,

    /// `}`
    #[token("}")]
    RBrace,

    /// `->`
    #[token("->")]
    Arrow,

    /// `=>`
    #[token("=>")]
    FatArrow,

    /// `?`
    #[token("?")]
    Question,

    /// `&`
    #[token("&")]
    Ampersand,

    // =========================================================================
    // OPERATORS
    // =========================================================================
    /// `=`
    #[token("=")]
    Assign,

    /// `+=`
    #[token("+=")]
    PlusAssign,

    /// `-=`
    #[token("-=")]
    MinusAssign,

    /// `*=`
    #[token("*=")]
    StarAssign,

    /// `/=`
    #[token("/=")]
    SlashAssign,

    /// `.=`
    #[token(".=")]
    DotAssign,

    /// `%=`
    #[token("%=")]
    PercentAssign,

    /// `??=`
    #[token("??=")]
    CoalesceAssign,

    /// `==`
    #[token("==")]
    Eq,

    /// `===`
    #[token("===")]
    Identical,

    /// `!=` or `<>`
    #[token("!=")]
    #[token("<>")]
    Neq,

    /// `!==`
    #[token("!==")]
    NotIdentical,

    /// `<`
    #[token("<")]
    Lt,

    /// `<=`
    #[token("<=")]
    LtEq,

    /// `>`
    #[token(">")]
    Gt,

    /// `>=`
    #[token(">=")]
    GtEq,

    /// `+`
    #[token("+")]
    Plus,

    /// `-`
    #[token("-")]
    Minus,

    /// `*`
    #[token("*")]
    Star,

    /// `**`
    #[token("**")]
    Power,

    /// `/`
    #[token("/")]
    Slash,

    /// `%`
    #[token("%")]
    Percent,

    /// `.`
    #[token(".")]
    Dot,

    /// `!`
    #[token("!")]
    Bang,

    /// `&&`
    #[token("&&")]
    AndAnd,

    /// `||`
    #[token("||")]
    OrOr,

    /// `??`
    #[token("??")]
    Coalesce,

    /// `++`
    #[token("++")]
    PlusPlus,

    /// `--`
    #[token("--")]
    MinusMinus,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    /// `if`
    #[token("if", ignore(case))]
    KwIf,

    /// `elseif`
    #[token("elseif", ignore(case))]
    KwElseif,

    /// `else`
    #[token("else", ignore(case))]
    KwElse,

    /// `while`
    #[token("while", ignore(case))]
    KwWhile,

    /// `do`
    #[token("do", ignore(case))]
    KwDo,

    /// `for`
    #[token("for", ignore(case))]
    KwFor,

    /// `foreach`
    #[token("foreach", ignore(case))]
    KwForeach,

    /// `as`
    #[token("as", ignore(case))]
    KwAs,

    /// `break`
    #[token("break", ignore(case))]
    KwBreak,

    /// `continue`
    #[token("continue", ignore(case))]
    KwContinue,

    /// `return`
    #[token("return", ignore(case))]
    KwReturn,

    /// `echo`
    #[token("echo", ignore(case))]
    KwEcho,

    /// `function`
    #[token("function", ignore(case))]
    KwFunction,

    /// `use`
    #[token("use", ignore(case))]
    KwUse,

    /// `class`
    #[token("class", ignore(case))]
    KwClass,

    /// `extends`
    #[token("extends", ignore(case))]
    KwExtends,

    /// `new`
    #[token("new", ignore(case))]
    KwNew,

    /// `const`
    #[token("const", ignore(case))]
    KwConst,

    /// `public`
    #[token("public", ignore(case))]
    KwPublic,

    /// `protected`
    #[token("protected", ignore(case))]
    KwProtected,

    /// `private`
    #[token("private", ignore(case))]
    KwPrivate,

    /// `static`
    #[token("static", ignore(case))]
    KwStatic,

    /// `var`
    #[token("var", ignore(case))]
    KwVar,

    /// `instanceof`
    #[token("instanceof", ignore(case))]
    KwInstanceof,

    /// `isset`
    #[token("isset", ignore(case))]
    KwIsset,

    /// `empty`
    #[token("empty", ignore(case))]
    KwEmpty,

    /// `array`
    #[token("array", ignore(case))]
    KwArray,

    /// `include`
    #[token("include", ignore(case))]
    KwInclude,

    /// `include_once`
    #[token("include_once", ignore(case))]
    KwIncludeOnce,

    /// `require`
    #[token("require", ignore(case))]
    KwRequire,

    /// `require_once`
    #[token("require_once", ignore(case))]
    KwRequireOnce,

    /// `and`
    #[token("and", ignore(case))]
    KwAnd,

    /// `or`
    #[token("or", ignore(case))]
    KwOr,

    /// `true`
    #[token("true", ignore(case))]
    KwTrue,

    /// `false`
    #[token("false", ignore(case))]
    KwFalse,

    /// `null`
    #[token("null", ignore(case))]
    KwNull,

    // =========================================================================
    // LITERALS AND NAMES
    // =========================================================================
    /// Integer literal: `42`, `0x2A`
    #[regex(r"[0-9]+")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    IntLiteral,

    /// Float literal: `1.5`, `2e10`, `.5`
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    FloatLiteral,

    /// Single-quoted string: `'text'`
    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuotedString,

    /// Double-quoted string: `"text"`
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuotedString,

    /// Variable: `$name`
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    Variable,

    /// Identifier: starts with letter or underscore, contains letters, digits, underscores
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // =========================================================================
    // SPECIAL
    // =========================================================================
    /// Unrecognized input
    #[default]
    Error,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Returns true if this token is trivia (whitespace, comments, tags).
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace
                | Self::LineComment
                | Self::BlockComment
                | Self::OpenTag
                | Self::CloseTag
        )
    }

    /// Returns true if this token is a keyword.
    #[must_use]
    pub fn is_keyword(self) -> bool {
        (Self::KwIf as u16..=Self::KwNull as u16).contains(&(self as u16))
    }

    /// Returns true if this token is an assignment or compound assignment.
    #[must_use]
    pub fn is_assignment_op(self) -> bool {
        matches!(
            self,
            Self::Assign
                | Self::PlusAssign
                | Self::MinusAssign
                | Self::StarAssign
                | Self::SlashAssign
                | Self::DotAssign
                | Self::PercentAssign
                | Self::CoalesceAssign
        )
    }

    /// Returns true if this token can start an expression.
    #[must_use]
    pub fn can_start_expr(self) -> bool {
        matches!(
            self,
            Self::Variable
                | Self::Ident
                | Self::IntLiteral
                | Self::FloatLiteral
                | Self::SingleQuotedString
                | Self::DoubleQuotedString
                | Self::KwTrue
                | Self::KwFalse
                | Self::KwNull
                | Self::KwArray
                | Self::KwIsset
                | Self::KwEmpty
                | Self::KwNew
                | Self::KwFunction
                | Self::KwStatic
                | Self::KwInclude
                | Self::KwIncludeOnce
                | Self::KwRequire
                | Self::KwRequireOnce
                | Self::LParen
                | Self::LBracket
                | Self::Bang
                | Self::Minus
                | Self::Plus
                | Self::PlusPlus
                | Self::MinusMinus
        )
    }

    /// Returns the binding power for infix operators.
    ///
    /// Assignment, ternary and `instanceof` are handled by the parser
    /// directly and are not listed here.
    #[must_use]
    pub fn infix_binding_power(self) -> Option<(u8, u8)> {
        Some(match self {
            Self::KwOr => (1, 2),
            Self::KwAnd => (3, 4),
            Self::Coalesce => (10, 9), // Right associative
            Self::OrOr => (11, 12),
            Self::AndAnd => (13, 14),
            Self::Eq | Self::Neq | Self::Identical | Self::NotIdentical => (15, 16),
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => (17, 18),
            Self::Dot => (19, 20),
            Self::Plus | Self::Minus => (21, 22),
            Self::Star | Self::Slash | Self::Percent => (23, 24),
            Self::Power => (32, 31), // Right associative
            _ => return None,
        })
    }

    /// Returns the binding power for prefix operators.
    #[must_use]
    pub fn prefix_binding_power(self) -> Option<u8> {
        Some(match self {
            Self::Bang => 25,
            Self::Plus | Self::Minus | Self::PlusPlus | Self::MinusMinus => 29,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<(TokenKind, &str)> {
        TokenKind::lexer(input)
            .spanned()
            .map(|(tok, span)| (tok.unwrap_or(TokenKind::Error), &input[span]))
            .filter(|(kind, _)| !kind.is_trivia())
            .collect()
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = lex("if IF If elseIf");
        assert_eq!(
            tokens.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec![TokenKind::KwIf, TokenKind::KwIf, TokenKind::KwIf, TokenKind::KwElseif]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = lex("iffy classes");
        assert_eq!(tokens[0].0, TokenKind::Ident);
        assert_eq!(tokens[1].0, TokenKind::Ident);
    }

    #[test]
    fn test_variables_and_names() {
        let tokens = lex("$count strlen Foo::BAR");
        assert_eq!(tokens[0], (TokenKind::Variable, "$count"));
        assert_eq!(tokens[1], (TokenKind::Ident, "strlen"));
        assert_eq!(tokens[2], (TokenKind::Ident, "Foo"));
        assert_eq!(tokens[3].0, TokenKind::DoubleColon);
        assert_eq!(tokens[4], (TokenKind::Ident, "BAR"));
    }

    #[test]
    fn test_operators_longest_match() {
        let tokens = lex("=== !== ?? ??= ** -> => <> .=");
        let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identical,
                TokenKind::NotIdentical,
                TokenKind::Coalesce,
                TokenKind::CoalesceAssign,
                TokenKind::Power,
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::Neq,
                TokenKind::DotAssign,
            ]
        );
    }

    #[test]
    fn test_numeric_literals() {
        let tokens = lex("42 0x1F 1.5 .5 2e3");
        assert_eq!(tokens[0].0, TokenKind::IntLiteral);
        assert_eq!(tokens[1].0, TokenKind::IntLiteral);
        assert_eq!(tokens[2].0, TokenKind::FloatLiteral);
        assert_eq!(tokens[3].0, TokenKind::FloatLiteral);
        assert_eq!(tokens[4].0, TokenKind::FloatLiteral);
    }

    #[test]
    fn test_strings() {
        let tokens = lex(r#"'it\'s' "say \"hi\"""#);
        assert_eq!(tokens[0].0, TokenKind::SingleQuotedString);
        assert_eq!(tokens[1].0, TokenKind::DoubleQuotedString);
    }

    #[test]
    fn test_comments_and_tags_are_trivia() {
        let tokens = lex("<?php // line\n# hash\n/* block\n */ $x ?>");
        assert_eq!(tokens, vec![(TokenKind::Variable, "$x")]);
    }
}
