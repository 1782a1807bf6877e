//! `pinpoint-syntax` - Lexer, parser, and arena syntax tree for the pinpoint
//! host language, a compact PHP dialect.
//!
//! - **Lexer**: Tokenizes source text into a stream of tokens
//! - **Parser**: Builds a [`SyntaxTree`] from tokens, collecting errors
//! - **Syntax Tree**: Arena of [`Node`]s addressed by [`NodeId`], with a
//!   closed [`NodeKind`] enum describing every node shape
//!
//! Trees are built to be rewritten after parsing: a debugger can allocate
//! new nodes and store them in list slots without invalidating any id.
//!
//! # Example
//!
//! ```
//! use pinpoint_syntax::{parse, NodeKind};
//!
//! let parse = parse("<?php\n$total = $price * 2;\n");
//! assert!(parse.ok());
//!
//! let tree = parse.tree();
//! let statements = tree.kind(tree.root()).list_children().unwrap_or_default();
//! assert!(matches!(tree.kind(statements[0]), NodeKind::Assign { .. }));
//! assert_eq!(tree.line(statements[0]), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod lexer;
pub mod parser;
pub mod tree;

pub use lexer::{lex, LineIndex, Token, TokenKind};
pub use parser::{parse, Parse, ParseError};
pub use tree::{
    BinaryOp, CastType, IncDecOp, IncludeKind, Literal, Node, NodeId, NodeKind, ProbeKind,
    SyntaxTree, TreeStamp, UnaryOp,
};
