//! Parser for the pinpoint host language.
//!
//! A hand-written recursive descent parser with Pratt-style expression
//! parsing. The parser is error-tolerant: errors are collected and parsing
//! resumes at the next statement boundary, so callers always get a tree.
//! A tree that came with errors must not be executed.

#![allow(clippy::module_inception)]

pub mod grammar;
mod parser;

pub use parser::parse;
pub(crate) use parser::Parser;

use crate::tree::SyntaxTree;

/// Result of parsing source text.
#[derive(Debug)]
pub struct Parse {
    tree: SyntaxTree,
    errors: Vec<ParseError>,
}

impl Parse {
    /// The parsed tree.
    #[must_use]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Returns the parsing errors.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Returns `true` if parsing produced no errors.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the tree if parsing succeeded, otherwise the errors.
    pub fn into_result(self) -> Result<SyntaxTree, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.tree)
        } else {
            Err(self.errors)
        }
    }

    /// Returns the tree regardless of errors.
    #[must_use]
    pub fn into_tree(self) -> SyntaxTree {
        self.tree
    }
}

/// A parsing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} on line {line}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// 1-based line where the error occurred.
    pub line: u32,
}
