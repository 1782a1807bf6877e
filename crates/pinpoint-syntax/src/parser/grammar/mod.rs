//! Grammar rules, split by construct family.

mod declarations;
mod expressions;
mod statements;
mod strings;

pub use strings::{unescape_double_quoted, unescape_single_quoted, StringPart};
