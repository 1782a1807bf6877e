//! Shared helpers for parser tests.
#![allow(dead_code)]

pub use pinpoint_syntax::{parse, NodeId, NodeKind, SyntaxTree};

/// Parses `source`, failing the test on any parse error.
pub fn parse_ok(source: &str) -> SyntaxTree {
    let parse = parse(source);
    assert!(parse.ok(), "unexpected errors: {:?}", parse.errors());
    parse.into_tree()
}

/// Dumps `source`, appending parse errors when there are any.
pub fn snapshot_parse(source: &str) -> String {
    let parse = parse(source);
    let mut output = parse.tree().dump();
    if !parse.ok() {
        output.push_str("---\nErrors:\n");
        for err in parse.errors() {
            output.push_str(&format!("  - {err}\n"));
        }
    }
    output
}

/// Top-level statements of `tree`.
pub fn top_level(tree: &SyntaxTree) -> Vec<NodeId> {
    tree.kind(tree.root())
        .list_children()
        .map(<[NodeId]>::to_vec)
        .unwrap_or_default()
}
