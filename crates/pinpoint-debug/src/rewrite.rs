//! Probe injection into freshly parsed trees.
//!
//! For a target line the rewriter searches the tree for the statement that
//! would execute at that line and replaces it, in its containing statement
//! list, with a two-element list `[probe, statement]`. Nothing is allocated
//! unless an insertion point is found, so a miss leaves the tree untouched.

use pinpoint_syntax::{NodeId, NodeKind, ProbeKind, SyntaxTree};
use smol_str::SmolStr;
use tracing::debug;

use crate::process::ProcessRegistry;
use crate::types::{Breakpoint, BreakpointKind};

/// Splices a probe for `id` before the statement at `line`.
///
/// Returns false, leaving the tree unchanged, when no statement qualifies
/// (for example a line past the end of the file).
pub fn locate_and_splice(tree: &mut SyntaxTree, line: u32, kind: ProbeKind, id: &str) -> bool {
    if line == 0 || line > tree.end_line() {
        return false;
    }
    let root = tree.root();
    Splicer {
        tree,
        target: line,
        kind,
        id: SmolStr::new(id),
    }
    .locate(root)
}

/// Injects every pending breakpoint of `filename` into `tree`.
///
/// Ids already injected into this exact tree are skipped; ids recorded
/// against an older tree of the same file are forgotten first. Returns the
/// number of probes spliced.
pub fn instrument(
    tree: &mut SyntaxTree,
    filename: &str,
    pending: &[&Breakpoint],
    process: &ProcessRegistry,
) -> usize {
    let stamp = tree.stamp();
    process.begin_tree(filename, stamp);

    let mut injected = 0;
    for breakpoint in pending {
        if process.is_injected_into(filename, &breakpoint.id, stamp) {
            debug!("breakpoint {} already injected into {filename}", breakpoint.id);
            continue;
        }
        let kind = match breakpoint.kind {
            BreakpointKind::Snapshot(_) => ProbeKind::Snapshot,
            BreakpointKind::Logpoint(_) => ProbeKind::Logpoint,
        };
        if locate_and_splice(tree, breakpoint.line, kind, &breakpoint.id) {
            process.mark_injected(filename, &breakpoint.id, stamp);
            injected += 1;
            debug!(
                "injected {} {} at {filename}:{}",
                kind.as_str(),
                breakpoint.id,
                breakpoint.line
            );
        } else {
            debug!(
                "no statement for {} at {filename}:{}",
                breakpoint.id, breakpoint.line
            );
        }
    }
    injected
}

struct Splicer<'a> {
    tree: &'a mut SyntaxTree,
    target: u32,
    kind: ProbeKind,
    id: SmolStr,
}

impl Splicer<'_> {
    fn locate(&mut self, node: NodeId) -> bool {
        if self.tree.line(node) > self.target {
            return false;
        }
        let kind = self.tree.kind(node);
        if let NodeKind::StatementList(items) = kind {
            let items = items.clone();
            return self.scan_statements(node, &items);
        }
        // An `If` carries the line of its first branch, so the list rule
        // below already drills into its branches latest first.
        let candidates = match kind.declaration_body() {
            Some(body) => vec![body],
            None => kind.children(),
        };
        candidates.into_iter().rev().any(|child| self.locate(child))
    }

    fn scan_statements(&mut self, list: NodeId, items: &[NodeId]) -> bool {
        let Some(last) = items.len().checked_sub(1) else {
            return false;
        };
        for index in (0..=last).rev() {
            let child = items[index];
            let line = self.tree.line(child);
            if line < self.target && index < last && self.tree.kind(child).is_simple() {
                if self.locate(child) {
                    return true;
                }
                let next = items[index + 1];
                if !self.locate(next) {
                    self.splice(list, index + 1);
                }
                return true;
            }
            if line <= self.target {
                if !self.locate(child) {
                    self.splice(list, index);
                }
                return true;
            }
        }
        false
    }

    /// The wrapper carries the target line, so a later target inside a
    /// multi-line statement hides that statement's own first line.
    fn splice(&mut self, list: NodeId, index: usize) {
        let line = self.target;
        let Some(original) = self
            .tree
            .kind(list)
            .list_children()
            .and_then(|items| items.get(index).copied())
        else {
            return;
        };
        let probe = self.tree.alloc(
            NodeKind::Probe {
                kind: self.kind,
                id: self.id.clone(),
            },
            line,
        );
        let wrapper = self
            .tree
            .alloc(NodeKind::StatementList(vec![probe, original]), line);
        if let Some(slot) = self
            .tree
            .node_mut(list)
            .kind
            .list_children_mut()
            .and_then(|items| items.get_mut(index))
        {
            *slot = wrapper;
        }
    }
}
