#![no_main]

use libfuzzer_sys::fuzz_target;
use pinpoint_debug::{locate_and_splice, Sandbox};
use pinpoint_syntax::{NodeKind, ProbeKind};

const MAX_SOURCE_BYTES: usize = 4096;

fuzz_target!(|data: &[u8]| {
    let Some((&seed, rest)) = data.split_first() else {
        return;
    };
    let capped = &rest[..rest.len().min(MAX_SOURCE_BYTES)];
    let source = String::from_utf8_lossy(capped);

    // Arbitrary text as a condition: must never panic, only accept or reject.
    let sandbox = Sandbox::default();
    let _ = sandbox.validate(&source);

    let parse = pinpoint_syntax::parse(&format!("<?php\n{source}"));
    if !parse.ok() {
        return;
    }
    let mut tree = parse.into_tree();
    let line = u32::from(seed) % (tree.end_line() + 2);
    let before = tree.dump();
    let kind = if seed % 2 == 0 {
        ProbeKind::Snapshot
    } else {
        ProbeKind::Logpoint
    };
    if locate_and_splice(&mut tree, line, kind, "fuzz") {
        let root = tree.kind(tree.root());
        assert!(matches!(root, NodeKind::StatementList(_)));
        assert!(tree.dump().contains("\"fuzz\""));
    } else {
        assert_eq!(before, tree.dump());
    }
});
