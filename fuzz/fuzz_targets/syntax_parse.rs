#![no_main]

use libfuzzer_sys::fuzz_target;

const MAX_SOURCE_BYTES: usize = 8192;

fuzz_target!(|data: &[u8]| {
    let capped = &data[..data.len().min(MAX_SOURCE_BYTES)];
    let source = String::from_utf8_lossy(capped);

    let parse = pinpoint_syntax::parse(&source);
    let tree = parse.tree();
    let _ = tree.dump();
    assert_eq!(parse.ok(), parse.errors().is_empty());

    let with_tag = format!("<?php\n{source}");
    let _ = pinpoint_syntax::parse(&with_tag);
});
