mod common;

use common::{snapshot, Fixture};
use pinpoint_debug::{CapturedValue, DebuggerConfig, LogpointOptions, WatchResult};
use smol_str::SmolStr;

const LOOP: &str = "<?php
$total = 0;
for ($i = 0; $i < 5; $i++) {
    $total += $i;
}
echo $total;
";

#[test]
fn snapshot_inside_loop_is_captured_once() {
    let fixture = Fixture::new(&[("/app/loop.php", LOOP)]);
    let mut request = fixture.runtime.begin_request();
    let mut options = snapshot("loop");
    options.condition = Some("$i >= 2".into());
    options.expressions = vec!["$total".into(), "$total * 10".into()];
    assert!(request.debug_mut().register_snapshot("/app/loop.php", 4, options));

    assert_eq!(request.run("/app/loop.php").unwrap(), "10");
    let snapshots = request.snapshots();
    assert_eq!(snapshots.len(), 1);

    let snapshot = &snapshots[0];
    assert_eq!(snapshot.id, "loop");
    assert_eq!(snapshot.stackframes.len(), 1);
    let frame = &snapshot.stackframes[0];
    assert_eq!(frame.filename, "/app/loop.php");
    assert_eq!(frame.line, 4);
    assert!(frame.function.is_none());
    assert_eq!(frame.locals.get("i"), Some(&CapturedValue::Int(2)));
    assert_eq!(frame.locals.get("total"), Some(&CapturedValue::Int(1)));
    assert_eq!(
        snapshot.evaluated_expressions.get("$total * 10"),
        Some(&WatchResult::Value(CapturedValue::Int(10)))
    );

    let summary = request.finish();
    assert_eq!(summary.skipped, 0);
    assert!(summary.memory_used > 0);
}

#[test]
fn snapshot_captures_every_frame() {
    let source = "<?php
function greet($name) {
    $message = 'hi ' . $name;
    return $message;
}
echo greet('ada');
";
    let fixture = Fixture::new(&[("/app/greet.php", source)]);
    let mut request = fixture.runtime.begin_request();
    assert!(request
        .debug_mut()
        .register_snapshot("/app/greet.php", 4, snapshot("greet")));
    assert_eq!(request.run("/app/greet.php").unwrap(), "hi ada");

    let snapshots = request.snapshots();
    let frames = &snapshots[0].stackframes;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].function.as_deref(), Some("greet"));
    assert_eq!(frames[0].line, 4);
    let names: Vec<_> = frames[0].locals.keys().map(|name| name.as_str()).collect();
    assert_eq!(names, ["name", "message"]);
    assert_eq!(
        frames[0].locals.get("message"),
        Some(&CapturedValue::String("hi ada".into()))
    );
    assert!(frames[1].function.is_none());
    assert_eq!(frames[1].line, 6);
}

#[test]
fn logpoint_fires_on_every_hit() {
    let source = "<?php
foreach ([1, 2, 3] as $n) {
    echo $n;
}
";
    let fixture = Fixture::new(&[("/app/each.php", source)]);
    let mut request = fixture.runtime.begin_request();
    let mut options = LogpointOptions::new("WARN", "n=$0 missing=$1 literal=$$0");
    options.expressions = vec!["$n".into(), "$missing".into()];
    assert!(request.debug_mut().register_logpoint("/app/each.php", 3, options));

    assert_eq!(request.run("/app/each.php").unwrap(), "123");
    let messages = request.logpoints();
    let rendered: Vec<_> = messages.iter().map(|message| message.message.as_str()).collect();
    assert_eq!(
        rendered,
        [
            "n=1 missing=$1 literal=$$0",
            "n=2 missing=$1 literal=$$0",
            "n=3 missing=$1 literal=$$0",
        ]
    );
    assert!(messages
        .iter()
        .all(|message| message.log_level == "WARN" && message.line == 3));
}

#[test]
fn failing_condition_counts_as_false() {
    let fixture = Fixture::new(&[("/app/loop.php", LOOP)]);
    let mut request = fixture.runtime.begin_request();
    let mut options = snapshot("never");
    options.condition = Some("$undefined > 1".into());
    assert!(request.debug_mut().register_snapshot("/app/loop.php", 4, options));

    assert_eq!(request.run("/app/loop.php").unwrap(), "10");
    assert!(request.snapshots().is_empty());
}

#[test]
fn unsafe_expressions_are_rejected() {
    let fixture = Fixture::new(&[("/app/loop.php", LOOP)]);
    let mut request = fixture.runtime.begin_request();

    let mut assigns = snapshot("assign");
    assigns.condition = Some("$total = 100".into());
    assert!(!request.debug_mut().register_snapshot("/app/loop.php", 4, assigns));

    let mut calls = LogpointOptions::new("INFO", "$0");
    calls.expressions = vec!["exec('ls')".into()];
    assert!(!request.debug_mut().register_logpoint("/app/loop.php", 4, calls));

    assert!(request.debug().registry().is_empty());
    assert_eq!(request.run("/app/loop.php").unwrap(), "10");
    assert_eq!(fixture.runtime.cache().compile_count(), 1);
}

#[test]
fn probes_in_included_files() {
    let lib = "<?php
function total($items) {
    return array_sum($items);
}
";
    let index = "<?php
require_once 'lib.php';
echo total([1, 2, 3]);
";
    let fixture = Fixture::new(&[("/app/lib.php", lib), ("/app/index.php", index)]);
    let mut request = fixture.runtime.begin_request();
    request.set_entry("/app/index.php");
    let mut options = snapshot("lib");
    options.expressions = vec!["count($items)".into()];
    assert!(request.debug_mut().register_snapshot("lib.php", 3, options));

    assert_eq!(request.run("/app/index.php").unwrap(), "6");
    let snapshots = request.snapshots();
    let frames = &snapshots[0].stackframes;
    assert_eq!(frames[0].filename, "/app/lib.php");
    assert_eq!(frames[0].function.as_deref(), Some("total"));
    assert_eq!(frames[1].filename, "/app/index.php");
    assert_eq!(frames[1].line, 3);
    assert_eq!(
        snapshots[0].evaluated_expressions.get("count($items)"),
        Some(&WatchResult::Value(CapturedValue::Int(3)))
    );
}

#[test]
fn memory_budget_stops_later_hits() {
    let source = "<?php
for ($i = 0; $i < 5; $i++) {
    echo $i;
}
";
    let config = DebuggerConfig {
        max_memory: 1,
        ..DebuggerConfig::default()
    };
    let fixture = Fixture::with_config(&[("/app/budget.php", source)], &config);
    let mut request = fixture.runtime.begin_request();
    let mut options = LogpointOptions::new("INFO", "i=$0");
    options.expressions = vec!["$i".into()];
    assert!(request.debug_mut().register_logpoint("/app/budget.php", 3, options));

    assert_eq!(request.run("/app/budget.php").unwrap(), "01234");
    let messages = request.logpoints();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message, "i=0");

    let summary = request.finish();
    assert_eq!(summary.fired, 1);
    assert_eq!(summary.skipped, 4);
}

#[test]
fn registration_recompiles_only_when_needed() {
    let fixture = Fixture::new(&[("/app/loop.php", LOOP)]);
    let runtime = &fixture.runtime;

    let mut plain = runtime.begin_request();
    assert_eq!(plain.run("/app/loop.php").unwrap(), "10");
    plain.finish();
    assert_eq!(runtime.cache().compile_count(), 1);

    let mut first = runtime.begin_request();
    assert!(first.debug_mut().register_snapshot("/app/loop.php", 4, snapshot("bp-1")));
    assert!(!runtime.cache().contains("/app/loop.php"));
    first.run("/app/loop.php").unwrap();
    assert_eq!(first.snapshots().len(), 1);
    first.finish();
    assert_eq!(runtime.cache().compile_count(), 2);
    assert_eq!(
        runtime.debugger().list_breakpoint_ids(),
        vec![(SmolStr::new("/app/loop.php"), vec![SmolStr::new("bp-1")])]
    );

    // Same id again: the cached tree already carries the probe.
    let mut second = runtime.begin_request();
    assert!(second.debug_mut().register_snapshot("/app/loop.php", 4, snapshot("bp-1")));
    assert!(runtime.cache().contains("/app/loop.php"));
    second.run("/app/loop.php").unwrap();
    assert_eq!(second.snapshots().len(), 1);
    second.finish();
    assert_eq!(runtime.cache().compile_count(), 2);

    // A request without breakpoints runs the instrumented tree untouched.
    let mut quiet = runtime.begin_request();
    assert_eq!(quiet.run("/app/loop.php").unwrap(), "10");
    assert!(quiet.snapshots().is_empty());
    quiet.finish();

    let mut third = runtime.begin_request();
    assert!(third.debug_mut().register_snapshot("/app/loop.php", 2, snapshot("bp-2")));
    third.run("/app/loop.php").unwrap();
    assert_eq!(third.snapshots()[0].id, "bp-2");
    third.finish();
    assert_eq!(runtime.cache().compile_count(), 3);
    assert_eq!(
        runtime.debugger().list_breakpoint_ids(),
        vec![(SmolStr::new("/app/loop.php"), vec![SmolStr::new("bp-2")])]
    );
}

#[test]
fn edited_source_is_picked_up_after_invalidation() {
    let fixture = Fixture::new(&[("/app/v.php", "<?php\necho 'one';\n")]);
    let mut request = fixture.runtime.begin_request();
    assert_eq!(request.run("/app/v.php").unwrap(), "one");
    request.finish();

    fixture.loader.insert("/app/v.php", "<?php\necho 'two';\n");
    let mut request = fixture.runtime.begin_request();
    assert!(request.debug_mut().register_snapshot("/app/v.php", 2, snapshot("v")));
    assert_eq!(request.run("/app/v.php").unwrap(), "two");
    assert_eq!(request.snapshots().len(), 1);
}
