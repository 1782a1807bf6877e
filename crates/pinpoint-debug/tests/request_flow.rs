mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{parse_tree, MockScope};
use pinpoint_debug::{
    CapturedValue, Debugger, DebuggerConfig, LogpointOptions, RegisterError, RejectReason, Sink,
    SinkError, SnapshotOptions, SourceRef, WatchResult,
};
use smol_str::SmolStr;

const FILE: &str = "/srv/app/index.php";

fn scope() -> MockScope {
    MockScope::new()
        .with_frame(
            Some("handle"),
            FILE,
            5,
            &[("x", CapturedValue::Int(5)), ("y", CapturedValue::String("abc".into()))],
        )
        .with_frame(None, FILE, 12, &[("request", CapturedValue::Null)])
        .with_value("$x", CapturedValue::Int(5))
        .with_value("$y", CapturedValue::String("abc".into()))
}

fn snapshot_options(id: &str) -> SnapshotOptions {
    SnapshotOptions {
        id: Some(id.into()),
        ..SnapshotOptions::default()
    }
}

#[test]
fn snapshot_fires_once_inside_loop() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    let mut options = snapshot_options("loop");
    options.expressions = vec!["$x".into()];
    assert!(request.register_snapshot(FILE, 4, options));

    let mut scope = scope();
    assert!(request.fire_snapshot("loop", &mut scope));
    assert!(!request.fire_snapshot("loop", &mut scope));
    assert!(!request.fire_snapshot("loop", &mut scope));

    let snapshots = request.list_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].id, "loop");
    assert_eq!(snapshots[0].stackframes.len(), 2);
    assert_eq!(snapshots[0].stackframes[0].function.as_deref(), Some("handle"));
    assert_eq!(
        snapshots[0].evaluated_expressions.get("$x"),
        Some(&WatchResult::Value(CapturedValue::Int(5)))
    );
    // One evaluation for the watch expression; later hits stop at the latch.
    assert_eq!(scope.evaluations, 1);
    assert!(request.list_snapshots().is_empty());
}

#[test]
fn logpoint_renders_positional_placeholders() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    let mut options = LogpointOptions::new("INFO", "x=$0 y=$1");
    options.id = Some("lp".into());
    options.expressions = vec!["$x".into(), "$y".into()];
    assert!(request.register_logpoint(FILE, 6, options));

    let mut scope = scope();
    assert!(request.fire_logpoint("lp", &mut scope));
    assert!(request.fire_logpoint("lp", &mut scope));

    let messages = request.list_logpoints();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message, "x=5 y=abc");
    assert_eq!(messages[0].log_level, "INFO");
    assert_eq!(messages[0].filename, FILE);
    assert_eq!(messages[0].line, 6);
}

#[test]
fn logpoint_callback_receives_level_message_and_source() {
    let seen: Arc<Mutex<Vec<(String, String, SourceRef)>>> = Arc::default();
    let sink_seen = Arc::clone(&seen);
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    let mut options = LogpointOptions::new("WARN", "y is $0");
    options.id = Some("cb".into());
    options.expressions = vec!["$y".into()];
    options.callback = Some(Sink::logpoint(
        move |level: &str, message: &str, source: &SourceRef| -> Result<(), SinkError> {
            sink_seen
                .lock()
                .unwrap()
                .push((level.to_string(), message.to_string(), source.clone()));
            Ok(())
        },
    ));
    assert!(request.register_logpoint(FILE, 8, options));
    assert!(request.fire_logpoint("cb", &mut scope()));

    assert!(request.list_logpoints().is_empty());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "WARN");
    assert_eq!(seen[0].1, "y is abc");
    assert_eq!(seen[0].2.line, 8);
}

#[test]
fn exhausted_time_budget_disables_handlers() {
    let config = DebuggerConfig {
        max_time: Duration::from_millis(1),
        ..DebuggerConfig::default()
    };
    let debugger = Debugger::new(&config);
    let mut request = debugger.begin_request();
    assert!(request.register_snapshot(FILE, 4, snapshot_options("late")));
    assert!(request.register_logpoint(FILE, 5, LogpointOptions::new("INFO", "hit")));

    request
        .governor_mut()
        .charge(Duration::from_millis(2), 0);

    let mut scope = scope();
    assert!(!request.fire_snapshot("late", &mut scope));
    assert_eq!(scope.evaluations, 0);
    assert!(request.list_snapshots().is_empty());

    let summary = request.finish();
    assert_eq!(summary.fired, 0);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn exhausted_memory_budget_keeps_earlier_results() {
    let config = DebuggerConfig {
        max_memory: 1,
        ..DebuggerConfig::default()
    };
    let debugger = Debugger::new(&config);
    let mut request = debugger.begin_request();
    let mut options = LogpointOptions::new("INFO", "tick");
    options.id = Some("tick".into());
    assert!(request.register_logpoint(FILE, 5, options));

    let mut scope = scope();
    assert!(request.fire_logpoint("tick", &mut scope));
    assert!(!request.fire_logpoint("tick", &mut scope));
    assert_eq!(request.list_logpoints().len(), 1);
}

#[test]
fn failing_condition_counts_as_false() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    let mut options = snapshot_options("guarded");
    options.condition = Some("$items['missing'] > 0".into());
    assert!(request.register_snapshot(FILE, 4, options));

    let mut scope = scope();
    assert!(!request.fire_snapshot("guarded", &mut scope));
    assert!(request.list_snapshots().is_empty());

    // The latch stays open, so a later hit with a true condition captures.
    scope = scope.with_value("$items['missing'] > 0", CapturedValue::Bool(true));
    assert!(request.fire_snapshot("guarded", &mut scope));
    assert_eq!(request.list_snapshots().len(), 1);
}

#[test]
fn rejected_expressions_are_not_stored() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();

    let mut options = snapshot_options("bad");
    options.condition = Some("$x = 1".into());
    let err = request.add_snapshot(FILE, 4, options).unwrap_err();
    assert!(matches!(
        err,
        RegisterError::InvalidCondition {
            reason: RejectReason::Disallowed { construct: "Assign", .. },
            ..
        }
    ));

    let mut options = snapshot_options("bad");
    options.expressions = vec!["$x".into(), "unlink($path)".into()];
    assert!(!request.register_snapshot(FILE, 4, options));
    assert!(request.registry().is_empty());
    assert!(!request.fire_snapshot("bad", &mut scope()));
}

#[test]
fn empty_condition_and_id_are_treated_as_absent() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    let options = SnapshotOptions {
        id: Some(SmolStr::default()),
        condition: Some(SmolStr::default()),
        ..SnapshotOptions::default()
    };
    let id = request.add_snapshot(FILE, 4, options).unwrap();
    assert!(!id.is_empty());
    assert!(id.parse::<u32>().is_ok());

    let breakpoint = request.registry().find_by_id(&id).unwrap();
    assert!(breakpoint.condition.is_none());
    assert!(request.fire_snapshot(&id, &mut scope()));
}

#[test]
fn registration_validates_filename_and_line() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    assert_eq!(
        request.add_snapshot("", 3, SnapshotOptions::default()),
        Err(RegisterError::EmptyFilename)
    );
    assert_eq!(
        request.add_snapshot(FILE, 0, SnapshotOptions::default()),
        Err(RegisterError::InvalidLine)
    );
}

#[test]
fn relative_filenames_resolve_against_source_root_or_current_file() {
    let config = DebuggerConfig {
        source_root: Some(PathBuf::from("/srv/app")),
        ..DebuggerConfig::default()
    };
    let with_root = Debugger::new(&config).begin_request();
    assert_eq!(
        with_root.resolve_filename("lib/../index.php").unwrap(),
        "/srv/app/index.php"
    );

    let mut without_root = Debugger::default().begin_request();
    without_root.set_current_file(Some(PathBuf::from("/var/www/public/index.php")));
    assert_eq!(
        without_root.resolve_filename("./cart.php").unwrap(),
        "/var/www/public/cart.php"
    );
    assert_eq!(
        without_root.resolve_filename("/abs/./x.php").unwrap(),
        "/abs/x.php"
    );
}

#[test]
fn registration_invalidates_files_without_the_probe() {
    let evicted: Arc<Mutex<Vec<String>>> = Arc::default();
    let log = Arc::clone(&evicted);
    let debugger = Debugger::default().with_invalidator(Arc::new(move |filename: &str| {
        log.lock().unwrap().push(filename.to_string());
    }));

    let mut request = debugger.begin_request();
    assert!(request.register_snapshot(FILE, 3, snapshot_options("s1")));
    let mut tree = parse_tree("<?php\n$a = 1;\n$b = 2;\n");
    assert_eq!(request.on_compile(FILE, &mut tree), 1);
    request.finish();

    // The same id is already in the cached tree: no second eviction.
    let mut request = debugger.begin_request();
    assert!(request.register_snapshot(FILE, 3, snapshot_options("s1")));
    assert!(request.register_snapshot(FILE, 2, snapshot_options("s2")));

    assert_eq!(*evicted.lock().unwrap(), vec![FILE.to_string(), FILE.to_string()]);
    assert_eq!(
        debugger.list_breakpoint_ids(),
        vec![(SmolStr::new(FILE), vec![SmolStr::new("s1")])]
    );
}

#[test]
fn on_compile_injects_each_pending_breakpoint_once() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    assert!(request.register_snapshot(FILE, 2, snapshot_options("a")));
    assert!(request.register_logpoint(FILE, 3, {
        let mut options = LogpointOptions::new("INFO", "b");
        options.id = Some("b".into());
        options
    }));
    assert!(request.register_snapshot("/srv/app/other.php", 2, snapshot_options("c")));

    let mut tree = parse_tree("<?php\n$a = 1;\n$b = 2;\n");
    assert_eq!(request.on_compile("/srv/app/./index.php", &mut tree), 2);
    assert_eq!(request.on_compile(FILE, &mut tree), 0);

    let probes: Vec<_> = tree
        .probes()
        .into_iter()
        .map(|(kind, id)| format!("{}:{id}", kind.as_str()))
        .collect();
    assert_eq!(probes, vec!["snapshot:a", "logpoint:b"]);
}

#[test]
fn duplicate_id_replaces_earlier_registration() {
    let debugger = Debugger::default();
    let mut request = debugger.begin_request();
    assert!(request.register_snapshot(FILE, 2, snapshot_options("dup")));
    assert!(request.register_snapshot("/srv/app/other.php", 3, snapshot_options("dup")));

    let mut tree = parse_tree("<?php\n$a = 1;\n$b = 2;\n");
    assert_eq!(request.on_compile(FILE, &mut tree), 0);
    assert_eq!(request.registry().len(), 1);
    assert_eq!(
        request.registry().find_by_id("dup").map(|bp| bp.line),
        Some(3)
    );
}

#[test]
fn finished_requests_feed_the_adaptive_budget() {
    let debugger = Debugger::default();
    let request = debugger.begin_request();
    let summary = request.finish();
    assert_eq!(summary.fired, 0);
    assert_eq!(debugger.process().stats().total_requests, 1);
    let next = debugger.begin_request();
    assert!(next.governor().max_time() <= Duration::from_millis(10));
}
