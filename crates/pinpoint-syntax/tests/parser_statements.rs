//! Statement parser tests.

mod common;

use common::*;
use expect_test::expect;

#[test]
fn test_if_elseif_else_chain() {
    let source = "<?php
if ($a > 1) {
    echo $a;
} elseif ($a < 0) {
    echo 0;
} else {
    echo 1;
}
";
    expect![[r#"
StatementList @1
  If @2
    IfBranch @2
      Binary Gt @2
        Variable $a @2
        Literal 1 @2
      StatementList @2
        Echo @3
          Variable $a @3
    IfBranch @4
      Binary Lt @4
        Variable $a @4
        Literal 0 @4
      StatementList @4
        Echo @5
          Literal 0 @5
    IfBranch @6
      StatementList @6
        Echo @7
          Literal 1 @7
"#]]
    .assert_eq(&snapshot_parse(source));
}

#[test]
fn test_function_with_foreach() {
    let source = "<?php
function total($items) {
    $sum = 0;
    foreach ($items as $item) {
        $sum += $item;
    }
    return $sum;
}
";
    expect![[r#"
StatementList @1
  FunctionDecl total @2
    ParameterList @2
      Parameter items @2
    StatementList @2
      Assign @3
        Variable $sum @3
        Literal 0 @3
      Foreach @4
        Variable $items @4
        Variable $item @4
        StatementList @4
          CompoundAssign Add @5
            Variable $sum @5
            Variable $item @5
      Return @7
        Variable $sum @7
"#]]
    .assert_eq(&snapshot_parse(source));
}

#[test]
fn test_for_loop_header_lists() {
    let tree = parse_ok("for ($i = 0, $j = 1; $i < 3; $i++) { echo $i; }");
    let statements = top_level(&tree);
    let NodeKind::For {
        init,
        condition,
        step,
        ..
    } = tree.kind(statements[0])
    else {
        panic!("expected for loop");
    };
    assert_eq!(tree.kind(*init).list_children().map(<[_]>::len), Some(2));
    assert_eq!(tree.kind(*condition).list_children().map(<[_]>::len), Some(1));
    assert_eq!(tree.kind(*step).list_children().map(<[_]>::len), Some(1));
}

#[test]
fn test_empty_for_header() {
    let tree = parse_ok("for (;;) { break; }");
    let statements = top_level(&tree);
    assert!(matches!(tree.kind(statements[0]), NodeKind::For { .. }));
}

#[test]
fn test_do_while_and_continue() {
    let tree = parse_ok("do { $i++; continue; } while ($i < 10);");
    let statements = top_level(&tree);
    let NodeKind::DoWhile { body, .. } = tree.kind(statements[0]) else {
        panic!("expected do-while");
    };
    let body = tree.kind(*body).list_children().unwrap_or_default();
    assert!(matches!(tree.kind(body[1]), NodeKind::Continue));
}

#[test]
fn test_else_if_two_words() {
    let tree = parse_ok("if ($a) { } else if ($b) { } else { }");
    let statements = top_level(&tree);
    assert_eq!(tree.kind(statements[0]).list_children().map(<[_]>::len), Some(3));
}

#[test]
fn test_include_forms() {
    let tree = parse_ok("require_once 'lib.php'; include __DIR__ . '/x.php';");
    let statements = top_level(&tree);
    assert!(matches!(
        tree.kind(statements[0]),
        NodeKind::Include { kind, .. } if kind.is_once() && kind.is_require()
    ));
    let NodeKind::Include { path, .. } = tree.kind(statements[1]) else {
        panic!("expected include");
    };
    assert!(matches!(tree.kind(*path), NodeKind::Binary { .. }));
}

#[test]
fn test_missing_semicolon_is_reported() {
    let output = snapshot_parse("$a = 1\n$b = 2;");
    assert!(output.contains("Errors:"));
    assert!(output.contains("expected `;`"));
}

#[test]
fn test_snippet_without_open_tag() {
    let tree = parse_ok("strlen($name) > 3;");
    let statements = top_level(&tree);
    assert!(matches!(tree.kind(statements[0]), NodeKind::Binary { .. }));
}
