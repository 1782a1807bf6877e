mod common;

use common::{run_script, Fixture};
use pinpoint_runtime::RuntimeError;

#[test]
fn classes_with_inheritance_and_statics() {
    let source = r#"<?php
class Animal {
    const KIND = 'animal';
    public $name;
    protected static $count = 0;

    public function __construct($name) {
        $this->name = $name;
        self::$count++;
    }

    public function speak() {
        return $this->name . ' says ' . $this->sound();
    }

    public function sound() {
        return 'nothing';
    }

    public static function count() {
        return self::$count;
    }

    public static function create($name) {
        return new static($name);
    }
}

class Dog extends Animal {
    const KIND = 'dog';

    public function sound() {
        return 'woof';
    }

    public function describe() {
        return parent::speak() . ' (' . static::KIND . ')';
    }
}

$dog = new Dog('rex');
echo $dog->describe(), "\n";
$other = Dog::create('fido');
echo get_class($other), ' ', Animal::count(), "\n";
echo $other instanceof Animal ? 'yes' : 'no', ' ', Animal::KIND;
"#;
    assert_eq!(run_script(source), "rex says woof (dog)\nDog 2\nyes animal");
}

#[test]
fn closures_capture_by_value() {
    let source = r#"<?php
$factor = 3;
$scale = function ($n) use ($factor) {
    return $n * $factor;
};
$factor = 10;
echo implode(',', array_map($scale, [1, 2, 3]));
"#;
    assert_eq!(run_script(source), "3,6,9");
}

#[test]
fn arrays_are_copied_on_assignment() {
    let source = r#"<?php
$a = [1, 2];
$b = $a;
$b[] = 3;
$matrix = [];
$matrix['row'][] = 'x';
echo count($a), count($b), count($matrix['row']);
"#;
    assert_eq!(run_script(source), "231");
}

#[test]
fn usort_with_user_comparator() {
    let source = r#"<?php
$people = [
    ['name' => 'bo', 'age' => 30],
    ['name' => 'al', 'age' => 25],
    ['name' => 'cy', 'age' => 41],
];
usort($people, function ($a, $b) {
    return $a['age'] - $b['age'];
});
foreach ($people as $person) {
    echo $person['name'];
}
"#;
    assert_eq!(run_script(source), "albocy");
}

#[test]
fn functions_are_hoisted() {
    let source = r#"<?php
echo twice(21);
function twice($n) {
    return $n * 2;
}
"#;
    assert_eq!(run_script(source), "42");
}

#[test]
fn library_functions() {
    let source = r#"<?php
echo strtoupper('abc'), str_repeat('-', 3), sprintf('%03d|%s', 7, 'x'), "\n";
echo json_encode(['a' => 1, 'b' => [true, null]]), "\n";
echo max(3, 9, 4), ' ', intdiv(7, 2), ' ', strlen(trim('  hi  '));
"#;
    assert_eq!(run_script(source), "ABC---007|x\n{\"a\":1,\"b\":[true,null]}\n9 3 2");
}

#[test]
fn include_once_runs_a_file_once() {
    let fixture = Fixture::new(&[
        ("/app/counter.php", "<?php\n$hits = isset($hits) ? $hits + 1 : 1;\n"),
        (
            "/app/index.php",
            "<?php\ninclude_once 'counter.php';\ninclude_once 'counter.php';\ninclude 'counter.php';\necho $hits;\n",
        ),
    ]);
    let mut request = fixture.runtime.begin_request();
    assert_eq!(request.run("/app/index.php").unwrap(), "2");
}

#[test]
fn missing_include_is_a_warning_but_require_fails() {
    let fixture = Fixture::new(&[
        ("/app/soft.php", "<?php\n$ok = include 'missing.php';\necho $ok ? 'loaded' : 'skipped';\n"),
        ("/app/hard.php", "<?php\nrequire 'missing.php';\necho 'unreachable';\n"),
    ]);
    let mut request = fixture.runtime.begin_request();
    assert_eq!(request.run("/app/soft.php").unwrap(), "skipped");
    let err = request.run("/app/hard.php").unwrap_err();
    assert!(matches!(err, RuntimeError::Load { .. }), "{err}");
}

#[test]
fn runtime_errors() {
    let cases = [
        ("<?php\necho nope();\n", "undefined function"),
        ("<?php\necho 1 / 0;\n", "division by zero"),
        ("<?php\n$a = [];\necho $a['k'];\n", "undefined array key"),
    ];
    for (source, expected) in cases {
        let fixture = Fixture::new(&[("/main.php", source)]);
        let mut request = fixture.runtime.begin_request();
        let err = request.run("/main.php").unwrap_err();
        assert!(
            err.to_string().to_lowercase().contains(expected),
            "{source}: {err}"
        );
    }
}

#[test]
fn unbounded_recursion_is_stopped() {
    let handle = std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(|| {
            let fixture = Fixture::new(&[("/main.php", "<?php\nfunction f($n) { return f($n + 1); }\nf(0);\n")]);
            let mut request = fixture.runtime.begin_request();
            request.run("/main.php").unwrap_err()
        })
        .unwrap();
    let err = handle.join().unwrap();
    assert!(matches!(err, RuntimeError::CallDepth(_)), "{err}");
}
