// Integration tests for the snippet interpreter

use live_snippet::interpreter::engine::{AmbientBindings, Interpreter, Limits};
use live_snippet::memory::value::Value;
use live_snippet::transpiler::transpile;

fn run(source: &str) -> Result<Value, String> {
    let script = transpile(source).map_err(|e| e.to_string())?;
    let mut interpreter = Interpreter::new(AmbientBindings::new(), Limits::default());
    interpreter.evaluate(&script).map_err(|e| e.to_string())
}

fn text(source: &str) -> String {
    run(source).expect("evaluation failed").to_display_string()
}

#[test]
fn test_function_call() {
    let source = r#"
        function add(a: number, b: number): number {
            return a + b;
        }
        add(5, 10)
    "#;
    assert_eq!(text(source), "15");
}

#[test]
fn test_recursive_function() {
    let source = r#"
        function factorial(n: number): number {
            if (n <= 1) {
                return 1;
            }
            return n * factorial(n - 1);
        }
        factorial(5)
    "#;
    assert_eq!(text(source), "120");
}

#[test]
fn test_loops_and_closures() {
    let source = r#"
        const fns = [];
        for (let i = 0; i < 3; i++) {
            fns.push(() => i * 10);
        }
        let total = 0;
        let n = 0;
        while (n < 4) {
            n++;
            if (n === 2) continue;
            total += n;
        }
        fns.map(f => f()).join() + '|' + total
    "#;
    assert_eq!(text(source), "0,10,20|8");
}

#[test]
fn test_destructuring_and_spread() {
    let source = r#"
        const { a, b: [first, ...rest], c = 'fallback' } = { a: 1, b: [2, 3, 4] };
        const merged = [...rest, a];
        `${first} ${merged.join()} ${c}`
    "#;
    assert_eq!(text(source), "2 3,4,1 fallback");
}

#[test]
fn test_try_catch_finally() {
    let source = r#"
        const order = [];
        try {
            order.push('try');
            null.x;
        } catch (e) {
            order.push(e.name);
        } finally {
            order.push('finally');
        }
        order.join(' ')
    "#;
    assert_eq!(text(source), "try TypeError finally");
}

#[test]
fn test_uncaught_throw_reports_error_value() {
    let err = run("throw new RangeError('too far')").unwrap_err();
    assert_eq!(err, "RangeError: too far");
}

#[test]
fn test_types_and_imports_do_not_change_results() {
    let typed = r#"
        import { useObserver } from 'live-snippet';
        interface Point { x: number; y: number }
        type Pair = [number, number];
        const p: Point = { x: 3, y: 4 };
        const pair: Pair = [p.x, p.y];
        Math.hypot(...pair) as number
    "#;
    let plain = r#"
        const p = { x: 3, y: 4 };
        const pair = [p.x, p.y];
        Math.hypot(...pair)
    "#;
    assert_eq!(text(typed), text(plain));
    assert_eq!(text(plain), "5");
}

#[test]
fn test_step_limit_stops_runaway_loop() {
    let script = transpile("while (true) {}").unwrap();
    let limits = Limits {
        step_limit: 1_000,
        ..Limits::default()
    };
    let mut interpreter = Interpreter::new(AmbientBindings::new(), limits);
    let err = interpreter.evaluate(&script).unwrap_err();
    assert!(!err.is_catchable());
    assert!(err.to_string().contains("step limit"));
}

#[test]
fn test_call_depth_limit() {
    let script = transpile("function down(n) { return down(n + 1) } down(0)").unwrap();
    let limits = Limits {
        max_call_depth: 16,
        ..Limits::default()
    };
    let mut interpreter = Interpreter::new(AmbientBindings::new(), limits);
    let err = interpreter.evaluate(&script).unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Maximum call stack size exceeded");
}

#[test]
fn test_string_growth_is_bounded() {
    let concat = "let s = 'x'.repeat(10000000); s + s";
    assert_eq!(run(concat).unwrap_err(), "RangeError: Invalid string length");

    let doubling = "let s = 'ab'; while (true) { s += s; }";
    assert_eq!(run(doubling).unwrap_err(), "RangeError: Invalid string length");

    let template = "const s = 'x'.repeat(9000000); `${s}${s}`";
    assert_eq!(run(template).unwrap_err(), "RangeError: Invalid string length");

    let joined = "const s = 'x'.repeat(9000000); [s, s].join('')";
    assert_eq!(run(joined).unwrap_err(), "RangeError: Invalid string length");

    assert_eq!(text("'x'.repeat(1000).length + ('y' + 'z').length"), "1002");
}

#[test]
fn test_ambient_binding_is_visible() {
    let script = transpile("greeting + ', world'").unwrap();
    let ambient = AmbientBindings::new().bind("greeting", Value::string("hello"));
    let mut interpreter = Interpreter::new(ambient, Limits::default());
    let value = interpreter.evaluate(&script).unwrap();
    assert_eq!(value.to_display_string(), "hello, world");
    assert_eq!(interpreter.ambient_names(), vec!["greeting".to_string()]);
}

#[test]
fn test_markup_without_factory_is_reference_error() {
    let err = run("<p>hi</p>").unwrap_err();
    assert_eq!(err, "ReferenceError: Markup is not defined");
}
