// Arithmetic and coercion tests for the snippet interpreter

use live_snippet::interpreter::engine::{AmbientBindings, Interpreter, Limits};
use live_snippet::transpiler::transpile;

fn text(source: &str) -> String {
    let script = transpile(source).expect("compile failed");
    let mut interpreter = Interpreter::new(AmbientBindings::new(), Limits::default());
    interpreter
        .evaluate(&script)
        .expect("evaluation failed")
        .to_display_string()
}

#[test]
fn test_operator_precedence() {
    assert_eq!(text("2 + 3 * 4"), "14");
    assert_eq!(text("(2 + 3) * 4"), "20");
    assert_eq!(text("20 - 6 / 3"), "18");
    assert_eq!(text("2 ** 10"), "1024");
}

#[test]
fn test_floating_point_and_special_values() {
    assert_eq!(text("0.1 + 0.2 === 0.3"), "false");
    assert_eq!(text("7 / 2"), "3.5");
    assert_eq!(text("-1 / 0"), "-Infinity");
    assert_eq!(text("0 / 0"), "NaN");
    assert_eq!(text("NaN === NaN"), "false");
    assert_eq!(text("Number.isNaN(0 / 0)"), "true");
}

#[test]
fn test_modulo_follows_dividend_sign() {
    assert_eq!(text("10 % 3"), "1");
    assert_eq!(text("-10 % 3"), "-1");
    assert_eq!(text("10 % -3"), "1");
    assert_eq!(text("5.5 % 2"), "1.5");
}

#[test]
fn test_string_coercion() {
    assert_eq!(text("'4' * '2'"), "8");
    assert_eq!(text("'4' + 2"), "42");
    assert_eq!(text("'4' - 2"), "2");
    assert_eq!(text("+'  12  '"), "12");
    assert_eq!(text("+'12px'"), "NaN");
    assert_eq!(text("true + 1"), "2");
    assert_eq!(text("undefined + 1"), "NaN");
}

#[test]
fn test_equality() {
    assert_eq!(text("1 == '1'"), "true");
    assert_eq!(text("1 === '1'"), "false");
    assert_eq!(text("null == undefined"), "true");
    assert_eq!(text("null === undefined"), "false");
    assert_eq!(text("0 == false"), "true");
}

#[test]
fn test_math_and_parsing() {
    assert_eq!(text("Math.max(3, 9, 4)"), "9");
    assert_eq!(text("Math.round(2.5)"), "3");
    assert_eq!(text("Math.round(-2.5)"), "-2");
    assert_eq!(text("Math.floor(-1.5)"), "-2");
    assert_eq!(text("parseInt('42px')"), "42");
    assert_eq!(text("parseFloat('3.25rem')"), "3.25");
    assert_eq!(text("(1 / 3).toFixed(3)"), "0.333");
}

#[test]
fn test_compound_assignment() {
    let source = r#"
        let x = 10;
        x += 5;
        x -= 3;
        x *= 2;
        x /= 4;
        x %= 4;
        x **= 3;
        x
    "#;
    assert_eq!(text(source), "8");
}
