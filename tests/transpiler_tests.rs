// Tests for snippet lowering

use live_snippet::transpiler::{transpile, transpile_with, TranspileOptions};

#[test]
fn test_imports_are_stripped_and_recorded() {
    let source = r#"
        import { useObserver } from 'live-snippet';
        import React from 'react';
        const n = 1;
    "#;
    let script = transpile(source).unwrap();
    assert_eq!(script.stripped_imports, vec!["live-snippet".to_string(), "react".to_string()]);
    assert_eq!(script.to_string(), "const n = 1;\n");
}

#[test]
fn test_types_and_interfaces_are_erased() {
    let source = r#"
        interface Props { label: string }
        type Id = string | number;
        let id: Id = 'a';
        const show = (props: Props): string => props.label;
    "#;
    let emitted = transpile(source).unwrap().to_string();
    assert!(!emitted.contains("interface"));
    assert!(!emitted.contains("Props"));
    assert!(!emitted.contains("string"));
    assert!(emitted.starts_with("let id = \"a\";\n"));
}

#[test]
fn test_markup_lowers_to_factory_calls() {
    let emitted = transpile("<p>hi</p>").unwrap().to_string();
    assert_eq!(emitted, "Markup.createElement(\"p\", null, \"hi\");\n");

    let emitted = transpile("<Card title=\"x\" open><b>{n}</b></Card>").unwrap().to_string();
    assert!(emitted.starts_with("Markup.createElement(Card, "));
    assert!(emitted.contains("Markup.createElement(\"b\", null, n)"));
}

#[test]
fn test_fragment_uses_fragment_factory() {
    let emitted = transpile("<><i>a</i></>").unwrap().to_string();
    assert!(emitted.starts_with("Markup.createElement(Markup.Fragment, null, "));
}

#[test]
fn test_custom_factory_names() {
    let options = TranspileOptions {
        markup_factory: "h".to_string(),
        fragment_factory: "Frag".to_string(),
    };
    let emitted = transpile_with("<br />", &options).unwrap().to_string();
    assert_eq!(emitted, "h(\"br\", null);\n");
}

#[test]
fn test_malformed_markup_is_compile_error() {
    let err = transpile("<div><span></div>").unwrap_err();
    assert!(err.to_string().starts_with("SyntaxError: "), "unexpected error: {}", err);
}

#[test]
fn test_unsupported_syntax_is_compile_error() {
    assert!(transpile("class Widget {}").is_err());
    assert!(transpile("async function load() {}").is_err());
}
