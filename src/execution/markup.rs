// The `Markup` ambient binding: element factory and fragment type

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{Element, Object, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Build the `Markup` object: `createElement(type, props, ...children)` and
/// `Fragment`
pub fn binding() -> Value {
    let fragment = Value::native("Fragment", |interp, _, args| {
        let props = args.first().cloned().unwrap_or_default();
        if props.is_nullish() {
            return Ok(Value::Undefined);
        }
        interp.get_property(&props, "children")
    });
    Value::object(
        [
            ("createElement".to_string(), Value::native("createElement", create_element)),
            ("Fragment".to_string(), fragment),
        ]
        .into_iter()
        .collect(),
    )
}

/// Children land in `props.children`: a single child as-is, several as an
/// array, none leaves any explicit `children` prop alone
fn create_element(
    _: &mut Interpreter,
    _: &Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let element_type = args.first().cloned().unwrap_or_default();
    let mut props = match args.get(1) {
        Some(Value::Object(object)) => object
            .borrow()
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect::<Object>(),
        Some(Value::Undefined | Value::Null) | None => Object::new(),
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "Element props must be an object, got {}",
                other.type_of()
            )))
        }
    };

    let children = args.get(2..).unwrap_or_default();
    match children {
        [] => {}
        [child] => props.set("children", child.clone()),
        many => props.set("children", Value::array(many.to_vec())),
    }

    Ok(Value::Element(Rc::new(Element {
        element_type,
        props: Rc::new(RefCell::new(props)),
    })))
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::{AmbientBindings, Interpreter, Limits};
    use crate::memory::value::Value;
    use crate::transpiler::transpile;

    fn run(source: &str) -> Value {
        let script = transpile(source).unwrap();
        let ambient = AmbientBindings::new().bind("Markup", super::binding());
        let mut interpreter = Interpreter::new(ambient, Limits::default());
        interpreter.evaluate(&script).unwrap()
    }

    fn children_of(value: &Value) -> Value {
        match value {
            Value::Element(element) => element.props.borrow().get("children").cloned().unwrap_or_default(),
            other => panic!("not an element: {:?}", other),
        }
    }

    #[test]
    fn test_single_child_is_passed_as_is() {
        let element = run("<p>hello</p>");
        assert_eq!(children_of(&element).as_str(), Some("hello"));
    }

    #[test]
    fn test_several_children_become_an_array() {
        let element = run("<p>a{1}<b/></p>");
        match children_of(&element) {
            Value::Array(items) => assert_eq!(items.borrow().len(), 3),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_props_are_copied() {
        let element = run(r#"const props = { id: 'x' }; const el = <div {...props} title="t" />; props.id = 'y'; el.props.id"#);
        assert_eq!(element.as_str(), Some("x"));
    }

    #[test]
    fn test_fragment_returns_children() {
        let value = run("Markup.Fragment({ children: [1, 2] }).length");
        assert_eq!(value.as_number(), Some(2.0));
    }
}
