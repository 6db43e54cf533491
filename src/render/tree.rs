//! Tree construction
//!
//! Expands the element returned by a snippet into host [`RenderNode`]s,
//! calling component functions along the way. Runs inside the render guard;
//! any error here fails the whole pass and nothing is mounted.

use super::node::RenderNode;
use crate::error::RenderError;
use crate::interpreter::constants::MAX_RENDER_DEPTH;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::methods::own_keys;
use crate::memory::value::{format_number, Element, Value};
use tracing::warn;

/// Props that never become host attributes
const RESERVED_PROPS: [&str; 3] = ["children", "key", "ref"];

/// Build the host nodes for `root`
pub fn build_tree(interpreter: &mut Interpreter, root: &Value) -> Result<Vec<RenderNode>, RenderError> {
    let mut builder = TreeBuilder {
        interpreter,
        depth: 0,
    };
    let mut nodes = Vec::new();
    builder.expand(root, &mut nodes)?;
    Ok(nodes)
}

struct TreeBuilder<'a> {
    interpreter: &'a mut Interpreter,
    depth: usize,
}

impl TreeBuilder<'_> {
    fn expand(&mut self, value: &Value, out: &mut Vec<RenderNode>) -> Result<(), RenderError> {
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) => Ok(()),
            Value::String(text) => {
                out.push(RenderNode::text(text.as_ref()));
                Ok(())
            }
            Value::Number(n) => {
                out.push(RenderNode::text(format_number(*n)));
                Ok(())
            }
            Value::Function(_) | Value::Native(_) => {
                warn!(
                    function = value.function_name().unwrap_or("anonymous"),
                    "functions are not valid as a UI child"
                );
                Ok(())
            }
            Value::Object(_) => Err(RenderError::new(
                "Error",
                format!(
                    "Objects are not valid as a UI child (found: object with keys {{{}}})",
                    own_keys(value).join(", ")
                ),
            )),
            Value::Error(error) => Err(RenderError::new(
                "Error",
                format!("Objects are not valid as a UI child (found: {})", error),
            )),
            Value::Array(items) => {
                let items = items.borrow().clone();
                self.nested(|builder| {
                    for item in &items {
                        builder.expand(item, out)?;
                    }
                    Ok(())
                })
            }
            Value::Element(element) => self.nested(|builder| builder.expand_element(element, out)),
        }
    }

    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        if self.depth >= MAX_RENDER_DEPTH {
            return Err(RenderError::new("RangeError", "Maximum render depth exceeded"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expand_element(&mut self, element: &Element, out: &mut Vec<RenderNode>) -> Result<(), RenderError> {
        self.interpreter.tick()?;
        match &element.element_type {
            Value::String(tag) => {
                let (attributes, children) = {
                    let props = element.props.borrow();
                    let attributes = props
                        .iter()
                        .filter(|(key, _)| !RESERVED_PROPS.contains(key))
                        .filter_map(|(key, value)| attribute_text(value).map(|text| (key.to_string(), text)))
                        .collect();
                    (attributes, props.get("children").cloned().unwrap_or_default())
                };
                let mut nodes = Vec::new();
                self.expand(&children, &mut nodes)?;
                out.push(RenderNode::element(tag.as_ref(), attributes, nodes));
                Ok(())
            }
            component @ (Value::Function(_) | Value::Native(_)) => {
                let props = Value::Object(element.props.clone());
                let rendered = self.interpreter.call_function(component, Value::Undefined, &[props])?;
                self.expand(&rendered, out)
            }
            other => Err(RenderError::new(
                "TypeError",
                format!(
                    "Element type is invalid: expected a string (for built-in components) or a function (for composite components) but got: {}.",
                    match other {
                        Value::Null => "null",
                        other => other.type_of(),
                    }
                ),
            )),
        }
    }
}

/// Text form of a prop kept as a host attribute
fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Undefined | Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => Some(format_number(*n)),
        Value::String(s) => Some(s.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::markup;
    use crate::interpreter::engine::{AmbientBindings, Limits};
    use crate::transpiler::transpile;

    fn build(source: &str) -> Result<Vec<RenderNode>, String> {
        let script = transpile(source).map_err(|e| e.to_string())?;
        let ambient = AmbientBindings::new().bind("Markup", markup::binding());
        let mut interpreter = Interpreter::new(ambient, Limits::default());
        let root = interpreter.evaluate(&script).map_err(|e| e.to_string())?;
        build_tree(&mut interpreter, &root).map_err(|e| e.to_string())
    }

    #[test]
    fn test_intrinsic_elements() {
        let nodes = build(r#"<div id="main" hidden={false} onClick={() => 1}>Count: {2}{null}{true}</div>"#).unwrap();
        assert_eq!(
            nodes,
            vec![RenderNode::element(
                "div",
                vec![("id".to_string(), "main".to_string())],
                vec![RenderNode::text("Count: "), RenderNode::text("2")],
            )]
        );
    }

    #[test]
    fn test_components_and_fragments() {
        let source = r#"
            function Item({ label }) { return <li>{label}</li> }
            const List = ({ items }) => <><h1>List</h1><ul>{items.map(i => <Item label={i} />)}</ul></>;
            <List items={["a", "b"]} />
        "#;
        let nodes = build(source).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text_content(), "List");
        let list = &nodes[1];
        assert_eq!(list.children().len(), 2);
        assert_eq!(list.children()[1].tag(), Some("li"));
        assert_eq!(list.children()[1].text_content(), "b");
    }

    #[test]
    fn test_object_child_is_invalid() {
        let err = build("<div>{{ a: 1, b: 2 }}</div>").unwrap_err();
        assert_eq!(err, "Error: Objects are not valid as a UI child (found: object with keys {a, b})");
    }

    #[test]
    fn test_invalid_element_type() {
        let err = build("const Missing = undefined; <Missing />").unwrap_err();
        assert!(err.starts_with("TypeError: Element type is invalid"));
        assert!(err.ends_with("but got: undefined."));
    }

    #[test]
    fn test_component_errors_propagate() {
        let err = build("const Broken = () => { throw new Error('render boom') }; <div><Broken /></div>").unwrap_err();
        assert_eq!(err, "Error: render boom");
    }

    #[test]
    fn test_self_containing_children_are_bounded() {
        let err = build("const a = []; a.push(a); <div>{a}</div>").unwrap_err();
        assert_eq!(err, "RangeError: Maximum render depth exceeded");
    }
}
