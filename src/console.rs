//! Sandbox console and log store
//!
//! Snippets log through an ordinary-looking `console` object. Every call is
//! captured as a [`LogEntry`] in the playground's [`LogStore`]; nothing is
//! written to the real terminal. Arguments are frozen into [`LogValue`]s at
//! call time so later mutation of a logged object does not rewrite history.

use crate::memory::json::number_to_json;
use crate::memory::value::{format_number, Value};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Severity of a captured log call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
}

/// Frozen, serializable copy of a runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LogValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<LogValue>),
    Object(Vec<(String, LogValue)>),
    Function(String),
    Error { name: String, message: String },
    Element {
        element_type: String,
        props: Vec<(String, LogValue)>,
    },
    /// A reference back to a value that is still being captured
    Circular,
}

impl LogValue {
    /// Snapshot `value`, replacing back-references with [`LogValue::Circular`]
    pub fn capture(value: &Value) -> Self {
        Capture::default().value(value)
    }

    pub fn string(text: impl Into<String>) -> Self {
        LogValue::String(text.into())
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        LogValue::Error {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Arrays, objects and elements get the structured dump
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            LogValue::Array(_) | LogValue::Object(_) | LogValue::Element { .. }
        )
    }

    /// JSON form used by the structured dump. `None` for members that are
    /// omitted (functions, `undefined`).
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;
        Some(match self {
            LogValue::Undefined | LogValue::Function(_) => return None,
            LogValue::Null => Json::Null,
            LogValue::Bool(b) => Json::Bool(*b),
            LogValue::Number(n) => number_to_json(*n),
            LogValue::String(s) => Json::String(s.clone()),
            LogValue::Array(items) => Json::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(Json::Null))
                    .collect(),
            ),
            LogValue::Object(properties) => Json::Object(json_members(properties)),
            LogValue::Error { .. } => Json::Object(serde_json::Map::new()),
            LogValue::Element {
                element_type,
                props,
            } => {
                let mut object = serde_json::Map::new();
                object.insert("type".to_string(), Json::String(element_type.clone()));
                object.insert("props".to_string(), Json::Object(json_members(props)));
                Json::Object(object)
            }
            LogValue::Circular => Json::String("[Circular]".to_string()),
        })
    }

    /// Default text form: strings raw, numbers in script notation
    pub fn to_plain_text(&self) -> String {
        match self {
            LogValue::Undefined => "undefined".to_string(),
            LogValue::Null => "null".to_string(),
            LogValue::Bool(b) => b.to_string(),
            LogValue::Number(n) => format_number(*n),
            LogValue::String(s) => s.clone(),
            LogValue::Function(name) if name.is_empty() => "[Function (anonymous)]".to_string(),
            LogValue::Function(name) => format!("[Function: {}]", name),
            LogValue::Error { name, message } => format!("{}: {}", name, message),
            LogValue::Circular => "[Circular]".to_string(),
            LogValue::Array(_) | LogValue::Object(_) | LogValue::Element { .. } => {
                self.to_json()
                    .map(|json| json.to_string())
                    .unwrap_or_default()
            }
        }
    }
}

fn json_members(properties: &[(String, LogValue)]) -> serde_json::Map<String, serde_json::Value> {
    properties
        .iter()
        .filter_map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
        .collect()
}

/// Log panel formatting of one argument: errors as `name: message`,
/// structured values as an indented dump, everything else as plain text
impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_structured() {
            let dump = self
                .to_json()
                .and_then(|json| serde_json::to_string_pretty(&json).ok())
                .unwrap_or_default();
            f.write_str(&dump)
        } else {
            f.write_str(&self.to_plain_text())
        }
    }
}

#[derive(Default)]
struct Capture {
    /// Addresses of the arrays and objects currently being captured
    active: Vec<*const ()>,
}

impl Capture {
    fn value(&mut self, value: &Value) -> LogValue {
        match value {
            Value::Undefined => LogValue::Undefined,
            Value::Null => LogValue::Null,
            Value::Bool(b) => LogValue::Bool(*b),
            Value::Number(n) => LogValue::Number(*n),
            Value::String(s) => LogValue::String(s.to_string()),
            Value::Function(_) | Value::Native(_) => {
                LogValue::Function(value.function_name().unwrap_or_default().to_string())
            }
            Value::Error(error) => LogValue::error(&error.name, &error.message),
            Value::Array(items) => {
                let address = Rc::as_ptr(items) as *const ();
                if self.active.contains(&address) {
                    return LogValue::Circular;
                }
                self.active.push(address);
                let captured = items.borrow().iter().map(|item| self.value(item)).collect();
                self.active.pop();
                LogValue::Array(captured)
            }
            Value::Object(object) => {
                let address = Rc::as_ptr(object) as *const ();
                if self.active.contains(&address) {
                    return LogValue::Circular;
                }
                self.active.push(address);
                let captured = object
                    .borrow()
                    .iter()
                    .map(|(key, item)| (key.to_string(), self.value(item)))
                    .collect();
                self.active.pop();
                LogValue::Object(captured)
            }
            Value::Element(element) => {
                let address = Rc::as_ptr(element) as *const ();
                if self.active.contains(&address) {
                    return LogValue::Circular;
                }
                self.active.push(address);
                let element_type = match &element.element_type {
                    Value::String(tag) => tag.to_string(),
                    other => other.function_name().unwrap_or_default().to_string(),
                };
                let props = element
                    .props
                    .borrow()
                    .iter()
                    .map(|(key, item)| (key.to_string(), self.value(item)))
                    .collect();
                self.active.pop();
                LogValue::Element {
                    element_type,
                    props,
                }
            }
        }
    }
}

/// One captured console call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub arguments: Vec<LogValue>,
}

impl LogEntry {
    pub fn new(kind: LogKind, arguments: Vec<LogValue>) -> Self {
        Self { kind, arguments }
    }

    /// All arguments formatted for the log panel, joined with newlines
    pub fn text(&self) -> String {
        self.arguments
            .iter()
            .map(LogValue::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Ordered log of one playground instance
///
/// Cloning yields another handle to the same log; the sandbox console holds
/// one while the render pipeline reads through another.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    inner: Rc<LogStoreInner>,
}

#[derive(Debug, Default)]
struct LogStoreInner {
    entries: RefCell<Vec<LogEntry>>,
    resets: Cell<u64>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the log at the start of an attempt
    pub fn reset(&self) {
        self.inner.entries.borrow_mut().clear();
        self.inner.resets.set(self.inner.resets.get() + 1);
    }

    pub fn push(&self, entry: LogEntry) {
        self.inner.entries.borrow_mut().push(entry);
    }

    /// Copy of the entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Number of resets so far, one per attempt
    pub fn resets(&self) -> u64 {
        self.inner.resets.get()
    }
}

/// The `console` object handed to snippets
pub struct SandboxConsole {
    store: LogStore,
}

impl SandboxConsole {
    pub fn new(store: LogStore) -> Self {
        Self { store }
    }

    /// Append one entry built from the call arguments
    pub fn record(&self, kind: LogKind, args: &[Value]) {
        let arguments = args.iter().map(LogValue::capture).collect();
        self.store.push(LogEntry::new(kind, arguments));
    }

    /// Build the script-visible object: `log`, `info`, `debug`, `warn`, `error`
    pub fn into_value(self) -> Value {
        let console = Rc::new(self);
        let methods = [
            ("log", LogKind::Info),
            ("info", LogKind::Info),
            ("debug", LogKind::Info),
            ("warn", LogKind::Warning),
            ("error", LogKind::Error),
        ];
        Value::object(
            methods
                .into_iter()
                .map(|(name, kind)| {
                    let console = Rc::clone(&console);
                    let method = Value::native(name, move |_, _, args| {
                        console.record(kind, args);
                        Ok(Value::Undefined)
                    });
                    (name.to_string(), method)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Object;

    #[test]
    fn test_capture_freezes_value() {
        let items = Value::array(vec![Value::Number(1.0)]);
        let captured = LogValue::capture(&items);
        if let Value::Array(array) = &items {
            array.borrow_mut().push(Value::Number(2.0));
        }
        assert_eq!(captured, LogValue::Array(vec![LogValue::Number(1.0)]));
    }

    #[test]
    fn test_capture_detects_cycles() {
        let object = Value::object(Object::new());
        if let Value::Object(inner) = &object {
            inner.borrow_mut().set("self", object.clone());
        }
        let captured = LogValue::capture(&object);
        assert_eq!(
            captured,
            LogValue::Object(vec![("self".to_string(), LogValue::Circular)])
        );
        assert_eq!(captured.to_string(), "{\n  \"self\": \"[Circular]\"\n}");
        // break the cycle so the test does not leak
        if let Value::Object(inner) = &object {
            inner.borrow_mut().remove("self");
        }
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(LogValue::string("hi").to_string(), "hi");
        assert_eq!(LogValue::Number(2.0).to_string(), "2");
        assert_eq!(LogValue::Number(0.5).to_string(), "0.5");
        assert_eq!(LogValue::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(LogValue::Undefined.to_string(), "undefined");
        assert_eq!(LogValue::error("Error", "boom").to_string(), "Error: boom");
        assert_eq!(LogValue::error("TypeError", "").to_string(), "TypeError: ");
        assert_eq!(LogValue::Function("f".into()).to_string(), "[Function: f]");
        let object = LogValue::Object(vec![
            ("a".to_string(), LogValue::Number(1.0)),
            ("f".to_string(), LogValue::Function("f".into())),
            ("list".to_string(), LogValue::Array(vec![LogValue::Undefined])),
        ]);
        assert_eq!(object.to_string(), "{\n  \"a\": 1,\n  \"list\": [\n    null\n  ]\n}");
    }

    #[test]
    fn test_store_is_shared_between_handles() {
        let store = LogStore::new();
        let console = SandboxConsole::new(store.clone());
        console.record(LogKind::Warning, &[Value::string("careful")]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].kind, LogKind::Warning);

        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.resets(), 1);
    }

    #[test]
    fn test_entry_text_joins_arguments() {
        let entry = LogEntry::new(
            LogKind::Info,
            vec![LogValue::string("a"), LogValue::Bool(true)],
        );
        assert_eq!(entry.text(), "a\ntrue");
    }
}
