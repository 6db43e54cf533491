//! Lowering from the snippet AST to the executable [`Script`]
//!
//! Erases imports, exports, type declarations and type assertions, turns
//! markup into factory calls and normalizes `var` to `let`. Parsing has
//! already rejected everything that cannot be lowered, so this never fails.

use super::script::{self, Script};
use super::TranspileOptions;
use crate::parser::ast;
use std::rc::Rc;

pub(crate) struct Lowerer<'a> {
    options: &'a TranspileOptions,
    stripped_imports: Vec<String>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(options: &'a TranspileOptions) -> Self {
        Self {
            options,
            stripped_imports: Vec::new(),
        }
    }

    pub(crate) fn lower_program(mut self, program: ast::Program) -> Script {
        let body = self.lower_statements(program.body);
        Script {
            body,
            stripped_imports: self.stripped_imports,
        }
    }

    fn lower_statements(&mut self, statements: Vec<ast::Stmt>) -> Vec<script::Stmt> {
        statements
            .into_iter()
            .filter_map(|stmt| self.lower_statement(stmt))
            .collect()
    }

    /// Lower one statement; `None` for statements that erase completely
    fn lower_statement(&mut self, stmt: ast::Stmt) -> Option<script::Stmt> {
        let lowered = match stmt {
            ast::Stmt::Import { decl, .. } => {
                self.stripped_imports.push(decl.source);
                return None;
            }
            ast::Stmt::TypeDecl { .. } | ast::Stmt::Empty => return None,
            ast::Stmt::VarDecl {
                kind, declarations, ..
            } => script::Stmt::Declare {
                kind: binding_kind(kind),
                declarations: declarations
                    .into_iter()
                    .map(|d| {
                        let pattern = self.lower_pattern(d.pattern);
                        let init = d.init.map(|e| self.lower_expr(e));
                        let init = match &pattern {
                            script::Pattern::Identifier(name) => init.map(|e| name_anonymous_function(name, e)),
                            _ => init,
                        };
                        script::Declarator { pattern, init }
                    })
                    .collect(),
            },
            ast::Stmt::Function(def) => script::Stmt::Function(self.lower_function(def)),
            ast::Stmt::Return { value, .. } => script::Stmt::Return(value.map(|e| self.lower_expr(e))),
            ast::Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => script::Stmt::If {
                condition: self.lower_expr(condition),
                then_branch: Box::new(self.lower_nested(*then_branch)),
                else_branch: else_branch.map(|s| Box::new(self.lower_nested(*s))),
            },
            ast::Stmt::While {
                condition, body, ..
            } => script::Stmt::While {
                condition: self.lower_expr(condition),
                body: Box::new(self.lower_nested(*body)),
            },
            ast::Stmt::DoWhile {
                body, condition, ..
            } => script::Stmt::DoWhile {
                body: Box::new(self.lower_nested(*body)),
                condition: self.lower_expr(condition),
            },
            ast::Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => script::Stmt::For {
                init: init.and_then(|s| self.lower_statement(*s)).map(Box::new),
                condition: condition.map(|e| self.lower_expr(e)),
                update: update.map(|e| self.lower_expr(e)),
                body: Box::new(self.lower_nested(*body)),
            },
            ast::Stmt::ForOf {
                kind,
                pattern,
                iterable,
                body,
                ..
            } => script::Stmt::ForOf {
                kind: binding_kind(kind),
                pattern: self.lower_pattern(pattern),
                iterable: self.lower_expr(iterable),
                body: Box::new(self.lower_nested(*body)),
            },
            ast::Stmt::ForIn {
                kind,
                pattern,
                object,
                body,
                ..
            } => script::Stmt::ForIn {
                kind: binding_kind(kind),
                pattern: self.lower_pattern(pattern),
                object: self.lower_expr(object),
                body: Box::new(self.lower_nested(*body)),
            },
            ast::Stmt::Break { .. } => script::Stmt::Break,
            ast::Stmt::Continue { .. } => script::Stmt::Continue,
            ast::Stmt::Throw { value, .. } => script::Stmt::Throw(self.lower_expr(value)),
            ast::Stmt::Try {
                block,
                handler,
                finalizer,
                ..
            } => script::Stmt::Try {
                block: self.lower_statements(block),
                handler: handler.map(|h| script::CatchClause {
                    param: h.param.map(|p| self.lower_pattern(p)),
                    body: self.lower_statements(h.body),
                }),
                finalizer: finalizer.map(|f| self.lower_statements(f)),
            },
            ast::Stmt::Block { body, .. } => script::Stmt::Block(self.lower_statements(body)),
            ast::Stmt::Expression { expr, .. } => script::Stmt::Expression(self.lower_expr(expr)),
        };
        Some(lowered)
    }

    /// Loop and branch bodies must stay statements even when they erase
    fn lower_nested(&mut self, stmt: ast::Stmt) -> script::Stmt {
        self.lower_statement(stmt)
            .unwrap_or_else(|| script::Stmt::Block(Vec::new()))
    }

    fn lower_function(&mut self, def: ast::FunctionDef) -> Rc<script::Function> {
        let params = def
            .params
            .into_iter()
            .map(|p| script::Param {
                pattern: self.lower_pattern(p.pattern),
                default: p.default.map(|e| self.lower_expr(e)),
                rest: p.rest,
            })
            .collect();
        let body = match def.body {
            ast::FunctionBody::Block(stmts) => script::FunctionBody::Block(self.lower_statements(stmts)),
            ast::FunctionBody::Expression(expr) => script::FunctionBody::Expression(self.lower_expr(*expr)),
        };

        Rc::new(script::Function {
            name: def.name,
            params,
            body,
            is_arrow: def.is_arrow,
        })
    }

    fn lower_pattern(&mut self, pattern: ast::Pattern) -> script::Pattern {
        match pattern {
            ast::Pattern::Identifier(name) => script::Pattern::Identifier(name),
            ast::Pattern::Object { properties, rest } => script::Pattern::Object {
                properties: properties
                    .into_iter()
                    .map(|p| script::PatternProperty {
                        key: p.key,
                        value: self.lower_pattern(p.value),
                        default: p.default.map(|e| self.lower_expr(e)),
                    })
                    .collect(),
                rest,
            },
            ast::Pattern::Array { elements, rest } => script::Pattern::Array {
                elements: elements
                    .into_iter()
                    .map(|element| {
                        element.map(|e| script::PatternElement {
                            pattern: self.lower_pattern(e.pattern),
                            default: e.default.map(|d| self.lower_expr(d)),
                        })
                    })
                    .collect(),
                rest,
            },
        }
    }

    fn lower_boxed(&mut self, expr: ast::Expr) -> Box<script::Expr> {
        Box::new(self.lower_expr(expr))
    }

    fn lower_arguments(&mut self, arguments: Vec<ast::Argument>) -> Vec<script::Argument> {
        arguments
            .into_iter()
            .map(|arg| match arg {
                ast::Argument::Item(e) => script::Argument::Item(self.lower_expr(e)),
                ast::Argument::Spread(e) => script::Argument::Spread(self.lower_expr(e)),
            })
            .collect()
    }

    fn lower_expr(&mut self, expr: ast::Expr) -> script::Expr {
        match expr {
            ast::Expr::Number(n, _) => script::Expr::Number(n),
            ast::Expr::String(s, _) => script::Expr::String(s),
            ast::Expr::Template {
                quasis, expressions, ..
            } => script::Expr::Template {
                quasis,
                expressions: expressions.into_iter().map(|e| self.lower_expr(e)).collect(),
            },
            ast::Expr::Bool(b, _) => script::Expr::Bool(b),
            ast::Expr::Null(_) => script::Expr::Null,
            ast::Expr::Undefined(_) => script::Expr::Undefined,
            ast::Expr::Identifier(name, _) => script::Expr::Identifier(name),
            ast::Expr::This(_) => script::Expr::This,
            ast::Expr::Array { elements, .. } => script::Expr::Array(
                elements
                    .into_iter()
                    .map(|element| match element {
                        ast::ArrayElement::Item(e) => script::ArrayElement::Item(self.lower_expr(e)),
                        ast::ArrayElement::Spread(e) => script::ArrayElement::Spread(self.lower_expr(e)),
                        ast::ArrayElement::Hole => script::ArrayElement::Hole,
                    })
                    .collect(),
            ),
            ast::Expr::Object { properties, .. } => script::Expr::Object(
                properties
                    .into_iter()
                    .map(|property| match property {
                        ast::ObjectProperty::KeyValue { key, value } => script::ObjectProperty::KeyValue {
                            key: match key {
                                ast::PropertyKey::Named(name) => script::PropertyKey::Named(name),
                                ast::PropertyKey::Computed(e) => script::PropertyKey::Computed(self.lower_expr(e)),
                            },
                            value: self.lower_expr(value),
                        },
                        ast::ObjectProperty::Shorthand(name) => script::ObjectProperty::KeyValue {
                            key: script::PropertyKey::Named(name.clone()),
                            value: script::Expr::Identifier(name),
                        },
                        ast::ObjectProperty::Spread(e) => script::ObjectProperty::Spread(self.lower_expr(e)),
                    })
                    .collect(),
            ),
            ast::Expr::Function(def) => script::Expr::Function(self.lower_function(*def)),
            ast::Expr::Unary { op, operand, .. } => script::Expr::Unary {
                op,
                operand: self.lower_boxed(*operand),
            },
            ast::Expr::Update {
                op, prefix, target, ..
            } => script::Expr::Update {
                op,
                prefix,
                target: self.lower_boxed(*target),
            },
            ast::Expr::Binary {
                op, left, right, ..
            } => script::Expr::Binary {
                op,
                left: self.lower_boxed(*left),
                right: self.lower_boxed(*right),
            },
            ast::Expr::Logical {
                op, left, right, ..
            } => script::Expr::Logical {
                op,
                left: self.lower_boxed(*left),
                right: self.lower_boxed(*right),
            },
            ast::Expr::Assign {
                op, target, value, ..
            } => script::Expr::Assign {
                op,
                target: self.lower_boxed(*target),
                value: self.lower_boxed(*value),
            },
            ast::Expr::Conditional {
                condition,
                consequent,
                alternate,
                ..
            } => script::Expr::Conditional {
                condition: self.lower_boxed(*condition),
                consequent: self.lower_boxed(*consequent),
                alternate: self.lower_boxed(*alternate),
            },
            ast::Expr::Member {
                object,
                property,
                optional,
                ..
            } => script::Expr::Member {
                object: self.lower_boxed(*object),
                property,
                optional,
            },
            ast::Expr::Index {
                object,
                index,
                optional,
                ..
            } => script::Expr::Index {
                object: self.lower_boxed(*object),
                index: self.lower_boxed(*index),
                optional,
            },
            ast::Expr::Call {
                callee,
                arguments,
                optional,
                ..
            } => script::Expr::Call {
                callee: self.lower_boxed(*callee),
                arguments: self.lower_arguments(arguments),
                optional,
            },
            ast::Expr::New {
                callee, arguments, ..
            } => script::Expr::New {
                callee: self.lower_boxed(*callee),
                arguments: self.lower_arguments(arguments),
            },
            ast::Expr::TypeAssertion { expr, .. } => self.lower_expr(*expr),
            ast::Expr::Markup(element) => self.lower_markup(*element),
        }
    }

    /// `<tag a="x" {...s}>text</tag>` → `factory("tag", {a: "x", ...s}, "text")`
    fn lower_markup(&mut self, element: ast::MarkupElement) -> script::Expr {
        let element_type = match element.name {
            None => script::Expr::dotted_path(&self.options.fragment_factory),
            Some(ast::MarkupName::Intrinsic(name)) => script::Expr::String(name),
            Some(ast::MarkupName::Component(path)) => script::Expr::dotted_path(&path.join(".")),
        };

        let props = if element.attributes.is_empty() {
            script::Expr::Null
        } else {
            script::Expr::Object(
                element
                    .attributes
                    .into_iter()
                    .map(|attribute| match attribute {
                        ast::MarkupAttribute::Named { name, value } => script::ObjectProperty::KeyValue {
                            key: script::PropertyKey::Named(name),
                            value: match value {
                                Some(expr) => self.lower_expr(expr),
                                None => script::Expr::Bool(true),
                            },
                        },
                        ast::MarkupAttribute::Spread(expr) => script::ObjectProperty::Spread(self.lower_expr(expr)),
                    })
                    .collect(),
            )
        };

        let mut arguments = vec![script::Argument::Item(element_type), script::Argument::Item(props)];
        for child in element.children {
            match child {
                ast::MarkupChild::Text(text) => {
                    if let Some(text) = clean_markup_text(&text) {
                        arguments.push(script::Argument::Item(script::Expr::String(text)));
                    }
                }
                ast::MarkupChild::Expression(expr) => {
                    arguments.push(script::Argument::Item(self.lower_expr(expr)));
                }
                ast::MarkupChild::Element(child) => {
                    arguments.push(script::Argument::Item(self.lower_markup(child)));
                }
            }
        }

        script::Expr::Call {
            callee: Box::new(script::Expr::dotted_path(&self.options.markup_factory)),
            arguments,
            optional: false,
        }
    }
}

fn binding_kind(kind: ast::VarKind) -> script::BindingKind {
    match kind {
        ast::VarKind::Const => script::BindingKind::Const,
        ast::VarKind::Let | ast::VarKind::Var => script::BindingKind::Let,
    }
}

/// Apply the markup whitespace rule: trim each line (keeping spaces at the
/// outer edges of the first and last line), drop blank lines, join the rest
/// with single spaces. `None` when nothing is left.
pub(crate) fn clean_markup_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let last_line = lines.len().saturating_sub(1);
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| !c.is_whitespace()))
        .unwrap_or(0);

    let mut text = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if i != last_line {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if trimmed.is_empty() {
            continue;
        }
        text.push_str(&trimmed);
        if i != last_non_empty {
            text.push(' ');
        }
    }

    if text.is_empty() {
        None
    } else {
        Some(decode_entities(&text))
    }
}

/// `const Card = () => ..` names the function `Card`
fn name_anonymous_function(name: &str, init: script::Expr) -> script::Expr {
    match init {
        script::Expr::Function(function) if function.name.is_none() => match Rc::try_unwrap(function) {
            Ok(mut function) => {
                function.name = Some(name.to_string());
                script::Expr::Function(Rc::new(function))
            }
            Err(function) => script::Expr::Function(function),
        },
        other => other,
    }
}

/// The handful of named character references snippets commonly use
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#123;", "{")
        .replace("&#125;", "}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::clean_markup_text;

    #[test]
    fn test_single_line_text_keeps_inner_spaces() {
        assert_eq!(clean_markup_text("Hello "), Some("Hello ".to_string()));
        assert_eq!(clean_markup_text(" a  b "), Some(" a  b ".to_string()));
    }

    #[test]
    fn test_multiline_text_is_joined() {
        assert_eq!(
            clean_markup_text("\n    first line\n    second line\n  "),
            Some("first line second line".to_string())
        );
    }

    #[test]
    fn test_whitespace_only_with_newline_is_dropped() {
        assert_eq!(clean_markup_text("\n   \n  "), None);
        assert_eq!(clean_markup_text(""), None);
    }

    #[test]
    fn test_entities() {
        assert_eq!(clean_markup_text("a &lt; b &amp;&amp; c"), Some("a < b && c".to_string()));
    }
}
