// AST definitions for the snippet dialect (before lowering)

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A type annotation, kept as normalized text. Annotations are never checked;
/// the transpiler erases them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub text: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Let,
    Const,
    Var,
}

/// Binding pattern used by declarations, parameters and `catch` clauses
#[derive(Debug, Clone)]
pub enum Pattern {
    Identifier(String),
    Object {
        properties: Vec<PatternProperty>,
        rest: Option<String>,
    },
    Array {
        elements: Vec<Option<PatternElement>>, // None for holes: `[a, , b]`
        rest: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct PatternProperty {
    pub key: String,
    pub value: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct PatternElement {
    pub pattern: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub pattern: Pattern,
    pub annotation: Option<TypeAnnotation>,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub pattern: Pattern,
    pub annotation: Option<TypeAnnotation>,
    pub default: Option<Expr>,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expression(Box<Expr>),
}

/// Function declaration, function expression or arrow function
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnnotation>,
    pub body: FunctionBody,
    pub is_arrow: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Stmt>,
}

/// What an `import` declaration brought in; recorded only so the transpiler
/// can report what it stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub names: Vec<String>,
    pub source: String,
    pub type_only: bool,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Import {
        decl: ImportDecl,
        location: SourceLocation,
    },
    /// `interface Name { .. }` or `type Name = ..`
    TypeDecl {
        name: String,
        location: SourceLocation,
    },
    VarDecl {
        kind: VarKind,
        declarations: Vec<Declarator>,
        location: SourceLocation,
    },
    Function(FunctionDef),
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        location: SourceLocation,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
        location: SourceLocation,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
        location: SourceLocation,
    },
    ForOf {
        kind: VarKind,
        pattern: Pattern,
        iterable: Expr,
        body: Box<Stmt>,
        location: SourceLocation,
    },
    ForIn {
        kind: VarKind,
        pattern: Pattern,
        object: Expr,
        body: Box<Stmt>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Throw {
        value: Expr,
        location: SourceLocation,
    },
    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
        location: SourceLocation,
    },
    Block {
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Expression {
        expr: Expr,
        location: SourceLocation,
    },
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    InstanceOf,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Assignment operators. Compound forms carry the operator they apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
    Logical(LogicalOp),
}

#[derive(Debug, Clone)]
pub enum ArrayElement {
    Item(Expr),
    Spread(Expr),
    Hole,
}

#[derive(Debug, Clone)]
pub enum PropertyKey {
    Named(String),
    Computed(Expr),
}

#[derive(Debug, Clone)]
pub enum ObjectProperty {
    KeyValue { key: PropertyKey, value: Expr },
    Shorthand(String),
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum Argument {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64, SourceLocation),
    String(String, SourceLocation),
    Template {
        quasis: Vec<String>,
        expressions: Vec<Expr>,
        location: SourceLocation,
    },
    Bool(bool, SourceLocation),
    Null(SourceLocation),
    Undefined(SourceLocation),
    Identifier(String, SourceLocation),
    This(SourceLocation),
    Array {
        elements: Vec<ArrayElement>,
        location: SourceLocation,
    },
    Object {
        properties: Vec<ObjectProperty>,
        location: SourceLocation,
    },
    Function(Box<FunctionDef>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
        location: SourceLocation,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
        location: SourceLocation,
    },
    Conditional {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
        location: SourceLocation,
    },
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
        location: SourceLocation,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
        location: SourceLocation,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Argument>,
        optional: bool,
        location: SourceLocation,
    },
    New {
        callee: Box<Expr>,
        arguments: Vec<Argument>,
        location: SourceLocation,
    },
    /// `expr as T`, `expr satisfies T` and the postfix non-null assertion `expr!`
    TypeAssertion {
        expr: Box<Expr>,
        annotation: Option<TypeAnnotation>,
        location: SourceLocation,
    },
    Markup(Box<MarkupElement>),
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Number(_, loc)
            | Expr::String(_, loc)
            | Expr::Bool(_, loc)
            | Expr::Null(loc)
            | Expr::Undefined(loc)
            | Expr::Identifier(_, loc)
            | Expr::This(loc) => *loc,
            Expr::Template { location, .. }
            | Expr::Array { location, .. }
            | Expr::Object { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Update { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Logical { location, .. }
            | Expr::Assign { location, .. }
            | Expr::Conditional { location, .. }
            | Expr::Member { location, .. }
            | Expr::Index { location, .. }
            | Expr::Call { location, .. }
            | Expr::New { location, .. }
            | Expr::TypeAssertion { location, .. } => *location,
            Expr::Function(def) => def.location,
            Expr::Markup(element) => element.location,
        }
    }

    /// Whether this expression may appear on the left of `=` or as the
    /// operand of `++`/`--`
    pub fn is_assignment_target(&self) -> bool {
        match self {
            Expr::Identifier(..) | Expr::Member { .. } | Expr::Index { .. } => true,
            Expr::TypeAssertion { expr, .. } => expr.is_assignment_target(),
            _ => false,
        }
    }
}

/// Tag name of a markup element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupName {
    /// Lowercase or hyphenated name: rendered by the host (`div`, `my-box`)
    Intrinsic(String),
    /// Capitalized or dotted name: a component reference (`Counter`, `Ui.Card`)
    Component(Vec<String>),
}

impl fmt::Display for MarkupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupName::Intrinsic(name) => write!(f, "{}", name),
            MarkupName::Component(path) => write!(f, "{}", path.join(".")),
        }
    }
}

#[derive(Debug, Clone)]
pub enum MarkupAttribute {
    Named { name: String, value: Option<Expr> },
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum MarkupChild {
    Text(String),
    Expression(Expr),
    Element(MarkupElement),
}

/// `<name attrs>children</name>`; `name` is `None` for fragments (`<>..</>`)
#[derive(Debug, Clone)]
pub struct MarkupElement {
    pub name: Option<MarkupName>,
    pub attributes: Vec<MarkupAttribute>,
    pub children: Vec<MarkupChild>,
    pub location: SourceLocation,
}

/// A parsed snippet
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
