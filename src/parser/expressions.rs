//! Expression parsing implementation
//!
//! One method per precedence level, lowest first:
//!
//! - Assignment (`=`, compound and logical assignment) and arrow functions
//! - Conditional `? :`
//! - Nullish `??`, logical `||`, logical `&&`
//! - Equality, relational (including `instanceof`, `in`, `as`, `satisfies`)
//! - Additive, multiplicative, exponent (right-associative)
//! - Unary and prefix update, postfix update
//! - Calls, member access, optional chaining, indexing, `new`
//! - Primary: literals, identifiers, groups, array/object literals,
//!   function expressions, template literals and markup
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{TemplatePart, TokenKind};
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_assignment()?;
        if self.check(&TokenKind::Comma) {
            return self.error("Comma expressions are not supported");
        }
        Ok(expr)
    }

    /// Parse assignment, arrow function or conditional (right-associative)
    pub(crate) fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> Result<Expr, ParseError> {
        if let Some(arrow) = self.try_parse_arrow_function()? {
            return Ok(arrow);
        }

        let target = self.parse_conditional()?;
        if matches!(self.current.kind, TokenKind::Amp | TokenKind::Pipe) {
            return self.error(format!(
                "Bitwise operator {} is not supported in snippets",
                self.current.kind
            ));
        }
        let location = self.current_location();

        let op = match self.current.kind {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Compound(BinaryOp::Add),
            TokenKind::MinusEq => AssignOp::Compound(BinaryOp::Sub),
            TokenKind::StarEq => AssignOp::Compound(BinaryOp::Mul),
            TokenKind::SlashEq => AssignOp::Compound(BinaryOp::Div),
            TokenKind::PercentEq => AssignOp::Compound(BinaryOp::Mod),
            TokenKind::StarStarEq => AssignOp::Compound(BinaryOp::Pow),
            TokenKind::AndAndEq => AssignOp::Logical(LogicalOp::And),
            TokenKind::OrOrEq => AssignOp::Logical(LogicalOp::Or),
            TokenKind::Question2Eq => AssignOp::Logical(LogicalOp::Nullish),
            _ => return Ok(target),
        };

        if !target.is_assignment_target() {
            return self.error("Invalid left-hand side in assignment");
        }
        self.advance()?;
        let value = self.parse_assignment()?;

        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
            location,
        })
    }

    /// Recognize `x => ..` and `(params): T => ..`; anything else leaves the
    /// parser where it was
    fn try_parse_arrow_function(&mut self) -> Result<Option<Expr>, ParseError> {
        let location = self.current_location();

        if let TokenKind::Ident(name) = self.current.kind.clone() {
            if self.peek_next()? != TokenKind::Arrow {
                return Ok(None);
            }
            self.advance()?; // name
            self.advance()?; // =>
            let params = vec![Param {
                pattern: Pattern::Identifier(name),
                annotation: None,
                default: None,
                optional: false,
                rest: false,
            }];
            return self.parse_arrow_body(params, None, location).map(Some);
        }

        if !self.check(&TokenKind::LParen) {
            return Ok(None);
        }

        let checkpoint = self.checkpoint();
        let head = self.parse_parameter_list().and_then(|params| {
            let return_type = self.parse_optional_annotation()?;
            Ok((params, return_type))
        });
        match head {
            Ok((params, return_type)) if self.check(&TokenKind::Arrow) => {
                self.advance()?;
                self.parse_arrow_body(params, return_type, location).map(Some)
            }
            _ => {
                self.restore(checkpoint);
                Ok(None)
            }
        }
    }

    fn parse_arrow_body(
        &mut self,
        params: Vec<Param>,
        return_type: Option<TypeAnnotation>,
        location: SourceLocation,
    ) -> Result<Expr, ParseError> {
        let body = if self.check(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };

        Ok(Expr::Function(Box::new(FunctionDef {
            name: None,
            type_params: Vec::new(),
            params,
            return_type,
            body,
            is_arrow: true,
            location,
        })))
    }

    /// Parse conditional: condition ? consequent : alternate
    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_nullish()?;

        if self.check(&TokenKind::Question) {
            let location = self.advance()?.location;
            let consequent = self.parse_assignment()?;
            self.expect_token(&TokenKind::Colon, "Expected ':' in conditional expression")?;
            let alternate = self.parse_assignment()?;

            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
                location,
            });
        }

        Ok(condition)
    }

    /// Parse nullish coalescing (??)
    fn parse_nullish(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_or()?;

        while self.check(&TokenKind::Question2) {
            let location = self.advance()?.location;
            let right = self.parse_logical_or()?;
            left = Expr::Logical {
                op: LogicalOp::Nullish,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;

        while self.check(&TokenKind::OrOr) {
            let location = self.advance()?.location;
            let right = self.parse_logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AndAnd) {
            let location = self.advance()?.location;
            let right = self.parse_equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse equality (== != === !==)
    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                TokenKind::NotEqEq => BinaryOp::StrictNe,
                _ => break,
            };
            let location = self.advance()?.location;
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse relational (< <= > >= instanceof in) and the type operators
    /// `as` / `satisfies`, which share this precedence
    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            if (self.check_ident("as") || self.check_ident("satisfies"))
                && !self.current.newline_before
            {
                let location = self.advance()?.location;
                let annotation = self.parse_type_annotation()?;
                left = Expr::TypeAssertion {
                    expr: Box::new(left),
                    annotation: Some(annotation),
                    location,
                };
                continue;
            }

            if let Some(shift) = self.shift_operator()? {
                return self.error(format!("Bitwise operator '{}' is not supported in snippets", shift));
            }

            let op = match self.current.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                TokenKind::InstanceOf => BinaryOp::InstanceOf,
                TokenKind::In => BinaryOp::In,
                _ => break,
            };
            let location = self.advance()?.location;
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// `<<` and `>>` lex as two comparison tokens
    fn shift_operator(&mut self) -> Result<Option<&'static str>, ParseError> {
        Ok(match self.current.kind.clone() {
            TokenKind::Lt if matches!(self.peek_next()?, TokenKind::Lt | TokenKind::Le) => Some("<<"),
            TokenKind::Gt if matches!(self.peek_next()?, TokenKind::Gt | TokenKind::Ge) => Some(">>"),
            _ => None,
        })
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let location = self.advance()?.location;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let location = self.advance()?.location;
            let right = self.parse_exponent()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse exponent (**), right-associative
    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;

        if self.check(&TokenKind::StarStar) {
            let location = self.advance()?.location;
            let exponent = self.parse_exponent()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
                location,
            });
        }

        Ok(base)
    }

    /// Parse unary (! - + typeof void ++ --)
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        let op = match self.current.kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::TypeOf => Some(UnaryOp::TypeOf),
            TokenKind::Void => Some(UnaryOp::Void),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                location,
            });
        }

        let update = match self.current.kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance()?;
            let target = self.nested(Self::parse_unary)?;
            if !target.is_assignment_target() {
                return Err(ParseError {
                    message: "Invalid left-hand side expression in prefix operation".to_string(),
                    location,
                });
            }
            return Ok(Expr::Update {
                op,
                prefix: true,
                target: Box::new(target),
                location,
            });
        }

        self.parse_postfix()
    }

    /// Parse postfix (++ --); a line break before the operator ends the
    /// expression instead
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_call()?;

        let op = match self.current.kind {
            TokenKind::PlusPlus if !self.current.newline_before => UpdateOp::Increment,
            TokenKind::MinusMinus if !self.current.newline_before => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        if !expr.is_assignment_target() {
            return self.error("Invalid left-hand side expression in postfix operation");
        }
        let location = self.advance()?.location;

        Ok(Expr::Update {
            op,
            prefix: false,
            target: Box::new(expr),
            location,
        })
    }

    /// Parse calls and member access (. ?. [] () !)
    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            let location = self.current_location();

            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let property = self.expect_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: false,
                        location,
                    };
                }
                TokenKind::QuestionDot => {
                    self.advance()?;
                    expr = match self.current.kind {
                        TokenKind::LParen => {
                            let arguments = self.parse_arguments()?;
                            Expr::Call {
                                callee: Box::new(expr),
                                arguments,
                                optional: true,
                                location,
                            }
                        }
                        TokenKind::LBracket => {
                            self.advance()?;
                            let index = self.parse_expression()?;
                            self.expect_token(&TokenKind::RBracket, "Expected ']' after index")?;
                            Expr::Index {
                                object: Box::new(expr),
                                index: Box::new(index),
                                optional: true,
                                location,
                            }
                        }
                        _ => Expr::Member {
                            object: Box::new(expr),
                            property: self.expect_property_name()?,
                            optional: true,
                            location,
                        },
                    };
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.expect_token(&TokenKind::RBracket, "Expected ']' after index")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: false,
                        location,
                    };
                }
                // A call on the next line still continues the expression, as
                // it does in the language this dialect follows
                TokenKind::LParen => {
                    let arguments = self.parse_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        arguments,
                        optional: false,
                        location,
                    };
                }
                TokenKind::Bang if !self.current.newline_before => {
                    self.advance()?;
                    expr = Expr::TypeAssertion {
                        expr: Box::new(expr),
                        annotation: None,
                        location,
                    };
                }
                TokenKind::Template(_) => {
                    return self.error("Tagged templates are not supported");
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse `new Callee(args)`; the callee is a member expression without calls
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let location = self.advance()?.location; // 'new'

        let mut callee = self.parse_primary()?;
        loop {
            let member_location = self.current_location();
            if self.match_token(&TokenKind::Dot)? {
                let property = self.expect_property_name()?;
                callee = Expr::Member {
                    object: Box::new(callee),
                    property,
                    optional: false,
                    location: member_location,
                };
            } else if self.match_token(&TokenKind::LBracket)? {
                let index = self.parse_expression()?;
                self.expect_token(&TokenKind::RBracket, "Expected ']' after index")?;
                callee = Expr::Index {
                    object: Box::new(callee),
                    index: Box::new(index),
                    optional: false,
                    location: member_location,
                };
            } else {
                break;
            }
        }

        let arguments = if self.check(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expr::New {
            callee: Box::new(callee),
            arguments,
            location,
        })
    }

    /// Parse argument list: (expr, ...spread, ...)
    pub(crate) fn parse_arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        self.expect_lparen("to start arguments")?;
        let mut arguments = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if self.match_token(&TokenKind::Ellipsis)? {
                arguments.push(Argument::Spread(self.parse_assignment()?));
            } else {
                arguments.push(Argument::Item(self.parse_assignment()?));
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        self.expect_rparen("after arguments")?;
        Ok(arguments)
    }

    /// Parse primary (literals, identifiers, groups, literals, markup)
    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        match self.current.kind.clone() {
            TokenKind::Number(n) => {
                self.advance()?;
                Ok(Expr::Number(n, location))
            }
            TokenKind::String(s) => {
                self.advance()?;
                Ok(Expr::String(s, location))
            }
            TokenKind::Template(parts) => {
                self.advance()?;
                self.parse_template(parts, location)
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Expr::Bool(true, location))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Expr::Bool(false, location))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::Null(location))
            }
            TokenKind::Undefined => {
                self.advance()?;
                Ok(Expr::Undefined(location))
            }
            TokenKind::This => {
                self.advance()?;
                Ok(Expr::This(location))
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                Ok(Expr::Identifier(name, location))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Function => {
                let def = self.parse_function(false)?;
                Ok(Expr::Function(Box::new(def)))
            }
            TokenKind::Lt => {
                let element = self.parse_markup()?;
                // parse_markup stops on the final '>' of the element
                self.advance()?;
                Ok(Expr::Markup(Box::new(element)))
            }
            TokenKind::Slash | TokenKind::SlashEq => {
                self.error("Regular expression literals are not supported")
            }
            TokenKind::Import => self.error("Dynamic import is not supported in snippets"),
            TokenKind::Reserved(word) => self.error(format!("'{}' is not supported in snippets", word)),
            _ => self.error(format!("Unexpected token: {}", self.current.kind)),
        }
    }

    fn parse_template(
        &mut self,
        parts: Vec<TemplatePart>,
        location: SourceLocation,
    ) -> Result<Expr, ParseError> {
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();

        for part in parts {
            match part {
                TemplatePart::Text(text) => quasis.push(text),
                TemplatePart::Expr(source, start) => {
                    let mut parser = Parser::starting_at(&source, start, self.nesting)?;
                    let expr = parser.parse_expression()?;
                    if !parser.is_at_end() {
                        return parser.error(format!(
                            "Unexpected {} in template substitution",
                            parser.current.kind
                        ));
                    }
                    expressions.push(expr);
                }
            }
        }

        Ok(Expr::Template {
            quasis,
            expressions,
            location,
        })
    }

    /// Parse `[a, , ...b]`
    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let location = self.advance()?.location; // '['
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) {
            if self.check(&TokenKind::Comma) {
                self.advance()?;
                elements.push(ArrayElement::Hole);
                continue;
            }
            if self.match_token(&TokenKind::Ellipsis)? {
                elements.push(ArrayElement::Spread(self.parse_assignment()?));
            } else {
                elements.push(ArrayElement::Item(self.parse_assignment()?));
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        self.expect_token(&TokenKind::RBracket, "Expected ']' after array elements")?;
        Ok(Expr::Array { elements, location })
    }

    /// Parse `{ a, b: 1, [k]: v, ...rest, method() {} }`
    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let location = self.advance()?.location; // '{'
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            if self.match_token(&TokenKind::Ellipsis)? {
                properties.push(ObjectProperty::Spread(self.parse_assignment()?));
            } else {
                properties.push(self.parse_object_property()?);
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        self.expect_rbrace("after object properties")?;
        Ok(Expr::Object {
            properties,
            location,
        })
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty, ParseError> {
        let location = self.current_location();

        let key = match self.current.kind.clone() {
            TokenKind::LBracket => {
                self.advance()?;
                let key = self.parse_assignment()?;
                self.expect_token(&TokenKind::RBracket, "Expected ']' after computed key")?;
                PropertyKey::Computed(key)
            }
            TokenKind::String(s) => {
                self.advance()?;
                PropertyKey::Named(s)
            }
            TokenKind::Number(n) => {
                self.advance()?;
                PropertyKey::Named(crate::memory::value::format_number(n))
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                if self.check(&TokenKind::Comma) || self.check(&TokenKind::RBrace) {
                    return Ok(ObjectProperty::Shorthand(name));
                }
                if (name == "get" || name == "set") && !self.check(&TokenKind::Colon) && !self.check(&TokenKind::LParen) {
                    return self.error("Getters and setters are not supported");
                }
                PropertyKey::Named(name)
            }
            _ => PropertyKey::Named(self.expect_property_name()?),
        };

        // method shorthand: `name(args) { .. }`
        if self.check(&TokenKind::LParen) || self.check(&TokenKind::Lt) {
            let type_params = if self.check(&TokenKind::Lt) {
                self.parse_type_parameters()?
            } else {
                Vec::new()
            };
            let params = self.parse_parameter_list()?;
            let return_type = self.parse_optional_annotation()?;
            let body = FunctionBody::Block(self.parse_function_body()?);
            let name = match &key {
                PropertyKey::Named(name) => Some(name.clone()),
                PropertyKey::Computed(_) => None,
            };
            let value = Expr::Function(Box::new(FunctionDef {
                name,
                type_params,
                params,
                return_type,
                body,
                is_arrow: false,
                location,
            }));
            return Ok(ObjectProperty::KeyValue { key, value });
        }

        self.expect_token(&TokenKind::Colon, "Expected ':' after property name")?;
        let value = self.parse_assignment()?;
        Ok(ObjectProperty::KeyValue { key, value })
    }
}
