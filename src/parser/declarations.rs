//! Declaration parsing implementation
//!
//! This module handles parsing of declarations:
//!
//! - Variables: `let`, `const`, `var` with binding patterns and annotations
//! - Functions: declarations and expressions, parameters, bodies
//! - Binding patterns: `{ a, b: c = 1, ...rest }` and `[a, , b, ...rest]`
//! - Module syntax: `import` and `export` forms
//! - Type declarations: `interface` and `type` aliases
//!
//! # Grammar
//!
//! ```text
//! var_decl     ::= ("let" | "const" | "var") declarator ("," declarator)*
//! declarator   ::= pattern "!"? (":" type)? ("=" assignment)?
//! function     ::= "function" identifier? type_params? "(" params ")" (":" type)? block
//! param        ::= "..."? pattern "?"? (":" type)? ("=" assignment)?
//! pattern      ::= identifier | object_pattern | array_pattern
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse the declarators after `let`/`const`/`var` (keyword already consumed)
    pub(crate) fn parse_var_declarators(&mut self, kind: VarKind) -> Result<Vec<Declarator>, ParseError> {
        let mut declarations = Vec::new();

        loop {
            let location = self.current_location();
            let pattern = self.parse_binding_pattern()?;
            // definite assignment assertion: `let x!: number`
            self.match_token(&TokenKind::Bang)?;
            let annotation = self.parse_optional_annotation()?;
            let init = if self.match_token(&TokenKind::Eq)? {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            if init.is_none() {
                let needs_init = kind == VarKind::Const || !matches!(pattern, Pattern::Identifier(_));
                let in_for_head = self.check_ident("of") || self.check(&TokenKind::In);
                if needs_init && !in_for_head {
                    return Err(ParseError {
                        message: "Missing initializer in destructuring or const declaration".to_string(),
                        location,
                    });
                }
            }

            declarations.push(Declarator {
                pattern,
                annotation,
                init,
            });

            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(declarations)
    }

    /// Parse a function declaration or expression starting at `function`
    pub(crate) fn parse_function(&mut self, is_declaration: bool) -> Result<FunctionDef, ParseError> {
        let location = self.expect_token(&TokenKind::Function, "Expected 'function'")?.location;

        if self.check(&TokenKind::Star) {
            return self.error("Generator functions are not supported");
        }

        let name = if let TokenKind::Ident(_) = self.current.kind {
            Some(self.expect_identifier()?)
        } else if is_declaration {
            return self.error(format!(
                "Expected function name, found {}",
                self.current.kind
            ));
        } else {
            None
        };

        let type_params = if self.check(&TokenKind::Lt) {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };
        let params = self.parse_parameter_list()?;
        let return_type = self.parse_optional_annotation()?;
        let body = FunctionBody::Block(self.parse_function_body()?);

        Ok(FunctionDef {
            name,
            type_params,
            params,
            return_type,
            body,
            is_arrow: false,
            location,
        })
    }

    /// Parse `( param, ... )`
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect_lparen("to start parameter list")?;
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) {
            // `this` parameter annotations only exist for the type checker
            if self.check(&TokenKind::This) {
                self.advance()?;
                self.parse_optional_annotation()?;
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
                continue;
            }

            let rest = self.match_token(&TokenKind::Ellipsis)?;
            let pattern = self.parse_binding_pattern()?;
            let optional = self.match_token(&TokenKind::Question)?;
            let annotation = self.parse_optional_annotation()?;
            let default = if self.match_token(&TokenKind::Eq)? {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            params.push(Param {
                pattern,
                annotation,
                default,
                optional,
                rest,
            });

            if rest && !self.check(&TokenKind::RParen) {
                return self.error("A rest parameter must be last in a parameter list");
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        self.expect_rparen("after parameters")?;
        Ok(params)
    }

    /// Parse `{ statements }` of a function
    pub(crate) fn parse_function_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_lbrace("to start function body")?;
        self.block_depth += 1;
        let body = self.parse_block_statements()?;
        self.block_depth -= 1;
        self.expect_rbrace("to close function body")?;
        Ok(body)
    }

    /// Parse identifier, object or array binding pattern
    pub(crate) fn parse_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.current.kind {
            TokenKind::LBrace => self.parse_object_pattern(),
            TokenKind::LBracket => self.parse_array_pattern(),
            _ => Ok(Pattern::Identifier(self.expect_identifier()?)),
        }
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.advance()?; // '{'
        let mut properties = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RBrace) {
            if self.match_token(&TokenKind::Ellipsis)? {
                rest = Some(self.expect_identifier()?);
                break;
            }

            let key = match self.current.kind.clone() {
                TokenKind::String(s) => {
                    self.advance()?;
                    s
                }
                _ => self.expect_property_name()?,
            };
            let value = if self.match_token(&TokenKind::Colon)? {
                self.parse_binding_pattern()?
            } else {
                Pattern::Identifier(key.clone())
            };
            let default = if self.match_token(&TokenKind::Eq)? {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            properties.push(PatternProperty {
                key,
                value,
                default,
            });

            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        self.expect_rbrace("to close object pattern")?;
        Ok(Pattern::Object { properties, rest })
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.advance()?; // '['
        let mut elements = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RBracket) {
            if self.match_token(&TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            if self.match_token(&TokenKind::Ellipsis)? {
                rest = Some(self.expect_identifier()?);
                break;
            }

            let pattern = self.parse_binding_pattern()?;
            let default = if self.match_token(&TokenKind::Eq)? {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            elements.push(Some(PatternElement { pattern, default }));

            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        self.expect_token(&TokenKind::RBracket, "Expected ']' to close array pattern")?;
        Ok(Pattern::Array { elements, rest })
    }

    // ===== Module syntax =====

    /// Parse an `import` declaration (keyword not yet consumed)
    pub(crate) fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'import'

        if self.check(&TokenKind::LParen) || self.check(&TokenKind::Dot) {
            return self.error("Dynamic import is not supported in snippets");
        }

        let mut decl = ImportDecl {
            names: Vec::new(),
            source: String::new(),
            type_only: false,
        };

        // `import type { T } from ..`, but not `import type from ..`
        if self.check_ident("type") {
            let next = self.peek_next()?;
            if next == TokenKind::LBrace || next == TokenKind::Star {
                self.advance()?;
                decl.type_only = true;
            }
        }

        if let TokenKind::String(source) = self.current.kind.clone() {
            // side-effect import
            self.advance()?;
            decl.source = source;
            self.consume_semicolon("after import")?;
            return Ok(Stmt::Import { decl, location });
        }

        if let TokenKind::Ident(_) = self.current.kind {
            decl.names.push(self.expect_identifier()?);
            self.match_token(&TokenKind::Comma)?;
        }

        if self.match_token(&TokenKind::Star)? {
            if !self.match_ident("as")? {
                return self.error("Expected 'as' after '*' in import");
            }
            decl.names.push(self.expect_identifier()?);
        } else if self.match_token(&TokenKind::LBrace)? {
            while !self.check(&TokenKind::RBrace) {
                if self.check_ident("type") && matches!(self.peek_next()?, TokenKind::Ident(_)) {
                    self.advance()?;
                }
                let imported = self.expect_property_name()?;
                let local = if self.match_ident("as")? {
                    self.expect_identifier()?
                } else {
                    imported
                };
                decl.names.push(local);
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
            self.expect_rbrace("to close import list")?;
        }

        if !self.match_ident("from")? {
            return self.error(format!("Expected 'from' in import, found {}", self.current.kind));
        }
        match self.current.kind.clone() {
            TokenKind::String(source) => {
                self.advance()?;
                decl.source = source;
            }
            _ => return self.error("Expected module specifier string after 'from'"),
        }

        self.consume_semicolon("after import")?;
        Ok(Stmt::Import { decl, location })
    }

    /// Parse an `export` form (keyword not yet consumed); the export itself
    /// is erased and only the wrapped declaration or expression remains
    pub(crate) fn parse_export(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'export'

        if self.match_ident("default")? {
            if self.check(&TokenKind::Function) {
                if matches!(self.peek_next()?, TokenKind::Ident(_)) {
                    return Ok(Stmt::Function(self.parse_function(true)?));
                }
            } else if self.check_ident("interface") {
                return self.parse_interface();
            }
            let expr = self.parse_expression()?;
            self.consume_semicolon("after export default")?;
            return Ok(Stmt::Expression { expr, location });
        }

        // `export { a, b as c } from ".."` and `export * from ".."`
        if self.match_token(&TokenKind::Star)? {
            if self.match_ident("as")? {
                self.expect_identifier()?;
            }
            self.parse_export_source(true)?;
            return Ok(Stmt::Empty);
        }
        if self.match_token(&TokenKind::LBrace)? {
            while !self.check(&TokenKind::RBrace) {
                self.expect_property_name()?;
                if self.match_ident("as")? {
                    self.expect_property_name()?;
                }
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
            self.expect_rbrace("to close export list")?;
            self.parse_export_source(false)?;
            return Ok(Stmt::Empty);
        }

        match self.current.kind {
            TokenKind::Let | TokenKind::Const | TokenKind::Var | TokenKind::Function => {
                self.parse_statement()
            }
            TokenKind::Ident(_) if self.check_ident("interface") || self.check_ident("type") => {
                self.parse_statement()
            }
            _ => self.error(format!("Unexpected {} after 'export'", self.current.kind)),
        }
    }

    /// `from "module"` after a re-export, then the statement end
    fn parse_export_source(&mut self, required: bool) -> Result<(), ParseError> {
        if self.match_ident("from")? {
            match self.current.kind {
                TokenKind::String(_) => {
                    self.advance()?;
                }
                _ => return self.error("Expected module specifier string after 'from'"),
            }
        } else if required {
            return self.error(format!("Expected 'from' in export, found {}", self.current.kind));
        }
        self.consume_semicolon("after export")
    }

    // ===== Type declarations =====

    /// `interface Name<T> extends A, B { members }`
    pub(crate) fn parse_interface(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'interface'
        let name = self.expect_identifier()?;
        if self.check(&TokenKind::Lt) {
            self.parse_type_parameters()?;
        }
        if self.match_ident("extends")? {
            self.parse_type()?;
            while self.match_token(&TokenKind::Comma)? {
                self.parse_type()?;
            }
        }
        self.parse_type()?; // the body is an object type
        Ok(Stmt::TypeDecl { name, location })
    }

    /// `type Name<T> = T`
    pub(crate) fn parse_type_alias(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'type'
        let name = self.expect_identifier()?;
        if self.check(&TokenKind::Lt) {
            self.parse_type_parameters()?;
        }
        self.expect_token(&TokenKind::Eq, "Expected '=' in type alias")?;
        self.parse_type()?;
        self.consume_semicolon("after type alias")?;
        Ok(Stmt::TypeDecl { name, location })
    }
}
