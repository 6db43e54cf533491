//! Type annotation parsing
//!
//! Annotations are parsed only so they can be skipped precisely; the result
//! is normalized text kept for diagnostics. Nothing downstream checks types.
//!
//! ```text
//! type         ::= "|"? intersection ("|" intersection)*
//! intersection ::= postfix ("&" postfix)*
//! postfix      ::= primary ("[" type? "]")*
//! primary      ::= name type_args? | literal | object_type | tuple
//!                | "(" type ")" | fn_type | "typeof" name | "keyof" postfix
//! ```

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse `: T` if present
    pub(crate) fn parse_optional_annotation(&mut self) -> Result<Option<TypeAnnotation>, ParseError> {
        if self.match_token(&TokenKind::Colon)? {
            Ok(Some(self.parse_type_annotation()?))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn parse_type_annotation(&mut self) -> Result<TypeAnnotation, ParseError> {
        let location = self.current_location();
        let text = self.parse_type()?;
        Ok(TypeAnnotation { text, location })
    }

    pub(crate) fn parse_type(&mut self) -> Result<String, ParseError> {
        self.nested(Self::parse_union_type)
    }

    fn parse_union_type(&mut self) -> Result<String, ParseError> {
        self.match_token(&TokenKind::Pipe)?;
        let mut members = vec![self.parse_intersection_type()?];
        while self.match_token(&TokenKind::Pipe)? {
            members.push(self.parse_intersection_type()?);
        }
        Ok(members.join(" | "))
    }

    fn parse_intersection_type(&mut self) -> Result<String, ParseError> {
        self.match_token(&TokenKind::Amp)?;
        let mut members = vec![self.parse_postfix_type()?];
        while self.match_token(&TokenKind::Amp)? {
            members.push(self.parse_postfix_type()?);
        }
        Ok(members.join(" & "))
    }

    fn parse_postfix_type(&mut self) -> Result<String, ParseError> {
        let mut text = self.parse_primary_type()?;
        // `T[]` and indexed access `T["key"]`; a line break ends the type so
        // that a following array literal statement is not swallowed
        while self.check(&TokenKind::LBracket) && !self.current.newline_before {
            self.advance()?;
            if self.match_token(&TokenKind::RBracket)? {
                text.push_str("[]");
            } else {
                let index = self.parse_type()?;
                self.expect_token(&TokenKind::RBracket, "Expected ']' in indexed access type")?;
                text = format!("{}[{}]", text, index);
            }
        }
        Ok(text)
    }

    fn parse_primary_type(&mut self) -> Result<String, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Ident(name) if name == "keyof" || name == "readonly" || name == "unique" => {
                self.advance()?;
                let operand = self.parse_postfix_type()?;
                Ok(format!("{} {}", name, operand))
            }
            TokenKind::Ident(_) => self.parse_type_reference(),
            TokenKind::TypeOf => {
                self.advance()?;
                let mut path = self.expect_identifier()?;
                while self.match_token(&TokenKind::Dot)? {
                    path.push('.');
                    path.push_str(&self.expect_property_name()?);
                }
                Ok(format!("typeof {}", path))
            }
            TokenKind::Void
            | TokenKind::Null
            | TokenKind::Undefined
            | TokenKind::This
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Const => {
                let word = self.expect_property_name()?;
                Ok(word)
            }
            TokenKind::String(s) => {
                self.advance()?;
                Ok(format!("\"{}\"", s))
            }
            TokenKind::Number(n) => {
                self.advance()?;
                Ok(n.to_string())
            }
            TokenKind::Minus => {
                self.advance()?;
                match self.current.kind {
                    TokenKind::Number(n) => {
                        self.advance()?;
                        Ok(format!("-{}", n))
                    }
                    _ => self.error("Expected number after '-' in type"),
                }
            }
            TokenKind::LBrace => self.parse_object_type(),
            TokenKind::LBracket => {
                self.advance()?;
                let mut elements = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    let spread = self.match_token(&TokenKind::Ellipsis)?;
                    let element = self.parse_type()?;
                    let optional = self.match_token(&TokenKind::Question)?;
                    elements.push(format!(
                        "{}{}{}",
                        if spread { "..." } else { "" },
                        element,
                        if optional { "?" } else { "" }
                    ));
                    if !self.match_token(&TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect_token(&TokenKind::RBracket, "Expected ']' after tuple type")?;
                Ok(format!("[{}]", elements.join(", ")))
            }
            TokenKind::LParen => {
                if let Some(function_type) = self.try_parse_function_type()? {
                    return Ok(function_type);
                }
                self.advance()?;
                let inner = self.parse_type()?;
                self.expect_rparen("after parenthesized type")?;
                Ok(format!("({})", inner))
            }
            TokenKind::New => {
                self.advance()?;
                match self.try_parse_function_type()? {
                    Some(function_type) => Ok(format!("new {}", function_type)),
                    None => self.error("Expected constructor type after 'new'"),
                }
            }
            TokenKind::Lt => {
                // Generic function type: `<T>(x: T) => T`
                let params = self.parse_type_parameters()?;
                match self.try_parse_function_type()? {
                    Some(function_type) => Ok(format!("<{}>{}", params.join(", "), function_type)),
                    None => self.error("Expected function type after type parameters"),
                }
            }
            _ => self.error(format!("Expected type, found {}", self.current.kind)),
        }
    }

    /// `Name`, `Ns.Name`, `Name<Args>`
    fn parse_type_reference(&mut self) -> Result<String, ParseError> {
        let mut text = self.expect_identifier()?;
        while self.check(&TokenKind::Dot) {
            self.advance()?;
            text.push('.');
            text.push_str(&self.expect_property_name()?);
        }
        if self.check(&TokenKind::Lt) && !self.current.newline_before {
            self.advance()?;
            let mut args = vec![self.parse_type()?];
            while self.match_token(&TokenKind::Comma)? {
                args.push(self.parse_type()?);
            }
            self.expect_token(&TokenKind::Gt, "Expected '>' after type arguments")?;
            text = format!("{}<{}>", text, args.join(", "));
        }
        Ok(text)
    }

    /// `{ a: T; b?: U, [key: string]: V; m(x: T): U }`
    fn parse_object_type(&mut self) -> Result<String, ParseError> {
        self.expect_lbrace("to start object type")?;
        let mut members = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            self.match_ident("readonly")?;
            let member = if self.match_token(&TokenKind::LBracket)? {
                let key = self.expect_identifier()?;
                let key_type = match self.parse_optional_annotation()? {
                    Some(annotation) => annotation.text,
                    None => {
                        // mapped type: `[K in keyof T]`
                        self.expect_token(&TokenKind::In, "Expected ':' or 'in' in index signature")?;
                        format!("in {}", self.parse_type()?)
                    }
                };
                self.expect_token(&TokenKind::RBracket, "Expected ']' in index signature")?;
                let optional = self.match_token(&TokenKind::Question)?;
                let value = self.parse_optional_annotation()?.map(|a| a.text).unwrap_or_default();
                format!(
                    "[{}: {}]{}: {}",
                    key,
                    key_type,
                    if optional { "?" } else { "" },
                    value
                )
            } else if self.check(&TokenKind::LParen) || self.check(&TokenKind::Lt) {
                // call signature
                self.parse_signature_rest()?
            } else {
                let key = match self.current.kind.clone() {
                    TokenKind::String(s) => {
                        self.advance()?;
                        format!("\"{}\"", s)
                    }
                    TokenKind::Number(n) => {
                        self.advance()?;
                        n.to_string()
                    }
                    _ => self.expect_property_name()?,
                };
                let optional = self.match_token(&TokenKind::Question)?;
                let marker = if optional { "?" } else { "" };
                if self.check(&TokenKind::LParen) || self.check(&TokenKind::Lt) {
                    format!("{}{}{}", key, marker, self.parse_signature_rest()?)
                } else {
                    let value = self.parse_optional_annotation()?.map(|a| a.text).unwrap_or_default();
                    format!("{}{}: {}", key, marker, value)
                }
            };
            members.push(member);

            if !self.match_token(&TokenKind::Comma)?
                && !self.match_token(&TokenKind::Semicolon)?
                && !self.check(&TokenKind::RBrace)
                && !self.current.newline_before
            {
                return self.error(format!(
                    "Expected ';' or ',' between type members, found {}",
                    self.current.kind
                ));
            }
        }

        self.expect_rbrace("to close object type")?;
        Ok(format!("{{ {} }}", members.join("; ")))
    }

    /// `<T>(params): R` after a method name
    fn parse_signature_rest(&mut self) -> Result<String, ParseError> {
        let type_params = if self.check(&TokenKind::Lt) {
            format!("<{}>", self.parse_type_parameters()?.join(", "))
        } else {
            String::new()
        };
        let params = self.parse_type_param_list()?;
        let ret = self.parse_optional_annotation()?.map(|a| a.text).unwrap_or_default();
        Ok(format!("{}({}): {}", type_params, params.join(", "), ret))
    }

    /// Try `(a: T, b?: U) => R`; restores the position when the parenthesis
    /// turns out to be a grouped type
    fn try_parse_function_type(&mut self) -> Result<Option<String>, ParseError> {
        let checkpoint = self.checkpoint();
        let params = match self.parse_type_param_list() {
            Ok(params) => params,
            Err(_) => {
                self.restore(checkpoint);
                return Ok(None);
            }
        };
        if !self.match_token(&TokenKind::Arrow)? {
            self.restore(checkpoint);
            return Ok(None);
        }
        let ret = self.parse_type()?;
        Ok(Some(format!("({}) => {}", params.join(", "), ret)))
    }

    /// Parameter list of a function type: names with optional annotations
    fn parse_type_param_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect_lparen("to start parameter list")?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let rest = self.match_token(&TokenKind::Ellipsis)?;
            let name = match self.current.kind {
                TokenKind::This => self.expect_property_name()?,
                _ => self.expect_identifier()?,
            };
            let optional = self.match_token(&TokenKind::Question)?;
            let annotation = self.parse_optional_annotation()?;
            params.push(format!(
                "{}{}{}{}",
                if rest { "..." } else { "" },
                name,
                if optional { "?" } else { "" },
                annotation.map(|a| format!(": {}", a.text)).unwrap_or_default()
            ));
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect_rparen("after parameter list")?;
        Ok(params)
    }

    /// `<T, U extends X = Y>`; returns the parameter names
    pub(crate) fn parse_type_parameters(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect_token(&TokenKind::Lt, "Expected '<' to start type parameters")?;
        let mut names = Vec::new();
        while !self.check(&TokenKind::Gt) {
            self.match_token(&TokenKind::Const)?;
            names.push(self.expect_identifier()?);
            if self.match_ident("extends")? {
                self.parse_type()?;
            }
            if self.match_token(&TokenKind::Eq)? {
                self.parse_type()?;
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect_token(&TokenKind::Gt, "Expected '>' after type parameters")?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse::Parser;

    fn type_text(source: &str) -> String {
        let mut parser = Parser::new(source).unwrap();
        let text = parser.parse_type().unwrap();
        assert!(parser.is_at_end(), "type did not consume all of {:?}", source);
        text
    }

    #[test]
    fn test_simple_and_generic_types() {
        assert_eq!(type_text("number"), "number");
        assert_eq!(type_text("Array<Array<string>>"), "Array<Array<string>>");
        assert_eq!(type_text("Record<string, number[]>"), "Record<string, number[]>");
    }

    #[test]
    fn test_union_and_literal_types() {
        assert_eq!(type_text("'a' | 'b' | null"), "\"a\" | \"b\" | null");
    }

    #[test]
    fn test_object_and_function_types() {
        assert_eq!(
            type_text("{ name: string; age?: number }"),
            "{ name: string; age?: number }"
        );
        assert_eq!(type_text("(x: number) => void"), "(x: number) => void");
        assert_eq!(type_text("(string | number)[]"), "(string | number)[]");
    }
}
