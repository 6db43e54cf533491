//! Lexer (tokenizer) for snippet source
//!
//! Unlike a batch tokenizer, this lexer is driven by the parser one token at a
//! time. Markup text has no token structure of its own, so the parser switches
//! to raw scanning ([`Lexer::markup_text`]) while inside an element body and
//! back to ordinary tokens for tags and `{expression}` containers.

use super::ast::SourceLocation;
use std::fmt;

/// One piece of a template literal
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    /// Raw source of a `${...}` substitution and where it starts
    Expr(String, SourceLocation),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(String),
    Template(Vec<TemplatePart>),

    // Identifiers
    Ident(String),

    // Keywords
    Let,
    Const,
    Var,
    Function,
    Return,
    If,
    Else,
    While,
    Do,
    For,
    In,
    Break,
    Continue,
    True,
    False,
    Null,
    Undefined,
    New,
    Throw,
    Try,
    Catch,
    Finally,
    TypeOf,
    Void,
    InstanceOf,
    This,
    Import,
    Export,
    /// Reserved words the dialect does not support (`class`, `async`, ...)
    Reserved(String),

    // Arithmetic
    Plus,       // +
    Minus,      // -
    Star,       // *
    StarStar,   // **
    Slash,      // /
    Percent,    // %
    PlusPlus,   // ++
    MinusMinus, // --

    // Comparison
    EqEq,      // ==
    EqEqEq,    // ===
    NotEq,     // !=
    NotEqEq,   // !==
    Lt,        // <
    Le,        // <=
    Gt,        // >
    Ge,        // >=

    // Logical
    AndAnd,   // &&
    OrOr,     // ||
    Bang,     // !
    Question2, // ??

    // Only meaningful inside type annotations
    Amp,  // &
    Pipe, // |

    // Assignment
    Eq,          // =
    PlusEq,      // +=
    MinusEq,     // -=
    StarEq,      // *=
    StarStarEq,  // **=
    SlashEq,     // /=
    PercentEq,   // %=
    AndAndEq,    // &&=
    OrOrEq,      // ||=
    Question2Eq, // ??=

    // Punctuation
    Arrow,         // =>
    Dot,           // .
    Ellipsis,      // ...
    QuestionDot,   // ?.
    Question,      // ?
    Colon,         // :
    LParen,        // (
    RParen,        // )
    LBrace,        // {
    RBrace,        // }
    LBracket,      // [
    RBracket,      // ]
    Semicolon,     // ;
    Comma,         // ,

    Eof,
}

impl TokenKind {
    /// Source text for keyword tokens, used where any word is allowed
    /// (property names, markup attribute names)
    pub fn keyword_text(&self) -> Option<&str> {
        let text = match self {
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::Var => "var",
            TokenKind::Function => "function",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Undefined => "undefined",
            TokenKind::New => "new",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::TypeOf => "typeof",
            TokenKind::Void => "void",
            TokenKind::InstanceOf => "instanceof",
            TokenKind::This => "this",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Reserved(word) => word.as_str(),
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(word) = self.keyword_text() {
            return write!(f, "'{}'", word);
        }
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::String(s) => write!(f, "string \"{}\"", s),
            TokenKind::Template(_) => write!(f, "template literal"),
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::StarStar => write!(f, "'**'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::PlusPlus => write!(f, "'++'"),
            TokenKind::MinusMinus => write!(f, "'--'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::EqEqEq => write!(f, "'==='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::NotEqEq => write!(f, "'!=='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Question2 => write!(f, "'??'"),
            TokenKind::Amp => write!(f, "'&'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::PlusEq => write!(f, "'+='"),
            TokenKind::MinusEq => write!(f, "'-='"),
            TokenKind::StarEq => write!(f, "'*='"),
            TokenKind::StarStarEq => write!(f, "'**='"),
            TokenKind::SlashEq => write!(f, "'/='"),
            TokenKind::PercentEq => write!(f, "'%='"),
            TokenKind::AndAndEq => write!(f, "'&&='"),
            TokenKind::OrOrEq => write!(f, "'||='"),
            TokenKind::Question2Eq => write!(f, "'??='"),
            TokenKind::Arrow => write!(f, "'=>'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Ellipsis => write!(f, "'...'"),
            TokenKind::QuestionDot => write!(f, "'?.'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// A token together with where it starts.
///
/// `newline_before` records whether a line break separated this token from
/// the previous one; `return`, `throw` and postfix `++`/`--` depend on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    pub newline_before: bool,
}

/// Lexer error type
#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Saved lexer position for parser backtracking
#[derive(Debug, Clone, Copy)]
pub struct LexerState {
    position: usize,
    line: usize,
    column: usize,
}

/// Lexer for snippet source
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self::starting_at(input, SourceLocation::new(1, 1))
    }

    /// Create a lexer whose locations are offset to `start`; used for the
    /// substitutions of template literals.
    pub fn starting_at(input: &str, start: SourceLocation) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: start.line,
            column: start.column,
        }
    }

    pub fn save(&self) -> LexerState {
        LexerState {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    pub fn restore(&mut self, state: LexerState) {
        self.position = state.position;
        self.line = state.line;
        self.column = state.column;
    }

    /// Tokenize the entire input. The parser lexes lazily; this is for
    /// callers that only need the token stream.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    /// Lex the next token, skipping whitespace and comments
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let newline_before = self.skip_whitespace_and_comments()?;
        let location = self.current_location();

        let kind = match self.advance() {
            None => TokenKind::Eof,
            Some(ch) => self.token_kind(ch, location)?,
        };

        Ok(Token {
            kind,
            location,
            newline_before,
        })
    }

    fn token_kind(&mut self, ch: char, loc: SourceLocation) -> Result<TokenKind, LexError> {
        let kind = match ch {
            '"' | '\'' => TokenKind::String(self.string_literal(ch, loc)?),
            '`' => TokenKind::Template(self.template_literal(loc)?),
            '0'..='9' => self.number_literal(ch, loc)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)?
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => self.identifier_or_keyword(c),

            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        TokenKind::StarStarEq
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::NotEqEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            // `<<` and `>>` are deliberately absent: nested generic arguments
            // (`Array<Array<T>>`) must close one `>` at a time.
            '<' => {
                if self.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    if self.eat('=') {
                        TokenKind::AndAndEq
                    } else {
                        TokenKind::AndAnd
                    }
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    if self.eat('=') {
                        TokenKind::OrOrEq
                    } else {
                        TokenKind::OrOr
                    }
                } else {
                    TokenKind::Pipe
                }
            }
            '?' => {
                if self.eat('?') {
                    if self.eat('=') {
                        TokenKind::Question2Eq
                    } else {
                        TokenKind::Question2
                    }
                } else if self.peek() == Some('.')
                    && !self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
                {
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,

            '^' | '~' => {
                return Err(LexError {
                    message: format!("Bitwise operator '{}' is not supported in snippets", ch),
                    location: loc,
                })
            }
            _ => {
                return Err(LexError {
                    message: format!("Unexpected character: '{}'", ch),
                    location: loc,
                })
            }
        };
        Ok(kind)
    }

    /// Parse a quoted string literal; the opening quote is already consumed
    fn string_literal(&mut self, quote: char, loc: SourceLocation) -> Result<String, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance();
                return Ok(string);
            }
            if ch == '\n' {
                break;
            }
            self.advance();
            if ch == '\\' {
                if let Some(unescaped) = self.escape_sequence()? {
                    string.push(unescaped);
                }
            } else {
                string.push(ch);
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Decode the escape after a backslash. Returns `None` for a line
    /// continuation.
    fn escape_sequence(&mut self) -> Result<Option<char>, LexError> {
        let loc = self.current_location();
        let escaped = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of input in escape sequence".to_string(),
            location: loc,
        })?;

        let ch = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            '\n' => return Ok(None),
            'x' => self.hex_escape(2, loc)?,
            'u' => {
                if self.eat('{') {
                    let mut digits = String::new();
                    while let Some(c) = self.advance() {
                        if c == '}' {
                            break;
                        }
                        digits.push(c);
                    }
                    Self::char_from_hex(&digits, loc)?
                } else {
                    self.hex_escape(4, loc)?
                }
            }
            other => other,
        };
        Ok(Some(ch))
    }

    fn hex_escape(&mut self, len: usize, loc: SourceLocation) -> Result<char, LexError> {
        let mut digits = String::new();
        for _ in 0..len {
            match self.advance() {
                Some(c) => digits.push(c),
                None => break,
            }
        }
        Self::char_from_hex(&digits, loc)
    }

    fn char_from_hex(digits: &str, loc: SourceLocation) -> Result<char, LexError> {
        u32::from_str_radix(digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| LexError {
                message: format!("Invalid escape sequence: {}", digits),
                location: loc,
            })
    }

    /// Parse a template literal; the opening backtick is already consumed.
    /// Substitutions are captured as raw source and parsed later.
    fn template_literal(&mut self, loc: SourceLocation) -> Result<Vec<TemplatePart>, LexError> {
        let mut parts = Vec::new();
        let mut text = String::new();

        loop {
            let ch = self.advance().ok_or_else(|| LexError {
                message: "Unterminated template literal".to_string(),
                location: loc,
            })?;

            match ch {
                '`' => break,
                '\\' => {
                    if let Some(unescaped) = self.escape_sequence()? {
                        text.push(unescaped);
                    }
                }
                '$' if self.peek() == Some('{') => {
                    self.advance();
                    parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    let start = self.current_location();
                    let source = self.substitution_source(start)?;
                    parts.push(TemplatePart::Expr(source, start));
                }
                _ => text.push(ch),
            }
        }

        parts.push(TemplatePart::Text(text));
        Ok(parts)
    }

    /// Collect raw source up to the `}` closing a `${` substitution, skipping
    /// over nested braces, strings and templates.
    fn substitution_source(&mut self, start: SourceLocation) -> Result<String, LexError> {
        let mut source = String::new();
        let mut depth = 0usize;

        loop {
            let ch = self.advance().ok_or_else(|| LexError {
                message: "Unterminated template substitution".to_string(),
                location: start,
            })?;

            match ch {
                '{' => depth += 1,
                '}' if depth == 0 => return Ok(source),
                '}' => depth -= 1,
                '"' | '\'' | '`' => {
                    source.push(ch);
                    while let Some(c) = self.advance() {
                        source.push(c);
                        if c == '\\' {
                            if let Some(next) = self.advance() {
                                source.push(next);
                            }
                        } else if c == ch {
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }
            source.push(ch);
        }
    }

    /// Parse numeric literal
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<TokenKind, LexError> {
        if first == '0' {
            let radix = match self.peek() {
                Some('x') | Some('X') => Some(16),
                Some('b') | Some('B') => Some(2),
                Some('o') | Some('O') => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut digits = String::new();
                while let Some(ch) = self.peek() {
                    if ch.is_digit(radix) {
                        digits.push(ch);
                    } else if ch != '_' {
                        break;
                    }
                    self.advance();
                }
                let value = u64::from_str_radix(&digits, radix).map_err(|_| LexError {
                    message: format!("Invalid numeric literal: 0{}", digits),
                    location: loc,
                })?;
                return Ok(TokenKind::Number(value as f64));
            }
        }

        let mut num_str = String::new();
        num_str.push(first);
        let mut seen_dot = first == '.';
        let mut seen_exp = false;

        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => num_str.push(ch),
                '_' => {}
                '.' if !seen_dot && !seen_exp => {
                    // `1..toString()` style access is not supported; a second
                    // dot always ends the literal
                    seen_dot = true;
                    num_str.push(ch);
                }
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    num_str.push(ch);
                    self.advance();
                    if let Some(sign @ ('+' | '-')) = self.peek() {
                        num_str.push(sign);
                        self.advance();
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        let value = num_str.parse::<f64>().map_err(|_| LexError {
            message: format!("Invalid numeric literal: {}", num_str),
            location: loc,
        })?;

        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(LexError {
                message: "Identifier starts immediately after numeric literal".to_string(),
                location: self.current_location(),
            });
        }

        Ok(TokenKind::Number(value))
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char) -> TokenKind {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "undefined" => TokenKind::Undefined,
            "new" => TokenKind::New,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "typeof" => TokenKind::TypeOf,
            "void" => TokenKind::Void,
            "instanceof" => TokenKind::InstanceOf,
            "this" => TokenKind::This,
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "class" | "async" | "await" | "yield" | "switch" | "case" | "enum" | "super"
            | "delete" | "with" | "debugger" => TokenKind::Reserved(ident),
            _ => TokenKind::Ident(ident),
        }
    }

    /// Skip whitespace and comments; reports whether a newline was crossed
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, LexError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some('\n') => {
                    newline = true;
                    self.advance();
                }
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        newline |= self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(newline)
    }

    /// Skip single-line comment (// ...), leaving the newline in place
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<bool, LexError> {
        let start_loc = self.current_location();
        let mut newline = false;
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(newline);
            }
            if self.advance() == Some('\n') {
                newline = true;
            }
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    // ===== Raw scanning for markup bodies =====

    /// Read raw markup text up to the next `<` or `{` (not consumed).
    /// Returns `None` at end of input.
    pub fn markup_text(&mut self) -> Option<String> {
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return None,
                Some('<') | Some('{') => return Some(text),
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Whether the raw input continues with a closing tag (`</`)
    pub fn at_closing_tag(&self) -> bool {
        if self.peek() != Some('<') {
            return false;
        }
        let mut offset = 1;
        while self.peek_ahead(offset).is_some_and(|c| c.is_whitespace()) {
            offset += 1;
        }
        self.peek_ahead(offset) == Some('/')
    }

    /// Whether the raw input continues with `{` followed only by whitespace
    /// and comments up to `}`: an empty expression container
    pub fn at_empty_container(&mut self) -> bool {
        if self.peek() != Some('{') {
            return false;
        }
        let saved = self.save();
        self.advance();
        let empty = self.skip_whitespace_and_comments().is_ok() && self.peek() == Some('}');
        if empty {
            self.advance();
        } else {
            self.restore(saved);
        }
        empty
    }

    // ===== Character helpers =====

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Consume `expected` if it is next
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    pub fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("const x: number = 1 + 1;");

        assert_eq!(tokens[0], TokenKind::Const);
        assert_eq!(tokens[1], TokenKind::Ident("x".to_string()));
        assert_eq!(tokens[2], TokenKind::Colon);
        assert_eq!(tokens[3], TokenKind::Ident("number".to_string()));
        assert_eq!(tokens[4], TokenKind::Eq);
        assert_eq!(tokens[5], TokenKind::Number(1.0));
        assert_eq!(tokens[6], TokenKind::Plus);
        assert_eq!(tokens[7], TokenKind::Number(1.0));
        assert_eq!(tokens[8], TokenKind::Semicolon);
        assert_eq!(tokens[9], TokenKind::Eof);
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("=== !== => ?. ?? ??= ** ... &&= ||=");

        assert_eq!(
            &tokens[..10],
            &[
                TokenKind::EqEqEq,
                TokenKind::NotEqEq,
                TokenKind::Arrow,
                TokenKind::QuestionDot,
                TokenKind::Question2,
                TokenKind::Question2Eq,
                TokenKind::StarStar,
                TokenKind::Ellipsis,
                TokenKind::AndAndEq,
                TokenKind::OrOrEq,
            ]
        );
    }

    #[test]
    fn test_nested_generic_closers_stay_separate() {
        let tokens = kinds("Array<Array<number>>");
        assert_eq!(tokens[4], TokenKind::Ident("number".to_string()));
        assert_eq!(tokens[5], TokenKind::Gt);
        assert_eq!(tokens[6], TokenKind::Gt);
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = Lexer::new("a // comment\n/* block\ncomment */ b")
            .tokenize()
            .unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Ident("a".to_string()));
        assert!(!tokens[0].newline_before);
        assert_eq!(tokens[1].kind, TokenKind::Ident("b".to_string()));
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].location, SourceLocation::new(3, 12));
    }

    #[test]
    fn test_string_literals() {
        let tokens = kinds(r#""hello\nworld" 'it\'s' "\u{1F600}""#);

        assert_eq!(tokens[0], TokenKind::String("hello\nworld".to_string()));
        assert_eq!(tokens[1], TokenKind::String("it's".to_string()));
        assert_eq!(tokens[2], TokenKind::String("\u{1F600}".to_string()));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("0.5 .25 1e3 0xff 1_000");

        assert_eq!(tokens[0], TokenKind::Number(0.5));
        assert_eq!(tokens[1], TokenKind::Number(0.25));
        assert_eq!(tokens[2], TokenKind::Number(1000.0));
        assert_eq!(tokens[3], TokenKind::Number(255.0));
        assert_eq!(tokens[4], TokenKind::Number(1000.0));
    }

    #[test]
    fn test_template_literal_parts() {
        let tokens = kinds("`a ${b + `c${d}`} e`");

        match &tokens[0] {
            TokenKind::Template(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], TemplatePart::Text("a ".to_string()));
                assert!(matches!(&parts[1], TemplatePart::Expr(src, _) if src == "b + `c${d}`"));
                assert_eq!(parts[2], TemplatePart::Text(" e".to_string()));
            }
            other => panic!("Expected template literal, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.location, SourceLocation::new(1, 1));
    }

    #[test]
    fn test_markup_text_scanning() {
        let mut lexer = Lexer::new("hello there {name}</p>");
        assert_eq!(lexer.markup_text().as_deref(), Some("hello there "));
        assert!(!lexer.at_closing_tag());
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::LBrace);
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::Ident("name".to_string())
        );
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::RBrace);
        assert_eq!(lexer.markup_text().as_deref(), Some(""));
        assert!(lexer.at_closing_tag());
    }
}
