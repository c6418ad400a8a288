//! Lexer (tokenizer) for C++ header text
//!
//! Converts raw header text into a flat [`Token`] stream consumed by the
//! declaration parser. Comments, whitespace and preprocessor lines are
//! dropped; string and character literals are kept as single tokens so that
//! braces inside them never reach the parser's brace counting.
//!
//! Angle brackets are always emitted as single-character tokens (`>>` becomes
//! two [`TokenKind::Gt`]). Whether a `<` opens a template argument list is
//! decided by the parser, never here.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Token categories produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Number,
    StringLiteral,
    CharLiteral,

    Ident,

    // Declaration keywords
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    Template,
    Typename,

    // Access specifiers
    Public,
    Protected,
    Private,

    // Member qualifiers
    Virtual,
    Static,
    Const,
    Volatile,
    Override,
    Final,
    Inline,
    Explicit,
    Mutable,
    Constexpr,
    Noexcept,

    // Declarations the parser skips or special-cases
    Friend,
    Typedef,
    Using,
    Operator,
    Delete,
    Default,
    Extern,
    StaticAssert,

    // Punctuation
    ColonColon, // ::
    Colon,      // :
    Semicolon,  // ;
    Comma,      // ,
    LBrace,     // {
    RBrace,     // }
    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    Lt,         // <
    Gt,         // >
    Eq,         // =
    Star,       // *
    Amp,        // &
    Tilde,      // ~
    Arrow,      // ->
    Ellipsis,   // ...

    /// Any other punctuation, kept so the parser can reject it in context.
    Punct,

    Eof,
}

impl TokenKind {
    /// Map an identifier-shaped word to its keyword kind, if any.
    fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "namespace" => TokenKind::Namespace,
            "class" => TokenKind::Class,
            "struct" => TokenKind::Struct,
            "union" => TokenKind::Union,
            "enum" => TokenKind::Enum,
            "template" => TokenKind::Template,
            "typename" => TokenKind::Typename,
            "public" => TokenKind::Public,
            "protected" => TokenKind::Protected,
            "private" => TokenKind::Private,
            "virtual" => TokenKind::Virtual,
            "static" => TokenKind::Static,
            "const" => TokenKind::Const,
            "volatile" => TokenKind::Volatile,
            "override" => TokenKind::Override,
            "final" => TokenKind::Final,
            "inline" => TokenKind::Inline,
            "explicit" => TokenKind::Explicit,
            "mutable" => TokenKind::Mutable,
            "constexpr" => TokenKind::Constexpr,
            "noexcept" => TokenKind::Noexcept,
            "friend" => TokenKind::Friend,
            "typedef" => TokenKind::Typedef,
            "using" => TokenKind::Using,
            "operator" => TokenKind::Operator,
            "delete" => TokenKind::Delete,
            "default" => TokenKind::Default,
            "extern" => TokenKind::Extern,
            "static_assert" => TokenKind::StaticAssert,
            _ => return None,
        };
        Some(kind)
    }

    /// True for kinds whose text is an identifier-like word.
    pub fn is_word(self) -> bool {
        !matches!(
            self,
            TokenKind::Number
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
                | TokenKind::ColonColon
                | TokenKind::Colon
                | TokenKind::Semicolon
                | TokenKind::Comma
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Eq
                | TokenKind::Star
                | TokenKind::Amp
                | TokenKind::Tilde
                | TokenKind::Arrow
                | TokenKind::Ellipsis
                | TokenKind::Punct
                | TokenKind::Eof
        )
    }
}

/// A token together with its raw source text and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Number => write!(f, "number {}", self.text),
            TokenKind::StringLiteral => write!(f, "string literal {}", self.text),
            TokenKind::CharLiteral => write!(f, "char literal {}", self.text),
            TokenKind::Ident => write!(f, "identifier '{}'", self.text),
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Lexer error: only unterminated literals and comments are fatal.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Lexer error at line {}, column {} (offset {}): {message}", .location.line, .location.column, .location.offset)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for C++ header text
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut line_start = true;

        loop {
            let line_before = self.line;
            self.skip_whitespace_and_comments()?;
            if self.line != line_before {
                line_start = true;
            }

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, "", self.current_location()));
                break;
            }

            // Directives only count at the start of a logical line
            if line_start && self.peek() == Some('#') {
                self.skip_preprocessor_directive();
                continue;
            }

            tokens.push(self.next_token()?);
            line_start = false;
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let Some(ch) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, "", loc));
        };

        let token = match ch {
            '"' => self.string_literal(String::from("\""), loc)?,
            '\'' => self.char_literal(String::from("'"), loc)?,
            '0'..='9' => self.number_literal(ch, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)
            }
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(ch, loc)?,

            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    Token::new(TokenKind::ColonColon, "::", loc)
                } else {
                    Token::new(TokenKind::Colon, ":", loc)
                }
            }
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Token::new(TokenKind::Arrow, "->", loc)
                } else {
                    Token::new(TokenKind::Punct, "-", loc)
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::Ellipsis, "...", loc)
                } else {
                    Token::new(TokenKind::Punct, ".", loc)
                }
            }
            ';' => Token::new(TokenKind::Semicolon, ";", loc),
            ',' => Token::new(TokenKind::Comma, ",", loc),
            '{' => Token::new(TokenKind::LBrace, "{", loc),
            '}' => Token::new(TokenKind::RBrace, "}", loc),
            '(' => Token::new(TokenKind::LParen, "(", loc),
            ')' => Token::new(TokenKind::RParen, ")", loc),
            '[' => Token::new(TokenKind::LBracket, "[", loc),
            ']' => Token::new(TokenKind::RBracket, "]", loc),
            '<' => Token::new(TokenKind::Lt, "<", loc),
            '>' => Token::new(TokenKind::Gt, ">", loc),
            '=' => Token::new(TokenKind::Eq, "=", loc),
            '*' => Token::new(TokenKind::Star, "*", loc),
            '&' => Token::new(TokenKind::Amp, "&", loc),
            '~' => Token::new(TokenKind::Tilde, "~", loc),

            other => Token::new(TokenKind::Punct, other.to_string(), loc),
        };

        Ok(token)
    }

    /// Scan a string literal; `text` already holds any prefix and the opening quote.
    fn string_literal(&mut self, mut text: String, loc: SourceLocation) -> Result<Token, LexError> {
        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance();
                    text.push('"');
                    return Ok(Token::new(TokenKind::StringLiteral, text, loc));
                }
                '\\' => {
                    self.advance();
                    text.push('\\');
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                '\n' => break,
                _ => {
                    self.advance();
                    text.push(ch);
                }
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Scan a raw string literal `R"delim( ... )delim"`; the opening quote is consumed.
    fn raw_string_literal(&mut self, mut text: String, loc: SourceLocation) -> Result<Token, LexError> {
        let mut delimiter = String::new();
        loop {
            match self.advance() {
                Some('(') => break,
                Some(ch) if ch != '\n' && delimiter.len() <= 16 => delimiter.push(ch),
                _ => {
                    return Err(LexError {
                        message: "Malformed raw string delimiter".to_string(),
                        location: loc,
                    })
                }
            }
        }
        text.push_str(&delimiter);
        text.push('(');

        let closing: Vec<char> = format!("){}\"", delimiter).chars().collect();
        while !self.is_at_end() {
            if self.input[self.position..].starts_with(&closing) {
                for _ in 0..closing.len() {
                    if let Some(ch) = self.advance() {
                        text.push(ch);
                    }
                }
                return Ok(Token::new(TokenKind::StringLiteral, text, loc));
            }
            if let Some(ch) = self.advance() {
                text.push(ch);
            }
        }

        Err(LexError {
            message: "Unterminated raw string literal".to_string(),
            location: loc,
        })
    }

    /// Scan a character literal; `text` already holds any prefix and the opening quote.
    fn char_literal(&mut self, mut text: String, loc: SourceLocation) -> Result<Token, LexError> {
        while let Some(ch) = self.peek() {
            match ch {
                '\'' => {
                    self.advance();
                    text.push('\'');
                    return Ok(Token::new(TokenKind::CharLiteral, text, loc));
                }
                '\\' => {
                    self.advance();
                    text.push('\\');
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                '\n' => break,
                _ => {
                    self.advance();
                    text.push(ch);
                }
            }
        }

        Err(LexError {
            message: "Unterminated character literal".to_string(),
            location: loc,
        })
    }

    /// Scan a numeric literal, including suffixes, exponents and digit separators
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Token {
        let mut text = String::new();
        text.push(first);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' {
                text.push(ch);
                self.advance();
                if matches!(ch, 'e' | 'E' | 'p' | 'P')
                    && matches!(self.peek(), Some('+') | Some('-'))
                {
                    if let Some(sign) = self.advance() {
                        text.push(sign);
                    }
                }
            } else if ch == '\'' && self.peek_ahead(1).is_some_and(|c| c.is_ascii_alphanumeric()) {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Number, text, loc)
    }

    /// Scan an identifier, keyword, or prefixed literal (`u8"..."`, `R"(...)"`, `L'x'`)
    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut ident = String::new();
        ident.push(first);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let is_prefix = matches!(ident.as_str(), "L" | "u" | "U" | "u8");
        let is_raw_prefix = matches!(ident.as_str(), "R" | "LR" | "uR" | "UR" | "u8R");
        match self.peek() {
            Some('"') if is_raw_prefix => {
                self.advance();
                ident.push('"');
                return self.raw_string_literal(ident, loc);
            }
            Some('"') if is_prefix => {
                self.advance();
                ident.push('"');
                return self.string_literal(ident, loc);
            }
            Some('\'') if is_prefix => {
                self.advance();
                ident.push('\'');
                return self.char_literal(ident, loc);
            }
            _ => {}
        }

        let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Ident);
        Ok(Token::new(kind, ident, loc))
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') | Some('\x0c') => {
                    self.advance();
                }
                Some('\\') if matches!(self.peek_ahead(1), Some('\n') | Some('\r')) => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Skip a preprocessor directive, honouring backslash line continuations.
    /// Comments inside the directive are left for the regular comment skipper.
    fn skip_preprocessor_directive(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                '\\' if matches!(self.peek_ahead(1), Some('\n')) => {
                    self.advance();
                    self.advance();
                }
                '\\' if self.peek_ahead(1) == Some('\r') && self.peek_ahead(2) == Some('\n') => {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                '\n' => break,
                '/' if matches!(self.peek_ahead(1), Some('/') | Some('*')) => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
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
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.position)
    }
}
