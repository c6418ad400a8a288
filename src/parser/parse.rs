//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, cursor helpers, recovery, and the parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, recovery and coordination
//! - `declarations`: namespaces, records, enums, templates
//! - `members`: member declarations inside record bodies
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! Errors never abort the whole parse. A malformed declaration is recorded in
//! the error list and the parser resynchronizes on the next `;` or the `}`
//! closing the current block.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use thiserror::Error;
use tracing::debug;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

/// Result of parsing one header: every declaration that parsed plus the
/// errors collected along the way
#[derive(Debug, Clone, Default)]
pub struct ParsedHeader {
    pub unit: TranslationUnit,
    pub errors: Vec<ParseError>,
}

/// Lex and parse a header in one step
pub fn parse_header(source: &str) -> Result<ParsedHeader, LexError> {
    let mut parser = Parser::new(source)?;
    let unit = parser.parse_translation_unit();
    Ok(ParsedHeader {
        unit,
        errors: parser.into_errors(),
    })
}

/// Recursive descent parser for C++ declarations
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, LexError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Build a parser over an existing token stream. The stream is expected
    /// to end with an [`TokenKind::Eof`] token; one is appended otherwise.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", location));
        }
        Self {
            tokens,
            position: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the entire header (top-level declarations)
    pub fn parse_translation_unit(&mut self) -> TranslationUnit {
        let mut unit = TranslationUnit::new();

        while !self.is_at_end() {
            if self.check(TokenKind::RBrace) {
                let err = self.error_here("Unbalanced braces: unmatched '}'");
                self.errors.push(err);
                self.advance();
                continue;
            }
            self.parse_namespace_level_item(&mut unit.declarations);
        }

        debug!(
            declarations = unit.declarations.len(),
            errors = self.errors.len(),
            "parsed translation unit"
        );
        unit
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // ===== Helper methods =====

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn check_ahead(&self, n: usize, kind: TokenKind) -> bool {
        self.peek_ahead(n).is_some_and(|t| t.kind == kind)
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        // The stream always ends with Eof and the cursor never passes it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("{}, found {}", message, self.peek())))
        }
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::Semicolon, &format!("Expected ';' {ctx}"))
            .map(|_| ())
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<String, ParseError> {
        if self.check(TokenKind::Ident) {
            Ok(self.advance().text)
        } else {
            Err(self.error_here(format!("Expected identifier {}, found {}", ctx, self.peek())))
        }
    }

    /// Consume the `}` closing a block opened at `open`, recording an error
    /// (without consuming anything) when the input ends first.
    pub(crate) fn close_block(&mut self, what: &str, open: SourceLocation) {
        if !self.match_token(TokenKind::RBrace) {
            self.errors.push(ParseError {
                message: format!(
                    "Unbalanced braces: expected '}}' to close {} opened at line {}, found {}",
                    what,
                    open.line,
                    self.peek()
                ),
                location: self.current_location(),
            });
        }
    }

    // ===== Skipping =====

    /// Skip a balanced group starting at the current opener (`(`, `[` or `{`),
    /// returning the skipped tokens including both delimiters.
    pub(crate) fn skip_balanced(&mut self) -> Result<Vec<Token>, ParseError> {
        let start = self.current_location();
        if !matches!(
            self.peek_kind(),
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace
        ) {
            return Err(self.error_here(format!("Expected '(', '[' or '{{', found {}", self.peek())));
        }
        let mut depth = 0usize;
        let mut skipped = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        skipped.push(self.advance());
                        return Ok(skipped);
                    }
                }
                TokenKind::Eof => {
                    return Err(ParseError {
                        message: "Unbalanced braces: group never closed".to_string(),
                        location: start,
                    });
                }
                _ => {}
            }
            skipped.push(self.advance());
        }
    }

    /// Skip a template argument list starting at the current `<`. Angle
    /// brackets inside parentheses do not count.
    pub(crate) fn skip_angle_group(&mut self) -> Result<Vec<Token>, ParseError> {
        let start = self.current_location();
        let mut angles = 0usize;
        let mut parens = 0usize;
        let mut skipped = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::Lt if parens == 0 => angles += 1,
                TokenKind::Gt if parens == 0 => {
                    angles = angles.saturating_sub(1);
                    if angles == 0 {
                        skipped.push(self.advance());
                        return Ok(skipped);
                    }
                }
                TokenKind::LParen => parens += 1,
                TokenKind::RParen => parens = parens.saturating_sub(1),
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => {
                    return Err(ParseError {
                        message: "Unterminated template argument list".to_string(),
                        location: start,
                    });
                }
                _ => {}
            }
            skipped.push(self.advance());
        }
    }

    /// Skip a declaration the model does not care about (free functions,
    /// variables, typedefs, using-declarations, out-of-line definitions).
    /// Stops after a `;` or after a braced body, and before a `}` that closes
    /// the enclosing block.
    pub(crate) fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let mut parens = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return Ok(()),
                TokenKind::Semicolon if parens == 0 => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::RBrace => return Ok(()),
                TokenKind::LBrace => {
                    self.skip_balanced()?;
                    if parens == 0 {
                        self.match_token(TokenKind::Semicolon);
                        return Ok(());
                    }
                }
                TokenKind::LParen => {
                    parens += 1;
                    self.advance();
                }
                TokenKind::RParen => {
                    parens = parens.saturating_sub(1);
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Error recovery: skip to the next `;` at the current depth (consumed),
    /// past one balanced `{...}` block (plus an optional `;`), or up to the
    /// `}` closing the current block (not consumed).
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        self.match_token(TokenKind::Semicolon);
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Record an error and resynchronize
    pub(crate) fn recover(&mut self, err: ParseError) {
        debug!(line = err.location.line, "recovering from parse error: {}", err.message);
        self.errors.push(err);
        self.synchronize();
    }
}

/// Join tokens into normalized type text: `const Class01 &` becomes
/// `const Class01&`, `list < Class02 >` becomes `list<Class02>`.
pub(crate) fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<TokenKind> = None;

    for token in tokens {
        let kind = token.kind;
        if let Some(p) = prev {
            let word_next = kind.is_word() || matches!(kind, TokenKind::Number | TokenKind::Ellipsis);
            let word_prev = p.is_word() || p == TokenKind::Number;
            let space = (word_prev && word_next)
                || p == TokenKind::Comma
                || (matches!(p, TokenKind::Star | TokenKind::Amp | TokenKind::Gt) && kind.is_word())
                || (kind == TokenKind::Eq || p == TokenKind::Eq)
                || (p == TokenKind::Template && kind == TokenKind::Lt);
            if space {
                out.push(' ');
            }
        }
        out.push_str(&token.text);
        prev = Some(kind);
    }

    out
}
