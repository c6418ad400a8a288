//! Declaration parsing implementation
//!
//! This module handles the namespace-level declarations of a C++ header:
//!
//! - Namespaces: `namespace a { ... }`, `inline namespace v1 { ... }`,
//!   chained `namespace a::b { ... }`
//! - Records: `class|struct|union Name [final] [: bases] { ... } [declarators];`
//! - Enums: `enum [class] Name [: type] { values };`
//! - Templates: `template <...>` in front of a record
//! - Linkage blocks: `extern "C" { ... }`
//!
//! # Grammar
//!
//! ```text
//! declaration ::= namespace_def | record_def | enum_def | template_decl
//!               | typedef_record | linkage_block | opaque_declaration
//! namespace_def ::= "inline"? "namespace" (identifier ("::" identifier)*)? "{" declaration* "}"
//! record_def  ::= record_key name_path? "final"? (":" base_list)? "{" member* "}" declarators? ";"
//!               | record_key name_path ";"
//! base_list   ::= base ("," base)*
//! base        ::= ("virtual" | access)* type_name
//! enum_def    ::= "enum" ("class" | "struct")? identifier? (":" type)? ("{" enumerators "}")? declarators? ";"
//! template_decl ::= "template" "<" template_params ">" (record_def | opaque_declaration)
//! ```
//!
//! Anything that is not one of these forms (free functions, variables,
//! using-declarations, out-of-line definitions) is skipped as an opaque
//! declaration. All parsing methods are implemented as `pub(crate)` methods
//! on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{join_tokens, ParseError, Parser};
use tracing::debug;

/// A declarator following a record or enum definition (`} a, *b;`), or one
/// of several fields declared together
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declarator {
    pub name: String,
    pub type_ref: String,
    pub location: SourceLocation,
}

impl Parser {
    /// Parse one namespace-level declaration, recovering on error
    pub(crate) fn parse_namespace_level_item(&mut self, out: &mut Vec<RawDeclaration>) {
        if let Err(err) = self.parse_namespace_level_item_inner(out) {
            self.recover(err);
        }
    }

    fn parse_namespace_level_item_inner(
        &mut self,
        out: &mut Vec<RawDeclaration>,
    ) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::Namespace => {
                if let Some(ns) = self.parse_namespace(false)? {
                    out.push(RawDeclaration::Namespace(ns));
                }
            }
            TokenKind::Inline if self.check_ahead(1, TokenKind::Namespace) => {
                self.advance();
                if let Some(ns) = self.parse_namespace(true)? {
                    out.push(RawDeclaration::Namespace(ns));
                }
            }
            TokenKind::Class | TokenKind::Struct | TokenKind::Union
                if self.record_head_is_declaration(self.position) =>
            {
                let (record, _) = self.parse_record()?;
                out.push(RawDeclaration::Record(record));
            }
            TokenKind::Enum if self.enum_head_is_declaration(self.position) => {
                let (decl, _) = self.parse_enum()?;
                out.push(RawDeclaration::Enum(decl));
            }
            TokenKind::Template => {
                let location = self.advance().location;
                if !self.check(TokenKind::Lt) {
                    // explicit instantiation
                    return self.skip_declaration();
                }
                let header = self.parse_template_header()?;
                if let Some(decl) = self.parse_templated_record(header, location)? {
                    out.push(decl);
                }
            }
            TokenKind::Typedef => self.parse_typedef(out)?,
            TokenKind::Extern
                if self.check_ahead(1, TokenKind::StringLiteral)
                    && self.check_ahead(2, TokenKind::LBrace) =>
            {
                self.advance();
                self.advance();
                let open = self.advance().location;
                while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                    self.parse_namespace_level_item(out);
                }
                self.close_block("linkage block", open);
            }
            _ => self.skip_declaration()?,
        }
        Ok(())
    }

    /// Parse a namespace definition: namespace a::b { declarations }
    ///
    /// Returns `None` for namespace aliases.
    pub(crate) fn parse_namespace(
        &mut self,
        is_inline: bool,
    ) -> Result<Option<NamespaceDecl>, ParseError> {
        let location = self.advance().location;
        self.skip_attributes()?;

        let mut names: Vec<(String, bool)> = Vec::new();
        if self.check(TokenKind::Ident) {
            names.push((self.advance().text, is_inline));
            while self.match_token(TokenKind::ColonColon) {
                let nested_inline = self.match_token(TokenKind::Inline);
                let name = self.expect_identifier("in nested namespace name")?;
                names.push((name, nested_inline));
            }
        }

        if self.check(TokenKind::Eq) {
            self.skip_declaration()?;
            return Ok(None);
        }

        let open = self
            .expect_token(TokenKind::LBrace, "Expected '{' after namespace name")?
            .location;

        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            self.parse_namespace_level_item(&mut body);
        }

        let what = match names.last() {
            Some((name, _)) => format!("namespace '{}'", name),
            None => "anonymous namespace".to_string(),
        };
        self.close_block(&what, open);

        if names.is_empty() {
            return Ok(Some(NamespaceDecl {
                name: None,
                is_inline,
                body,
                location,
            }));
        }

        // a::b::c desugars to nested namespaces, innermost first
        let mut decl: Option<NamespaceDecl> = None;
        for (name, inline) in names.into_iter().rev() {
            let inner = match decl.take() {
                Some(inner) => vec![RawDeclaration::Namespace(inner)],
                None => std::mem::take(&mut body),
            };
            decl = Some(NamespaceDecl {
                name: Some(name),
                is_inline: inline,
                body: inner,
                location,
            });
        }
        debug!(line = location.line, "parsed namespace");
        Ok(decl)
    }

    /// Decide, without consuming anything, whether the record keyword at
    /// `start` introduces a record declaration or is an elaborated type
    /// specifier inside some other declaration (`struct stat* p;`).
    pub(crate) fn record_head_is_declaration(&self, start: usize) -> bool {
        let mut i = self.skip_attributes_at(start + 1);
        let mut named = false;

        if self.kind_at(i) == TokenKind::ColonColon {
            i += 1;
        }
        while self.kind_at(i) == TokenKind::Ident {
            named = true;
            i += 1;
            if self.kind_at(i) == TokenKind::Lt {
                i = self.skip_angles_at(i);
            }
            if self.kind_at(i) == TokenKind::ColonColon {
                i += 1;
            } else {
                break;
            }
        }
        if self.kind_at(i) == TokenKind::Final {
            i += 1;
        }

        match self.kind_at(i) {
            TokenKind::LBrace
            | TokenKind::Colon
            | TokenKind::Public
            | TokenKind::Protected
            | TokenKind::Private
            | TokenKind::Virtual => true,
            TokenKind::Semicolon => named,
            // `class 42 {}` and friends are reported by parse_record
            _ => !named,
        }
    }

    /// Same decision as [`Parser::record_head_is_declaration`] for `enum`
    pub(crate) fn enum_head_is_declaration(&self, start: usize) -> bool {
        let mut i = start + 1;
        if matches!(self.kind_at(i), TokenKind::Class | TokenKind::Struct) {
            i += 1;
        }
        i = self.skip_attributes_at(i);
        let named = self.kind_at(i) == TokenKind::Ident;
        if named {
            i += 1;
        }
        match self.kind_at(i) {
            TokenKind::LBrace | TokenKind::Colon => true,
            TokenKind::Semicolon => named,
            _ => !named,
        }
    }

    /// Parse class/struct/union definition or forward declaration
    ///
    /// Returns the record and the declarators following its closing brace.
    pub(crate) fn parse_record(&mut self) -> Result<(RecordDecl, Vec<Declarator>), ParseError> {
        let keyword = self.advance();
        let kind = match keyword.kind {
            TokenKind::Class => RecordKind::Class,
            TokenKind::Struct => RecordKind::Struct,
            TokenKind::Union => RecordKind::Union,
            _ => {
                return Err(ParseError {
                    message: format!("Expected class, struct or union, found {}", keyword),
                    location: keyword.location,
                })
            }
        };
        let location = keyword.location;
        self.skip_attributes()?;

        let name = if self.check(TokenKind::Ident) || self.check(TokenKind::ColonColon) {
            self.parse_name_path()?
        } else {
            Vec::new()
        };
        self.match_token(TokenKind::Final);

        let mut record = RecordDecl {
            kind,
            name,
            bases: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
            is_definition: false,
            location,
        };

        if !record.is_anonymous() && self.match_token(TokenKind::Semicolon) {
            debug!(name = ?record.name, "parsed forward declaration");
            return Ok((record, Vec::new()));
        }

        if matches!(
            self.peek_kind(),
            TokenKind::Public | TokenKind::Protected | TokenKind::Private | TokenKind::Virtual
        ) {
            return Err(self.error_here(format!(
                "Expected ':' before base class list of {} '{}', found {}",
                kind.keyword(),
                record.name.join("::"),
                self.peek()
            )));
        }

        if self.match_token(TokenKind::Colon) {
            record.bases = self.parse_base_list(&record)?;
        }

        let open = if record.is_anonymous() {
            self.expect_token(
                TokenKind::LBrace,
                &format!("Expected {} name or '{{'", kind.keyword()),
            )?
        } else {
            self.expect_token(
                TokenKind::LBrace,
                &format!("Expected '{{' to open body of {} '{}'", kind.keyword(), record.name.join("::")),
            )?
        }
        .location;

        record.is_definition = true;
        self.parse_record_body(&mut record, open);

        let base_type = record
            .name
            .last()
            .cloned()
            .unwrap_or_else(|| kind.keyword().to_string());
        let declarators = match self.parse_trailing_declarators(&base_type) {
            Ok(declarators) => declarators,
            Err(err) => {
                // The record itself is complete; keep it
                self.errors.push(err);
                Vec::new()
            }
        };

        debug!(
            name = ?record.name,
            members = record.members.len(),
            nested = record.nested.len(),
            "parsed record"
        );
        Ok((record, declarators))
    }

    /// Parse a (possibly qualified) record name, keeping specialization
    /// arguments on the segment they follow: `Outer::Inner<int>`
    fn parse_name_path(&mut self) -> Result<Vec<String>, ParseError> {
        self.match_token(TokenKind::ColonColon);
        let mut segments = Vec::new();
        loop {
            let ident = self.expect_token(TokenKind::Ident, "Expected name")?;
            let mut tokens = vec![ident];
            if self.check(TokenKind::Lt) {
                tokens.extend(self.skip_angle_group()?);
            }
            segments.push(join_tokens(&tokens));
            if !(self.check(TokenKind::ColonColon) && self.check_ahead(1, TokenKind::Ident)) {
                break;
            }
            self.advance();
        }
        Ok(segments)
    }

    /// Parse base specifiers after ':' up to (not including) '{'
    fn parse_base_list(&mut self, record: &RecordDecl) -> Result<Vec<BaseSpecifier>, ParseError> {
        let default_access = record.kind.default_access();
        let own_name = record.name.last().map(String::as_str);
        let mut bases = Vec::new();

        loop {
            let location = self.current_location();
            let mut access = None;
            let mut is_virtual = false;
            loop {
                match self.peek_kind() {
                    TokenKind::Virtual => is_virtual = true,
                    TokenKind::Public => access = Some(Access::Public),
                    TokenKind::Protected => access = Some(Access::Protected),
                    TokenKind::Private => access = Some(Access::Private),
                    _ => break,
                }
                self.advance();
            }

            let mut tokens = Vec::new();
            loop {
                match self.peek_kind() {
                    TokenKind::Comma | TokenKind::LBrace => break,
                    TokenKind::Lt => tokens.extend(self.skip_angle_group()?),
                    TokenKind::Ident | TokenKind::ColonColon | TokenKind::Typename | TokenKind::Ellipsis => {
                        tokens.push(self.advance())
                    }
                    _ => {
                        return Err(self.error_here(format!(
                            "Unexpected {} in base class list",
                            self.peek()
                        )))
                    }
                }
            }
            if tokens.is_empty() {
                return Err(self.error_here(format!(
                    "Expected base class name, found {}",
                    self.peek()
                )));
            }

            let text = join_tokens(&tokens);
            if record.name.len() == 1 && Some(text.trim_start_matches("::")) == own_name {
                return Err(ParseError {
                    message: format!("'{}' cannot inherit from itself", text),
                    location,
                });
            }

            bases.push(BaseSpecifier {
                text,
                access: access.unwrap_or(default_access),
                is_virtual,
                location,
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(bases)
    }

    /// Parse enum definition or opaque declaration
    pub(crate) fn parse_enum(&mut self) -> Result<(EnumDecl, Vec<Declarator>), ParseError> {
        let location = self.advance().location;
        let is_scoped = self.match_token(TokenKind::Class) || self.match_token(TokenKind::Struct);
        self.skip_attributes()?;

        let name = if self.check(TokenKind::Ident) {
            Some(self.advance().text)
        } else {
            None
        };

        let underlying = if self.match_token(TokenKind::Colon) {
            let mut tokens = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::LBrace | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            ) {
                tokens.push(self.advance());
            }
            Some(join_tokens(&tokens))
        } else {
            None
        };

        let mut decl = EnumDecl {
            name,
            is_scoped,
            underlying,
            values: Vec::new(),
            is_definition: false,
            location,
        };

        if decl.name.is_some() && self.match_token(TokenKind::Semicolon) {
            return Ok((decl, Vec::new()));
        }

        let open = self
            .expect_token(TokenKind::LBrace, "Expected '{' to open enum body")?
            .location;
        decl.is_definition = true;

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let value = self.expect_identifier("as enumerator name")?;
            decl.values.push(value);
            // Drop attributes and initializers up to the next enumerator
            loop {
                match self.peek_kind() {
                    TokenKind::Comma => {
                        self.advance();
                        break;
                    }
                    TokenKind::RBrace | TokenKind::Eof => break,
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                        self.skip_balanced()?;
                    }
                    _ => {
                        self.advance();
                    }
                }
            }
        }

        let what = match &decl.name {
            Some(name) => format!("enum '{}'", name),
            None => "anonymous enum".to_string(),
        };
        self.close_block(&what, open);

        let base_type = decl.name.clone().unwrap_or_else(|| "enum".to_string());
        let declarators = match self.parse_trailing_declarators(&base_type) {
            Ok(declarators) => declarators,
            Err(err) => {
                self.errors.push(err);
                Vec::new()
            }
        };

        Ok((decl, declarators))
    }

    /// Parse a template parameter list: '<' params '>'
    ///
    /// Keeps the name of each parameter (the last identifier before any
    /// default argument) and the normalized header text.
    pub(crate) fn parse_template_header(&mut self) -> Result<TemplateHeader, ParseError> {
        let group = self.skip_angle_group()?;
        let inner = &group[1..group.len() - 1];

        let mut params = Vec::new();
        let mut texts = Vec::new();
        let mut angles = 0usize;
        let mut parens = 0usize;
        let mut start = 0;

        for (i, token) in inner.iter().enumerate() {
            match token.kind {
                TokenKind::Lt => angles += 1,
                TokenKind::Gt => angles = angles.saturating_sub(1),
                TokenKind::LParen => parens += 1,
                TokenKind::RParen => parens = parens.saturating_sub(1),
                _ => {}
            }
            let at_end = i + 1 == inner.len();
            let split = token.kind == TokenKind::Comma && angles == 0 && parens == 0;
            if split || at_end {
                let end = if split { i } else { i + 1 };
                let param = &inner[start..end];
                if !param.is_empty() {
                    let declared = match param.iter().position(|t| t.kind == TokenKind::Eq) {
                        Some(eq) => &param[..eq],
                        None => param,
                    };
                    if declared.len() >= 2 {
                        if let Some(last) = declared.last().filter(|t| t.kind == TokenKind::Ident) {
                            params.push(last.text.clone());
                        }
                    }
                    texts.push(join_tokens(param));
                }
                start = i + 1;
            }
        }

        Ok(TemplateHeader {
            params,
            text: format!("template <{}>", texts.join(", ")),
        })
    }

    /// After a template header: a record becomes a [`TemplateDecl`],
    /// anything else (function, variable and alias templates) is skipped.
    pub(crate) fn parse_templated_record(
        &mut self,
        header: TemplateHeader,
        location: SourceLocation,
    ) -> Result<Option<RawDeclaration>, ParseError> {
        match self.peek_kind() {
            TokenKind::Class | TokenKind::Struct | TokenKind::Union
                if self.record_head_is_declaration(self.position) =>
            {
                let (record, _) = self.parse_record()?;
                Ok(Some(RawDeclaration::Template(TemplateDecl {
                    header,
                    declaration: Box::new(RawDeclaration::Record(record)),
                    location,
                })))
            }
            _ => {
                self.skip_declaration()?;
                Ok(None)
            }
        }
    }

    /// typedef struct [Tag] { ... } Alias;
    pub(crate) fn parse_typedef(&mut self, out: &mut Vec<RawDeclaration>) -> Result<(), ParseError> {
        let next = self.position + 1;
        match self.kind_at(next) {
            TokenKind::Class | TokenKind::Struct | TokenKind::Union
                if self.record_head_is_declaration(next) =>
            {
                self.advance();
                let (mut record, declarators) = self.parse_record()?;
                if record.is_anonymous() {
                    if let Some(alias) = plain_declarator(&declarators, record.kind.keyword()) {
                        record.name = vec![alias];
                    }
                }
                out.push(RawDeclaration::Record(record));
            }
            TokenKind::Enum if self.enum_head_is_declaration(next) => {
                self.advance();
                let (mut decl, declarators) = self.parse_enum()?;
                if decl.name.is_none() {
                    decl.name = plain_declarator(&declarators, "enum");
                }
                out.push(RawDeclaration::Enum(decl));
            }
            _ => self.skip_declaration()?,
        }
        Ok(())
    }

    /// Parse `[declarator (, declarator)*] ;` after a closing brace
    pub(crate) fn parse_trailing_declarators(
        &mut self,
        base_type: &str,
    ) -> Result<Vec<Declarator>, ParseError> {
        let mut declarators = Vec::new();
        // EOF inside the body was already reported
        if self.is_at_end() || self.match_token(TokenKind::Semicolon) {
            return Ok(declarators);
        }
        loop {
            declarators.push(self.parse_declarator(base_type)?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect_semicolon("after declaration")?;
        Ok(declarators)
    }

    /// Parse one declarator: `*name[3] = init`
    pub(crate) fn parse_declarator(&mut self, base_type: &str) -> Result<Declarator, ParseError> {
        let mut type_ref = base_type.to_string();
        loop {
            match self.peek_kind() {
                TokenKind::Star | TokenKind::Amp => type_ref.push_str(&self.advance().text),
                TokenKind::Const | TokenKind::Volatile => {
                    type_ref.push(' ');
                    type_ref.push_str(&self.advance().text);
                }
                _ => break,
            }
        }
        let location = self.current_location();
        let name = self.expect_identifier("in declarator")?;
        self.parse_declarator_tail(&mut type_ref)?;
        Ok(Declarator {
            name,
            type_ref,
            location,
        })
    }

    /// Array bounds (folded into the type), bit-field width and initializer
    pub(crate) fn parse_declarator_tail(&mut self, type_ref: &mut String) -> Result<(), ParseError> {
        while self.check(TokenKind::LBracket) {
            let bounds = self.skip_balanced()?;
            type_ref.push_str(&join_tokens(&bounds));
        }
        if self.match_token(TokenKind::Colon) {
            self.skip_initializer()?;
        }
        if self.match_token(TokenKind::Eq) {
            self.skip_initializer()?;
        } else if self.check(TokenKind::LBrace) {
            self.skip_balanced()?;
        }
        Ok(())
    }

    /// Skip an initializer expression up to the next ',' or ';'
    pub(crate) fn skip_initializer(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => {
                    return Ok(())
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    self.skip_balanced()?;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip `[[...]]`, `alignas(...)` and `__attribute__((...))`
    pub(crate) fn skip_attributes(&mut self) -> Result<(), ParseError> {
        loop {
            if self.check(TokenKind::LBracket) && self.check_ahead(1, TokenKind::LBracket) {
                self.skip_balanced()?;
            } else if self.check(TokenKind::Ident)
                && is_attribute_word(&self.peek().text)
                && self.check_ahead(1, TokenKind::LParen)
            {
                self.advance();
                self.skip_balanced()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_attributes_at(&self, mut i: usize) -> usize {
        loop {
            let kind = self.kind_at(i);
            if kind == TokenKind::LBracket && self.kind_at(i + 1) == TokenKind::LBracket {
                i = self.skip_group_at(i);
            } else if kind == TokenKind::Ident
                && self.tokens.get(i).is_some_and(|t| is_attribute_word(&t.text))
                && self.kind_at(i + 1) == TokenKind::LParen
            {
                i = self.skip_group_at(i + 1);
            } else {
                return i;
            }
        }
    }

    pub(crate) fn kind_at(&self, i: usize) -> TokenKind {
        self.tokens.get(i).map_or(TokenKind::Eof, |t| t.kind)
    }

    /// Index just past the balanced group opening at `i`
    fn skip_group_at(&self, mut i: usize) -> usize {
        let mut depth = 0usize;
        loop {
            match self.kind_at(i) {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                TokenKind::Eof => return i,
                _ => {}
            }
            i += 1;
        }
    }

    /// Index just past the template argument list opening at `i`
    fn skip_angles_at(&self, mut i: usize) -> usize {
        let mut depth = 0usize;
        loop {
            match self.kind_at(i) {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => {
                    return i
                }
                _ => {}
            }
            i += 1;
        }
    }
}

fn is_attribute_word(word: &str) -> bool {
    matches!(word, "alignas" | "__attribute__" | "__declspec")
}

/// First declarator naming the type itself rather than a pointer to it
fn plain_declarator(declarators: &[Declarator], base_type: &str) -> Option<String> {
    declarators
        .iter()
        .find(|d| d.type_ref == base_type)
        .map(|d| d.name.clone())
}
