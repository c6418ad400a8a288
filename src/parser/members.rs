//! Record body parsing
//!
//! Handles everything between the braces of a class, struct or union:
//! access labels, nested types, member templates, fields and methods.
//!
//! # Grammar
//!
//! ```text
//! member      ::= access ":" | nested_type | "template" "<" params ">" member
//!               | field_decl | method_decl | skipped_decl | ";"
//! field_decl  ::= specifier* type declarator ("," declarator)* ";"
//! method_decl ::= specifier* type? method_name "(" params ")" qualifier*
//!                 ("=" ("0" | "delete" | "default"))? (";" | ctor_init? body)
//! method_name ::= identifier | "~" identifier | "operator" operator_symbol
//! ```
//!
//! `friend`, `using`, `typedef` (other than a typedef'd record) and
//! `static_assert` are skipped.

use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::{join_tokens, ParseError, Parser};
use tracing::debug;

impl Parser {
    /// Parse members up to and including the closing '}'
    pub(crate) fn parse_record_body(&mut self, record: &mut RecordDecl, open: SourceLocation) {
        let mut access = record.kind.default_access();
        let own_name = record
            .name
            .last()
            .map(|n| n.split('<').next().unwrap_or_default().to_string())
            .unwrap_or_default();

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if let Err(err) = self.parse_member_item(record, &mut access, &own_name) {
                self.recover(err);
            }
        }

        let what = if record.is_anonymous() {
            format!("anonymous {}", record.kind.keyword())
        } else {
            format!("{} '{}'", record.kind.keyword(), record.name.join("::"))
        };
        self.close_block(&what, open);
    }

    fn parse_member_item(
        &mut self,
        record: &mut RecordDecl,
        access: &mut Access,
        own_name: &str,
    ) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
                let label = self.advance();
                if !self.match_token(TokenKind::Colon) {
                    return Err(self.error_here(format!(
                        "Expected ':' after access specifier '{}', found {}",
                        label.text,
                        self.peek()
                    )));
                }
                *access = match label.kind {
                    TokenKind::Public => Access::Public,
                    TokenKind::Protected => Access::Protected,
                    _ => Access::Private,
                };
            }
            TokenKind::Class | TokenKind::Struct | TokenKind::Union
                if self.record_head_is_declaration(self.position) =>
            {
                let (nested, declarators) = self.parse_record()?;
                record
                    .members
                    .extend(declarators.into_iter().map(|d| field(d, *access)));
                record.nested.push(RawDeclaration::Record(nested));
            }
            TokenKind::Enum if self.enum_head_is_declaration(self.position) => {
                let (nested, declarators) = self.parse_enum()?;
                record
                    .members
                    .extend(declarators.into_iter().map(|d| field(d, *access)));
                record.nested.push(RawDeclaration::Enum(nested));
            }
            TokenKind::Template => {
                let location = self.advance().location;
                if !self.check(TokenKind::Lt) {
                    return self.skip_declaration();
                }
                let header = self.parse_template_header()?;
                match self.peek_kind() {
                    TokenKind::Class | TokenKind::Struct | TokenKind::Union
                        if self.record_head_is_declaration(self.position) =>
                    {
                        if let Some(decl) = self.parse_templated_record(header, location)? {
                            record.nested.push(decl);
                        }
                    }
                    TokenKind::Friend | TokenKind::Using => self.skip_declaration()?,
                    _ => {
                        let members =
                            self.parse_member_declaration(*access, own_name, &header.params)?;
                        record.members.extend(members);
                    }
                }
            }
            TokenKind::Typedef => {
                let mut nested = Vec::new();
                self.parse_typedef(&mut nested)?;
                record.nested.extend(nested);
            }
            TokenKind::Friend | TokenKind::Using | TokenKind::StaticAssert => {
                self.skip_declaration()?;
            }
            // A stray token before a declaration is dropped on its own
            kind if is_stray(kind) => {
                let err = self.error_here(format!("Unexpected {} in class body", self.peek()));
                self.errors.push(err);
                self.advance();
            }
            _ => {
                let members = self.parse_member_declaration(*access, own_name, &[])?;
                record.members.extend(members);
            }
        }
        Ok(())
    }

    /// Parse a field or method declaration
    pub(crate) fn parse_member_declaration(
        &mut self,
        access: Access,
        own_name: &str,
        template_params: &[String],
    ) -> Result<Vec<RawMember>, ParseError> {
        let location = self.current_location();
        let mut flags = MemberFlags::empty();

        // Leading specifiers
        loop {
            match self.peek_kind() {
                TokenKind::Static => flags |= MemberFlags::STATIC,
                TokenKind::Virtual => flags |= MemberFlags::VIRTUAL,
                TokenKind::Inline | TokenKind::Mutable | TokenKind::Constexpr | TokenKind::Extern => {}
                TokenKind::Explicit => {
                    self.advance();
                    if self.check(TokenKind::LParen) {
                        self.skip_balanced()?;
                    }
                    continue;
                }
                TokenKind::Ident if matches!(self.peek().text.as_str(), "consteval" | "constinit") => {}
                TokenKind::LBracket if self.check_ahead(1, TokenKind::LBracket) => {
                    self.skip_balanced()?;
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        // Type and declarator name, up to the first token that ends the head
        let mut head: Vec<Token> = Vec::new();
        let mut operator_name = None;
        loop {
            match self.peek_kind() {
                TokenKind::Operator => {
                    operator_name = Some(self.parse_operator_name()?);
                    break;
                }
                TokenKind::Lt if !head.is_empty() => head.extend(self.skip_angle_group()?),
                TokenKind::LParen
                | TokenKind::Semicolon
                | TokenKind::Eq
                | TokenKind::LBrace
                | TokenKind::Comma
                | TokenKind::LBracket
                | TokenKind::Colon
                | TokenKind::RBrace
                | TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Eof => break,
                kind if is_stray(kind) => {
                    return Err(self.error_here(format!(
                        "Unexpected {} in member declaration",
                        self.peek()
                    )))
                }
                _ => head.push(self.advance()),
            }
        }

        if operator_name.is_some() || self.check(TokenKind::LParen) {
            if operator_name.is_none()
                && (self.check_ahead(1, TokenKind::Star) || self.check_ahead(1, TokenKind::Amp))
            {
                return self
                    .parse_function_pointer_field(&head, access, flags, location)
                    .map(|member| vec![member]);
            }
            return self
                .parse_method(head, operator_name, access, flags, own_name, template_params, location)
                .map(|member| vec![member]);
        }

        self.parse_fields(head, access, flags, location)
    }

    /// operator=, operator(), operator<<, operator new[], operator bool
    fn parse_operator_name(&mut self) -> Result<String, ParseError> {
        self.advance();
        if self.check(TokenKind::LParen) && self.check_ahead(1, TokenKind::RParen) {
            self.advance();
            self.advance();
            return Ok("operator()".to_string());
        }

        let mut symbol = Vec::new();
        while !self.check(TokenKind::LParen) {
            if matches!(
                self.peek_kind(),
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof
            ) {
                return Err(self.error_here(format!(
                    "Expected operator symbol and '(', found {}",
                    self.peek()
                )));
            }
            symbol.push(self.advance());
        }

        match symbol.first() {
            None => Err(self.error_here("Expected operator symbol")),
            Some(first) if first.kind.is_word() => Ok(format!("operator {}", join_tokens(&symbol))),
            Some(_) => Ok(format!(
                "operator{}",
                symbol.iter().map(|t| t.text.as_str()).collect::<String>()
            )),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_method(
        &mut self,
        mut head: Vec<Token>,
        operator_name: Option<String>,
        access: Access,
        mut flags: MemberFlags,
        own_name: &str,
        template_params: &[String],
        location: SourceLocation,
    ) -> Result<RawMember, ParseError> {
        let name = match operator_name {
            Some(name) => name,
            None => {
                let last = head
                    .pop()
                    .ok_or_else(|| self.error_here(format!("Expected member name before {}", self.peek())))?;
                if last.kind != TokenKind::Ident {
                    return Err(ParseError {
                        message: format!("Expected member name, found {}", last),
                        location: last.location,
                    });
                }
                if head.last().is_some_and(|t| t.kind == TokenKind::Tilde) {
                    head.pop();
                    flags |= MemberFlags::DESTRUCTOR;
                    format!("~{}", last.text)
                } else {
                    last.text
                }
            }
        };
        if head.is_empty() && name == own_name {
            flags |= MemberFlags::CONSTRUCTOR;
        }
        let mut type_ref = join_tokens(&head);

        if !self.check(TokenKind::LParen) {
            return Err(self.error_here(format!(
                "Expected '(' after member name '{}', found {}",
                name,
                self.peek()
            )));
        }
        let params = self.parse_parameter_list()?;

        // Trailing qualifiers
        loop {
            match self.peek_kind() {
                TokenKind::Const => {
                    flags |= MemberFlags::CONST;
                    self.advance();
                }
                TokenKind::Volatile | TokenKind::Amp => {
                    self.advance();
                }
                TokenKind::Override => {
                    flags |= MemberFlags::OVERRIDE;
                    self.advance();
                }
                TokenKind::Final => {
                    flags |= MemberFlags::FINAL;
                    self.advance();
                }
                TokenKind::Noexcept => {
                    self.advance();
                    if self.check(TokenKind::LParen) {
                        self.skip_balanced()?;
                    }
                }
                TokenKind::Ident if self.peek().text == "throw" && self.check_ahead(1, TokenKind::LParen) => {
                    self.advance();
                    self.skip_balanced()?;
                }
                TokenKind::LBracket if self.check_ahead(1, TokenKind::LBracket) => {
                    self.skip_balanced()?;
                }
                TokenKind::Arrow => {
                    self.advance();
                    let mut ret = Vec::new();
                    loop {
                        match self.peek_kind() {
                            TokenKind::Semicolon
                            | TokenKind::LBrace
                            | TokenKind::Eq
                            | TokenKind::Override
                            | TokenKind::Final
                            | TokenKind::RBrace
                            | TokenKind::Eof => break,
                            TokenKind::Lt => ret.extend(self.skip_angle_group()?),
                            _ => ret.push(self.advance()),
                        }
                    }
                    if type_ref.is_empty() || type_ref.ends_with("auto") {
                        type_ref = join_tokens(&ret);
                    }
                }
                _ => break,
            }
        }

        if self.match_token(TokenKind::Eq) {
            let spec = self.advance();
            match spec.kind {
                TokenKind::Number if spec.text == "0" => {
                    flags |= MemberFlags::PURE_VIRTUAL | MemberFlags::VIRTUAL
                }
                TokenKind::Delete => flags |= MemberFlags::DELETED,
                TokenKind::Default => flags |= MemberFlags::DEFAULTED,
                _ => {
                    return Err(ParseError {
                        message: format!(
                            "Expected '0', 'delete' or 'default' after '=' in declaration of '{}', found {}",
                            name, spec
                        ),
                        location: spec.location,
                    })
                }
            }
            self.expect_semicolon(&format!("after declaration of '{}'", name))?;
        } else if self.check(TokenKind::LBrace) {
            self.skip_balanced()?;
            self.match_token(TokenKind::Semicolon);
        } else if self.match_token(TokenKind::Colon) {
            self.skip_constructor_initializers(&name)?;
            self.skip_balanced()?;
            self.match_token(TokenKind::Semicolon);
        } else {
            self.expect_semicolon(&format!("after declaration of '{}'", name))?;
        }

        debug!(method = %name, "parsed method");
        Ok(RawMember {
            name,
            type_ref,
            access,
            kind: MemberKind::Method { params },
            flags,
            template_params: template_params.to_vec(),
            location,
        })
    }

    /// Skip `: a(1), b{2}, Base(x)` up to the body's opening brace
    fn skip_constructor_initializers(&mut self, name: &str) -> Result<(), ParseError> {
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.skip_balanced()?;
                }
                TokenKind::LBrace => {
                    let previous = self.tokens[self.position.saturating_sub(1)].kind;
                    if matches!(previous, TokenKind::Ident | TokenKind::Gt) {
                        self.skip_balanced()?;
                    } else {
                        return Ok(());
                    }
                }
                TokenKind::Lt => {
                    self.skip_angle_group()?;
                }
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => {
                    return Err(self.error_here(format!(
                        "Expected body after initializer list of '{}', found {}",
                        name,
                        self.peek()
                    )))
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse '(' params ')' into typed, optionally named parameters
    fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let group = self.skip_balanced()?;
        let inner = group.get(1..group.len().saturating_sub(1)).unwrap_or_default();

        let mut pieces: Vec<&[Token]> = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, token) in inner.iter().enumerate() {
            match token.kind {
                TokenKind::Lt | TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::Gt | TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comma if depth == 0 => {
                    pieces.push(&inner[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if start < inner.len() {
            pieces.push(&inner[start..]);
        }

        if pieces.len() == 1 && pieces[0].len() == 1 && pieces[0][0].text == "void" {
            return Ok(Vec::new());
        }

        Ok(pieces
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .map(param_from_tokens)
            .collect())
    }

    /// `void (*callback)(int);`
    fn parse_function_pointer_field(
        &mut self,
        head: &[Token],
        access: Access,
        flags: MemberFlags,
        location: SourceLocation,
    ) -> Result<RawMember, ParseError> {
        self.advance();
        let pointer = self.advance();
        let name = self.expect_identifier("in function pointer declaration")?;
        self.expect_token(TokenKind::RParen, "Expected ')' after function pointer name")?;
        let params = if self.check(TokenKind::LParen) {
            join_tokens(&self.skip_balanced()?)
        } else {
            String::new()
        };
        let mut type_ref = format!("{}({}){}", join_tokens(head), pointer.text, params);
        self.parse_declarator_tail(&mut type_ref)?;
        self.expect_semicolon(&format!("after member '{}'", name))?;

        Ok(RawMember {
            name,
            type_ref,
            access,
            kind: MemberKind::Field,
            flags: flags & MemberFlags::STATIC,
            template_params: Vec::new(),
            location,
        })
    }

    /// Parse one or more comma-separated field declarators
    fn parse_fields(
        &mut self,
        mut head: Vec<Token>,
        access: Access,
        flags: MemberFlags,
        location: SourceLocation,
    ) -> Result<Vec<RawMember>, ParseError> {
        // An identifier alone in front of a label or '}' is a macro invocation
        if head.len() == 1
            && head[0].kind == TokenKind::Ident
            && matches!(
                self.peek_kind(),
                TokenKind::Public | TokenKind::Protected | TokenKind::Private | TokenKind::RBrace
            )
        {
            debug!(macro_name = %head[0].text, "skipping macro invocation in class body");
            return Ok(Vec::new());
        }

        let name = match head.pop() {
            Some(token) if token.kind == TokenKind::Ident => token,
            Some(token) => {
                return Err(ParseError {
                    message: format!("Expected member name, found {}", token),
                    location: token.location,
                })
            }
            None => {
                return Err(self.error_here(format!("Expected member declaration, found {}", self.peek())))
            }
        };
        if head.is_empty() {
            return Err(ParseError {
                message: format!("Expected type before member name '{}'", name.text),
                location: name.location,
            });
        }

        let mut type_ref = join_tokens(&head);
        while head
            .last()
            .is_some_and(|t| matches!(t.kind, TokenKind::Star | TokenKind::Amp))
        {
            head.pop();
        }
        let base_type = join_tokens(&head);

        self.parse_declarator_tail(&mut type_ref)?;
        let field_flags = flags & MemberFlags::STATIC;
        let mut fields = vec![RawMember {
            name: name.text,
            type_ref,
            access,
            kind: MemberKind::Field,
            flags: field_flags,
            template_params: Vec::new(),
            location,
        }];

        while self.match_token(TokenKind::Comma) {
            let declarator = self.parse_declarator(&base_type)?;
            fields.push(RawMember {
                name: declarator.name,
                type_ref: declarator.type_ref,
                access,
                kind: MemberKind::Field,
                flags: field_flags,
                template_params: Vec::new(),
                location: declarator.location,
            });
        }

        self.expect_semicolon(&format!("after member '{}'", fields[0].name))?;
        Ok(fields)
    }
}

/// Tokens that can never be part of a member's type or name
fn is_stray(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::Punct
            | TokenKind::Number
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
    )
}

fn field(declarator: crate::parser::declarations::Declarator, access: Access) -> RawMember {
    RawMember {
        name: declarator.name,
        type_ref: declarator.type_ref,
        access,
        kind: MemberKind::Field,
        flags: MemberFlags::empty(),
        template_params: Vec::new(),
        location: declarator.location,
    }
}

fn param_from_tokens(tokens: &[Token]) -> Param {
    // Default argument
    let tokens = match tokens.iter().position(|t| t.kind == TokenKind::Eq) {
        Some(eq) => &tokens[..eq],
        None => tokens,
    };

    // Function pointer parameters keep their full text
    if tokens.iter().any(|t| t.kind == TokenKind::LParen) {
        return Param {
            type_ref: join_tokens(tokens),
            name: None,
        };
    }

    let (tokens, suffix) = match tokens.iter().position(|t| t.kind == TokenKind::LBracket) {
        Some(bracket) => (&tokens[..bracket], join_tokens(&tokens[bracket..])),
        None => (tokens, String::new()),
    };

    let named = match tokens.split_last() {
        Some((last, rest)) => {
            last.kind == TokenKind::Ident
                && !is_builtin_type(&last.text)
                && rest.last().is_some_and(|t| t.kind != TokenKind::ColonColon)
                && rest
                    .iter()
                    .any(|t| matches!(t.kind, TokenKind::Ident | TokenKind::Gt | TokenKind::Star | TokenKind::Amp))
        }
        None => false,
    };

    if named {
        let (last, rest) = (&tokens[tokens.len() - 1], &tokens[..tokens.len() - 1]);
        Param {
            type_ref: format!("{}{}", join_tokens(rest), suffix),
            name: Some(last.text.clone()),
        }
    } else {
        Param {
            type_ref: format!("{}{}", join_tokens(tokens), suffix),
            name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::parse_header;
    use pretty_assertions::assert_eq;

    fn parse_class(source: &str) -> RecordDecl {
        let parsed = parse_header(source).unwrap();
        assert!(parsed.errors.is_empty(), "unexpected errors: {:?}", parsed.errors);
        match parsed.unit.declarations.into_iter().next() {
            Some(RawDeclaration::Record(r)) => r,
            Some(RawDeclaration::Template(t)) => match *t.declaration {
                RawDeclaration::Record(r) => r,
                other => panic!("expected record, got {:?}", other),
            },
            other => panic!("expected record, got {:?}", other),
        }
    }

    fn member<'a>(record: &'a RecordDecl, name: &str) -> &'a RawMember {
        record
            .members
            .iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("no member named {}", name))
    }

    #[test]
    fn test_access_labels_and_defaults() {
        let class = parse_class("class A { int a; public: int b; protected: int c; private: int d; };");
        let accesses: Vec<_> = class.members.iter().map(|m| (m.name.as_str(), m.access)).collect();
        assert_eq!(
            accesses,
            vec![
                ("a", Access::Private),
                ("b", Access::Public),
                ("c", Access::Protected),
                ("d", Access::Private),
            ]
        );

        let s = parse_class("struct S { int a; };");
        assert_eq!(s.members[0].access, Access::Public);
    }

    #[test]
    fn test_fields_with_declarators_arrays_and_bitfields() {
        let class = parse_class(
            "struct P { float coords[3]; int a = 1, *b, c{2}; unsigned flag : 1; static const int count = 4; std::map<int, std::string> names; };",
        );

        let fields: Vec<_> = class
            .members
            .iter()
            .map(|m| (m.name.as_str(), m.type_ref.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("coords", "float[3]"),
                ("a", "int"),
                ("b", "int*"),
                ("c", "int"),
                ("flag", "unsigned"),
                ("count", "const int"),
                ("names", "std::map<int, std::string>"),
            ]
        );
        assert!(member(&class, "count").flags.contains(MemberFlags::STATIC));
    }

    #[test]
    fn test_method_qualifiers() {
        let class = parse_class(
            "class Shape {\npublic:\n  virtual ~Shape() = default;\n  virtual double area() const = 0;\n  static Shape* make(const std::string& kind, int sides = 3);\n  void draw() const noexcept override final { render(); }\n  auto size() const -> std::size_t;\n};",
        );

        let dtor = member(&class, "~Shape");
        assert!(dtor.flags.contains(MemberFlags::DESTRUCTOR | MemberFlags::DEFAULTED | MemberFlags::VIRTUAL));

        let area = member(&class, "area");
        assert!(area.flags.contains(MemberFlags::PURE_VIRTUAL | MemberFlags::CONST));
        assert_eq!(area.type_ref, "double");

        let make = member(&class, "make");
        assert!(make.flags.contains(MemberFlags::STATIC));
        assert_eq!(make.type_ref, "Shape*");
        assert_eq!(
            make.params(),
            &[
                Param {
                    type_ref: "const std::string&".to_string(),
                    name: Some("kind".to_string())
                },
                Param {
                    type_ref: "int".to_string(),
                    name: Some("sides".to_string())
                },
            ]
        );

        let draw = member(&class, "draw");
        assert!(draw.flags.contains(MemberFlags::CONST | MemberFlags::OVERRIDE | MemberFlags::FINAL));

        assert_eq!(member(&class, "size").type_ref, "std::size_t");
    }

    #[test]
    fn test_constructors_and_initializer_lists() {
        let class = parse_class(
            "class Counter {\npublic:\n  Counter() : value_(0), step_{1} { reset(); }\n  explicit Counter(int v);\n  Counter(const Counter&) = delete;\nprivate:\n  int value_;\n  int step_;\n};",
        );

        let ctors: Vec<_> = class
            .members
            .iter()
            .filter(|m| m.flags.contains(MemberFlags::CONSTRUCTOR))
            .collect();
        assert_eq!(ctors.len(), 3);
        assert!(ctors[2].flags.contains(MemberFlags::DELETED));
        assert_eq!(ctors[2].params()[0].type_ref, "const Counter&");
        assert_eq!(ctors[2].params()[0].name, None);
        assert_eq!(class.members.len(), 5);
    }

    #[test]
    fn test_operators() {
        let class = parse_class(
            "class Vec {\npublic:\n  Vec& operator=(const Vec& other) = delete;\n  bool operator==(const Vec& o) const;\n  float operator()(int i) const;\n  friend std::ostream& operator<<(std::ostream& os, const Vec& v);\n  explicit operator bool() const;\n  void* operator new[](std::size_t n);\n};",
        );

        let names: Vec<_> = class.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["operator=", "operator==", "operator()", "operator bool", "operator new[]"]
        );
        assert!(member(&class, "operator=").flags.contains(MemberFlags::DELETED));
        assert_eq!(member(&class, "operator bool").type_ref, "");
    }

    #[test]
    fn test_function_pointer_field() {
        let class = parse_class("struct Callbacks { void (*on_event)(int code, void* data); int (&table)[4]; };");

        assert_eq!(member(&class, "on_event").type_ref, "void(*)(int code, void* data)");
        assert_eq!(member(&class, "on_event").kind, MemberKind::Field);
    }

    #[test]
    fn test_nested_types_and_declarators() {
        let class = parse_class(
            "class Outer {\n  struct Inner { int v; } first, second;\n  union { int i; float f; };\n  enum class State { Idle, Busy } state;\n};",
        );

        assert_eq!(class.nested.len(), 3);
        let fields: Vec<_> = class
            .members
            .iter()
            .map(|m| (m.name.as_str(), m.type_ref.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![("first", "Inner"), ("second", "Inner"), ("state", "State")]
        );
    }

    #[test]
    fn test_member_templates_and_skipped_declarations() {
        let class = parse_class(
            "template <typename T>\nclass Box {\n  friend class Other;\n  using value_type = T;\n  typedef T* pointer;\n  static_assert(sizeof(T) > 0, \"size\");\n  template <typename U> void assign(const U& u);\n  template <typename U> struct Rebind { using type = Box<U>; };\n  T value;\n};",
        );

        let assign = member(&class, "assign");
        assert_eq!(assign.template_params, vec!["U".to_string()]);
        assert_eq!(assign.params()[0].type_ref, "const U&");
        assert_eq!(class.nested.len(), 1);
        assert_eq!(class.members.len(), 2);
    }

    #[test]
    fn test_malformed_member_recovers() {
        let parsed = parse_header("class A {\n  int = 5;\n  int ok;\n  void f() = 7;\n  int also_ok;\n};").unwrap();

        assert_eq!(parsed.errors.len(), 2);
        match &parsed.unit.declarations[0] {
            RawDeclaration::Record(r) => {
                let names: Vec<_> = r.members.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(names, vec!["ok", "also_ok"]);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_without_parameter_list_is_an_error() {
        let parsed = parse_header("class A {\n  void operator());\n  void operator();\n  int ok;\n};\nclass B {};").unwrap();

        assert_eq!(parsed.errors.len(), 2, "{:?}", parsed.errors);
        assert!(parsed.errors.iter().all(|e| e.message.contains("Expected '(' after member name 'operator()'")));
        let names: Vec<_> = parsed.unit.declarations.iter().filter_map(|d| d.local_name()).collect();
        assert_eq!(names, vec!["A", "B"]);
        match &parsed.unit.declarations[0] {
            RawDeclaration::Record(r) => {
                let members: Vec<_> = r.members.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(members, vec!["ok"]);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_stray_tokens_in_member_head_are_rejected() {
        let parsed = parse_header("class A { int x; ) int y; int 5 z; int w; };").unwrap();

        let messages: Vec<_> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Unexpected ')' in class body",
                "Unexpected number 5 in member declaration",
            ]
        );
        match &parsed.unit.declarations[0] {
            RawDeclaration::Record(r) => {
                let fields: Vec<_> = r
                    .members
                    .iter()
                    .map(|m| (m.name.as_str(), m.type_ref.as_str()))
                    .collect();
                assert_eq!(fields, vec![("x", "int"), ("y", "int"), ("w", "int")]);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_macro_line_before_label_is_ignored() {
        let class = parse_class("class Widget {\n  Q_OBJECT\npublic:\n  int x;\n};");
        assert_eq!(class.members.len(), 1);
        assert_eq!(class.members[0].access, Access::Public);
    }
}
