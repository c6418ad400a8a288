//! Type-name extraction from declared type text.
//!
//! A member type such as `const std::map<Key, Value*>&` mentions three names:
//! `std::map` (by reference), `Key` and `Value` (by pointer, as template
//! arguments). Each becomes a [`TypeReference`] candidate for lookup.

use crate::parser::ast::is_builtin_type;
use crate::parser::lexer::{Lexer, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    /// Name as written, template arguments removed; may start with `::`
    pub name: String,
    /// Used through `*` or `&`
    pub by_reference: bool,
    /// Appears inside a template argument list
    pub is_argument: bool,
}

/// All non-builtin type names mentioned in `type_ref`, outermost first
pub fn referenced_types(type_ref: &str) -> Vec<TypeReference> {
    let Ok(mut tokens) = Lexer::new(type_ref).tokenize() else {
        return Vec::new();
    };
    tokens.pop();

    let mut out = Vec::new();
    let mut i = 0;
    collect(&tokens, &mut i, false, &mut out);
    out
}

/// Remove every balanced `<...>` group: `ns::Base<T>::Inner` becomes
/// `ns::Base::Inner`
pub fn strip_template_args(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn collect(tokens: &[Token], i: &mut usize, in_args: bool, out: &mut Vec<TypeReference>) {
    while *i < tokens.len() {
        match tokens[*i].kind {
            TokenKind::Gt if in_args => return,
            TokenKind::Ident | TokenKind::ColonColon => read_name(tokens, i, in_args, out),
            _ => *i += 1,
        }
    }
}

fn read_name(tokens: &[Token], i: &mut usize, is_argument: bool, out: &mut Vec<TypeReference>) {
    let kind_at = |j: usize| tokens.get(j).map(|t| t.kind);
    let mut text = String::new();
    let mut arguments = Vec::new();

    if kind_at(*i) == Some(TokenKind::ColonColon) {
        text.push_str("::");
        *i += 1;
    }
    while kind_at(*i) == Some(TokenKind::Ident) {
        text.push_str(&tokens[*i].text);
        *i += 1;
        if kind_at(*i) == Some(TokenKind::Lt) {
            *i += 1;
            collect(tokens, i, true, &mut arguments);
            if kind_at(*i) == Some(TokenKind::Gt) {
                *i += 1;
            }
        }
        if kind_at(*i) == Some(TokenKind::ColonColon) && kind_at(*i + 1) == Some(TokenKind::Ident) {
            text.push_str("::");
            *i += 1;
        } else {
            break;
        }
    }

    let mut j = *i;
    while matches!(kind_at(j), Some(TokenKind::Const | TokenKind::Volatile)) {
        j += 1;
    }
    let by_reference = matches!(kind_at(j), Some(TokenKind::Star | TokenKind::Amp));

    let bare = text.trim_start_matches("::");
    if !bare.is_empty() && !is_builtin_type(bare) {
        out.push(TypeReference {
            name: text,
            by_reference,
            is_argument,
        });
    }
    out.extend(arguments);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(type_ref: &str) -> Vec<(String, bool, bool)> {
        referenced_types(type_ref)
            .into_iter()
            .map(|r| (r.name, r.by_reference, r.is_argument))
            .collect()
    }

    #[test]
    fn test_plain_and_pointer_types() {
        assert_eq!(names("Class01"), vec![("Class01".to_string(), false, false)]);
        assert_eq!(names("const Class01*"), vec![("Class01".to_string(), true, false)]);
        assert_eq!(names("Class01 const&"), vec![("Class01".to_string(), true, false)]);
        assert!(names("unsigned long int").is_empty());
        assert!(names("const char*").is_empty());
    }

    #[test]
    fn test_template_arguments_are_candidates() {
        assert_eq!(
            names("std::map<Key, std::vector<Value*>>"),
            vec![
                ("std::map".to_string(), false, false),
                ("Key".to_string(), false, true),
                ("std::vector".to_string(), false, true),
                ("Value".to_string(), true, true),
            ]
        );
    }

    #[test]
    fn test_global_qualifier_is_kept() {
        assert_eq!(names("::ns::Widget&"), vec![("::ns::Widget".to_string(), true, false)]);
    }

    #[test]
    fn test_strip_template_args() {
        assert_eq!(strip_template_args("Base<T>"), "Base");
        assert_eq!(strip_template_args("ns::Outer<std::pair<int, T>>::Inner"), "ns::Outer::Inner");
    }
}
