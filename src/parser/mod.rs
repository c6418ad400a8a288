//! C++ header parser
//!
//! This module transforms header text into a tree of raw declarations:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser state, helpers, recovery and the entry point
//! - `declarations`: namespaces, records, enums, templates
//! - `members`: record bodies (fields, methods, nested types)
//! - [`ast`]: raw declaration node definitions
//!
//! # Supported Subset
//!
//! The parser extracts declaration-level structure only:
//! - Namespaces (named, anonymous, inline, chained `a::b`)
//! - Classes, structs and unions with bases, access labels and nested types
//! - Enums (plain and scoped) with their enumerator names
//! - Template headers in front of records and member functions
//! - Fields, methods, constructors, destructors and operators
//!
//! Function bodies, initializers and everything outside records are skipped
//! as balanced token spans. The preprocessor is not evaluated; directive
//! lines are dropped by the lexer.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with error recovery. No external
//! parser generator dependencies.

pub mod ast;
mod declarations;
pub mod lexer;
mod members;
pub mod parse;

pub use parse::{parse_header, ParseError, ParsedHeader, Parser};
