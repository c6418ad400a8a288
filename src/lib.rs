//! # Introduction
//!
//! hppuml statically reads C++ header text and builds a model of the
//! declared namespaces, classes, structs, unions and enums together with
//! their inheritance, nesting and composition relationships. The model can
//! be rendered as a PlantUML class diagram.
//!
//! ## Pipeline
//!
//! ```text
//! Header text → Lexer → Parser → Raw declarations → Resolver → Entity model → PlantUML
//! ```
//!
//! 1. [`parser`] tokenises each header and builds a tree of raw
//!    declarations, recovering from malformed ones.
//! 2. [`resolver`] gives every declaration its qualified name and answers
//!    type-reference lookups (nearest enclosing scope wins).
//! 3. [`model`] turns the resolved tree into immutable entities and
//!    relationships, and derives abstractness.
//! 4. [`render`] writes the model as PlantUML.
//!
//! [`pipeline::analyze`] runs steps 1 to 3 over several headers, parsing
//! them in parallel.
//!
//! Only declaration-level structure is extracted: no macro expansion, no
//! template instantiation, no overload resolution.

pub mod error;
pub mod ids;
pub mod inputs;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod resolver;

pub use error::{Diagnostic, ModelInvariantViolation, Report, ResolutionWarning, Severity};
pub use model::{BuildOptions, Entity, EntityModel, Relationship, RelationshipKind};
pub use pipeline::{analyze, Analysis, SourceText};
pub use render::{render, RenderOptions};
