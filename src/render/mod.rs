//! Diagram output for a finished [`crate::model::EntityModel`].

pub mod plantuml;

pub use plantuml::{render, RenderOptions};
