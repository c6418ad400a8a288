//! Multi-source pipeline: lex and parse every input in parallel, then
//! resolve and build over all of them in input order.

use crate::error::{ModelInvariantViolation, Report};
use crate::model::{BuildOptions, EntityModel, ModelBuilder};
use crate::parser::ast::TranslationUnit;
use crate::parser::parse_header;
use crate::resolver::resolve;
use rayon::prelude::*;
use tracing::{debug, info};

/// One header to analyze. The name is only used for attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub name: String,
    pub text: String,
}

impl SourceText {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A built model with every diagnostic collected on the way
#[derive(Debug)]
pub struct Analysis {
    pub model: EntityModel,
    pub report: Report,
}

/// Run the whole pipeline over `sources`.
///
/// Only a qualified-name collision aborts; lexer and parser errors and
/// resolution warnings end up in [`Analysis::report`].
pub fn analyze(
    sources: &[SourceText],
    options: &BuildOptions,
) -> Result<Analysis, ModelInvariantViolation> {
    let parsed: Vec<_> = sources
        .par_iter()
        .map(|source| {
            debug!(source = %source.name, "parsing");
            parse_header(&source.text)
        })
        .collect();

    let mut report = Report::new();
    let mut units: Vec<(&str, TranslationUnit)> = Vec::with_capacity(sources.len());
    for (source, result) in sources.iter().zip(parsed) {
        match result {
            Ok(header) => {
                for err in &header.errors {
                    report.push_parse_error(&source.name, err);
                }
                units.push((source.name.as_str(), header.unit));
            }
            Err(err) => report.push_lex_error(&source.name, &err),
        }
    }
    info!(
        sources = sources.len(),
        errors = report.error_count(),
        "parsed headers"
    );

    let tree = resolve(units.iter().map(|(name, unit)| (*name, unit)));
    let model = ModelBuilder::new(&tree, options).build()?;
    for warning in model.warnings() {
        report.push_warning(warning);
    }

    Ok(Analysis { model, report })
}
