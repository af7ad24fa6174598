//! loopcomp - rewrite accumulation loops as comprehensions
//!
//! # Overview
//! Finds Python `for` loops that build a list through `append` or a dict
//! through literal-key assignments, and replaces them with the equivalent
//! list or dict comprehension.

pub mod convert;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod rewrite;
pub mod unparser;

pub use convert::{convert_loop, Conversion, ConvertOptions, Declined};
pub use report::LoopReport;

use anyhow::Result;
use std::path::Path;

/// Report what would happen to every loop in `source`
pub fn analyze(source: &str, options: &ConvertOptions) -> Result<LoopReport> {
    // 1. Parse Python source to AST
    let program = parser::parse(source)?;

    // 2. Convert each loop
    let plan = rewrite::plan_rewrite(&program, options);

    Ok(plan.report)
}

/// Rewrite every convertible loop in `source`
pub fn rewrite_source(source: &str, options: &ConvertOptions) -> Result<String> {
    let program = parser::parse(source)?;
    let plan = rewrite::plan_rewrite(&program, options);
    Ok(rewrite::apply_edits(source, &plan.edits))
}

/// Rewrite a Python file, writing to `output` or back to `input`
pub fn rewrite_file(input: &Path, output: Option<&Path>, options: &ConvertOptions) -> Result<LoopReport> {
    let source = std::fs::read_to_string(input)?;
    let program = parser::parse(&source)?;
    let plan = rewrite::plan_rewrite(&program, options);

    let rewritten = rewrite::apply_edits(&source, &plan.edits);
    std::fs::write(output.unwrap_or(input), rewritten)?;

    Ok(plan.report.with_file(input))
}
