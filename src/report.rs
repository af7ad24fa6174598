//! LoopReport - per-loop conversion outcomes and their output

use crate::convert::{ComprehensionKind, Conversion, Declined};
use crate::parser::Span;
use crate::unparser::unparse_expr;
use serde::Serialize;
use std::path::Path;

/// A rendered comprehension for one accumulator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub accumulator: String,
    pub comprehension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Status {
    /// Rewritten in place
    Converted {
        kind: ComprehensionKind,
        #[serde(flatten)]
        primary: Rendered,
        #[serde(skip_serializing_if = "Option::is_none")]
        complement: Option<Rendered>,
    },
    /// Convertible, but rewriting would change what the code does
    Kept {
        kind: ComprehensionKind,
        #[serde(flatten)]
        primary: Rendered,
        reason: String,
    },
    /// Not a recognised shape
    Declined { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopOutcome {
    pub line: usize,
    pub end_line: usize,
    #[serde(flatten)]
    pub status: Status,
}

impl LoopOutcome {
    pub fn converted(span: Span, conversion: &Conversion) -> Self {
        Self {
            line: span.line,
            end_line: span.end_line,
            status: Status::Converted {
                kind: conversion.kind,
                primary: render(&conversion.accumulator, &conversion.expr),
                complement: conversion
                    .complement
                    .as_ref()
                    .map(|c| render(&c.accumulator, &c.expr)),
            },
        }
    }

    pub fn kept(span: Span, conversion: &Conversion, reason: &str) -> Self {
        Self {
            line: span.line,
            end_line: span.end_line,
            status: Status::Kept {
                kind: conversion.kind,
                primary: render(&conversion.accumulator, &conversion.expr),
                reason: reason.to_string(),
            },
        }
    }

    pub fn declined(span: Span, reason: &Declined) -> Self {
        Self {
            line: span.line,
            end_line: span.end_line,
            status: Status::Declined {
                code: reason.code().to_string(),
                message: reason.to_string(),
            },
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self.status, Status::Converted { .. })
    }
}

fn render(accumulator: &str, expr: &crate::parser::Expr) -> Rendered {
    Rendered {
        accumulator: accumulator.to_string(),
        comprehension: unparse_expr(expr),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct LoopReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub entries: Vec<LoopOutcome>,
}

impl LoopReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: &Path) -> Self {
        self.file = Some(file.display().to_string());
        self
    }

    pub fn add(&mut self, outcome: LoopOutcome) {
        self.entries.push(outcome);
    }

    pub fn converted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_converted()).count()
    }

    pub fn has_conversions(&self) -> bool {
        self.converted_count() > 0
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_text(&self) -> String {
        let file = self.file.as_deref().unwrap_or("<input>");
        let mut out = String::new();
        for entry in &self.entries {
            let line = entry.line;
            match &entry.status {
                Status::Converted {
                    primary, complement, ..
                } => {
                    out.push_str(&format!(
                        "[converted] {file}:{line} {} = {}\n",
                        primary.accumulator, primary.comprehension
                    ));
                    if let Some(complement) = complement {
                        out.push_str(&format!(
                            "[converted] {file}:{line} {} = {}\n",
                            complement.accumulator, complement.comprehension
                        ));
                    }
                }
                Status::Kept { primary, reason, .. } => {
                    out.push_str(&format!("[kept] {file}:{line} {}: {reason}\n", primary.accumulator));
                }
                Status::Declined { code, message } => {
                    out.push_str(&format!("[{code}] {file}:{line} {message}\n"));
                }
            }
        }
        out
    }
}
