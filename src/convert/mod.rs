//! Convert module - loop to comprehension conversion
//!
//! One loop at a time, strictly downward:
//! 1. Classify the loop shape (list, dict, or neither)
//! 2. Locate the statements that mutate the accumulator
//! 3. Build the element expression
//! 4. Extract filters from guarding conditionals
//! 5. Emit the comprehension
//!
//! Every stage is a pure function of the input tree. A loop that does not fit
//! a recognised shape comes back as a [`Declined`] outcome and must be left
//! untouched by the caller.

mod classify;
mod element;
mod emit;
mod filters;
mod locate;

pub use classify::{classify, is_candidate, Shape};
pub use element::{build_element, expr_names, referenced_names};
pub use emit::{emit, fresh_name, ComprehensionKind, ComprehensionSpec, Element, KeyAssignments};
pub use filters::{conjunction, extract_filters, Filters};
pub use locate::{
    accumulator_names, append_of, append_sites, arms, conditionals_with_append, direct_appends, is_append_call,
    key_assignments, AccumulatorMutation, AppendSite, Branch, MutationKind,
};

use crate::parser::{Expr, ForLoop, IfStmt, Stmt, StmtKind};
use thiserror::Error;
use tracing::{debug, trace};

/// Why a loop was left as it is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Declined {
    #[error("loop does not append to or assign into an accumulator")]
    NotACandidate,

    #[error("more than one accumulator is mutated: {}", .0.join(", "))]
    AmbiguousAccumulator(Vec<String>),

    #[error("cannot determine the element to yield: {0}")]
    UndeterminedElement(&'static str),

    #[error("malformed input: {0}")]
    MalformedInput(&'static str),

    #[error("loop exits early through `{0}`")]
    ControlFlow(&'static str),
}

impl Declined {
    /// Stable short code for reports
    pub fn code(&self) -> &'static str {
        match self {
            Declined::NotACandidate => "not-a-candidate",
            Declined::AmbiguousAccumulator(_) => "ambiguous-accumulator",
            Declined::UndeterminedElement(_) => "undetermined-element",
            Declined::MalformedInput(_) => "malformed-input",
            Declined::ControlFlow(_) => "control-flow",
        }
    }
}

/// Conversion switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Build a second comprehension for an accumulator filled from the
    /// `else` branch of the guarding conditional
    pub emit_complement: bool,
    /// Turn `if c: acc.append(a) else: acc.append(b)` into `a if c else b`
    pub fold_branches: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            emit_complement: true,
            fold_branches: true,
        }
    }
}

/// Comprehension for the accumulator filled by the `else` branch
#[derive(Debug, Clone, PartialEq)]
pub struct Complement {
    pub accumulator: String,
    pub expr: Expr,
}

/// A converted loop
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub accumulator: String,
    pub kind: ComprehensionKind,
    pub expr: Expr,
    pub complement: Option<Complement>,
}

/// Convert a statement, which must be a `for` loop
pub fn convert_stmt(stmt: &Stmt, options: &ConvertOptions) -> Result<Conversion, Declined> {
    let StmtKind::For(for_loop) = &stmt.kind else {
        return Err(Declined::MalformedInput("statement is not a for loop"));
    };
    let result = convert_loop(for_loop, options);
    match &result {
        Ok(conversion) => debug!(
            line = stmt.span.line,
            accumulator = %conversion.accumulator,
            kind = ?conversion.kind,
            "converted loop"
        ),
        Err(reason) => debug!(line = stmt.span.line, code = reason.code(), %reason, "declined loop"),
    }
    result
}

/// Convert one loop into a comprehension
pub fn convert_loop(for_loop: &ForLoop, options: &ConvertOptions) -> Result<Conversion, Declined> {
    let shape = classify(for_loop);
    trace!(?shape, "classified loop");

    if shape == Shape::NotACandidate {
        return Err(Declined::NotACandidate);
    }
    if for_loop.orelse.is_some() {
        return Err(Declined::ControlFlow("for-else"));
    }
    if let Some(exit) = early_exit(&for_loop.body, false) {
        return Err(Declined::ControlFlow(exit));
    }

    match shape {
        Shape::Dict => convert_dict(for_loop),
        _ => convert_list(for_loop, options),
    }
}

/// First statement that leaves this loop's iteration early.
///
/// `break` and `continue` only count outside nested loops; a nested
/// function body is skipped entirely.
fn early_exit(body: &[Stmt], nested_loop: bool) -> Option<&'static str> {
    body.iter().find_map(|stmt| match &stmt.kind {
        StmtKind::Break if !nested_loop => Some("break"),
        StmtKind::Continue if !nested_loop => Some("continue"),
        StmtKind::Return(_) => Some("return"),
        StmtKind::Other(text) if crate::parser::utils::first_word(text) == "yield" => Some("yield"),
        StmtKind::If(if_stmt) => arms(if_stmt)
            .into_iter()
            .find_map(|(_, _, arm)| early_exit(arm, nested_loop)),
        StmtKind::For(inner) => early_exit(&inner.body, true)
            .or_else(|| inner.orelse.as_deref().and_then(|orelse| early_exit(orelse, nested_loop))),
        StmtKind::While { body, .. } => early_exit(body, true),
        StmtKind::Compound { body, .. } => early_exit(body, nested_loop),
        _ => None,
    })
}

fn convert_dict(for_loop: &ForLoop) -> Result<Conversion, Declined> {
    let mutations = key_assignments(&for_loop.body);
    let names: indexmap::IndexSet<&str> = mutations.iter().map(|m| m.accumulator).collect();
    if names.len() > 1 {
        return Err(Declined::AmbiguousAccumulator(names.iter().map(|n| n.to_string()).collect()));
    }
    let accumulator = names
        .first()
        .ok_or(Declined::MalformedInput("dict loop without key assignments"))?
        .to_string();

    let pairs: KeyAssignments = mutations.into_iter().collect();
    let spec = ComprehensionSpec::dict(for_loop, pairs, vec![])?;
    Ok(Conversion {
        accumulator,
        kind: spec.kind(),
        expr: emit(&spec)?,
        complement: None,
    })
}

fn convert_list(for_loop: &ForLoop, options: &ConvertOptions) -> Result<Conversion, Declined> {
    let body = &for_loop.body;
    let direct = accumulator_names(body);
    if direct.len() > 1 {
        return Err(Declined::AmbiguousAccumulator(direct.iter().map(|n| n.to_string()).collect()));
    }

    let sites = append_sites(body);
    let accumulator = primary_accumulator(body, &sites)?;
    let (primary, others): (Vec<_>, Vec<_>) = sites.into_iter().partition(|s| s.accumulator == accumulator);

    let complement = if others.is_empty() {
        None
    } else {
        let guard = complement_conditional(&primary, &others).ok_or_else(|| {
            let mut names = vec![accumulator.to_string()];
            for site in &others {
                if !names.iter().any(|n| n == site.accumulator) {
                    names.push(site.accumulator.to_string());
                }
            }
            Declined::AmbiguousAccumulator(names)
        })?;
        trace!(conditional = guard, "else branch fills a second accumulator");
        if options.emit_complement {
            Some(build_complement(for_loop, &others)?)
        } else {
            None
        }
    };

    let (element, filters) = match fold_two_branches(body, &primary, options) {
        Some(element) => (element, vec![]),
        None => {
            let argument = single_argument(&primary)?;
            let element = build_element(for_loop, Some(argument))?;
            (element, extract_filters(body, accumulator).as_ifs())
        }
    };

    let spec = ComprehensionSpec::list(for_loop, element, filters);
    Ok(Conversion {
        accumulator: accumulator.to_string(),
        kind: spec.kind(),
        expr: emit(&spec)?,
        complement,
    })
}

/// The accumulator the loop is built around: the receiver of the direct
/// appends, else of the first append under the first guarding conditional
fn primary_accumulator<'a>(body: &'a [Stmt], sites: &[AppendSite<'a>]) -> Result<&'a str, Declined> {
    if let Some(&name) = accumulator_names(body).first() {
        return Ok(name);
    }
    conditionals_with_append(body)
        .first()
        .and_then(|if_stmt| append_sites(&if_stmt.body).first().map(|site| site.accumulator))
        .or_else(|| sites.first().map(|site| site.accumulator))
        .ok_or(Declined::NotACandidate)
}

/// Index of the conditional whose true branch holds every primary append
/// and whose `else` branch holds every other append, all to one accumulator
fn complement_conditional(primary: &[AppendSite], others: &[AppendSite]) -> Option<usize> {
    let (index, _) = primary.first()?.conditional?;
    let second = others.first()?.accumulator;

    let primary_ok = primary
        .iter()
        .all(|site| site.conditional == Some((index, Branch::Body)));
    let others_ok = others
        .iter()
        .all(|site| site.conditional == Some((index, Branch::Else)) && site.accumulator == second);
    (primary_ok && others_ok).then_some(index)
}

fn build_complement(for_loop: &ForLoop, others: &[AppendSite]) -> Result<Complement, Declined> {
    let argument = single_argument(others)?;
    let element = build_element(for_loop, Some(argument))?;
    // Every `else` site shares the path up to the branch; take the first
    let filters = others
        .first()
        .and_then(|site| conjunction(site.guards.iter().cloned()))
        .into_iter()
        .collect();
    let spec = ComprehensionSpec::list(for_loop, element, filters);
    Ok(Complement {
        accumulator: others
            .first()
            .map(|site| site.accumulator.to_string())
            .unwrap_or_default(),
        expr: emit(&spec)?,
    })
}

/// The argument shared by every append site.
///
/// Several sites are only accepted when they append the same value from
/// different guarding conditionals; their filters are then conjoined.
fn single_argument<'a>(sites: &[AppendSite<'a>]) -> Result<&'a Expr, Declined> {
    let first = sites
        .first()
        .ok_or(Declined::UndeterminedElement("no append to the accumulator"))?;
    if sites.len() == 1 {
        return Ok(first.argument);
    }

    if sites.iter().any(|site| site.argument != first.argument) {
        return Err(Declined::UndeterminedElement("appends of different values"));
    }
    let mut seen = indexmap::IndexSet::new();
    for site in sites {
        match site.conditional {
            Some((index, _)) if seen.insert(index) => {}
            _ => return Err(Declined::UndeterminedElement("value may be appended more than once per iteration")),
        }
    }
    Ok(first.argument)
}

/// `if c: acc.append(a) else: acc.append(b)` as `a if c else b`
fn fold_two_branches(body: &[Stmt], primary: &[AppendSite], options: &ConvertOptions) -> Option<Expr> {
    if !options.fold_branches {
        return None;
    }
    let [then_site, else_site] = primary else {
        return None;
    };
    let (Some((index, Branch::Body)), Some((else_index, Branch::Else))) = (then_site.conditional, else_site.conditional)
    else {
        return None;
    };
    if index != else_index || then_site.guards.len() != 1 || else_site.guards.len() != 1 {
        return None;
    }
    let StmtKind::If(IfStmt {
        test, elif_clauses, ..
    }) = &body.get(index)?.kind
    else {
        return None;
    };
    if !elif_clauses.is_empty() {
        return None;
    }

    if then_site.argument == else_site.argument {
        return Some(then_site.argument.clone());
    }
    Some(Expr::IfExp {
        test: Box::new(test.clone()),
        body: Box::new(then_site.argument.clone()),
        orelse: Box::new(else_site.argument.clone()),
    })
}

#[cfg(test)]
mod tests;
