//! Rewrite module - splice converted loops back into source text
//!
//! Loops are visited outermost first. A loop is only rewritten when its body
//! does nothing but fill the converted accumulators, so the comprehension
//! replaces it without dropping any other effect.

use crate::convert::{
    append_of, arms, convert_stmt, expr_names, key_assignments, referenced_names, ComprehensionKind, Conversion,
    ConvertOptions,
};
use crate::parser::{Expr, ForLoop, Program, Span, Stmt, StmtKind};
use crate::report::{LoopOutcome, LoopReport};
use crate::unparser::unparse_expr;
use tracing::debug;

/// A `for` loop and the statements before it in the same block
#[derive(Debug, Clone, Copy)]
pub struct LoopSite<'a> {
    pub stmt: &'a Stmt,
    pub for_loop: &'a ForLoop,
    pub preceding: &'a [Stmt],
}

/// Replace lines `line..=end_line` (1-based) with `replacement`, re-indented
/// to the first replaced line. An empty replacement deletes the lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub line: usize,
    pub end_line: usize,
    pub replacement: String,
}

/// Edits for a program together with the outcome of every loop visited
#[derive(Debug, Clone, Default)]
pub struct RewritePlan {
    pub edits: Vec<Edit>,
    pub report: LoopReport,
}

/// Every `for` loop in the program, in pre-order
pub fn find_loops(program: &Program) -> Vec<LoopSite<'_>> {
    let mut out = Vec::new();
    collect_loops(&program.statements, &mut out);
    out
}

fn collect_loops<'a>(stmts: &'a [Stmt], out: &mut Vec<LoopSite<'a>>) {
    for (idx, stmt) in stmts.iter().enumerate() {
        match &stmt.kind {
            StmtKind::For(for_loop) => {
                out.push(LoopSite {
                    stmt,
                    for_loop,
                    preceding: &stmts[..idx],
                });
                collect_loops(&for_loop.body, out);
                if let Some(orelse) = &for_loop.orelse {
                    collect_loops(orelse, out);
                }
            }
            StmtKind::If(if_stmt) => {
                for (_, _, arm) in arms(if_stmt) {
                    collect_loops(arm, out);
                }
            }
            StmtKind::While { body, .. } | StmtKind::FuncDef { body, .. } | StmtKind::Compound { body, .. } => {
                collect_loops(body, out)
            }
            _ => {}
        }
    }
}

pub fn plan_edits(program: &Program, options: &ConvertOptions) -> Vec<Edit> {
    plan_rewrite(program, options).edits
}

/// Convert every loop that can be, and plan the source edits
pub fn plan_rewrite(program: &Program, options: &ConvertOptions) -> RewritePlan {
    let mut plan = RewritePlan::default();
    let mut rewritten: Vec<Span> = Vec::new();

    for site in find_loops(program) {
        let span = site.stmt.span;
        if rewritten.iter().any(|outer| outer.line <= span.line && span.end_line <= outer.end_line) {
            continue;
        }

        let conversion = match convert_stmt(site.stmt, options) {
            Ok(conversion) => conversion,
            Err(reason) => {
                plan.report.add(LoopOutcome::declined(span, &reason));
                continue;
            }
        };

        if let Err(reason) = check_rewritable(site.for_loop, &conversion) {
            debug!(line = span.line, reason, "keeping converted loop");
            plan.report.add(LoopOutcome::kept(span, &conversion, reason));
            continue;
        }

        plan.edits.extend(edits_for(&site, &conversion));
        plan.report.add(LoopOutcome::converted(span, &conversion));
        rewritten.push(span);
    }

    plan
}

/// Accumulators the conversion builds, with kind and comprehension
fn built(conversion: &Conversion) -> Vec<(&str, ComprehensionKind, &Expr)> {
    let mut out = vec![(conversion.accumulator.as_str(), conversion.kind, &conversion.expr)];
    if let Some(complement) = &conversion.complement {
        out.push((complement.accumulator.as_str(), ComprehensionKind::List, &complement.expr));
    }
    out
}

fn check_rewritable(for_loop: &ForLoop, conversion: &Conversion) -> Result<(), &'static str> {
    let targets = built(conversion);
    let names: Vec<&str> = targets.iter().map(|(name, _, _)| *name).collect();

    let consumed = match conversion.kind {
        ComprehensionKind::Dict => for_loop.body.iter().all(|stmt| {
            matches!(stmt.kind, StmtKind::Pass)
                || key_assignments(std::slice::from_ref(stmt))
                    .first()
                    .is_some_and(|m| names.contains(&m.accumulator))
        }),
        ComprehensionKind::List => only_appends(&for_loop.body, &names),
    };
    if !consumed {
        return Err("loop body does more than fill the accumulator");
    }
    if conversion.complement.is_some() && !is_reiterable(&for_loop.iter) {
        return Err("iterable may not survive a second pass");
    }

    let reads_accumulator = targets
        .iter()
        .any(|(_, _, expr)| names.iter().any(|name| expr_names(expr).contains(*name)));
    if reads_accumulator {
        return Err("comprehension reads the accumulator it builds");
    }
    Ok(())
}

/// True if `body` holds nothing but appends to `names`, possibly under `if`s
fn only_appends(body: &[Stmt], names: &[&str]) -> bool {
    body.iter().all(|stmt| match &stmt.kind {
        StmtKind::Pass => true,
        StmtKind::Expr(_) => append_of(stmt).is_some_and(|(acc, _)| names.contains(&acc)),
        StmtKind::If(if_stmt) => arms(if_stmt).iter().all(|(_, _, arm)| only_appends(arm, names)),
        _ => false,
    })
}

/// True for iterables that yield the same items every time they are iterated:
/// literal displays and `range(...)` over plain operands
fn is_reiterable(iter: &Expr) -> bool {
    match iter {
        Expr::List(items) | Expr::Tuple(items) | Expr::Set(items) => items.iter().all(is_plain_operand),
        Expr::StringLiteral(_) => true,
        Expr::Call { func, args, kwargs } => {
            func.as_ident() == Some("range") && kwargs.is_empty() && args.iter().all(is_plain_operand)
        }
        _ => false,
    }
}

fn is_plain_operand(expr: &Expr) -> bool {
    match expr {
        Expr::IntLiteral(_)
        | Expr::FloatLiteral(_)
        | Expr::StringLiteral(_)
        | Expr::BoolLiteral(_)
        | Expr::NoneLiteral
        | Expr::Ident(_) => true,
        Expr::UnaryOp { operand, .. } => is_plain_operand(operand),
        Expr::BinOp { left, right, .. } => is_plain_operand(left) && is_plain_operand(right),
        Expr::Tuple(items) => items.iter().all(is_plain_operand),
        _ => false,
    }
}

fn edits_for(site: &LoopSite, conversion: &Conversion) -> Vec<Edit> {
    let span = site.stmt.span;
    let mut edits = Vec::new();
    let mut lines = Vec::new();

    for (accumulator, kind, expr) in built(conversion) {
        let comprehension = unparse_expr(expr);
        match initializer(site, accumulator, kind) {
            Some(init) => {
                edits.push(Edit {
                    line: init.line,
                    end_line: init.end_line,
                    replacement: String::new(),
                });
                lines.push(format!("{accumulator} = {comprehension}"));
            }
            None => {
                let method = match kind {
                    ComprehensionKind::List => "extend",
                    ComprehensionKind::Dict => "update",
                };
                lines.push(format!("{accumulator}.{method}({comprehension})"));
            }
        }
    }

    edits.push(Edit {
        line: span.line,
        end_line: span.end_line,
        replacement: lines.join("\n"),
    });
    edits
}

/// Span of an empty `acc = []` / `acc = {}` / `acc = dict()` in the run of
/// assignments right before the loop, if it can be folded into the loop's
/// replacement
fn initializer(site: &LoopSite, accumulator: &str, kind: ComprehensionKind) -> Option<Span> {
    let run_start = site
        .preceding
        .iter()
        .rposition(|stmt| !matches!(stmt.kind, StmtKind::Assign { .. } | StmtKind::AugAssign { .. }))
        .map_or(0, |idx| idx + 1);
    let run = &site.preceding[run_start..];

    let idx = run.iter().rposition(|stmt| is_empty_init(stmt, accumulator, kind))?;
    let init = &run[idx];

    // The line must hold nothing else, and nothing between it and the loop
    // may observe the old value
    let shares_line = site
        .preceding
        .iter()
        .filter(|stmt| stmt.span.line <= init.span.end_line && init.span.line <= stmt.span.end_line)
        .count()
        > 1;
    if shares_line || init.span.end_line >= site.stmt.span.line {
        return None;
    }
    if referenced_names(&run[idx + 1..]).contains(accumulator) {
        return None;
    }
    Some(init.span)
}

fn is_empty_init(stmt: &Stmt, accumulator: &str, kind: ComprehensionKind) -> bool {
    let StmtKind::Assign { target, value } = &stmt.kind else {
        return false;
    };
    if target.as_ident() != Some(accumulator) {
        return false;
    }
    match (kind, value) {
        (ComprehensionKind::List, Expr::List(items)) => items.is_empty(),
        (ComprehensionKind::Dict, Expr::Dict(entries)) => entries.is_empty(),
        (ComprehensionKind::Dict, Expr::Call { func, args, kwargs }) => {
            func.as_ident() == Some("dict") && args.is_empty() && kwargs.is_empty()
        }
        _ => false,
    }
}

/// Apply edits to `source`, bottom-up so earlier line numbers stay valid
///
/// Untouched lines keep their own terminators; inserted lines use the
/// file's line ending.
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = source.split_inclusive('\n').map(String::from).collect();
    let mut edits = edits.to_vec();
    edits.sort_by(|a, b| b.line.cmp(&a.line));

    for edit in edits {
        let start = edit.line.saturating_sub(1);
        let end = edit.end_line.min(lines.len());
        if start >= end {
            continue;
        }
        let indent: String = lines[start].chars().take_while(|c| matches!(c, ' ' | '\t')).collect();
        let last_ending = line_ending(&lines[end - 1]);
        let mut replacement: Vec<String> = edit
            .replacement
            .lines()
            .map(|line| format!("{indent}{line}{newline}"))
            .collect();
        if let Some(last) = replacement.last_mut() {
            last.truncate(last.len() - newline.len());
            last.push_str(last_ending);
        }
        lines.splice(start..end, replacement);
    }

    lines.concat()
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
