//! Append/assignment locator
//!
//! Bounded traversals over a loop body. Every walk enters `if` statements
//! (all branches) and stops at anything else that opens a block: nested
//! loops, functions and other compound statements hold appends that belong
//! to a different iteration or scope.

use crate::parser::{Expr, IfStmt, Stmt, StmtKind};
use indexmap::IndexSet;

/// What a recognised mutation does to its accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind<'a> {
    /// `acc.append(value)`
    Append,
    /// `acc['key'] = value`; `key` is the raw literal text
    KeyAssign { key: &'a str },
}

/// A statement recognised as adding to an accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorMutation<'a> {
    pub accumulator: &'a str,
    pub kind: MutationKind<'a>,
    pub value: &'a Expr,
}

/// Which arm of a direct-body conditional holds an append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Body,
    Elif(usize),
    Else,
}

/// An append reachable from the loop body through conditionals
#[derive(Debug, Clone, PartialEq)]
pub struct AppendSite<'a> {
    pub accumulator: &'a str,
    pub argument: &'a Expr,
    /// Conditions that must all hold for the append to run, outermost first.
    /// Empty for a direct append.
    pub guards: Vec<Expr>,
    /// Index of the direct-body conditional holding the site, and the arm taken
    pub conditional: Option<(usize, Branch)>,
}

/// Receiver and argument of `name.append(arg)`.
///
/// The receiver must be a plain identifier and the call must take exactly one
/// positional, non-starred argument.
pub fn is_append_call(expr: &Expr) -> Option<(&str, &Expr)> {
    let Expr::Call { func, args, kwargs } = expr else {
        return None;
    };
    let Expr::Attribute { value, attr } = func.as_ref() else {
        return None;
    };
    if attr != "append" || !kwargs.is_empty() {
        return None;
    }
    match (value.as_ref(), args.as_slice()) {
        (Expr::Ident(receiver), [arg]) if !matches!(arg, Expr::Starred(_)) => Some((receiver.as_str(), arg)),
        _ => None,
    }
}

/// Append call held by an expression statement
pub fn append_of(stmt: &Stmt) -> Option<(&str, &Expr)> {
    match &stmt.kind {
        StmtKind::Expr(expr) => is_append_call(expr),
        _ => None,
    }
}

/// Append statements that are immediate children of `body`
pub fn direct_appends(body: &[Stmt]) -> Vec<AccumulatorMutation<'_>> {
    body.iter()
        .filter_map(append_of)
        .map(|(accumulator, value)| AccumulatorMutation {
            accumulator,
            kind: MutationKind::Append,
            value,
        })
        .collect()
}

/// Distinct receivers of the direct appends, in source order
pub fn accumulator_names(body: &[Stmt]) -> IndexSet<&str> {
    direct_appends(body).into_iter().map(|m| m.accumulator).collect()
}

/// Direct-body conditionals whose true branch contains an append at any depth
pub fn conditionals_with_append(body: &[Stmt]) -> Vec<&IfStmt> {
    body.iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::If(if_stmt) if !append_sites(&if_stmt.body).is_empty() => Some(if_stmt),
            _ => None,
        })
        .collect()
}

/// `acc['key'] = value` statements that are immediate children of `body`
pub fn key_assignments(body: &[Stmt]) -> Vec<AccumulatorMutation<'_>> {
    body.iter()
        .filter_map(|stmt| {
            let StmtKind::Assign { target, value } = &stmt.kind else {
                return None;
            };
            let Expr::Index { target, index } = target else {
                return None;
            };
            match (target.as_ref(), index.as_ref()) {
                (Expr::Ident(accumulator), Expr::StringLiteral(key)) => Some(AccumulatorMutation {
                    accumulator: accumulator.as_str(),
                    kind: MutationKind::KeyAssign { key: key.as_str() },
                    value,
                }),
                _ => None,
            }
        })
        .collect()
}

/// Every append reachable from `body` through conditionals, depth first
pub fn append_sites(body: &[Stmt]) -> Vec<AppendSite<'_>> {
    let mut sites = Vec::new();
    collect_sites(body, &[], None, &mut sites);
    sites
}

fn collect_sites<'a>(
    body: &'a [Stmt],
    guards: &[Expr],
    conditional: Option<(usize, Branch)>,
    out: &mut Vec<AppendSite<'a>>,
) {
    for (idx, stmt) in body.iter().enumerate() {
        match &stmt.kind {
            StmtKind::Expr(_) => {
                if let Some((accumulator, argument)) = append_of(stmt) {
                    out.push(AppendSite {
                        accumulator,
                        argument,
                        guards: guards.to_vec(),
                        conditional,
                    });
                }
            }
            StmtKind::If(if_stmt) => {
                // Only the outermost conditional is recorded
                let here = |branch| conditional.or(Some((idx, branch)));
                for (branch, arm_guards, arm) in arms(if_stmt) {
                    let mut path = guards.to_vec();
                    path.extend(arm_guards);
                    collect_sites(arm, &path, here(branch), out);
                }
            }
            _ => {}
        }
    }
}

/// Each arm of an `if` with the conditions under which it runs.
/// An `elif` or `else` arm carries the negation of every earlier test.
pub fn arms(if_stmt: &IfStmt) -> Vec<(Branch, Vec<Expr>, &[Stmt])> {
    let mut out = vec![(Branch::Body, vec![if_stmt.test.clone()], if_stmt.body.as_slice())];
    let mut negated = vec![Expr::not(if_stmt.test.clone())];

    for (i, (test, body)) in if_stmt.elif_clauses.iter().enumerate() {
        let mut path = negated.clone();
        path.push(test.clone());
        out.push((Branch::Elif(i), path, body.as_slice()));
        negated.push(Expr::not(test.clone()));
    }
    if let Some(orelse) = &if_stmt.orelse {
        out.push((Branch::Else, negated, orelse.as_slice()));
    }
    out
}
