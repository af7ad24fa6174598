//! Filter extractor

use super::locate::{append_sites, Branch};
use crate::parser::{Expr, Stmt, StmtKind};

/// Conditions folded out of the conditionals guarding an accumulator
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filters {
    /// One clause per guarding conditional, in source order
    pub clauses: Vec<Expr>,
    /// All clauses joined with `and`, left to right
    pub combined: Option<Expr>,
    /// `not (combined)`, present when a guarding conditional has a false branch
    pub negated: Option<Expr>,
}

impl Filters {
    /// Comprehension `if` clauses: the combined condition, if any
    pub fn as_ifs(&self) -> Vec<Expr> {
        self.combined.iter().cloned().collect()
    }
}

/// Join conditions with `and`, left to right
pub fn conjunction(conditions: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    conditions.into_iter().reduce(Expr::and)
}

/// Extract the filters guarding appends to `accumulator`.
///
/// Every direct-body conditional holding such an append contributes one
/// clause: the conditions on the path to its first append to `accumulator`.
/// For an append straight under the `if` that is just the test; nested
/// conditionals add their own tests and an `else` path contributes the
/// negated test.
pub fn extract_filters(body: &[Stmt], accumulator: &str) -> Filters {
    let mut clauses = Vec::new();
    let mut has_false_branch = false;

    for stmt in body {
        let StmtKind::If(if_stmt) = &stmt.kind else {
            continue;
        };
        let sites = append_sites(std::slice::from_ref(stmt));
        let Some(site) = sites.iter().find(|site| site.accumulator == accumulator) else {
            continue;
        };
        if let Some(clause) = conjunction(site.guards.iter().cloned()) {
            clauses.push(clause);
        }
        if matches!(site.conditional, Some((_, Branch::Body))) && if_stmt.has_false_branch() {
            has_false_branch = true;
        }
    }

    let combined = conjunction(clauses.iter().cloned());
    let negated = match (&combined, has_false_branch) {
        (Some(combined), true) => Some(Expr::not(combined.clone())),
        _ => None,
    };

    Filters {
        clauses,
        combined,
        negated,
    }
}
