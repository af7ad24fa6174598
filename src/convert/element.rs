//! Element expression builder

use super::Declined;
use crate::parser::{walk_expr, walk_stmts, Expr, ForLoop, ForTarget, Stmt, Visitor};
use indexmap::IndexSet;

/// Collects every identifier read anywhere in an expression or block
#[derive(Default)]
pub(crate) struct NameCollector {
    pub names: IndexSet<String>,
}

impl Visitor for NameCollector {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Ident(name) = expr {
            self.names.insert(name.clone());
        }
        walk_expr(self, expr);
    }
}

/// Identifiers referenced anywhere in `body`, in first-seen order
pub fn referenced_names(body: &[Stmt]) -> IndexSet<String> {
    let mut collector = NameCollector::default();
    walk_stmts(&mut collector, body);
    collector.names
}

/// Identifiers referenced by one expression
pub fn expr_names(expr: &Expr) -> IndexSet<String> {
    let mut collector = NameCollector::default();
    collector.visit_expr(expr);
    collector.names
}

/// The value to yield per iteration.
///
/// With a located append the element is its argument, whatever it computes;
/// this is the only form [`convert_loop`](super::convert_loop) uses, since an
/// append-shaped call always carries exactly one argument.
///
/// `None` is for library callers that locate the mutation themselves and have
/// no value expression for it. The loop target itself is yielded then, but
/// only the parts of it the body actually reads: the whole target when every
/// name is referenced, else the first referenced name.
pub fn build_element(for_loop: &ForLoop, argument: Option<&Expr>) -> Result<Expr, Declined> {
    if let Some(argument) = argument {
        return Ok(argument.clone());
    }

    let referenced = referenced_names(&for_loop.body);
    match &for_loop.target {
        ForTarget::Name(name) if referenced.contains(name) => Ok(Expr::ident(name)),
        ForTarget::Name(_) => Err(Declined::UndeterminedElement("loop variable is never read")),
        target @ ForTarget::Tuple(_) => {
            let names = target.names();
            if names.iter().all(|name| referenced.contains(*name)) {
                return Ok(target.to_expr());
            }
            names
                .into_iter()
                .find(|name| referenced.contains(*name))
                .map(Expr::ident)
                .ok_or(Declined::UndeterminedElement("no loop variable is read"))
        }
    }
}
