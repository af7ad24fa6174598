//! Read-only expression visitor
//!
//! Implement [`Visitor`] and override `visit_expr`; call [`walk_expr`] inside
//! the override to keep recursing, or skip it to prune the traversal.

use super::ast::*;

pub trait Visitor: Sized {
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_comprehension(&mut self, generator: &Comprehension) {
        walk_comprehension(self, generator);
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::IntLiteral(_)
        | Expr::FloatLiteral(_)
        | Expr::StringLiteral(_)
        | Expr::BoolLiteral(_)
        | Expr::NoneLiteral
        | Expr::Verbatim(_)
        | Expr::Ident(_) => {}
        Expr::BinOp { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Compare { left, ops } => {
            visitor.visit_expr(left);
            for (_, right) in ops {
                visitor.visit_expr(right);
            }
        }
        Expr::UnaryOp { operand, .. } => visitor.visit_expr(operand),
        Expr::Call { func, args, kwargs } => {
            visitor.visit_expr(func);
            for arg in args {
                visitor.visit_expr(arg);
            }
            for (_, value) in kwargs {
                visitor.visit_expr(value);
            }
        }
        Expr::List(items) | Expr::Tuple(items) | Expr::Set(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        Expr::Dict(entries) => {
            for (key, value) in entries {
                visitor.visit_expr(key);
                visitor.visit_expr(value);
            }
        }
        Expr::ListComp { elt, generators }
        | Expr::SetComp { elt, generators }
        | Expr::GenExpr { elt, generators } => {
            for generator in generators {
                visitor.visit_comprehension(generator);
            }
            visitor.visit_expr(elt);
        }
        Expr::DictComp {
            key,
            value,
            generators,
        } => {
            for generator in generators {
                visitor.visit_comprehension(generator);
            }
            visitor.visit_expr(key);
            visitor.visit_expr(value);
        }
        Expr::IfExp { test, body, orelse } => {
            visitor.visit_expr(test);
            visitor.visit_expr(body);
            visitor.visit_expr(orelse);
        }
        Expr::Index { target, index } => {
            visitor.visit_expr(target);
            visitor.visit_expr(index);
        }
        Expr::Slice { lower, upper, step } => {
            for part in [lower, upper, step].into_iter().flatten() {
                visitor.visit_expr(part);
            }
        }
        Expr::Attribute { value, .. } => visitor.visit_expr(value),
        Expr::Lambda { params, body } => {
            for default in params.iter().filter_map(|(_, default)| default.as_ref()) {
                visitor.visit_expr(default);
            }
            visitor.visit_expr(body);
        }
        Expr::Starred(inner) => visitor.visit_expr(inner),
    }
}

pub fn walk_comprehension<V: Visitor>(visitor: &mut V, generator: &Comprehension) {
    visitor.visit_expr(&generator.iter);
    for cond in &generator.ifs {
        visitor.visit_expr(cond);
    }
}

/// Walk every expression held directly or nested inside `stmts`,
/// descending into all block bodies
pub fn walk_stmts<V: Visitor>(visitor: &mut V, stmts: &[Stmt]) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Return(Some(expr)) => visitor.visit_expr(expr),
            StmtKind::Assign { target, value } | StmtKind::AugAssign { target, value, .. } => {
                visitor.visit_expr(target);
                visitor.visit_expr(value);
            }
            StmtKind::If(if_stmt) => {
                visitor.visit_expr(&if_stmt.test);
                walk_stmts(visitor, &if_stmt.body);
                for (cond, body) in &if_stmt.elif_clauses {
                    visitor.visit_expr(cond);
                    walk_stmts(visitor, body);
                }
                if let Some(orelse) = &if_stmt.orelse {
                    walk_stmts(visitor, orelse);
                }
            }
            StmtKind::For(for_loop) => {
                visitor.visit_expr(&for_loop.target.to_expr());
                visitor.visit_expr(&for_loop.iter);
                walk_stmts(visitor, &for_loop.body);
                if let Some(orelse) = &for_loop.orelse {
                    walk_stmts(visitor, orelse);
                }
            }
            StmtKind::While { condition, body } => {
                visitor.visit_expr(condition);
                walk_stmts(visitor, body);
            }
            StmtKind::FuncDef { body, .. } | StmtKind::Compound { body, .. } => walk_stmts(visitor, body),
            StmtKind::Return(None)
            | StmtKind::Pass
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Other(_) => {}
        }
    }
}
