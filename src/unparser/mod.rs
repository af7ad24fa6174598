//! Unparser module - Python source generation from the AST
//!
//! Output follows the conventions of CPython's `ast.unparse`: minimal
//! parentheses derived from operator precedence, single-quoted strings,
//! and bare tuple targets in `for` clauses.

use crate::parser::{BinOp, CmpOp, Comprehension, Expr, ForTarget, IfStmt, Stmt, StmtKind, UnaryOp};

/// Binding strength, loosest first
mod prec {
    pub const TUPLE: u8 = 1;
    pub const TEST: u8 = 2;
    pub const OR: u8 = 3;
    pub const AND: u8 = 4;
    pub const NOT: u8 = 5;
    pub const CMP: u8 = 6;
    pub const BOR: u8 = 7;
    pub const BXOR: u8 = 8;
    pub const BAND: u8 = 9;
    pub const SHIFT: u8 = 10;
    pub const ARITH: u8 = 11;
    pub const TERM: u8 = 12;
    pub const FACTOR: u8 = 13;
    pub const POWER: u8 = 14;
    pub const ATOM: u8 = 16;
}

/// Render an expression as Python source
pub fn unparse_expr(expr: &Expr) -> String {
    Unparser::new().expr(expr, prec::TUPLE)
}

/// Render statements as Python source, one line per simple statement
pub fn unparse_stmts(stmts: &[Stmt]) -> String {
    let mut unparser = Unparser::new();
    unparser.stmts(stmts);
    unparser.out
}

/// Python source writer
pub struct Unparser {
    indent: usize,
    out: String,
}

impl Default for Unparser {
    fn default() -> Self {
        Self::new()
    }
}

impl Unparser {
    pub fn new() -> Self {
        Self {
            indent: 0,
            out: String::new(),
        }
    }

    // === Statements ===

    fn line(&mut self, text: &str) {
        self.out.push_str(&"    ".repeat(self.indent));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn suite(&mut self, header: &str, body: &[Stmt]) {
        self.line(&format!("{header}:"));
        self.indent += 1;
        if body.is_empty() {
            self.line("pass");
        } else {
            self.stmts(body);
        }
        self.indent -= 1;
    }

    pub fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let text = self.expr(expr, prec::TUPLE);
                self.line(&text);
            }
            StmtKind::Assign { target, value } => {
                let text = format!("{} = {}", self.bare_tuple(target), self.bare_tuple(value));
                self.line(&text);
            }
            StmtKind::AugAssign { target, op, value } => {
                let text = format!("{} {}= {}", self.expr(target, prec::TUPLE), binop_str(*op), self.bare_tuple(value));
                self.line(&text);
            }
            StmtKind::If(if_stmt) => self.if_stmt(if_stmt),
            StmtKind::For(for_loop) => {
                let header = format!(
                    "for {} in {}",
                    self.target(&for_loop.target, true),
                    self.bare_tuple(&for_loop.iter)
                );
                self.suite(&header, &for_loop.body);
                if let Some(orelse) = &for_loop.orelse {
                    self.suite("else", orelse);
                }
            }
            StmtKind::While { condition, body } => {
                let header = format!("while {}", self.expr(condition, prec::TEST));
                self.suite(&header, body);
            }
            StmtKind::FuncDef { signature, body, .. } => self.suite(&format!("def {signature}"), body),
            StmtKind::Return(None) => self.line("return"),
            StmtKind::Return(Some(expr)) => {
                let text = format!("return {}", self.bare_tuple(expr));
                self.line(&text);
            }
            StmtKind::Pass => self.line("pass"),
            StmtKind::Break => self.line("break"),
            StmtKind::Continue => self.line("continue"),
            StmtKind::Compound { header, body } => self.suite(header, body),
            StmtKind::Other(text) => self.line(text),
        }
    }

    fn if_stmt(&mut self, if_stmt: &IfStmt) {
        let header = format!("if {}", self.expr(&if_stmt.test, prec::TEST));
        self.suite(&header, &if_stmt.body);
        for (cond, body) in &if_stmt.elif_clauses {
            let header = format!("elif {}", self.expr(cond, prec::TEST));
            self.suite(&header, body);
        }
        if let Some(orelse) = &if_stmt.orelse {
            self.suite("else", orelse);
        }
    }

    // === Expressions ===

    /// Tuples print without parentheses on either side of `=` and after `return`
    fn bare_tuple(&self, expr: &Expr) -> String {
        match expr {
            Expr::Tuple(items) if !items.is_empty() => self.items(items),
            _ => self.expr(expr, prec::TUPLE),
        }
    }

    fn target(&self, target: &ForTarget, top: bool) -> String {
        match target {
            ForTarget::Name(name) => name.clone(),
            ForTarget::Tuple(items) => {
                let inner: Vec<_> = items.iter().map(|t| self.target(t, false)).collect();
                let joined = if items.len() == 1 {
                    format!("{},", inner[0])
                } else {
                    inner.join(", ")
                };
                if top {
                    joined
                } else {
                    format!("({joined})")
                }
            }
        }
    }

    fn items(&self, items: &[Expr]) -> String {
        let parts: Vec<_> = items.iter().map(|e| self.expr(e, prec::TEST)).collect();
        if parts.len() == 1 {
            format!("{},", parts[0])
        } else {
            parts.join(", ")
        }
    }

    fn generators(&self, generators: &[Comprehension]) -> String {
        let mut out = String::new();
        for generator in generators {
            out.push_str(&format!(
                " for {} in {}",
                self.target(&generator.target, true),
                self.expr(&generator.iter, prec::OR)
            ));
            for cond in &generator.ifs {
                out.push_str(&format!(" if {}", self.expr(cond, prec::OR)));
            }
        }
        out
    }

    pub fn expr(&self, expr: &Expr, required: u8) -> String {
        let (text, own) = self.expr_with_prec(expr);
        if own < required {
            format!("({text})")
        } else {
            text
        }
    }

    fn expr_with_prec(&self, expr: &Expr) -> (String, u8) {
        match expr {
            Expr::IntLiteral(n) => (n.to_string(), prec::ATOM),
            Expr::FloatLiteral(f) => (format!("{f:?}"), prec::ATOM),
            Expr::StringLiteral(s) => (quote(s), prec::ATOM),
            Expr::BoolLiteral(true) => ("True".to_string(), prec::ATOM),
            Expr::BoolLiteral(false) => ("False".to_string(), prec::ATOM),
            Expr::NoneLiteral => ("None".to_string(), prec::ATOM),
            Expr::Verbatim(text) => (text.clone(), prec::ATOM),
            Expr::Ident(name) => (name.clone(), prec::ATOM),
            Expr::BinOp { left, op, right } => {
                let own = binop_prec(*op);
                let (left_req, right_req) = if *op == BinOp::Pow {
                    (own + 1, prec::FACTOR)
                } else {
                    (own, own + 1)
                };
                let text = format!(
                    "{} {} {}",
                    self.expr(left, left_req),
                    binop_str(*op),
                    self.expr(right, right_req)
                );
                (text, own)
            }
            Expr::Compare { left, ops } => {
                let mut text = self.expr(left, prec::CMP + 1);
                for (op, right) in ops {
                    text.push_str(&format!(" {} {}", cmpop_str(*op), self.expr(right, prec::CMP + 1)));
                }
                (text, prec::CMP)
            }
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => (format!("not {}", self.expr(operand, prec::NOT)), prec::NOT),
                UnaryOp::Neg => (format!("-{}", self.expr(operand, prec::FACTOR)), prec::FACTOR),
                UnaryOp::Pos => (format!("+{}", self.expr(operand, prec::FACTOR)), prec::FACTOR),
                UnaryOp::BitNot => (format!("~{}", self.expr(operand, prec::FACTOR)), prec::FACTOR),
            },
            Expr::Call { func, args, kwargs } => {
                let mut parts: Vec<String> = Vec::new();
                match args.as_slice() {
                    [Expr::GenExpr { elt, generators }] if kwargs.is_empty() => {
                        parts.push(format!("{}{}", self.expr(elt, prec::TEST), self.generators(generators)));
                    }
                    _ => parts.extend(args.iter().map(|a| self.expr(a, prec::TEST))),
                }
                for (name, value) in kwargs {
                    parts.push(match name {
                        Some(name) => format!("{name}={}", self.expr(value, prec::TEST)),
                        None => format!("**{}", self.expr(value, prec::BOR)),
                    });
                }
                (format!("{}({})", self.expr(func, prec::ATOM), parts.join(", ")), prec::ATOM)
            }
            Expr::List(items) => (format!("[{}]", self.joined(items)), prec::ATOM),
            Expr::Tuple(items) => (format!("({})", self.items(items)), prec::ATOM),
            Expr::Set(items) if items.is_empty() => ("set()".to_string(), prec::ATOM),
            Expr::Set(items) => (format!("{{{}}}", self.joined(items)), prec::ATOM),
            Expr::Dict(entries) => {
                let parts: Vec<_> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", self.expr(k, prec::TEST), self.expr(v, prec::TEST)))
                    .collect();
                (format!("{{{}}}", parts.join(", ")), prec::ATOM)
            }
            Expr::ListComp { elt, generators } => (
                format!("[{}{}]", self.expr(elt, prec::TEST), self.generators(generators)),
                prec::ATOM,
            ),
            Expr::SetComp { elt, generators } => (
                format!("{{{}{}}}", self.expr(elt, prec::TEST), self.generators(generators)),
                prec::ATOM,
            ),
            Expr::GenExpr { elt, generators } => (
                format!("({}{})", self.expr(elt, prec::TEST), self.generators(generators)),
                prec::ATOM,
            ),
            Expr::DictComp {
                key,
                value,
                generators,
            } => (
                format!(
                    "{{{}: {}{}}}",
                    self.expr(key, prec::TEST),
                    self.expr(value, prec::TEST),
                    self.generators(generators)
                ),
                prec::ATOM,
            ),
            Expr::IfExp { test, body, orelse } => (
                format!(
                    "{} if {} else {}",
                    self.expr(body, prec::OR),
                    self.expr(test, prec::OR),
                    self.expr(orelse, prec::TEST)
                ),
                prec::TEST,
            ),
            Expr::Index { target, index } => {
                let index = match index.as_ref() {
                    Expr::Tuple(items) if !items.is_empty() => self.items(items),
                    other => self.expr(other, prec::TUPLE),
                };
                (format!("{}[{}]", self.expr(target, prec::ATOM), index), prec::ATOM)
            }
            Expr::Slice { lower, upper, step } => {
                let part = |p: &Option<Box<Expr>>| p.as_ref().map_or(String::new(), |e| self.expr(e, prec::TEST));
                let mut text = format!("{}:{}", part(lower), part(upper));
                if step.is_some() {
                    text.push(':');
                    text.push_str(&part(step));
                }
                (text, prec::ATOM)
            }
            Expr::Attribute { value, attr } => (format!("{}.{}", self.expr(value, prec::ATOM), attr), prec::ATOM),
            Expr::Lambda { params, body } => {
                let head = if params.is_empty() {
                    "lambda".to_string()
                } else {
                    let params: Vec<String> = params
                        .iter()
                        .map(|(name, default)| match default {
                            Some(default) => format!("{name}={}", self.expr(default, prec::TEST)),
                            None => name.clone(),
                        })
                        .collect();
                    format!("lambda {}", params.join(", "))
                };
                (format!("{head}: {}", self.expr(body, prec::TEST)), prec::TEST)
            }
            Expr::Starred(inner) => (format!("*{}", self.expr(inner, prec::BOR)), prec::ATOM),
        }
    }

    fn joined(&self, items: &[Expr]) -> String {
        items
            .iter()
            .map(|e| self.expr(e, prec::TEST))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn binop_prec(op: BinOp) -> u8 {
    match op {
        BinOp::Or => prec::OR,
        BinOp::And => prec::AND,
        BinOp::BitOr => prec::BOR,
        BinOp::BitXor => prec::BXOR,
        BinOp::BitAnd => prec::BAND,
        BinOp::Shl | BinOp::Shr => prec::SHIFT,
        BinOp::Add | BinOp::Sub => prec::ARITH,
        BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod | BinOp::MatMul => prec::TERM,
        BinOp::Pow => prec::POWER,
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::FloorDiv => "//",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
        BinOp::MatMul => "@",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn cmpop_str(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "==",
        CmpOp::NotEq => "!=",
        CmpOp::Lt => "<",
        CmpOp::Gt => ">",
        CmpOp::LtEq => "<=",
        CmpOp::GtEq => ">=",
        CmpOp::In => "in",
        CmpOp::NotIn => "not in",
        CmpOp::Is => "is",
        CmpOp::IsNot => "is not",
    }
}

/// Render a string value as a Python literal, choosing quotes the way `repr` does
fn quote(value: &str) -> String {
    let delim = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(delim);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

#[cfg(test)]
mod tests;
