//! AST definitions

/// Expression types
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal
    IntLiteral(i64),
    /// Float literal
    FloatLiteral(f64),
    /// Plain string literal, stored as its decoded value
    StringLiteral(String),
    /// Boolean literal
    BoolLiteral(bool),
    /// None literal
    NoneLiteral,
    /// Source text kept as-is (f-strings, prefixed or triple-quoted strings, `...`)
    Verbatim(String),
    /// Identifier
    Ident(String),
    /// Binary operation (arithmetic, bitwise and the `and`/`or` connectives)
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// Comparison chain `a < b <= c`
    Compare {
        left: Box<Expr>,
        ops: Vec<(CmpOp, Expr)>,
    },
    /// Unary operation
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// Function call with positional and keyword arguments.
    /// A keyword without a name is a `**mapping` argument.
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(Option<String>, Expr)>,
    },
    /// List literal
    List(Vec<Expr>),
    /// Tuple literal
    Tuple(Vec<Expr>),
    /// Set literal
    Set(Vec<Expr>),
    /// Dict literal
    Dict(Vec<(Expr, Expr)>),
    /// `[elt for ... if ...]`
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    /// `{elt for ... if ...}`
    SetComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    /// `{key: value for ... if ...}`
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    /// `(elt for ... if ...)`
    GenExpr {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    /// Conditional Expression (body if test else orelse)
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    /// Subscript access (target[index])
    Index { target: Box<Expr>, index: Box<Expr> },
    /// Slice inside a subscript (lower:upper:step)
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    /// Attribute access (obj.attr)
    Attribute { value: Box<Expr>, attr: String },
    /// Lambda expression (lambda params: body). Each parameter keeps its
    /// `*`/`**` prefix and optional default.
    Lambda {
        params: Vec<(String, Option<Expr>)>,
        body: Box<Expr>,
    },
    /// Starred expression (*expr) for unpacking
    Starred(Box<Expr>),
}

impl Expr {
    pub fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    /// Identifier name if this is a plain identifier
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// `left and right`
    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::BinOp {
            left: Box::new(left),
            op: BinOp::And,
            right: Box::new(right),
        }
    }

    /// `not operand`
    pub fn not(operand: Expr) -> Expr {
        Expr::UnaryOp {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }
}

/// One `for target in iter if ...` clause of a comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: ForTarget,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

/// Binding target of a `for` loop or comprehension clause
#[derive(Debug, Clone, PartialEq)]
pub enum ForTarget {
    Name(String),
    /// `a, b` or `(a, (b, c))`
    Tuple(Vec<ForTarget>),
}

impl ForTarget {
    /// All bound names, left to right
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ForTarget::Name(name) => out.push(name),
            ForTarget::Tuple(items) => {
                for item in items {
                    item.collect_names(out);
                }
            }
        }
    }

    /// The target read back as an expression (`name` or `(a, b)`)
    pub fn to_expr(&self) -> Expr {
        match self {
            ForTarget::Name(name) => Expr::Ident(name.clone()),
            ForTarget::Tuple(items) => Expr::Tuple(items.iter().map(ForTarget::to_expr).collect()),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    In,
    NotIn,
    Is,
    IsNot,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
}

/// Source location of a statement: 1-based inclusive line range and the
/// column of its first character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub end_line: usize,
    pub indent: usize,
}

/// A statement with its location
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement types
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression statement
    Expr(Expr),
    /// Single-target assignment (`x = v`, `d['k'] = v`, `a, b = v`)
    Assign { target: Expr, value: Expr },
    /// Augmented assignment (x += 1, x -= 1, etc.)
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    /// If statement
    If(IfStmt),
    /// For loop
    For(ForLoop),
    /// While loop
    While { condition: Expr, body: Vec<Stmt> },
    /// Function definition; `signature` is the header text after `def`
    FuncDef {
        name: String,
        signature: String,
        body: Vec<Stmt>,
    },
    /// Return statement
    Return(Option<Expr>),
    Pass,
    Break,
    Continue,
    /// Any other block statement (class, with, try, ...), header text without the colon
    Compound { header: String, body: Vec<Stmt> },
    /// Any other single-line statement, kept as source text
    Other(String),
}

/// If statement with its elif chain and else branch
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub elif_clauses: Vec<(Expr, Vec<Stmt>)>,
    pub orelse: Option<Vec<Stmt>>,
}

impl IfStmt {
    /// True when anything runs when `test` is false
    pub fn has_false_branch(&self) -> bool {
        !self.elif_clauses.is_empty() || self.orelse.as_ref().is_some_and(|b| !b.is_empty())
    }
}

/// A `for` loop
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub target: ForTarget,
    pub iter: Expr,
    pub body: Vec<Stmt>,
    /// `for ... else:` clause
    pub orelse: Option<Vec<Stmt>>,
}

/// Program (collection of statements)
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
