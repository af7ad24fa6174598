//! Token definitions

/// Token types for Python lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal, kept as written
    Number(String),
    /// Plain single-line string literal: decoded value and the text as written
    StringLiteral { value: String, text: String },
    /// Literal that is carried through untouched (f"..", r"..", """..""", ...)
    Verbatim(String),

    // Identifiers and keywords
    Ident(String),
    Keyword(Keyword),

    // Operators
    Operator(Operator),

    // Delimiters
    Delimiter(Delimiter),
}

/// Python keywords that take part in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    For,
    In,
    Is,
    And,
    Or,
    Not,
    Lambda,
    True,
    False,
    None,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        Some(match word {
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "is" => Keyword::Is,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "lambda" => Keyword::Lambda,
            "True" => Keyword::True,
            "False" => Keyword::False,
            "None" => Keyword::None,
            _ => return None,
        })
    }
}

/// Operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    At,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,

    // Comparison
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Assignment
    Assign,
    /// `+=`, `**=`, ... carrying the underlying operator
    AugAssign(AugOp),
    Walrus,

    // Other
    Arrow, // ->
    Colon,
}

/// Operator part of an augmented assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugOp {
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
}

/// Delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
}
