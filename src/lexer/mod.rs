//! Lexer module - Tokenization of one logical line

mod token;

pub use token::*;

use crate::error::{LoopCompError, Result};

const OPERATORS: &[(&str, Token)] = &[
    ("**=", Token::Operator(Operator::AugAssign(AugOp::Pow))),
    ("//=", Token::Operator(Operator::AugAssign(AugOp::FloorDiv))),
    (">>=", Token::Operator(Operator::AugAssign(AugOp::Shr))),
    ("<<=", Token::Operator(Operator::AugAssign(AugOp::Shl))),
    ("**", Token::Operator(Operator::DoubleStar)),
    ("//", Token::Operator(Operator::DoubleSlash)),
    ("<<", Token::Operator(Operator::Shl)),
    (">>", Token::Operator(Operator::Shr)),
    ("<=", Token::Operator(Operator::LtEq)),
    (">=", Token::Operator(Operator::GtEq)),
    ("==", Token::Operator(Operator::Eq)),
    ("!=", Token::Operator(Operator::NotEq)),
    ("->", Token::Operator(Operator::Arrow)),
    (":=", Token::Operator(Operator::Walrus)),
    ("+=", Token::Operator(Operator::AugAssign(AugOp::Add))),
    ("-=", Token::Operator(Operator::AugAssign(AugOp::Sub))),
    ("*=", Token::Operator(Operator::AugAssign(AugOp::Mul))),
    ("/=", Token::Operator(Operator::AugAssign(AugOp::Div))),
    ("%=", Token::Operator(Operator::AugAssign(AugOp::Mod))),
    ("@=", Token::Operator(Operator::AugAssign(AugOp::MatMul))),
    ("&=", Token::Operator(Operator::AugAssign(AugOp::BitAnd))),
    ("|=", Token::Operator(Operator::AugAssign(AugOp::BitOr))),
    ("^=", Token::Operator(Operator::AugAssign(AugOp::BitXor))),
    ("+", Token::Operator(Operator::Plus)),
    ("-", Token::Operator(Operator::Minus)),
    ("*", Token::Operator(Operator::Star)),
    ("/", Token::Operator(Operator::Slash)),
    ("%", Token::Operator(Operator::Percent)),
    ("@", Token::Operator(Operator::At)),
    ("&", Token::Operator(Operator::Amp)),
    ("|", Token::Operator(Operator::Pipe)),
    ("^", Token::Operator(Operator::Caret)),
    ("~", Token::Operator(Operator::Tilde)),
    ("<", Token::Operator(Operator::Lt)),
    (">", Token::Operator(Operator::Gt)),
    ("=", Token::Operator(Operator::Assign)),
    (":", Token::Operator(Operator::Colon)),
    ("(", Token::Delimiter(Delimiter::LParen)),
    (")", Token::Delimiter(Delimiter::RParen)),
    ("[", Token::Delimiter(Delimiter::LBracket)),
    ("]", Token::Delimiter(Delimiter::RBracket)),
    ("{", Token::Delimiter(Delimiter::LBrace)),
    ("}", Token::Delimiter(Delimiter::RBrace)),
    (",", Token::Delimiter(Delimiter::Comma)),
    (";", Token::Delimiter(Delimiter::Semicolon)),
    (".", Token::Delimiter(Delimiter::Dot)),
];

/// Tokenize one logical line of Python source
///
/// `line` is only used for error messages.
pub fn tokenize(source: &str, line: usize) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() || c == '\\' {
            i += 1;
            continue;
        }

        if c == '#' {
            break;
        }

        if let Some(quote_start) = string_start(&chars, i) {
            let (token, next) = lex_string(&chars, i, quote_start, line)?;
            tokens.push(token);
            i = next;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() {
                let d = chars[i];
                let exponent_sign = (d == '+' || d == '-')
                    && matches!(chars[i - 1], 'e' | 'E')
                    && !chars[start..i].iter().any(|x| matches!(x, 'x' | 'X'));
                if d.is_alphanumeric() || d == '_' || d == '.' || exponent_sign {
                    i += 1;
                } else {
                    break;
                }
            }
            tokens.push(Token::Number(chars[start..i].iter().collect()));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match Keyword::from_word(&word) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Ident(word),
            });
            continue;
        }

        if chars[i..].starts_with(&['.', '.', '.']) {
            tokens.push(Token::Verbatim("...".to_string()));
            i += 3;
            continue;
        }

        let matched = OPERATORS.iter().find(|(text, _)| {
            let op: Vec<char> = text.chars().collect();
            chars[i..].starts_with(&op)
        });
        match matched {
            Some((text, token)) => {
                tokens.push(token.clone());
                i += text.len();
            }
            None => {
                return Err(LoopCompError::parse(
                    line,
                    format!("Unexpected character '{c}'"),
                ))
            }
        }
    }

    Ok(tokens)
}

/// Position of the opening quote if a string literal (with optional prefix) starts at `i`
fn string_start(chars: &[char], i: usize) -> Option<usize> {
    let mut j = i;
    while j < chars.len() && j - i < 2 && matches!(chars[j], 'r' | 'R' | 'b' | 'B' | 'u' | 'U' | 'f' | 'F') {
        j += 1;
    }
    if j < chars.len() && (chars[j] == '"' || chars[j] == '\'') {
        // A prefix must not be the tail of a longer identifier
        if j > i && i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_') {
            return None;
        }
        Some(j)
    } else {
        None
    }
}

fn lex_string(chars: &[char], start: usize, quote_pos: usize, line: usize) -> Result<(Token, usize)> {
    let quote = chars[quote_pos];
    let triple = chars[quote_pos..].starts_with(&[quote, quote, quote]);
    let body_start = quote_pos + if triple { 3 } else { 1 };
    let mut i = body_start;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if c == quote {
            if !triple {
                let text: String = chars[start..=i].iter().collect();
                let decoded = if quote_pos == start {
                    decode_escapes(&chars[body_start..i])
                } else {
                    None
                };
                let token = match decoded {
                    Some(value) => Token::StringLiteral { value, text },
                    None => Token::Verbatim(text),
                };
                return Ok((token, i + 1));
            }
            if chars[i..].starts_with(&[quote, quote, quote]) {
                let end = i + 3;
                return Ok((Token::Verbatim(chars[start..end].iter().collect()), end));
            }
        }
        i += 1;
    }

    Err(LoopCompError::parse(line, "Unterminated string literal"))
}

/// Decode the simple escapes of a plain string body
///
/// Returns `None` for escapes that are left to Python (`\x..`, `\u....`,
/// `\N{..}`, octal, line continuations), so the literal stays verbatim.
fn decode_escapes(body: &[char]) -> Option<String> {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.iter();
    while let Some(&c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            _ => return None,
        };
        value.push(decoded);
    }
    Some(value)
}
