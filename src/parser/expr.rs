//! Expression parser - recursive descent over the tokens of one logical line

use super::ast::*;
use crate::error::{LoopCompError, Result};
use crate::lexer::{tokenize, Delimiter, Keyword, Operator, Token};

/// Parse a complete expression (a bare `a, b` yields a tuple)
pub fn parse_expr(source: &str, line: usize) -> Result<Expr> {
    let tokens = tokenize(source, line)?;
    parse_expr_tokens(&tokens, line)
}

/// Parse a token slice that must hold exactly one expression list
pub(crate) fn parse_expr_tokens(tokens: &[Token], line: usize) -> Result<Expr> {
    let mut parser = ExprParser::new(tokens, line);
    let expr = parser.testlist()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse a token slice holding a `for` target (`x`, `a, b`, `(i, (k, v))`)
pub(crate) fn parse_target_tokens(tokens: &[Token], line: usize) -> Result<ForTarget> {
    let mut parser = ExprParser::new(tokens, line);
    let target = parser.target_list()?;
    parser.finish()?;
    Ok(target)
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: usize,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [Token], line: usize) -> Self {
        Self { tokens, pos: 0, line }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn check_op(&self, op: Operator) -> bool {
        self.check(&Token::Operator(op))
    }

    fn check_delim(&self, delim: Delimiter) -> bool {
        self.check(&Token::Delimiter(delim))
    }

    fn check_kw(&self, kw: Keyword) -> bool {
        self.check(&Token::Keyword(kw))
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_delim(&mut self, delim: Delimiter) -> bool {
        self.eat(&Token::Delimiter(delim))
    }

    fn eat_kw(&mut self, kw: Keyword) -> bool {
        self.eat(&Token::Keyword(kw))
    }

    fn expect_delim(&mut self, delim: Delimiter) -> Result<()> {
        if self.eat_delim(delim) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {delim:?}")))
        }
    }

    fn error(&self, message: impl Into<String>) -> LoopCompError {
        let message = message.into();
        match self.peek() {
            Some(token) => LoopCompError::parse(self.line, format!("{message}, found {token:?}")),
            None => LoopCompError::parse(self.line, format!("{message} at end of line")),
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos < self.tokens.len() {
            Err(self.error("Unexpected trailing tokens"))
        } else {
            Ok(())
        }
    }

    /// True at a token that cannot start an expression
    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(Token::Delimiter(
                Delimiter::RParen | Delimiter::RBracket | Delimiter::RBrace | Delimiter::Comma | Delimiter::Semicolon
            )) | Some(Token::Operator(Operator::Colon | Operator::Assign | Operator::AugAssign(_)))
        )
    }

    // === Expression lists ===

    fn testlist(&mut self) -> Result<Expr> {
        let first = self.star_or_test()?;
        if !self.check_delim(Delimiter::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_delim(Delimiter::Comma) {
            if self.at_expr_end() {
                break;
            }
            items.push(self.star_or_test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn star_or_test(&mut self) -> Result<Expr> {
        if self.eat(&Token::Operator(Operator::Star)) {
            return Ok(Expr::Starred(Box::new(self.bitor()?)));
        }
        self.test()
    }

    // === Precedence levels, loosest first ===

    fn test(&mut self) -> Result<Expr> {
        if self.check_kw(Keyword::Lambda) {
            return self.lambda();
        }
        let body = self.or_test()?;
        if self.eat_kw(Keyword::If) {
            let test = self.or_test()?;
            if !self.eat_kw(Keyword::Else) {
                return Err(self.error("Expected 'else' in conditional expression"));
            }
            let orelse = self.test()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn lambda(&mut self) -> Result<Expr> {
        self.eat_kw(Keyword::Lambda);
        let mut params = Vec::new();
        while !self.check_op(Operator::Colon) {
            let stars = if self.eat(&Token::Operator(Operator::DoubleStar)) {
                "**"
            } else if self.eat(&Token::Operator(Operator::Star)) {
                "*"
            } else {
                ""
            };
            let name = match self.advance() {
                Some(Token::Ident(name)) => format!("{stars}{name}"),
                _ => return Err(self.error("Expected lambda parameter")),
            };
            let default = if self.eat(&Token::Operator(Operator::Assign)) {
                Some(self.test()?)
            } else {
                None
            };
            params.push((name, default));
            if !self.eat_delim(Delimiter::Comma) {
                break;
            }
        }
        if !self.eat(&Token::Operator(Operator::Colon)) {
            return Err(self.error("Expected ':' in lambda"));
        }
        let body = self.test()?;
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
        })
    }

    fn or_test(&mut self) -> Result<Expr> {
        let mut left = self.and_test()?;
        while self.eat_kw(Keyword::Or) {
            let right = self.and_test()?;
            left = Expr::BinOp {
                left: Box::new(left),
                op: BinOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_test(&mut self) -> Result<Expr> {
        let mut left = self.not_test()?;
        while self.eat_kw(Keyword::And) {
            let right = self.not_test()?;
            left = Expr::and(left, right);
        }
        Ok(left)
    }

    fn not_test(&mut self) -> Result<Expr> {
        if self.eat_kw(Keyword::Not) {
            return Ok(Expr::not(self.not_test()?));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.bitor()?;
        let mut ops = Vec::new();
        while let Some(op) = self.comparison_op() {
            ops.push((op, self.bitor()?));
        }
        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                ops,
            })
        }
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let (op, width) = match self.peek()? {
            Token::Operator(Operator::Eq) => (CmpOp::Eq, 1),
            Token::Operator(Operator::NotEq) => (CmpOp::NotEq, 1),
            Token::Operator(Operator::Lt) => (CmpOp::Lt, 1),
            Token::Operator(Operator::Gt) => (CmpOp::Gt, 1),
            Token::Operator(Operator::LtEq) => (CmpOp::LtEq, 1),
            Token::Operator(Operator::GtEq) => (CmpOp::GtEq, 1),
            Token::Keyword(Keyword::In) => (CmpOp::In, 1),
            Token::Keyword(Keyword::Not) if self.peek_at(1) == Some(&Token::Keyword(Keyword::In)) => {
                (CmpOp::NotIn, 2)
            }
            Token::Keyword(Keyword::Is) if self.peek_at(1) == Some(&Token::Keyword(Keyword::Not)) => {
                (CmpOp::IsNot, 2)
            }
            Token::Keyword(Keyword::Is) => (CmpOp::Is, 1),
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn bitor(&mut self) -> Result<Expr> {
        self.binary_level(0)
    }

    /// Left-associative binary levels from `|` down to `* / // % @`
    fn binary_level(&mut self, level: usize) -> Result<Expr> {
        const LEVELS: &[&[(Operator, BinOp)]] = &[
            &[(Operator::Pipe, BinOp::BitOr)],
            &[(Operator::Caret, BinOp::BitXor)],
            &[(Operator::Amp, BinOp::BitAnd)],
            &[(Operator::Shl, BinOp::Shl), (Operator::Shr, BinOp::Shr)],
            &[(Operator::Plus, BinOp::Add), (Operator::Minus, BinOp::Sub)],
            &[
                (Operator::Star, BinOp::Mul),
                (Operator::Slash, BinOp::Div),
                (Operator::DoubleSlash, BinOp::FloorDiv),
                (Operator::Percent, BinOp::Mod),
                (Operator::At, BinOp::MatMul),
            ],
        ];

        let Some(ops) = LEVELS.get(level) else {
            return self.factor();
        };
        let mut left = self.binary_level(level + 1)?;
        loop {
            let found = ops.iter().find(|(tok, _)| self.check_op(*tok));
            let Some(&(_, op)) = found else {
                break;
            };
            self.pos += 1;
            let right = self.binary_level(level + 1)?;
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Operator(Operator::Minus)) => UnaryOp::Neg,
            Some(Token::Operator(Operator::Plus)) => UnaryOp::Pos,
            Some(Token::Operator(Operator::Tilde)) => UnaryOp::BitNot,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.factor()?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.primary()?;
        if self.eat(&Token::Operator(Operator::DoubleStar)) {
            let exponent = self.factor()?;
            return Ok(Expr::BinOp {
                left: Box::new(base),
                op: BinOp::Pow,
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    // === Primaries ===

    fn primary(&mut self) -> Result<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.eat_delim(Delimiter::LParen) {
                expr = self.call(expr)?;
            } else if self.eat_delim(Delimiter::LBracket) {
                let index = self.subscript()?;
                self.expect_delim(Delimiter::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat_delim(Delimiter::Dot) {
                match self.advance() {
                    Some(Token::Ident(attr)) => {
                        expr = Expr::Attribute {
                            value: Box::new(expr),
                            attr: attr.clone(),
                        }
                    }
                    _ => return Err(self.error("Expected attribute name")),
                }
            } else {
                return Ok(expr);
            }
        }
    }

    fn call(&mut self, func: Expr) -> Result<Expr> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        while !self.check_delim(Delimiter::RParen) {
            if self.eat(&Token::Operator(Operator::DoubleStar)) {
                kwargs.push((None, self.test()?));
            } else if let (Some(Token::Ident(name)), Some(Token::Operator(Operator::Assign))) =
                (self.peek(), self.peek_at(1))
            {
                self.pos += 2;
                kwargs.push((Some(name.clone()), self.test()?));
            } else {
                let arg = self.star_or_test()?;
                if self.check_kw(Keyword::For) && args.is_empty() && kwargs.is_empty() {
                    let generators = self.comp_clauses()?;
                    args.push(Expr::GenExpr {
                        elt: Box::new(arg),
                        generators,
                    });
                } else {
                    args.push(arg);
                }
            }
            if !self.eat_delim(Delimiter::Comma) {
                break;
            }
        }
        self.expect_delim(Delimiter::RParen)?;
        Ok(Expr::Call {
            func: Box::new(func),
            args,
            kwargs,
        })
    }

    fn subscript(&mut self) -> Result<Expr> {
        let first = self.slice_item()?;
        if !self.check_delim(Delimiter::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_delim(Delimiter::Comma) {
            if self.check_delim(Delimiter::RBracket) {
                break;
            }
            items.push(self.slice_item()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn slice_item(&mut self) -> Result<Expr> {
        let lower = if self.check_op(Operator::Colon) {
            None
        } else {
            let expr = self.test()?;
            if !self.check_op(Operator::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };
        self.pos += 1;
        let upper = self.optional_slice_part()?;
        let step = if self.eat(&Token::Operator(Operator::Colon)) {
            self.optional_slice_part()?
        } else {
            None
        };
        Ok(Expr::Slice { lower, upper, step })
    }

    fn optional_slice_part(&mut self) -> Result<Option<Box<Expr>>> {
        if self.at_expr_end() {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.test()?)))
        }
    }

    fn atom(&mut self) -> Result<Expr> {
        let Some(token) = self.advance() else {
            return Err(self.error("Expected expression"));
        };
        match token {
            Token::Number(text) => Ok(number(text)),
            Token::StringLiteral { .. } | Token::Verbatim(_) => self.strings(token),
            Token::Ident(name) => Ok(Expr::Ident(name.clone())),
            Token::Keyword(Keyword::True) => Ok(Expr::BoolLiteral(true)),
            Token::Keyword(Keyword::False) => Ok(Expr::BoolLiteral(false)),
            Token::Keyword(Keyword::None) => Ok(Expr::NoneLiteral),
            Token::Delimiter(Delimiter::LParen) => self.paren(),
            Token::Delimiter(Delimiter::LBracket) => self.bracket(),
            Token::Delimiter(Delimiter::LBrace) => self.brace(),
            _ => {
                self.pos -= 1;
                Err(self.error("Expected expression"))
            }
        }
    }

    /// Implicitly concatenated string literals
    ///
    /// Plain literals merge into one value; anything else keeps the source
    /// text of every part.
    fn strings(&mut self, first: &Token) -> Result<Expr> {
        let mut parts = vec![first];
        while let Some(next @ (Token::StringLiteral { .. } | Token::Verbatim(_))) = self.peek() {
            self.pos += 1;
            parts.push(next);
        }
        if parts.len() == 1 {
            return Ok(string_expr(first));
        }

        let mut value = String::new();
        for part in &parts {
            match part {
                Token::StringLiteral { value: part_value, .. } => value.push_str(part_value),
                _ => {
                    let text: Vec<&str> = parts.iter().map(|part| token_text(part)).collect();
                    return Ok(Expr::Verbatim(text.join(" ")));
                }
            }
        }
        Ok(Expr::StringLiteral(value))
    }

    fn paren(&mut self) -> Result<Expr> {
        if self.eat_delim(Delimiter::RParen) {
            return Ok(Expr::Tuple(vec![]));
        }
        let first = self.star_or_test()?;
        if self.check_kw(Keyword::For) {
            let generators = self.comp_clauses()?;
            self.expect_delim(Delimiter::RParen)?;
            return Ok(Expr::GenExpr {
                elt: Box::new(first),
                generators,
            });
        }
        if !self.check_delim(Delimiter::Comma) {
            self.expect_delim(Delimiter::RParen)?;
            return Ok(first);
        }
        let items = self.sequence_tail(first, Delimiter::RParen)?;
        Ok(Expr::Tuple(items))
    }

    fn bracket(&mut self) -> Result<Expr> {
        if self.eat_delim(Delimiter::RBracket) {
            return Ok(Expr::List(vec![]));
        }
        let first = self.star_or_test()?;
        if self.check_kw(Keyword::For) {
            let generators = self.comp_clauses()?;
            self.expect_delim(Delimiter::RBracket)?;
            return Ok(Expr::ListComp {
                elt: Box::new(first),
                generators,
            });
        }
        let items = self.sequence_tail(first, Delimiter::RBracket)?;
        Ok(Expr::List(items))
    }

    fn brace(&mut self) -> Result<Expr> {
        if self.eat_delim(Delimiter::RBrace) {
            return Ok(Expr::Dict(vec![]));
        }
        let first = self.star_or_test()?;
        if self.eat(&Token::Operator(Operator::Colon)) {
            let value = self.test()?;
            if self.check_kw(Keyword::For) {
                let generators = self.comp_clauses()?;
                self.expect_delim(Delimiter::RBrace)?;
                return Ok(Expr::DictComp {
                    key: Box::new(first),
                    value: Box::new(value),
                    generators,
                });
            }
            let mut entries = vec![(first, value)];
            while self.eat_delim(Delimiter::Comma) {
                if self.check_delim(Delimiter::RBrace) {
                    break;
                }
                let key = self.test()?;
                if !self.eat(&Token::Operator(Operator::Colon)) {
                    return Err(self.error("Expected ':' in dict literal"));
                }
                entries.push((key, self.test()?));
            }
            self.expect_delim(Delimiter::RBrace)?;
            return Ok(Expr::Dict(entries));
        }
        if self.check_kw(Keyword::For) {
            let generators = self.comp_clauses()?;
            self.expect_delim(Delimiter::RBrace)?;
            return Ok(Expr::SetComp {
                elt: Box::new(first),
                generators,
            });
        }
        let items = self.sequence_tail(first, Delimiter::RBrace)?;
        Ok(Expr::Set(items))
    }

    /// Remaining `, item` entries of a bracketed sequence, consuming the closer
    fn sequence_tail(&mut self, first: Expr, close: Delimiter) -> Result<Vec<Expr>> {
        let mut items = vec![first];
        while self.eat_delim(Delimiter::Comma) {
            if self.check_delim(close) {
                break;
            }
            items.push(self.star_or_test()?);
        }
        self.expect_delim(close)?;
        Ok(items)
    }

    // === Comprehension clauses and targets ===

    fn comp_clauses(&mut self) -> Result<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.eat_kw(Keyword::For) {
            let target = self.target_list()?;
            if !self.eat_kw(Keyword::In) {
                return Err(self.error("Expected 'in' in comprehension"));
            }
            let iter = self.or_test()?;
            let mut ifs = Vec::new();
            while self.eat_kw(Keyword::If) {
                ifs.push(self.or_test()?);
            }
            generators.push(Comprehension { target, iter, ifs });
        }
        Ok(generators)
    }

    fn target_list(&mut self) -> Result<ForTarget> {
        let first = self.target_atom()?;
        if !self.check_delim(Delimiter::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_delim(Delimiter::Comma) {
            if self.check_kw(Keyword::In) || self.peek().is_none() {
                break;
            }
            items.push(self.target_atom()?);
        }
        Ok(ForTarget::Tuple(items))
    }

    fn target_atom(&mut self) -> Result<ForTarget> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(ForTarget::Name(name.clone()))
            }
            Some(Token::Delimiter(open @ (Delimiter::LParen | Delimiter::LBracket))) => {
                self.pos += 1;
                let close = if *open == Delimiter::LParen {
                    Delimiter::RParen
                } else {
                    Delimiter::RBracket
                };
                let mut items = Vec::new();
                let mut saw_comma = false;
                while !self.check_delim(close) {
                    items.push(self.target_atom()?);
                    if !self.eat_delim(Delimiter::Comma) {
                        break;
                    }
                    saw_comma = true;
                }
                self.expect_delim(close)?;
                if items.len() == 1 && !saw_comma && *open == Delimiter::LParen {
                    return Ok(items.remove(0));
                }
                Ok(ForTarget::Tuple(items))
            }
            _ => Err(self.error("Expected loop target")),
        }
    }
}

fn number(text: &str) -> Expr {
    if let Ok(n) = text.parse::<i64>() {
        return Expr::IntLiteral(n);
    }
    let float_like = text.contains(['.', 'e', 'E']);
    if float_like && text.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        if let Ok(f) = text.parse::<f64>() {
            return Expr::FloatLiteral(f);
        }
    }
    Expr::Verbatim(text.to_string())
}

fn string_expr(token: &Token) -> Expr {
    match token {
        Token::StringLiteral { value, .. } => Expr::StringLiteral(value.clone()),
        other => Expr::Verbatim(token_text(other).to_string()),
    }
}

fn token_text(token: &Token) -> &str {
    match token {
        Token::StringLiteral { text, .. } | Token::Verbatim(text) => text,
        _ => "",
    }
}
