//! Parser module - indentation-driven Python parser
//!
//! Statements are recognised line by line: one logical line per simple
//! statement, block headers ending in `:` followed by an indented suite.
//! Expressions go through the token-based parser in [`expr`].

mod ast;
mod expr;
pub mod utils;
mod visit;

pub use ast::*;
pub use expr::parse_expr;
pub use visit::{walk_comprehension, walk_expr, walk_stmts, Visitor};

use crate::error::{LoopCompError, Result};
use crate::lexer::{tokenize, Delimiter, Keyword, Operator, Token};
use expr::{parse_expr_tokens, parse_target_tokens};
use tracing::debug;
use utils::{find_header_colon, first_word, logical_lines, LogicalLine};

/// Block statements with no special meaning to the analysis
const COMPOUND_KEYWORDS: &[&str] = &[
    "class", "with", "try", "except", "finally", "else", "elif", "match", "case", "async",
];

/// Simple statements that are carried through as text
const OPAQUE_KEYWORDS: &[&str] = &[
    "import", "from", "global", "nonlocal", "del", "raise", "assert", "yield", "await", "print",
];

/// Parse Python source code into AST
pub fn parse(source: &str) -> Result<Program> {
    let lines = logical_lines(source);
    let mut pos = 0;

    let Some(first) = lines.first() else {
        return Ok(Program { statements: vec![] });
    };
    let statements = parse_block(&lines, &mut pos, first.indent)?;

    if let Some(line) = lines.get(pos) {
        return Err(LoopCompError::parse(line.line, "Unexpected indent"));
    }

    Ok(Program { statements })
}

/// Parse consecutive statements at exactly `indent`
fn parse_block(lines: &[LogicalLine], pos: &mut usize, indent: usize) -> Result<Vec<Stmt>> {
    let mut statements = Vec::new();

    while let Some(line) = lines.get(*pos) {
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(LoopCompError::parse(line.line, "Unexpected indent"));
        }
        statements.extend(parse_statement(lines, pos)?);
    }

    Ok(statements)
}

/// Parse the statement starting at `lines[*pos]`, advancing past it
fn parse_statement(lines: &[LogicalLine], pos: &mut usize) -> Result<Vec<Stmt>> {
    let line = &lines[*pos];
    let word = first_word(&line.text);

    let stmt = match word {
        "if" => parse_if_stmt(lines, pos)?,
        "for" => parse_for_stmt(lines, pos)?,
        "while" => parse_while_stmt(lines, pos)?,
        "def" => parse_function_def(lines, pos)?,
        _ if COMPOUND_KEYWORDS.contains(&word) && find_header_colon(&line.text).is_some() => {
            parse_compound(lines, pos)?
        }
        _ => {
            *pos += 1;
            return Ok(parse_simple_statements(&line.text, span_of(line)));
        }
    };

    Ok(vec![stmt])
}

fn span_of(line: &LogicalLine) -> Span {
    Span {
        line: line.line,
        end_line: line.end_line,
        indent: line.indent,
    }
}

/// Split a block header into the part before the colon and the inline body
fn split_header<'a>(line: &'a LogicalLine, keyword: &str) -> Result<(&'a str, &'a str)> {
    let colon = find_header_colon(&line.text).ok_or_else(|| {
        LoopCompError::parse(line.line, format!("Missing colon in {keyword} statement"))
    })?;
    let head = line.text[..colon].trim();
    let head = head.strip_prefix(keyword).unwrap_or(head).trim();
    Ok((head, line.text[colon + 1..].trim()))
}

/// Parse the suite of the header at `lines[*pos]`; `*pos` must already point past the header
fn parse_suite(lines: &[LogicalLine], pos: &mut usize, header: &LogicalLine, inline: &str) -> Result<Vec<Stmt>> {
    if !inline.is_empty() {
        return Ok(parse_simple_statements(inline, span_of(header)));
    }
    match lines.get(*pos) {
        Some(next) if next.indent > header.indent => parse_block(lines, pos, next.indent),
        _ => Err(LoopCompError::parse(header.line, "Expected an indented block")),
    }
}

/// Span from the header to the last statement of its suite
fn block_span(header: &LogicalLine, suite: &[Stmt]) -> Span {
    let end_line = suite
        .last()
        .map_or(header.end_line, |stmt| stmt.span.end_line)
        .max(header.end_line);
    Span {
        end_line,
        ..span_of(header)
    }
}

/// Header expression that failed to parse: keep the block as an inert compound
fn degrade(lines: &[LogicalLine], pos: &mut usize, err: LoopCompError) -> Result<Stmt> {
    debug!(error = %err, "keeping block with unparsed header as opaque");
    *pos -= 1;
    parse_compound(lines, pos)
}

/// Parse an if statement
fn parse_if_stmt(lines: &[LogicalLine], pos: &mut usize) -> Result<Stmt> {
    let header = &lines[*pos];
    let (condition_str, inline) = split_header(header, "if")?;
    *pos += 1;

    let test = match parse_expr(condition_str, header.line) {
        Ok(test) => test,
        Err(err) => return degrade(lines, pos, err),
    };
    let body = parse_suite(lines, pos, header, inline)?;

    let mut elif_clauses = Vec::new();
    let mut orelse = None;
    let mut last_end = block_span(header, &body).end_line;

    // Parse elif clauses
    while let Some(next) = lines.get(*pos) {
        if next.indent != header.indent || first_word(&next.text) != "elif" {
            break;
        }
        let (elif_str, elif_inline) = split_header(next, "elif")?;
        *pos += 1;
        let elif_cond = parse_expr(elif_str, next.line)?;
        let elif_body = parse_suite(lines, pos, next, elif_inline)?;
        last_end = block_span(next, &elif_body).end_line;
        elif_clauses.push((elif_cond, elif_body));
    }

    // Parse else clause
    if let Some(next) = lines.get(*pos) {
        if next.indent == header.indent && first_word(&next.text) == "else" {
            let (_, else_inline) = split_header(next, "else")?;
            *pos += 1;
            let else_body = parse_suite(lines, pos, next, else_inline)?;
            last_end = block_span(next, &else_body).end_line;
            orelse = Some(else_body);
        }
    }

    Ok(Stmt::new(
        StmtKind::If(IfStmt {
            test,
            body,
            elif_clauses,
            orelse,
        }),
        Span {
            end_line: last_end,
            ..span_of(header)
        },
    ))
}

/// Parse a for loop
fn parse_for_stmt(lines: &[LogicalLine], pos: &mut usize) -> Result<Stmt> {
    let header = &lines[*pos];
    let (loop_part, inline) = split_header(header, "for")?;
    *pos += 1;

    let (target, iter) = match parse_for_header(loop_part, header.line) {
        Ok(parts) => parts,
        Err(err) => return degrade(lines, pos, err),
    };
    let body = parse_suite(lines, pos, header, inline)?;
    let mut end_line = block_span(header, &body).end_line;

    let mut orelse = None;
    if let Some(next) = lines.get(*pos) {
        if next.indent == header.indent && first_word(&next.text) == "else" {
            let (_, else_inline) = split_header(next, "else")?;
            *pos += 1;
            let else_body = parse_suite(lines, pos, next, else_inline)?;
            end_line = block_span(next, &else_body).end_line;
            orelse = Some(else_body);
        }
    }

    Ok(Stmt::new(
        StmtKind::For(ForLoop {
            target,
            iter,
            body,
            orelse,
        }),
        Span {
            end_line,
            ..span_of(header)
        },
    ))
}

/// Split `target in iterable` at the first top-level `in`
fn parse_for_header(loop_part: &str, line: usize) -> Result<(ForTarget, Expr)> {
    let tokens = tokenize(loop_part, line)?;
    let mut depth = 0i32;
    let in_pos = tokens.iter().position(|token| {
        match token {
            Token::Delimiter(Delimiter::LParen | Delimiter::LBracket | Delimiter::LBrace) => depth += 1,
            Token::Delimiter(Delimiter::RParen | Delimiter::RBracket | Delimiter::RBrace) => depth -= 1,
            Token::Keyword(Keyword::In) if depth == 0 => return true,
            _ => {}
        }
        false
    });
    let in_pos = in_pos.ok_or_else(|| LoopCompError::parse(line, "Missing 'in' in for loop"))?;

    let target = parse_target_tokens(&tokens[..in_pos], line)?;
    let iter = parse_expr_tokens(&tokens[in_pos + 1..], line)?;
    Ok((target, iter))
}

/// Parse a while loop
fn parse_while_stmt(lines: &[LogicalLine], pos: &mut usize) -> Result<Stmt> {
    let header = &lines[*pos];
    let (condition_str, inline) = split_header(header, "while")?;
    *pos += 1;

    let condition = match parse_expr(condition_str, header.line) {
        Ok(condition) => condition,
        Err(err) => return degrade(lines, pos, err),
    };
    let body = parse_suite(lines, pos, header, inline)?;
    let span = block_span(header, &body);

    Ok(Stmt::new(StmtKind::While { condition, body }, span))
}

/// Parse a function definition
fn parse_function_def(lines: &[LogicalLine], pos: &mut usize) -> Result<Stmt> {
    let header = &lines[*pos];
    let (signature, inline) = split_header(header, "def")?;
    *pos += 1;

    let paren_start = signature.find('(').ok_or_else(|| {
        LoopCompError::parse(header.line, "Missing opening parenthesis")
    })?;
    let name = signature[..paren_start].trim().to_string();

    let body = parse_suite(lines, pos, header, inline)?;
    let span = block_span(header, &body);

    Ok(Stmt::new(
        StmtKind::FuncDef {
            name,
            signature: signature.to_string(),
            body,
        },
        span,
    ))
}

/// Parse a block statement the analysis does not interpret (class, with, try, ...)
fn parse_compound(lines: &[LogicalLine], pos: &mut usize) -> Result<Stmt> {
    let header_line = &lines[*pos];
    let colon = find_header_colon(&header_line.text).ok_or_else(|| {
        LoopCompError::parse(header_line.line, "Missing colon in block statement")
    })?;
    let header = header_line.text[..colon].trim().to_string();
    let inline = header_line.text[colon + 1..].trim();
    *pos += 1;

    let body = parse_suite(lines, pos, header_line, inline)?;
    let span = block_span(header_line, &body);

    Ok(Stmt::new(StmtKind::Compound { header, body }, span))
}

/// Parse `a = 1; b = 2` style lines into one statement per segment
fn parse_simple_statements(text: &str, span: Span) -> Vec<Stmt> {
    split_semicolons(text)
        .into_iter()
        .map(|segment| Stmt::new(parse_line(segment, span.line), span))
        .collect()
}

fn split_semicolons(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(idx) = find_top_level(rest, ';') {
        parts.push(rest[..idx].trim());
        rest = &rest[idx + 1..];
    }
    if !rest.trim().is_empty() {
        parts.push(rest.trim());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

fn find_top_level(s: &str, target: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ if c == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parse a single line of Python code
fn parse_line(line: &str, line_num: usize) -> StmtKind {
    let line = line.trim();

    match line {
        "pass" => return StmtKind::Pass,
        "break" => return StmtKind::Break,
        "continue" => return StmtKind::Continue,
        _ => {}
    }

    let word = first_word(line);
    if word == "return" {
        return parse_return(line, line_num);
    }
    if OPAQUE_KEYWORDS.contains(&word) && !line[word.len()..].starts_with('(') {
        return StmtKind::Other(line.to_string());
    }

    let tokens = match tokenize(line, line_num) {
        Ok(tokens) => tokens,
        Err(err) => {
            debug!(line = line_num, error = %err, "keeping untokenizable line as opaque");
            return StmtKind::Other(line.to_string());
        }
    };

    match try_parse_assignment(&tokens, line_num) {
        Some(Ok(kind)) => return kind,
        Some(Err(_)) => return StmtKind::Other(line.to_string()),
        None => {}
    }

    match parse_expr_tokens(&tokens, line_num) {
        Ok(expr) => StmtKind::Expr(expr),
        Err(_) => StmtKind::Other(line.to_string()),
    }
}

/// Try to parse an assignment statement; `None` if the line has no top-level `=`
fn try_parse_assignment(tokens: &[Token], line_num: usize) -> Option<Result<StmtKind>> {
    let mut depth = 0i32;
    let mut assigns = Vec::new();
    let mut annotation = None;
    let mut aug = None;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Delimiter(Delimiter::LParen | Delimiter::LBracket | Delimiter::LBrace) => depth += 1,
            Token::Delimiter(Delimiter::RParen | Delimiter::RBracket | Delimiter::RBrace) => depth -= 1,
            Token::Operator(Operator::Assign) if depth == 0 => assigns.push(i),
            Token::Operator(Operator::AugAssign(op)) if depth == 0 && aug.is_none() => aug = Some((i, *op)),
            Token::Operator(Operator::Colon) if depth == 0 && annotation.is_none() && assigns.is_empty() => {
                annotation = Some(i)
            }
            Token::Keyword(Keyword::Lambda) if depth == 0 => break,
            _ => {}
        }
    }

    if let Some((i, op)) = aug {
        return Some(assignment_sides(tokens, i, i, line_num).map(|(target, value)| {
            StmtKind::AugAssign {
                target,
                op: aug_to_binop(op),
                value,
            }
        }));
    }

    match (assigns.as_slice(), annotation) {
        ([], None) => None,
        ([], Some(_)) => Some(Err(LoopCompError::parse(line_num, "Bare annotation"))),
        ([eq], annotation) => Some(
            assignment_sides(tokens, annotation.unwrap_or(*eq), *eq, line_num)
                .map(|(target, value)| StmtKind::Assign { target, value }),
        ),
        _ => Some(Err(LoopCompError::parse(line_num, "Chained assignment"))),
    }
}

/// Target tokens end at `target_end`, value tokens start after `op_pos`
fn assignment_sides(tokens: &[Token], target_end: usize, op_pos: usize, line_num: usize) -> Result<(Expr, Expr)> {
    let target = parse_expr_tokens(&tokens[..target_end], line_num)?;
    let value = parse_expr_tokens(&tokens[op_pos + 1..], line_num)?;
    Ok((target, value))
}

fn aug_to_binop(op: crate::lexer::AugOp) -> BinOp {
    use crate::lexer::AugOp;
    match op {
        AugOp::Add => BinOp::Add,
        AugOp::Sub => BinOp::Sub,
        AugOp::Mul => BinOp::Mul,
        AugOp::Div => BinOp::Div,
        AugOp::FloorDiv => BinOp::FloorDiv,
        AugOp::Mod => BinOp::Mod,
        AugOp::Pow => BinOp::Pow,
        AugOp::MatMul => BinOp::MatMul,
        AugOp::BitAnd => BinOp::BitAnd,
        AugOp::BitOr => BinOp::BitOr,
        AugOp::BitXor => BinOp::BitXor,
        AugOp::Shl => BinOp::Shl,
        AugOp::Shr => BinOp::Shr,
    }
}

/// Parse a return statement
fn parse_return(line: &str, line_num: usize) -> StmtKind {
    let value_str = line["return".len()..].trim();

    if value_str.is_empty() {
        return StmtKind::Return(None);
    }
    match parse_expr(value_str, line_num) {
        Ok(expr) => StmtKind::Return(Some(expr)),
        Err(_) => StmtKind::Other(line.to_string()),
    }
}

#[cfg(test)]
mod tests;
