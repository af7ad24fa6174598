//! parser module tests
//!
//! Extracted from mod.rs for better code organization.

use super::*;

fn single(source: &str) -> StmtKind {
    let mut program = parse(source).unwrap();
    assert_eq!(program.statements.len(), 1, "{source}");
    program.statements.remove(0).kind
}

fn expr(source: &str) -> Expr {
    parse_expr(source, 1).unwrap()
}

#[test]
fn test_parse_simple_assignment() {
    let StmtKind::Assign { target, value } = single("x = 10") else {
        panic!("expected assignment");
    };
    assert_eq!(target, Expr::ident("x"));
    assert_eq!(value, Expr::IntLiteral(10));
}

#[test]
fn test_parse_annotated_assignment() {
    let StmtKind::Assign { target, value } = single("names: list[str] = []") else {
        panic!("expected assignment");
    };
    assert_eq!(target, Expr::ident("names"));
    assert_eq!(value, Expr::List(vec![]));
}

#[test]
fn test_parse_subscript_assignment() {
    let StmtKind::Assign { target, value } = single("result['age'] = p.age") else {
        panic!("expected assignment");
    };
    assert_eq!(
        target,
        Expr::Index {
            target: Box::new(Expr::ident("result")),
            index: Box::new(Expr::StringLiteral("age".to_string())),
        }
    );
    assert_eq!(
        value,
        Expr::Attribute {
            value: Box::new(Expr::ident("p")),
            attr: "age".to_string(),
        }
    );
}

#[test]
fn test_parse_aug_assign() {
    let StmtKind::AugAssign { target, op, value } = single("total += x * 2") else {
        panic!("expected augmented assignment");
    };
    assert_eq!(target, Expr::ident("total"));
    assert_eq!(op, BinOp::Add);
    assert_eq!(value, expr("x * 2"));
}

#[test]
fn test_parse_tuple_assignment() {
    let StmtKind::Assign { target, .. } = single("a, b = b, a") else {
        panic!("expected assignment");
    };
    assert_eq!(target, Expr::Tuple(vec![Expr::ident("a"), Expr::ident("b")]));
}

#[test]
fn test_parse_chained_assignment_is_opaque() {
    assert_eq!(single("a = b = 0"), StmtKind::Other("a = b = 0".to_string()));
}

#[test]
fn test_parse_append_statement() {
    let StmtKind::Expr(Expr::Call { func, args, kwargs }) = single("squares.append(i ** 2)") else {
        panic!("expected call statement");
    };
    assert_eq!(
        *func,
        Expr::Attribute {
            value: Box::new(Expr::ident("squares")),
            attr: "append".to_string(),
        }
    );
    assert_eq!(args, vec![expr("i ** 2")]);
    assert!(kwargs.is_empty());
}

#[test]
fn test_parse_for_loop() {
    let source = "for i in range(1, 11):\n    squares.append(i ** 2)\n";
    let program = parse(source).unwrap();
    let stmt = &program.statements[0];
    assert_eq!(
        stmt.span,
        Span {
            line: 1,
            end_line: 2,
            indent: 0
        }
    );
    let StmtKind::For(for_loop) = &stmt.kind else {
        panic!("expected for loop");
    };
    assert_eq!(for_loop.target, ForTarget::Name("i".to_string()));
    assert_eq!(for_loop.iter, expr("range(1, 11)"));
    assert_eq!(for_loop.body.len(), 1);
    assert!(for_loop.orelse.is_none());
}

#[test]
fn test_parse_for_tuple_target() {
    let StmtKind::For(for_loop) = single("for name, age in zip(names, ages):\n    pass\n") else {
        panic!("expected for loop");
    };
    assert_eq!(for_loop.target.names(), vec!["name", "age"]);

    let StmtKind::For(nested) = single("for i, (k, v) in enumerate(d.items()):\n    pass\n") else {
        panic!("expected for loop");
    };
    assert_eq!(nested.target.names(), vec!["i", "k", "v"]);
}

#[test]
fn test_parse_for_else() {
    let StmtKind::For(for_loop) = single("for x in xs:\n    pass\nelse:\n    done()\n") else {
        panic!("expected for loop");
    };
    assert_eq!(for_loop.orelse.map(|b| b.len()), Some(1));
}

#[test]
fn test_parse_for_inline_body() {
    let StmtKind::For(for_loop) = single("for x in xs: out.append(x)") else {
        panic!("expected for loop");
    };
    assert_eq!(for_loop.body.len(), 1);
    assert_eq!(for_loop.body[0].span.line, 1);
}

#[test]
fn test_parse_if_elif_else() {
    let source = r#"
if x > 0:
    kind = "pos"
elif x < 0:
    kind = "neg"
else:
    kind = "zero"
"#;
    let program = parse(source).unwrap();
    assert_eq!(program.statements.len(), 1);
    assert_eq!(program.statements[0].span.line, 2);
    assert_eq!(program.statements[0].span.end_line, 7);
    let StmtKind::If(if_stmt) = &program.statements[0].kind else {
        panic!("expected if statement");
    };
    assert_eq!(if_stmt.test, expr("x > 0"));
    assert_eq!(if_stmt.elif_clauses.len(), 1);
    assert_eq!(if_stmt.elif_clauses[0].0, expr("x < 0"));
    assert!(if_stmt.has_false_branch());
}

#[test]
fn test_parse_nested_blocks() {
    let source = r#"
def evens(numbers):
    out = []
    for num in numbers:
        if num % 2 == 0:
            out.append(num)
    return out
"#;
    let program = parse(source).unwrap();
    let StmtKind::FuncDef { name, body, .. } = &program.statements[0].kind else {
        panic!("expected function");
    };
    assert_eq!(name, "evens");
    assert_eq!(body.len(), 3);
    assert_eq!(body[1].span.indent, 4);
    assert_eq!(body[1].span.end_line, 6);
    assert!(matches!(body[2].kind, StmtKind::Return(Some(_))));
}

#[test]
fn test_parse_compound_statements_kept() {
    let source = "class A:\n    x = 1\nwith open(p) as f:\n    data = f.read()\n";
    let program = parse(source).unwrap();
    assert_eq!(program.statements.len(), 2);
    let StmtKind::Compound { header, body } = &program.statements[1].kind else {
        panic!("expected compound statement");
    };
    assert_eq!(header, "with open(p) as f");
    assert_eq!(body.len(), 1);
}

#[test]
fn test_parse_opaque_lines() {
    let program = parse("import os\nfrom a import b\nraise ValueError('x')\n").unwrap();
    assert!(program
        .statements
        .iter()
        .all(|s| matches!(s.kind, StmtKind::Other(_))));
}

#[test]
fn test_parse_control_statements() {
    let program = parse("while True:\n    break\nfor x in y:\n    continue\n").unwrap();
    let StmtKind::While { body, .. } = &program.statements[0].kind else {
        panic!("expected while");
    };
    assert_eq!(body[0].kind, StmtKind::Break);
    let StmtKind::For(for_loop) = &program.statements[1].kind else {
        panic!("expected for");
    };
    assert_eq!(for_loop.body[0].kind, StmtKind::Continue);
}

#[test]
fn test_parse_semicolons() {
    let program = parse("a = 1; b = 2").unwrap();
    assert_eq!(program.statements.len(), 2);
    assert_eq!(program.statements[0].span, program.statements[1].span);
}

#[test]
fn test_parse_multiline_call() {
    let source = "people.append(\n    (name,\n     age)\n)\nx = 1\n";
    let program = parse(source).unwrap();
    assert_eq!(program.statements.len(), 2);
    assert_eq!(program.statements[0].span.end_line, 4);
    assert_eq!(program.statements[1].span.line, 5);
}

#[test]
fn test_parse_unparseable_header_degrades() {
    let StmtKind::Compound { header, body } = single("if (n := 10):\n    pass\n") else {
        panic!("expected compound statement");
    };
    assert_eq!(header, "if (n := 10)");
    assert_eq!(body.len(), 1);
}

#[test]
fn test_parse_unexpected_indent() {
    let err = parse("x = 1\n    y = 2\n").unwrap_err();
    assert!(matches!(err, LoopCompError::ParseError { line: 2, .. }));
}

#[test]
fn test_parse_missing_block() {
    let err = parse("for x in xs:\ny = 1\n").unwrap_err();
    assert!(matches!(err, LoopCompError::ParseError { line: 1, .. }));
}

// --- Expressions ---

#[test]
fn test_expr_precedence() {
    assert_eq!(
        expr("a + b * c"),
        Expr::BinOp {
            left: Box::new(Expr::ident("a")),
            op: BinOp::Add,
            right: Box::new(Expr::BinOp {
                left: Box::new(Expr::ident("b")),
                op: BinOp::Mul,
                right: Box::new(Expr::ident("c")),
            }),
        }
    );
}

#[test]
fn test_expr_power_binds_tighter_than_unary() {
    assert_eq!(
        expr("-x**2"),
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::BinOp {
                left: Box::new(Expr::ident("x")),
                op: BinOp::Pow,
                right: Box::new(Expr::IntLiteral(2)),
            }),
        }
    );
}

#[test]
fn test_expr_not_in() {
    assert_eq!(
        expr("char not in unique_chars"),
        Expr::Compare {
            left: Box::new(Expr::ident("char")),
            ops: vec![(CmpOp::NotIn, Expr::ident("unique_chars"))],
        }
    );
}

#[test]
fn test_expr_numbers() {
    assert_eq!(expr("42"), Expr::IntLiteral(42));
    assert_eq!(expr("2.5"), Expr::FloatLiteral(2.5));
    assert_eq!(expr("1e3"), Expr::FloatLiteral(1000.0));
    assert_eq!(expr("0xff"), Expr::Verbatim("0xff".to_string()));
}

#[test]
fn test_expr_strings() {
    assert_eq!(expr("'a'"), Expr::StringLiteral("a".to_string()));
    assert_eq!(expr("f'{x}'"), Expr::Verbatim("f'{x}'".to_string()));
}

#[test]
fn test_expr_adjacent_strings() {
    assert_eq!(expr(r"'it\'s' ' ok'"), Expr::StringLiteral("it's ok".to_string()));
    assert_eq!(expr(r#"'a'  f"{b}""#), Expr::Verbatim(r#"'a' f"{b}""#.to_string()));
}

#[test]
fn test_expr_lambda_defaults() {
    let Expr::Lambda { params, .. } = expr("lambda x, *rest, n=2: x") else {
        panic!("expected lambda");
    };
    assert_eq!(
        params,
        vec![
            ("x".to_string(), None),
            ("*rest".to_string(), None),
            ("n".to_string(), Some(Expr::IntLiteral(2))),
        ]
    );
}

#[test]
fn test_expr_comprehension_clauses() {
    let Expr::ListComp { generators, .. } = expr("[x for row in grid for x in row if x if x > 1]") else {
        panic!("expected list comprehension");
    };
    assert_eq!(generators.len(), 2);
    assert_eq!(generators[1].ifs.len(), 2);
}

#[test]
fn test_expr_conditional() {
    let Expr::IfExp { test, .. } = expr("a if b else c") else {
        panic!("expected conditional expression");
    };
    assert_eq!(*test, Expr::ident("b"));
}

#[test]
fn test_expr_dict_and_set() {
    assert_eq!(
        expr("{'a': 1}"),
        Expr::Dict(vec![(Expr::StringLiteral("a".to_string()), Expr::IntLiteral(1))])
    );
    assert_eq!(expr("{1}"), Expr::Set(vec![Expr::IntLiteral(1)]));
}

#[test]
fn test_expr_trailing_garbage_is_error() {
    assert!(parse_expr("a b", 1).is_err());
}
