//! unparser module tests
//!
//! Extracted from mod.rs for better code organization.

use super::*;
use crate::parser::{parse, parse_expr};

/// Parse then print; the printed form should match Python's `ast.unparse`
fn roundtrip(source: &str) -> String {
    unparse_expr(&parse_expr(source, 1).unwrap())
}

#[test]
fn test_unparse_literals() {
    assert_eq!(unparse_expr(&Expr::IntLiteral(42)), "42");
    assert_eq!(unparse_expr(&Expr::FloatLiteral(2.5)), "2.5");
    assert_eq!(unparse_expr(&Expr::FloatLiteral(1.0)), "1.0");
    assert_eq!(unparse_expr(&Expr::BoolLiteral(true)), "True");
    assert_eq!(unparse_expr(&Expr::NoneLiteral), "None");
}

#[test]
fn test_unparse_string_quoting() {
    assert_eq!(roundtrip("\"Alice\""), "'Alice'");
    assert_eq!(roundtrip("\"it's\""), "\"it's\"");
    assert_eq!(roundtrip("'a' 'b'"), "'ab'");
}

#[test]
fn test_unparse_string_escapes() {
    assert_eq!(roundtrip(r#"'say "hi" it\'s'"#), r#"'say "hi" it\'s'"#);
    assert_eq!(roundtrip(r#"'a"' "b'""#), r#"'a"b\''"#);
    assert_eq!(roundtrip(r"'tab\there\\'"), r"'tab\there\\'");
    assert_eq!(roundtrip(r"'\x41' f'{x}'"), r"'\x41' f'{x}'");
}

#[test]
fn test_unparse_power_and_arithmetic() {
    assert_eq!(roundtrip("i**2"), "i ** 2");
    assert_eq!(roundtrip("(a + b) * c"), "(a + b) * c");
    assert_eq!(roundtrip("a + (b * c)"), "a + b * c");
    assert_eq!(roundtrip("a - (b - c)"), "a - (b - c)");
    assert_eq!(roundtrip("(a - b) - c"), "a - b - c");
}

#[test]
fn test_unparse_power_associativity() {
    assert_eq!(roundtrip("2 ** 3 ** 2"), "2 ** 3 ** 2");
    assert_eq!(roundtrip("(2 ** 3) ** 2"), "(2 ** 3) ** 2");
    assert_eq!(roundtrip("-x ** 2"), "-x ** 2");
    assert_eq!(roundtrip("(-x) ** 2"), "(-x) ** 2");
}

#[test]
fn test_unparse_boolean_operators() {
    assert_eq!(roundtrip("a and (b or c)"), "a and (b or c)");
    assert_eq!(roundtrip("(a and b) or c"), "a and b or c");
    assert_eq!(roundtrip("not (a and b)"), "not (a and b)");
    assert_eq!(roundtrip("not x > 1"), "not x > 1");
}

#[test]
fn test_unparse_compare_chain() {
    assert_eq!(roundtrip("0 < x <= 10"), "0 < x <= 10");
    assert_eq!(roundtrip("k not in seen"), "k not in seen");
    assert_eq!(roundtrip("x is not None"), "x is not None");
    assert_eq!(roundtrip("(a < b) == c"), "(a < b) == c");
}

#[test]
fn test_unparse_conditional_expression() {
    assert_eq!(roundtrip("x if x > 0 else -x"), "x if x > 0 else -x");
    assert_eq!(roundtrip("(a if b else c) + 1"), "(a if b else c) + 1");
    assert_eq!(roundtrip("a if b else (c if d else e)"), "a if b else c if d else e");
}

#[test]
fn test_unparse_list_comprehension() {
    assert_eq!(roundtrip("[i**2 for i in range(1, 11)]"), "[i ** 2 for i in range(1, 11)]");
    assert_eq!(
        roundtrip("[i for i in range(1, 11) if i % 2 == 0]"),
        "[i for i in range(1, 11) if i % 2 == 0]"
    );
}

#[test]
fn test_unparse_tuple_target_stays_bare() {
    assert_eq!(
        roundtrip("[(name, age) for (name, age) in zip(names, ages)]"),
        "[(name, age) for name, age in zip(names, ages)]"
    );
}

#[test]
fn test_unparse_dict_comprehension() {
    assert_eq!(
        roundtrip("{'name': name for name, age in pairs}"),
        "{'name': name for name, age in pairs}"
    );
}

#[test]
fn test_unparse_collections() {
    assert_eq!(roundtrip("(1,)"), "(1,)");
    assert_eq!(roundtrip("()"), "()");
    assert_eq!(roundtrip("[1, 2]"), "[1, 2]");
    assert_eq!(roundtrip("{}"), "{}");
    assert_eq!(roundtrip("{1, 2}"), "{1, 2}");
    assert_eq!(roundtrip("{'a': 1, 'b': 2}"), "{'a': 1, 'b': 2}");
}

#[test]
fn test_unparse_calls_and_subscripts() {
    assert_eq!(roundtrip("f(x, key=len)"), "f(x, key=len)");
    assert_eq!(roundtrip("f(*args, **kw)"), "f(*args, **kw)");
    assert_eq!(roundtrip("sum(x for x in xs)"), "sum(x for x in xs)");
    assert_eq!(roundtrip("d[a, b]"), "d[a, b]");
    assert_eq!(roundtrip("s[1:]"), "s[1:]");
    assert_eq!(roundtrip("s[::2]"), "s[::2]");
    assert_eq!(roundtrip("obj.items()"), "obj.items()");
}

#[test]
fn test_unparse_lambda() {
    assert_eq!(roundtrip("lambda x: x + 1"), "lambda x: x + 1");
    assert_eq!(roundtrip("(lambda: 0)()"), "(lambda: 0)()");
    assert_eq!(roundtrip("lambda x, n=(1+2): x*n"), "lambda x, n=1 + 2: x * n");
}

#[test]
fn test_unparse_statements() {
    let program = parse("for i in range(3):\n    if i:\n        out.append(i)\n    else:\n        pass\n").unwrap();
    assert_eq!(
        unparse_stmts(&program.statements),
        "for i in range(3):\n    if i:\n        out.append(i)\n    else:\n        pass\n"
    );
}

#[test]
fn test_unparse_assignment_tuple_is_bare() {
    let program = parse("a, b = b, a").unwrap();
    assert_eq!(unparse_stmts(&program.statements), "a, b = b, a\n");
}
