//! convert module tests
//!
//! Extracted from mod.rs for better code organization.

use super::*;
use crate::parser::{parse, parse_expr, ForTarget};
use crate::unparser::unparse_expr;
use pretty_assertions::assert_eq;

fn first_loop(source: &str) -> ForLoop {
    let program = parse(source).unwrap();
    program
        .statements
        .into_iter()
        .find_map(|stmt| match stmt.kind {
            StmtKind::For(for_loop) => Some(for_loop),
            _ => None,
        })
        .expect("source has a for loop")
}

fn convert(source: &str) -> Result<Conversion, Declined> {
    convert_loop(&first_loop(source), &ConvertOptions::default())
}

fn converted(source: &str) -> String {
    unparse_expr(&convert(source).unwrap().expr)
}

fn expr(source: &str) -> Expr {
    parse_expr(source, 1).unwrap()
}

// --- Representative scenarios ---

#[test]
fn test_squares_yield_append_argument() {
    let conversion = convert("for i in range(1, 11):\n    squares.append(i ** 2)\n").unwrap();
    assert_eq!(conversion.accumulator, "squares");
    assert_eq!(conversion.kind, ComprehensionKind::List);
    let Expr::ListComp { elt, generators } = &conversion.expr else {
        panic!("expected list comprehension, got {:?}", conversion.expr);
    };
    assert_eq!(**elt, expr("i ** 2"));
    assert_eq!(generators.len(), 1);
    assert_eq!(generators[0].target, ForTarget::Name("i".to_string()));
    assert_eq!(generators[0].iter, expr("range(1, 11)"));
    assert!(generators[0].ifs.is_empty());
}

#[test]
fn test_even_numbers_single_filter() {
    let conversion = convert("for num in numbers:\n    if num % 2 == 0:\n        evens.append(num)\n").unwrap();
    let Expr::ListComp { elt, generators } = &conversion.expr else {
        panic!("expected list comprehension");
    };
    assert_eq!(**elt, Expr::ident("num"));
    assert_eq!(generators[0].ifs, vec![expr("num % 2 == 0")]);
    assert_eq!(unparse_expr(&conversion.expr), "[num for num in numbers if num % 2 == 0]");
}

#[test]
fn test_zip_pairs_yield_tuple() {
    assert_eq!(
        converted("for name, age in zip(names, ages):\n    people.append((name, age))\n"),
        "[(name, age) for name, age in zip(names, ages)]"
    );
}

#[test]
fn test_unique_chars_membership_filter() {
    assert_eq!(
        converted("for char in text:\n    if char not in unique_chars:\n        unique_chars.append(char)\n"),
        "[char for char in text if char not in unique_chars]"
    );
}

#[test]
fn test_two_accumulators_are_ambiguous() {
    let result = convert("for x in xs:\n    evens.append(x)\n    odds.append(x)\n");
    assert_eq!(
        result,
        Err(Declined::AmbiguousAccumulator(vec!["evens".to_string(), "odds".to_string()]))
    );
}

#[test]
fn test_dict_key_last_assignment_wins() {
    let conversion = convert("for x in items:\n    result['a'] = x\n    result['a'] = y\n").unwrap();
    assert_eq!(conversion.kind, ComprehensionKind::Dict);
    let Expr::DictComp { key, value, .. } = &conversion.expr else {
        panic!("expected dict comprehension");
    };
    assert_eq!(**key, Expr::StringLiteral("a".to_string()));
    assert_eq!(**value, Expr::ident("y"));
}

// --- Classification ---

#[test]
fn test_classification_is_idempotent() {
    let sources = [
        "for x in xs:\n    out.append(x)\n",
        "for x in xs:\n    d['k'] = x\n",
        "for x in xs:\n    print(x)\n",
    ];
    for source in sources {
        let for_loop = first_loop(source);
        assert_eq!(classify(&for_loop), classify(&for_loop));
    }
}

#[test]
fn test_dict_shape_takes_priority() {
    let for_loop = first_loop("for x in xs:\n    out.append(x)\n    d['k'] = x\n");
    assert_eq!(classify(&for_loop), Shape::Dict);
}

#[test]
fn test_candidacy_matches_locator() {
    let sources = [
        "for x in xs:\n    out.append(x)\n",
        "for x in xs:\n    if x:\n        out.append(x)\n",
        "for x in xs:\n    out.extend(x)\n",
        "for x in xs:\n    obj.items.append(x)\n",
        "for x in xs:\n    for y in x:\n        out.append(y)\n",
        "for x in xs:\n    total += x\n",
    ];
    for source in sources {
        let for_loop = first_loop(source);
        let located = !append_sites(&for_loop.body).is_empty() || !key_assignments(&for_loop.body).is_empty();
        assert_eq!(is_candidate(&for_loop), located, "{source}");
    }
}

#[test]
fn test_nested_loop_appends_do_not_count() {
    let result = convert("for row in grid:\n    for cell in row:\n        out.append(cell)\n");
    assert_eq!(result, Err(Declined::NotACandidate));
}

#[test]
fn test_non_loop_statement_is_malformed() {
    let program = parse("x = 1\n").unwrap();
    let result = convert_stmt(&program.statements[0], &ConvertOptions::default());
    assert_eq!(result, Err(Declined::MalformedInput("statement is not a for loop")));
}

// --- Locator ---

#[test]
fn test_append_shape_requires_plain_receiver() {
    assert!(is_append_call(&expr("out.append(x)")).is_some());
    assert!(is_append_call(&expr("self.out.append(x)")).is_none());
    assert!(is_append_call(&expr("rows[0].append(x)")).is_none());
    assert!(is_append_call(&expr("get().append(x)")).is_none());
    assert!(is_append_call(&expr("out.append(x, y)")).is_none());
    assert!(is_append_call(&expr("out.append(*xs)")).is_none());
    assert!(is_append_call(&expr("out.add(x)")).is_none());
}

#[test]
fn test_accumulator_names_ignore_conditionals() {
    let for_loop = first_loop("for x in xs:\n    a.append(x)\n    if x:\n        b.append(x)\n    a.append(x)\n");
    let names: Vec<&str> = accumulator_names(&for_loop.body).into_iter().collect();
    assert_eq!(names, vec!["a"]);
    assert_eq!(direct_appends(&for_loop.body).len(), 2);
    assert_eq!(conditionals_with_append(&for_loop.body).len(), 1);
}

#[test]
fn test_conditional_with_append_only_in_else_is_not_guarding() {
    let for_loop = first_loop("for x in xs:\n    if x:\n        pass\n    else:\n        out.append(x)\n");
    assert!(conditionals_with_append(&for_loop.body).is_empty());
    assert_eq!(append_sites(&for_loop.body).len(), 1);
}

#[test]
fn test_append_site_guards_follow_elif_chain() {
    let for_loop = first_loop("for x in xs:\n    if a:\n        pass\n    elif b:\n        out.append(x)\n");
    let sites = append_sites(&for_loop.body);
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].guards, vec![Expr::not(expr("a")), expr("b")]);
    assert_eq!(sites[0].conditional, Some((0, Branch::Elif(0))));
}

#[test]
fn test_key_assignments_require_literal_key() {
    let for_loop = first_loop("for x in xs:\n    d['a'] = x\n    d[x] = 1\n    d.a = 2\n");
    let found = key_assignments(&for_loop.body);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].accumulator, "d");
    assert_eq!(found[0].kind, MutationKind::KeyAssign { key: "a" });
}

// --- Element builder ---

#[test]
fn test_element_without_argument_uses_referenced_target() {
    let for_loop = first_loop("for x in xs:\n    print(x)\n");
    assert_eq!(build_element(&for_loop, None), Ok(Expr::ident("x")));
}

#[test]
fn test_element_without_argument_unreferenced_is_undetermined() {
    let for_loop = first_loop("for x in xs:\n    print(y)\n");
    assert!(matches!(build_element(&for_loop, None), Err(Declined::UndeterminedElement(_))));
}

#[test]
fn test_element_without_argument_tuple_target() {
    let both = first_loop("for k, v in pairs:\n    print(k, v)\n");
    assert_eq!(build_element(&both, None), Ok(expr("(k, v)")));

    let one = first_loop("for k, v in pairs:\n    print(v)\n");
    assert_eq!(build_element(&one, None), Ok(Expr::ident("v")));
}

#[test]
fn test_element_transformation_is_kept() {
    assert_eq!(
        converted("for item in items:\n    doubled.append(item * 2)\n"),
        "[item * 2 for item in items]"
    );
}

#[test]
fn test_referenced_names_cover_whole_body() {
    let for_loop = first_loop("for x in xs:\n    y = f(x)\n    if y:\n        out.append(z)\n");
    let names: Vec<String> = referenced_names(&for_loop.body).into_iter().collect();
    assert_eq!(names, vec!["y", "f", "x", "out", "z"]);
}

// --- Filters ---

#[test]
fn test_filter_conjunction_of_guarding_conditionals() {
    let source = "for x in xs:\n    if x > 0:\n        out.append(x)\n    if x < 10:\n        out.append(x)\n    if x % 2:\n        out.append(x)\n";
    let for_loop = first_loop(source);
    let filters = extract_filters(&for_loop.body, "out");
    assert_eq!(filters.clauses, vec![expr("x > 0"), expr("x < 10"), expr("x % 2")]);
    assert_eq!(filters.combined, Some(expr("x > 0 and x < 10 and x % 2")));
    assert_eq!(filters.negated, None);
    assert_eq!(
        converted(source),
        "[x for x in xs if x > 0 and x < 10 and x % 2]"
    );
}

#[test]
fn test_nested_guards_are_conjoined() {
    assert_eq!(
        converted("for x in xs:\n    if x:\n        if x > 2:\n            out.append(x)\n"),
        "[x for x in xs if x and x > 2]"
    );
}

#[test]
fn test_else_path_contributes_negated_test() {
    assert_eq!(
        converted("for x in xs:\n    if x in seen:\n        pass\n    else:\n        out.append(x)\n"),
        "[x for x in xs if not x in seen]"
    );
}

#[test]
fn test_no_conditionals_no_filters() {
    let for_loop = first_loop("for x in xs:\n    out.append(x)\n");
    assert_eq!(extract_filters(&for_loop.body, "out"), Filters::default());
}

#[test]
fn test_false_branch_produces_negated_filter() {
    let for_loop = first_loop("for x in xs:\n    if x > 0:\n        pos.append(x)\n    else:\n        neg.append(x)\n");
    let filters = extract_filters(&for_loop.body, "pos");
    assert_eq!(filters.combined, Some(expr("x > 0")));
    assert_eq!(filters.negated, Some(Expr::not(expr("x > 0"))));
}

// --- Two-branch shapes ---

#[test]
fn test_else_branch_complement() {
    let conversion =
        convert("for x in xs:\n    if x > 0:\n        pos.append(x)\n    else:\n        neg.append(-x)\n").unwrap();
    assert_eq!(conversion.accumulator, "pos");
    assert_eq!(unparse_expr(&conversion.expr), "[x for x in xs if x > 0]");
    let complement = conversion.complement.unwrap();
    assert_eq!(complement.accumulator, "neg");
    assert_eq!(unparse_expr(&complement.expr), "[-x for x in xs if not x > 0]");
}

#[test]
fn test_complement_disabled_keeps_primary_only() {
    let options = ConvertOptions {
        emit_complement: false,
        ..ConvertOptions::default()
    };
    let for_loop = first_loop("for x in xs:\n    if x > 0:\n        pos.append(x)\n    else:\n        neg.append(x)\n");
    let conversion = convert_loop(&for_loop, &options).unwrap();
    assert_eq!(unparse_expr(&conversion.expr), "[x for x in xs if x > 0]");
    assert_eq!(conversion.complement, None);
}

#[test]
fn test_third_accumulator_in_else_is_ambiguous() {
    let result = convert(
        "for x in xs:\n    if x > 0:\n        pos.append(x)\n    else:\n        neg.append(x)\n        zero.append(x)\n",
    );
    assert_eq!(
        result,
        Err(Declined::AmbiguousAccumulator(vec![
            "pos".to_string(),
            "neg".to_string(),
            "zero".to_string()
        ]))
    );
}

#[test]
fn test_same_accumulator_branches_fold() {
    assert_eq!(
        converted("for x in xs:\n    if x >= 0:\n        out.append(x)\n    else:\n        out.append(-x)\n"),
        "[x if x >= 0 else -x for x in xs]"
    );
}

#[test]
fn test_fold_disabled_is_undetermined() {
    let options = ConvertOptions {
        fold_branches: false,
        ..ConvertOptions::default()
    };
    let for_loop = first_loop("for x in xs:\n    if x >= 0:\n        out.append(x)\n    else:\n        out.append(-x)\n");
    assert!(matches!(
        convert_loop(&for_loop, &options),
        Err(Declined::UndeterminedElement(_))
    ));
}

#[test]
fn test_repeated_direct_append_is_undetermined() {
    let result = convert("for x in xs:\n    out.append(x)\n    out.append(x)\n");
    assert!(matches!(result, Err(Declined::UndeterminedElement(_))));
}

// --- Control flow ---

#[test]
fn test_early_exit_declines() {
    let cases = [
        ("for x in xs:\n    if x:\n        break\n    out.append(x)\n", "break"),
        ("for x in xs:\n    if not x:\n        continue\n    out.append(x)\n", "continue"),
        ("for x in xs:\n    out.append(x)\n    return out\n", "return"),
    ];
    for (source, exit) in cases {
        assert_eq!(convert(source), Err(Declined::ControlFlow(exit)), "{source}");
    }
}

#[test]
fn test_for_else_declines() {
    let result = convert("for x in xs:\n    out.append(x)\nelse:\n    done()\n");
    assert_eq!(result, Err(Declined::ControlFlow("for-else")));
}

#[test]
fn test_break_in_nested_loop_is_fine() {
    assert_eq!(
        converted("for x in xs:\n    out.append(x)\n    for y in x:\n        break\n"),
        "[x for x in xs]"
    );
}

// --- Dict emission ---

#[test]
fn test_dict_several_keys_spread_pairs() {
    assert_eq!(
        converted("for p in people:\n    result['name'] = p.name\n    result['age'] = p.age\n"),
        "{key: value for p in people for key, value in (('name', p.name), ('age', p.age))}"
    );
}

#[test]
fn test_dict_fresh_names_avoid_loop_identifiers() {
    assert_eq!(
        converted("for key, value in rows:\n    d['a'] = key\n    d['b'] = value\n"),
        "{key_1: value_1 for key, value in rows for key_1, value_1 in (('a', key), ('b', value))}"
    );
}

#[test]
fn test_dict_overwrite_keeps_first_position() {
    let mut pairs = KeyAssignments::new();
    pairs.insert("a", expr("1"));
    pairs.insert("b", expr("2"));
    pairs.insert("a", expr("3"));
    let entries: Vec<(&str, &Expr)> = pairs.iter().collect();
    assert_eq!(entries, vec![("a", &expr("3")), ("b", &expr("2"))]);
}

#[test]
fn test_two_dict_accumulators_are_ambiguous() {
    let result = convert("for x in xs:\n    a['k'] = x\n    b['k'] = x\n");
    assert_eq!(
        result,
        Err(Declined::AmbiguousAccumulator(vec!["a".to_string(), "b".to_string()]))
    );
}

#[test]
fn test_empty_dict_pairs_are_malformed() {
    let for_loop = first_loop("for x in xs:\n    d['k'] = x\n");
    let result = ComprehensionSpec::dict(&for_loop, KeyAssignments::new(), vec![]);
    assert!(matches!(result, Err(Declined::MalformedInput(_))));
}

#[test]
fn test_fresh_name_suffixes() {
    let taken: indexmap::IndexSet<String> = ["key", "key_1"].iter().map(|s| s.to_string()).collect();
    assert_eq!(fresh_name("key", &taken), "key_2");
    assert_eq!(fresh_name("value", &taken), "value");
}

#[test]
fn test_declined_codes_and_messages() {
    let err = Declined::AmbiguousAccumulator(vec!["a".to_string(), "b".to_string()]);
    assert_eq!(err.code(), "ambiguous-accumulator");
    assert_eq!(err.to_string(), "more than one accumulator is mutated: a, b");
    assert_eq!(Declined::ControlFlow("break").to_string(), "loop exits early through `break`");
}
