use indoc::indoc;

use crate::kernel::proposition::Proposition;
use crate::syntax::statement::{Statement, StatementInfo};
use crate::tests::common::prop;

// Parses a statement and checks that it displays the same way it was written.
fn roundtrip(text: &str) {
    let statement = match Statement::parse_str(text) {
        Ok(statement) => statement,
        Err(e) => panic!("parse error in {}: {}", text, e),
    };
    assert_eq!(statement.to_string(), text);
}

#[test]
fn test_statements_display_as_written() {
    roundtrip("def p(x, y);");
    roundtrip("def big(x) => {positive(x)} when number(x);");
    roundtrip("def q(x) <=> {p(x)};");
    roundtrip("def_composite \\pair{x, y}: ok(x), ok(y);");
    roundtrip("lets n \"^[0-9]+$\": nat(n);");
    roundtrip("let a, b: p(a), not q(b);");
    roundtrip("know rule: if x: p(x) => {q(x)};");
    roundtrip("lt(a, c)[a, b, c];");
    roundtrip("lt(a, c)[a; b];");
    roundtrip("p(a) or q(a);");
    roundtrip("not (p(a) or q(a));");
    roundtrip("if => {p(a)};");
    roundtrip("prove chain: if x: p(x) => {r(x)} { q(x); }");
    roundtrip("prove_by_contradiction not human(god) { } contradiction mortal(god);");
    roundtrip("by chain(a, \\pair{a, b});");
    roundtrip("{ let b; p(b); }");
}

#[test]
fn test_is_sugar() {
    assert_eq!(prop("Socrates is mortal").to_string(), "mortal(Socrates)");
    assert_eq!(prop("god is not mortal").to_string(), "not mortal(god)");
    assert_eq!(prop("\\pair{a, b} is ok").to_string(), "ok(\\pair{a, b})");
}

#[test]
fn test_double_negation_cancels() {
    assert_eq!(prop("not not p(a)"), prop("p(a)"));
}

#[test]
fn test_iff_expands_to_both_directions() {
    let statement = Statement::parse_str("know iff x: p(x) => {q(x)};").unwrap();
    let StatementInfo::Know(know) = statement.statement else {
        panic!("expected a know statement");
    };
    let facts: Vec<String> = know.facts.iter().map(|f| f.to_string()).collect();
    assert_eq!(facts, vec!["if x: p(x) => {q(x)}", "if x: q(x) => {p(x)}"]);
}

#[test]
fn test_implication_without_variables() {
    match prop("if p(a) => {q(a)}") {
        Proposition::Implication(imp) => {
            assert!(imp.vars.is_empty());
            assert_eq!(imp.premises.len(), 1);
            assert_eq!(imp.conclusions.len(), 1);
        }
        _ => panic!("expected an implication"),
    }
}

#[test]
fn test_statement_lines() {
    let text = indoc! {"
        def p(x);
        // a comment
        let a: // trailing
            p(a);

        prove p(a) {
            p(a);
        }
    "};
    let statements = Statement::parse_all(text).unwrap();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[1].first_line, 3);
    assert_eq!(statements[1].last_line, 4);
    assert_eq!(statements[2].first_line, 6);
    assert_eq!(statements[2].last_line, 8);
}

#[test]
fn test_parse_errors() {
    match Statement::parse_all("def p(x);\nlet a\n") {
        Err(e) => assert_eq!(e.line, 2),
        Ok(_) => panic!("expected a parse error"),
    }

    assert!(Statement::parse_all("p(a); }").is_err());
    assert!(Statement::parse_all("lets n \"open").is_err());
    assert!(Statement::parse_all("prove p(a) { p(a);").is_err());
    assert!(Statement::parse_all("prove_by_contradiction p(a) {} p(a);").is_err());
    assert!(Statement::parse_str("p(a); q(a);").is_err());
    assert!(Statement::parse_str("p(a), iff x: p(x) => {q(x)}, q(a)").is_err());
}
