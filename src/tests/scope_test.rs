use crate::checker::Outcome;
use crate::error::Error;
use crate::tests::common::*;

#[test]
fn test_local_block_does_not_leak() {
    let mut s = session("def p(x); let a;");
    s.add("{ let b: p(b); p(b); }");
    assert_eq!(s.error("p(b);"), Error::UndeclaredVariable("b".to_string()));

    s.add("{ know p(a); }");
    expect_unknown(&mut s, "p(a)");
}

#[test]
fn test_local_block_outcome_ignores_unknowns() {
    let mut s = session("def p(x);");
    assert_eq!(s.outcome("{ let c; p(c); }"), Outcome::True);
}

#[test]
fn test_local_operator_is_gone_after_block() {
    let mut s = session("let a;");
    s.add("{ def local(x); know local(a); local(a); }");
    assert_eq!(
        s.error("local(a);"),
        Error::UndeclaredOperator("local".to_string())
    );
}

#[test]
fn test_redeclaring_a_variable() {
    let mut s = session("let a;");
    assert!(s.bad("let a;").contains("already declared"));
    assert_eq!(s.error("{ let a; }"), Error::AlreadyDeclared("a".to_string()));
}

#[test]
fn test_redeclaring_an_operator() {
    let mut s = session("def p(x);");
    assert_eq!(s.error("def p(y);"), Error::AlreadyDeclared("p".to_string()));
    assert_eq!(
        s.error("def q(x, x);"),
        Error::AlreadyDeclared("x".to_string())
    );
}

#[test]
fn test_bound_variable_shadows_outer_facts() {
    let mut s = session("def p(x); let a: p(a);");
    expect_true(&mut s, "p(a)");

    // Inside the proof, "a" is a new variable that p(a) says nothing about.
    assert_eq!(s.outcome("prove if a: => {p(a)} {}"), Outcome::Unknown);
}

#[test]
fn test_facts_from_the_parent_are_visible() {
    let mut s = session("def p(x); def q(x) => {p(x)}; let a: q(a);");
    assert_eq!(s.outcome("{ let b: q(b); p(a); p(b); }"), Outcome::True);
    s.add("{ { p(a); } }");
}

#[test]
fn test_pattern_variables() {
    let mut s = session(r#"def nat(x); lets n "^[0-9]+$": nat(n);"#);
    expect_true(&mut s, "nat(17)");
    expect_true(&mut s, "17 is nat");
    assert_eq!(s.error("let 42;"), Error::AlreadyDeclared("42".to_string()));

    s.add("let foo;");
    expect_unknown(&mut s, "nat(foo)");
    assert_eq!(
        s.error("nat(bar);"),
        Error::UndeclaredVariable("bar".to_string())
    );
}

#[test]
fn test_invalid_pattern() {
    let mut s = session("def nat(x);");
    assert_eq!(s.error(r#"lets n "([";"#).error_type(), "InvalidPattern");
}

#[test]
fn test_wildcard_facts_cover_everything() {
    let mut s = session("def p(x); know p(any); let a;");
    expect_true(&mut s, "p(a)");
}

#[test]
fn test_failed_let_declares_nothing() {
    let mut s = session("def p(x);");
    assert_eq!(
        s.error("let b: p(b), p(zzz);"),
        Error::UndeclaredVariable("zzz".to_string())
    );
    s.add("let b;");
    expect_unknown(&mut s, "p(b)");

    assert_eq!(
        s.error("let c: p(c), not if x: p(x) => {p(x)};").error_type(),
        "CannotStoreNegatedImplication"
    );
    s.add("let c;");
}

#[test]
fn test_failed_know_stores_nothing() {
    let mut s = session("def p(x); let a;");
    assert_eq!(
        s.error("know p(a), p(zzz);"),
        Error::UndeclaredVariable("zzz".to_string())
    );
    expect_unknown(&mut s, "p(a)");

    assert_eq!(
        s.error("know rule: if x: p(x) => {p(zzz)};"),
        Error::UndeclaredVariable("zzz".to_string())
    );
    s.add("know rule: if x: p(x) => {p(x)};");
}

#[test]
fn test_failed_lets_declares_nothing() {
    let mut s = session("def nat(x);");
    assert_eq!(
        s.error(r#"lets n "^[0-9]+$": nat(n), nat(zzz);"#),
        Error::UndeclaredVariable("zzz".to_string())
    );
    s.add(r#"lets n "^[0-9]+$": nat(n);"#);
    expect_true(&mut s, "nat(7)");
}

#[test]
fn test_failed_def_declares_nothing() {
    let mut s = session("def p(x);");
    assert_eq!(
        s.error("def bad(x) => {not if y: p(y) => {p(y)}};").error_type(),
        "CannotStoreNegatedImplication"
    );
    s.add("def bad(x);");
}
