use crate::checker::Outcome;
use crate::config::CheckerConfig;
use crate::error::Error;
use crate::interpreter::Session;
use crate::kernel::proposition::Proposition;
use crate::report::Report;
use crate::tests::common::*;

const SOCRATES: &str = "
    def human(x);
    def mortal(x);
    know if x: human(x) => {mortal(x)};
    let Socrates: human(Socrates);
";

#[test]
fn test_syllogism() {
    let mut s = session(SOCRATES);
    expect_true(&mut s, "mortal(Socrates)");
    expect_true(&mut s, "Socrates is mortal");
    s.add("let Plato;");
    expect_unknown(&mut s, "mortal(Plato)");
}

#[test]
fn test_check_reports_the_fact_used() {
    let mut s = session(SOCRATES);
    let (outcome, report) = check_with_report(&mut s, "mortal(Socrates)");
    assert_eq!(outcome, Outcome::True);
    assert!(report.contains("mortal(Socrates) checked by mortal(x) <= [x: human(x)]"));
    assert_eq!(
        report.lines().last().map(|line| line.as_str()),
        Some("mortal(Socrates): True")
    );
}

#[test]
fn test_checking_remembers() {
    let mut s = session(SOCRATES);
    s.add("mortal(Socrates);");
    let goal = match prop("mortal(Socrates)") {
        Proposition::Atomic(atomic) => atomic,
        _ => panic!("expected an atomic proposition"),
    };
    let mut report = Report::new();
    let outcome = s
        .interpreter
        .checker
        .check_atomic_literally(&mut s.env, &goal, &mut report)
        .unwrap();
    assert_eq!(outcome, Outcome::True);
}

#[test]
fn test_checking_twice_changes_nothing() {
    let mut s = session(SOCRATES);
    let before = s.env.fact_count();
    for _ in 0..3 {
        expect_true(&mut s, "mortal(Socrates)");
        expect_true(&mut s, "if y: human(y) => {mortal(y)}");
        expect_false(&mut s, "not mortal(Socrates)");
        assert_eq!(s.env.fact_count(), before);
    }
}

#[test]
fn test_polarity_fallback() {
    let text = format!("{} let god: not mortal(god);", SOCRATES);
    let mut s = session(&text);
    expect_false(&mut s, "mortal(god)");
    expect_true(&mut s, "not mortal(god)");
    expect_false(&mut s, "god is mortal");
    expect_unknown(&mut s, "human(god)");

    let mut strict = Session::new(CheckerConfig {
        polarity_fallback: false,
        ..Default::default()
    });
    strict.add(&text);
    expect_unknown(&mut strict, "mortal(god)");
}

#[test]
fn test_undeclared_things_are_errors() {
    let mut s = session(SOCRATES);
    assert_eq!(
        s.error("immortal(Socrates);"),
        Error::UndeclaredOperator("immortal".to_string())
    );
    assert_eq!(
        s.error("mortal(Zeus);"),
        Error::UndeclaredVariable("Zeus".to_string())
    );
}

#[test]
fn test_arity_mismatch() {
    let mut s = session("def p(x, y); let a;");
    assert_eq!(
        s.error("p(a);"),
        Error::ArityMismatch("p".to_string(), 2, 1)
    );
    assert_eq!(
        s.error("know p(a, a, a);"),
        Error::ArityMismatch("p".to_string(), 2, 3)
    );
}

#[test]
fn test_guards() {
    let mut s = session(
        "
        def number(x);
        def positive(x);
        def big(x) => {positive(x)} when number(x);
        let a: big(a);
        let b: big(b), number(b);
        ",
    );
    expect_unknown(&mut s, "positive(a)");
    expect_true(&mut s, "positive(b)");
}

#[test]
fn test_iff_goes_both_ways() {
    let mut s = session("def p(x); def q(x) <=> {p(x)};");
    s.add("let a: p(a);");
    expect_true(&mut s, "q(a)");
    s.add("let b: q(b);");
    expect_true(&mut s, "p(b)");
}

#[test]
fn test_cycles_are_unknown() {
    let mut s = session("def p(x); def q(x) <=> {p(x)}; let c;");
    expect_unknown(&mut s, "p(c)");
    expect_unknown(&mut s, "q(c)");
}

#[test]
fn test_iff_in_a_fact_list() {
    let mut s = session("def p(x); def q(x); know iff x: p(x) => {q(x)}; let a: q(a);");
    expect_true(&mut s, "p(a)");
}

#[test]
fn test_hints_pick_the_middle() {
    let mut s = session(
        "
        def lt(x, y);
        know if a, b, c: lt(a, b), lt(b, c) => {lt(a, c)};
        let n1, n2, n3: lt(n1, n2), lt(n2, n3);
        ",
    );
    expect_true(&mut s, "lt(n1, n3)[n1, n2, n3]");
    expect_unknown(&mut s, "lt(n1, n3)");

    // Hints that don't fit the fact's layer just skip it.
    expect_unknown(&mut s, "lt(n1, n3)[n1, n2]");
}

#[test]
fn test_recursion_limit() {
    let text = "
        def p1(x);
        def p2(x) => {p1(x)};
        def p3(x) => {p2(x)};
        def p4(x) => {p3(x)};
        let a: p4(a);
    ";
    let mut shallow = Session::new(CheckerConfig {
        max_depth: 5,
        ..Default::default()
    });
    shallow.add(text);
    assert_eq!(shallow.error("p1(a);"), Error::RecursionLimitExceeded(5));

    let mut deep = Session::new(CheckerConfig {
        max_depth: 6,
        ..Default::default()
    });
    deep.add(text);
    expect_true(&mut deep, "p1(a)");
}

#[test]
fn test_double_bound_free_variable() {
    let mut s = session(
        "
        def p(x);
        def q(x);
        def r(x);
        know if x: p(x) => {if x: q(x) => {r(x)}};
        let a: p(a), q(a);
        ",
    );
    assert_eq!(
        s.error("r(a);"),
        Error::DoubleBoundFreeVariable("x".to_string())
    );
}

#[test]
fn test_nested_implications() {
    let mut s = session(
        "
        def p(x);
        def q(y);
        def r(x, y);
        know if x: p(x) => {if y: q(y) => {r(x, y)}};
        let a, b: p(a), q(b);
        ",
    );
    expect_true(&mut s, "r(a, b)");
    expect_unknown(&mut s, "r(b, a)");
}

#[test]
fn test_negated_implications() {
    let mut s = session(SOCRATES);
    assert_eq!(
        s.error("not if x: human(x) => {mortal(x)};").error_type(),
        "CannotCheckNegatedImplication"
    );
    assert_eq!(
        s.error("know not if x: human(x) => {mortal(x)};")
            .error_type(),
        "CannotStoreNegatedImplication"
    );
    assert_eq!(
        s.error("know mortal(Socrates) or if x: human(x) => {mortal(x)};")
            .error_type(),
        "CannotStoreNegatedImplication"
    );
}

#[test]
fn test_checking_implications() {
    let mut s = session(SOCRATES);
    expect_true(&mut s, "if y: human(y) => {mortal(y)}");
    expect_unknown(&mut s, "if y: mortal(y) => {human(y)}");

    // A conclusion that is false makes the implication Unknown, not False.
    s.add("let god: not mortal(god);");
    expect_unknown(&mut s, "if => {mortal(god)}");
}

#[test]
fn test_disjunction_elimination() {
    let mut s = session("def p(x); def q(x); let a: p(a) or q(a), not p(a);");
    expect_true(&mut s, "q(a)");
    expect_true(&mut s, "p(a) or q(a)");
    expect_true(&mut s, "q(a) or p(a)");
}

#[test]
fn test_disjunction_by_cases() {
    let mut s = session("def p(x); def q(x); let a: not p(a);");
    expect_unknown(&mut s, "p(a) or q(a)");
    s.add("know if x: not p(x) => {q(x)};");
    expect_true(&mut s, "p(a) or q(a)");
}

#[test]
fn test_negated_disjunction() {
    let mut s = session("def p(x); def q(x); let b: not p(b), not q(b);");
    expect_true(&mut s, "not (p(b) or q(b))");

    s.add("let c; know not (p(c) or q(c));");
    expect_false(&mut s, "p(c)");
    expect_false(&mut s, "q(c)");
}

#[test]
fn test_composites_match_structurally() {
    let mut s = session("def eq(x, y); let a, b; know eq(\\pair{a, b}, a);");
    expect_true(&mut s, "eq(\\pair{a, b}, a)");
    expect_unknown(&mut s, "eq(\\pair{b, a}, a)");
    expect_unknown(&mut s, "eq(\\other{a, b}, a)");
}

#[test]
fn test_composite_templates() {
    let mut s = session(
        "
        def ok(x);
        def holds(x);
        def_composite \\pair{x, y}: ok(x), ok(y);
        let a, c: ok(a), ok(c);
        let b;
        know holds(\\pair{a, c}), holds(\\pair{a, b});
        ",
    );
    expect_true(&mut s, "holds(\\pair{a, c})");
    expect_unknown(&mut s, "holds(\\pair{a, b})");
    assert_eq!(
        s.error("holds(\\pair{a});"),
        Error::ArityMismatch("\\pair".to_string(), 2, 1)
    );
    assert_eq!(
        s.error("def_composite \\pair{x};"),
        Error::AlreadyDeclared("pair".to_string())
    );
}

#[test]
fn test_composite_free_variables() {
    let mut s = session(
        "
        def ok(x);
        def first(x, y);
        know if x, y: ok(x) => {first(\\pair{x, y}, x)};
        let a, b: ok(a);
        ",
    );
    expect_true(&mut s, "first(\\pair{a, b}, a)");
    expect_unknown(&mut s, "first(\\pair{b, a}, b)");
    expect_unknown(&mut s, "first(\\pair{a, b}, b)");
}
