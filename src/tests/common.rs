use crate::checker::Outcome;
use crate::interpreter::Session;
use crate::kernel::proposition::Proposition;
use crate::report::Report;
use crate::syntax::statement::{Statement, StatementInfo};

/// A session in which every statement of the text has been run, and held.
pub fn session(text: &str) -> Session {
    let mut session = Session::test();
    session.add(text);
    session
}

/// Parses a single proposition.
pub fn prop(text: &str) -> Proposition {
    let statement = match Statement::parse_str(&format!("{};", text)) {
        Ok(statement) => statement,
        Err(e) => panic!("parse error in {}: {}", text, e),
    };
    match statement.statement {
        StatementInfo::Check(mut facts) if facts.len() == 1 => facts.remove(0),
        _ => panic!("expected a single proposition: {}", text),
    }
}

/// Checks a proposition without remembering it, along with the trace.
pub fn check_with_report(session: &mut Session, text: &str) -> (Outcome, Report) {
    let goal = prop(text);
    let mut report = Report::new();
    match session
        .interpreter
        .checker
        .check(&mut session.env, &goal, &mut report)
    {
        Ok(outcome) => (outcome, report),
        Err(e) => panic!("error checking {}: {}\n{}", text, e, report),
    }
}

/// Checks a proposition without remembering it.
pub fn check(session: &mut Session, text: &str) -> Outcome {
    check_with_report(session, text).0
}

pub fn expect_true(session: &mut Session, text: &str) {
    assert_eq!(check(session, text), Outcome::True, "{}", text);
}

pub fn expect_false(session: &mut Session, text: &str) {
    assert_eq!(check(session, text), Outcome::False, "{}", text);
}

pub fn expect_unknown(session: &mut Session, text: &str) {
    assert_eq!(check(session, text), Outcome::Unknown, "{}", text);
}
