use tracing::debug;

use crate::checker::{Checker, Outcome};
use crate::config::CheckerConfig;
use crate::error::{Error, Result};
use crate::kernel::environment::Environment;
use crate::kernel::proposition::Proposition;
use crate::memory;
use crate::report::Report;
use crate::syntax::statement::{KnowStatement, Statement, StatementInfo};

pub mod proof;

/// Executes statements against an environment that the caller owns.
///
/// Keeping the environment outside means a proof can run its block against a child scope
/// while the interpreter itself stays mutably borrowed.
pub struct Interpreter {
    pub checker: Checker,
}

impl Interpreter {
    pub fn new(config: CheckerConfig) -> Interpreter {
        Interpreter {
            checker: Checker::new(config),
        }
    }

    pub fn execute(
        &mut self,
        env: &mut Environment,
        statement: &Statement,
        report: &mut Report,
    ) -> Result<Outcome> {
        debug!(line = statement.first_line, depth = env.depth(), "executing statement");
        match &statement.statement {
            StatementInfo::DefOperator(decl) => {
                memory::declare_operator(env, decl.clone(), report)?;
                Ok(Outcome::True)
            }

            StatementInfo::DefComposite(decl) => {
                memory::declare_composite(env, decl.clone(), report)?;
                Ok(Outcome::True)
            }

            StatementInfo::Lets(ls) => {
                memory::declare_lets(env, &ls.name, &ls.pattern, ls.facts.clone(), report)?;
                Ok(Outcome::True)
            }

            StatementInfo::Let(ls) => {
                memory::declare_vars(env, &ls.vars, &ls.facts, report)?;
                Ok(Outcome::True)
            }

            StatementInfo::Know(ks) => self.know(env, ks, report),

            StatementInfo::Check(facts) => self.check_and_remember(env, facts, report),

            StatementInfo::Prove(ps) => {
                let named = match (&ps.name, &ps.goal) {
                    (Some(name), Proposition::Implication(imp)) => Some((name, imp)),
                    (Some(name), _) => {
                        return Err(Error::evaluation(format!(
                            "'{}' names a proof, but only implications can be named",
                            name
                        )))
                    }
                    (None, _) => None,
                };
                let outcome = self.prove(env, &ps.goal, &ps.body, report)?;
                if let (Outcome::True, Some((name, imp))) = (outcome, named) {
                    env.name_lemma(name, imp.clone())?;
                    report.note(format!("named {}", name));
                }
                Ok(outcome)
            }

            StatementInfo::ProveByContradiction(cs) => {
                self.prove_by_contradiction(env, &cs.goal, &cs.body, &cs.witness, report)
            }

            StatementInfo::By(bs) => self.by(env, &bs.lemma, &bs.args, report),

            StatementInfo::LocalBlock(body) => {
                // Nothing done inside the block survives it, and only errors stop it.
                let mut child = env.enter();
                for statement in body {
                    self.execute(&mut child, statement, report)?;
                }
                Ok(Outcome::True)
            }
        }
    }

    fn know(
        &mut self,
        env: &mut Environment,
        statement: &KnowStatement,
        report: &mut Report,
    ) -> Result<Outcome> {
        if let Some(name) = &statement.name {
            let imp = match statement.facts.as_slice() {
                [Proposition::Implication(imp)] => imp,
                _ => {
                    return Err(Error::evaluation(format!(
                        "'{}' must name exactly one implication",
                        name
                    )))
                }
            };
            memory::check_storable(env, &statement.facts[0], &[])?;
            env.name_lemma(name, imp.clone())?;
            memory::know(env, &statement.facts[0], report)?;
            report.note(format!("named {}", name));
            return Ok(Outcome::True);
        }
        memory::know_all(env, &statement.facts, report)?;
        Ok(Outcome::True)
    }

    /// Checks each proposition in turn. The ones that hold become known, so later
    /// propositions in the same statement can use them.
    fn check_and_remember(
        &mut self,
        env: &mut Environment,
        facts: &[Proposition],
        report: &mut Report,
    ) -> Result<Outcome> {
        for fact in facts {
            let outcome = self.checker.check(env, fact, report)?;
            if outcome != Outcome::True {
                return Ok(outcome);
            }
            let here = env.current();
            memory::assume(env, here, fact)?;
        }
        Ok(Outcome::True)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new(CheckerConfig::default())
    }
}

/// An environment together with the interpreter that runs statements against it.
pub struct Session {
    pub env: Environment,
    pub interpreter: Interpreter,
}

impl Session {
    pub fn new(config: CheckerConfig) -> Session {
        Session {
            env: Environment::new(),
            interpreter: Interpreter::new(config),
        }
    }

    pub fn execute(&mut self, statement: &Statement, report: &mut Report) -> Result<Outcome> {
        self.interpreter.execute(&mut self.env, statement, report)
    }

    pub fn test() -> Session {
        Session::new(CheckerConfig::default())
    }

    /// Runs some statements, each of which must hold.
    /// Panics on failure.
    pub fn add(&mut self, input: &str) {
        let statements = match Statement::parse_all(input) {
            Ok(statements) => statements,
            Err(e) => panic!("parse error in {}: {}", input, e),
        };
        for statement in &statements {
            let mut report = Report::new();
            match self.execute(statement, &mut report) {
                Ok(Outcome::True) => {}
                Ok(outcome) => panic!("{} was {}:\n{}", statement, outcome, report),
                Err(e) => panic!("error in {}: {}\n{}", statement, e, report),
            }
        }
    }

    /// Runs a single statement and returns its outcome.
    /// Panics on errors.
    pub fn outcome(&mut self, input: &str) -> Outcome {
        let statement = match Statement::parse_str(input) {
            Ok(statement) => statement,
            Err(e) => panic!("parse error in {}: {}", input, e),
        };
        let mut report = Report::new();
        match self.execute(&statement, &mut report) {
            Ok(outcome) => outcome,
            Err(e) => panic!("error in {}: {}\n{}", input, e, report),
        }
    }

    /// Runs a single statement that should fail with an error, and returns the error.
    pub fn bad(&mut self, input: &str) -> String {
        let statement = match Statement::parse_str(input) {
            Ok(statement) => statement,
            Err(e) => return format!("parse error: {}", e),
        };
        let mut report = Report::new();
        match self.execute(&statement, &mut report) {
            Err(e) => e.to_string(),
            Ok(outcome) => panic!("expected error in {}, but it was {}", input, outcome),
        }
    }

    /// Like bad, but returns the error itself.
    pub fn error(&mut self, input: &str) -> Error {
        let statement = match Statement::parse_str(input) {
            Ok(statement) => statement,
            Err(e) => panic!("parse error in {}: {}", input, e),
        };
        let mut report = Report::new();
        match self.execute(&statement, &mut report) {
            Err(e) => e,
            Ok(outcome) => panic!("expected error in {}, but it was {}", input, outcome),
        }
    }
}
