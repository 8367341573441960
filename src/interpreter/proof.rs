use tracing::debug;

use crate::checker::Outcome;
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::kernel::environment::Environment;
use crate::kernel::proposition::Proposition;
use crate::kernel::substitution::Substitution;
use crate::kernel::symbol::Symbol;
use crate::memory;
use crate::report::Report;
use crate::syntax::statement::Statement;

impl Interpreter {
    /// Runs the statements of a proof block. Any statement that doesn't hold ends the block.
    fn run_block(
        &mut self,
        env: &mut Environment,
        block: &[Statement],
        report: &mut Report,
    ) -> Result<Outcome> {
        for statement in block {
            let outcome = self.execute(env, statement, report)?;
            if outcome != Outcome::True {
                report.note(format!(
                    "line {}: {} is {}",
                    statement.first_line, statement, outcome
                ));
                return Ok(Outcome::Unknown);
            }
        }
        Ok(Outcome::True)
    }

    /// A direct proof.
    ///
    /// The block runs in a child scope. For an implication goal, its variables are bound
    /// and its premises assumed there first. Then the goal is checked in the child, and if
    /// it holds, the goal becomes known in the scope we started from.
    pub fn prove(
        &mut self,
        env: &mut Environment,
        goal: &Proposition,
        block: &[Statement],
        report: &mut Report,
    ) -> Result<Outcome> {
        memory::validate(env, goal, &[])?;
        let mut inner = Report::new();
        let result = {
            let mut child = env.enter();
            self.prove_in_child(&mut child, goal, block, &mut inner)
        };
        report.absorb("[prove]", inner);
        let outcome = result?;
        if outcome == Outcome::True {
            let here = env.current();
            memory::assume(env, here, goal)?;
            report.note(format!("proved {}", goal));
        } else {
            report.note(format!("could not prove {}", goal));
        }
        debug!(goal = %goal, outcome = %outcome, "direct proof");
        Ok(outcome)
    }

    fn prove_in_child(
        &mut self,
        child: &mut Environment,
        goal: &Proposition,
        block: &[Statement],
        report: &mut Report,
    ) -> Result<Outcome> {
        let Proposition::Implication(imp) = goal else {
            if self.run_block(child, block, report)? != Outcome::True {
                return Ok(Outcome::Unknown);
            }
            return self.checker.check(child, goal, report);
        };

        if !imp.positive {
            return Err(Error::CannotCheckNegatedImplication(imp.to_string()));
        }
        for var in &imp.vars {
            child.bind_var(var)?;
        }
        let here = child.current();
        for premise in &imp.premises {
            memory::assume(child, here, premise)?;
        }
        if self.run_block(child, block, report)? != Outcome::True {
            return Ok(Outcome::Unknown);
        }
        for conclusion in &imp.conclusions {
            if self.checker.check(child, conclusion, report)? != Outcome::True {
                return Ok(Outcome::Unknown);
            }
            memory::assume(child, here, conclusion)?;
        }
        Ok(Outcome::True)
    }

    /// Proof by contradiction.
    ///
    /// The negation of the goal is assumed in a child scope and the block runs there.
    /// The proof succeeds when both the witness and its negation then hold.
    pub fn prove_by_contradiction(
        &mut self,
        env: &mut Environment,
        goal: &Proposition,
        block: &[Statement],
        witness: &Proposition,
        report: &mut Report,
    ) -> Result<Outcome> {
        memory::validate(env, goal, &[])?;
        let mut inner = Report::new();
        let result = {
            let mut child = env.enter();
            self.contradict_in_child(&mut child, goal, block, witness, &mut inner)
        };
        report.absorb("[contradiction]", inner);
        let outcome = result?;
        if outcome == Outcome::True {
            let here = env.current();
            memory::assume(env, here, goal)?;
            report.note(format!("proved {} by contradiction", goal));
        }
        debug!(goal = %goal, outcome = %outcome, "proof by contradiction");
        Ok(outcome)
    }

    fn contradict_in_child(
        &mut self,
        child: &mut Environment,
        goal: &Proposition,
        block: &[Statement],
        witness: &Proposition,
        report: &mut Report,
    ) -> Result<Outcome> {
        let here = child.current();
        memory::assume(child, here, &goal.negated())?;
        if self.run_block(child, block, report)? != Outcome::True {
            return Ok(Outcome::Unknown);
        }

        let positive = self.checker.check(child, witness, report)?;
        if positive != Outcome::True {
            report.note(format!("{} does not hold, so there is no contradiction", witness));
            return Ok(Outcome::Unknown);
        }
        let negation = witness.negated();
        let negative = self.checker.check(child, &negation, report)?;
        if negative != Outcome::True {
            report.note(format!("{} does not hold, so there is no contradiction", negation));
            return Ok(Outcome::Unknown);
        }
        Ok(Outcome::True)
    }

    /// Applies a named implication to specific symbols.
    ///
    /// Only this one instantiation is checked: each substituted premise must hold, and
    /// then the substituted conclusions become known in the current scope.
    pub fn by(
        &mut self,
        env: &mut Environment,
        lemma: &str,
        args: &[Symbol],
        report: &mut Report,
    ) -> Result<Outcome> {
        let Some(imp) = env.lookup_lemma(lemma).cloned() else {
            return Err(Error::UnknownLemma(lemma.to_string()));
        };
        if imp.vars.len() != args.len() {
            return Err(Error::ArityMismatch(
                lemma.to_string(),
                imp.vars.len(),
                args.len(),
            ));
        }
        for arg in args {
            for name in arg.singleton_names() {
                if !env.is_var_visible(name) {
                    return Err(Error::UndeclaredVariable(name.to_string()));
                }
            }
        }

        let sub = Substitution::zip(&imp.vars, args);
        for premise in &imp.premises {
            let premise = premise.substitute(&sub);
            let outcome = match &premise {
                Proposition::Atomic(atomic)
                    if self.checker.check_atomic_literally(env, atomic, report)?
                        == Outcome::True =>
                {
                    Outcome::True
                }
                _ => self.checker.check(env, &premise, report)?,
            };
            if outcome != Outcome::True {
                report.note(format!("by {}: premise {} is {}", lemma, premise, outcome));
                return Ok(Outcome::Unknown);
            }
        }

        let here = env.current();
        for conclusion in &imp.conclusions {
            let conclusion = conclusion.substitute(&sub);
            memory::assume(env, here, &conclusion)?;
            report.note(format!("by {}: {}", lemma, conclusion));
        }
        Ok(Outcome::True)
    }
}
