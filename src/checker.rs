use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::CheckerConfig;
use crate::error::{Error, Result};
use crate::kernel::environment::{Environment, StoredFact};
use crate::kernel::proposition::{Atomic, Disjunction, Implication, Proposition};
use crate::kernel::substitution::Substitution;
use crate::kernel::symbol::{Composite, Symbol, ANY_SYMBOL};
use crate::memory;
use crate::report::Report;

/// The result of checking a proposition.
/// Errors are the fourth possible result, and travel separately in the `Err` of a `Result`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    // The proposition follows from what is known.
    True,

    // Its negation follows from what is known.
    False,

    // Neither could be established.
    Unknown,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::True => write!(f, "True"),
            Outcome::False => write!(f, "False"),
            Outcome::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Decides propositions against the facts visible in an environment.
///
/// Checking never changes what the caller's scope knows. Everything the checker assumes
/// along the way goes into child scopes that are discarded before it returns.
pub struct Checker {
    config: CheckerConfig,

    // How many nested checks are on the call stack right now.
    depth: usize,

    // Atomic goals currently being checked, with the fact count at the time.
    // Meeting the same goal again with no new facts can't make progress.
    in_progress: Vec<(Atomic, usize)>,
}

impl Checker {
    pub fn new(config: CheckerConfig) -> Checker {
        Checker {
            config,
            depth: 0,
            in_progress: vec![],
        }
    }

    /// Checks any proposition.
    /// At the top level, the proposition is validated first, so using an undeclared
    /// operator or variable is an error rather than Unknown.
    pub fn check(
        &mut self,
        env: &mut Environment,
        prop: &Proposition,
        report: &mut Report,
    ) -> Result<Outcome> {
        if self.depth == 0 {
            memory::validate(env, prop, &[])?;
        }
        let outcome = match prop {
            Proposition::Atomic(goal) => self.check_atomic_with_fallback(env, goal, report)?,
            Proposition::Implication(goal) => self.check_implication(env, goal, report)?,
            Proposition::Disjunction(goal) => self.check_disjunction(env, goal, report)?,
        };
        if self.depth == 0 {
            report.note(format!("{}: {}", prop, outcome));
        }
        Ok(outcome)
    }

    /// Runs f one level deeper, failing once the depth ceiling is reached.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Checker) -> Result<T>) -> Result<T> {
        if self.depth >= self.config.max_depth {
            return Err(Error::RecursionLimitExceeded(self.config.max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn check_atomic_with_fallback(
        &mut self,
        env: &mut Environment,
        goal: &Atomic,
        report: &mut Report,
    ) -> Result<Outcome> {
        let outcome = self.check_atomic_once(env, goal, report)?;
        if outcome != Outcome::Unknown || !self.config.polarity_fallback {
            return Ok(outcome);
        }

        // Not proven. See if the opposite can be.
        let negation = goal.negated();
        if self.check_atomic_once(env, &negation, report)? == Outcome::True {
            report.note(format!("{} is false, since {} holds", goal, negation));
            return Ok(Outcome::False);
        }
        Ok(Outcome::Unknown)
    }

    /// Checks an atomic goal against every visible candidate fact, without polarity fallback.
    fn check_atomic_once(
        &mut self,
        env: &mut Environment,
        goal: &Atomic,
        report: &mut Report,
    ) -> Result<Outcome> {
        let key = (goal.clone(), env.fact_count());
        if self.in_progress.contains(&key) {
            trace!(goal = %goal, "goal is already being checked");
            return Ok(Outcome::Unknown);
        }
        self.in_progress.push(key);
        let result = self.nested(|checker| checker.check_candidates(env, goal, report));
        self.in_progress.pop();
        result
    }

    fn check_candidates(
        &mut self,
        env: &mut Environment,
        goal: &Atomic,
        report: &mut Report,
    ) -> Result<Outcome> {
        let candidates = memory::retrieve(env, goal)?;
        for fact in candidates {
            if fact.positive != goal.positive {
                continue;
            }
            if fact.args.len() != goal.args.len() {
                return Err(Error::ArityMismatch(
                    goal.operator.clone(),
                    fact.args.len(),
                    goal.args.len(),
                ));
            }
            if self.try_candidate(env, goal, &fact, report)? == Outcome::True {
                trace!(goal = %goal, fact = %fact, "checked");
                report.note(format!(
                    "{}{} checked by {}",
                    "  ".repeat(self.depth.saturating_sub(1)),
                    goal,
                    fact
                ));
                return Ok(Outcome::True);
            }
        }
        Ok(Outcome::Unknown)
    }

    fn try_candidate(
        &mut self,
        env: &mut Environment,
        goal: &Atomic,
        fact: &StoredFact,
        report: &mut Report,
    ) -> Result<Outcome> {
        let free = fact.free_vars();
        let mut sub = Substitution::new();
        for (stored, given) in fact.args.iter().zip(goal.args.iter()) {
            if !self.symbols_match(env, stored, given, &free, &mut sub, report)? {
                return Ok(Outcome::Unknown);
            }
        }
        let mut bound = HashSet::new();
        self.check_layers(env, goal, fact, 0, &mut sub, &mut bound, report)
    }

    /// Checks the requirement layers of a candidate, outermost first.
    /// Each layer gets its own child scope, nested inside the previous layer's.
    fn check_layers(
        &mut self,
        env: &mut Environment,
        goal: &Atomic,
        fact: &StoredFact,
        index: usize,
        sub: &mut Substitution,
        bound: &mut HashSet<String>,
        report: &mut Report,
    ) -> Result<Outcome> {
        let Some(layer) = fact.layers.get(index) else {
            return Ok(Outcome::True);
        };
        for var in &layer.vars {
            if !bound.insert(var.clone()) {
                return Err(Error::DoubleBoundFreeVariable(var.clone()));
            }
        }

        if let Some(hints) = goal.hints.as_ref().and_then(|layers| layers.get(index)) {
            if hints.len() != layer.vars.len() {
                trace!(fact = %fact, layer = index, "hints don't fit this candidate");
                return Ok(Outcome::Unknown);
            }
            for (var, hint) in layer.vars.iter().zip(hints.iter()) {
                if !sub.match_var(var, hint) {
                    return Ok(Outcome::Unknown);
                }
            }
        }

        // Layer variables that the goal didn't determine become opaque names in the child.
        // They get renamed if the goal already uses the same name for something else.
        let mut child = env.enter();
        let mut opaque = vec![];
        for var in &layer.vars {
            if sub.has_mapping(var) {
                continue;
            }
            let mut name = var.clone();
            while sub.introduces(&name) {
                name.push('\'');
            }
            if name != *var {
                sub.set(var, Symbol::singleton(name.clone()));
            }
            child.bind_var(&name)?;
            opaque.push(name);
        }

        for requirement in &layer.requirements {
            let requirement = requirement.substitute(sub);

            // Nothing is known about an opaque name except what holds for everything,
            // so searching further would only invent more opaque names.
            let outcome = match &requirement {
                Proposition::Atomic(atomic)
                    if opaque.iter().any(|name| requirement.mentions(name)) =>
                {
                    self.nested(|checker| {
                        checker.check_atomic_literally(&mut child, atomic, report)
                    })?
                }
                _ => self.check_requirement(&mut child, &requirement, report)?,
            };
            if outcome != Outcome::True {
                trace!(requirement = %requirement, fact = %fact, "requirement not met");
                return Ok(Outcome::Unknown);
            }
        }
        self.check_layers(&mut child, goal, fact, index + 1, sub, bound, report)
    }

    /// Requirements are checked without polarity fallback.
    /// Atomic ones try the literal fast path before the full search.
    fn check_requirement(
        &mut self,
        env: &mut Environment,
        requirement: &Proposition,
        report: &mut Report,
    ) -> Result<Outcome> {
        self.nested(|checker| match requirement {
            Proposition::Atomic(atomic) => {
                if checker.check_atomic_literally(env, atomic, report)? == Outcome::True {
                    return Ok(Outcome::True);
                }
                checker.check_atomic_once(env, atomic, report)
            }
            _ => checker.check(env, requirement, report),
        })
    }

    /// The fast path: only facts whose layers carry no requirements are considered,
    /// so nothing recursive is checked besides composite templates.
    pub fn check_atomic_literally(
        &mut self,
        env: &mut Environment,
        goal: &Atomic,
        report: &mut Report,
    ) -> Result<Outcome> {
        let candidates = memory::retrieve(env, goal)?;
        for fact in candidates {
            if fact.positive != goal.positive
                || fact.args.len() != goal.args.len()
                || !fact.is_unconditional()
            {
                continue;
            }
            let free = fact.free_vars();
            let mut sub = Substitution::new();
            let mut matched = true;
            for (stored, given) in fact.args.iter().zip(goal.args.iter()) {
                if !self.symbols_match(env, stored, given, &free, &mut sub, report)? {
                    matched = false;
                    break;
                }
            }
            if matched {
                trace!(goal = %goal, fact = %fact, "checked literally");
                return Ok(Outcome::True);
            }
        }
        Ok(Outcome::Unknown)
    }

    /// Matches a stored argument against a goal argument.
    /// Free names bind. Wildcards, pattern variables and composite templates are honored.
    fn symbols_match(
        &mut self,
        env: &mut Environment,
        stored: &Symbol,
        given: &Symbol,
        free: &HashSet<String>,
        sub: &mut Substitution,
        report: &mut Report,
    ) -> Result<bool> {
        match stored {
            Symbol::Singleton(name) if free.contains(name) => Ok(sub.match_var(name, given)),
            Symbol::Singleton(name) if name == ANY_SYMBOL => Ok(!given.is_exist()),
            _ if given.is_any() => Ok(!stored.is_exist()),
            Symbol::Singleton(name) => match given {
                Symbol::Singleton(given_name) => Ok(given_name == name
                    || env
                        .lets_var_for(name)
                        .map_or(false, |lets| lets.matches(given_name))),
                Symbol::Composite(_) => Ok(false),
            },
            Symbol::Composite(stored) => match given {
                Symbol::Composite(given)
                    if given.name == stored.name && given.args.len() == stored.args.len() =>
                {
                    for (s, g) in stored.args.iter().zip(given.args.iter()) {
                        if !self.symbols_match(env, s, g, free, sub, report)? {
                            return Ok(false);
                        }
                    }
                    self.satisfies_template(env, given, report)
                }
                _ => Ok(false),
            },
        }
    }

    /// Whether a composite meets the constraints of its declared template.
    /// Composites without a visible template are unconstrained.
    pub fn satisfies_template(
        &mut self,
        env: &mut Environment,
        composite: &Composite,
        report: &mut Report,
    ) -> Result<bool> {
        let Some(template) = env.lookup_composite(&composite.name).cloned() else {
            return Ok(true);
        };
        if template.params.len() != composite.args.len() {
            return Err(Error::ArityMismatch(
                format!("\\{}", composite.name),
                template.params.len(),
                composite.args.len(),
            ));
        }
        let sub = Substitution::zip(&template.params, &composite.args);
        for constraint in &template.constraints {
            let constraint = constraint.substitute(&sub);
            if self.check_requirement(env, &constraint, report)? != Outcome::True {
                trace!(composite = %composite, constraint = %constraint, "constraint not met");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Assumes the premises in a child scope, then checks the conclusions in order.
    /// Each proven conclusion is assumed before checking the next one.
    fn check_implication(
        &mut self,
        env: &mut Environment,
        goal: &Implication,
        report: &mut Report,
    ) -> Result<Outcome> {
        if !goal.positive {
            return Err(Error::CannotCheckNegatedImplication(goal.to_string()));
        }
        let mut child = env.enter();
        for var in &goal.vars {
            child.bind_var(var)?;
        }
        let here = child.id();
        for premise in &goal.premises {
            memory::assume(&mut child, here, premise)?;
        }
        for conclusion in &goal.conclusions {
            let outcome = self.nested(|checker| checker.check(&mut child, conclusion, report))?;
            if outcome != Outcome::True {
                trace!(conclusion = %conclusion, outcome = %outcome, "conclusion not established");
                return Ok(Outcome::Unknown);
            }
            memory::assume(&mut child, here, conclusion)?;
        }
        Ok(Outcome::True)
    }

    fn check_disjunction(
        &mut self,
        env: &mut Environment,
        goal: &Disjunction,
        report: &mut Report,
    ) -> Result<Outcome> {
        if !goal.positive {
            // Not (a or b) holds when not a and not b both hold.
            for alternative in &goal.alternatives {
                let negation = alternative.negated();
                let outcome = self.nested(|checker| checker.check(env, &negation, report))?;
                if outcome != Outcome::True {
                    return Ok(Outcome::Unknown);
                }
            }
            return Ok(Outcome::True);
        }

        let alternatives = &goal.alternatives;
        match alternatives.len() {
            0 => Ok(Outcome::True),
            1 => self.nested(|checker| checker.check(env, &alternatives[0], report)),
            _ => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    let mut child = env.enter();
                    let here = child.id();
                    for (j, other) in alternatives.iter().enumerate() {
                        if i != j {
                            memory::assume(&mut child, here, &other.negated())?;
                        }
                    }
                    let outcome =
                        self.nested(|checker| checker.check(&mut child, alternative, report))?;
                    if outcome == Outcome::True {
                        return Ok(Outcome::True);
                    }
                }
                Ok(Outcome::Unknown)
            }
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Checker::new(CheckerConfig::default())
    }
}
