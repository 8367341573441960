use std::collections::HashMap;
use std::rc::Rc;

use regex::Regex;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::kernel::environment::{
    CompositeDecl, Environment, LetsVar, OperatorDecl, ScopeId, StoredFact, StoredReq,
};
use crate::kernel::proposition::{Atomic, Implication, Proposition};
use crate::kernel::symbol::Symbol;
use crate::report::Report;

/// Checks that every operator inside the proposition is declared with the right arity,
/// and that every singleton name is either visible or bound.
pub fn validate(env: &Environment, prop: &Proposition, bound: &[&str]) -> Result<()> {
    let mut result = Ok(());
    let mut outer: Vec<&str> = bound.to_vec();
    prop.for_each_atomic(&mut outer, &mut |atomic, bound| {
        if result.is_ok() {
            result = validate_atomic(env, atomic, bound);
        }
    });
    result
}

fn validate_atomic(env: &Environment, atomic: &Atomic, bound: &[&str]) -> Result<()> {
    let Some((decl, _)) = env.lookup_operator(&atomic.operator) else {
        return Err(Error::UndeclaredOperator(atomic.operator.clone()));
    };
    if decl.arity() != atomic.args.len() {
        return Err(Error::ArityMismatch(
            atomic.operator.clone(),
            decl.arity(),
            atomic.args.len(),
        ));
    }
    let hints = atomic.hints.iter().flatten().flatten();
    for symbol in atomic.args.iter().chain(hints) {
        validate_symbol(env, symbol, bound)?;
    }
    Ok(())
}

fn validate_symbol(env: &Environment, symbol: &Symbol, bound: &[&str]) -> Result<()> {
    match symbol {
        Symbol::Singleton(name) => {
            if bound.contains(&name.as_str()) || env.is_var_visible(name) {
                Ok(())
            } else {
                Err(Error::UndeclaredVariable(name.clone()))
            }
        }
        Symbol::Composite(composite) => {
            if let Some(template) = env.lookup_composite(&composite.name) {
                if template.params.len() != composite.args.len() {
                    return Err(Error::ArityMismatch(
                        format!("\\{}", composite.name),
                        template.params.len(),
                        composite.args.len(),
                    ));
                }
            }
            for arg in &composite.args {
                validate_symbol(env, arg, bound)?;
            }
            Ok(())
        }
    }
}

/// Checks everything that could make storing the proposition fail, without storing it.
/// Statements run this on all their facts first, so an error leaves nothing behind.
pub fn check_storable(env: &Environment, prop: &Proposition, bound: &[&str]) -> Result<()> {
    validate(env, prop, bound)?;
    check_shape(prop)
}

// Mirrors the cases where store_validated refuses a proposition.
fn check_shape(prop: &Proposition) -> Result<()> {
    match prop {
        Proposition::Atomic(_) => Ok(()),
        Proposition::Implication(implication) => {
            if !implication.positive {
                return Err(Error::CannotStoreNegatedImplication(implication.to_string()));
            }
            implication.conclusions.iter().try_for_each(check_shape)
        }
        Proposition::Disjunction(disjunction) => {
            if !disjunction.positive {
                return disjunction
                    .alternatives
                    .iter()
                    .try_for_each(|alternative| check_shape(&alternative.negated()));
            }
            if disjunction.alternatives.len() >= 2 {
                if let Some(imp) = disjunction
                    .alternatives
                    .iter()
                    .find(|alt| matches!(alt, Proposition::Implication(_)))
                {
                    return Err(Error::CannotStoreNegatedImplication(
                        imp.negated().to_string(),
                    ));
                }
            }
            disjunction.alternatives.iter().try_for_each(check_shape)
        }
    }
}

fn check_distinct(names: &[String]) -> Result<()> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(Error::AlreadyDeclared(name.clone()));
        }
    }
    Ok(())
}

/// Registers an operator and stores what its definition implies.
///
/// `def p(x) => {c(x)} when g(x)` stores `if x: p(x), g(x) => {c(x)}`.
/// An iff definition additionally stores `if x: g(x), c(x) => {p(x)}`.
pub fn declare_operator(
    env: &mut Environment,
    decl: OperatorDecl,
    report: &mut Report,
) -> Result<()> {
    check_distinct(&decl.params)?;
    let bound: Vec<&str> = decl.params.iter().map(|p| p.as_str()).collect();
    {
        // The body may mention the operator itself, so validate with it declared.
        let mut child = env.enter();
        child.declare_operator(decl.clone())?;
        for prop in &decl.guards {
            validate(&child, prop, &bound)?;
        }
        for prop in &decl.consequences {
            check_storable(&child, prop, &bound)?;
        }
    }
    env.declare_operator(decl.clone())?;
    debug!(operator = %decl.name, arity = decl.arity(), "declared operator");
    report.note(format!("declared {}({})", decl.name, decl.params.join(", ")));

    if decl.consequences.is_empty() {
        return Ok(());
    }
    let here = env.current();
    let head = Proposition::atomic(
        decl.name.clone(),
        decl.params.iter().map(Symbol::singleton).collect(),
    );
    let mut premises = vec![head.clone()];
    premises.extend(decl.guards.iter().cloned());
    let forward =
        Proposition::implication(decl.params.clone(), premises, decl.consequences.clone());
    store_validated(env, here, &forward, &[])?;

    if decl.iff {
        let mut premises = decl.guards.clone();
        premises.extend(decl.consequences.iter().cloned());
        let backward = Proposition::implication(decl.params.clone(), premises, vec![head]);
        store_validated(env, here, &backward, &[])?;
    }
    Ok(())
}

pub fn declare_composite(
    env: &mut Environment,
    decl: CompositeDecl,
    report: &mut Report,
) -> Result<()> {
    check_distinct(&decl.params)?;
    let bound: Vec<&str> = decl.params.iter().map(|p| p.as_str()).collect();
    for constraint in &decl.constraints {
        validate(env, constraint, &bound)?;
    }
    report.note(format!(
        "declared \\{}{{{}}}",
        decl.name,
        decl.params.join(", ")
    ));
    env.declare_composite(decl)
}

/// Declares a pattern variable and stores its facts as facts about the variable itself.
/// Literal identity makes them apply to every name the pattern matches.
pub fn declare_lets(
    env: &mut Environment,
    name: &str,
    pattern: &str,
    facts: Vec<Proposition>,
    report: &mut Report,
) -> Result<()> {
    let regex = Regex::new(pattern)
        .map_err(|e| Error::InvalidPattern(name.to_string(), e.to_string()))?;
    if env.is_var_visible(name) {
        return Err(Error::AlreadyDeclared(name.to_string()));
    }
    for fact in &facts {
        check_storable(env, fact, &[name])?;
    }
    env.declare_lets(LetsVar {
        name: name.to_string(),
        regex,
    })?;
    report.note(format!("declared pattern variable {} \"{}\"", name, pattern));
    know_all(env, &facts, report)
}

/// Declares new variables along with facts about them, as `let` does.
/// Nothing is declared unless every fact can be stored.
pub fn declare_vars(
    env: &mut Environment,
    vars: &[String],
    facts: &[Proposition],
    report: &mut Report,
) -> Result<()> {
    check_distinct(vars)?;
    if let Some(var) = vars.iter().find(|var| env.is_var_visible(var)) {
        return Err(Error::AlreadyDeclared(var.clone()));
    }
    let bound: Vec<&str> = vars.iter().map(|v| v.as_str()).collect();
    for fact in facts {
        check_storable(env, fact, &bound)?;
    }
    for var in vars {
        env.declare_var(var)?;
    }
    report.note(format!("declared {}", vars.join(", ")));
    know_all(env, facts, report)
}

/// Validates a proposition and stores it into the given scope.
pub fn store(
    env: &mut Environment,
    scope: ScopeId,
    prop: &Proposition,
    report: &mut Report,
) -> Result<()> {
    check_storable(env, prop, &[])?;
    store_validated(env, scope, prop, &[])?;
    report.note(format!("stored {}", prop));
    Ok(())
}

/// Stores into the current scope.
pub fn know(env: &mut Environment, prop: &Proposition, report: &mut Report) -> Result<()> {
    let here = env.current();
    store(env, here, prop, report)
}

/// Stores several facts into the current scope, or none of them if any would fail.
pub fn know_all(env: &mut Environment, facts: &[Proposition], report: &mut Report) -> Result<()> {
    for fact in facts {
        check_storable(env, fact, &[])?;
    }
    for fact in facts {
        know(env, fact, report)?;
    }
    Ok(())
}

/// Stores a proposition that was already validated as part of something larger,
/// like the premises of an implication being checked.
pub fn assume(env: &mut Environment, scope: ScopeId, prop: &Proposition) -> Result<()> {
    store_validated(env, scope, prop, &[])
}

fn store_validated(
    env: &mut Environment,
    scope: ScopeId,
    prop: &Proposition,
    layers: &[StoredReq],
) -> Result<()> {
    match prop {
        Proposition::Atomic(atomic) => {
            let fact = StoredFact {
                operator: atomic.operator.clone(),
                args: atomic.args.clone(),
                positive: atomic.positive,
                layers: layers.to_vec(),
            };
            trace!(fact = %fact, scope = scope.0, "storing fact");
            env.store_fact(scope, fact);
            Ok(())
        }

        Proposition::Implication(implication) => store_implication(env, scope, implication, layers),

        Proposition::Disjunction(disjunction) => {
            if !disjunction.positive {
                // Not (a or b) means not a, and not b.
                for alternative in &disjunction.alternatives {
                    store_validated(env, scope, &alternative.negated(), layers)?;
                }
                return Ok(());
            }
            let alternatives = &disjunction.alternatives;
            match alternatives.len() {
                0 => Ok(()),
                1 => store_validated(env, scope, &alternatives[0], layers),
                _ => {
                    if let Some(imp) = alternatives
                        .iter()
                        .find(|alt| matches!(alt, Proposition::Implication(_)))
                    {
                        return Err(Error::CannotStoreNegatedImplication(
                            imp.negated().to_string(),
                        ));
                    }
                    // Each alternative holds when all the others fail.
                    for (i, alternative) in alternatives.iter().enumerate() {
                        let others = alternatives
                            .iter()
                            .enumerate()
                            .filter(|(j, _)| *j != i)
                            .map(|(_, alt)| alt.negated())
                            .collect();
                        let mut extended = layers.to_vec();
                        extended.push(StoredReq {
                            vars: vec![],
                            requirements: others,
                        });
                        store_validated(env, scope, alternative, &extended)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

fn store_implication(
    env: &mut Environment,
    scope: ScopeId,
    implication: &Implication,
    layers: &[StoredReq],
) -> Result<()> {
    if !implication.positive {
        return Err(Error::CannotStoreNegatedImplication(implication.to_string()));
    }
    let mut extended = layers.to_vec();
    extended.push(StoredReq {
        vars: implication.vars.clone(),
        requirements: implication.premises.clone(),
    });
    for conclusion in &implication.conclusions {
        store_validated(env, scope, conclusion, &extended)?;
    }
    Ok(())
}

/// Every stored fact about the goal's operator that is visible from the current scope.
///
/// We walk from the current scope outward, stopping at the scope that declared the
/// operator. Along the way we count, for each name in the goal, how many of the visited
/// scopes declare it. Once a name is declared more than once, the goal's name refers to a
/// shadowing variable, and facts from further out that mention that name were about a
/// different variable. Those facts are skipped.
pub fn retrieve(env: &Environment, goal: &Atomic) -> Result<Vec<Rc<StoredFact>>> {
    let Some((_, limit)) = env.lookup_operator(&goal.operator) else {
        return Err(Error::UndeclaredOperator(goal.operator.clone()));
    };

    let mut tracked: HashMap<&str, usize> = HashMap::new();
    for arg in &goal.args {
        for name in arg.singleton_names() {
            tracked.insert(name, 0);
        }
    }

    let mut answer = vec![];
    for (_, scope) in env.chain().take(limit + 1) {
        for (name, count) in tracked.iter_mut() {
            if scope.declares_var(name) {
                *count += 1;
            }
        }
        for fact in scope.facts_for(&goal.operator) {
            let shadowed = fact
                .fixed_names()
                .iter()
                .any(|name| tracked.get(name).map_or(false, |count| *count > 1));
            if !shadowed {
                answer.push(fact.clone());
            }
        }
    }
    Ok(answer)
}
