use std::fmt;

use crate::kernel::substitution::Substitution;
use crate::kernel::symbol::{join, Symbol};

/// An operator applied to symbols, like `mortal(Socrates)` or `not human(god)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Atomic {
    pub operator: String,
    pub args: Vec<Symbol>,
    pub positive: bool,

    // Optional symbols for the free variables of each requirement layer of a stored
    // fact, used when the goal's own arguments don't determine them.
    pub hints: Option<Vec<Vec<Symbol>>>,
}

/// `if vars: premises => {conclusions}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Implication {
    pub vars: Vec<String>,
    pub premises: Vec<Proposition>,
    pub conclusions: Vec<Proposition>,
    pub positive: bool,
}

/// `a or b or c`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disjunction {
    pub alternatives: Vec<Proposition>,
    pub positive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Proposition {
    Atomic(Atomic),
    Implication(Implication),
    Disjunction(Disjunction),
}

impl Atomic {
    pub fn new<T: Into<String>>(operator: T, args: Vec<Symbol>) -> Atomic {
        Atomic {
            operator: operator.into(),
            args,
            positive: true,
            hints: None,
        }
    }

    pub fn negated(&self) -> Atomic {
        Atomic {
            positive: !self.positive,
            ..self.clone()
        }
    }

    pub fn substitute(&self, sub: &Substitution) -> Atomic {
        Atomic {
            operator: self.operator.clone(),
            args: sub.apply_all(&self.args),
            positive: self.positive,
            hints: self
                .hints
                .as_ref()
                .map(|layers| layers.iter().map(|layer| sub.apply_all(layer)).collect()),
        }
    }

    fn mentions(&self, name: &str) -> bool {
        self.args.iter().any(|arg| arg.mentions(name))
            || self
                .hints
                .iter()
                .flatten()
                .flatten()
                .any(|hint| hint.mentions(name))
    }
}

impl Implication {
    /// Substitutes underneath the binder.
    /// The implication's own variables shadow the substitution, and they get renamed
    /// when a replacement would otherwise be captured by them.
    pub fn substitute(&self, sub: &Substitution) -> Implication {
        let mut inner = sub.clone();
        for var in &self.vars {
            inner.remove(var);
        }
        let mut vars = vec![];
        for var in &self.vars {
            if inner.introduces(var) {
                let mut fresh = format!("{}'", var);
                while inner.introduces(&fresh) || self.mentions(&fresh) {
                    fresh.push('\'');
                }
                inner.set(var, Symbol::singleton(fresh.clone()));
                vars.push(fresh);
            } else {
                vars.push(var.clone());
            }
        }
        Implication {
            vars,
            premises: substitute_all(&self.premises, &inner),
            conclusions: substitute_all(&self.conclusions, &inner),
            positive: self.positive,
        }
    }

    fn mentions(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v == name)
            || self.premises.iter().any(|p| p.mentions(name))
            || self.conclusions.iter().any(|p| p.mentions(name))
    }
}

pub fn substitute_all(props: &[Proposition], sub: &Substitution) -> Vec<Proposition> {
    props.iter().map(|p| p.substitute(sub)).collect()
}

impl Proposition {
    pub fn atomic<T: Into<String>>(operator: T, args: Vec<Symbol>) -> Proposition {
        Proposition::Atomic(Atomic::new(operator, args))
    }

    pub fn implication(
        vars: Vec<String>,
        premises: Vec<Proposition>,
        conclusions: Vec<Proposition>,
    ) -> Proposition {
        Proposition::Implication(Implication {
            vars,
            premises,
            conclusions,
            positive: true,
        })
    }

    pub fn disjunction(alternatives: Vec<Proposition>) -> Proposition {
        Proposition::Disjunction(Disjunction {
            alternatives,
            positive: true,
        })
    }

    /// Flips the polarity. Negating twice gives back the same proposition.
    pub fn negated(&self) -> Proposition {
        match self {
            Proposition::Atomic(a) => Proposition::Atomic(a.negated()),
            Proposition::Implication(i) => Proposition::Implication(Implication {
                positive: !i.positive,
                ..i.clone()
            }),
            Proposition::Disjunction(d) => Proposition::Disjunction(Disjunction {
                positive: !d.positive,
                ..d.clone()
            }),
        }
    }

    pub fn substitute(&self, sub: &Substitution) -> Proposition {
        if sub.is_empty() {
            return self.clone();
        }
        match self {
            Proposition::Atomic(a) => Proposition::Atomic(a.substitute(sub)),
            Proposition::Implication(i) => Proposition::Implication(i.substitute(sub)),
            Proposition::Disjunction(d) => Proposition::Disjunction(Disjunction {
                alternatives: substitute_all(&d.alternatives, sub),
                positive: d.positive,
            }),
        }
    }

    pub fn mentions(&self, name: &str) -> bool {
        match self {
            Proposition::Atomic(a) => a.mentions(name),
            Proposition::Implication(i) => i.mentions(name),
            Proposition::Disjunction(d) => d.alternatives.iter().any(|p| p.mentions(name)),
        }
    }

    /// Calls f on every atomic proposition inside, along with the names that are bound
    /// by the implications enclosing it.
    pub fn for_each_atomic<'a>(
        &'a self,
        bound: &mut Vec<&'a str>,
        f: &mut impl FnMut(&'a Atomic, &[&'a str]),
    ) {
        match self {
            Proposition::Atomic(a) => f(a, bound),
            Proposition::Implication(i) => {
                let depth = bound.len();
                bound.extend(i.vars.iter().map(|v| v.as_str()));
                for p in i.premises.iter().chain(i.conclusions.iter()) {
                    p.for_each_atomic(bound, f);
                }
                bound.truncate(depth);
            }
            Proposition::Disjunction(d) => {
                for p in &d.alternatives {
                    p.for_each_atomic(bound, f);
                }
            }
        }
    }
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.positive {
            write!(f, "not ")?;
        }
        write!(f, "{}({})", self.operator, join(&self.args, ", "))?;
        if let Some(layers) = &self.hints {
            let layers: Vec<String> = layers.iter().map(|l| join(l, ", ")).collect();
            write!(f, "[{}]", layers.join("; "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Implication {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.positive {
            write!(f, "not ")?;
        }
        write!(f, "if ")?;
        if !self.vars.is_empty() {
            write!(f, "{}: ", self.vars.join(", "))?;
        }
        if !self.premises.is_empty() {
            write!(f, "{} ", join(&self.premises, ", "))?;
        }
        write!(f, "=> {{{}}}", join(&self.conclusions, ", "))
    }
}

impl fmt::Display for Disjunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let body = join(&self.alternatives, " or ");
        if self.positive {
            write!(f, "{}", body)
        } else {
            write!(f, "not ({})", body)
        }
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Proposition::Atomic(a) => write!(f, "{}", a),
            Proposition::Implication(i) => write!(f, "{}", i),
            Proposition::Disjunction(d) => write!(f, "{}", d),
        }
    }
}
