use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use regex::Regex;

use crate::error::{Error, Result};
use crate::kernel::proposition::{Implication, Proposition};
use crate::kernel::symbol::{join, Symbol, ANY_SYMBOL, EXIST_SYMBOL};

/// One requirement layer of a stored fact.
/// The vars are free in the fact; the requirements must all hold before the fact applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredReq {
    pub vars: Vec<String>,
    pub requirements: Vec<Proposition>,
}

/// A fact as it lives in memory.
/// Facts are never mutated after they are stored. Checking makes substituted copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFact {
    pub operator: String,
    pub args: Vec<Symbol>,
    pub positive: bool,

    // Outermost layer first.
    pub layers: Vec<StoredReq>,
}

impl StoredFact {
    /// True if no layer carries any requirement, so only argument matching matters.
    pub fn is_unconditional(&self) -> bool {
        self.layers.iter().all(|layer| layer.requirements.is_empty())
    }

    pub fn free_vars(&self) -> HashSet<String> {
        self.layers
            .iter()
            .flat_map(|layer| layer.vars.iter().cloned())
            .collect()
    }

    /// Singleton names in the arguments that are not bound by any layer.
    pub fn fixed_names(&self) -> Vec<&str> {
        let free = self.free_vars();
        let mut answer = vec![];
        for arg in &self.args {
            arg.for_each_singleton(&mut |name| {
                if !free.contains(name) {
                    answer.push(name);
                }
            });
        }
        answer
    }
}

impl fmt::Display for StoredFact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.positive {
            write!(f, "not ")?;
        }
        write!(f, "{}({})", self.operator, join(&self.args, ", "))?;
        for layer in &self.layers {
            write!(
                f,
                " <= [{}: {}]",
                layer.vars.join(", "),
                join(&layer.requirements, ", ")
            )?;
        }
        Ok(())
    }
}

/// A declared operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorDecl {
    pub name: String,
    pub params: Vec<String>,

    // Must hold for the operator to apply at all.
    pub guards: Vec<Proposition>,

    // Follow from the operator holding.
    pub consequences: Vec<Proposition>,

    // When set, the consequences also imply the operator.
    pub iff: bool,
}

impl OperatorDecl {
    pub fn new<T: Into<String>>(name: T, params: Vec<String>) -> OperatorDecl {
        OperatorDecl {
            name: name.into(),
            params,
            guards: vec![],
            consequences: vec![],
            iff: false,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A composite template, like `\pair{a, b}`, with the constraints every instance must meet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeDecl {
    pub name: String,
    pub params: Vec<String>,
    pub constraints: Vec<Proposition>,
}

/// A pattern variable. Every singleton whose name matches the regex counts as this variable.
#[derive(Clone, Debug)]
pub struct LetsVar {
    pub name: String,
    pub regex: Regex,
}

impl LetsVar {
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

/// Everything declared or stored at one level of nesting.
#[derive(Debug, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    vars: HashSet<String>,
    operators: HashMap<String, OperatorDecl>,
    composites: HashMap<String, CompositeDecl>,
    lets_vars: Vec<LetsVar>,
    lemmas: HashMap<String, Implication>,
    facts: HashMap<String, Vec<Rc<StoredFact>>>,
    num_facts: usize,
}

impl Scope {
    pub fn declares_var(&self, name: &str) -> bool {
        self.vars.contains(name)
    }

    pub fn facts_for(&self, operator: &str) -> &[Rc<StoredFact>] {
        match self.facts.get(operator) {
            Some(facts) => facts,
            None => &[],
        }
    }
}

/// The scoped knowledge store.
///
/// Scopes live in an arena shaped like a stack. The last scope is the current one, and
/// each scope's parent is the one below it. Child scopes are only created through
/// `enter`, whose guard discards the scope again on every exit path.
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            scopes: vec![Scope::default()],
        }
    }

    pub fn current(&self) -> ScopeId {
        ScopeId(self.scopes.len() - 1)
    }

    /// How many scopes are nested above the root.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Opens a child of the current scope.
    pub fn enter(&mut self) -> ChildScope<'_> {
        let parent = self.current();
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        let id = self.current();
        ChildScope { env: self, id }
    }

    /// The current scope, then each ancestor, each with its distance from the current scope.
    pub fn chain(&self) -> impl Iterator<Item = (usize, &Scope)> {
        let mut next = Some(self.current());
        let mut distance = 0;
        std::iter::from_fn(move || {
            let id = next?;
            let scope = &self.scopes[id.0];
            next = scope.parent;
            distance += 1;
            Some((distance - 1, scope))
        })
    }

    fn is_reserved(name: &str) -> bool {
        name == ANY_SYMBOL || name == EXIST_SYMBOL
    }

    /// Whether a singleton name refers to something declared.
    /// Names matching a pattern variable's regex count as declared.
    pub fn is_var_visible(&self, name: &str) -> bool {
        if Environment::is_reserved(name) {
            return true;
        }
        self.chain().any(|(_, scope)| {
            scope.vars.contains(name)
                || scope
                    .lets_vars
                    .iter()
                    .any(|lets| lets.name == name || lets.matches(name))
        })
    }

    /// Declares a variable that must not collide with anything visible.
    pub fn declare_var(&mut self, name: &str) -> Result<()> {
        if self.is_var_visible(name) {
            return Err(Error::AlreadyDeclared(name.to_string()));
        }
        let id = self.current();
        self.scopes[id.0].vars.insert(name.to_string());
        Ok(())
    }

    /// Introduces a bound variable, which may shadow an ancestor's variable of the same name.
    pub fn bind_var(&mut self, name: &str) -> Result<()> {
        let id = self.current();
        if Environment::is_reserved(name) || self.scopes[id.0].vars.contains(name) {
            return Err(Error::AlreadyDeclared(name.to_string()));
        }
        self.scopes[id.0].vars.insert(name.to_string());
        Ok(())
    }

    /// Returns the declaration along with the distance of the scope that declared it.
    pub fn lookup_operator(&self, name: &str) -> Option<(&OperatorDecl, usize)> {
        self.chain()
            .find_map(|(distance, scope)| scope.operators.get(name).map(|decl| (decl, distance)))
    }

    pub fn declare_operator(&mut self, decl: OperatorDecl) -> Result<()> {
        if self.lookup_operator(&decl.name).is_some() {
            return Err(Error::AlreadyDeclared(decl.name));
        }
        let id = self.current();
        self.scopes[id.0].operators.insert(decl.name.clone(), decl);
        Ok(())
    }

    pub fn lookup_composite(&self, name: &str) -> Option<&CompositeDecl> {
        self.chain()
            .find_map(|(_, scope)| scope.composites.get(name))
    }

    pub fn declare_composite(&mut self, decl: CompositeDecl) -> Result<()> {
        if self.lookup_composite(&decl.name).is_some() {
            return Err(Error::AlreadyDeclared(decl.name));
        }
        let id = self.current();
        self.scopes[id.0].composites.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// The pattern variable with exactly this name, if one is visible.
    pub fn lets_var_for(&self, name: &str) -> Option<&LetsVar> {
        self.chain()
            .find_map(|(_, scope)| scope.lets_vars.iter().find(|lets| lets.name == name))
    }

    pub fn declare_lets(&mut self, lets: LetsVar) -> Result<()> {
        if self.is_var_visible(&lets.name) {
            return Err(Error::AlreadyDeclared(lets.name));
        }
        let id = self.current();
        self.scopes[id.0].lets_vars.push(lets);
        Ok(())
    }

    pub fn lookup_lemma(&self, name: &str) -> Option<&Implication> {
        self.chain().find_map(|(_, scope)| scope.lemmas.get(name))
    }

    pub fn name_lemma(&mut self, name: &str, implication: Implication) -> Result<()> {
        if self.lookup_lemma(name).is_some() {
            return Err(Error::AlreadyDeclared(name.to_string()));
        }
        let id = self.current();
        self.scopes[id.0]
            .lemmas
            .insert(name.to_string(), implication);
        Ok(())
    }

    /// Appends a fact to one scope's list. No other scope is touched.
    pub fn store_fact(&mut self, scope: ScopeId, fact: StoredFact) {
        let scope = &mut self.scopes[scope.0];
        scope
            .facts
            .entry(fact.operator.clone())
            .or_default()
            .push(Rc::new(fact));
        scope.num_facts += 1;
    }

    /// How many facts the active stack holds.
    /// Storing anything changes it, so a repeated goal at the same count means no progress.
    pub fn fact_count(&self) -> usize {
        self.scopes.iter().map(|scope| scope.num_facts).sum()
    }

    fn leave(&mut self, id: ScopeId) {
        self.scopes.truncate(id.0);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

/// A child scope that is discarded when the guard is dropped.
/// It derefs to the environment, so everything done through it lands in the child.
pub struct ChildScope<'a> {
    env: &'a mut Environment,
    id: ScopeId,
}

impl ChildScope<'_> {
    pub fn id(&self) -> ScopeId {
        self.id
    }
}

impl Deref for ChildScope<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        &*self.env
    }
}

impl DerefMut for ChildScope<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        &mut *self.env
    }
}

impl Drop for ChildScope<'_> {
    fn drop(&mut self) {
        self.env.leave(self.id);
    }
}
