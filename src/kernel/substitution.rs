use std::fmt;

use crate::kernel::symbol::Symbol;

// A Substitution maps names to symbols, allowing us to turn a general fact into one
// about specific symbols by replacing its free names.
// It's persistent, so cloning one to try a candidate match is cheap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    map: im::HashMap<String, Symbol>,
}

impl Substitution {
    pub fn new() -> Substitution {
        Substitution {
            map: im::HashMap::new(),
        }
    }

    /// Pairs names with symbols positionally.
    /// The caller is responsible for checking that the lengths agree.
    pub fn zip(names: &[String], symbols: &[Symbol]) -> Substitution {
        let mut answer = Substitution::new();
        for (name, symbol) in names.iter().zip(symbols.iter()) {
            answer.set(name, symbol.clone());
        }
        answer
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.map.get(name)
    }

    pub fn has_mapping(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn set(&mut self, name: &str, symbol: Symbol) {
        self.map.insert(name.to_string(), symbol);
    }

    pub fn remove(&mut self, name: &str) {
        self.map.remove(name);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Binds a free name, or checks that its existing binding is identical.
    pub fn match_var(&mut self, name: &str, special: &Symbol) -> bool {
        match self.map.get(name) {
            None => {
                self.set(name, special.clone());
                true
            }
            Some(general) => general.structurally_equal(special),
        }
    }

    /// Replaces every mapped name in one simultaneous pass.
    /// A replacement is never itself substituted again.
    pub fn apply(&self, symbol: &Symbol) -> Symbol {
        if self.map.is_empty() {
            return symbol.clone();
        }
        match symbol {
            Symbol::Singleton(name) => match self.map.get(name) {
                Some(replacement) => replacement.clone(),
                None => symbol.clone(),
            },
            Symbol::Composite(c) => Symbol::composite(
                c.name.clone(),
                c.args.iter().map(|arg| self.apply(arg)).collect(),
            ),
        }
    }

    pub fn apply_all(&self, symbols: &[Symbol]) -> Vec<Symbol> {
        symbols.iter().map(|s| self.apply(s)).collect()
    }

    /// Whether any replacement mentions the given name.
    /// Used to avoid capturing names when descending under a binder.
    pub fn introduces(&self, name: &str) -> bool {
        self.map.values().any(|symbol| symbol.mentions(name))
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut pairs: Vec<_> = self
            .map
            .iter()
            .map(|(name, symbol)| format!("{} -> {}", name, symbol))
            .collect();
        pairs.sort();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> Symbol {
        Symbol::singleton(name)
    }

    #[test]
    fn test_apply_is_simultaneous() {
        // Swapping x and y must not chain through the other replacement.
        let mut sub = Substitution::new();
        sub.set("x", s("y"));
        sub.set("y", s("x"));
        let pair = Symbol::composite("pair", vec![s("x"), s("y"), s("z")]);
        assert_eq!(sub.apply(&pair).to_string(), "\\pair{y, x, z}");
    }

    #[test]
    fn test_bindings_must_agree() {
        let mut sub = Substitution::new();
        assert!(sub.match_var("x", &s("a")));
        assert!(sub.match_var("x", &s("a")));
        assert!(!sub.match_var("x", &s("b")));
        assert_eq!(sub.get("x"), Some(&s("a")));
    }

    #[test]
    fn test_zip_and_introduces() {
        let sub = Substitution::zip(&["x".to_string(), "y".to_string()], &[s("a"), s("b")]);
        assert_eq!(sub.len(), 2);
        assert!(sub.introduces("b"));
        assert!(!sub.introduces("y"));
        assert_eq!(sub.to_string(), "{x -> a, y -> b}");
    }
}
