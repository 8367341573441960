use std::fmt;

/// The wildcard. A stored `any` matches every symbol except the existence marker.
pub const ANY_SYMBOL: &str = "any";

/// The existence marker. Only another `exist` can match it.
pub const EXIST_SYMBOL: &str = "exist";

/// A Symbol is a value that operators are applied to.
/// Symbols are built bottom-up by the parser, so a composite can never contain itself.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Symbol {
    // An opaque name, like "Socrates" or "x".
    Singleton(String),

    // A structured term, like \pair{a, b}.
    Composite(Composite),
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Composite {
    pub name: String,
    pub args: Vec<Symbol>,
}

impl Symbol {
    pub fn singleton<T: Into<String>>(name: T) -> Symbol {
        Symbol::Singleton(name.into())
    }

    pub fn composite<T: Into<String>>(name: T, args: Vec<Symbol>) -> Symbol {
        Symbol::Composite(Composite {
            name: name.into(),
            args,
        })
    }

    pub fn as_singleton(&self) -> Option<&str> {
        match self {
            Symbol::Singleton(name) => Some(name),
            Symbol::Composite(_) => None,
        }
    }

    pub fn is_any(&self) -> bool {
        self.as_singleton() == Some(ANY_SYMBOL)
    }

    pub fn is_exist(&self) -> bool {
        self.as_singleton() == Some(EXIST_SYMBOL)
    }

    /// Structural identity, without consulting any environment.
    /// Names must match, arities must match, and every argument pair must be identical.
    pub fn structurally_equal(&self, other: &Symbol) -> bool {
        match (self, other) {
            (Symbol::Singleton(a), Symbol::Singleton(b)) => a == b,
            (Symbol::Composite(a), Symbol::Composite(b)) => {
                a.name == b.name
                    && a.args.len() == b.args.len()
                    && a
                        .args
                        .iter()
                        .zip(b.args.iter())
                        .all(|(x, y)| x.structurally_equal(y))
            }
            _ => false,
        }
    }

    /// Calls f on every singleton name inside this symbol, in order.
    /// Composite names are not singletons and are skipped.
    pub fn for_each_singleton<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Symbol::Singleton(name) => f(name),
            Symbol::Composite(c) => {
                for arg in &c.args {
                    arg.for_each_singleton(f);
                }
            }
        }
    }

    pub fn singleton_names(&self) -> Vec<&str> {
        let mut answer = vec![];
        self.for_each_singleton(&mut |name| answer.push(name));
        answer
    }

    /// Whether the given singleton name occurs anywhere in this symbol.
    pub fn mentions(&self, name: &str) -> bool {
        match self {
            Symbol::Singleton(s) => s == name,
            Symbol::Composite(c) => c.args.iter().any(|arg| arg.mentions(name)),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Symbol::Singleton(name) => write!(f, "{}", name),
            Symbol::Composite(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\{}{{{}}}", self.name, join(&self.args, ", "))
    }
}

/// Joins displayable items with a separator.
pub fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> Symbol {
        Symbol::composite("pair", vec![Symbol::singleton(a), Symbol::singleton(b)])
    }

    #[test]
    fn test_independent_composites_are_equal() {
        let c1 = pair("a", "b");
        let c2 = pair("a", "b");
        assert!(c1.structurally_equal(&c2));
        assert!(!c1.structurally_equal(&pair("a", "c")));
        assert!(!c1.structurally_equal(&pair("c", "b")));
    }

    #[test]
    fn test_composite_name_and_arity_matter() {
        let c1 = pair("a", "b");
        let other_name =
            Symbol::composite("tuple", vec![Symbol::singleton("a"), Symbol::singleton("b")]);
        let other_arity = Symbol::composite("pair", vec![Symbol::singleton("a")]);
        assert!(!c1.structurally_equal(&other_name));
        assert!(!c1.structurally_equal(&other_arity));
        assert!(!c1.structurally_equal(&Symbol::singleton("pair")));
    }

    #[test]
    fn test_nested_singleton_names() {
        let nested = Symbol::composite("f", vec![pair("a", "b"), Symbol::singleton("c")]);
        assert_eq!(nested.singleton_names(), vec!["a", "b", "c"]);
        assert!(nested.mentions("b"));
        assert!(!nested.mentions("pair"));
        assert_eq!(nested.to_string(), "\\f{\\pair{a, b}, c}");
    }

    #[test]
    fn test_reserved_symbols() {
        assert!(Symbol::singleton(ANY_SYMBOL).is_any());
        assert!(Symbol::singleton(EXIST_SYMBOL).is_exist());
        assert!(!pair("any", "exist").is_any());
    }
}
