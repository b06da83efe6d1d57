//! Terminal matchers: predicates over extracted token values.
//!
//! Wherever a matcher is registered for a terminal symbol it replaces
//! symbol equality, both in action lookahead vectors and in goto tables.
//! Terminals without a matcher are matched by equality.

use std::borrow::Borrow;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::grammar::Symbol;

/// A predicate over extracted token values.
pub type Matcher<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// An ordered registry mapping terminal symbols to matchers.
pub struct Matchers<S> {
    map: IndexMap<S, Matcher<S>>,
}

impl<S: Symbol> Matchers<S> {
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }

    /// Registers a matcher for a terminal symbol, replacing any previous
    /// one.
    pub fn insert<M>(&mut self, symbol: S, matcher: M)
    where
        M: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.map.insert(symbol, Arc::new(matcher));
    }

    /// Chainable form of [`Matchers::insert`].
    pub fn with<M>(mut self, symbol: S, matcher: M) -> Self
    where
        M: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.insert(symbol, matcher);
        self
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn get(&self, symbol: &S) -> Option<&Matcher<S>> {
        self.map.get(symbol)
    }
}

impl<S: Symbol> Default for Matchers<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Equality to a fixed symbol; the fallback wherever no matcher is
/// registered.
pub(crate) fn symbol_matcher<S: Symbol>(symbol: S) -> Matcher<S> {
    Arc::new(move |value| *value == symbol)
}

/// The convenience registry of the core: `any` matches every value, the
/// rest are character-class tests over string-like values.
pub fn default_matchers<S>() -> Matchers<S>
where
    S: Symbol + Borrow<str> + From<&'static str>,
{
    let mut matchers = Matchers::new();
    matchers.insert("any".into(), |_: &S| true);
    matchers.insert("space".into(), |value: &S| {
        all_chars(value.borrow(), char::is_whitespace)
    });
    matchers.insert("digit".into(), |value: &S| {
        all_chars(value.borrow(), char::is_numeric)
    });
    matchers.insert("alnum".into(), |value: &S| {
        all_chars(value.borrow(), char::is_alphanumeric)
    });
    matchers
}

fn all_chars(value: &str, class: impl Fn(char) -> bool) -> bool {
    !value.is_empty() && value.chars().all(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry() {
        let matchers = default_matchers::<&'static str>();
        assert_eq!(matchers.len(), 4);

        let any = matchers.get(&"any").unwrap();
        assert!(any(&"anything"));

        let space = matchers.get(&"space").unwrap();
        assert!(space(&" "));
        assert!(space(&"\t\n"));
        assert!(!space(&"x"));
        assert!(!space(&""));

        let digit = matchers.get(&"digit").unwrap();
        assert!(digit(&"42"));
        assert!(!digit(&"4x"));

        let alnum = matchers.get(&"alnum").unwrap();
        assert!(alnum(&"a1"));
        assert!(!alnum(&"a 1"));
    }

    #[test]
    fn equality_fallback() {
        let matcher = symbol_matcher("item");
        assert!(matcher(&"item"));
        assert!(!matcher(&"other"));
    }
}
