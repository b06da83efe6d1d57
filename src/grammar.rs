//! Grammar model: production rules with semantic actions and the indices
//! derived from them.

use std::fmt;
use std::hash::Hash;
use std::ops;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

/// Bound for grammar symbols.
///
/// Symbols are opaque identifiers. A symbol is a non-terminal iff it
/// appears on the left side of some rule; every other referenced symbol is
/// terminal.
pub trait Symbol: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static> Symbol for T {}

/// Semantic action attached to a rule. Receives the parse context and one
/// value per right-hand symbol, and produces the value of the reduced
/// non-terminal.
pub type SemanticAction<V, C> = Box<dyn Fn(&mut C, Vec<V>) -> V + Send + Sync>;

/// A single production rule.
pub struct Rule<S, V, C = ()> {
    left: S,
    right: Vec<S>,
    action: SemanticAction<V, C>,
}

impl<S: Symbol, V, C> Rule<S, V, C> {
    pub fn new<A>(left: S, right: Vec<S>, action: A) -> Self
    where
        A: Fn(&mut C, Vec<V>) -> V + Send + Sync + 'static,
    {
        Self {
            left,
            right,
            action: Box::new(action),
        }
    }

    pub fn left(&self) -> &S {
        &self.left
    }

    pub fn right(&self) -> &[S] {
        &self.right
    }

    pub(crate) fn reduce(&self, context: &mut C, values: Vec<V>) -> V {
        (self.action)(context, values)
    }
}

impl<S: Symbol, V, C> fmt::Display for Rule<S, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ::=", self.left)?;
        if self.right.is_empty() {
            write!(f, " <empty>")
        } else {
            for symbol in &self.right {
                write!(f, " {symbol:?}")?;
            }
            Ok(())
        }
    }
}

impl<S: Symbol, V, C> fmt::Debug for Rule<S, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({self})")
    }
}

/// An immutable set of production rules.
///
/// Rules keep their insertion order; the left side of the first rule is the
/// root non-terminal. All derived indices iterate in first-occurrence
/// order.
pub struct Grammar<S, V, C = ()> {
    rules: Vec<Rule<S, V, C>>,
    nonterms: IndexSet<S>,
    symbols: IndexSet<S>,
    by_left: IndexMap<S, Vec<usize>>,
}

impl<S: Symbol, V, C> Grammar<S, V, C> {
    /// Builds a grammar. Fails on an empty rule list, since the
    /// augmentation step needs a first rule to identify the root.
    pub fn new(rules: Vec<Rule<S, V, C>>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::invalid_grammar(
                "There must be at least one rule in the grammar.",
            ));
        }
        let mut nonterms = IndexSet::new();
        let mut symbols = IndexSet::new();
        let mut by_left: IndexMap<S, Vec<usize>> = IndexMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            nonterms.insert(rule.left.clone());
            symbols.insert(rule.left.clone());
            symbols.extend(rule.right.iter().cloned());
            by_left.entry(rule.left.clone()).or_default().push(idx);
        }
        Ok(Self {
            rules,
            nonterms,
            symbols,
            by_left,
        })
    }

    /// The designated root non-terminal: the left side of the first rule.
    pub fn root(&self) -> &S {
        &self.rules[0].left
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule<S, V, C>> {
        self.rules.iter()
    }

    pub fn rule(&self, index: usize) -> &Rule<S, V, C> {
        &self.rules[index]
    }

    /// Rules with the given non-terminal on the left, in the order of their
    /// occurrence in the grammar.
    pub fn rules_for<'a>(&'a self, left: &S) -> impl Iterator<Item = &'a Rule<S, V, C>> + 'a {
        self.by_left
            .get(left)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&idx| &self.rules[idx])
    }

    /// A symbol is terminal iff it never appears on the left of a rule.
    /// Unreferenced symbols are considered terminal as well.
    pub fn is_terminal(&self, symbol: &S) -> bool {
        !self.nonterms.contains(symbol)
    }

    /// All left-side non-terminals in first-occurrence order.
    pub fn nonterms(&self) -> impl Iterator<Item = &S> {
        self.nonterms.iter()
    }

    /// All referenced symbols in first-occurrence order.
    pub fn symbols(&self) -> impl Iterator<Item = &S> {
        self.symbols.iter()
    }
}

impl<S: Symbol, V, C> ops::Index<usize> for Grammar<S, V, C> {
    type Output = Rule<S, V, C>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rules[index]
    }
}

impl<S: Symbol, V, C> fmt::Debug for Grammar<S, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.to_string()))
            .finish()
    }
}

impl<S: Symbol, V, C> fmt::Display for Grammar<S, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, rule) in self.rules.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}
