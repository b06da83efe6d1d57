//! The LR(k) parser: table construction settings and the shift-reduce
//! driver.

use std::collections::VecDeque;
use std::fmt;

use colored::Colorize;

use crate::error::{Error, Result};
use crate::grammar::{Grammar, Rule, Symbol};
use crate::index::{StateIndex, StateVec};
use crate::matcher::Matchers;
use crate::{log, logn};
use crate::table::{Action, LRTable, State, StateGraph};

/// Maps an input token to the value matched against terminal lookaheads.
///
/// The default extraction takes the first component of a pair-like token
/// and the token itself otherwise.
pub trait Lexeme<S> {
    fn symbol(&self) -> S;
}

impl<S: Clone> Lexeme<S> for S {
    fn symbol(&self) -> S {
        self.clone()
    }
}

impl<S: Clone, X> Lexeme<S> for (S, X) {
    fn symbol(&self) -> S {
        self.0.clone()
    }
}

/// Parser construction settings.
pub struct Settings<S> {
    matchers: Matchers<S>,
    keep_states: bool,
}

impl<S: Symbol> Settings<S> {
    pub fn new() -> Self {
        Self {
            matchers: Matchers::new(),
            keep_states: false,
        }
    }

    /// The matcher map consulted for every terminal symbol during binding.
    pub fn matchers(mut self, matchers: Matchers<S>) -> Self {
        self.matchers = matchers;
        self
    }

    /// Retain the item-set automaton: conflict errors carry it and a
    /// successfully constructed parser exposes it through
    /// [`Parser::state_graph`].
    pub fn keep_states(mut self, keep: bool) -> Self {
        self.keep_states = keep;
        self
    }
}

impl<S: Symbol> Default for Settings<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-parse options: the context threaded through semantic actions, the
/// extract function and the tracing hooks around reductions.
pub struct ParseOptions<'a, T, S, V, C> {
    context: &'a mut C,
    extract: Box<dyn Fn(&T) -> S + 'a>,
    prereduce: Option<Box<dyn FnMut(&[V]) + 'a>>,
    postreduce: Option<Box<dyn FnMut(&Rule<S, V, C>, &V) + 'a>>,
}

impl<'a, T, S, V, C> ParseOptions<'a, T, S, V, C> {
    /// Options with the default extraction.
    pub fn new(context: &'a mut C) -> Self
    where
        T: Lexeme<S>,
    {
        Self {
            context,
            extract: Box::new(|token| token.symbol()),
            prereduce: None,
            postreduce: None,
        }
    }

    /// Options with an explicit extract function.
    pub fn with_extract<F>(context: &'a mut C, extract: F) -> Self
    where
        F: Fn(&T) -> S + 'a,
    {
        Self {
            context,
            extract: Box::new(extract),
            prereduce: None,
            postreduce: None,
        }
    }

    /// Hook invoked with the popped values right before each reduction.
    pub fn prereduce<F: FnMut(&[V]) + 'a>(mut self, hook: F) -> Self {
        self.prereduce = Some(Box::new(hook));
        self
    }

    /// Hook invoked with the rule and the produced value right after each
    /// reduction.
    pub fn postreduce<F: FnMut(&Rule<S, V, C>, &V) + 'a>(mut self, hook: F) -> Self {
        self.postreduce = Some(Box::new(hook));
        self
    }
}

/// An LR(k) parser.
///
/// Construction builds the LR(k) tables for the grammar; parsing drives a
/// shift-reduce loop over any token iterator, matching a k-deep lookahead
/// window against the bound action tables and invoking the grammar's
/// semantic actions on reductions. A constructed parser is immutable and
/// can be reused for any number of parses.
pub struct Parser<S, V, C = ()> {
    grammar: Grammar<S, V, C>,
    states: StateVec<State<S>>,
    accepting: StateIndex,
    k: usize,
    state_graph: Option<Box<StateGraph>>,
}

impl<S: Symbol, V, C> Parser<S, V, C> {
    /// Builds an LR(k) parser with default settings. Fails if the grammar
    /// is not LR(k) for the given `k`.
    pub fn new(grammar: Grammar<S, V, C>, k: usize) -> Result<Self> {
        Self::with_settings(grammar, k, Settings::default())
    }

    pub fn with_settings(
        grammar: Grammar<S, V, C>,
        k: usize,
        settings: Settings<S>,
    ) -> Result<Self> {
        let table = LRTable::build(&grammar, k, settings.keep_states)?;
        let (states, accepting, state_graph) = table.bind(&settings.matchers);
        Ok(Self {
            grammar,
            states,
            accepting,
            k,
            state_graph,
        })
    }

    pub fn grammar(&self) -> &Grammar<S, V, C> {
        &self.grammar
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The item-set automaton, when construction ran with
    /// [`Settings::keep_states`].
    pub fn state_graph(&self) -> Option<&StateGraph> {
        self.state_graph.as_deref()
    }

    /// Parses with a default context and the default extraction.
    pub fn parse<I>(&self, input: I) -> Result<V>
    where
        I: IntoIterator,
        I::Item: Lexeme<S> + Into<V>,
        C: Default,
    {
        let mut context = C::default();
        self.parse_with(input, ParseOptions::new(&mut context))
    }

    /// Parses with explicit options.
    ///
    /// The parse succeeds once the input is exhausted in the accepting
    /// state with a single value left on the value stack; that value is
    /// returned. Shifted tokens enter the value stack via `Into<V>`.
    pub fn parse_with<I>(&self, input: I, options: ParseOptions<'_, I::Item, S, V, C>) -> Result<V>
    where
        I: IntoIterator,
        I::Item: Into<V>,
    {
        let ParseOptions {
            context,
            extract,
            mut prereduce,
            mut postreduce,
        } = options;
        let mut tokens = input.into_iter();

        // Prime the lookahead window. It stays shorter than k on short
        // input; lookup then matches entries with equally short predicate
        // vectors.
        let mut buffer: VecDeque<I::Item> = VecDeque::with_capacity(self.k);
        while buffer.len() < self.k {
            match tokens.next() {
                Some(token) => buffer.push_back(token),
                None => break,
            }
        }

        // The state stack always holds one more entry than the value
        // stack: the start state below the values.
        let mut stack: Vec<StateIndex> = vec![StateIndex(0)];
        let mut values: Vec<V> = Vec::new();

        loop {
            let state = &self.states[top(&stack)];
            let key: Vec<S> = buffer.iter().map(|token| extract(token)).collect();

            logn!("{} {:?} -- ", "Matching lookahead".green(), key);
            let action = match state.action(&key) {
                Ok(action) => action,
                Err(err) => {
                    log!("{}", "no action".red());
                    return Err(err);
                }
            };
            match action {
                Action::Reduce(rule_index) => {
                    let rule = self.grammar.rule(rule_index.0);
                    log!("{} {}", "reducing by".green(), rule);
                    let arity = rule.right().len();
                    let popped = values.split_off(values.len() - arity);
                    stack.truncate(stack.len() - arity);
                    if let Some(hook) = prereduce.as_mut() {
                        hook(&popped);
                    }
                    let value = rule.reduce(context, popped);
                    if let Some(hook) = postreduce.as_mut() {
                        hook(rule, &value);
                    }
                    let target = self.states[top(&stack)].next_state(rule.left())?;
                    stack.push(target);
                    values.push(value);
                }
                Action::Shift => match next_token(&mut buffer, &mut tokens) {
                    Some(token) => {
                        let symbol = extract(&token);
                        log!("{} {:?}", "shifting".green(), symbol);
                        let target = state.next_state(&symbol)?;
                        stack.push(target);
                        values.push(token.into());
                    }
                    None => {
                        log!("{}", "end of input".red());
                        if top(&stack) == self.accepting {
                            if let Some(value) = values.pop() {
                                if values.is_empty() {
                                    log!("{}", "Accepting.".red());
                                    return Ok(value);
                                }
                            }
                        }
                        return Err(Error::Parsing(
                            "Reached the end of input prematurely.".to_string(),
                        ));
                    }
                },
            }
        }
    }
}

impl<S: Symbol, V, C> fmt::Debug for Parser<S, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar)
            .field("k", &self.k)
            .field("states", &self.states.len())
            .finish()
    }
}

fn top(stack: &[StateIndex]) -> StateIndex {
    stack[stack.len() - 1]
}

/// The next token to shift: the head of the lookahead window refilled from
/// the input, or the input directly when the window is empty (k = 0 or
/// exhausted input).
fn next_token<T>(buffer: &mut VecDeque<T>, tokens: &mut impl Iterator<Item = T>) -> Option<T> {
    match buffer.pop_front() {
        Some(token) => {
            if let Some(refill) = tokens.next() {
                buffer.push_back(refill);
            }
            Some(token)
        }
        None => tokens.next(),
    }
}
