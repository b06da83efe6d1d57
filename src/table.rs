//! Calculating LR(k) tables: the canonical item-set collection with action
//! and goto tables, conflict detection and matcher binding.

use std::fmt;

use colored::Colorize;
use indexmap::{IndexMap, IndexSet};
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;

use crate::error::{Error, Result};
use crate::first::{FirstSets, TerminalString, TerminalStrings};
use crate::grammar::{Grammar, Symbol};
use crate::index::{AugRuleIndex, AugRuleVec, RuleIndex, StateIndex, StateVec, SymbolIndex};
use crate::log;
use crate::matcher::{symbol_matcher, Matcher, Matchers};

/// The synthetic start symbol of the augmented grammar.
pub(crate) const START: SymbolIndex = SymbolIndex(0);

/// A rule of the augmented grammar over interned symbols. Rule 0 is the
/// synthetic `S' -> root`; every other rule remembers its position in the
/// user grammar.
#[derive(Debug)]
pub(crate) struct AugRule {
    left: SymbolIndex,
    right: Vec<SymbolIndex>,
    user: Option<RuleIndex>,
}

impl AugRule {
    pub(crate) fn left(&self) -> SymbolIndex {
        self.left
    }

    pub(crate) fn right(&self) -> &[SymbolIndex] {
        &self.right
    }
}

/// The augmented grammar: user symbols interned to dense indices, with the
/// synthetic start symbol at index 0.
#[derive(Debug)]
pub(crate) struct Augmented<S> {
    symbols: Vec<S>,
    rules: AugRuleVec<AugRule>,
    by_left: Vec<Vec<AugRuleIndex>>,
}

impl<S: Symbol> Augmented<S> {
    pub(crate) fn new<V, C>(grammar: &Grammar<S, V, C>) -> Self {
        let symbols: Vec<S> = grammar.symbols().cloned().collect();
        let lookup: IndexMap<&S, SymbolIndex> = symbols
            .iter()
            .enumerate()
            .map(|(idx, symbol)| (symbol, SymbolIndex(idx + 1)))
            .collect();

        let mut rules = AugRuleVec::new();
        rules.push(AugRule {
            left: START,
            right: vec![lookup[grammar.root()]],
            user: None,
        });
        for (idx, rule) in grammar.iter().enumerate() {
            rules.push(AugRule {
                left: lookup[rule.left()],
                right: rule.right().iter().map(|symbol| lookup[symbol]).collect(),
                user: Some(RuleIndex(idx)),
            });
        }

        let mut by_left = vec![Vec::new(); symbols.len() + 1];
        for (idx, rule) in rules.iter().enumerate() {
            by_left[rule.left.0].push(AugRuleIndex(idx));
        }

        Self {
            symbols,
            rules,
            by_left,
        }
    }

    pub(crate) fn symbol_count(&self) -> usize {
        self.symbols.len() + 1
    }

    /// All symbol indices in a stable enumeration order: the start symbol,
    /// then user symbols by first occurrence.
    pub(crate) fn symbol_indices(&self) -> impl Iterator<Item = SymbolIndex> {
        (0..self.symbol_count()).map(SymbolIndex)
    }

    pub(crate) fn is_terminal(&self, symbol: SymbolIndex) -> bool {
        self.by_left[symbol.0].is_empty()
    }

    pub(crate) fn rules(&self) -> impl Iterator<Item = &AugRule> + '_ {
        self.rules.iter()
    }

    pub(crate) fn rule(&self, index: AugRuleIndex) -> &AugRule {
        &self.rules[index]
    }

    pub(crate) fn rules_for(&self, symbol: SymbolIndex) -> &[AugRuleIndex] {
        &self.by_left[symbol.0]
    }

    /// The user symbol behind an index. Index 0 is the synthetic start
    /// symbol and is never resolved here.
    pub(crate) fn symbol(&self, index: SymbolIndex) -> &S {
        &self.symbols[index.0 - 1]
    }

    pub(crate) fn symbol_name(&self, index: SymbolIndex) -> String {
        if index == START {
            "<start>".to_string()
        } else {
            format!("{:?}", self.symbol(index))
        }
    }

    fn word_names(&self, word: &[SymbolIndex]) -> String {
        word.iter()
            .map(|&symbol| self.symbol_name(symbol))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn render_rule(&self, index: AugRuleIndex) -> String {
        let rule = &self.rules[index];
        if rule.right.is_empty() {
            format!("{} ::= <empty>", self.symbol_name(rule.left))
        } else {
            format!(
                "{} ::= {}",
                self.symbol_name(rule.left),
                self.word_names(&rule.right)
            )
        }
    }

    pub(crate) fn render_item(&self, item: &Item) -> String {
        let rule = &self.rules[item.rule];
        let mut out = vec![self.symbol_name(rule.left), "::=".to_string()];
        out.extend(rule.right.iter().map(|&symbol| self.symbol_name(symbol)));
        out.insert(item.dot + 2, ".".to_string());
        format!("{} [{}]", out.join(" "), self.word_names(&item.lookahead))
    }
}

/// A dotted rule with a lookahead string. Items are value-compared by
/// (rule, dot, lookahead).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Item {
    rule: AugRuleIndex,
    dot: usize,
    lookahead: TerminalString,
}

impl Item {
    fn new(rule: AugRuleIndex, dot: usize, lookahead: TerminalString) -> Self {
        Self {
            rule,
            dot,
            lookahead,
        }
    }

    /// The symbol right after the dot, if the item is not final.
    fn next_symbol<S: Symbol>(&self, aug: &Augmented<S>) -> Option<SymbolIndex> {
        aug.rule(self.rule).right.get(self.dot).copied()
    }

    /// FIRST_k of the tail after the dot's symbol concatenated with the
    /// item lookahead. These are the lookaheads of items added when the
    /// closure expands over the non-terminal after the dot.
    fn next_lookaheads<S: Symbol>(&self, aug: &Augmented<S>, first: &FirstSets) -> TerminalStrings {
        let rule = aug.rule(self.rule);
        let mut word = rule.right[self.dot + 1..].to_vec();
        word.extend_from_slice(&self.lookahead);
        first.first(&word)
    }

    /// FIRST_k of the tail from the dot on concatenated with the item
    /// lookahead. These key the shift entries of an item whose next symbol
    /// is a terminal.
    fn lookaheads<S: Symbol>(&self, aug: &Augmented<S>, first: &FirstSets) -> TerminalStrings {
        let rule = aug.rule(self.rule);
        let mut word = rule.right[self.dot..].to_vec();
        word.extend_from_slice(&self.lookahead);
        first.first(&word)
    }

    fn advanced(&self) -> Self {
        Self {
            rule: self.rule,
            dot: self.dot + 1,
            lookahead: self.lookahead.clone(),
        }
    }
}

/// A table entry for a `(state, lookahead)` pair, parameterized by the
/// rule index space: augmented rules during construction, user rules
/// after [`LRTable::bind`].
///
/// `Shift` doubles as the accept marker: reducing by the synthetic start
/// rule is recorded as a shift and resolved by the driver when the input
/// runs out in the accepting state. Keeping the two identical is what lets
/// an accepting state still shift, which any k = 0 grammar with a
/// continuing root relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action<R> {
    Shift,
    Reduce(R),
}

fn render_action<S: Symbol>(aug: &Augmented<S>, action: Action<AugRuleIndex>) -> String {
    match action {
        Action::Shift => "shift".to_string(),
        Action::Reduce(rule) => format!("reduce by '{}'", aug.render_rule(rule)),
    }
}

/// A state during construction: a closed item set with symbolic action and
/// goto tables.
#[derive(Debug)]
pub(crate) struct LRState {
    items: IndexSet<Item>,
    goto: IndexMap<SymbolIndex, StateIndex>,
    action: IndexMap<TerminalString, Action<AugRuleIndex>>,
}

impl LRState {
    fn new(items: IndexSet<Item>) -> Self {
        Self {
            items,
            goto: IndexMap::new(),
            action: IndexMap::new(),
        }
    }
}

/// Closes over an item list: for every non-terminal right after a dot,
/// initial items of all its rules are added under every admissible
/// lookahead. Membership is decided by set equality while the discovery
/// order is kept for stable iteration.
fn close<S: Symbol>(aug: &Augmented<S>, first: &FirstSets, seed: Vec<Item>) -> IndexSet<Item> {
    let mut items: IndexSet<Item> = seed.into_iter().collect();
    let mut idx = 0;
    while let Some(item) = items.get_index(idx).cloned() {
        if let Some(symbol) = item.next_symbol(aug) {
            if !aug.is_terminal(symbol) {
                for lookahead in item.next_lookaheads(aug, first) {
                    for &rule in aug.rules_for(symbol) {
                        items.insert(Item::new(rule, 0, lookahead.clone()));
                    }
                }
            }
        }
        idx += 1;
    }
    items
}

/// The goto set: items with `symbol` right after the dot, advanced by one
/// and closed. An empty result means there is no transition on `symbol`.
fn goto_items<S: Symbol>(
    aug: &Augmented<S>,
    first: &FirstSets,
    items: &IndexSet<Item>,
    symbol: SymbolIndex,
) -> IndexSet<Item> {
    let seed: Vec<Item> = items
        .iter()
        .filter(|item| item.next_symbol(aug) == Some(symbol))
        .map(Item::advanced)
        .collect();
    if seed.is_empty() {
        return IndexSet::new();
    }
    close(aug, first, seed)
}

#[allow(clippy::too_many_arguments)]
fn add_action<S: Symbol>(
    states: &mut StateVec<LRState>,
    state: StateIndex,
    lookahead: TerminalString,
    action: Action<AugRuleIndex>,
    item: &Item,
    aug: &Augmented<S>,
    k: usize,
    keep_states: bool,
) -> Result<()> {
    if let Some(&existing) = states[state].action.get(&lookahead) {
        if existing != action {
            let message = format!(
                "LR({}) table conflict: actions {}, {} trying to add {}",
                k,
                render_action(aug, existing),
                render_action(aug, action),
                aug.render_item(item),
            );
            return Err(Error::InvalidGrammar {
                message,
                states: keep_states.then(|| Box::new(StateGraph::new(aug, states))),
            });
        }
        return Ok(());
    }
    states[state].action.insert(lookahead, action);
    Ok(())
}

/// The LR(k) automaton before matcher binding.
#[derive(Debug)]
pub(crate) struct LRTable<S> {
    aug: Augmented<S>,
    states: StateVec<LRState>,
    accepting: StateIndex,
    graph: Option<Box<StateGraph>>,
}

impl<S: Symbol> LRTable<S> {
    /// Builds the canonical LR(k) collection for the grammar and fills the
    /// action and goto tables, detecting conflicts along the way.
    pub(crate) fn build<V, C>(
        grammar: &Grammar<S, V, C>,
        k: usize,
        keep_states: bool,
    ) -> Result<Self> {
        let aug = Augmented::new(grammar);
        let first = FirstSets::new(&aug, k);

        let mut states = StateVec::new();
        states.push(LRState::new(close(
            &aug,
            &first,
            vec![Item::new(AugRuleIndex(0), 0, TerminalString::new())],
        )));

        // Expand the collection by growing state index. States are
        // deduplicated by item-set equality, so indices are stable within a
        // build.
        let mut idx = 0;
        while idx < states.len() {
            for symbol in aug.symbol_indices() {
                let items = goto_items(&aug, &first, &states[StateIndex(idx)].items, symbol);
                if items.is_empty() {
                    continue;
                }
                let target = match states.iter().position(|state| state.items == items) {
                    Some(existing) => StateIndex(existing),
                    None => {
                        states.push(LRState::new(items));
                        StateIndex(states.len() - 1)
                    }
                };
                states[StateIndex(idx)].goto.insert(symbol, target);
            }
            idx += 1;
        }
        log!(
            "{} {}",
            "States in the LR(k) collection:".green(),
            states.len()
        );

        // Fill the action tables. A final item of the synthetic rule marks
        // the accepting state; a non-terminal after the dot contributes
        // nothing here since the goto table handles it at shift time.
        let mut accepting = None;
        for state in 0..states.len() {
            let state = StateIndex(state);
            let items: Vec<Item> = states[state].items.iter().cloned().collect();
            for item in &items {
                match item.next_symbol(&aug) {
                    None => {
                        let action = if aug.rule(item.rule).left == START {
                            accepting = Some(state);
                            Action::Shift
                        } else {
                            Action::Reduce(item.rule)
                        };
                        add_action(
                            &mut states,
                            state,
                            item.lookahead.clone(),
                            action,
                            item,
                            &aug,
                            k,
                            keep_states,
                        )?;
                    }
                    Some(symbol) if aug.is_terminal(symbol) => {
                        for lookahead in item.lookaheads(&aug, &first) {
                            add_action(
                                &mut states,
                                state,
                                lookahead,
                                Action::Shift,
                                item,
                                &aug,
                                k,
                                keep_states,
                            )?;
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        let accepting =
            accepting.expect("LR(k) construction did not produce an accepting state");
        let graph = keep_states.then(|| Box::new(StateGraph::new(&aug, &states)));

        Ok(Self {
            aug,
            states,
            accepting,
            graph,
        })
    }

    /// Rewrites symbolic lookaheads into executable predicates: the user
    /// matcher where one is registered for the symbol, equality to the
    /// symbol otherwise. Goto entries of matched symbols move into the
    /// ordered matcher list; the rest stay keyed for exact lookup. Reduce
    /// entries are re-pointed at the user grammar.
    pub(crate) fn bind(
        self,
        matchers: &Matchers<S>,
    ) -> (StateVec<State<S>>, StateIndex, Option<Box<StateGraph>>) {
        let LRTable {
            aug,
            states,
            accepting,
            graph,
        } = self;

        let states = states
            .into_iter()
            .map(|state| {
                let action_match = state
                    .action
                    .iter()
                    .map(|(lookahead, &action)| {
                        let predicates = lookahead
                            .iter()
                            .map(|&idx| {
                                let symbol = aug.symbol(idx);
                                match matchers.get(symbol) {
                                    Some(matcher) => matcher.clone(),
                                    None => symbol_matcher(symbol.clone()),
                                }
                            })
                            .collect();
                        let action = match action {
                            Action::Reduce(rule) => Action::Reduce(
                                aug.rule(rule)
                                    .user
                                    .expect("reduce entries never point at the synthetic rule"),
                            ),
                            Action::Shift => Action::Shift,
                        };
                        (predicates, action)
                    })
                    .collect();

                let mut goto = IndexMap::new();
                let mut goto_match = Vec::new();
                for (&idx, &target) in state.goto.iter() {
                    let symbol = aug.symbol(idx).clone();
                    match matchers.get(&symbol) {
                        Some(matcher) => goto_match.push((matcher.clone(), target)),
                        None => {
                            goto.insert(symbol, target);
                        }
                    }
                }

                State {
                    action_match,
                    goto,
                    goto_match,
                }
            })
            .collect();

        (states, accepting, graph)
    }
}

/// A runtime state after matcher binding. Reduce entries in `action_match`
/// index the user grammar.
pub(crate) struct State<S> {
    action_match: Vec<(Vec<Matcher<S>>, Action<RuleIndex>)>,
    goto: IndexMap<S, StateIndex>,
    goto_match: Vec<(Matcher<S>, StateIndex)>,
}

impl<S: Symbol> State<S> {
    /// The first action whose predicate vector has the key's length and
    /// accepts it elementwise.
    pub(crate) fn action(&self, key: &[S]) -> Result<Action<RuleIndex>> {
        for (predicates, action) in &self.action_match {
            if predicates.len() != key.len() {
                continue;
            }
            if predicates
                .iter()
                .zip(key)
                .all(|(matcher, value)| matcher(value))
            {
                return Ok(*action);
            }
        }
        Err(Error::Parsing(format!("Unexpected input token: {key:?}")))
    }

    /// The next state on `symbol`: an exact hit in the goto table wins,
    /// matcher entries are scanned in order otherwise.
    pub(crate) fn next_state(&self, symbol: &S) -> Result<StateIndex> {
        if let Some(&target) = self.goto.get(symbol) {
            return Ok(target);
        }
        for (matcher, target) in &self.goto_match {
            if matcher(symbol) {
                return Ok(*target);
            }
        }
        Err(Error::Parsing(format!(
            "Unexpected input token: {symbol:?}"
        )))
    }
}

/// One state of the retained automaton: its index and rendered items.
#[derive(Debug, Clone)]
pub struct StateNode {
    pub index: usize,
    pub items: Vec<String>,
}

impl fmt::Display for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state {}", self.index)?;
        for item in &self.items {
            write!(f, "\n{item}")?;
        }
        Ok(())
    }
}

/// A renderable snapshot of the item-set automaton: states as nodes, goto
/// transitions as edges labelled by symbol. Attached to conflict errors
/// and retained by the parser when state retention is requested.
#[derive(Debug, Clone)]
pub struct StateGraph {
    graph: DiGraph<StateNode, String>,
}

impl StateGraph {
    fn new<S: Symbol>(aug: &Augmented<S>, states: &StateVec<LRState>) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<_> = states
            .iter()
            .enumerate()
            .map(|(idx, state)| {
                graph.add_node(StateNode {
                    index: idx,
                    items: state
                        .items
                        .iter()
                        .map(|item| aug.render_item(item))
                        .collect(),
                })
            })
            .collect();
        for (idx, state) in states.iter().enumerate() {
            for (&symbol, &target) in state.goto.iter() {
                graph.add_edge(nodes[idx], nodes[target.0], aug.symbol_name(symbol));
            }
        }
        Self { graph }
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn states(&self) -> impl Iterator<Item = &StateNode> + '_ {
        self.graph.node_weights()
    }

    /// Graphviz rendering of the automaton for conflict inspection.
    pub fn dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}
