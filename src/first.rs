//! FIRST_k sets: for a string of grammar symbols, the set of terminal
//! prefixes of length at most `k` derivable from it.

use std::collections::BTreeSet;

use crate::grammar::Symbol;
use crate::index::{SymbolIndex, SymbolVec};
use crate::table::Augmented;

/// A string of terminal symbols of length at most `k`. The empty string is
/// a valid value.
pub(crate) type TerminalString = Vec<SymbolIndex>;

/// A set of terminal strings with deterministic iteration order.
pub(crate) type TerminalStrings = BTreeSet<TerminalString>;

/// The FIRST_k table of an augmented grammar.
///
/// One set per grammar symbol: a terminal holds its own k-truncated
/// singleton, a non-terminal holds the union over its rules. Non-terminal
/// sets are grown to a fixed point; each set only ever grows and is bounded
/// by the number of terminal strings of length at most `k`, so the
/// iteration terminates even on left-recursive grammars.
pub(crate) struct FirstSets {
    k: usize,
    sets: SymbolVec<TerminalStrings>,
}

impl FirstSets {
    pub(crate) fn new<S: Symbol>(aug: &Augmented<S>, k: usize) -> Self {
        let mut sets = SymbolVec::new();
        for symbol in aug.symbol_indices() {
            let mut set = TerminalStrings::new();
            if aug.is_terminal(symbol) {
                set.insert(truncate(vec![symbol], k));
            }
            sets.push(set);
        }

        let mut additions = true;
        while additions {
            additions = false;
            for rule in aug.rules() {
                let firsts = first_in(&sets, k, rule.right());
                let set = &mut sets[rule.left()];
                let before = set.len();
                set.extend(firsts);
                if set.len() > before {
                    additions = true;
                }
            }
        }

        Self { k, sets }
    }

    /// FIRST_k of an arbitrary string of grammar symbols.
    ///
    /// An unproductive non-terminal anywhere in the string makes the result
    /// empty; this is not an error.
    pub(crate) fn first(&self, word: &[SymbolIndex]) -> TerminalStrings {
        first_in(&self.sets, self.k, word)
    }
}

/// FIRST_k of a symbol string as the k-truncated product of the per-symbol
/// sets, left to right.
fn first_in(
    sets: &SymbolVec<TerminalStrings>,
    k: usize,
    word: &[SymbolIndex],
) -> TerminalStrings {
    let mut result = TerminalStrings::new();
    result.insert(TerminalString::new());
    for &symbol in word {
        if result.is_empty() {
            break;
        }
        let mut grown = TerminalStrings::new();
        for prefix in &result {
            for suffix in sets[symbol].iter() {
                grown.insert(concat(prefix, suffix, k));
            }
        }
        result = grown;
    }
    result
}

fn concat(prefix: &[SymbolIndex], suffix: &[SymbolIndex], k: usize) -> TerminalString {
    prefix.iter().chain(suffix.iter()).take(k).copied().collect()
}

fn truncate(mut string: TerminalString, k: usize) -> TerminalString {
    string.truncate(k);
    string
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, Rule};

    fn grammar(rules: Vec<(&'static str, Vec<&'static str>)>) -> Grammar<&'static str, (), ()> {
        Grammar::new(
            rules
                .into_iter()
                .map(|(left, right)| Rule::new(left, right, |_, _| ()))
                .collect(),
        )
        .unwrap()
    }

    fn expression_grammar() -> Grammar<&'static str, (), ()> {
        grammar(vec![
            ("E", vec!["T", "Ep"]),
            ("Ep", vec!["+", "T", "Ep"]),
            ("Ep", vec![]),
            ("T", vec!["F", "Tp"]),
            ("Tp", vec!["*", "F", "Tp"]),
            ("Tp", vec![]),
            ("F", vec!["(", "E", ")"]),
            ("F", vec!["id"]),
        ])
    }

    fn sym(aug: &Augmented<&'static str>, name: &'static str) -> SymbolIndex {
        aug.symbol_indices()
            .skip(1)
            .find(|&idx| *aug.symbol(idx) == name)
            .unwrap()
    }

    fn names(
        aug: &Augmented<&'static str>,
        strings: &TerminalStrings,
    ) -> BTreeSet<Vec<&'static str>> {
        strings
            .iter()
            .map(|s| s.iter().map(|&idx| *aug.symbol(idx)).collect())
            .collect()
    }

    fn expect(strings: &[&[&'static str]]) -> BTreeSet<Vec<&'static str>> {
        strings.iter().map(|s| s.to_vec()).collect()
    }

    #[test]
    fn first_of_terminal_is_the_terminal() {
        let grammar = expression_grammar();
        let aug = Augmented::new(&grammar);
        let first = FirstSets::new(&aug, 1);
        assert_eq!(
            names(&aug, &first.first(&[sym(&aug, "id")])),
            expect(&[&["id"]])
        );
    }

    #[test]
    fn first_1_of_expression_grammar() {
        let grammar = expression_grammar();
        let aug = Augmented::new(&grammar);
        let first = FirstSets::new(&aug, 1);

        for nonterm in ["E", "T", "F"] {
            assert_eq!(
                names(&aug, &first.first(&[sym(&aug, nonterm)])),
                expect(&[&["("], &["id"]]),
                "FIRST_1({nonterm})"
            );
        }
        assert_eq!(
            names(&aug, &first.first(&[sym(&aug, "Ep")])),
            expect(&[&[], &["+"]])
        );
        assert_eq!(
            names(&aug, &first.first(&[sym(&aug, "Tp")])),
            expect(&[&[], &["*"]])
        );
    }

    #[test]
    fn first_of_empty_string_is_epsilon() {
        let grammar = expression_grammar();
        let aug = Augmented::new(&grammar);
        let first = FirstSets::new(&aug, 1);
        assert_eq!(names(&aug, &first.first(&[])), expect(&[&[]]));
    }

    #[test]
    fn strings_longer_than_one() {
        // S derives b, ab, aab, ...; truncated to length 2.
        let grammar = grammar(vec![("S", vec!["a", "S"]), ("S", vec!["b"])]);
        let aug = Augmented::new(&grammar);
        let first = FirstSets::new(&aug, 2);
        assert_eq!(
            names(&aug, &first.first(&[sym(&aug, "S")])),
            expect(&[&["b"], &["a", "b"], &["a", "a"]])
        );
    }

    #[test]
    fn left_recursion_converges() {
        // L derives the empty string, x, xx, ...
        let grammar = grammar(vec![("L", vec![]), ("L", vec!["L", "x"])]);
        let aug = Augmented::new(&grammar);
        let first = FirstSets::new(&aug, 2);
        assert_eq!(
            names(&aug, &first.first(&[sym(&aug, "L")])),
            expect(&[&[], &["x"], &["x", "x"]])
        );
    }

    #[test]
    fn k_zero_collapses_to_epsilon() {
        let grammar = expression_grammar();
        let aug = Augmented::new(&grammar);
        let first = FirstSets::new(&aug, 0);
        assert_eq!(
            names(&aug, &first.first(&[sym(&aug, "E"), sym(&aug, "id")])),
            expect(&[&[]])
        );
    }

    #[test]
    fn unproductive_nonterminal_has_empty_first() {
        let grammar = grammar(vec![("S", vec!["U"]), ("U", vec!["U", "x"])]);
        let aug = Augmented::new(&grammar);
        let first = FirstSets::new(&aug, 1);
        assert!(first.first(&[sym(&aug, "U")]).is_empty());
        assert!(first.first(&[sym(&aug, "S")]).is_empty());
        assert!(first
            .first(&[sym(&aug, "U"), sym(&aug, "x")])
            .is_empty());
    }
}
