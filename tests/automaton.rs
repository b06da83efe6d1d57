//! Inspection of the retained item-set automaton.

use lrk::{Error, Grammar, Parser, Rule, Settings};

fn rule(left: &'static str, right: Vec<&'static str>) -> Rule<&'static str, (), ()> {
    Rule::new(left, right, |_, _| ())
}

#[test]
fn retained_states_are_exposed_by_the_parser() {
    let grammar = Grammar::new(vec![
        rule("list", vec![]),
        rule("list", vec!["list", "item"]),
    ])
    .unwrap();
    let parser = Parser::with_settings(grammar, 0, Settings::new().keep_states(true)).unwrap();

    let graph = parser.state_graph().expect("states were retained");
    assert_eq!(graph.state_count(), 3);

    // The start state closes over both list rules.
    let start = graph.states().find(|node| node.index == 0).unwrap();
    assert_eq!(start.items.len(), 3);
    assert!(start
        .items
        .iter()
        .any(|item| item.contains("<start>")), "{:?}", start.items);
}

#[test]
fn states_are_dropped_by_default() {
    let grammar = Grammar::new(vec![
        rule("list", vec![]),
        rule("list", vec!["list", "item"]),
    ])
    .unwrap();
    let parser = Parser::new(grammar, 0).unwrap();
    assert!(parser.state_graph().is_none());
}

#[test]
fn conflict_errors_carry_the_automaton() {
    let grammar = Grammar::new(vec![
        rule("list", vec![]),
        rule("list", vec!["item", "list"]),
    ])
    .unwrap();
    let err =
        Parser::with_settings(grammar, 0, Settings::new().keep_states(true)).unwrap_err();

    match err {
        Error::InvalidGrammar { message, states } => {
            assert!(message.starts_with("LR(0) table conflict"), "{message}");
            let graph = states.expect("states were retained");
            assert!(graph.state_count() > 0);
            let dot = graph.dot();
            assert!(dot.starts_with("digraph"), "{dot}");
            assert!(dot.contains("::="), "{dot}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn grammar_stays_readable_through_the_parser() {
    let grammar = Grammar::new(vec![
        rule("list", vec![]),
        rule("list", vec!["list", "item"]),
    ])
    .unwrap();
    let parser = Parser::new(grammar, 0).unwrap();
    assert_eq!(
        parser.grammar().to_string(),
        "\"list\" ::= <empty>\n\"list\" ::= \"list\" \"item\""
    );
    assert_eq!(parser.k(), 0);
}
