//! Runtime LR(k) parsing.
//!
//! The crate builds canonical LR(k) tables for a context-free grammar at
//! run time and drives a shift-reduce parse over arbitrary token
//! iterators. Lookaheads are bound to pluggable terminal matchers, and
//! user-supplied semantic actions run on every reduction, so a parse
//! produces whatever value the actions build.
//!
//! Construction fails with [`Error::InvalidGrammar`] when the grammar is
//! not LR(k) for the chosen `k`; parsing fails with [`Error::Parsing`] at
//! the first offending lookahead. There is no grammar description
//! language, lexer or code generation here: grammars are plain values and
//! the tables are used directly.

pub mod debug;
pub mod error;
pub mod grammar;
pub mod matcher;
pub mod parser;

mod first;
mod index;
mod table;

pub use error::{Error, Result};
pub use grammar::{Grammar, Rule, SemanticAction, Symbol};
pub use matcher::{default_matchers, Matcher, Matchers};
pub use parser::{Lexeme, ParseOptions, Parser, Settings};
pub use table::{StateGraph, StateNode};
