//! Crate-level error and result types.

use std::fmt;

use crate::table::StateGraph;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported at the crate boundary.
#[derive(Debug)]
pub enum Error {
    /// The grammar is empty or is not LR(k) for the requested `k`.
    InvalidGrammar {
        message: String,
        /// The item-set automaton built up to the failure. Present when
        /// state retention was requested through
        /// [`Settings::keep_states`](crate::parser::Settings::keep_states).
        states: Option<Box<StateGraph>>,
    },
    /// The input is not a sentence of the grammar.
    Parsing(String),
}

impl Error {
    pub(crate) fn invalid_grammar<T: Into<String>>(message: T) -> Self {
        Error::InvalidGrammar {
            message: message.into(),
            states: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidGrammar { message, .. } => write!(f, "{message}"),
            Error::Parsing(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Error {}
