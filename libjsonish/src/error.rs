//! Error types for manifest parsing.

use crate::scanner::State;
use thiserror::Error;

/// Result type for manifest parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse context carrying filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a source suffix for error messages.
    pub fn file_suffix(&self) -> String {
        match &self.filename {
            Some(name) => format!(" of <{}>", name),
            None => String::new(),
        }
    }
}

/// Error type for manifest parsing.
///
/// Every error identifies the machine state that rejected the input. Lines
/// are 0-based; offsets count characters from the start of the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A character was encountered that is illegal for the current state.
    #[error("{state} - {message} at line {line} offset {offset} with character '{character}'{file}")]
    Structural {
        state: State,
        message: String,
        character: char,
        line: usize,
        offset: usize,
        file: String,
    },

    /// Input was exhausted while a construct was still open.
    #[error("{state} - {message}{file}")]
    UnexpectedEnd {
        state: State,
        message: String,
        file: String,
    },
}

impl ParseError {
    /// The machine state active when the error was raised.
    pub fn state(&self) -> State {
        match self {
            ParseError::Structural { state, .. } => *state,
            ParseError::UnexpectedEnd { state, .. } => *state,
        }
    }
}
