//! Error types for loopcomp

use thiserror::Error;

/// Main error type for loopcomp
///
/// Only failures of the surrounding plumbing land here. A loop that cannot
/// be converted is not an error; see [`crate::convert::Declined`].
#[derive(Debug, Error)]
pub enum LoopCompError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LoopCompError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        LoopCompError::ParseError {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoopCompError>;
