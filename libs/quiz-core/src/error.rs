//! Error types for quiz-core.

use thiserror::Error;

/// Result type alias using QuizError.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Errors raised while generating or checking a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("item {id} could not be resolved from the item store")]
    ItemLookupFailure { id: i64 },
}

/// Errors that can occur while parsing an item import file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("missing prompt at line {line}")]
    MissingPrompt { line: usize },

    #[error("missing answer at line {line}")]
    MissingAnswer { line: usize },

    #[error("missing grade at line {line}")]
    MissingGrade { line: usize },

    #[error("invalid grade at line {line}: {value}")]
    InvalidGrade { line: usize, value: String },

    #[error("unexpected text at line {line}: {value}")]
    UnexpectedText { line: usize, value: String },

    #[error("duplicate {field} at line {line}")]
    DuplicateField { line: usize, field: &'static str },
}
