//! Core quiz library shared by the backend.
//!
//! Provides:
//! - Multiple-choice quiz set generation from a vocabulary pool
//! - The `ItemStore` abstraction the generator resolves items through
//! - Answer checking for generated sets
//! - Parser for vocabulary import files
//! - Shared types (VocabularyItem, GeneratedQuestion, etc.)

pub mod error;
pub mod generator;
pub mod parser;
pub mod scoring;
pub mod store;
pub mod types;

pub use error::{ImportError, QuizError, Result};
pub use generator::{
    generate, generate_from_candidates, generate_from_store, generate_with_rng,
    DEFAULT_OPTIONS_PER_QUESTION,
};
pub use parser::parse;
pub use scoring::score;
pub use store::{ItemPool, ItemStore};
pub use types::{
    AnswerReveal, CheckedQuestion, GeneratedQuestion, GeneratedQuizSet, QuestionView, QuizResult,
    RawItem, SubmittedAnswer, VocabularyItem,
};
