//! Core types for vocabulary quizzes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single word/translation pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: i64,
    /// Text shown as the question (e.g. the English word).
    pub prompt_text: String,
    /// Text that is the correct answer (e.g. the translation).
    pub answer_text: String,
    /// Grade used to narrow the candidate pool before generation.
    pub difficulty: i32,
}

impl VocabularyItem {
    pub fn new(
        id: i64,
        prompt_text: impl Into<String>,
        answer_text: impl Into<String>,
        difficulty: i32,
    ) -> Self {
        Self {
            id,
            prompt_text: prompt_text.into(),
            answer_text: answer_text.into(),
            difficulty,
        }
    }
}

/// One multiple-choice question derived from a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    /// 1-based position within the quiz set.
    pub question_index: usize,
    pub source_item_id: i64,
    pub prompt_text: String,
    pub choices: Vec<String>,
    /// Item id behind each entry of `choices`, in the same order.
    pub choice_item_ids: Vec<i64>,
    /// 0-based position of the correct answer in `choices`.
    pub correct_choice_index: usize,
}

impl GeneratedQuestion {
    /// The text of the correct choice.
    pub fn correct_choice(&self) -> &str {
        &self.choices[self.correct_choice_index]
    }

    /// Ids of the items used as wrong answers.
    pub fn distractor_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.choice_item_ids
            .iter()
            .enumerate()
            .filter(move |(idx, _)| *idx != self.correct_choice_index)
            .map(|(_, id)| *id)
    }

    /// The question without its answer, for the question phase.
    pub fn to_view(&self) -> QuestionView {
        QuestionView {
            question_number: self.question_index,
            prompt: self.prompt_text.clone(),
            choices: self.choices.clone(),
        }
    }

    /// The answer for the reveal phase.
    pub fn to_reveal(&self) -> AnswerReveal {
        AnswerReveal {
            question_number: self.question_index,
            correct_answer: self.correct_choice_index,
            answer_text: self.correct_choice().to_string(),
        }
    }
}

/// An ordered set of questions produced by one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuizSet {
    pub options_per_question: usize,
    pub questions: Vec<GeneratedQuestion>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedQuizSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by its 1-based number.
    pub fn question(&self, question_number: usize) -> Option<&GeneratedQuestion> {
        question_number
            .checked_sub(1)
            .and_then(|idx| self.questions.get(idx))
    }
}

/// What the user sees while answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub question_number: usize,
    pub prompt: String,
    pub choices: Vec<String>,
}

/// Revealed answer for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReveal {
    pub question_number: usize,
    pub correct_answer: usize,
    pub answer_text: String,
}

/// A user's answer to one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_number: usize,
    /// 0-based index into the question's choices.
    pub user_answer: usize,
    /// Time spent on the question in milliseconds.
    pub answer_time: u32,
}

/// A question after checking the user's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedQuestion {
    pub question_number: usize,
    pub choices: Vec<String>,
    pub user_answer: Option<usize>,
    pub correct_answer: usize,
    pub answer_time: Option<u32>,
    pub is_correct: bool,
}

/// Outcome of checking a whole quiz set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub items: Vec<CheckedQuestion>,
    pub correct_count: usize,
    pub answered_count: usize,
    pub total_count: usize,
    pub total_answer_time: u64,
}

/// Item parsed from an import file (no id assigned yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub prompt_text: String,
    pub answer_text: String,
    pub difficulty: i32,
    pub line_number: usize,
}
