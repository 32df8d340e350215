//! Answer checking for generated quiz sets.

use std::collections::HashMap;

use crate::error::{QuizError, Result};
use crate::types::{CheckedQuestion, GeneratedQuizSet, QuizResult, SubmittedAnswer};

/// Check submitted answers against a quiz set.
///
/// Questions without an answer are reported as incorrect. A later answer for
/// the same question replaces an earlier one.
pub fn score(set: &GeneratedQuizSet, answers: &[SubmittedAnswer]) -> Result<QuizResult> {
    let mut by_question: HashMap<usize, SubmittedAnswer> = HashMap::with_capacity(answers.len());

    for answer in answers {
        let question = set.question(answer.question_number).ok_or_else(|| {
            QuizError::InvalidRequest(format!(
                "question {} does not exist in this quiz",
                answer.question_number
            ))
        })?;
        if answer.user_answer >= question.choices.len() {
            return Err(QuizError::InvalidRequest(format!(
                "answer {} is out of range for question {}",
                answer.user_answer, answer.question_number
            )));
        }
        by_question.insert(answer.question_number, *answer);
    }

    let items: Vec<CheckedQuestion> = set
        .questions
        .iter()
        .map(|question| {
            let answer = by_question.get(&question.question_index);
            CheckedQuestion {
                question_number: question.question_index,
                choices: question.choices.clone(),
                user_answer: answer.map(|a| a.user_answer),
                correct_answer: question.correct_choice_index,
                answer_time: answer.map(|a| a.answer_time),
                is_correct: answer
                    .map(|a| a.user_answer == question.correct_choice_index)
                    .unwrap_or(false),
            }
        })
        .collect();

    Ok(QuizResult {
        correct_count: items.iter().filter(|i| i.is_correct).count(),
        answered_count: items.iter().filter(|i| i.user_answer.is_some()).count(),
        total_count: items.len(),
        total_answer_time: items
            .iter()
            .filter_map(|i| i.answer_time)
            .map(u64::from)
            .sum(),
        items,
    })
}
