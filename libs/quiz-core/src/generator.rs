//! Multiple-choice quiz set generation.
//!
//! Questions are drawn uniformly without replacement from the candidate
//! pool. Each question's distractors are drawn from the same pool with the
//! question's own item removed beforehand, so no retry loop is needed and the
//! correct item can never appear twice among the choices.

use std::collections::HashSet;

use chrono::Utc;
use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::error::{QuizError, Result};
use crate::store::{ItemPool, ItemStore};
use crate::types::{GeneratedQuestion, GeneratedQuizSet, VocabularyItem};

/// Number of choices shown per question unless configured otherwise.
pub const DEFAULT_OPTIONS_PER_QUESTION: usize = 4;

/// Generate a quiz set using the thread-local RNG.
pub fn generate(
    pool: &[VocabularyItem],
    question_count: usize,
    options_per_question: usize,
) -> Result<GeneratedQuizSet> {
    generate_with_rng(&mut rand::rng(), pool, question_count, options_per_question)
}

/// Generate a quiz set with a caller-supplied RNG.
///
/// # Errors
/// * [`QuizError::InvalidRequest`] if the pool holds duplicate ids, or is
///   too small for `question_count` or `options_per_question`.
pub fn generate_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[VocabularyItem],
    question_count: usize,
    options_per_question: usize,
) -> Result<GeneratedQuizSet> {
    let store = ItemPool::new(pool.to_vec())?;
    let candidate_ids: Vec<i64> = pool.iter().map(|item| item.id).collect();
    generate_from_store(
        rng,
        &store,
        &candidate_ids,
        question_count,
        options_per_question,
    )
}

/// Generate a quiz set from a subset of a store using the thread-local RNG.
pub fn generate_from_candidates<S: ItemStore + ?Sized>(
    store: &S,
    candidate_ids: &[i64],
    question_count: usize,
    options_per_question: usize,
) -> Result<GeneratedQuizSet> {
    generate_from_store(
        &mut rand::rng(),
        store,
        candidate_ids,
        question_count,
        options_per_question,
    )
}

/// Generate a quiz set from candidate ids resolved through an [`ItemStore`].
///
/// Both questions and distractors are drawn from `candidate_ids` only.
///
/// # Errors
/// * [`QuizError::InvalidRequest`] on duplicate candidate ids, more candidates
///   than the store holds, or unsatisfiable counts; checked before any sampling.
/// * [`QuizError::ItemLookupFailure`] if a sampled id is missing from `store`.
pub fn generate_from_store<S, R>(
    rng: &mut R,
    store: &S,
    candidate_ids: &[i64],
    question_count: usize,
    options_per_question: usize,
) -> Result<GeneratedQuizSet>
where
    S: ItemStore + ?Sized,
    R: Rng + ?Sized,
{
    if candidate_ids.len() > store.count() {
        return Err(QuizError::InvalidRequest(format!(
            "{} candidate ids given but the item store holds only {} items",
            candidate_ids.len(),
            store.count()
        )));
    }
    validate_request(candidate_ids, question_count, options_per_question)?;

    let selected = index::sample(rng, candidate_ids.len(), question_count);

    let mut questions = Vec::with_capacity(question_count);
    for (position, candidate) in selected.iter().enumerate() {
        let question = build_question(
            rng,
            store,
            candidate_ids,
            candidate_ids[candidate],
            position + 1,
            options_per_question,
        )?;
        questions.push(question);
    }

    Ok(GeneratedQuizSet {
        options_per_question,
        questions,
        created_at: Utc::now(),
    })
}

fn validate_request(
    candidate_ids: &[i64],
    question_count: usize,
    options_per_question: usize,
) -> Result<()> {
    let available = candidate_ids.len();

    if question_count == 0 {
        return Err(QuizError::InvalidRequest(
            "question count must be at least 1".to_string(),
        ));
    }
    if question_count > available {
        return Err(QuizError::InvalidRequest(format!(
            "not enough items in pool: {} questions requested but only {} items available",
            question_count, available
        )));
    }
    if options_per_question < 2 {
        return Err(QuizError::InvalidRequest(
            "options per question must be at least 2".to_string(),
        ));
    }
    if options_per_question > available {
        return Err(QuizError::InvalidRequest(format!(
            "not enough items in pool: {} options per question requested but only {} items available",
            options_per_question, available
        )));
    }

    let mut seen = HashSet::with_capacity(available);
    if let Some(dup) = candidate_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(QuizError::InvalidRequest(format!(
            "duplicate item id {} in pool",
            dup
        )));
    }

    Ok(())
}

fn build_question<S, R>(
    rng: &mut R,
    store: &S,
    candidate_ids: &[i64],
    source_id: i64,
    question_index: usize,
    options_per_question: usize,
) -> Result<GeneratedQuestion>
where
    S: ItemStore + ?Sized,
    R: Rng + ?Sized,
{
    let source = lookup(store, source_id)?;

    let eligible: Vec<i64> = candidate_ids
        .iter()
        .copied()
        .filter(|&id| id != source_id)
        .collect();

    let mut choice_item_ids: Vec<i64> =
        index::sample(rng, eligible.len(), options_per_question - 1)
            .iter()
            .map(|position| eligible[position])
            .collect();
    choice_item_ids.shuffle(rng);

    let correct_choice_index = rng.random_range(0..options_per_question);
    choice_item_ids.insert(correct_choice_index, source.id);

    let choices = choice_item_ids
        .iter()
        .map(|&id| lookup(store, id).map(|item| item.answer_text.clone()))
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneratedQuestion {
        question_index,
        source_item_id: source.id,
        prompt_text: source.prompt_text.clone(),
        choices,
        choice_item_ids,
        correct_choice_index,
    })
}

fn lookup<S: ItemStore + ?Sized>(store: &S, id: i64) -> Result<&VocabularyItem> {
    store
        .get_by_id(id)
        .ok_or(QuizError::ItemLookupFailure { id })
}
