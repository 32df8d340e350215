//! Quiz lifecycle: pool selection, generation, persistence and caching.

use quiz_core::{GeneratedQuizSet, ItemPool, ItemStore, QuizResult, SubmittedAnswer};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{CreateQuizRequest, DbQuiz, DbQuizItem, QuizType};
use crate::AppState;

/// Resolved generation parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizParams {
    pub question_count: usize,
    pub options_per_question: usize,
}

/// Fill omitted counts from configured defaults.
///
/// An omitted question count is capped at the pool size so small pools still
/// produce a quiz; an explicit count is passed through untouched.
pub fn resolve_params(
    request: &CreateQuizRequest,
    pool_len: usize,
    default_question_count: usize,
    default_options_per_question: usize,
) -> Result<QuizParams> {
    if pool_len == 0 {
        return Err(ApiError::BadRequest(
            "not enough items in pool: the selected pool is empty".to_string(),
        ));
    }

    Ok(QuizParams {
        question_count: request
            .question_count
            .unwrap_or_else(|| default_question_count.min(pool_len)),
        options_per_question: request
            .options_per_question
            .unwrap_or(default_options_per_question),
    })
}

/// Candidate ids drawn from an item store.
struct CandidatePool {
    quiz_type: QuizType,
    store: ItemPool,
    candidate_ids: Vec<i64>,
}

/// Load the candidate pool: deck items, else a grade, else everything.
async fn select_pool(
    state: &AppState,
    user_id: i64,
    request: &CreateQuizRequest,
) -> Result<CandidatePool> {
    let (quiz_type, rows) = match (request.deck_id, request.grade) {
        (Some(deck_id), _) => {
            state
                .db
                .get_deck(user_id, deck_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Deck {}", deck_id)))?;
            (QuizType::Deck, state.db.get_deck_items(deck_id).await?)
        }
        (None, Some(_)) => (QuizType::Grade, state.db.search_items(None, None).await?),
        (None, None) => (QuizType::All, state.db.search_items(None, None).await?),
    };

    let store = ItemPool::new(rows.iter().map(|row| row.to_vocabulary_item()).collect())?;
    let candidate_ids = match (quiz_type, request.grade) {
        (QuizType::Grade, Some(grade)) => store
            .filter_by_grade(grade)
            .iter()
            .map(|item| item.id)
            .collect(),
        _ => store.items().iter().map(|item| item.id).collect(),
    };

    Ok(CandidatePool {
        quiz_type,
        store,
        candidate_ids,
    })
}

/// Generate, persist and cache a new quiz for `user_id`.
pub async fn create_quiz(
    state: &AppState,
    user_id: i64,
    request: &CreateQuizRequest,
) -> Result<(Uuid, GeneratedQuizSet)> {
    let pool = select_pool(state, user_id, request).await?;
    let params = resolve_params(
        request,
        pool.candidate_ids.len(),
        state.config.default_question_count,
        state.config.default_options_per_question,
    )?;

    let set = quiz_core::generate_from_candidates(
        &pool.store,
        &pool.candidate_ids,
        params.question_count,
        params.options_per_question,
    )?;

    let quiz_id = Uuid::new_v4();
    state
        .db
        .insert_quiz(
            quiz_id,
            user_id,
            request.deck_id,
            request.grade,
            pool.quiz_type,
            &set,
        )
        .await?;

    if let Err(e) = state.cache.put(quiz_id, &set).await {
        tracing::warn!("Failed to cache quiz {}: {}", quiz_id, e);
    }

    tracing::info!(
        %quiz_id,
        user_id,
        quiz_type = pool.quiz_type.as_str(),
        questions = set.len(),
        pool_size = pool.candidate_ids.len(),
        store_size = pool.store.count(),
        "Generated quiz"
    );

    Ok((quiz_id, set))
}

/// Fetch a quiz set, falling back to the database on a cache miss.
pub async fn load_quiz_set(
    state: &AppState,
    user_id: i64,
    quiz_id: Uuid,
) -> Result<GeneratedQuizSet> {
    let quiz = get_owned_quiz(state, user_id, quiz_id).await?;

    match state.cache.get(quiz_id).await {
        Ok(Some(set)) => return Ok(set),
        Ok(None) => tracing::debug!("Quiz {} not cached, rebuilding", quiz_id),
        Err(e) => tracing::warn!("Quiz cache read failed for {}: {}", quiz_id, e),
    }

    let rows = state.db.get_quiz_items(quiz_id).await?;
    let set = rebuild_set(&quiz, &rows)?;

    if let Err(e) = state.cache.put(quiz_id, &set).await {
        tracing::warn!("Failed to re-cache quiz {}: {}", quiz_id, e);
    }

    Ok(set)
}

/// Record answers and score the quiz against everything stored so far.
pub async fn submit_answers(
    state: &AppState,
    user_id: i64,
    quiz_id: Uuid,
    answers: &[SubmittedAnswer],
) -> Result<QuizResult> {
    let set = load_quiz_set(state, user_id, quiz_id).await?;

    // Validate the whole batch before anything is written.
    quiz_core::score(&set, answers)?;
    state.db.record_answers(quiz_id, answers).await?;

    stored_result(state, user_id, quiz_id).await
}

/// Score a quiz from the answers stored in the database.
pub async fn stored_result(state: &AppState, user_id: i64, quiz_id: Uuid) -> Result<QuizResult> {
    let quiz = get_owned_quiz(state, user_id, quiz_id).await?;
    let rows = state.db.get_quiz_items(quiz_id).await?;
    let set = rebuild_set(&quiz, &rows)?;
    let answers: Vec<SubmittedAnswer> = rows.iter().filter_map(DbQuizItem::to_submitted).collect();

    Ok(quiz_core::score(&set, &answers)?)
}

async fn get_owned_quiz(state: &AppState, user_id: i64, quiz_id: Uuid) -> Result<DbQuiz> {
    state
        .db
        .get_quiz(user_id, quiz_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quiz {}", quiz_id)))
}

/// Reassemble a generated set from its persisted rows.
pub fn rebuild_set(quiz: &DbQuiz, rows: &[DbQuizItem]) -> Result<GeneratedQuizSet> {
    if rows.is_empty() {
        return Err(ApiError::Internal(format!("Quiz {} has no questions", quiz.id)));
    }

    let questions: Vec<_> = rows.iter().map(DbQuizItem::to_question).collect();
    if let Some(broken) = questions
        .iter()
        .find(|q| q.correct_choice_index >= q.choices.len())
    {
        return Err(ApiError::Internal(format!(
            "Quiz {} question {} has no valid correct answer",
            quiz.id, broken.question_index
        )));
    }

    Ok(GeneratedQuizSet {
        options_per_question: quiz.options_per_question.max(0) as usize,
        questions,
        created_at: quiz.created_at,
    })
}
