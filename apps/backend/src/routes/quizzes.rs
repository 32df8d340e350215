//! Quiz endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::quiz;
use crate::AppState;

/// POST /api/quizzes
/// Generates a quiz; the response never contains the answers
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<Json<CreateQuizResponse>> {
    let (quiz_id, set) = quiz::create_quiz(&state, auth.user_id, &payload).await?;

    Ok(Json(CreateQuizResponse {
        quiz_id,
        timestamp: set.created_at,
        quiz_items: set.questions.iter().map(GeneratedQuestion::to_view).collect(),
    }))
}

/// GET /api/quizzes
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<QuizListResponse>> {
    let quizzes = state.db.list_quizzes(auth.user_id).await?;
    Ok(Json(QuizListResponse { quizzes }))
}

/// GET /api/quizzes/{quiz_id}/questions/{question_number}
pub async fn question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((quiz_id, question_number)): Path<(Uuid, usize)>,
) -> Result<Json<QuestionView>> {
    let set = quiz::load_quiz_set(&state, auth.user_id, quiz_id).await?;
    let question = set
        .question(question_number)
        .ok_or_else(|| question_not_found(quiz_id, question_number))?;
    Ok(Json(question.to_view()))
}

/// GET /api/quizzes/{quiz_id}/questions/{question_number}/answer
pub async fn answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((quiz_id, question_number)): Path<(Uuid, usize)>,
) -> Result<Json<AnswerReveal>> {
    let set = quiz::load_quiz_set(&state, auth.user_id, quiz_id).await?;
    let question = set
        .question(question_number)
        .ok_or_else(|| question_not_found(quiz_id, question_number))?;
    Ok(Json(question.to_reveal()))
}

/// POST /api/quizzes/{quiz_id}
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(quiz_id): Path<Uuid>,
    Json(answers): Json<Vec<SubmittedAnswer>>,
) -> Result<Json<QuizResultResponse>> {
    let result = quiz::submit_answers(&state, auth.user_id, quiz_id, &answers).await?;
    tracing::info!(
        %quiz_id,
        correct = result.correct_count,
        total = result.total_count,
        "Answers submitted"
    );
    Ok(Json(QuizResultResponse { quiz_id, result }))
}

/// GET /api/quizzes/{quiz_id}/items
pub async fn items(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<QuizResultResponse>> {
    let result = quiz::stored_result(&state, auth.user_id, quiz_id).await?;
    Ok(Json(QuizResultResponse { quiz_id, result }))
}

fn question_not_found(quiz_id: Uuid, question_number: usize) -> ApiError {
    ApiError::NotFound(format!(
        "Question {} of quiz {}",
        question_number, quiz_id
    ))
}
