//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub use quiz_core::types::{
    AnswerReveal, CheckedQuestion, GeneratedQuestion, GeneratedQuizSet, QuestionView, QuizResult,
    SubmittedAnswer, VocabularyItem,
};

// === Database Entity Types ===

/// Registered user
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbUser {
    /// Public view without the password hash
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            is_active: self.is_active,
            is_superuser: self.is_superuser,
            created_at: self.created_at,
        }
    }
}

/// Vocabulary item stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbItem {
    pub id: i64,
    pub user_id: Option<i64>,
    pub english: String,
    pub japanese: String,
    pub grade: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbItem {
    pub fn to_vocabulary_item(&self) -> VocabularyItem {
        VocabularyItem::new(self.id, &self.english, &self.japanese, self.grade)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDeck {
    pub id: i64,
    pub user_id: i64,
    pub deck_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Deck with its item count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeckInfo {
    pub id: i64,
    pub deck_name: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Quiz header row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuiz {
    pub id: Uuid,
    pub user_id: i64,
    pub deck_id: Option<i64>,
    pub grade: Option<i32>,
    pub quiz_type: String,
    pub options_per_question: i32,
    pub created_at: DateTime<Utc>,
}

/// One persisted question of a quiz
#[derive(Debug, Clone, FromRow)]
pub struct DbQuizItem {
    pub id: i64,
    pub quiz_id: Uuid,
    pub item_id: Option<i64>,
    pub question_number: i32,
    pub prompt_text: String,
    pub choice_item_ids: Vec<i64>,
    pub choices: Vec<String>,
    pub correct_answer: i32,
    pub user_answer: Option<i32>,
    pub answer_time: Option<i32>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl DbQuizItem {
    /// Rebuild the generated question this row was persisted from.
    pub fn to_question(&self) -> GeneratedQuestion {
        let correct = self.correct_answer.max(0) as usize;
        GeneratedQuestion {
            question_index: self.question_number.max(0) as usize,
            source_item_id: self
                .item_id
                .or_else(|| self.choice_item_ids.get(correct).copied())
                .unwrap_or_default(),
            prompt_text: self.prompt_text.clone(),
            choices: self.choices.clone(),
            choice_item_ids: self.choice_item_ids.clone(),
            correct_choice_index: correct,
        }
    }

    /// The stored answer, if the question has been answered.
    pub fn to_submitted(&self) -> Option<SubmittedAnswer> {
        self.user_answer.map(|answer| SubmittedAnswer {
            question_number: self.question_number.max(0) as usize,
            user_answer: answer.max(0) as usize,
            answer_time: self.answer_time.unwrap_or(0).max(0) as u32,
        })
    }
}

/// Quiz listing row with answer counts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizSummary {
    pub quiz_id: Uuid,
    pub quiz_type: String,
    pub deck_id: Option<i64>,
    pub grade: Option<i32>,
    pub timestamp: DateTime<Utc>,
    pub total_count: i64,
    pub answered_count: i64,
    pub correct_count: i64,
}

/// How the question pool of a quiz was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizType {
    Deck,
    Grade,
    All,
}

impl QuizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizType::Deck => "deck",
            QuizType::Grade => "grade",
            QuizType::All => "all",
        }
    }
}

// === API Request/Response Types ===

// User types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserPublic>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// Item types
#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub grade: Option<i32>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemRequest {
    pub english: String,
    pub japanese: String,
    pub grade: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<DbItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportRequest {
    pub content: String,
    pub default_grade: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported_count: usize,
    pub items: Vec<DbItem>,
}

// Deck types
#[derive(Debug, Serialize, Deserialize)]
pub struct DeckRequest {
    pub deck_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckListResponse {
    pub decks: Vec<DeckInfo>,
}

// Quiz types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateQuizRequest {
    pub deck_id: Option<i64>,
    pub grade: Option<i32>,
    pub question_count: Option<usize>,
    pub options_per_question: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateQuizResponse {
    pub quiz_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub quiz_items: Vec<QuestionView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizListResponse {
    pub quizzes: Vec<QuizSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizResultResponse {
    pub quiz_id: Uuid,
    #[serde(flatten)]
    pub result: QuizResult,
}
