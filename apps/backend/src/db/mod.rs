//! PostgreSQL database operations

use chrono::{DateTime, Utc};
use quiz_core::{GeneratedQuizSet, SubmittedAnswer};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

const ITEM_COLUMNS: &str = "id, user_id, english, japanese, grade, created_at, updated_at";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    pub async fn create_user(
        &self,
        request: &UserRegisterRequest,
        password_hash: &str,
        is_superuser: bool,
    ) -> Result<DbUser> {
        sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (user_name, email, password_hash, full_name, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_name, email, password_hash, full_name,
                      is_active, is_superuser, created_at, updated_at
            "#,
        )
        .bind(&request.user_name)
        .bind(&request.email)
        .bind(password_hash)
        .bind(&request.full_name)
        .bind(is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_to_conflict(e, "user name or email already registered"))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, user_name, email, password_hash, full_name,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_name(&self, user_name: &str) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, user_name, email, password_hash, full_name,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE user_name = $1
            "#,
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<DbUser>> {
        let users = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, user_name, email, password_hash, full_name,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update profile fields; `None` keeps the stored value.
    pub async fn update_user(
        &self,
        user_id: i64,
        email: Option<&str>,
        full_name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<DbUser> {
        sqlx::query_as::<_, DbUser>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_name, email, password_hash, full_name,
                      is_active, is_superuser, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_to_conflict(e, "email already registered"))
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Token Repository ===

    pub async fn create_access_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve an unexpired token hash to its active user.
    pub async fn get_user_by_token(&self, token_hash: &str) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT u.id, u.user_name, u.email, u.password_hash, u.full_name,
                   u.is_active, u.is_superuser, u.created_at, u.updated_at
            FROM access_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1 AND t.expires_at > NOW() AND u.is_active
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete_expired_tokens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // === Item Repository ===

    pub async fn create_item(&self, user_id: Option<i64>, item: &ItemRequest) -> Result<DbItem> {
        let item = sqlx::query_as::<_, DbItem>(&format!(
            r#"
            INSERT INTO items (user_id, english, japanese, grade)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&item.english)
        .bind(&item.japanese)
        .bind(item.grade)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    /// Insert many items in one transaction.
    pub async fn create_items(&self, user_id: i64, items: &[ItemRequest]) -> Result<Vec<DbItem>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            let row = sqlx::query_as::<_, DbItem>(&format!(
                r#"
                INSERT INTO items (user_id, english, japanese, grade)
                VALUES ($1, $2, $3, $4)
                RETURNING {ITEM_COLUMNS}
                "#
            ))
            .bind(user_id)
            .bind(&item.english)
            .bind(&item.japanese)
            .bind(item.grade)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn get_item(&self, item_id: i64) -> Result<Option<DbItem>> {
        let item = sqlx::query_as::<_, DbItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Search items by grade and/or English substring.
    pub async fn search_items(&self, grade: Option<i32>, query: Option<&str>) -> Result<Vec<DbItem>> {
        let items = sqlx::query_as::<_, DbItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items
            WHERE ($1::INT IS NULL OR grade = $1)
              AND ($2::TEXT IS NULL OR english ILIKE '%' || $2 || '%')
            ORDER BY id
            "#
        ))
        .bind(grade)
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn update_item(&self, item_id: i64, item: &ItemRequest) -> Result<Option<DbItem>> {
        let item = sqlx::query_as::<_, DbItem>(&format!(
            r#"
            UPDATE items
            SET english = $2, japanese = $3, grade = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(&item.english)
        .bind(&item.japanese)
        .bind(item.grade)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Deck Repository ===

    pub async fn create_deck(&self, user_id: i64, deck_name: &str) -> Result<DbDeck> {
        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            INSERT INTO decks (user_id, deck_name)
            VALUES ($1, $2)
            RETURNING id, user_id, deck_name, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(deck_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(deck)
    }

    /// Get a deck only if `user_id` owns it.
    pub async fn get_deck(&self, user_id: i64, deck_id: i64) -> Result<Option<DbDeck>> {
        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            SELECT id, user_id, deck_name, created_at, updated_at
            FROM decks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(deck_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deck)
    }

    pub async fn list_decks(&self, user_id: i64) -> Result<Vec<DeckInfo>> {
        let decks = sqlx::query_as::<_, DeckInfo>(
            r#"
            SELECT d.id, d.deck_name, COUNT(di.item_id) AS item_count,
                   d.created_at, d.updated_at
            FROM decks d
            LEFT JOIN deck_items di ON di.deck_id = d.id
            WHERE d.user_id = $1
            GROUP BY d.id
            ORDER BY d.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decks)
    }

    pub async fn rename_deck(
        &self,
        user_id: i64,
        deck_id: i64,
        deck_name: &str,
    ) -> Result<Option<DbDeck>> {
        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            UPDATE decks
            SET deck_name = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, deck_name, created_at, updated_at
            "#,
        )
        .bind(deck_id)
        .bind(user_id)
        .bind(deck_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deck)
    }

    pub async fn delete_deck(&self, user_id: i64, deck_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM decks WHERE id = $1 AND user_id = $2")
            .bind(deck_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_deck_items(&self, deck_id: i64) -> Result<Vec<DbItem>> {
        let items = sqlx::query_as::<_, DbItem>(
            r#"
            SELECT i.id, i.user_id, i.english, i.japanese, i.grade, i.created_at, i.updated_at
            FROM items i
            JOIN deck_items di ON di.item_id = i.id
            WHERE di.deck_id = $1
            ORDER BY i.id
            "#,
        )
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Attach an item to a deck; attaching twice is a no-op.
    pub async fn add_deck_item(&self, deck_id: i64, item_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO deck_items (deck_id, item_id)
            VALUES ($1, $2)
            ON CONFLICT (deck_id, item_id) DO NOTHING
            "#,
        )
        .bind(deck_id)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create an item owned by `user_id` and attach it to a deck in one transaction.
    pub async fn create_deck_item(
        &self,
        user_id: i64,
        deck_id: i64,
        item: &ItemRequest,
    ) -> Result<DbItem> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, DbItem>(&format!(
            r#"
            INSERT INTO items (user_id, english, japanese, grade)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&item.english)
        .bind(&item.japanese)
        .bind(item.grade)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO deck_items (deck_id, item_id) VALUES ($1, $2)")
            .bind(deck_id)
            .bind(created.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn remove_deck_item(&self, deck_id: i64, item_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM deck_items WHERE deck_id = $1 AND item_id = $2")
            .bind(deck_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Quiz Repository ===

    /// Persist a generated set and its questions in one transaction.
    pub async fn insert_quiz(
        &self,
        quiz_id: Uuid,
        user_id: i64,
        deck_id: Option<i64>,
        grade: Option<i32>,
        quiz_type: QuizType,
        set: &GeneratedQuizSet,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO quizzes (id, user_id, deck_id, grade, quiz_type, options_per_question, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .bind(deck_id)
        .bind(grade)
        .bind(quiz_type.as_str())
        .bind(to_i32(set.options_per_question)?)
        .bind(set.created_at)
        .execute(&mut *tx)
        .await?;

        for question in &set.questions {
            sqlx::query(
                r#"
                INSERT INTO quiz_items
                    (quiz_id, item_id, question_number, prompt_text, choice_item_ids, choices, correct_answer)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(quiz_id)
            .bind(question.source_item_id)
            .bind(to_i32(question.question_index)?)
            .bind(&question.prompt_text)
            .bind(&question.choice_item_ids)
            .bind(&question.choices)
            .bind(to_i32(question.correct_choice_index)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get a quiz only if `user_id` owns it.
    pub async fn get_quiz(&self, user_id: i64, quiz_id: Uuid) -> Result<Option<DbQuiz>> {
        let quiz = sqlx::query_as::<_, DbQuiz>(
            r#"
            SELECT id, user_id, deck_id, grade, quiz_type, options_per_question, created_at
            FROM quizzes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    pub async fn list_quizzes(&self, user_id: i64) -> Result<Vec<QuizSummary>> {
        let quizzes = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT q.id AS quiz_id, q.quiz_type, q.deck_id, q.grade,
                   q.created_at AS timestamp,
                   COUNT(qi.id) AS total_count,
                   COUNT(qi.user_answer) AS answered_count,
                   COUNT(qi.id) FILTER (WHERE qi.user_answer = qi.correct_answer) AS correct_count
            FROM quizzes q
            LEFT JOIN quiz_items qi ON qi.quiz_id = q.id
            WHERE q.user_id = $1
            GROUP BY q.id
            ORDER BY q.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    pub async fn get_quiz_items(&self, quiz_id: Uuid) -> Result<Vec<DbQuizItem>> {
        let items = sqlx::query_as::<_, DbQuizItem>(
            r#"
            SELECT id, quiz_id, item_id, question_number, prompt_text, choice_item_ids,
                   choices, correct_answer, user_answer, answer_time, answered_at
            FROM quiz_items
            WHERE quiz_id = $1
            ORDER BY question_number
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Record answers; a later answer overwrites an earlier one.
    ///
    /// Every value is range-checked before the transaction starts.
    pub async fn record_answers(&self, quiz_id: Uuid, answers: &[SubmittedAnswer]) -> Result<()> {
        let rows = answers
            .iter()
            .map(|answer| {
                Ok((
                    to_i32(answer.question_number)?,
                    to_i32(answer.user_answer)?,
                    answer_time_to_i32(answer.answer_time)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut tx = self.pool.begin().await?;

        for (question_number, user_answer, answer_time) in rows {
            sqlx::query(
                r#"
                UPDATE quiz_items
                SET user_answer = $3, answer_time = $4, answered_at = NOW()
                WHERE quiz_id = $1 AND question_number = $2
                "#,
            )
            .bind(quiz_id)
            .bind(question_number)
            .bind(user_answer)
            .bind(answer_time)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| ApiError::BadRequest(format!("{} is out of range", value)))
}

fn answer_time_to_i32(answer_time: u32) -> Result<i32> {
    i32::try_from(answer_time).map_err(|_| {
        ApiError::BadRequest(format!("answer_time {} is out of range", answer_time))
    })
}

fn unique_violation_to_conflict(err: sqlx::Error, message: &str) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::Conflict(message.to_string())
        }
        _ => ApiError::Database(err),
    }
}
